use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{LoginHandshake, Session};
use crate::common::client::error::WxError;
use crate::common::client::models::contact::WebWxSyncResponse;
use crate::common::client::response::ResponseEnvelope;
use crate::common::client::transport::Transport;

/// selector 不为 0 时拉到的新数据交给它处理
#[async_trait]
pub trait SyncHandler: Send {
    async fn on_sync(
        &mut self,
        session: &Session,
        update: WebWxSyncResponse,
    ) -> Result<(), WxError>;
}

/// 轮询结束的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncExit {
    // 外部取消，属于正常退出
    Cancelled,
    // retcode 不为 0，需要重新登录
    SessionExpired { ret_code: String },
}

/// 同步检查轮询，放在单独的任务里跑，通过 CancellationToken 停止
pub struct SyncPoller<'a> {
    transport: &'a dyn Transport,
    interval: Duration,
}

impl<'a> SyncPoller<'a> {
    pub fn new(transport: &'a dyn Transport, interval: Duration) -> Self {
        Self {
            transport,
            interval,
        }
    }

    // 获取新的消息，并更新会话的 sync key
    pub async fn sync(&self, session: &mut Session) -> Result<WebWxSyncResponse, WxError> {
        let resp = ResponseEnvelope::new(self.transport.web_wx_sync(session).await);
        let update: WebWxSyncResponse = resp.decode_checked().await?;
        session.update_sync_keys(&update);
        debug!("收到 {} 条新消息", update.add_msg_count);
        Ok(update)
    }

    /// 只在两次请求之间响应取消，不会打断正在进行的请求
    pub async fn run<H: SyncHandler + ?Sized>(
        &self,
        session: &mut Session,
        cancel: &CancellationToken,
        handler: &mut H,
    ) -> Result<SyncExit, WxError> {
        let handshake = LoginHandshake::new(self.transport);
        info!("开始同步检查: {}", session.domain.host());

        loop {
            if cancel.is_cancelled() {
                info!("同步检查已取消");
                return Ok(SyncExit::Cancelled);
            }

            let state = handshake.sync_check(session).await?;
            if !state.is_normal() {
                warn!("会话已失效, retcode: {}", state.ret_code);
                return Ok(SyncExit::SessionExpired {
                    ret_code: state.ret_code,
                });
            }

            if state.has_new_data() {
                debug!("有新数据: {:?}", state.selector_kind());
                let update = self.sync(session).await?;
                handler.on_sync(session, update).await?;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("同步检查已取消");
                    return Ok(SyncExit::Cancelled);
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

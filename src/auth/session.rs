use tracing::debug;

use crate::common::client::domain::WxDomain;
use crate::common::client::models::auth::{LoginInfo, SyncKey, WebInitResponse};
use crate::common::client::models::common::BaseRequest;
use crate::common::client::models::contact::{User, WebWxSyncResponse};

/// 登录成功之后的会话状态
///
/// 所有操作都显式地拿它的引用，不同会话之间互不影响
#[derive(Debug, Clone)]
pub struct Session {
    pub domain: WxDomain,
    pub login_info: LoginInfo,
    pub base_request: BaseRequest,
    pub user: User,
    pub sync_key: SyncKey,
    sync_check_key: Option<SyncKey>,
}

impl Session {
    pub fn new(
        domain: WxDomain,
        login_info: LoginInfo,
        base_request: BaseRequest,
        init: WebInitResponse,
    ) -> Self {
        Self {
            domain,
            login_info,
            base_request,
            user: init.user,
            sync_key: init.sync_key,
            sync_check_key: None,
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user.user_name
    }

    /// synccheck 优先使用 SyncCheckKey
    pub fn sync_check_key(&self) -> &SyncKey {
        self.sync_check_key.as_ref().unwrap_or(&self.sync_key)
    }

    // webwxsync 之后要用新的 key，否则会一直拉到同样的消息
    pub fn update_sync_keys(&mut self, resp: &WebWxSyncResponse) {
        if !resp.sync_key.is_empty() {
            self.sync_key = resp.sync_key.clone();
        }
        if !resp.sync_check_key.is_empty() {
            self.sync_check_key = Some(resp.sync_check_key.clone());
        }
        debug!("sync key 已更新: {}", self.sync_check_key().to_query());
    }
}

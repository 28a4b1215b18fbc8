use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use wx_web_client::auth::{display_qr, qr_login_url};
use wx_web_client::common::client::models::contact::WebWxSyncResponse;
use wx_web_client::common::logger::PrettyLogger;
use wx_web_client::{
    ClientConfig, ContactService, HandshakeStage, LoginHandshake, LoginObserver, LoginOptions,
    Session, SyncExit, SyncHandler, SyncPoller, WxClient, WxError, log_error, log_info, log_step,
    log_success, log_warning,
};

mod cli;

/// 终端里展示登录进度
struct ConsoleObserver;

impl LoginObserver for ConsoleObserver {
    fn on_uuid(&mut self, uuid: &str) {
        let url = qr_login_url(uuid);
        PrettyLogger::login_prompt();
        if let Err(e) = display_qr(&url) {
            warn!("二维码渲染失败: {}", e);
        }
        log_info!("也可以在浏览器中打开: {}", url);
        PrettyLogger::waiting("等待扫码...");
    }

    fn on_scanned(&mut self) {
        log_success!("扫码成功，请在手机上确认登录");
    }

    fn on_stage(&mut self, stage: HandshakeStage) {
        debug!("登录阶段: {:?}", stage);
    }
}

/// 把新消息打印出来
struct ConsoleHandler;

#[async_trait]
impl SyncHandler for ConsoleHandler {
    async fn on_sync(
        &mut self,
        session: &Session,
        update: WebWxSyncResponse,
    ) -> Result<(), WxError> {
        for msg in &update.add_msg_list {
            // 自己发出的消息也会同步回来
            if msg.from_user_name == session.user_name() {
                continue;
            }
            PrettyLogger::message(&msg.from_user_name, &msg.content);
        }
        for contact in &update.mod_contact_list {
            debug!("联系人变更: {}", contact.display());
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let args = cli::Cli::parse();

    // 初始化日志
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = ClientConfig {
        timeout: Duration::from_secs(args.timeout),
        desktop_mode: args.desktop,
        ..ClientConfig::default()
    };
    let client = WxClient::with_config(config).context("创建 HTTP 客户端失败")?;

    log_step!("扫码登录");
    let options = LoginOptions {
        poll_interval: Duration::from_secs(args.poll_interval),
        max_polls: args.max_polls,
    };
    let handshake = LoginHandshake::new(&client);
    let outcome = match handshake.login(&options, &mut ConsoleObserver).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log_error!("登录失败: {}", e);
            error!("建议: {:?}", e.advice());
            return Err(e.into());
        }
    };
    if let Some(e) = &outcome.notify_warning {
        log_warning!("通知手机失败: {}", e);
    }

    let mut session = outcome.session;
    PrettyLogger::user_status("已登录", session.user.display());

    match ContactService::new(&client).get_contacts(&session).await {
        Ok(contacts) => info!("联系人数量: {}", contacts.len()),
        Err(e) => warn!("获取联系人失败: {}", e),
    }

    // Ctrl+C 时停止同步
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });

    log_step!("接收消息");
    PrettyLogger::separator();
    let poller = SyncPoller::new(&client, Duration::from_secs(args.sync_interval));
    match poller.run(&mut session, &cancel, &mut ConsoleHandler).await? {
        SyncExit::Cancelled => {
            if let Err(e) = handshake.logout(&session).await {
                warn!("退出登录失败: {}", e);
            }
            info!("{}", "已退出".green());
        }
        SyncExit::SessionExpired { ret_code } => {
            log_error!("会话已失效 (retcode={})，请重新登录", ret_code);
        }
    }
    Ok(())
}

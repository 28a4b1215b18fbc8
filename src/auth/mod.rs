pub mod qr_display;
pub mod session;
pub mod sync;

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

pub use qr_display::{display_qr, qr_login_url};
pub use session::Session;

use crate::common::client::domain::WxDomain;
use crate::common::client::error::{TransportError, WxError};
use crate::common::client::models::auth::{
    CheckLoginResponse, LoginInfo, LoginStatus, SyncCheckResponse, WebInitResponse,
};
use crate::common::client::models::common::BaseRequest;
use crate::common::client::response::{ResponseEnvelope, extract_groups};
use crate::common::client::transport::Transport;

lazy_static! {
    static ref UUID_REGEXP: Regex = Regex::new(r#"uuid\s*=\s*"([^"]+)""#).unwrap();
    static ref STATUS_CODE_REGEXP: Regex = Regex::new(r"window\.code\s*=\s*(\d+)").unwrap();
    static ref REDIRECT_URI_REGEXP: Regex =
        Regex::new(r#"window\.redirect_uri\s*=\s*"([^"]+)""#).unwrap();
    // window.synccheck={retcode:"0",selector:"2"}，也兼容带引号的 key
    static ref SYNC_CHECK_REGEXP: Regex =
        Regex::new(r#"retcode"?\s*:\s*"(\d+)"\s*,\s*"?selector"?\s*:\s*"(\d+)""#).unwrap();
}

/// 握手所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    Init,
    AwaitingScan,
    AwaitingConfirm,
    Redirecting,
    FetchingLoginInfo,
    Initializing,
    NotifyingMobile,
    SyncPolling,
}

/// 登录过程中的回调，默认什么都不做
pub trait LoginObserver: Send {
    // 拿到 uuid 之后用它生成二维码
    fn on_uuid(&mut self, _uuid: &str) {}

    fn on_scanned(&mut self) {}

    fn on_stage(&mut self, _stage: HandshakeStage) {}
}

impl LoginObserver for () {}

/// 轮询节奏由调用方决定
#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub poll_interval: Duration,
    pub max_polls: usize,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_polls: 120,
        }
    }
}

/// 登录结果，通知手机失败不影响登录，只作为警告带回去
#[derive(Debug)]
pub struct LoginOutcome {
    pub session: Session,
    pub notify_warning: Option<WxError>,
}

/// 扫码登录握手
///
/// 每一步都可以单独调用，`login` 把它们按顺序串起来
pub struct LoginHandshake<'a> {
    transport: &'a dyn Transport,
}

impl<'a> LoginHandshake<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    // 获取登录的 uuid
    pub async fn get_login_uuid(&self) -> Result<String, WxError> {
        let resp = ResponseEnvelope::new(self.transport.get_login_uuid().await);
        let mut groups = resp
            .decode_regex(&UUID_REGEXP, 1)
            .await
            .map_err(|e| match e {
                // 没匹配到，可能接口做了修改，或者当前机器的 IP 被加入了黑名单
                WxError::Parse(msg) => WxError::Parse(format!("uuid not found: {}", msg)),
                other => other,
            })?;
        let uuid = groups.remove(0);
        info!("获取到登录 uuid: {}", uuid);
        Ok(uuid)
    }

    // 检查是否登录成功，重复调用没有副作用
    pub async fn check_login(&self, uuid: &str) -> Result<CheckLoginResponse, WxError> {
        if uuid.is_empty() {
            return Err(WxError::InvalidInput("uuid 为空".to_string()));
        }
        let resp = ResponseEnvelope::new(self.transport.check_login(uuid).await);
        let data = resp.read_all().await?;
        let mut groups = extract_groups(&data, &STATUS_CODE_REGEXP, 1)?;
        let code = groups.remove(0);
        debug!("登录状态码: {}", code);
        Ok(CheckLoginResponse { code, raw: data })
    }

    /// 从确认登录的响应里取出跳转地址，并按 host 选定地域域名
    pub fn resolve_redirect(&self, body: &[u8]) -> Result<(WxDomain, Url), WxError> {
        let mut groups = extract_groups(body, &REDIRECT_URI_REGEXP, 1)
            .map_err(|_| WxError::Protocol("redirect url not found".to_string()))?;
        let redirect = Url::parse(&groups.remove(0))
            .map_err(|e| WxError::Protocol(format!("invalid redirect url: {}", e)))?;
        let host = redirect.host_str().unwrap_or_default();
        let domain = WxDomain::from_host(host)
            .ok_or_else(|| WxError::Protocol(format!("invalid host: {}", host)))?;
        info!("会话域名: {}", domain.host());
        Ok((domain, redirect))
    }

    pub async fn fetch_login_info(&self, redirect: &Url) -> Result<LoginInfo, WxError> {
        let resp = ResponseEnvelope::new(self.transport.get_login_info(redirect).await);
        if let Some(TransportError::MissingLocation) = resp.err() {
            warn!("跳转缺少 Location 头，账号可能被限制网页登录");
            return Err(WxError::LoginForbidden);
        }

        let info: LoginInfo = resp.decode_xml().await?;
        if !info.ok() {
            return Err(WxError::LoginRejected(Box::new(info)));
        }
        let missing = info.missing_fields();
        if !missing.is_empty() {
            return Err(WxError::Parse(format!(
                "登录信息缺少字段: {}",
                missing.join(",")
            )));
        }
        Ok(info)
    }

    // 获取登录信息
    pub async fn get_login_info(&self, body: &[u8]) -> Result<(WxDomain, LoginInfo), WxError> {
        let (domain, redirect) = self.resolve_redirect(body)?;
        let info = self.fetch_login_info(&redirect).await?;
        Ok((domain, info))
    }

    // 获取初始化信息
    pub async fn web_init(
        &self,
        domain: &WxDomain,
        info: &LoginInfo,
        request: &BaseRequest,
    ) -> Result<WebInitResponse, WxError> {
        let resp = ResponseEnvelope::new(self.transport.web_init(domain, info, request).await);
        resp.decode_json_or_status().await
    }

    // 通知手机已登录
    pub async fn status_notify(&self, session: &Session) -> Result<(), WxError> {
        let resp = ResponseEnvelope::new(self.transport.status_notify(session).await);
        resp.expect_ok().await
    }

    // 异步获取是否有新的消息
    pub async fn sync_check(&self, session: &Session) -> Result<SyncCheckResponse, WxError> {
        let resp = ResponseEnvelope::new(self.transport.sync_check(session).await);
        let mut groups = resp.decode_regex(&SYNC_CHECK_REGEXP, 2).await?;
        let selector = groups.remove(1);
        let ret_code = groups.remove(0);
        debug!("synccheck retcode={} selector={}", ret_code, selector);
        Ok(SyncCheckResponse { ret_code, selector })
    }

    // 用户退出
    pub async fn logout(&self, session: &Session) -> Result<(), WxError> {
        let resp = ResponseEnvelope::new(self.transport.logout(session).await);
        resp.expect_ok().await
    }

    /// 完整的登录流程：uuid -> 轮询扫码 -> 跳转 -> 登录信息 -> 初始化 -> 通知手机
    pub async fn login(
        &self,
        options: &LoginOptions,
        observer: &mut dyn LoginObserver,
    ) -> Result<LoginOutcome, WxError> {
        observer.on_stage(HandshakeStage::Init);
        let uuid = self.get_login_uuid().await?;
        observer.on_uuid(&uuid);
        observer.on_stage(HandshakeStage::AwaitingScan);

        let body = self.wait_for_confirm(&uuid, options, observer).await?;

        observer.on_stage(HandshakeStage::Redirecting);
        let (domain, redirect) = self.resolve_redirect(&body)?;

        observer.on_stage(HandshakeStage::FetchingLoginInfo);
        let info = self.fetch_login_info(&redirect).await?;
        let request = BaseRequest::from_login_info(&info);

        observer.on_stage(HandshakeStage::Initializing);
        let init = self.web_init(&domain, &info, &request).await?;
        let session = Session::new(domain, info, request, init);
        info!("初始化完成: {}", session.user.nick_name);

        observer.on_stage(HandshakeStage::NotifyingMobile);
        let notify_warning = match self.status_notify(&session).await {
            Ok(()) => None,
            Err(e) => {
                warn!("通知手机登录状态失败: {}", e);
                Some(e)
            }
        };

        // 登录完成，接下来交给 SyncPoller
        observer.on_stage(HandshakeStage::SyncPolling);
        Ok(LoginOutcome {
            session,
            notify_warning,
        })
    }

    // 轮询登录状态，确认后返回带跳转地址的响应
    async fn wait_for_confirm(
        &self,
        uuid: &str,
        options: &LoginOptions,
        observer: &mut dyn LoginObserver,
    ) -> Result<Vec<u8>, WxError> {
        let mut scanned = false;
        for attempt in 0..options.max_polls {
            let resp = self.check_login(uuid).await?;
            match resp.status() {
                LoginStatus::Waiting => debug!("等待扫码..."),
                LoginStatus::Scanned => {
                    if !scanned {
                        info!("二维码已扫描，请在手机上确认");
                        scanned = true;
                        observer.on_scanned();
                        observer.on_stage(HandshakeStage::AwaitingConfirm);
                    }
                }
                LoginStatus::Confirmed => return Ok(resp.raw),
                LoginStatus::Expired => return Err(WxError::QrCodeExpired),
                LoginStatus::Error(code) => {
                    return Err(WxError::Protocol(format!(
                        "unexpected status code: {}",
                        code
                    )));
                }
            }
            // 最后一次轮询后直接超时
            if attempt + 1 < options.max_polls {
                tokio::time::sleep(options.poll_interval).await;
            }
        }
        Err(WxError::LoginTimeout)
    }
}

use thiserror::Error;

use crate::common::client::models::auth::LoginInfo;
use crate::common::client::models::common::BaseResponse;
use crate::common::client::models::message::SentMessage;

/// 传输层错误，只描述"请求有没有拿到字节"
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("网络请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO操作失败: {0}")]
    Io(#[from] std::io::Error),

    // 登录时重定向没有 Location 头，通常意味着账号被限制网页登录
    #[error("重定向响应缺少 Location 头")]
    MissingLocation,

    #[error("服务暂时不可用({0})，请稍后重试")]
    ServerError(u16),
}

/// 微信接口通过 BaseResponse 明确返回的错误码
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("微信接口错误({code}): {message}")]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 已知错误码的说明
    pub fn description(&self) -> Option<&'static str> {
        match self.code {
            -14 => Some("ticket 错误"),
            1 => Some("参数错误"),
            1100 => Some("已在手机上退出登录"),
            1101 => Some("已在其他地方登录"),
            1102 => Some("cookie 已失效"),
            1203 => Some("当前登录环境异常，为了安全起见请不要在网页登录"),
            1205 => Some("操作太频繁"),
            _ => None,
        }
    }

    /// 会话已经失效，只能重新走登录流程
    pub fn invalidates_session(&self) -> bool {
        matches!(self.code, 1100..=1102)
    }
}

impl From<&BaseResponse> for RemoteError {
    fn from(base: &BaseResponse) -> Self {
        let mut err = RemoteError::new(base.err_code, base.err_msg.clone());
        if err.message.is_empty() {
            err.message = err.description().unwrap_or("未知错误").to_string();
        }
        err
    }
}

/// 调用方据此决定下一步怎么做
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAdvice {
    RetryLater,
    DoNotRetry,
    RestartLogin,
}

#[derive(Debug, Error)]
pub enum WxError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("读取响应失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("响应解析失败: {0}")]
    Parse(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("登录被禁止: 该账号可能无法使用网页版登录")]
    LoginForbidden,

    #[error("登录被拒绝: {0}")]
    LoginRejected(Box<LoginInfo>),

    #[error("协议错误: {0}")]
    Protocol(String),

    #[error("二维码过期")]
    QrCodeExpired,

    #[error("等待扫码超时")]
    LoginTimeout,

    #[error("上传失败: {0}")]
    Upload(String),

    #[error("参数无效: {0}")]
    InvalidInput(String),
}

impl WxError {
    pub fn advice(&self) -> RetryAdvice {
        match self {
            WxError::Transport(_) | WxError::Io(_) => RetryAdvice::RetryLater,
            WxError::Remote(e) if e.invalidates_session() => RetryAdvice::RestartLogin,
            WxError::QrCodeExpired | WxError::LoginTimeout | WxError::Protocol(_) => {
                RetryAdvice::RestartLogin
            }
            WxError::Parse(_)
            | WxError::Remote(_)
            | WxError::LoginForbidden
            | WxError::LoginRejected(_)
            | WxError::Upload(_)
            | WxError::InvalidInput(_) => RetryAdvice::DoNotRetry,
        }
    }
}

impl From<serde_json::Error> for WxError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<quick_xml::DeError> for WxError {
    fn from(e: quick_xml::DeError) -> Self {
        Self::Parse(e.to_string())
    }
}

/// 发送失败时把已经构造好的消息一起交还给调用方
#[derive(Debug, Error)]
#[error("消息发送失败: {error}")]
pub struct SendError {
    pub attempted: Option<SentMessage>,
    #[source]
    pub error: WxError,
}

impl From<WxError> for SendError {
    fn from(error: WxError) -> Self {
        Self {
            attempted: None,
            error,
        }
    }
}

use rand::Rng;
use serde_derive::{Deserialize, Serialize};

use crate::common::client::error::{RemoteError, WxError};
use crate::common::client::models::auth::LoginInfo;

/// 几乎每个 JSON 响应都带的状态对象，Ret 为 0 才算成功，和 HTTP 状态码无关
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BaseResponse {
    #[serde(rename = "Ret")]
    pub err_code: i64,

    #[serde(rename = "ErrMsg", default)]
    pub err_msg: String,
}

impl BaseResponse {
    pub fn ok(&self) -> bool {
        self.err_code == 0
    }
}

/// 任何带 BaseResponse 的响应结构
pub trait HasStatus {
    fn base_response(&self) -> &BaseResponse;
}

impl HasStatus for BaseResponse {
    fn base_response(&self) -> &BaseResponse {
        self
    }
}

/// 统一的状态码检查，所有需要判断业务成败的调用都走这里
pub fn classify<T: HasStatus + ?Sized>(reply: &T) -> Result<(), WxError> {
    let base = reply.base_response();
    if base.ok() {
        return Ok(());
    }
    Err(WxError::Remote(RemoteError::from(base)))
}

/// 只关心 BaseResponse 的响应
#[derive(Debug, Deserialize)]
pub struct StatusReply {
    #[serde(rename = "BaseResponse")]
    pub base_response: BaseResponse,
}

impl HasStatus for StatusReply {
    fn base_response(&self) -> &BaseResponse {
        &self.base_response
    }
}

/// 请求体里携带的会话凭证
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseRequest {
    #[serde(rename = "Uin")]
    pub uin: i64,

    #[serde(rename = "Sid")]
    pub sid: String,

    #[serde(rename = "Skey")]
    pub skey: String,

    #[serde(rename = "DeviceID")]
    pub device_id: String,
}

impl BaseRequest {
    pub fn from_login_info(info: &LoginInfo) -> Self {
        Self {
            uin: info.uin,
            sid: info.sid.clone(),
            skey: info.skey.clone(),
            device_id: new_device_id(),
        }
    }
}

// 设备号格式: e + 15位数字
pub fn new_device_id() -> String {
    let mut rng = rand::rng();
    let digits: String = (0..15)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect();
    format!("e{}", digits)
}

use std::fmt;

use serde_derive::{Deserialize, Serialize};

use super::common::{BaseResponse, HasStatus};
use super::contact::User;

/// 扫码登录轮询返回的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStatus {
    Waiting,
    Scanned,
    Confirmed,
    Expired,
    Error(String),
}

impl LoginStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "408" => LoginStatus::Waiting,
            "201" => LoginStatus::Scanned,
            "200" => LoginStatus::Confirmed,
            "400" => LoginStatus::Expired,
            other => LoginStatus::Error(other.to_string()),
        }
    }
}

/// check-login 的原始结果，raw 里确认登录后会带着跳转地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckLoginResponse {
    pub code: String,
    pub raw: Vec<u8>,
}

impl CheckLoginResponse {
    pub fn status(&self) -> LoginStatus {
        LoginStatus::from_code(&self.code)
    }
}

/// 跳转后拿到的 XML 登录凭证
///
/// ```xml
/// <error><ret>0</ret><message></message><skey>@crypt_xx</skey><wxsid>..</wxsid>
/// <wxuin>123</wxuin><pass_ticket>..</pass_ticket><isgrayscale>1</isgrayscale></error>
/// ```
///
/// ret 不为 0 时它本身就是错误信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginInfo {
    #[serde(default)]
    pub ret: i64,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub skey: String,

    #[serde(rename = "wxsid", default)]
    pub sid: String,

    #[serde(rename = "wxuin", default)]
    pub uin: i64,

    #[serde(default)]
    pub pass_ticket: String,

    #[serde(rename = "isgrayscale", default)]
    pub is_gray_scale: i64,
}

impl LoginInfo {
    pub fn ok(&self) -> bool {
        self.ret == 0
    }

    // ret 为 0 但缺少会话字段时也不能继续
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.skey.is_empty() {
            missing.push("skey");
        }
        if self.sid.is_empty() {
            missing.push("wxsid");
        }
        if self.uin == 0 {
            missing.push("wxuin");
        }
        if self.pass_ticket.is_empty() {
            missing.push("pass_ticket");
        }
        missing
    }
}

impl fmt::Display for LoginInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ret={} message={}", self.ret, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncKeyItem {
    pub key: i64,
    pub val: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncKey {
    pub count: i64,
    #[serde(default)]
    pub list: Vec<SyncKeyItem>,
}

impl SyncKey {
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    // synccheck 接口要的格式: 1_123|2_456
    pub fn to_query(&self) -> String {
        self.list
            .iter()
            .map(|item| format!("{}_{}", item.key, item.val))
            .collect::<Vec<String>>()
            .join("|")
    }
}

/// webwxinit 响应，能完整解码时不判断状态
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebInitResponse {
    pub base_response: BaseResponse,

    #[serde(default)]
    pub count: i64,

    #[serde(default)]
    pub contact_list: Vec<User>,

    pub sync_key: SyncKey,

    pub user: User,

    #[serde(default)]
    pub chat_set: String,

    #[serde(rename = "SKey", default)]
    pub skey: String,

    #[serde(default)]
    pub client_version: i64,

    #[serde(default)]
    pub system_time: i64,
}

impl HasStatus for WebInitResponse {
    fn base_response(&self) -> &BaseResponse {
        &self.base_response
    }
}

/// synccheck 结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCheckResponse {
    pub ret_code: String,
    pub selector: String,
}

/// selector 的含义
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Normal,
    NewMessage,
    ModContact,
    AddOrDelContact,
    ModChatRoom,
    Unknown(String),
}

impl SyncCheckResponse {
    // retcode 为 0 时会话仍然有效
    pub fn is_normal(&self) -> bool {
        self.ret_code == "0"
    }

    pub fn has_new_data(&self) -> bool {
        self.selector != "0"
    }

    pub fn selector_kind(&self) -> Selector {
        match self.selector.as_str() {
            "0" => Selector::Normal,
            "2" => Selector::NewMessage,
            "4" => Selector::ModContact,
            "6" => Selector::AddOrDelContact,
            "7" => Selector::ModChatRoom,
            other => Selector::Unknown(other.to_string()),
        }
    }
}

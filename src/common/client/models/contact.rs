use serde_derive::{Deserialize, Serialize};

use super::auth::SyncKey;
use super::common::{BaseResponse, HasStatus};

/// 联系人/群/公众号都用同一个结构
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct User {
    pub uin: i64,
    pub user_name: String,
    pub nick_name: String,
    pub head_img_url: String,
    pub remark_name: String,
    pub sex: i64,
    pub signature: String,
    pub verify_flag: i64,
    pub contact_flag: i64,
    pub member_count: i64,
    pub member_list: Vec<User>,
    pub display_name: String,
    pub province: String,
    pub city: String,
    pub encry_chat_room_id: String,
}

impl User {
    // 群聊的 UserName 以 @@ 开头
    pub fn is_group(&self) -> bool {
        is_group_user_name(&self.user_name)
    }

    pub fn display(&self) -> &str {
        if !self.remark_name.is_empty() {
            &self.remark_name
        } else {
            &self.nick_name
        }
    }
}

pub fn is_group_user_name(user_name: &str) -> bool {
    user_name.starts_with("@@")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebWxContactResponse {
    pub base_response: BaseResponse,
    #[serde(default)]
    pub member_count: i64,
    #[serde(default)]
    pub member_list: Vec<User>,
    #[serde(default)]
    pub seq: i64,
}

impl HasStatus for WebWxContactResponse {
    fn base_response(&self) -> &BaseResponse {
        &self.base_response
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebWxBatchContactResponse {
    pub base_response: BaseResponse,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub contact_list: Vec<User>,
}

impl HasStatus for WebWxBatchContactResponse {
    fn base_response(&self) -> &BaseResponse {
        &self.base_response
    }
}

/// 好友请求里附带的信息，同意好友时需要回传 ticket
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecommendInfo {
    pub user_name: String,
    pub nick_name: String,
    pub content: String,
    pub ticket: String,
    pub scene: i64,
    pub op_code: i64,
}

/// webwxsync 拉下来的新消息
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Message {
    pub msg_id: String,
    pub new_msg_id: i64,
    pub from_user_name: String,
    pub to_user_name: String,
    pub msg_type: i64,
    pub content: String,
    pub create_time: i64,
    pub app_msg_type: i64,
    pub file_name: String,
    pub file_size: String,
    pub media_id: String,
    pub url: String,
    pub recommend_info: RecommendInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebWxSyncResponse {
    pub base_response: BaseResponse,
    #[serde(default)]
    pub add_msg_count: i64,
    #[serde(default)]
    pub add_msg_list: Vec<Message>,
    #[serde(default)]
    pub mod_contact_count: i64,
    #[serde(default)]
    pub mod_contact_list: Vec<User>,
    #[serde(default)]
    pub del_contact_count: i64,
    #[serde(default)]
    pub del_contact_list: Vec<User>,
    #[serde(default)]
    pub sync_key: SyncKey,
    #[serde(default)]
    pub sync_check_key: SyncKey,
    #[serde(default)]
    pub continue_flag: i64,
}

impl HasStatus for WebWxSyncResponse {
    fn base_response(&self) -> &BaseResponse {
        &self.base_response
    }
}

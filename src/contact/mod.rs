use tracing::info;

use crate::auth::Session;
use crate::common::client::error::WxError;
use crate::common::client::models::contact::{
    RecommendInfo, User, WebWxBatchContactResponse, WebWxContactResponse, is_group_user_name,
};
use crate::common::client::response::ResponseEnvelope;
use crate::common::client::transport::Transport;

/// 批量获取联系人详情一次最多 50 个
pub const MAX_BATCH_CONTACTS: usize = 50;

/// 联系人、群成员相关操作，结果统一经过 BaseResponse 检查
pub struct ContactService<'a> {
    transport: &'a dyn Transport,
}

impl<'a> ContactService<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    // 获取所有的联系人
    pub async fn get_contacts(&self, session: &Session) -> Result<Vec<User>, WxError> {
        let resp = ResponseEnvelope::new(self.transport.get_contact(session).await);
        let reply: WebWxContactResponse = resp.decode_checked().await?;
        info!("获取到 {} 个联系人", reply.member_list.len());
        Ok(reply.member_list)
    }

    // 获取联系人的详情
    pub async fn batch_get_contacts(
        &self,
        session: &Session,
        user_names: &[String],
    ) -> Result<Vec<User>, WxError> {
        if user_names.is_empty() {
            return Err(WxError::InvalidInput("联系人列表为空".to_string()));
        }
        if user_names.len() > MAX_BATCH_CONTACTS {
            return Err(WxError::InvalidInput(format!(
                "一次最多获取 {} 个联系人，实际 {} 个",
                MAX_BATCH_CONTACTS,
                user_names.len()
            )));
        }
        let resp =
            ResponseEnvelope::new(self.transport.batch_get_contact(session, user_names).await);
        let reply: WebWxBatchContactResponse = resp.decode_checked().await?;
        Ok(reply.contact_list)
    }

    // 修改用户备注
    pub async fn set_remark_name(
        &self,
        session: &Session,
        to_user_name: &str,
        remark_name: &str,
    ) -> Result<(), WxError> {
        if to_user_name.is_empty() {
            return Err(WxError::InvalidInput("用户名为空".to_string()));
        }
        let resp = ResponseEnvelope::new(
            self.transport
                .oplog(session, to_user_name, remark_name)
                .await,
        );
        resp.expect_ok().await
    }

    // 拉好友入群
    pub async fn add_members_to_chat_room(
        &self,
        session: &Session,
        group_user_name: &str,
        user_names: &[String],
    ) -> Result<(), WxError> {
        check_chat_room_edit(group_user_name, user_names)?;
        let resp = ResponseEnvelope::new(
            self.transport
                .add_chat_room_members(session, group_user_name, user_names)
                .await,
        );
        resp.expect_ok().await
    }

    // 从群聊中移除用户
    pub async fn remove_members_from_chat_room(
        &self,
        session: &Session,
        group_user_name: &str,
        user_names: &[String],
    ) -> Result<(), WxError> {
        check_chat_room_edit(group_user_name, user_names)?;
        let resp = ResponseEnvelope::new(
            self.transport
                .remove_chat_room_members(session, group_user_name, user_names)
                .await,
        );
        resp.expect_ok().await
    }

    // 同意加好友请求
    pub async fn verify_user(
        &self,
        session: &Session,
        info: &RecommendInfo,
        verify_content: &str,
    ) -> Result<(), WxError> {
        if info.user_name.is_empty() || info.ticket.is_empty() {
            return Err(WxError::InvalidInput("好友请求缺少 UserName 或 Ticket".to_string()));
        }
        let resp = ResponseEnvelope::new(
            self.transport
                .verify_user(session, info, verify_content)
                .await,
        );
        resp.expect_ok().await
    }
}

fn check_chat_room_edit(group_user_name: &str, user_names: &[String]) -> Result<(), WxError> {
    if !is_group_user_name(group_user_name) {
        return Err(WxError::InvalidInput(format!(
            "{} 不是群聊",
            group_user_name
        )));
    }
    if user_names.is_empty() {
        return Err(WxError::InvalidInput("成员列表为空".to_string()));
    }
    Ok(())
}

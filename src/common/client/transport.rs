use std::fmt;
use std::io;

use async_trait::async_trait;
use url::Url;

use crate::auth::session::Session;
use crate::common::client::domain::WxDomain;
use crate::common::client::error::TransportError;
use crate::common::client::models::auth::LoginInfo;
use crate::common::client::models::common::BaseRequest;
use crate::common::client::models::contact::RecommendInfo;
use crate::common::client::models::message::{SendMessage, SentMessage, UploadChunk};

/// 响应体，只能被读取一次
#[async_trait]
pub trait ResponseBody: Send {
    async fn read_all(&mut self) -> io::Result<Vec<u8>>;
}

#[async_trait]
impl ResponseBody for Vec<u8> {
    async fn read_all(&mut self) -> io::Result<Vec<u8>> {
        Ok(std::mem::take(self))
    }
}

/// 传输层返回的原始响应，读取时被消耗，读完或丢弃时释放
pub struct RawResponse {
    body: Box<dyn ResponseBody>,
}

impl RawResponse {
    pub fn new(body: impl ResponseBody + 'static) -> Self {
        Self {
            body: Box::new(body),
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes.into())
    }

    pub async fn read_all(mut self) -> io::Result<Vec<u8>> {
        self.body.read_all().await
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse").finish_non_exhaustive()
    }
}

pub type TransportResult = Result<RawResponse, TransportError>;

/// 真正发请求的那一层，每个方法对应一个接口，参数已经准备好
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_login_uuid(&self) -> TransportResult;

    async fn check_login(&self, uuid: &str) -> TransportResult;

    async fn get_login_info(&self, redirect: &Url) -> TransportResult;

    async fn web_init(
        &self,
        domain: &WxDomain,
        info: &LoginInfo,
        request: &BaseRequest,
    ) -> TransportResult;

    async fn status_notify(&self, session: &Session) -> TransportResult;

    async fn sync_check(&self, session: &Session) -> TransportResult;

    async fn web_wx_sync(&self, session: &Session) -> TransportResult;

    async fn get_contact(&self, session: &Session) -> TransportResult;

    async fn batch_get_contact(&self, session: &Session, user_names: &[String]) -> TransportResult;

    async fn send_msg(&self, session: &Session, msg: &SendMessage) -> TransportResult;

    async fn send_msg_img(&self, session: &Session, msg: &SendMessage) -> TransportResult;

    async fn send_app_msg(&self, session: &Session, msg: &SendMessage) -> TransportResult;

    // 上传一个分片，分片的顺序和检查由调用方负责
    async fn upload_chunk(&self, session: &Session, chunk: &UploadChunk<'_>) -> TransportResult;

    async fn oplog(
        &self,
        session: &Session,
        to_user_name: &str,
        remark_name: &str,
    ) -> TransportResult;

    async fn logout(&self, session: &Session) -> TransportResult;

    async fn add_chat_room_members(
        &self,
        session: &Session,
        group_user_name: &str,
        user_names: &[String],
    ) -> TransportResult;

    async fn remove_chat_room_members(
        &self,
        session: &Session,
        group_user_name: &str,
        user_names: &[String],
    ) -> TransportResult;

    async fn verify_user(
        &self,
        session: &Session,
        info: &RecommendInfo,
        verify_content: &str,
    ) -> TransportResult;

    async fn revoke_msg(&self, session: &Session, msg: &SentMessage) -> TransportResult;
}

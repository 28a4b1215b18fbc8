#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use wx_web_client::Session;
use wx_web_client::common::client::domain::WxDomain;
use wx_web_client::common::client::error::TransportError;
use wx_web_client::common::client::models::auth::{LoginInfo, WebInitResponse};
use wx_web_client::common::client::models::common::BaseRequest;
use wx_web_client::common::client::models::contact::RecommendInfo;
use wx_web_client::common::client::models::message::{SendMessage, SentMessage, UploadChunk};
use wx_web_client::common::client::transport::{
    RawResponse, ResponseBody, Transport, TransportResult,
};

pub const OK_STATUS: &str = r#"{"BaseResponse":{"Ret":0,"ErrMsg":""}}"#;

pub const LOGIN_INFO_XML: &str = "<error><ret>0</ret><message></message>\
    <skey>@crypt_skey</skey><wxsid>sid123</wxsid><wxuin>10001</wxuin>\
    <pass_ticket>ticket%2B1</pass_ticket><isgrayscale>1</isgrayscale></error>";

pub const WEB_INIT_JSON: &str = r#"{
    "BaseResponse": {"Ret": 0, "ErrMsg": ""},
    "Count": 1,
    "ContactList": [{"UserName": "filehelper", "NickName": "文件传输助手"}],
    "SyncKey": {"Count": 2, "List": [{"Key": 1, "Val": 100}, {"Key": 2, "Val": 200}]},
    "User": {"Uin": 10001, "UserName": "@self", "NickName": "测试用户"},
    "ChatSet": "filehelper",
    "SKey": "@crypt_skey",
    "ClientVersion": 1,
    "SystemTime": 1700000000
}"#;

/// 按接口名预先排好响应的假传输层，同时记录调用次数
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<HashMap<&'static str, VecDeque<TransportResult>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    sent: Mutex<Vec<SendMessage>>,
    chunks: Mutex<Vec<(usize, usize, usize)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, endpoint: &'static str, reply: TransportResult) {
        self.replies
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(reply);
    }

    pub fn push_body(&self, endpoint: &'static str, body: &str) {
        self.push(endpoint, Ok(RawResponse::from_bytes(body.as_bytes().to_vec())));
    }

    pub fn push_err(&self, endpoint: &'static str, err: TransportError) {
        self.push(endpoint, Err(err));
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn sent_messages(&self) -> Vec<SendMessage> {
        self.sent.lock().unwrap().clone()
    }

    // 每个上传分片的 (index, count, len)
    pub fn uploaded_chunks(&self) -> Vec<(usize, usize, usize)> {
        self.chunks.lock().unwrap().clone()
    }

    fn next(&self, endpoint: &'static str) -> TransportResult {
        *self.calls.lock().unwrap().entry(endpoint).or_default() += 1;
        self.replies
            .lock()
            .unwrap()
            .get_mut(endpoint)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                Err(TransportError::Io(io::Error::other(format!(
                    "没有为 {} 准备响应",
                    endpoint
                ))))
            })
    }

    fn record(&self, msg: &SendMessage) {
        self.sent.lock().unwrap().push(msg.clone());
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_login_uuid(&self) -> TransportResult {
        self.next("get_login_uuid")
    }

    async fn check_login(&self, _uuid: &str) -> TransportResult {
        self.next("check_login")
    }

    async fn get_login_info(&self, _redirect: &Url) -> TransportResult {
        self.next("get_login_info")
    }

    async fn web_init(
        &self,
        _domain: &WxDomain,
        _info: &LoginInfo,
        _request: &BaseRequest,
    ) -> TransportResult {
        self.next("web_init")
    }

    async fn status_notify(&self, _session: &Session) -> TransportResult {
        self.next("status_notify")
    }

    async fn sync_check(&self, _session: &Session) -> TransportResult {
        self.next("sync_check")
    }

    async fn web_wx_sync(&self, _session: &Session) -> TransportResult {
        self.next("web_wx_sync")
    }

    async fn get_contact(&self, _session: &Session) -> TransportResult {
        self.next("get_contact")
    }

    async fn batch_get_contact(&self, _session: &Session, _names: &[String]) -> TransportResult {
        self.next("batch_get_contact")
    }

    async fn send_msg(&self, _session: &Session, msg: &SendMessage) -> TransportResult {
        self.record(msg);
        self.next("send_msg")
    }

    async fn send_msg_img(&self, _session: &Session, msg: &SendMessage) -> TransportResult {
        self.record(msg);
        self.next("send_msg_img")
    }

    async fn send_app_msg(&self, _session: &Session, msg: &SendMessage) -> TransportResult {
        self.record(msg);
        self.next("send_app_msg")
    }

    async fn upload_chunk(&self, _session: &Session, chunk: &UploadChunk<'_>) -> TransportResult {
        self.chunks
            .lock()
            .unwrap()
            .push((chunk.index, chunk.count, chunk.data().len()));
        self.next("upload_chunk")
    }

    async fn oplog(&self, _session: &Session, _to: &str, _remark: &str) -> TransportResult {
        self.next("oplog")
    }

    async fn logout(&self, _session: &Session) -> TransportResult {
        self.next("logout")
    }

    async fn add_chat_room_members(
        &self,
        _session: &Session,
        _group: &str,
        _names: &[String],
    ) -> TransportResult {
        self.next("add_chat_room_members")
    }

    async fn remove_chat_room_members(
        &self,
        _session: &Session,
        _group: &str,
        _names: &[String],
    ) -> TransportResult {
        self.next("remove_chat_room_members")
    }

    async fn verify_user(
        &self,
        _session: &Session,
        _info: &RecommendInfo,
        _content: &str,
    ) -> TransportResult {
        self.next("verify_user")
    }

    async fn revoke_msg(&self, _session: &Session, _msg: &SentMessage) -> TransportResult {
        self.next("revoke_msg")
    }
}

/// 被释放时计数的响应体
pub struct CountingBody {
    data: Vec<u8>,
    drops: Arc<AtomicUsize>,
}

impl CountingBody {
    pub fn new(data: &str, drops: Arc<AtomicUsize>) -> Self {
        Self {
            data: data.as_bytes().to_vec(),
            drops,
        }
    }
}

#[async_trait]
impl ResponseBody for CountingBody {
    async fn read_all(&mut self) -> io::Result<Vec<u8>> {
        Ok(std::mem::take(&mut self.data))
    }
}

impl Drop for CountingBody {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// 读到一半就断开的响应体
pub struct BrokenBody;

#[async_trait]
impl ResponseBody for BrokenBody {
    async fn read_all(&mut self) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "连接被重置"))
    }
}

pub fn sample_login_info() -> LoginInfo {
    LoginInfo {
        ret: 0,
        message: String::new(),
        skey: "@crypt_skey".to_string(),
        sid: "sid123".to_string(),
        uin: 10001,
        pass_ticket: "ticket%2B1".to_string(),
        is_gray_scale: 1,
    }
}

pub fn sample_session() -> Session {
    let info = sample_login_info();
    let request = BaseRequest::from_login_info(&info);
    let init: WebInitResponse = serde_json::from_str(WEB_INIT_JSON).unwrap();
    Session::new(WxDomain::default(), info, request, init)
}

pub fn status_body(code: i64, msg: &str) -> String {
    format!(r#"{{"BaseResponse":{{"Ret":{},"ErrMsg":"{}"}}}}"#, code, msg)
}

pub fn message_body(msg_id: &str) -> String {
    format!(
        r#"{{"BaseResponse":{{"Ret":0,"ErrMsg":""}},"MsgID":"{}","LocalID":"1"}}"#,
        msg_id
    )
}

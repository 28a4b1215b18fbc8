use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cookie_store::CookieStore;
use flate2::read::GzDecoder;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, LOCATION, REFERER, USER_AGENT,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use reqwest_cookie_store::CookieStoreMutex;
use serde_json::{Value, json};
use tracing::{debug, error};
use url::Url;

use crate::auth::session::Session;
use crate::common::client::domain::WxDomain;
use crate::common::client::error::TransportError;
use crate::common::client::models::auth::LoginInfo;
use crate::common::client::models::common::BaseRequest;
use crate::common::client::models::contact::RecommendInfo;
use crate::common::client::models::message::{SendMessage, SentMessage, UploadChunk};
use crate::common::client::transport::{RawResponse, ResponseBody, Transport, TransportResult};

const APP_ID: &str = "wx782c26e4c19acffb";
const JS_LOGIN_URL: &str = "https://login.wx.qq.com/jslogin";
const LOGIN_CHECK_URL: &str = "https://login.wx.qq.com/cgi-bin/mmwebwx-bin/login";
const LOGIN_PAGE_URL: &str = "https://wx.qq.com/cgi-bin/mmwebwx-bin/webwxnewloginpage";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    // synccheck 服务端会挂起二十多秒，超时不能太短
    pub timeout: Duration,
    pub user_agent: String,
    // 桌面模式登录
    pub desktop_mode: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            desktop_mode: false,
        }
    }
}

// 自动携带 cookie 的 HTTP 客户端
#[derive(Debug, Clone)]
pub struct WxClient {
    inner: Client,
    cookie_store: Arc<CookieStoreMutex>,
    config: ClientConfig,
}

impl WxClient {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, TransportError> {
        let cookie_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let inner = ClientBuilder::new()
            .timeout(config.timeout)
            .cookie_provider(Arc::clone(&cookie_store))
            .default_headers(Self::get_default_headers(&config))
            .build()?;

        Ok(Self {
            inner,
            cookie_store,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn get_default_headers(config: &ClientConfig) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://wx.qq.com/"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers
    }

    fn cookie_value(&self, name: &str) -> Option<String> {
        let store = self.cookie_store.lock().ok()?;
        store
            .iter_any()
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_string())
    }

    async fn send(&self, request: RequestBuilder) -> TransportResult {
        let resp = request.send().await.map_err(|e| {
            error!("请求失败: {}", e);
            TransportError::Http(e)
        })?;

        let status = resp.status();
        debug!("{} {}", status, resp.url());

        if status.is_redirection() && !resp.headers().contains_key(LOCATION) {
            return Err(TransportError::MissingLocation);
        }
        if status.is_server_error() {
            return Err(TransportError::ServerError(status.as_u16()));
        }

        Ok(RawResponse::new(HttpBody(Some(resp))))
    }

    async fn post_json(&self, url: String, body: Value) -> TransportResult {
        self.send(self.inner.post(url).json(&body)).await
    }

    fn endpoint(&self, session: &Session, name: &str, query: &[(&str, String)]) -> String {
        with_query(
            format!("{}/cgi-bin/mmwebwx-bin/{}", session.domain.base_url(), name),
            query,
        )
    }

    // 带 BaseRequest 的消息类请求
    async fn post_message(
        &self,
        session: &Session,
        name: &str,
        msg: &SendMessage,
    ) -> TransportResult {
        let url = self.endpoint(
            session,
            name,
            &[
                ("fun", "async".to_string()),
                ("f", "json".to_string()),
                ("lang", "zh_CN".to_string()),
                ("pass_ticket", session.login_info.pass_ticket.clone()),
            ],
        );
        let body = json!({
            "BaseRequest": session.base_request,
            "Msg": msg,
            "Scene": 0,
        });
        self.post_json(url, body).await
    }

    async fn update_chat_room(
        &self,
        session: &Session,
        fun: &str,
        list_field: &str,
        group_user_name: &str,
        user_names: &[String],
    ) -> TransportResult {
        let url = self.endpoint(
            session,
            "webwxupdatechatroom",
            &[
                ("fun", fun.to_string()),
                ("pass_ticket", session.login_info.pass_ticket.clone()),
            ],
        );
        let mut body = json!({
            "BaseRequest": session.base_request,
            "ChatRoomName": group_user_name,
        });
        body[list_field] = Value::String(user_names.join(","));
        self.post_json(url, body).await
    }
}

#[async_trait]
impl Transport for WxClient {
    async fn get_login_uuid(&self) -> TransportResult {
        let mut redirect_uri = LOGIN_PAGE_URL.to_string();
        if self.config.desktop_mode {
            redirect_uri.push_str("?mod=desktop");
        }
        let url = with_query(
            JS_LOGIN_URL.to_string(),
            &[
                ("appid", APP_ID.to_string()),
                ("redirect_uri", redirect_uri),
                ("fun", "new".to_string()),
                ("lang", "zh_CN".to_string()),
                ("_", now_millis().to_string()),
            ],
        );
        self.send(self.inner.get(url)).await
    }

    async fn check_login(&self, uuid: &str) -> TransportResult {
        let now = now_millis();
        let url = with_query(
            LOGIN_CHECK_URL.to_string(),
            &[
                ("loginicon", "true".to_string()),
                ("uuid", uuid.to_string()),
                ("tip", "0".to_string()),
                ("r", (-(now / 1579)).to_string()),
                ("_", now.to_string()),
            ],
        );
        self.send(self.inner.get(url)).await
    }

    async fn get_login_info(&self, redirect: &Url) -> TransportResult {
        let mut url = redirect.clone();
        url.query_pairs_mut()
            .append_pair("fun", "new")
            .append_pair("version", "v2");
        self.send(self.inner.get(url)).await
    }

    async fn web_init(
        &self,
        domain: &WxDomain,
        info: &LoginInfo,
        request: &BaseRequest,
    ) -> TransportResult {
        let url = with_query(
            format!("{}/cgi-bin/mmwebwx-bin/webwxinit", domain.base_url()),
            &[
                ("r", now_millis().to_string()),
                ("pass_ticket", info.pass_ticket.clone()),
            ],
        );
        self.post_json(url, json!({ "BaseRequest": request })).await
    }

    async fn status_notify(&self, session: &Session) -> TransportResult {
        let url = self.endpoint(
            session,
            "webwxstatusnotify",
            &[
                ("lang", "zh_CN".to_string()),
                ("pass_ticket", session.login_info.pass_ticket.clone()),
            ],
        );
        let body = json!({
            "BaseRequest": session.base_request,
            "Code": 3,
            "FromUserName": session.user_name(),
            "ToUserName": session.user_name(),
            "ClientMsgId": now_millis(),
        });
        self.post_json(url, body).await
    }

    async fn sync_check(&self, session: &Session) -> TransportResult {
        let now = now_millis();
        let url = with_query(
            format!("{}/cgi-bin/mmwebwx-bin/synccheck", session.domain.sync_url()),
            &[
                ("r", now.to_string()),
                ("skey", session.base_request.skey.clone()),
                ("sid", session.base_request.sid.clone()),
                ("uin", session.base_request.uin.to_string()),
                ("deviceid", session.base_request.device_id.clone()),
                ("synckey", session.sync_check_key().to_query()),
                ("_", now.to_string()),
            ],
        );
        self.send(self.inner.get(url)).await
    }

    async fn web_wx_sync(&self, session: &Session) -> TransportResult {
        let url = self.endpoint(
            session,
            "webwxsync",
            &[
                ("sid", session.base_request.sid.clone()),
                ("skey", session.base_request.skey.clone()),
                ("pass_ticket", session.login_info.pass_ticket.clone()),
            ],
        );
        let body = json!({
            "BaseRequest": session.base_request,
            "SyncKey": session.sync_key,
            "rr": -(now_millis() / 1000),
        });
        self.post_json(url, body).await
    }

    async fn get_contact(&self, session: &Session) -> TransportResult {
        let url = self.endpoint(
            session,
            "webwxgetcontact",
            &[
                ("r", now_millis().to_string()),
                ("skey", session.base_request.skey.clone()),
                ("pass_ticket", session.login_info.pass_ticket.clone()),
                ("seq", "0".to_string()),
            ],
        );
        self.send(self.inner.get(url)).await
    }

    async fn batch_get_contact(
        &self,
        session: &Session,
        user_names: &[String],
    ) -> TransportResult {
        let url = self.endpoint(
            session,
            "webwxbatchgetcontact",
            &[
                ("type", "ex".to_string()),
                ("r", now_millis().to_string()),
                ("pass_ticket", session.login_info.pass_ticket.clone()),
            ],
        );
        let list: Vec<Value> = user_names
            .iter()
            .map(|name| json!({ "UserName": name, "EncryChatRoomId": "" }))
            .collect();
        let body = json!({
            "BaseRequest": session.base_request,
            "Count": list.len(),
            "List": list,
        });
        self.post_json(url, body).await
    }

    async fn send_msg(&self, session: &Session, msg: &SendMessage) -> TransportResult {
        self.post_message(session, "webwxsendmsg", msg).await
    }

    async fn send_msg_img(&self, session: &Session, msg: &SendMessage) -> TransportResult {
        self.post_message(session, "webwxsendmsgimg", msg).await
    }

    async fn send_app_msg(&self, session: &Session, msg: &SendMessage) -> TransportResult {
        self.post_message(session, "webwxsendappmsg", msg).await
    }

    async fn upload_chunk(&self, session: &Session, chunk: &UploadChunk<'_>) -> TransportResult {
        let file = chunk.file;
        let url = with_query(
            format!("{}/cgi-bin/mmwebwx-bin/webwxuploadmedia", session.domain.file_url()),
            &[("f", "json".to_string())],
        );
        let total = file.size();
        let upload_request = json!({
            "UploadType": 2,
            "BaseRequest": session.base_request,
            "ClientMediaId": chunk.client_media_id,
            "TotalLen": total,
            "StartPos": 0,
            "DataLen": total,
            "MediaType": 4,
            "FromUserName": session.user_name(),
            "ToUserName": chunk.to_user_name,
            "FileMd5": chunk.file_md5,
        })
        .to_string();
        let data_ticket = self.cookie_value("webwx_data_ticket").unwrap_or_default();
        let modified = chrono::Utc::now()
            .format("%a %b %d %Y %H:%M:%S GMT+0000")
            .to_string();

        let part = Part::bytes(chunk.data().to_vec())
            .file_name(file.name.clone())
            .mime_str(file.mime_type())?;
        let mut form = Form::new()
            .text("id", "WU_FILE_0")
            .text("name", file.name.clone())
            .text("type", file.mime_type())
            .text("lastModifiedDate", modified)
            .text("size", total.to_string())
            .text("mediatype", file.media_type())
            .text("uploadmediarequest", upload_request)
            .text("webwx_data_ticket", data_ticket)
            .text("pass_ticket", session.login_info.pass_ticket.clone());
        if chunk.count > 1 {
            form = form
                .text("chunks", chunk.count.to_string())
                .text("chunk", chunk.index.to_string());
        }
        form = form.part("filename", part);

        debug!("上传分片 {}/{}: {}", chunk.index + 1, chunk.count, file.name);
        self.send(self.inner.post(url).multipart(form)).await
    }

    async fn oplog(
        &self,
        session: &Session,
        to_user_name: &str,
        remark_name: &str,
    ) -> TransportResult {
        let url = self.endpoint(
            session,
            "webwxoplog",
            &[
                ("lang", "zh_CN".to_string()),
                ("pass_ticket", session.login_info.pass_ticket.clone()),
            ],
        );
        let body = json!({
            "BaseRequest": session.base_request,
            "CmdId": 2,
            "RemarkName": remark_name,
            "UserName": to_user_name,
        });
        self.post_json(url, body).await
    }

    async fn logout(&self, session: &Session) -> TransportResult {
        let url = self.endpoint(
            session,
            "webwxlogout",
            &[
                ("redirect", "1".to_string()),
                ("type", "1".to_string()),
                ("skey", session.base_request.skey.clone()),
            ],
        );
        let form = [
            ("sid", session.base_request.sid.clone()),
            ("uin", session.base_request.uin.to_string()),
        ];
        self.send(self.inner.post(url).form(&form)).await
    }

    async fn add_chat_room_members(
        &self,
        session: &Session,
        group_user_name: &str,
        user_names: &[String],
    ) -> TransportResult {
        self.update_chat_room(session, "addmember", "AddMemberList", group_user_name, user_names)
            .await
    }

    async fn remove_chat_room_members(
        &self,
        session: &Session,
        group_user_name: &str,
        user_names: &[String],
    ) -> TransportResult {
        self.update_chat_room(session, "delmember", "DelMemberList", group_user_name, user_names)
            .await
    }

    async fn verify_user(
        &self,
        session: &Session,
        info: &RecommendInfo,
        verify_content: &str,
    ) -> TransportResult {
        let url = self.endpoint(
            session,
            "webwxverifyuser",
            &[
                ("r", now_millis().to_string()),
                ("lang", "zh_CN".to_string()),
                ("pass_ticket", session.login_info.pass_ticket.clone()),
            ],
        );
        let body = json!({
            "BaseRequest": session.base_request,
            "Opcode": 3,
            "SceneList": [33],
            "SceneListCount": 1,
            "VerifyContent": verify_content,
            "VerifyUserList": [{ "Value": info.user_name, "VerifyUserTicket": info.ticket }],
            "VerifyUserListSize": 1,
            "skey": session.base_request.skey,
        });
        self.post_json(url, body).await
    }

    async fn revoke_msg(&self, session: &Session, msg: &SentMessage) -> TransportResult {
        let url = self.endpoint(
            session,
            "webwxrevokemsg",
            &[
                ("lang", "zh_CN".to_string()),
                ("pass_ticket", session.login_info.pass_ticket.clone()),
            ],
        );
        let body = json!({
            "BaseRequest": session.base_request,
            "ClientMsgId": msg.message().client_msg_id,
            "SvrMsgId": msg.msg_id().unwrap_or_default(),
            "ToUserName": msg.message().to_user_name,
        });
        self.post_json(url, body).await
    }
}

// reqwest 响应体，读取时顺带处理 gzip
struct HttpBody(Option<Response>);

#[async_trait]
impl ResponseBody for HttpBody {
    async fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let resp = self
            .0
            .take()
            .ok_or_else(|| io::Error::other("响应体已被读取"))?;
        let raw = resp.bytes().await.map_err(io::Error::other)?;
        Ok(try_decompress(&raw))
    }
}

fn try_decompress(raw: &[u8]) -> Vec<u8> {
    if raw.starts_with(&[0x1f, 0x8b]) {
        let mut decoder = GzDecoder::new(raw);
        let mut decoded = Vec::new();
        if decoder.read_to_end(&mut decoded).is_ok() {
            return decoded;
        }
    }
    raw.to_vec() // 解压失败则原样使用
}

fn with_query(base: String, query: &[(&str, String)]) -> String {
    match serde_urlencoded::to_string(query) {
        Ok(q) if !q.is_empty() => format!("{}?{}", base, q),
        _ => base,
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

use std::path::Path;

use md5::{Digest, Md5};
use rand::Rng;
use serde::Serializer;
use serde_derive::{Deserialize, Serialize};

use super::common::{BaseResponse, HasStatus};

/// 发送消息的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Text = 1,
    Image = 3,
    App = 6,
}

impl serde::Serialize for MessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(*self as i32)
    }
}

/// 待发送的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessage {
    #[serde(rename = "Type")]
    pub kind: MessageType,
    pub content: String,
    pub from_user_name: String,
    pub to_user_name: String,
    #[serde(rename = "LocalID")]
    pub local_id: String,
    pub client_msg_id: String,
    pub media_id: String,
}

impl SendMessage {
    pub fn new(
        kind: MessageType,
        content: impl Into<String>,
        from_user_name: impl Into<String>,
        to_user_name: impl Into<String>,
        media_id: impl Into<String>,
    ) -> Self {
        let id = new_client_msg_id();
        Self {
            kind,
            content: content.into(),
            from_user_name: from_user_name.into(),
            to_user_name: to_user_name.into(),
            local_id: id.clone(),
            client_msg_id: id,
            media_id: media_id.into(),
        }
    }

    pub fn text(
        from_user_name: impl Into<String>,
        to_user_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(MessageType::Text, content, from_user_name, to_user_name, "")
    }

    pub fn media(
        kind: MessageType,
        from_user_name: impl Into<String>,
        to_user_name: impl Into<String>,
        media_id: impl Into<String>,
    ) -> Self {
        Self::new(kind, "", from_user_name, to_user_name, media_id)
    }
}

// 毫秒时间戳后面拼4位随机数
fn new_client_msg_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u16 = rand::rng().random_range(0..10000);
    format!("{}{:04}", millis, suffix)
}

/// 已提交的消息，服务端确认后才会带上 msg_id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    message: SendMessage,
    msg_id: Option<String>,
}

impl SentMessage {
    pub fn pending(message: SendMessage) -> Self {
        Self {
            message,
            msg_id: None,
        }
    }

    pub(crate) fn mark_sent(&mut self, msg_id: String) {
        self.msg_id = Some(msg_id);
    }

    pub fn message(&self) -> &SendMessage {
        &self.message
    }

    pub fn msg_id(&self) -> Option<&str> {
        self.msg_id.as_deref()
    }

    pub fn is_sent(&self) -> bool {
        self.msg_id.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(rename = "BaseResponse")]
    pub base_response: BaseResponse,
    #[serde(rename = "MsgID", default)]
    pub msg_id: String,
    #[serde(rename = "LocalID", default)]
    pub local_id: String,
}

impl HasStatus for MessageResponse {
    fn base_response(&self) -> &BaseResponse {
        &self.base_response
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "BaseResponse")]
    pub base_response: BaseResponse,
    #[serde(rename = "MediaId", default)]
    pub media_id: String,
    #[serde(rename = "StartPos", default)]
    pub start_pos: i64,
}

impl HasStatus for UploadResponse {
    fn base_response(&self) -> &BaseResponse {
        &self.base_response
    }
}

/// 待上传的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        Ok(Self { name, data })
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 按 512 KiB 切片，空文件也算一片
    pub fn chunk_count(&self) -> usize {
        self.data.len().div_ceil(UPLOAD_CHUNK_SIZE).max(1)
    }

    pub fn md5_hex(&self) -> String {
        format!("{:x}", Md5::digest(&self.data))
    }

    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "mp4" => "video/mp4",
            "txt" => "text/plain",
            "pdf" => "application/pdf",
            _ => "application/octet-stream",
        }
    }

    // 上传表单里的 mediatype 字段
    pub fn media_type(&self) -> &'static str {
        if self.mime_type().starts_with("image/") {
            "pic"
        } else if self.mime_type().starts_with("video/") {
            "video"
        } else {
            "doc"
        }
    }
}

pub const UPLOAD_CHUNK_SIZE: usize = 512 * 1024;

/// 分片上传中的一片，同一个文件的所有分片共用 client_media_id 和 file_md5
#[derive(Debug, Clone)]
pub struct UploadChunk<'a> {
    pub file: &'a MediaFile,
    pub to_user_name: &'a str,
    pub index: usize,
    pub count: usize,
    pub client_media_id: i64,
    pub file_md5: &'a str,
}

impl UploadChunk<'_> {
    pub fn data(&self) -> &[u8] {
        let start = self.index * UPLOAD_CHUNK_SIZE;
        let end = (start + UPLOAD_CHUNK_SIZE).min(self.file.data.len());
        self.file.data.get(start..end).unwrap_or_default()
    }

    // 只有最后一片的响应里带 MediaId
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.count
    }
}

pub mod app_message;

use tracing::{debug, info, warn};

use app_message::FileAppMessage;

use crate::auth::Session;
use crate::common::client::error::{SendError, WxError};
use crate::common::client::models::message::{
    MediaFile, MessageResponse, MessageType, SendMessage, SentMessage, UploadChunk,
    UploadResponse,
};
use crate::common::client::response::ResponseEnvelope;
use crate::common::client::transport::{Transport, TransportResult};

/// 消息发送
pub struct MessageDispatch<'a> {
    transport: &'a dyn Transport,
}

impl<'a> MessageDispatch<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// 按消息类型选择接口发送，成功后把服务端的 MsgID 写回消息
    pub async fn send(
        &self,
        session: &Session,
        msg: SendMessage,
    ) -> Result<SentMessage, SendError> {
        if msg.to_user_name.is_empty() {
            return Err(SendError {
                attempted: Some(SentMessage::pending(msg)),
                error: WxError::InvalidInput("接收者为空".to_string()),
            });
        }

        let result = match msg.kind {
            MessageType::Text => self.transport.send_msg(session, &msg).await,
            MessageType::Image => self.transport.send_msg_img(session, &msg).await,
            MessageType::App => self.transport.send_app_msg(session, &msg).await,
        };
        finish_send(msg, result).await
    }

    pub async fn send_text(
        &self,
        session: &Session,
        to_user_name: &str,
        content: &str,
    ) -> Result<SentMessage, SendError> {
        let msg = SendMessage::text(session.user_name(), to_user_name, content);
        self.send(session, msg).await
    }

    pub async fn send_app_message(
        &self,
        session: &Session,
        msg: SendMessage,
    ) -> Result<SentMessage, SendError> {
        self.send(session, msg).await
    }

    /// 分片上传文件
    ///
    /// 每一片的 BaseResponse 都要检查，中间任何一片失败就停止。
    /// 最后一片成功但 MediaId 为空也算失败
    pub async fn upload_media(
        &self,
        session: &Session,
        file: &MediaFile,
        to_user_name: &str,
    ) -> Result<UploadResponse, WxError> {
        if file.data.is_empty() {
            return Err(WxError::InvalidInput(format!("文件为空: {}", file.name)));
        }

        let count = file.chunk_count();
        let file_md5 = file.md5_hex();
        let client_media_id = chrono::Utc::now().timestamp_millis();

        for index in 0..count {
            let chunk = UploadChunk {
                file,
                to_user_name,
                index,
                count,
                client_media_id,
                file_md5: &file_md5,
            };
            let resp = ResponseEnvelope::new(self.transport.upload_chunk(session, &chunk).await);
            if !chunk.is_last() {
                resp.expect_ok().await.inspect_err(|e| {
                    warn!("分片 {}/{} 上传失败: {}", index + 1, count, e);
                })?;
                continue;
            }

            let upload: UploadResponse = resp.decode_checked().await?;
            if upload.media_id.is_empty() {
                return Err(WxError::Upload(format!("{} 未返回 MediaId", file.name)));
            }
            debug!("上传完成: {} -> {}", file.name, upload.media_id);
            return Ok(upload);
        }

        Err(WxError::Upload(format!("{} 没有可上传的分片", file.name)))
    }

    // 发送图片消息：先上传再发送
    pub async fn send_image(
        &self,
        session: &Session,
        file: &MediaFile,
        to_user_name: &str,
    ) -> Result<SentMessage, SendError> {
        let upload = self.upload_media(session, file, to_user_name).await?;
        let msg = SendMessage::media(
            MessageType::Image,
            session.user_name(),
            to_user_name,
            upload.media_id,
        );
        self.send(session, msg).await
    }

    // 发送文件消息：上传后用 appmsg 引用 MediaId
    pub async fn send_file(
        &self,
        session: &Session,
        file: &MediaFile,
        to_user_name: &str,
    ) -> Result<SentMessage, SendError> {
        let upload = self.upload_media(session, file, to_user_name).await?;
        let content =
            FileAppMessage::new(&file.name, file.size(), upload.media_id, file.extension())
                .to_xml();
        let msg = SendMessage::new(
            MessageType::App,
            content,
            session.user_name(),
            to_user_name,
            "",
        );
        self.send_app_message(session, msg).await
    }

    // 撤回消息，只能撤回服务端已确认的消息
    pub async fn revoke(&self, session: &Session, sent: &SentMessage) -> Result<(), WxError> {
        if sent.msg_id().is_none() {
            return Err(WxError::InvalidInput("消息未发送成功，无法撤回".to_string()));
        }
        let resp = ResponseEnvelope::new(self.transport.revoke_msg(session, sent).await);
        resp.expect_ok().await?;
        info!("消息已撤回: {}", sent.msg_id().unwrap_or_default());
        Ok(())
    }
}

async fn finish_send(msg: SendMessage, result: TransportResult) -> Result<SentMessage, SendError> {
    let mut sent = SentMessage::pending(msg);
    match parse_message_response(ResponseEnvelope::new(result)).await {
        Ok(msg_id) => {
            sent.mark_sent(msg_id);
            debug!("消息发送成功: {:?}", sent.msg_id());
            Ok(sent)
        }
        Err(error) => Err(SendError {
            attempted: Some(sent),
            error,
        }),
    }
}

async fn parse_message_response(resp: ResponseEnvelope) -> Result<String, WxError> {
    let reply: MessageResponse = resp.decode_checked().await?;
    if reply.msg_id.is_empty() {
        return Err(WxError::Parse("发送成功但未返回 MsgID".to_string()));
    }
    Ok(reply.msg_id)
}

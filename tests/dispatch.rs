mod common;

use common::{FakeTransport, OK_STATUS, message_body, sample_session, status_body};
use wx_web_client::common::client::models::message::{
    MediaFile, MessageType, SendMessage, UPLOAD_CHUNK_SIZE,
};
use wx_web_client::message::app_message::FileAppMessage;
use wx_web_client::{MessageDispatch, RetryAdvice, TransportError, WxError};

const UPLOAD_OK: &str =
    r#"{"BaseResponse":{"Ret":0,"ErrMsg":""},"MediaId":"@crypt_media_1","StartPos":4}"#;
const UPLOAD_EMPTY_ID: &str = r#"{"BaseResponse":{"Ret":0,"ErrMsg":""},"MediaId":"","StartPos":4}"#;

#[tokio::test]
async fn test_send_text_keeps_server_msg_id() {
    let transport = FakeTransport::new();
    transport.push_body("send_msg", &message_body("12345"));
    let session = sample_session();

    let sent = MessageDispatch::new(&transport)
        .send_text(&session, "@friend", "你好")
        .await
        .unwrap();

    assert!(sent.is_sent());
    assert_eq!(sent.msg_id(), Some("12345"));
    assert_eq!(sent.message().content, "你好");
    assert_eq!(sent.message().from_user_name, "@self");

    let copy = sent.clone();
    assert_eq!(copy.msg_id(), Some("12345"));
    assert_eq!(transport.sent_messages()[0].kind, MessageType::Text);
}

#[tokio::test]
async fn test_send_remote_error_returns_attempted() {
    let transport = FakeTransport::new();
    transport.push_body("send_msg", &status_body(1205, ""));
    let session = sample_session();

    let err = MessageDispatch::new(&transport)
        .send_text(&session, "@friend", "你好")
        .await
        .unwrap_err();

    let attempted = err.attempted.expect("应该带回尝试发送的消息");
    assert!(!attempted.is_sent());
    assert_eq!(attempted.message().to_user_name, "@friend");
    assert!(matches!(err.error, WxError::Remote(ref e) if e.code == 1205));
}

#[tokio::test]
async fn test_send_without_msg_id_is_parse_error() {
    let transport = FakeTransport::new();
    transport.push_body("send_msg", OK_STATUS);
    let session = sample_session();

    let err = MessageDispatch::new(&transport)
        .send_text(&session, "@friend", "你好")
        .await
        .unwrap_err();

    assert!(err.attempted.is_some());
    assert!(matches!(err.error, WxError::Parse(_)));
}

#[tokio::test]
async fn test_send_transport_failure() {
    let transport = FakeTransport::new();
    transport.push_err("send_msg", TransportError::ServerError(502));
    let session = sample_session();

    let err = MessageDispatch::new(&transport)
        .send_text(&session, "@friend", "你好")
        .await
        .unwrap_err();

    assert!(err.attempted.is_some());
    assert_eq!(err.error.advice(), RetryAdvice::RetryLater);
}

#[tokio::test]
async fn test_send_empty_recipient() {
    let transport = FakeTransport::new();
    let session = sample_session();

    let err = MessageDispatch::new(&transport)
        .send(&session, SendMessage::text("@self", "", "你好"))
        .await
        .unwrap_err();

    assert!(matches!(err.error, WxError::InvalidInput(_)));
    assert!(err.attempted.is_some());
    assert_eq!(transport.calls("send_msg"), 0);
}

#[tokio::test]
async fn test_send_image_uploads_then_sends() {
    let transport = FakeTransport::new();
    transport.push_body("upload_chunk", UPLOAD_OK);
    transport.push_body("send_msg_img", &message_body("777"));
    let session = sample_session();
    let file = MediaFile::new("cat.png", vec![1u8, 2, 3, 4]);

    let sent = MessageDispatch::new(&transport)
        .send_image(&session, &file, "@friend")
        .await
        .unwrap();

    assert_eq!(sent.msg_id(), Some("777"));
    assert_eq!(sent.message().kind, MessageType::Image);
    assert_eq!(sent.message().media_id, "@crypt_media_1");
    assert_eq!(transport.calls("upload_chunk"), 1);
}

#[tokio::test]
async fn test_upload_empty_media_id_never_sends() {
    let transport = FakeTransport::new();
    transport.push_body("upload_chunk", UPLOAD_EMPTY_ID);
    let session = sample_session();
    let file = MediaFile::new("cat.png", vec![1u8, 2, 3, 4]);

    let err = MessageDispatch::new(&transport)
        .send_image(&session, &file, "@friend")
        .await
        .unwrap_err();

    assert!(matches!(err.error, WxError::Upload(_)));
    assert!(err.attempted.is_none());
    assert_eq!(transport.calls("send_msg_img"), 0);
    assert!(transport.sent_messages().is_empty());
}

#[tokio::test]
async fn test_upload_remote_error() {
    let transport = FakeTransport::new();
    transport.push_body("upload_chunk", &status_body(1, "参数错误"));
    let session = sample_session();
    let file = MediaFile::new("report.pdf", b"%PDF".to_vec());

    let err = MessageDispatch::new(&transport)
        .upload_media(&session, &file, "@friend")
        .await
        .unwrap_err();
    assert!(matches!(err, WxError::Remote(ref e) if e.code == 1));
}

#[tokio::test]
async fn test_upload_checks_every_chunk() {
    let transport = FakeTransport::new();
    transport.push_body("upload_chunk", &status_body(1, "参数错误"));
    transport.push_body("upload_chunk", UPLOAD_OK);
    let session = sample_session();
    let file = MediaFile::new("big.png", vec![7u8; UPLOAD_CHUNK_SIZE + 10]);

    let err = MessageDispatch::new(&transport)
        .send_image(&session, &file, "@friend")
        .await
        .unwrap_err();

    assert!(matches!(err.error, WxError::Remote(ref e) if e.code == 1));
    assert!(err.attempted.is_none());
    assert_eq!(transport.calls("upload_chunk"), 1);
    assert_eq!(transport.calls("send_msg_img"), 0);
}

#[tokio::test]
async fn test_upload_multiple_chunks() {
    let transport = FakeTransport::new();
    transport.push_body("upload_chunk", OK_STATUS);
    transport.push_body("upload_chunk", UPLOAD_OK);
    transport.push_body("send_msg_img", &message_body("999"));
    let session = sample_session();
    let file = MediaFile::new("big.png", vec![7u8; UPLOAD_CHUNK_SIZE + 10]);

    let sent = MessageDispatch::new(&transport)
        .send_image(&session, &file, "@friend")
        .await
        .unwrap();

    assert_eq!(sent.message().media_id, "@crypt_media_1");
    assert_eq!(
        transport.uploaded_chunks(),
        vec![(0, 2, UPLOAD_CHUNK_SIZE), (1, 2, 10)]
    );
}

#[tokio::test]
async fn test_upload_empty_file() {
    let transport = FakeTransport::new();
    let session = sample_session();

    let err = MessageDispatch::new(&transport)
        .upload_media(&session, &MediaFile::new("empty.txt", Vec::new()), "@friend")
        .await
        .unwrap_err();
    assert!(matches!(err, WxError::InvalidInput(_)));
    assert_eq!(transport.calls("upload_chunk"), 0);
}

#[tokio::test]
async fn test_send_file_uses_app_message() {
    let transport = FakeTransport::new();
    transport.push_body("upload_chunk", UPLOAD_OK);
    transport.push_body("send_app_msg", &message_body("888"));
    let session = sample_session();
    let file = MediaFile::new("report & notes.pdf", b"%PDF-1.4".to_vec());

    let sent = MessageDispatch::new(&transport)
        .send_file(&session, &file, "@friend")
        .await
        .unwrap();

    assert_eq!(sent.msg_id(), Some("888"));
    assert_eq!(sent.message().kind, MessageType::App);
    let content = &transport.sent_messages()[0].content;
    assert!(content.contains("<title>report &amp; notes.pdf</title>"));
    assert!(content.contains("<totallen>8</totallen>"));
    assert!(content.contains("<attachid>@crypt_media_1</attachid>"));
    assert!(content.contains("<fileext>pdf</fileext>"));
}

#[test]
fn test_send_message_json_fields() {
    let msg = SendMessage::media(MessageType::Image, "@self", "@friend", "@crypt_media_1");
    let value = serde_json::to_value(&msg).unwrap();

    assert_eq!(value["Type"], 3);
    assert_eq!(value["FromUserName"], "@self");
    assert_eq!(value["ToUserName"], "@friend");
    assert_eq!(value["MediaId"], "@crypt_media_1");
    assert_eq!(value["LocalID"], value["ClientMsgId"]);
}

#[test]
fn test_file_app_message_xml() {
    let xml = FileAppMessage::new("a.txt", 3, "@id", "txt").to_xml();
    assert!(xml.starts_with("<appmsg appid='wxeb7ec651dd0aefa9'"));
    assert!(xml.contains("<type>6</type>"));
    assert!(xml.ends_with("</appmsg>"));
}

#[tokio::test]
async fn test_revoke_requires_sent_message() {
    let transport = FakeTransport::new();
    let session = sample_session();
    let pending =
        wx_web_client::common::client::models::message::SentMessage::pending(SendMessage::text(
            "@self", "@friend", "你好",
        ));

    let err = MessageDispatch::new(&transport)
        .revoke(&session, &pending)
        .await
        .unwrap_err();
    assert!(matches!(err, WxError::InvalidInput(_)));
    assert_eq!(transport.calls("revoke_msg"), 0);
}

#[tokio::test]
async fn test_revoke_sent_message() {
    let transport = FakeTransport::new();
    transport.push_body("send_msg", &message_body("12345"));
    transport.push_body("revoke_msg", OK_STATUS);
    transport.push_body("revoke_msg", &status_body(-1, "撤回超时"));
    let session = sample_session();
    let dispatch = MessageDispatch::new(&transport);

    let sent = dispatch.send_text(&session, "@friend", "你好").await.unwrap();
    dispatch.revoke(&session, &sent).await.unwrap();

    let err = dispatch.revoke(&session, &sent).await.unwrap_err();
    assert!(matches!(err, WxError::Remote(ref e) if e.message == "撤回超时"));
}

#[tokio::test]
async fn test_media_file_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.JPG");
    tokio::fs::write(&path, b"\xff\xd8\xff").await.unwrap();

    let file = MediaFile::from_path(&path).await.unwrap();
    assert_eq!(file.name, "photo.JPG");
    assert_eq!(file.size(), 3);
    assert_eq!(file.extension(), "jpg");
    assert_eq!(file.mime_type(), "image/jpeg");
    assert_eq!(file.media_type(), "pic");
}

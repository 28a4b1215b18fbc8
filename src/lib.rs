//! 微信网页版协议客户端
//!
//! 扫码登录握手、同步检查轮询、消息发送以及响应的解码和状态码分类。
//! 真正发 HTTP 请求的是 [`Transport`]，默认实现是基于 reqwest 的 [`WxClient`]。

pub mod auth;
pub mod common;
pub mod contact;
pub mod message;

pub use auth::sync::{SyncExit, SyncHandler, SyncPoller};
pub use auth::{HandshakeStage, LoginHandshake, LoginObserver, LoginOptions, LoginOutcome, Session};
pub use common::client::client::{ClientConfig, WxClient};
pub use common::client::error::{RemoteError, RetryAdvice, SendError, TransportError, WxError};
pub use common::client::transport::{RawResponse, ResponseBody, Transport, TransportResult};
pub use contact::ContactService;
pub use message::MessageDispatch;

//! WeChat API operations
//!
//! Each operation is a plain value implementing [`Operation`]; send it with
//! [`WechatClient::send`](crate::client::WechatClient::send),
//! [`request`](crate::client::WechatClient::request) or
//! [`download`](crate::client::WechatClient::download).
//!
//! - [`message`] - Subscribe, customer-service and WeCom application messages
//! - [`security`] - Text and image content security checks
//! - [`qrcode`] - Unlimited mini program codes
//! - [`paid`] - UnionID lookup after payment
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wechat_sdk::api::message::SubscribeMessage;
//! use wechat_sdk::credential::MiniProgramCredential;
//! use wechat_sdk::{RequestContext, WechatClient};
//!
//! # async fn run() -> Result<(), wechat_sdk::WechatError> {
//! let client = WechatClient::builder().build()?;
//! let tokens = client.token_manager(Arc::new(MiniProgramCredential::new("wx123", "secret")));
//!
//! let message = SubscribeMessage::new("openid", "template_id")
//!     .page("pages/index/index")
//!     .data("thing1", "Order #123");
//!
//! match client.send(&RequestContext::new(), &tokens, &message).await {
//!     Err(e) if e.is_user_declined() => { /* user has not subscribed */ }
//!     other => other?,
//! }
//! # Ok(())
//! # }
//! ```

pub mod message;
pub mod operation;
pub mod paid;
pub mod qrcode;
pub mod security;

pub use message::{CustomContent, CustomMessage, SubscribeMessage, WorkAppMessage, WorkContent};
pub use operation::{Operation, ACCESS_TOKEN_PARAM};
pub use paid::{PaidUnionId, PaidUnionIdResponse};
pub use qrcode::{LineColor, UnlimitedQrCode};
pub use security::{ImgSecCheck, MsgSecCheck, MAX_IMAGE_SIZE};

/// Host of the mini program and official account APIs.
pub const API_HOST: &str = "api.weixin.qq.com";

/// Host of the WeCom (WeChat Work) APIs.
pub const WORK_API_HOST: &str = "qyapi.weixin.qq.com";

pub(crate) const TOKEN_ENDPOINT: &str = "cgi-bin/token";
pub(crate) const WORK_TOKEN_ENDPOINT: &str = "cgi-bin/gettoken";

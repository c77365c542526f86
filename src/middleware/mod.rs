//! Middleware components for the WeChat SDK.
//!
//! Every request sent by [`WechatClient::perform`](crate::client::WechatClient::perform)
//! passes through an optional tower [`Layer`] installed with
//! [`WechatClientBuilder::with_middleware`](crate::client::WechatClientBuilder::with_middleware).
//! Layers compose with [`ServiceBuilder`].
//!
//! ## Usage
//!
//! ```no_run
//! use wechat_sdk::middleware::LoggingMiddleware;
//! use wechat_sdk::WechatClient;
//!
//! # fn main() -> Result<(), wechat_sdk::WechatError> {
//! let client = WechatClient::builder()
//!     .with_middleware(LoggingMiddleware::new().verbose())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

pub use tower::{Layer, Service, ServiceBuilder};

mod logging;

pub use logging::{LoggingMiddleware, LoggingMiddlewareService};

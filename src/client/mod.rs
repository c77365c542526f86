//! WeChat HTTP Client module
//!
//! This module contains the [`WechatClient`], its configuration and the
//! response decoders.

mod config;
pub use config::{ClientConfig, DEFAULT_TOKEN_SAFETY_MARGIN};

mod decoder;
pub use decoder::{Decode, ResponseDecoder};

mod wechat_client;
pub use wechat_client::WechatClient;

mod builder;
pub use builder::WechatClientBuilder;

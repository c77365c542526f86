//! WeChat platform SDK for Rust
//!
//! Server-side plumbing shared by WeChat mini programs, official accounts
//! and WeCom (WeChat Work) applications:
//!
//! - access token lifecycle with a pluggable [`Cache`](cache::Cache) and
//!   single-flight refresh ([`TokenManager`])
//! - one request path for every API call ([`WechatClient::perform`])
//! - typed operations sent through [`WechatClient::send`],
//!   [`WechatClient::request`] and [`WechatClient::download`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use wechat_sdk::api::SubscribeMessage;
//! use wechat_sdk::credential::MiniProgramCredential;
//! use wechat_sdk::{RequestContext, WechatClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WechatClient::builder().build()?;
//!     let tokens = client.token_manager(Arc::new(MiniProgramCredential::new(
//!         "wx1234567890abcdef",
//!         "your_secret",
//!     )));
//!
//!     let ctx = RequestContext::with_timeout(std::time::Duration::from_secs(10));
//!     let message = SubscribeMessage::new("openid", "template_id").data("thing1", "Order #123");
//!     client.send(&ctx, &tokens, &message).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Operations (messages, security checks, mini program codes)
//! - [`cache`] - Cache abstraction and the in-memory backend
//! - [`client`] - HTTP client and its configuration
//! - [`context`] - Cancellation and deadlines
//! - [`credential`] - Credential sources per application kind
//! - [`error`] - Error types
//! - [`middleware`] - tower middleware around outgoing requests
//! - [`token`] - Access token management
//! - [`types`] - Request and response types
//!
//! ## Error Handling
//!
//! Every fallible call returns [`WechatError`]. Errors from the send path are
//! wrapped in [`WechatError::Operation`] naming the operation; look through
//! the wrappers with [`WechatError::root_cause`]:
//!
//! ```no_run
//! # use wechat_sdk::WechatError;
//! # fn handle(result: Result<(), WechatError>) {
//! match result {
//!     Ok(()) => {}
//!     Err(e) if e.is_user_declined() => {
//!         // the user has not subscribed to this template
//!     }
//!     Err(e) if e.is_token_invalid() => {
//!         // refresh the token and try once more
//!     }
//!     Err(e) => match e.root_cause() {
//!         WechatError::Api { code, message } => {
//!             eprintln!("{:?}: API error {} - {}", e.context_path(), code, message);
//!         }
//!         other => eprintln!("Other error: {}", other),
//!     },
//! }
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod context;
pub mod credential;
pub mod error;
pub mod middleware;
pub mod token;
pub mod types;
mod utils;

pub use client::{ClientConfig, WechatClient, WechatClientBuilder};
pub use context::RequestContext;
pub use credential::{Credential, CredentialSource};
pub use error::WechatError;
pub use token::TokenManager;

//! Credential sources
//!
//! A [`CredentialSource`] knows how to obtain a fresh access token for one
//! kind of application and how to identify itself for caching. The
//! [`TokenManager`](crate::token::TokenManager) decides when to call it.
//!
//! | Source | Token endpoint |
//! |--------|----------------|
//! | [`MiniProgramCredential`] | `api.weixin.qq.com/cgi-bin/token` |
//! | [`OfficialAccountCredential`] | `api.weixin.qq.com/cgi-bin/token` |
//! | [`WorkCredential`] | `qyapi.weixin.qq.com/cgi-bin/gettoken` |

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::WechatClient;
use crate::context::RequestContext;
use crate::error::{HttpError, WechatError};
use crate::types::RequestOptions;

mod miniprogram;
mod official_account;
mod work;

pub use miniprogram::MiniProgramCredential;
pub use official_account::OfficialAccountCredential;
pub use work::WorkCredential;

const CLIENT_CREDENTIAL_GRANT: &str = "client_credential";

/// An access token together with its lifetime in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub expires_in: i64,
}

/// Obtains fresh credentials from the remote service.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch a new credential. Never consults a cache.
    async fn fetch_credential(
        &self,
        ctx: &RequestContext,
        client: &WechatClient,
    ) -> Result<Credential, WechatError>;

    /// Stable identifier of the remote credential this source obtains.
    ///
    /// Two sources with the same fingerprint share a cache slot.
    fn fingerprint(&self) -> String;

    /// Name reported in errors raised while fetching.
    fn name(&self) -> &'static str {
        "credential"
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Perform a token request and turn its body into a [`Credential`].
pub(crate) async fn request_credential(
    ctx: &RequestContext,
    client: &WechatClient,
    options: RequestOptions,
) -> Result<Credential, WechatError> {
    let response = client.perform(ctx, options).await?;
    let token: TokenResponse = client.decoder().decode(&response.body)?;

    WechatError::from_errcode(token.errcode, &token.errmsg)?;

    if token.access_token.is_empty() {
        return Err(HttpError::Decode("token response has no access_token".to_string()).into());
    }

    Ok(Credential {
        access_token: token.access_token,
        expires_in: token.expires_in,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_defaults() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"errcode":40013,"errmsg":"invalid appid"}"#).unwrap();
        assert!(token.access_token.is_empty());
        assert_eq!(token.expires_in, 0);
        assert_eq!(token.errcode, 40013);
    }
}

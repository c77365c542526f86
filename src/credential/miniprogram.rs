use async_trait::async_trait;

use super::{request_credential, Credential, CredentialSource, CLIENT_CREDENTIAL_GRANT};
use crate::api::{API_HOST, TOKEN_ENDPOINT};
use crate::client::WechatClient;
use crate::context::RequestContext;
use crate::error::WechatError;
use crate::types::{QueryParams, RequestOptions, Secret};
use crate::utils::fingerprint;

/// Mini program `appid` / `secret` pair.
#[derive(Debug, Clone)]
pub struct MiniProgramCredential {
    appid: String,
    secret: Secret,
}

impl MiniProgramCredential {
    pub fn new(appid: impl Into<String>, secret: impl Into<Secret>) -> Self {
        Self {
            appid: appid.into(),
            secret: secret.into(),
        }
    }

    pub fn appid(&self) -> &str {
        &self.appid
    }

    pub fn validate(&self) -> Result<(), WechatError> {
        client_credential_validate(&self.appid, &self.secret)
    }
}

#[async_trait]
impl CredentialSource for MiniProgramCredential {
    async fn fetch_credential(
        &self,
        ctx: &RequestContext,
        client: &WechatClient,
    ) -> Result<Credential, WechatError> {
        self.validate()?;
        let options = client_credential_request(&self.appid, &self.secret);
        request_credential(ctx, client, options).await
    }

    fn name(&self) -> &'static str {
        "miniprogram_credential"
    }

    fn fingerprint(&self) -> String {
        client_credential_fingerprint(&self.appid, &self.secret)
    }
}

pub(super) fn client_credential_validate(
    appid: &str,
    secret: &Secret,
) -> Result<(), WechatError> {
    let mut missing = Vec::new();
    if appid.is_empty() {
        missing.push("appid");
    }
    if secret.is_empty() {
        missing.push("secret");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(WechatError::validation(&missing))
    }
}

pub(super) fn client_credential_request(appid: &str, secret: &Secret) -> RequestOptions {
    RequestOptions::get(API_HOST, TOKEN_ENDPOINT).params(
        QueryParams::new()
            .with("appid", appid)
            .with("secret", secret.as_str())
            .with("grant_type", CLIENT_CREDENTIAL_GRANT),
    )
}

pub(super) fn client_credential_fingerprint(appid: &str, secret: &Secret) -> String {
    fingerprint(&[CLIENT_CREDENTIAL_GRANT, appid, secret.as_str()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reports_every_missing_field() {
        let err = MiniProgramCredential::new("", "").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid operation: missing required fields: [\"appid\", \"secret\"]"
        );

        let err = MiniProgramCredential::new("wx1", "").validate().unwrap_err();
        assert!(err.to_string().ends_with("[\"secret\"]"));
    }

    #[test]
    fn test_request_shape() {
        let options = client_credential_request("wx1", &Secret::new("s1"));
        assert_eq!(options.path(), "api.weixin.qq.com/cgi-bin/token");
        assert_eq!(
            options.params.encode(),
            "appid=wx1&grant_type=client_credential&secret=s1"
        );
    }

    #[test]
    fn test_fingerprint_changes_with_secret() {
        let a = MiniProgramCredential::new("wx1", "s1");
        let b = MiniProgramCredential::new("wx1", "s2");
        assert_eq!(a.fingerprint(), MiniProgramCredential::new("wx1", "s1").fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_debug_hides_secret() {
        let source = MiniProgramCredential::new("wx1", "top-secret");
        assert!(!format!("{:?}", source).contains("top-secret"));
    }
}

use async_trait::async_trait;

use super::miniprogram::{
    client_credential_fingerprint, client_credential_request, client_credential_validate,
};
use super::{request_credential, Credential, CredentialSource};
use crate::client::WechatClient;
use crate::context::RequestContext;
use crate::error::WechatError;
use crate::types::Secret;

/// Official account `appid` / `secret` pair.
///
/// Uses the same token endpoint as a mini program, so both sources share a
/// cache slot when they carry the same appid and secret.
#[derive(Debug, Clone)]
pub struct OfficialAccountCredential {
    appid: String,
    secret: Secret,
}

impl OfficialAccountCredential {
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
impl CredentialSource for OfficialAccountCredential {
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
        "official_account_credential"
    }

    fn fingerprint(&self) -> String {
        client_credential_fingerprint(&self.appid, &self.secret)
    }
}

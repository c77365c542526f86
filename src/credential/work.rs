use async_trait::async_trait;

use super::{request_credential, Credential, CredentialSource};
use crate::api::{WORK_API_HOST, WORK_TOKEN_ENDPOINT};
use crate::client::WechatClient;
use crate::context::RequestContext;
use crate::error::WechatError;
use crate::types::{QueryParams, RequestOptions, Secret};
use crate::utils::fingerprint;

/// WeCom (WeChat Work) `corpid` / `corpsecret`, optionally tied to an agent.
///
/// Every application secret of a corporation yields its own token, so the
/// agent id takes part in the fingerprint even though it is never sent.
#[derive(Debug, Clone)]
pub struct WorkCredential {
    corpid: String,
    corpsecret: Secret,
    agentid: String,
}

impl WorkCredential {
    pub fn new(corpid: impl Into<String>, corpsecret: impl Into<Secret>) -> Self {
        Self {
            corpid: corpid.into(),
            corpsecret: corpsecret.into(),
            agentid: String::new(),
        }
    }

    pub fn agentid(mut self, agentid: impl Into<String>) -> Self {
        self.agentid = agentid.into();
        self
    }

    pub fn corpid(&self) -> &str {
        &self.corpid
    }

    pub fn validate(&self) -> Result<(), WechatError> {
        let mut missing = Vec::new();
        if self.corpid.is_empty() {
            missing.push("corpid");
        }
        if self.corpsecret.is_empty() {
            missing.push("corpsecret");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(WechatError::validation(&missing))
        }
    }

    fn request(&self) -> RequestOptions {
        RequestOptions::get(WORK_API_HOST, WORK_TOKEN_ENDPOINT).params(
            QueryParams::new()
                .with("corpid", self.corpid.as_str())
                .with("corpsecret", self.corpsecret.as_str()),
        )
    }
}

#[async_trait]
impl CredentialSource for WorkCredential {
    async fn fetch_credential(
        &self,
        ctx: &RequestContext,
        client: &WechatClient,
    ) -> Result<Credential, WechatError> {
        self.validate()?;
        request_credential(ctx, client, self.request()).await
    }

    fn name(&self) -> &'static str {
        "work_credential"
    }

    fn fingerprint(&self) -> String {
        fingerprint(&[
            self.corpid.as_str(),
            self.corpsecret.as_str(),
            self.agentid.as_str(),
        ])
    }
}

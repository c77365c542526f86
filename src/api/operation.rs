//! Generic operation send path
//!
//! Every concrete API call implements [`Operation`]. The client drives it:
//! validate, obtain a token, inject it as `access_token`, perform the request
//! and map the `errcode` envelope.

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::client::WechatClient;
use crate::context::RequestContext;
use crate::error::{HttpError, WechatError};
use crate::token::TokenManager;
use crate::types::{CommonError, QueryParams, RequestBody, RequestOptions, Response};

/// Query key carrying the access token.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Description of one WeChat API call.
pub trait Operation: Send + Sync {
    /// Name used in log lines and carried by [`WechatError::Operation`].
    fn name(&self) -> &'static str {
        "operation"
    }

    /// Check preconditions; a failure aborts the call before any network I/O.
    fn validate(&self) -> Result<(), WechatError>;

    fn body(&self) -> Result<Option<RequestBody>, WechatError>;

    /// Host the call is sent to, e.g. [`API_HOST`](super::API_HOST).
    fn base_uri(&self) -> &str;

    fn endpoint(&self) -> &str;

    /// Extra query parameters; `access_token` is added by the client.
    fn params(&self) -> QueryParams {
        QueryParams::new()
    }

    fn method(&self) -> Method {
        Method::POST
    }

    fn max_response_size(&self) -> Option<u64> {
        None
    }
}

impl WechatClient {
    /// Validate `op`, attach a token from `tokens` and perform the request.
    ///
    /// The raw response is returned without looking at its errcode. Errors
    /// are wrapped in [`WechatError::Operation`] carrying `op.name()`.
    pub async fn execute<O>(
        &self,
        ctx: &RequestContext,
        tokens: &TokenManager,
        op: &O,
    ) -> Result<Response, WechatError>
    where
        O: Operation + ?Sized,
    {
        self.execute_inner(ctx, tokens, op)
            .await
            .map_err(|e| e.in_operation(op.name()))
    }

    /// Execute `op` and decode its payload after checking the errcode.
    pub async fn request<T, O>(
        &self,
        ctx: &RequestContext,
        tokens: &TokenManager,
        op: &O,
    ) -> Result<T, WechatError>
    where
        T: DeserializeOwned,
        O: Operation + ?Sized,
    {
        let response = self.execute(ctx, tokens, op).await?;
        self.check_errcode(&response)
            .and_then(|()| self.decoder().decode(&response.body))
            .map_err(|e| e.in_operation(op.name()))
    }

    /// Execute `op` and only report whether it succeeded.
    pub async fn send<O>(
        &self,
        ctx: &RequestContext,
        tokens: &TokenManager,
        op: &O,
    ) -> Result<(), WechatError>
    where
        O: Operation + ?Sized,
    {
        let response = self.execute(ctx, tokens, op).await?;
        self.check_errcode(&response)
            .map_err(|e| e.in_operation(op.name()))
    }

    /// Execute `op` whose successful response is a binary body.
    ///
    /// A JSON body is an error envelope and is mapped accordingly. Any other
    /// body counts only with a 2xx status and at least one byte.
    pub async fn download<O>(
        &self,
        ctx: &RequestContext,
        tokens: &TokenManager,
        op: &O,
    ) -> Result<Vec<u8>, WechatError>
    where
        O: Operation + ?Sized,
    {
        let response = self.execute(ctx, tokens, op).await?;
        self.binary_body(response)
            .map_err(|e| e.in_operation(op.name()))
    }

    async fn execute_inner<O>(
        &self,
        ctx: &RequestContext,
        tokens: &TokenManager,
        op: &O,
    ) -> Result<Response, WechatError>
    where
        O: Operation + ?Sized,
    {
        if let Err(e) = op.validate() {
            log::debug!("[Wechat] {} rejected: {}", op.name(), e);
            return Err(e);
        }
        let body = op.body()?;
        let token = tokens.get_token(ctx, false).await?;

        let mut params = op.params();
        params.set(ACCESS_TOKEN_PARAM, token);

        let mut options =
            RequestOptions::new(op.method(), op.base_uri(), op.endpoint()).params(params);
        if let Some(body) = body {
            options = options.body(body);
        }
        if let Some(limit) = op.max_response_size() {
            options = options.max_response_size(limit);
        }

        self.perform(ctx, options).await
    }

    fn binary_body(&self, response: Response) -> Result<Vec<u8>, WechatError> {
        if response.is_json() {
            self.check_errcode(&response)?;
            return Err(HttpError::Decode(
                "expected binary content, got a JSON body".to_string(),
            )
            .into());
        }
        if !response.is_success_status() {
            return Err(HttpError::Status(response.status.as_u16()).into());
        }
        if response.body.is_empty() {
            return Err(HttpError::Decode("empty response body".to_string()).into());
        }
        Ok(response.body)
    }

    fn check_errcode(&self, response: &Response) -> Result<(), WechatError> {
        let envelope: CommonError = self.decoder().decode(&response.body)?;
        envelope.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::API_HOST;

    struct Ping;

    impl Operation for Ping {
        fn validate(&self) -> Result<(), WechatError> {
            Ok(())
        }

        fn body(&self) -> Result<Option<RequestBody>, WechatError> {
            Ok(None)
        }

        fn base_uri(&self) -> &str {
            API_HOST
        }

        fn endpoint(&self) -> &str {
            "wxa/ping"
        }
    }

    #[test]
    fn test_defaults() {
        let op = Ping;
        assert_eq!(op.method(), Method::POST);
        assert!(op.params().is_empty());
        assert_eq!(op.max_response_size(), None);
        assert_eq!(op.name(), "operation");
    }
}

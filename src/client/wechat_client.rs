//! WeChat HTTP Client
//!
//! Executes [`RequestOptions`] against the WeChat endpoints and owns the
//! state shared by every token manager built from it.

use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Instant;

use flate2::write::GzEncoder;
use flate2::Compression;
use http::header::{ACCEPT, CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT, VARY};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use tower::Service;

use super::{ClientConfig, ResponseDecoder, WechatClientBuilder};
use crate::cache::Cache;
use crate::context::RequestContext;
use crate::credential::CredentialSource;
use crate::error::WechatError;
use crate::token::TokenManager;
use crate::types::{FormFile, RequestBody, RequestOptions, Response};
use crate::utils::{redact_body, redact_url};

pub(crate) const SDK_USER_AGENT: &str = concat!("wechat-sdk/", env!("CARGO_PKG_VERSION"));

type MiddlewareFuture =
    Pin<Box<dyn Future<Output = Result<reqwest::Response, reqwest::Error>> + Send>>;
pub(crate) type MiddlewareExecutor =
    Arc<dyn Fn(reqwest::Request) -> MiddlewareFuture + Send + Sync>;

type RefreshGuards = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// WeChat API Client
///
/// Cheap to clone; clones share the HTTP connection pool, the token cache
/// and the refresh guards.
#[derive(Clone)]
pub struct WechatClient {
    http: Client,
    config: Arc<ClientConfig>,
    cache: Arc<dyn Cache<String>>,
    middleware_executor: Option<MiddlewareExecutor>,
    refresh_guards: Arc<RefreshGuards>,
}

impl std::fmt::Debug for WechatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatClient")
            .field("config", &self.config)
            .field(
                "middleware_executor",
                &self.middleware_executor.as_ref().map(|_| ".."),
            )
            .finish_non_exhaustive()
    }
}

impl WechatClient {
    /// Create a new client builder
    pub fn builder() -> WechatClientBuilder {
        WechatClientBuilder::default()
    }

    /// Build a client from a complete configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self, WechatError> {
        Self::builder().config(config).build()
    }

    pub(crate) fn new(http: Client, config: ClientConfig, cache: Arc<dyn Cache<String>>) -> Self {
        Self {
            http,
            config: Arc::new(config),
            cache,
            middleware_executor: None,
            refresh_guards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The cache backing every token manager of this client.
    pub fn cache(&self) -> &Arc<dyn Cache<String>> {
        &self.cache
    }

    pub fn decoder(&self) -> &ResponseDecoder {
        &self.config.decoder
    }

    /// Returns the underlying [`reqwest::Client`] for raw HTTP requests.
    ///
    /// Note: requests made through this client bypass the middleware pipeline.
    /// Use [`perform`](Self::perform) for middleware-aware requests.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// A token manager for `source` sharing this client's cache.
    pub fn token_manager(&self, source: Arc<dyn CredentialSource>) -> TokenManager {
        TokenManager::new(self.clone(), source)
    }

    pub(crate) fn with_middleware_executor(mut self, executor: MiddlewareExecutor) -> Self {
        self.middleware_executor = Some(executor);
        self
    }

    /// Returns (and creates on demand) the refresh guard for a cache key.
    ///
    /// Guards nobody holds are dropped here, so the map only grows with the
    /// number of keys refreshing at the same time.
    pub(crate) fn refresh_guard(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut guards = self
            .refresh_guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        guards.retain(|_, guard| Arc::strong_count(guard) > 1);
        guards
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    async fn send_request(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, reqwest::Error> {
        if let Some(executor) = &self.middleware_executor {
            (executor)(request).await
        } else {
            self.http.execute(request).await
        }
    }

    /// Execute one HTTP call.
    ///
    /// Non-2xx statuses are returned as a normal [`Response`]; the errcode in
    /// the body decides success. A context that is already done fails before
    /// any I/O.
    pub async fn perform(
        &self,
        ctx: &RequestContext,
        options: RequestOptions,
    ) -> Result<Response, WechatError> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let url = self.request_url(&options);
        let safe_url = redact_url(&url);
        let max_response_size = options.max_response_size.filter(|limit| *limit > 0);
        let ignore_errors = options.ignore_errors.clone();

        let request = self.build_request(&url, options)?;
        let method = request.method().clone();
        log::trace!("[Wechat] >>> {} {}", method, safe_url);

        let start = Instant::now();
        let result = ctx
            .run(async {
                let response = self.send_request(request).await?;
                read_response(response, max_response_size).await
            })
            .await;
        let elapsed = start.elapsed();

        match result {
            Ok(response) => {
                log::info!(
                    "[Wechat] {} {} {} ({:.3}s)",
                    method,
                    safe_url,
                    response.status.as_u16(),
                    elapsed.as_secs_f64()
                );
                if !response.status.is_success()
                    && !ignore_errors.contains(&response.status.as_u16())
                {
                    log::warn!(
                        "[Wechat] {} {} returned HTTP {}",
                        method,
                        safe_url,
                        response.status
                    );
                }
                log::trace!("[Wechat] <<< {}", redact_body(&response.body));
                Ok(response)
            }
            Err(e) => {
                log::error!(
                    "[Wechat] {} {} failed after {:.3}s: {}",
                    method,
                    safe_url,
                    elapsed.as_secs_f64(),
                    e
                );
                Err(e)
            }
        }
    }

    fn request_url(&self, options: &RequestOptions) -> String {
        let host = self
            .config
            .host_override
            .as_deref()
            .unwrap_or(&options.base_uri);

        let mut url = format!(
            "{}://{}/{}",
            self.config.scheme,
            host.trim_end_matches('/'),
            options.endpoint.trim_start_matches('/')
        );
        if !options.params.is_empty() {
            url.push('?');
            url.push_str(&options.params.encode());
        }
        url
    }

    fn build_request(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<reqwest::Request, WechatError> {
        let method = if options.method == Method::GET && options.body.is_some() {
            self.config.send_get_body_as.clone()
        } else {
            options.method
        };

        let mut builder = self
            .http
            .request(method, url)
            .header(USER_AGENT, SDK_USER_AGENT)
            .header(ACCEPT, "application/json");

        builder = match options.body {
            Some(RequestBody::Json(bytes)) => self.payload(builder, bytes)?,
            Some(RequestBody::Raw(raw)) => self.payload(builder, raw.into_bytes())?,
            Some(RequestBody::Form(file)) => builder.multipart(multipart_form(file)?),
            None => builder,
        };

        let mut request = builder.build()?;

        // caller headers replace the defaults of the same name
        let headers = request.headers_mut();
        for name in options.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in options.headers.iter() {
            headers.append(name.clone(), value.clone());
        }

        Ok(request)
    }

    fn payload(
        &self,
        builder: RequestBuilder,
        bytes: Vec<u8>,
    ) -> Result<RequestBuilder, WechatError> {
        let builder = builder.header(CONTENT_TYPE, "application/json");
        if !self.config.gzip {
            return Ok(builder.body(bytes));
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes)?;
        let compressed = encoder.finish()?;

        Ok(builder
            .header(CONTENT_ENCODING, "gzip")
            .header(VARY, "Accept-Encoding")
            .body(compressed))
    }
}

fn multipart_form(file: FormFile) -> Result<Form, WechatError> {
    let content_type = file
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let part = Part::bytes(file.content)
        .file_name(file.file_name)
        .mime_str(&content_type)
        .map_err(|e| WechatError::Multipart(e.to_string()))?;

    Ok(Form::new().part(file.field_name, part))
}

async fn read_response(
    mut response: reqwest::Response,
    limit: Option<u64>,
) -> Result<Response, WechatError> {
    if let (Some(limit), Some(length)) = (limit, response.content_length()) {
        if length > limit {
            return Err(WechatError::ResponseTooLarge { limit });
        }
    }

    let status = response.status();
    let headers = response.headers().clone();

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        if let Some(limit) = limit {
            if body.len() as u64 > limit {
                return Err(WechatError::ResponseTooLarge { limit });
            }
        }
    }

    Ok(Response {
        status,
        headers,
        body,
    })
}

impl Service<reqwest::Request> for WechatClient {
    type Response = reqwest::Response;
    type Error = reqwest::Error;
    type Future = MiddlewareFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: reqwest::Request) -> Self::Future {
        let client = self.http.clone();
        Box::pin(async move { client.execute(req).await })
    }
}

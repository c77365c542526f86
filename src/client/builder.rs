use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Request as ReqwestRequest, Response as ReqwestResponse};
use tower::{Layer, Service};

use super::wechat_client::MiddlewareExecutor;
use super::{ClientConfig, ResponseDecoder, WechatClient};
use crate::cache::{Cache, MemoryCache};
use crate::error::WechatError;

/// Builder for [`WechatClient`]
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use wechat_sdk::client::WechatClient;
/// use wechat_sdk::middleware::LoggingMiddleware;
///
/// # fn main() -> Result<(), wechat_sdk::WechatError> {
/// let client = WechatClient::builder()
///     .timeout(Duration::from_secs(10))
///     .gzip(true)
///     .with_middleware(LoggingMiddleware::new())
///     .build()?;
/// # let _ = client;
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Default)]
pub struct WechatClientBuilder<M = ()> {
    config: ClientConfig,
    cache: Option<Arc<dyn Cache<String>>>,
    http_client: Option<Client>,
    middleware: Option<M>,
}

impl<M> std::fmt::Debug for WechatClientBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatClientBuilder")
            .field("config", &self.config)
            .field("cache", &self.cache.as_ref().map(|_| ".."))
            .field("http_client", &self.http_client.as_ref().map(|_| ".."))
            .field("middleware", &self.middleware.as_ref().map(|_| ".."))
            .finish()
    }
}

impl<M> WechatClientBuilder<M> {
    /// Replace every setting at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: `https`
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.scheme = scheme.into();
        self
    }

    /// Route every request to `host` (`host[:port]`), e.g. a forward proxy
    /// or a mock server.
    pub fn host_override(mut self, host: impl Into<String>) -> Self {
        self.config.host_override = Some(host.into());
        self
    }

    /// Method used for GET requests that carry a body.
    ///
    /// Default: `GET`
    pub fn send_get_body_as(mut self, method: Method) -> Self {
        self.config.send_get_body_as = method;
        self
    }

    pub fn gzip(mut self, enabled: bool) -> Self {
        self.config.gzip = enabled;
        self
    }

    /// Set the total timeout for requests
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout
    ///
    /// Default: 10 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn cache_default_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_default_ttl = ttl;
        self
    }

    pub fn cache_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.config.cache_sweep_interval = interval;
        self
    }

    /// Default: 600 seconds
    pub fn token_safety_margin(mut self, margin: Duration) -> Self {
        self.config.token_safety_margin = margin;
        self
    }

    /// Default: [`ResponseDecoder::Json`]; see [`Decode`](super::Decode) for
    /// application-defined formats.
    pub fn decoder(mut self, decoder: ResponseDecoder) -> Self {
        self.config.decoder = decoder;
        self
    }

    /// Store tokens in `cache` instead of a fresh [`MemoryCache`].
    pub fn cache(mut self, cache: Arc<dyn Cache<String>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a preconfigured [`reqwest::Client`]; the timeouts of this builder
    /// are then ignored.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_middleware<M2>(self, middleware: M2) -> WechatClientBuilder<M2>
    where
        M2: Layer<WechatClient> + Clone + Send + Sync + 'static,
    {
        WechatClientBuilder {
            config: self.config,
            cache: self.cache,
            http_client: self.http_client,
            middleware: Some(middleware),
        }
    }

    /// Build the WechatClient
    ///
    /// # Errors
    /// Returns [`WechatError::Config`] for an invalid configuration
    pub fn build(self) -> Result<WechatClient, WechatError>
    where
        M: Layer<WechatClient> + Clone + Send + Sync + 'static,
        M::Service: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <M::Service as Service<ReqwestRequest>>::Future: Send + 'static,
    {
        self.config.validate()?;

        let http = match self.http_client {
            Some(http) => http,
            None => Client::builder()
                .timeout(self.config.timeout)
                .connect_timeout(self.config.connect_timeout)
                .build()?,
        };

        let cache = match self.cache {
            Some(cache) => cache,
            None => {
                let mut memory = MemoryCache::<String>::new()
                    .with_default_ttl(Some(self.config.cache_default_ttl));
                if let Some(interval) = self.config.cache_sweep_interval {
                    memory = memory.with_sweep_interval(interval);
                }
                Arc::new(memory) as Arc<dyn Cache<String>>
            }
        };

        let mut client = WechatClient::new(http, self.config, cache);

        if let Some(middleware) = self.middleware {
            let service = middleware.layer(client.clone());
            let executor = make_middleware_executor(service);
            client = client.with_middleware_executor(executor);
        }

        Ok(client)
    }
}

fn make_middleware_executor<S>(service: S) -> MiddlewareExecutor
where
    S: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    let service = Arc::new(service);

    Arc::new(move |request: ReqwestRequest| {
        let mut service = (*service).clone();
        Box::pin(async move { service.call(request).await })
            as Pin<Box<dyn Future<Output = Result<ReqwestResponse, reqwest::Error>> + Send>>
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context, Poll};

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::context::RequestContext;
    use crate::types::RequestOptions;

    #[test]
    fn test_builder_default_values() {
        let client = WechatClient::builder().build().unwrap();

        assert_eq!(client.config().scheme, "https");
        assert!(client.config().host_override.is_none());
        assert!(matches!(client.decoder(), ResponseDecoder::Json));
    }

    #[test]
    fn test_builder_custom_values() {
        let client = WechatClient::builder()
            .scheme("http")
            .host_override("127.0.0.1:9000")
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .token_safety_margin(Duration::from_secs(60))
            .decoder(ResponseDecoder::Xml)
            .build()
            .unwrap();

        assert_eq!(client.config().scheme, "http");
        assert_eq!(client.config().host_override.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(client.config().timeout, Duration::from_secs(60));
        assert_eq!(client.config().token_safety_margin, Duration::from_secs(60));
        assert!(matches!(client.decoder(), ResponseDecoder::Xml));
    }

    #[test]
    fn test_invalid_scheme() {
        let result = WechatClient::builder().scheme("ws").build();

        assert!(matches!(result, Err(WechatError::Config(_))));
    }

    #[tokio::test]
    async fn test_custom_cache_is_used() {
        let cache: Arc<dyn Cache<String>> = Arc::new(MemoryCache::<String>::new());
        let client = WechatClient::builder()
            .cache(Arc::clone(&cache))
            .build()
            .unwrap();

        let ctx = RequestContext::new();
        cache
            .set(&ctx, "k", "v".to_string(), Default::default())
            .await
            .unwrap();

        assert_eq!(client.cache().get(&ctx, "k").await.unwrap(), "v");
    }

    #[tokio::test]
    async fn test_middleware_configured_and_executes() {
        #[derive(Clone)]
        struct FlagLayer {
            flag: Arc<AtomicBool>,
        }

        impl Layer<WechatClient> for FlagLayer {
            type Service = FlagService;

            fn layer(&self, inner: WechatClient) -> Self::Service {
                FlagService {
                    inner,
                    flag: Arc::clone(&self.flag),
                }
            }
        }

        #[derive(Clone)]
        struct FlagService {
            inner: WechatClient,
            flag: Arc<AtomicBool>,
        }

        impl Service<ReqwestRequest> for FlagService {
            type Response = ReqwestResponse;
            type Error = reqwest::Error;
            type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

            fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
                Poll::Ready(Ok(()))
            }

            fn call(&mut self, req: ReqwestRequest) -> Self::Future {
                self.flag.store(true, Ordering::SeqCst);
                let mut inner = self.inner.clone();
                Box::pin(async move { inner.call(req).await })
            }
        }

        let middleware_invoked = Arc::new(AtomicBool::new(false));
        let layer = FlagLayer {
            flag: Arc::clone(&middleware_invoked),
        };

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wxa/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errcode": 0,
                "errmsg": "ok"
            })))
            .mount(&mock_server)
            .await;

        let client = WechatClient::builder()
            .scheme("http")
            .host_override(mock_server.address().to_string())
            .with_middleware(layer)
            .build()
            .unwrap();

        let response = client
            .perform(
                &RequestContext::new(),
                RequestOptions::get("api.weixin.qq.com", "wxa/ping"),
            )
            .await
            .unwrap();

        assert!(response.status.is_success());
        assert!(middleware_invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_builder_with_logging_middleware_builds() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wxa/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errcode": 0,
                "errmsg": "ok"
            })))
            .mount(&mock_server)
            .await;

        let client = WechatClient::builder()
            .scheme("http")
            .host_override(mock_server.address().to_string())
            .with_middleware(crate::middleware::LoggingMiddleware::new())
            .build()
            .unwrap();

        let result = client
            .perform(
                &RequestContext::new(),
                RequestOptions::get("api.weixin.qq.com", "wxa/ping"),
            )
            .await;
        assert!(result.is_ok());
    }
}

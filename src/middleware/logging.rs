use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use log::{debug, info, warn};
use reqwest::{Request, Response};
use tower::{Layer, Service};

use crate::utils::redact_url;

/// Logs every outgoing request and the status it came back with.
///
/// Credentials in the query string are redacted before logging.
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    verbose: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log at debug level with the status reason phrase.
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl<S> Layer<S> for LoggingMiddleware
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Service = LoggingMiddlewareService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddlewareService {
            inner,
            verbose: self.verbose,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingMiddlewareService<S> {
    inner: S,
    verbose: bool,
}

fn log_request(method: &str, url: &str, verbose: bool) {
    if verbose {
        debug!("[Wechat] >>> {} {}", method, url);
    } else {
        info!("[Wechat] {} {}", method, url);
    }
}

fn log_response(
    url: &str,
    status: reqwest::StatusCode,
    elapsed: std::time::Duration,
    verbose: bool,
) {
    if verbose {
        debug!(
            "[Wechat] <<< {} {} {} ({:?})",
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            elapsed
        );
    } else {
        info!("[Wechat] {} {} ({:?})", url, status.as_u16(), elapsed);
    }
}

impl<S, Error> Service<Request> for LoggingMiddlewareService<S>
where
    S: Service<Request, Response = Response, Error = Error> + Send + Clone + 'static,
    S::Future: Send,
    Error: std::fmt::Display + Send + 'static,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().as_str().to_string();
        let url = redact_url(req.url().as_str());
        let verbose = self.verbose;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            log_request(&method, &url, verbose);

            let start = Instant::now();
            match inner.call(req).await {
                Ok(response) => {
                    log_response(&url, response.status(), start.elapsed(), verbose);
                    Ok(response)
                }
                Err(e) => {
                    warn!(
                        "[Wechat] {} {} failed after {:?}: {}",
                        method,
                        url,
                        start.elapsed(),
                        e
                    );
                    Err(e)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use reqwest::Client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// Records the URL of every request it forwards.
    #[derive(Clone)]
    struct Recorder {
        client: Client,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Service<Request> for Recorder {
        type Response = Response;
        type Error = reqwest::Error;
        type Future = Pin<Box<dyn Future<Output = Result<Response, reqwest::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request) -> Self::Future {
            self.seen.lock().unwrap().push(req.url().to_string());
            let client = self.client.clone();
            Box::pin(async move { client.execute(req).await })
        }
    }

    #[tokio::test]
    async fn test_forwards_request_unchanged() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cgi-bin/token"))
            .and(query_param("secret", "s3cr3t"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = Client::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut service = LoggingMiddleware::new().verbose().layer(Recorder {
            client: client.clone(),
            seen: Arc::clone(&seen),
        });

        let url = format!(
            "{}/cgi-bin/token?appid=wx1&secret=s3cr3t",
            mock_server.uri()
        );
        let response = service.call(client.get(&url).build().unwrap()).await.unwrap();

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(seen.lock().unwrap().as_slice(), [url]);
    }

    #[tokio::test]
    async fn test_passes_errors_through() {
        let client = Client::new();
        let mut service = LoggingMiddleware::new().layer(Recorder {
            client: client.clone(),
            seen: Arc::new(Mutex::new(Vec::new())),
        });

        // nothing listens on port 1
        let req = client.get("http://127.0.0.1:1/wxa/ping").build().unwrap();
        assert!(service.call(req).await.is_err());
    }
}

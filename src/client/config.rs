use std::time::Duration;

use reqwest::Method;

use super::ResponseDecoder;
use crate::cache::{DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL};
use crate::error::WechatError;

pub(crate) const DEFAULT_SCHEME: &str = "https";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Seconds subtracted from a token's `expires_in` before it is cached.
pub const DEFAULT_TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(600);

/// Client-wide settings.
///
/// Usually assembled through [`WechatClient::builder`](super::WechatClient::builder);
/// a hand-built value can be passed to
/// [`WechatClient::from_config`](super::WechatClient::from_config).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `http` or `https`
    pub scheme: String,
    /// Send every request to this host instead of the operation's own
    /// (`host[:port]`, no scheme)
    pub host_override: Option<String>,
    /// Method used when a GET request carries a body
    pub send_get_body_as: Method,
    /// Gzip JSON and raw request bodies
    pub gzip: bool,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Lifetime of cache entries stored without an explicit TTL
    pub cache_default_ttl: Duration,
    /// Background purge interval of the built-in cache; `None` disables it
    pub cache_sweep_interval: Option<Duration>,
    pub token_safety_margin: Duration,
    pub decoder: ResponseDecoder,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host_override: None,
            send_get_body_as: Method::GET,
            gzip: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            cache_default_ttl: DEFAULT_CACHE_TTL,
            cache_sweep_interval: Some(DEFAULT_SWEEP_INTERVAL),
            token_safety_margin: DEFAULT_TOKEN_SAFETY_MARGIN,
            decoder: ResponseDecoder::Json,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), WechatError> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(WechatError::Config(format!(
                "scheme must be http or https, got: {}",
                self.scheme
            )));
        }

        if let Some(host) = &self.host_override {
            if host.is_empty() || host.contains("://") {
                return Err(WechatError::Config(format!(
                    "host_override must be a bare host[:port], got: {:?}",
                    host
                )));
            }
        }

        if self.timeout.is_zero() {
            return Err(WechatError::Config("timeout must be non-zero".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheme, "https");
        assert_eq!(config.send_get_body_as, Method::GET);
        assert_eq!(config.token_safety_margin, Duration::from_secs(600));
        assert_eq!(config.cache_default_ttl, Duration::from_secs(7200));
        assert_eq!(
            config.cache_sweep_interval,
            Some(Duration::from_secs(240 * 60))
        );
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        let config = ClientConfig {
            scheme: "ftp".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(WechatError::Config(_))));
    }

    #[test]
    fn test_rejects_host_override_with_scheme() {
        let config = ClientConfig {
            host_override: Some("http://127.0.0.1:8080".to_string()),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

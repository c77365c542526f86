use thiserror::Error;

/// errcode returned when the user has declined to receive the message.
pub const ERRCODE_USER_DECLINED: i64 = 43101;

/// errcodes signalling that the access_token is invalid or expired.
pub const TOKEN_INVALID_ERRCODES: &[i64] = &[40001, 40014, 42001];

/// Transport-level failures
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Failures reported by a [`Cache`](crate::cache::Cache) backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("key not found")]
    KeyNotFound,

    #[error("cache operation cancelled")]
    Cancelled,

    #[error("cache operation timed out")]
    Timeout,
}

/// WeChat SDK error types
#[derive(Debug, Error)]
pub enum WechatError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WeChat API error (code={code}): {message}")]
    Api { code: i64, message: String },

    #[error("user declined to receive the message: {message}")]
    UserDeclined { message: String },

    #[error("invalid operation: {0}")]
    Validation(String),

    #[error("{name}: failed to obtain access token: {source}")]
    Credential {
        name: &'static str,
        #[source]
        source: Box<WechatError>,
    },

    #[error("{name}: {source}")]
    Operation {
        name: &'static str,
        #[source]
        source: Box<WechatError>,
    },

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out")]
    Timeout,

    #[error("response size exceeds limit of {limit} bytes")]
    ResponseTooLarge { limit: u64 },

    #[error("multipart form error: {0}")]
    Multipart(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for WechatError {
    fn from(e: reqwest::Error) -> Self {
        WechatError::Http(HttpError::Reqwest(e))
    }
}

impl WechatError {
    /// Map an errcode/errmsg pair to a result.
    ///
    /// `0` is success regardless of the HTTP status; [`ERRCODE_USER_DECLINED`]
    /// becomes [`WechatError::UserDeclined`], anything else [`WechatError::Api`].
    pub fn from_errcode(code: i64, message: &str) -> Result<(), WechatError> {
        match code {
            0 => Ok(()),
            ERRCODE_USER_DECLINED => Err(WechatError::UserDeclined {
                message: message.to_string(),
            }),
            _ => Err(WechatError::Api {
                code,
                message: message.to_string(),
            }),
        }
    }

    pub(crate) fn validation(missing: &[&str]) -> WechatError {
        WechatError::Validation(format!("missing required fields: {:?}", missing))
    }

    /// Wrap `self` with the name of the operation that failed.
    pub(crate) fn in_operation(self, name: &'static str) -> WechatError {
        WechatError::Operation {
            name,
            source: Box::new(self),
        }
    }

    /// The error underneath every [`Operation`](WechatError::Operation) and
    /// [`Credential`](WechatError::Credential) layer.
    pub fn root_cause(&self) -> &WechatError {
        match self {
            WechatError::Operation { source, .. } | WechatError::Credential { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Names of the wrapping layers, outermost first.
    ///
    /// `["subscribe_message", "miniprogram_credential"]` reads as: the
    /// subscribe message failed because its token could not be fetched.
    pub fn context_path(&self) -> Vec<&'static str> {
        let mut path = Vec::new();
        let mut current = self;
        loop {
            match current {
                WechatError::Operation { name, source }
                | WechatError::Credential { name, source } => {
                    path.push(*name);
                    current = &**source;
                }
                _ => return path,
            }
        }
    }

    /// The application-level errcode carried by this error, if any.
    pub fn errcode(&self) -> Option<i64> {
        match self.root_cause() {
            WechatError::Api { code, .. } => Some(*code),
            WechatError::UserDeclined { .. } => Some(ERRCODE_USER_DECLINED),
            _ => None,
        }
    }

    pub fn is_user_declined(&self) -> bool {
        matches!(self.root_cause(), WechatError::UserDeclined { .. })
    }

    /// True when an API call rejected the access_token it was sent with.
    ///
    /// Callers typically respond with
    /// [`TokenManager::refresh_token`](crate::token::TokenManager::refresh_token)
    /// and retry the operation once. Errors raised while fetching the token
    /// itself never qualify: refreshing with the same app secret fails again.
    pub fn is_token_invalid(&self) -> bool {
        match self {
            WechatError::Api { code, .. } => TOKEN_INVALID_ERRCODES.contains(code),
            WechatError::Operation { source, .. } => source.is_token_invalid(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.root_cause(),
            WechatError::Cancelled
                | WechatError::Timeout
                | WechatError::Cache(CacheError::Cancelled)
                | WechatError::Cache(CacheError::Timeout)
        )
    }
}

use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::WechatError;

/// The `errcode` / `errmsg` envelope every WeChat response carries.
///
/// `errcode == 0` (or absent) is success regardless of the HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommonError {
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
}

impl CommonError {
    pub fn is_success(&self) -> bool {
        self.errcode == 0
    }

    /// Map the envelope through [`WechatError::from_errcode`].
    pub fn check(&self) -> Result<(), WechatError> {
        WechatError::from_errcode(self.errcode, &self.errmsg)
    }
}

/// Raw HTTP response as returned by the executor.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Body bytes; empty when the server sent none
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success_status(&self) -> bool {
        self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// True when the body declares itself as JSON (or as plain text, which
    /// some endpoints use for JSON error bodies).
    pub fn is_json(&self) -> bool {
        self.content_type().is_some_and(|content_type| {
            content_type.starts_with("application/json") || content_type.starts_with("text/plain")
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

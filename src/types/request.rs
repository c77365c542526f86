use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

use super::QueryParams;
use crate::error::WechatError;

/// File part of a `multipart/form-data` upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    /// Form field name, e.g. `media`
    pub field_name: String,
    /// File name reported to the server
    pub file_name: String,
    pub content: Vec<u8>,
    /// MIME type of the part; `application/octet-stream` when `None`
    pub content_type: Option<String>,
}

impl FormFile {
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            content: content.into(),
            content_type: None,
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Outbound request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// JSON produced from a serializable value
    Json(Vec<u8>),
    /// Pre-serialized body, sent verbatim
    Raw(String),
    /// Multipart upload with a single file part
    Form(FormFile),
}

impl RequestBody {
    /// Serialize `body` as JSON.
    pub fn json<T: Serialize + ?Sized>(body: &T) -> Result<Self, WechatError> {
        Ok(RequestBody::Json(serde_json::to_vec(body)?))
    }

    pub fn raw(body: impl Into<String>) -> Self {
        RequestBody::Raw(body.into())
    }

    pub fn form(file: FormFile) -> Self {
        RequestBody::Form(file)
    }

    pub fn is_form(&self) -> bool {
        matches!(self, RequestBody::Form(_))
    }
}

/// Declarative description of one HTTP call.
///
/// Built per call and handed to
/// [`WechatClient::perform`](crate::client::WechatClient::perform).
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Host (and optional port) without scheme, e.g. `api.weixin.qq.com`
    pub base_uri: String,
    /// Path without leading slash, e.g. `cgi-bin/token`
    pub endpoint: String,
    pub params: QueryParams,
    pub body: Option<RequestBody>,
    pub headers: HeaderMap,
    /// Maximum accepted response body size in bytes; `None` or `0` disables the cap
    pub max_response_size: Option<u64>,
    /// Non-2xx status codes that are expected and not reported in the logs
    pub ignore_errors: Vec<u16>,
}

impl RequestOptions {
    pub fn new(method: Method, base_uri: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            base_uri: base_uri.into(),
            endpoint: endpoint.into(),
            params: QueryParams::new(),
            body: None,
            headers: HeaderMap::new(),
            max_response_size: None,
            ignore_errors: Vec::new(),
        }
    }

    pub fn get(base_uri: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, base_uri, endpoint)
    }

    pub fn post(base_uri: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, base_uri, endpoint)
    }

    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(key, value);
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as JSON and attach it.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, WechatError> {
        Ok(self.body(RequestBody::json(body)?))
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn max_response_size(mut self, limit: u64) -> Self {
        self.max_response_size = Some(limit);
        self
    }

    pub fn ignore_errors(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.ignore_errors.extend(statuses);
        self
    }

    /// `base_uri/endpoint` with surrounding slashes trimmed.
    pub fn path(&self) -> String {
        format!(
            "{}/{}",
            self.base_uri.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }
}

use md5::{Digest, Md5};
use serde_json::Value;

const REDACTED: &str = "[REDACTED]";

const SENSITIVE_FIELDS: &[&str] = &[
    "access_token",
    "appsecret",
    "secret",
    "corpsecret",
    "session_key",
    "password",
    "token",
    "authorization",
];

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_FIELDS.iter().any(|s| key.eq_ignore_ascii_case(s))
}

/// Replace the values of sensitive query parameters so a URL can be logged.
pub(crate) fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let redacted_query = query
        .split('&')
        .map(|param| match param.split_once('=') {
            Some((key, _)) if is_sensitive(key) => {
                format!("{key}={REDACTED}")
            }
            _ => param.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{base}?{redacted_query}")
}

/// Render a response body for logging.
///
/// JSON bodies are logged with sensitive fields masked at any depth; anything
/// else is reduced to its length.
pub(crate) fn redact_body(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        }
        Err(_) => format!("<{} bytes>", body.len()),
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if is_sensitive(key) {
                    *field = Value::from(REDACTED);
                } else {
                    redact_value(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}

/// Lowercase hex MD5 over length-prefixed fields.
///
/// The prefix keeps `["ab", "c"]` and `["a", "bc"]` apart.
pub(crate) fn fingerprint(fields: &[&str]) -> String {
    let mut hasher = Md5::new();
    for field in fields {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{HttpError, WechatError};

/// A response format supplied by the application.
///
/// The body is transcoded into a [`serde_json::Value`]; the requested type is
/// then deserialized from that value.
pub trait Decode: Send + Sync + fmt::Debug {
    fn decode_value(&self, body: &[u8]) -> Result<serde_json::Value, WechatError>;
}

/// Response body format understood by the client.
///
/// JSON numbers are decoded by serde into the target field type, so 64-bit
/// ids survive without loss.
#[derive(Debug, Clone, Default)]
pub enum ResponseDecoder {
    #[default]
    Json,
    Xml,
    Custom(Arc<dyn Decode>),
}

impl ResponseDecoder {
    pub fn custom(decoder: impl Decode + 'static) -> Self {
        ResponseDecoder::Custom(Arc::new(decoder))
    }

    pub fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, WechatError> {
        match self {
            ResponseDecoder::Json => Ok(serde_json::from_slice(body)?),
            ResponseDecoder::Xml => {
                let text = std::str::from_utf8(body)
                    .map_err(|e| HttpError::Decode(format!("response is not UTF-8: {e}")))?;
                quick_xml::de::from_str(text)
                    .map_err(|e| WechatError::Http(HttpError::Decode(e.to_string())))
            }
            ResponseDecoder::Custom(decoder) => {
                Ok(serde_json::from_value(decoder.decode_value(body)?)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::types::CommonError;

    #[derive(Debug, Deserialize)]
    struct Payload {
        id: u64,
        name: String,
    }

    /// `callback({...})` bodies
    #[derive(Debug)]
    struct Jsonp;

    impl Decode for Jsonp {
        fn decode_value(&self, body: &[u8]) -> Result<serde_json::Value, WechatError> {
            let text = std::str::from_utf8(body).map_err(|e| HttpError::Decode(e.to_string()))?;
            let inner = text
                .trim()
                .strip_prefix("callback(")
                .and_then(|t| t.strip_suffix(')'))
                .ok_or_else(|| HttpError::Decode("not a callback body".to_string()))?;
            Ok(serde_json::from_str(inner)?)
        }
    }

    #[test]
    fn test_json_keeps_large_integers() {
        let payload: Payload = ResponseDecoder::Json
            .decode(br#"{"id":18446744073709551615,"name":"n"}"#)
            .unwrap();
        assert_eq!(payload.id, u64::MAX);
        assert_eq!(payload.name, "n");
    }

    #[test]
    fn test_xml_common_error() {
        let ce: CommonError = ResponseDecoder::Xml
            .decode(b"<xml><errcode>40013</errcode><errmsg>invalid appid</errmsg></xml>")
            .unwrap();
        assert_eq!(ce.errcode, 40013);
        assert_eq!(ce.errmsg, "invalid appid");
    }

    #[test]
    fn test_xml_missing_fields_default() {
        let ce: CommonError = ResponseDecoder::Xml.decode(b"<xml></xml>").unwrap();
        assert!(ce.is_success());
    }

    #[test]
    fn test_json_error() {
        let err = ResponseDecoder::Json.decode::<Payload>(b"not json").unwrap_err();
        assert!(matches!(err, WechatError::Json(_)));
    }

    #[test]
    fn test_custom_decoder() {
        let decoder = ResponseDecoder::custom(Jsonp);

        let payload: Payload = decoder
            .decode(br#"callback({"id":9007199254740993,"name":"n"})"#)
            .unwrap();
        assert_eq!(payload.id, 9_007_199_254_740_993);

        let err = decoder.decode::<Payload>(b"{}").unwrap_err();
        assert!(matches!(err, WechatError::Http(HttpError::Decode(_))));
    }
}

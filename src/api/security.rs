//! Content security checks
//!
//! - [`MsgSecCheck`] - text moderation
//! - [`ImgSecCheck`] - image moderation, uploaded as multipart

use serde::Serialize;

use super::{Operation, API_HOST};
use crate::error::WechatError;
use crate::types::{FormFile, RequestBody};

const MSG_SEC_CHECK_ENDPOINT: &str = "wxa/msg_sec_check";
const IMG_SEC_CHECK_ENDPOINT: &str = "wxa/img_sec_check";

/// Largest image accepted by [`ImgSecCheck`].
pub const MAX_IMAGE_SIZE: usize = 1 << 20;

/// Check text for risky content
///
/// POST /wxa/msg_sec_check. Flagged content is reported as errcode 87014.
#[derive(Debug, Clone, Serialize)]
pub struct MsgSecCheck {
    pub content: String,
}

impl MsgSecCheck {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl Operation for MsgSecCheck {
    fn name(&self) -> &'static str {
        "msg_sec_check"
    }

    fn validate(&self) -> Result<(), WechatError> {
        if self.content.is_empty() {
            return Err(WechatError::validation(&["content"]));
        }
        Ok(())
    }

    fn body(&self) -> Result<Option<RequestBody>, WechatError> {
        let body = serde_json::to_string(self)?;
        Ok(Some(RequestBody::raw(body)))
    }

    fn base_uri(&self) -> &str {
        API_HOST
    }

    fn endpoint(&self) -> &str {
        MSG_SEC_CHECK_ENDPOINT
    }
}

/// Check an image for risky content
///
/// POST /wxa/img_sec_check with the image in the `media` form field.
#[derive(Debug, Clone)]
pub struct ImgSecCheck {
    image: Vec<u8>,
    content_type: Option<String>,
}

impl ImgSecCheck {
    pub fn new(image: impl Into<Vec<u8>>) -> Self {
        Self {
            image: image.into(),
            content_type: None,
        }
    }

    /// MIME type of the image, e.g. `image/png`.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}

impl Operation for ImgSecCheck {
    fn name(&self) -> &'static str {
        "img_sec_check"
    }

    fn validate(&self) -> Result<(), WechatError> {
        if self.image.is_empty() {
            return Err(WechatError::validation(&["media"]));
        }
        if self.image.len() > MAX_IMAGE_SIZE {
            return Err(WechatError::Validation(format!(
                "image is {} bytes, limit is {} bytes",
                self.image.len(),
                MAX_IMAGE_SIZE
            )));
        }
        Ok(())
    }

    fn body(&self) -> Result<Option<RequestBody>, WechatError> {
        let mut file = FormFile::new("media", "file", self.image.clone());
        if let Some(content_type) = &self.content_type {
            file = file.content_type(content_type.clone());
        }
        Ok(Some(RequestBody::form(file)))
    }

    fn base_uri(&self) -> &str {
        API_HOST
    }

    fn endpoint(&self) -> &str {
        IMG_SEC_CHECK_ENDPOINT
    }
}

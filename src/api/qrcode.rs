//! Mini program code generation
//!
//! The API answers with image bytes on success and a JSON error envelope
//! otherwise, so [`UnlimitedQrCode`] is sent with
//! [`WechatClient::download`](crate::client::WechatClient::download).

use serde::{Deserialize, Serialize};

use super::{Operation, API_HOST};
use crate::error::WechatError;
use crate::types::RequestBody;

const UNLIMITED_QRCODE_ENDPOINT: &str = "wxa/getwxacodeunlimit";

/// Longest scene string the API accepts.
pub const MAX_SCENE_LEN: usize = 32;

/// Line color for QR codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LineColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Mini program code without a count limit
///
/// POST /wxa/getwxacodeunlimit
#[derive(Debug, Clone, Serialize)]
pub struct UnlimitedQrCode {
    /// Query string passed to the page, at most 32 visible characters
    pub scene: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Edge length in pixels, 280..=1280
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_color: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<LineColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_hyaline: Option<bool>,
}

impl UnlimitedQrCode {
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            page: None,
            width: None,
            auto_color: None,
            line_color: None,
            is_hyaline: None,
        }
    }

    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn auto_color(mut self, auto_color: bool) -> Self {
        self.auto_color = Some(auto_color);
        self
    }

    pub fn line_color(mut self, color: LineColor) -> Self {
        self.line_color = Some(color);
        self
    }

    /// Transparent background
    pub fn is_hyaline(mut self, is_hyaline: bool) -> Self {
        self.is_hyaline = Some(is_hyaline);
        self
    }
}

impl Operation for UnlimitedQrCode {
    fn name(&self) -> &'static str {
        "unlimited_qrcode"
    }

    fn validate(&self) -> Result<(), WechatError> {
        if self.scene.is_empty() {
            return Err(WechatError::validation(&["scene"]));
        }
        if self.scene.chars().count() > MAX_SCENE_LEN {
            return Err(WechatError::Validation(format!(
                "scene exceeds {} characters",
                MAX_SCENE_LEN
            )));
        }
        Ok(())
    }

    fn body(&self) -> Result<Option<RequestBody>, WechatError> {
        RequestBody::json(self).map(Some)
    }

    fn base_uri(&self) -> &str {
        API_HOST
    }

    fn endpoint(&self) -> &str {
        UNLIMITED_QRCODE_ENDPOINT
    }
}

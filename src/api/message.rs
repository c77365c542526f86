//! Message sending
//!
//! - [`SubscribeMessage`] - mini program subscribe message
//! - [`CustomMessage`] - official account customer-service message
//! - [`WorkAppMessage`] - WeCom application message
//!
//! A subscribe message to a user who has not subscribed fails with
//! [`WechatError::UserDeclined`](crate::error::WechatError::UserDeclined).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Operation, API_HOST, WORK_API_HOST};
use crate::error::WechatError;
use crate::types::RequestBody;

const SUBSCRIBE_SEND_ENDPOINT: &str = "cgi-bin/message/subscribe/send";
const CUSTOM_SEND_ENDPOINT: &str = "cgi-bin/message/custom/send";
const WORK_SEND_ENDPOINT: &str = "cgi-bin/message/send";

// ============================================================================
// Subscribe message
// ============================================================================

/// Subscribe message data (key-value pairs)
pub type SubscribeMessageData = HashMap<String, SubscribeMessageValue>;

/// Value for subscribe message field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeMessageValue {
    pub value: String,
}

impl SubscribeMessageValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MiniProgramState {
    Developer,
    Trial,
    Formal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Lang {
    #[serde(rename = "zh_CN")]
    ZhCN,
    #[serde(rename = "en_US")]
    EnUS,
    #[serde(rename = "zh_HK")]
    ZhHK,
    #[serde(rename = "zh_TW")]
    ZhTW,
}

/// Mini program subscribe message
///
/// POST /cgi-bin/message/subscribe/send
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeMessage {
    /// Recipient's OpenID
    pub touser: String,
    pub template_id: String,
    /// Page opened from the message card
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    pub data: SubscribeMessageData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniprogram_state: Option<MiniProgramState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<Lang>,
}

impl SubscribeMessage {
    pub fn new(touser: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            touser: touser.into(),
            template_id: template_id.into(),
            page: None,
            data: SubscribeMessageData::new(),
            miniprogram_state: None,
            lang: None,
        }
    }

    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data
            .insert(key.into(), SubscribeMessageValue::new(value));
        self
    }

    pub fn miniprogram_state(mut self, state: MiniProgramState) -> Self {
        self.miniprogram_state = Some(state);
        self
    }

    pub fn lang(mut self, lang: Lang) -> Self {
        self.lang = Some(lang);
        self
    }
}

impl Operation for SubscribeMessage {
    fn name(&self) -> &'static str {
        "subscribe_message"
    }

    fn validate(&self) -> Result<(), WechatError> {
        let mut missing = Vec::new();
        if self.touser.is_empty() {
            missing.push("touser");
        }
        if self.template_id.is_empty() {
            missing.push("template_id");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(WechatError::validation(&missing))
        }
    }

    fn body(&self) -> Result<Option<RequestBody>, WechatError> {
        RequestBody::json(self).map(Some)
    }

    fn base_uri(&self) -> &str {
        API_HOST
    }

    fn endpoint(&self) -> &str {
        SUBSCRIBE_SEND_ENDPOINT
    }
}

// ============================================================================
// Shared content types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Text {
    pub content: String,
}

/// Content referencing an uploaded media file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Media {
    pub media_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: String,
    pub picurl: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct News {
    pub articles: Vec<Article>,
}

// ============================================================================
// Official account customer-service message
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomVideo {
    pub media_id: String,
    pub thumb_media_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Music {
    pub title: String,
    pub description: String,
    pub musicurl: String,
    pub hqmusicurl: String,
    pub thumb_media_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MsgMenu {
    pub head_content: String,
    pub list: Vec<MenuItem>,
    pub tail_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WxCard {
    pub card_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiniProgramPage {
    pub title: String,
    pub appid: String,
    pub pagepath: String,
    pub thumb_media_id: String,
}

/// Payload of a customer-service message; the variant decides `msgtype`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomContent {
    Text(Text),
    Image(Media),
    Voice(Media),
    Video(CustomVideo),
    Music(Music),
    News(News),
    Mpnews(Media),
    Msgmenu(MsgMenu),
    Wxcard(WxCard),
    Miniprogrampage(MiniProgramPage),
}

impl CustomContent {
    pub fn text(content: impl Into<String>) -> Self {
        CustomContent::Text(Text {
            content: content.into(),
        })
    }

    pub fn image(media_id: impl Into<String>) -> Self {
        CustomContent::Image(Media {
            media_id: media_id.into(),
        })
    }

    pub fn msgtype(&self) -> &'static str {
        match self {
            CustomContent::Text(_) => "text",
            CustomContent::Image(_) => "image",
            CustomContent::Voice(_) => "voice",
            CustomContent::Video(_) => "video",
            CustomContent::Music(_) => "music",
            CustomContent::News(_) => "news",
            CustomContent::Mpnews(_) => "mpnews",
            CustomContent::Msgmenu(_) => "msgmenu",
            CustomContent::Wxcard(_) => "wxcard",
            CustomContent::Miniprogrampage(_) => "miniprogrampage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomService {
    pub kf_account: String,
}

/// Official account customer-service message
///
/// POST /cgi-bin/message/custom/send
#[derive(Debug, Clone)]
pub struct CustomMessage {
    pub touser: String,
    pub content: CustomContent,
    /// Send as this customer-service account
    pub customservice: Option<CustomService>,
}

#[derive(Serialize)]
struct CustomMessageBody<'a> {
    touser: &'a str,
    msgtype: &'static str,
    #[serde(flatten)]
    content: &'a CustomContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    customservice: Option<&'a CustomService>,
}

impl CustomMessage {
    pub fn new(touser: impl Into<String>, content: CustomContent) -> Self {
        Self {
            touser: touser.into(),
            content,
            customservice: None,
        }
    }

    pub fn kf_account(mut self, kf_account: impl Into<String>) -> Self {
        self.customservice = Some(CustomService {
            kf_account: kf_account.into(),
        });
        self
    }
}

impl Operation for CustomMessage {
    fn name(&self) -> &'static str {
        "custom_message"
    }

    fn validate(&self) -> Result<(), WechatError> {
        if self.touser.is_empty() {
            return Err(WechatError::validation(&["touser"]));
        }
        Ok(())
    }

    fn body(&self) -> Result<Option<RequestBody>, WechatError> {
        let body = CustomMessageBody {
            touser: &self.touser,
            msgtype: self.content.msgtype(),
            content: &self.content,
            customservice: self.customservice.as_ref(),
        };
        RequestBody::json(&body).map(Some)
    }

    fn base_uri(&self) -> &str {
        API_HOST
    }

    fn endpoint(&self) -> &str {
        CUSTOM_SEND_ENDPOINT
    }
}

// ============================================================================
// WeCom application message
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkVideo {
    pub media_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextCard {
    pub title: String,
    pub description: String,
    pub url: String,
    pub btntxt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MpArticle {
    pub title: String,
    pub thumb_media_id: String,
    pub author: String,
    pub content_source_url: String,
    pub content: String,
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MpNews {
    pub articles: Vec<MpArticle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiniProgramNotice {
    pub appid: String,
    pub page: String,
    pub title: String,
    pub description: String,
    pub emphasis_first_item: bool,
    pub content_item: Vec<ContentItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCardButton {
    pub key: String,
    pub name: String,
    pub replace_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_bold: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCard {
    pub title: String,
    pub description: String,
    pub url: String,
    pub task_id: String,
    pub btn: Vec<TaskCardButton>,
}

/// Payload of a WeCom application message; the variant decides `msgtype`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkContent {
    Text(Text),
    Image(Media),
    Voice(Media),
    Video(WorkVideo),
    File(Media),
    Textcard(TextCard),
    News(News),
    Mpnews(MpNews),
    Markdown(Text),
    MiniprogramNotice(MiniProgramNotice),
    Taskcard(TaskCard),
}

impl WorkContent {
    pub fn text(content: impl Into<String>) -> Self {
        WorkContent::Text(Text {
            content: content.into(),
        })
    }

    pub fn markdown(content: impl Into<String>) -> Self {
        WorkContent::Markdown(Text {
            content: content.into(),
        })
    }

    pub fn msgtype(&self) -> &'static str {
        match self {
            WorkContent::Text(_) => "text",
            WorkContent::Image(_) => "image",
            WorkContent::Voice(_) => "voice",
            WorkContent::Video(_) => "video",
            WorkContent::File(_) => "file",
            WorkContent::Textcard(_) => "textcard",
            WorkContent::News(_) => "news",
            WorkContent::Mpnews(_) => "mpnews",
            WorkContent::Markdown(_) => "markdown",
            WorkContent::MiniprogramNotice(_) => "miniprogram_notice",
            WorkContent::Taskcard(_) => "taskcard",
        }
    }
}

/// WeCom application message
///
/// POST qyapi /cgi-bin/message/send. Recipients are `|`-separated id lists;
/// at least one of `touser`, `toparty` or `totag` must be set.
#[derive(Debug, Clone)]
pub struct WorkAppMessage {
    pub touser: String,
    pub toparty: String,
    pub totag: String,
    pub agentid: i64,
    pub content: WorkContent,
    /// `1` marks the message confidential
    pub safe: Option<u8>,
}

#[derive(Serialize)]
struct WorkAppMessageBody<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    touser: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    toparty: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    totag: &'a str,
    msgtype: &'static str,
    agentid: i64,
    #[serde(flatten)]
    content: &'a WorkContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    safe: Option<u8>,
}

impl WorkAppMessage {
    pub fn new(agentid: i64, content: WorkContent) -> Self {
        Self {
            touser: String::new(),
            toparty: String::new(),
            totag: String::new(),
            agentid,
            content,
            safe: None,
        }
    }

    pub fn touser(mut self, touser: impl Into<String>) -> Self {
        self.touser = touser.into();
        self
    }

    pub fn toparty(mut self, toparty: impl Into<String>) -> Self {
        self.toparty = toparty.into();
        self
    }

    pub fn totag(mut self, totag: impl Into<String>) -> Self {
        self.totag = totag.into();
        self
    }

    pub fn safe(mut self, safe: bool) -> Self {
        self.safe = Some(u8::from(safe));
        self
    }
}

impl Operation for WorkAppMessage {
    fn name(&self) -> &'static str {
        "work_app_message"
    }

    fn validate(&self) -> Result<(), WechatError> {
        if self.touser.is_empty() && self.toparty.is_empty() && self.totag.is_empty() {
            return Err(WechatError::Validation(
                "one of touser, toparty or totag is required".to_string(),
            ));
        }
        Ok(())
    }

    fn body(&self) -> Result<Option<RequestBody>, WechatError> {
        let body = WorkAppMessageBody {
            touser: &self.touser,
            toparty: &self.toparty,
            totag: &self.totag,
            msgtype: self.content.msgtype(),
            agentid: self.agentid,
            content: &self.content,
            safe: self.safe,
        };
        RequestBody::json(&body).map(Some)
    }

    fn base_uri(&self) -> &str {
        WORK_API_HOST
    }

    fn endpoint(&self) -> &str {
        WORK_SEND_ENDPOINT
    }
}

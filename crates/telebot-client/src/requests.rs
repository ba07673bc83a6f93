//! Optional parameters for facade calls. Unset fields are not sent.

use serde::Serialize;
use serde_json::Value;
use telebot_core::{request::Params, types::ChatId};

/// Options for `sendMessage` and `editMessageText`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    /// Keyboard or force-reply markup, sent as JSON text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
}

impl MessageOptions {
    pub fn reply_to(message_id: i64) -> Self {
        Self {
            reply_to_message_id: Some(message_id),
            ..Default::default()
        }
    }
}

/// Options shared by the photo/audio/document/sticker/video/voice senders.
///
/// Fields a method does not know are ignored by the API.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    /// Seconds, for audio/video/voice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
}

impl MediaOptions {
    pub fn caption(caption: impl Into<String>) -> Self {
        Self {
            caption: Some(caption.into()),
            ..Default::default()
        }
    }
}

/// Parameters for `sendVenue` beyond the chat.
#[derive(Debug, Clone, Serialize)]
pub struct Venue {
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foursquare_id: Option<String>,
}

/// Status shown in the chat header by `sendChatAction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Typing,
    UploadPhoto,
    RecordVideo,
    UploadVideo,
    RecordVoice,
    UploadVoice,
    UploadDocument,
    ChooseSticker,
    FindLocation,
}

/// Which message an edit applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRef {
    Chat {
        chat_id: ChatId,
        message_id: i64,
    },
    Inline(String),
}

impl MessageRef {
    pub(crate) fn insert_into(&self, params: &mut Params) {
        match self {
            Self::Chat {
                chat_id,
                message_id,
            } => {
                params.insert("chat_id".into(), chat_id_value(chat_id));
                params.insert("message_id".into(), (*message_id).into());
            }
            Self::Inline(id) => {
                params.insert("inline_message_id".into(), id.clone().into());
            }
        }
    }
}

/// Options for `answerCallbackQuery`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallbackAnswer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_alert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<i64>,
}

pub(crate) fn chat_id_value(chat_id: &ChatId) -> Value {
    match chat_id {
        ChatId::Id(id) => (*id).into(),
        ChatId::Username(name) => name.clone().into(),
    }
}

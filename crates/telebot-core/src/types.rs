//! Telegram Bot API wire types.
//!
//! Only the fields the client inspects are typed; everything else a
//! payload carries is kept verbatim in `extra` so handlers lose nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One envelope returned by `getUpdates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// The message carried by this update, tagged with how it arrived.
    ///
    /// `message` wins if a server ever sends both.
    pub fn into_parts(self) -> (Option<Message>, Option<CallbackQuery>) {
        let message = match (self.message, self.edited_message) {
            (Some(m), _) => Some(m.tagged(MessageKind::Normal)),
            (None, Some(m)) => Some(m.tagged(MessageKind::Edited)),
            (None, None) => None,
        };
        (message, self.callback_query)
    }
}

/// Whether a message is new or an edit of an earlier one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Normal,
    Edited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Set by the poller; never part of the wire format.
    #[serde(skip)]
    pub kind: MessageKind,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    fn tagged(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_edited(&self) -> bool {
        self.kind == MessageKind::Edited
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// Chat type: "private", "group", "supergroup", or "channel".
    #[serde(default, rename = "type")]
    pub chat_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of `getFile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_unique_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: i64,
    pub height: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfilePhotos {
    pub total_count: i64,
    pub photos: Vec<Vec<PhotoSize>>,
}

/// Edits return the edited message, or `true` for inline messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EditResult {
    Message(Box<Message>),
    Done(bool),
}

/// Target chat: numeric id or `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(name: &str) -> Self {
        Self::Username(name.to_string())
    }
}

impl From<String> for ChatId {
    fn from(name: String) -> Self {
        Self::Username(name)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Username(name) => f.write_str(name),
        }
    }
}

/// Cached bot identity from `getMe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub first_name: String,
    pub username: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            username: user.username.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_with_message() {
        let json = r#"{
            "update_id": 10,
            "message": {
                "message_id": 1,
                "date": 1706529600,
                "chat": {"id": 100, "type": "private"},
                "from": {"id": 7, "is_bot": false, "first_name": "Ada"},
                "text": "hello",
                "entities": [{"type": "bold", "offset": 0, "length": 5}]
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let (msg, cb) = update.into_parts();
        let msg = msg.unwrap();
        assert!(cb.is_none());
        assert_eq!(msg.kind, MessageKind::Normal);
        assert_eq!(msg.text.as_deref(), Some("hello"));
        assert_eq!(msg.chat.id, 100);
        assert_eq!(msg.date.unwrap().timestamp(), 1706529600);
        // Unknown fields survive in `extra`.
        assert!(msg.extra.contains_key("entities"));
    }

    #[test]
    fn test_update_with_edited_message() {
        let json = r#"{
            "update_id": 11,
            "edited_message": {
                "message_id": 1,
                "chat": {"id": 100},
                "text": "hello again"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let msg = update.into_parts().0.unwrap();
        assert!(msg.is_edited());
        assert_eq!(msg.chat.chat_type, "");
    }

    #[test]
    fn test_update_with_callback_query_only() {
        let json = r#"{
            "update_id": 12,
            "callback_query": {
                "id": "cbq-1",
                "from": {"id": 7, "first_name": "Ada"},
                "data": "vote:yes",
                "chat_instance": "abc"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let (msg, cb) = update.into_parts();
        assert!(msg.is_none());
        let cb = cb.unwrap();
        assert_eq!(cb.data.as_deref(), Some("vote:yes"));
        assert_eq!(cb.extra["chat_instance"], "abc");
    }

    #[test]
    fn test_edit_result_variants() {
        let done: EditResult = serde_json::from_str("true").unwrap();
        assert!(matches!(done, EditResult::Done(true)));

        let msg: EditResult =
            serde_json::from_str(r#"{"message_id": 5, "chat": {"id": 1}, "text": "x"}"#).unwrap();
        assert!(matches!(msg, EditResult::Message(m) if m.message_id == 5));
    }

    #[test]
    fn test_chat_id_serializes_untagged() {
        assert_eq!(serde_json::to_value(ChatId::from(42_i64)).unwrap(), 42);
        assert_eq!(
            serde_json::to_value(ChatId::from("@news")).unwrap(),
            "@news"
        );
    }

    #[test]
    fn test_identity_from_user_without_username() {
        let user: User = serde_json::from_str(r#"{"id": 9, "first_name": "Bot"}"#).unwrap();
        let id = Identity::from(&user);
        assert_eq!(id.id, 9);
        assert_eq!(id.username, "");
    }
}

//! Sending: text, media uploads, locations, venues and chat actions.

use super::Client;
use crate::requests::{chat_id_value, ChatAction, MediaOptions, MessageOptions, Venue};
use serde_json::Value;
use telebot_core::{
    error::BotError,
    request::{to_params, InputFile, Params},
    types::{ChatId, Message},
};
use tracing::debug;

/// Content types the API accepts for the checked upload methods.
const AUDIO_TYPE: &str = "audio/mpeg";
const STICKER_TYPE: &str = "image/webp";

impl Client {
    pub async fn send_message(
        &self,
        chat_id: impl Into<ChatId>,
        text: &str,
        options: MessageOptions,
    ) -> Result<Message, BotError> {
        let mut params = to_params(&options)?;
        params.insert("chat_id".into(), chat_id_value(&chat_id.into()));
        params.insert("text".into(), text.into());
        self.request("sendMessage", params).await
    }

    pub async fn forward_message(
        &self,
        chat_id: impl Into<ChatId>,
        from_chat_id: impl Into<ChatId>,
        message_id: i64,
    ) -> Result<Message, BotError> {
        let mut params = Params::new();
        params.insert("chat_id".into(), chat_id_value(&chat_id.into()));
        params.insert("from_chat_id".into(), chat_id_value(&from_chat_id.into()));
        params.insert("message_id".into(), message_id.into());
        self.request("forwardMessage", params).await
    }

    pub async fn send_photo(
        &self,
        chat_id: impl Into<ChatId>,
        photo: InputFile,
        options: MediaOptions,
    ) -> Result<Message, BotError> {
        self.send_media("sendPhoto", "photo", chat_id.into(), photo, options, None)
            .await
    }

    /// Uploaded audio must be MP3 (`audio/mpeg`).
    pub async fn send_audio(
        &self,
        chat_id: impl Into<ChatId>,
        audio: InputFile,
        options: MediaOptions,
    ) -> Result<Message, BotError> {
        self.send_media(
            "sendAudio",
            "audio",
            chat_id.into(),
            audio,
            options,
            Some(AUDIO_TYPE),
        )
        .await
    }

    pub async fn send_document(
        &self,
        chat_id: impl Into<ChatId>,
        document: InputFile,
        options: MediaOptions,
    ) -> Result<Message, BotError> {
        self.send_media(
            "sendDocument",
            "document",
            chat_id.into(),
            document,
            options,
            None,
        )
        .await
    }

    /// Uploaded stickers must be WebP (`image/webp`).
    pub async fn send_sticker(
        &self,
        chat_id: impl Into<ChatId>,
        sticker: InputFile,
        options: MediaOptions,
    ) -> Result<Message, BotError> {
        self.send_media(
            "sendSticker",
            "sticker",
            chat_id.into(),
            sticker,
            options,
            Some(STICKER_TYPE),
        )
        .await
    }

    pub async fn send_video(
        &self,
        chat_id: impl Into<ChatId>,
        video: InputFile,
        options: MediaOptions,
    ) -> Result<Message, BotError> {
        self.send_media("sendVideo", "video", chat_id.into(), video, options, None)
            .await
    }

    pub async fn send_voice(
        &self,
        chat_id: impl Into<ChatId>,
        voice: InputFile,
        options: MediaOptions,
    ) -> Result<Message, BotError> {
        self.send_media("sendVoice", "voice", chat_id.into(), voice, options, None)
            .await
    }

    pub async fn send_location(
        &self,
        chat_id: impl Into<ChatId>,
        latitude: f64,
        longitude: f64,
        options: MessageOptions,
    ) -> Result<Message, BotError> {
        let mut params = to_params(&options)?;
        params.insert("chat_id".into(), chat_id_value(&chat_id.into()));
        params.insert("latitude".into(), latitude.into());
        params.insert("longitude".into(), longitude.into());
        self.request("sendLocation", params).await
    }

    pub async fn send_venue(
        &self,
        chat_id: impl Into<ChatId>,
        venue: Venue,
        options: MessageOptions,
    ) -> Result<Message, BotError> {
        let mut params = to_params(&options)?;
        params.extend(to_params(&venue)?);
        params.insert("chat_id".into(), chat_id_value(&chat_id.into()));
        self.request("sendVenue", params).await
    }

    pub async fn send_chat_action(
        &self,
        chat_id: impl Into<ChatId>,
        action: ChatAction,
    ) -> Result<bool, BotError> {
        let mut params = Params::new();
        params.insert("chat_id".into(), chat_id_value(&chat_id.into()));
        params.insert(
            "action".into(),
            serde_json::to_value(action)
                .map_err(|e| BotError::Decode(format!("failed to encode chat action: {e}")))?,
        );
        self.request("sendChatAction", params).await
    }

    /// Send a file by reference (simple call) or by upload (multipart call).
    async fn send_media(
        &self,
        method: &str,
        field: &str,
        chat_id: ChatId,
        file: InputFile,
        options: MediaOptions,
        required_type: Option<&str>,
    ) -> Result<Message, BotError> {
        if let (Some(expected), Some(actual)) = (required_type, file.content_type()) {
            if actual != expected {
                return Err(BotError::InvalidFileType {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        let mut params = to_params(&options)?;
        params.insert("chat_id".into(), chat_id_value(&chat_id));

        match file.to_upload(field) {
            Some(upload) => {
                debug!(method, filename = %upload.filename, "uploading file");
                self.request_multipart(method, params, upload).await
            }
            None => {
                if let InputFile::FileId(id) = file {
                    params.insert(field.to_string(), Value::String(id));
                }
                self.request(method, params).await
            }
        }
    }
}

//! Edits, callback answers, identity, profile photos and webhooks.

use super::Client;
use crate::requests::{CallbackAnswer, MessageOptions, MessageRef};
use std::sync::PoisonError;
use telebot_core::{
    error::BotError,
    request::{to_params, Params},
    types::{EditResult, Identity, User, UserProfilePhotos},
};
use tracing::info;

impl Client {
    pub async fn edit_message_text(
        &self,
        target: MessageRef,
        text: &str,
        options: MessageOptions,
    ) -> Result<EditResult, BotError> {
        let mut params = to_params(&options)?;
        target.insert_into(&mut params);
        params.insert("text".into(), text.into());
        self.request("editMessageText", params).await
    }

    pub async fn edit_message_caption(
        &self,
        target: MessageRef,
        caption: &str,
        reply_markup: Option<serde_json::Value>,
    ) -> Result<EditResult, BotError> {
        let mut params = Params::new();
        target.insert_into(&mut params);
        params.insert("caption".into(), caption.into());
        if let Some(markup) = reply_markup {
            params.insert("reply_markup".into(), markup);
        }
        self.request("editMessageCaption", params).await
    }

    pub async fn edit_message_reply_markup(
        &self,
        target: MessageRef,
        reply_markup: serde_json::Value,
    ) -> Result<EditResult, BotError> {
        let mut params = Params::new();
        target.insert_into(&mut params);
        params.insert("reply_markup".into(), reply_markup);
        self.request("editMessageReplyMarkup", params).await
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        answer: CallbackAnswer,
    ) -> Result<bool, BotError> {
        let mut params = to_params(&answer)?;
        params.insert("callback_query_id".into(), callback_query_id.into());
        self.request("answerCallbackQuery", params).await
    }

    pub async fn get_user_profile_photos(
        &self,
        user_id: i64,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<UserProfilePhotos, BotError> {
        let mut params = Params::new();
        params.insert("user_id".into(), user_id.into());
        params.insert("offset".into(), offset.into());
        params.insert("limit".into(), limit.into());
        self.request("getUserProfilePhotos", params).await
    }

    /// Look up the bot's own account and cache its identity.
    pub async fn get_me(&self) -> Result<User, BotError> {
        let me: User = self.request("getMe", Params::new()).await?;
        let identity = Identity::from(&me);
        info!(id = identity.id, username = %identity.username, "bot identity resolved");
        *self
            .inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(identity);
        Ok(me)
    }

    /// Have the API push updates to `url`. While set, polling gets 409s.
    pub async fn set_webhook(&self, url: &str) -> Result<bool, BotError> {
        let mut params = Params::new();
        params.insert("url".into(), url.into());
        self.request("setWebhook", params).await
    }

    pub async fn delete_webhook(&self) -> Result<bool, BotError> {
        self.request("deleteWebhook", Params::new()).await
    }
}

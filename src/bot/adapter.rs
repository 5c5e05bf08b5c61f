//! Telegram implementation of the chat adapter.

use std::collections::HashSet;
use std::future::IntoFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{
    ChatPermissions, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode,
};
use teloxide::{ApiError, RequestError};
use tracing::debug;

use super::dispatcher::ThrottledBot;
use aegis::error::{ModerationError, ModerationResult};
use aegis::moderation::{ChatAdapter, Responder};
use aegis::settings::MenuView;

/// Upper bound on any single Bot API call.
const ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Await a request with [`ADAPTER_TIMEOUT`].
async fn bounded<F, T>(request: F) -> ModerationResult<T>
where
    F: IntoFuture<Output = Result<T, RequestError>>,
{
    match tokio::time::timeout(ADAPTER_TIMEOUT, request.into_future()).await {
        Ok(result) => result.map_err(ModerationError::from),
        Err(_) => Err(ModerationError::Adapter("request timed out".to_string())),
    }
}

/// Inline keyboard for a menu view.
pub fn keyboard(view: &MenuView) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = view
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.action.encode()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Full member permissions, restored by unmute.
fn member_permissions() -> ChatPermissions {
    ChatPermissions::SEND_MESSAGES
        | ChatPermissions::SEND_AUDIOS
        | ChatPermissions::SEND_DOCUMENTS
        | ChatPermissions::SEND_PHOTOS
        | ChatPermissions::SEND_VIDEOS
        | ChatPermissions::SEND_VIDEO_NOTES
        | ChatPermissions::SEND_VOICE_NOTES
        | ChatPermissions::SEND_POLLS
        | ChatPermissions::SEND_OTHER_MESSAGES
        | ChatPermissions::ADD_WEB_PAGE_PREVIEWS
        | ChatPermissions::INVITE_USERS
}

/// Chat adapter backed by the throttled Bot API client.
#[derive(Clone)]
pub struct TelegramAdapter {
    bot: ThrottledBot,
}

impl TelegramAdapter {
    pub fn new(bot: ThrottledBot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatAdapter for TelegramAdapter {
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> ModerationResult<()> {
        bounded(self.bot.delete_message(chat_id, message_id)).await?;
        Ok(())
    }

    async fn restrict_user(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: DateTime<Utc>,
    ) -> ModerationResult<()> {
        bounded(
            self.bot
                .restrict_chat_member(chat_id, user_id, ChatPermissions::empty())
                .until_date(until),
        )
        .await?;
        Ok(())
    }

    async fn unrestrict_user(&self, chat_id: ChatId, user_id: UserId) -> ModerationResult<()> {
        bounded(
            self.bot
                .restrict_chat_member(chat_id, user_id, member_permissions()),
        )
        .await?;
        Ok(())
    }

    async fn ban_user(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: DateTime<Utc>,
    ) -> ModerationResult<()> {
        bounded(self.bot.ban_chat_member(chat_id, user_id).until_date(until)).await?;
        Ok(())
    }

    async fn unban_user(&self, chat_id: ChatId, user_id: UserId) -> ModerationResult<()> {
        bounded(
            self.bot
                .unban_chat_member(chat_id, user_id)
                .only_if_banned(true),
        )
        .await?;
        Ok(())
    }

    async fn send_notice(&self, chat_id: ChatId, text: &str) -> ModerationResult<()> {
        bounded(self.bot.send_message(chat_id, text)).await?;
        Ok(())
    }

    async fn render_menu(&self, chat_id: ChatId, view: &MenuView) -> ModerationResult<()> {
        bounded(
            self.bot
                .send_message(chat_id, view.text.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard(view)),
        )
        .await?;
        Ok(())
    }

    async fn list_admins(&self, chat_id: ChatId) -> ModerationResult<HashSet<UserId>> {
        let members = bounded(self.bot.get_chat_administrators(chat_id)).await?;
        Ok(members.into_iter().map(|m| m.user.id).collect())
    }
}

/// Answers a settings button press: edits the menu and pops up alerts.
pub struct CallbackResponder {
    bot: ThrottledBot,
    query_id: String,
    message: Option<(ChatId, MessageId)>,
    /// Telegram accepts one answer per callback query.
    answered: AtomicBool,
}

impl CallbackResponder {
    pub fn new(bot: ThrottledBot, query: &CallbackQuery) -> Self {
        Self {
            bot,
            query_id: query.id.clone(),
            message: query.message.as_ref().map(|m| (m.chat().id, m.id())),
            answered: AtomicBool::new(false),
        }
    }

    /// Stop the client's loading spinner if nothing answered yet.
    pub async fn finish(&self) -> ModerationResult<()> {
        if self.answered.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        bounded(self.bot.answer_callback_query(&self.query_id)).await?;
        Ok(())
    }
}

#[async_trait]
impl Responder for CallbackResponder {
    async fn reply(&self, text: &str) -> ModerationResult<()> {
        if self.answered.swap(true, Ordering::SeqCst) {
            debug!("Callback {} already answered, dropping: {}", self.query_id, text);
            return Ok(());
        }
        bounded(
            self.bot
                .answer_callback_query(&self.query_id)
                .text(text)
                .show_alert(true),
        )
        .await?;
        Ok(())
    }

    async fn show(&self, view: &MenuView) -> ModerationResult<()> {
        let Some((chat_id, message_id)) = self.message else {
            // Message too old to edit; nothing to show on.
            return Ok(());
        };

        let request = self
            .bot
            .edit_message_text(chat_id, message_id, view.text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard(view));

        match tokio::time::timeout(ADAPTER_TIMEOUT, request.into_future()).await {
            // Pressing a button that changes nothing is not an error.
            Ok(Ok(_)) | Ok(Err(RequestError::Api(ApiError::MessageNotModified))) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ModerationError::Adapter("request timed out".to_string())),
        }
    }
}

//! Outbound interface to the chat platform.
//!
//! The core only talks to the platform through [`ChatAdapter`]. Every call is
//! fallible; callers log failures and carry on, nothing is retried.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::types::{ChatId, MessageId, UserId};

use crate::error::ModerationResult;
use crate::settings::MenuView;

/// Calls the moderation core makes into the chat platform.
///
/// Implementations are expected to bound each call with their own timeout.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> ModerationResult<()>;

    /// Stop a user from posting until `until`.
    async fn restrict_user(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: DateTime<Utc>,
    ) -> ModerationResult<()>;

    /// Give a restricted user their posting rights back.
    async fn unrestrict_user(&self, chat_id: ChatId, user_id: UserId) -> ModerationResult<()>;

    async fn ban_user(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: DateTime<Utc>,
    ) -> ModerationResult<()>;

    async fn unban_user(&self, chat_id: ChatId, user_id: UserId) -> ModerationResult<()>;

    async fn send_notice(&self, chat_id: ChatId, text: &str) -> ModerationResult<()>;

    /// Post a menu as a new message.
    async fn render_menu(&self, chat_id: ChatId, view: &MenuView) -> ModerationResult<()>;

    async fn list_admins(&self, chat_id: ChatId) -> ModerationResult<HashSet<UserId>>;
}

/// Where answers to an admin interaction go.
///
/// A command gets fresh messages in its chat; a menu button press edits the
/// menu in place and answers with a popup.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Short text answer (notice or popup alert).
    async fn reply(&self, text: &str) -> ModerationResult<()>;

    /// Show a menu, replacing the current one where the platform allows.
    async fn show(&self, view: &MenuView) -> ModerationResult<()>;
}

/// Responder that answers with new messages in a chat.
#[derive(Clone)]
pub struct ChatResponder {
    adapter: Arc<dyn ChatAdapter>,
    chat_id: ChatId,
}

impl ChatResponder {
    pub fn new(adapter: Arc<dyn ChatAdapter>, chat_id: ChatId) -> Self {
        Self { adapter, chat_id }
    }
}

#[async_trait]
impl Responder for ChatResponder {
    async fn reply(&self, text: &str) -> ModerationResult<()> {
        self.adapter.send_notice(self.chat_id, text).await
    }

    async fn show(&self, view: &MenuView) -> ModerationResult<()> {
        self.adapter.render_menu(self.chat_id, view).await
    }
}

//! Test doubles for the chat adapter, clock and responder.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use teloxide::types::{ChatId, MessageId, UserId};

use crate::error::{ModerationError, ModerationResult};
use crate::moderation::{ChatAdapter, Clock, Responder};
use crate::settings::MenuView;

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Delete(ChatId, MessageId),
    Restrict(ChatId, UserId, DateTime<Utc>),
    Unrestrict(ChatId, UserId),
    Ban(ChatId, UserId, DateTime<Utc>),
    Unban(ChatId, UserId),
    Notice(ChatId, String),
    Menu(ChatId, String),
    ListAdmins(ChatId),
}

/// Adapter that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingAdapter {
    calls: Mutex<Vec<Call>>,
    admins: Mutex<HashMap<ChatId, HashSet<UserId>>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl RecordingAdapter {
    pub fn set_admins(&self, chat_id: ChatId, admins: impl IntoIterator<Item = UserId>) {
        self.admins
            .lock()
            .insert(chat_id, admins.into_iter().collect());
    }

    /// Make every later call of `op` fail.
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().insert(op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn notices(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Notice(_, text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: &'static str, call: Call) -> ModerationResult<()> {
        self.calls.lock().push(call);
        if self.failing.lock().contains(op) {
            return Err(ModerationError::Adapter(format!("{op} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatAdapter for RecordingAdapter {
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> ModerationResult<()> {
        self.record("delete", Call::Delete(chat_id, message_id))
    }

    async fn restrict_user(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: DateTime<Utc>,
    ) -> ModerationResult<()> {
        self.record("restrict", Call::Restrict(chat_id, user_id, until))
    }

    async fn unrestrict_user(&self, chat_id: ChatId, user_id: UserId) -> ModerationResult<()> {
        self.record("unrestrict", Call::Unrestrict(chat_id, user_id))
    }

    async fn ban_user(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: DateTime<Utc>,
    ) -> ModerationResult<()> {
        self.record("ban", Call::Ban(chat_id, user_id, until))
    }

    async fn unban_user(&self, chat_id: ChatId, user_id: UserId) -> ModerationResult<()> {
        self.record("unban", Call::Unban(chat_id, user_id))
    }

    async fn send_notice(&self, chat_id: ChatId, text: &str) -> ModerationResult<()> {
        self.record("notice", Call::Notice(chat_id, text.to_string()))
    }

    async fn render_menu(&self, chat_id: ChatId, view: &MenuView) -> ModerationResult<()> {
        self.record("menu", Call::Menu(chat_id, view.text.clone()))
    }

    async fn list_admins(&self, chat_id: ChatId) -> ModerationResult<HashSet<UserId>> {
        self.record("list_admins", Call::ListAdmins(chat_id))?;
        Ok(self
            .admins
            .lock()
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Responder that keeps what it was asked to show.
#[derive(Default)]
pub struct RecordingResponder {
    replies: Mutex<Vec<String>>,
    views: Mutex<Vec<MenuView>>,
}

impl RecordingResponder {
    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().clone()
    }

    pub fn views(&self) -> Vec<MenuView> {
        self.views.lock().clone()
    }

    pub fn last_view(&self) -> Option<MenuView> {
        self.views.lock().last().cloned()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn reply(&self, text: &str) -> ModerationResult<()> {
        self.replies.lock().push(text.to_string());
        Ok(())
    }

    async fn show(&self, view: &MenuView) -> ModerationResult<()> {
        self.views.lock().push(view.clone());
        Ok(())
    }
}

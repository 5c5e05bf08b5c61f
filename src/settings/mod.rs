//! Interactive per-chat configuration.
//!
//! Admins walk a button menu; each press arrives as a [`MenuAction`] and is
//! answered through a [`Responder`]. Adding keywords is the only step that
//! waits for free text, tracked in [`ConfigSessions`].

mod action;
mod menu;
mod session;

use teloxide::types::{ChatId, UserId};
use tracing::{debug, warn};

pub use action::MenuAction;
pub use menu::{
    MenuButton, MenuView, category_menu, chats_menu, keyword_list, keyword_prompt, root_menu,
};
pub use session::{ConfigSessions, PendingInput};

use crate::directory::ChatDirectory;
use crate::error::ModerationResult;
use crate::moderation::Responder;
use crate::permissions::AdminCache;
use crate::policy::{ChatKind, PolicyStore, RuleCategory};

const NOT_ADMIN: &str = "Only admins can change these settings.";
const NO_SUCH_ACTION: &str = "No such action.";
const SOMETHING_WRONG: &str = "Something went wrong, please try again.";

/// Admin-gated settings state machine.
#[derive(Clone)]
pub struct SettingsProtocol {
    store: PolicyStore,
    admins: AdminCache,
    sessions: ConfigSessions,
    directory: ChatDirectory,
}

impl SettingsProtocol {
    pub fn new(
        store: PolicyStore,
        admins: AdminCache,
        sessions: ConfigSessions,
        directory: ChatDirectory,
    ) -> Self {
        Self {
            store,
            admins,
            sessions,
            directory,
        }
    }

    /// `/settings`: show the root menu for `chat_id`.
    pub async fn open(
        &self,
        chat_id: ChatId,
        admin: UserId,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        self.apply(admin, MenuAction::Root(chat_id), responder).await
    }

    /// Handle raw callback data from a button press.
    pub async fn handle_callback(
        &self,
        admin: UserId,
        data: &str,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        match MenuAction::decode(data) {
            Some(action) => self.apply(admin, action, responder).await,
            None => {
                debug!("Unknown settings action from {}: {}", admin, data);
                responder.reply(NO_SUCH_ACTION).await
            }
        }
    }

    /// Run one menu action. Non-admins get an alert and nothing changes.
    pub async fn apply(
        &self,
        admin: UserId,
        action: MenuAction,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        let Some(chat_id) = action.chat_id() else {
            return responder.show(&self.directory_menu(admin, action)).await;
        };

        if !self.admins.is_admin(chat_id, admin).await {
            return responder.reply(NOT_ADMIN).await;
        }
        self.store.ensure_chat(chat_id, ChatKind::Group);

        match self.render(admin, chat_id, action) {
            Ok(view) => responder.show(&view).await,
            Err(e) => {
                warn!("Settings action {:?} failed in chat {}: {}", action, chat_id, e);
                responder.reply(SOMETHING_WRONG).await?;
                // Back to a known-good menu.
                let policy = self.store.snapshot(chat_id)?;
                responder.show(&root_menu(chat_id, &policy)).await
            }
        }
    }

    /// Apply a state change and build the view that follows it.
    fn render(
        &self,
        admin: UserId,
        chat_id: ChatId,
        action: MenuAction,
    ) -> ModerationResult<MenuView> {
        // Navigating anywhere else abandons a keyword prompt.
        if !matches!(action, MenuAction::AddKeywords(_)) && self.sessions.take(admin).is_some() {
            debug!("Dropped pending input for {}", admin);
        }

        let category = match action {
            MenuAction::Root(_) => {
                let policy = self.store.snapshot(chat_id)?;
                return Ok(root_menu(chat_id, &policy));
            }
            MenuAction::Close(_) => return Ok(MenuView::text_only("✅ Settings saved.")),
            MenuAction::AddKeywords(_) => {
                self.sessions
                    .begin(admin, PendingInput::CustomKeywords { chat_id });
                return Ok(keyword_prompt(chat_id));
            }
            MenuAction::ClearKeywords(_) => {
                let removed = self.store.clear_custom_keywords(chat_id)?;
                debug!("Cleared {} keywords in chat {}", removed, chat_id);
                RuleCategory::Custom
            }
            MenuAction::Category(_, category) => category,
            MenuAction::ToggleEnabled(_, category) => {
                self.store
                    .update_rule(chat_id, category, |r| r.toggle_enabled())?;
                category
            }
            MenuAction::CycleAction(_, category) => {
                self.store
                    .update_rule(chat_id, category, |r| r.cycle_action())?;
                category
            }
            MenuAction::CycleDuration(_, category) => {
                self.store
                    .update_rule(chat_id, category, |r| r.cycle_duration())?;
                category
            }
            MenuAction::CycleThreshold(_, category) => {
                self.store
                    .update_rule(chat_id, category, |r| r.cycle_warn_threshold())?;
                category
            }
            MenuAction::TogglePostWarn(_, category) => {
                self.store
                    .update_rule(chat_id, category, |r| r.toggle_post_warn_action())?;
                category
            }
            MenuAction::MyGroups | MenuAction::MyChannels => {
                return Ok(self.directory_menu(admin, action));
            }
        };

        let policy = self.store.snapshot(chat_id)?;
        Ok(category_menu(chat_id, category, &policy))
    }

    /// The admin's own groups or channels; needs no admin check.
    fn directory_menu(&self, admin: UserId, action: MenuAction) -> MenuView {
        let kind = match action {
            MenuAction::MyChannels => ChatKind::Channel,
            _ => ChatKind::Group,
        };
        chats_menu(kind, &self.directory.chats_for(admin, kind))
    }

    /// Feed a plain-text message into the admin's pending session.
    ///
    /// Returns `false` if there was no session, in which case the message is
    /// not settings input. A consumed session is always cleared.
    pub async fn consume_pending_input(
        &self,
        admin: UserId,
        text: &str,
        responder: &dyn Responder,
    ) -> ModerationResult<bool> {
        if text.trim_start().starts_with('/') {
            return Ok(false);
        }
        let Some(PendingInput::CustomKeywords { chat_id }) = self.sessions.take(admin) else {
            return Ok(false);
        };

        let mut added = 0usize;
        for word in text.split_whitespace() {
            match self.store.add_custom_keyword(chat_id, word) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to add keyword in chat {}: {}", chat_id, e);
                    responder.reply(SOMETHING_WRONG).await?;
                    return Ok(true);
                }
            }
        }

        responder
            .reply(&format!("✅ Added {added} keyword(s)."))
            .await?;
        let policy = self.store.snapshot(chat_id)?;
        responder.show(&root_menu(chat_id, &policy)).await?;
        Ok(true)
    }

    #[cfg(test)]
    fn has_pending_input(&self, admin: UserId) -> bool {
        self.sessions.pending(admin).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::cache::CacheRegistry;
    use crate::policy::RuleAction;
    use crate::testing::{RecordingAdapter, RecordingResponder};

    const CHAT: ChatId = ChatId(-1001);
    const ADMIN: UserId = UserId(1);
    const MEMBER: UserId = UserId(2);

    fn protocol() -> (SettingsProtocol, PolicyStore) {
        let adapter = Arc::new(RecordingAdapter::default());
        adapter.set_admins(CHAT, [ADMIN]);
        let registry = CacheRegistry::new();
        let store = PolicyStore::new();
        let admins = AdminCache::new(adapter, &registry, Duration::from_secs(300), vec![]);
        let sessions = ConfigSessions::new(&registry, Duration::from_secs(600));
        let protocol =
            SettingsProtocol::new(store.clone(), admins, sessions, ChatDirectory::new());
        (protocol, store)
    }

    async fn press(protocol: &SettingsProtocol, user: UserId, action: MenuAction) -> RecordingResponder {
        let responder = RecordingResponder::default();
        protocol
            .handle_callback(user, &action.encode(), &responder)
            .await
            .unwrap();
        responder
    }

    #[tokio::test]
    async fn test_non_admin_is_rejected() {
        let (protocol, store) = protocol();
        store.ensure_chat(CHAT, ChatKind::Group);

        let responder = press(&protocol, MEMBER, MenuAction::CycleAction(CHAT, RuleCategory::Link)).await;
        assert_eq!(responder.replies(), vec![NOT_ADMIN.to_string()]);
        assert!(responder.views().is_empty());
        assert_eq!(
            store.rule(CHAT, RuleCategory::Link).unwrap().action,
            RuleAction::Off
        );
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let (protocol, _) = protocol();
        let responder = RecordingResponder::default();
        protocol
            .handle_callback(ADMIN, "cfg:launch:-1001", &responder)
            .await
            .unwrap();
        assert_eq!(responder.replies(), vec![NO_SUCH_ACTION.to_string()]);
    }

    #[tokio::test]
    async fn test_cycle_action_updates_rule_and_menu() {
        let (protocol, store) = protocol();
        let responder = press(&protocol, ADMIN, MenuAction::CycleAction(CHAT, RuleCategory::Link)).await;

        let rule = store.rule(CHAT, RuleCategory::Link).unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.action, RuleAction::Mute);
        let view = responder.last_view().unwrap();
        assert!(view.buttons().any(|b| b.label == "Action: mute"));
    }

    #[tokio::test]
    async fn test_toggle_off_forces_off_action() {
        let (protocol, store) = protocol();
        press(&protocol, ADMIN, MenuAction::CycleAction(CHAT, RuleCategory::Forward)).await;
        press(&protocol, ADMIN, MenuAction::CycleAction(CHAT, RuleCategory::Forward)).await;
        assert_eq!(store.rule(CHAT, RuleCategory::Forward).unwrap().action, RuleAction::Ban);

        press(&protocol, ADMIN, MenuAction::ToggleEnabled(CHAT, RuleCategory::Forward)).await;
        let rule = store.rule(CHAT, RuleCategory::Forward).unwrap();
        assert!(!rule.enabled);
        assert_eq!(rule.action, RuleAction::Off);
    }

    #[tokio::test]
    async fn test_duration_threshold_and_post_warn() {
        let (protocol, store) = protocol();
        let cat = RuleCategory::Mention;
        press(&protocol, ADMIN, MenuAction::CycleDuration(CHAT, cat)).await;
        press(&protocol, ADMIN, MenuAction::CycleThreshold(CHAT, cat)).await;
        press(&protocol, ADMIN, MenuAction::TogglePostWarn(CHAT, cat)).await;

        let rule = store.rule(CHAT, cat).unwrap();
        assert_eq!(rule.duration.as_str(), "6h");
        assert_eq!(rule.warn_threshold, 2);
        assert_eq!(rule.post_warn_action.as_str(), "ban");
    }

    #[tokio::test]
    async fn test_keyword_entry_flow() {
        let (protocol, store) = protocol();
        let responder = press(&protocol, ADMIN, MenuAction::AddKeywords(CHAT)).await;
        assert_eq!(responder.last_view(), Some(keyword_prompt(CHAT)));
        assert!(protocol.has_pending_input(ADMIN));

        let responder = RecordingResponder::default();
        let consumed = protocol
            .consume_pending_input(ADMIN, "Spam  scam\nspam", &responder)
            .await
            .unwrap();
        assert!(consumed);
        assert!(!protocol.has_pending_input(ADMIN));
        assert_eq!(
            store.custom_keywords(CHAT).unwrap(),
            vec!["scam".to_string(), "spam".to_string()]
        );
        assert!(responder.replies()[0].contains("2 keyword"));
        assert_eq!(
            responder.last_view().map(|v| v.text),
            Some(root_menu(CHAT, &store.snapshot(CHAT).unwrap()).text)
        );

        // Session is gone, so the next message is ordinary chat.
        let consumed = protocol
            .consume_pending_input(ADMIN, "hello", &RecordingResponder::default())
            .await
            .unwrap();
        assert!(!consumed);
    }

    #[tokio::test]
    async fn test_commands_do_not_consume_session() {
        let (protocol, _) = protocol();
        press(&protocol, ADMIN, MenuAction::AddKeywords(CHAT)).await;
        let consumed = protocol
            .consume_pending_input(ADMIN, "/settings", &RecordingResponder::default())
            .await
            .unwrap();
        assert!(!consumed);
        assert!(protocol.has_pending_input(ADMIN));
    }

    #[tokio::test]
    async fn test_cancel_drops_session() {
        let (protocol, _) = protocol();
        press(&protocol, ADMIN, MenuAction::AddKeywords(CHAT)).await;
        press(&protocol, ADMIN, MenuAction::Category(CHAT, RuleCategory::Custom)).await;
        assert!(!protocol.has_pending_input(ADMIN));
    }

    #[tokio::test]
    async fn test_clear_keywords() {
        let (protocol, store) = protocol();
        store.ensure_chat(CHAT, ChatKind::Group);
        store.add_custom_keyword(CHAT, "spam").unwrap();
        let responder = press(&protocol, ADMIN, MenuAction::ClearKeywords(CHAT)).await;
        assert!(store.custom_keywords(CHAT).unwrap().is_empty());
        assert!(responder.last_view().unwrap().text.contains("No custom keywords"));
    }

    #[tokio::test]
    async fn test_blank_input_still_clears_session() {
        let (protocol, store) = protocol();
        press(&protocol, ADMIN, MenuAction::AddKeywords(CHAT)).await;

        let responder = RecordingResponder::default();
        let consumed = protocol
            .consume_pending_input(ADMIN, "   ", &responder)
            .await
            .unwrap();
        assert!(consumed);
        assert!(!protocol.has_pending_input(ADMIN));
        assert!(store.custom_keywords(CHAT).unwrap().is_empty());
        assert!(responder.replies()[0].contains("0 keyword"));
        assert_eq!(
            responder.last_view(),
            Some(root_menu(CHAT, &store.snapshot(CHAT).unwrap()))
        );
    }

    #[tokio::test]
    async fn test_my_groups_needs_no_admin_check() {
        let (protocol, _) = protocol();
        let responder = press(&protocol, MEMBER, MenuAction::MyGroups).await;
        assert!(responder.replies().is_empty());
        let view = responder.last_view().unwrap();
        assert!(!view.buttons().any(|b| matches!(b.action, MenuAction::Root(_))));
    }

    #[tokio::test]
    async fn test_my_channels_lists_only_channels() {
        let (protocol, _) = protocol();
        protocol
            .directory
            .register(ADMIN, CHAT, "Rustaceans", ChatKind::Group);
        protocol
            .directory
            .register(ADMIN, ChatId(-2002), "Announcements", ChatKind::Channel);

        let responder = press(&protocol, ADMIN, MenuAction::MyChannels).await;
        let view = responder.last_view().unwrap();
        let chats: Vec<MenuAction> = view
            .buttons()
            .map(|b| b.action)
            .filter(|a| matches!(a, MenuAction::Root(_)))
            .collect();
        assert_eq!(chats, vec![MenuAction::Root(ChatId(-2002))]);
        assert!(view.text.contains("My Channels"));
    }
}

//! Entry points the bot layer calls into.

use std::sync::Arc;
use std::time::Duration;

use teloxide::types::{ChatId, UserId};
use tracing::{debug, info, warn};

use crate::cache::CacheRegistry;
use crate::directory::ChatDirectory;
use crate::error::{ModerationError, ModerationResult};
use crate::moderation::{
    ChatAdapter, Clock, Detector, Enforcement, EscalationEngine, InboundMessage, LinkMatcher,
    Responder,
};
use crate::permissions::AdminCache;
use crate::policy::{ChatKind, PolicyStore};
use crate::settings::{ConfigSessions, MenuAction, SettingsProtocol, keyword_list};
use crate::utils::{default_duration, format_duration, parse_duration};

const ADMINS_ONLY: &str = "❌ This command is for admins only.";
const TARGET_IS_ADMIN: &str = "❌ Admins can't be moderated.";
const SOMETHING_WRONG: &str = "❌ Something went wrong, please try again.";

/// Tunables for the moderation core.
#[derive(Debug, Clone)]
pub struct ModeratorConfig {
    pub owner_ids: Vec<u64>,
    pub admin_cache_ttl: Duration,
    pub session_idle: Duration,
    /// Extra link-shortener hosts on top of the built-in list.
    pub short_link_domains: Vec<String>,
}

impl Default for ModeratorConfig {
    fn default() -> Self {
        Self {
            owner_ids: Vec::new(),
            admin_cache_ttl: Duration::from_secs(300),
            session_idle: Duration::from_secs(600),
            short_link_domains: Vec::new(),
        }
    }
}

/// User a manual command acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub user_id: UserId,
    pub name: String,
}

/// Manual restriction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punishment {
    Ban,
    Mute,
}

/// The moderation core.
///
/// Cloning is cheap; every clone shares the same state.
#[derive(Clone)]
pub struct Moderator {
    store: PolicyStore,
    admins: AdminCache,
    detector: Detector,
    engine: EscalationEngine,
    settings: SettingsProtocol,
    directory: ChatDirectory,
    adapter: Arc<dyn ChatAdapter>,
}

impl Moderator {
    pub fn new(
        adapter: Arc<dyn ChatAdapter>,
        clock: Arc<dyn Clock>,
        registry: &CacheRegistry,
        config: &ModeratorConfig,
    ) -> Self {
        let store = PolicyStore::new();
        let directory = ChatDirectory::new();
        let admins = AdminCache::new(
            Arc::clone(&adapter),
            registry,
            config.admin_cache_ttl,
            config.owner_ids.clone(),
        );
        let sessions = ConfigSessions::new(registry, config.session_idle);
        let settings =
            SettingsProtocol::new(store.clone(), admins.clone(), sessions, directory.clone());
        let engine = EscalationEngine::new(store.clone(), Arc::clone(&adapter), clock);

        Self {
            store,
            admins,
            detector: Detector::new(LinkMatcher::new(&config.short_link_domains)),
            engine,
            settings,
            directory,
            adapter,
        }
    }

    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    pub fn admins(&self) -> &AdminCache {
        &self.admins
    }

    pub fn directory(&self) -> &ChatDirectory {
        &self.directory
    }

    /// Make sure a chat has state and remember who manages it.
    ///
    /// The directory lists the chat under the kind it was first seen as.
    pub fn register_chat(&self, chat_id: ChatId, kind: ChatKind, user: Option<(UserId, &str)>) {
        self.store.ensure_chat(chat_id, kind);
        if let Some((user, title)) = user {
            let kind = self.store.kind(chat_id).unwrap_or(kind);
            self.directory.register(user, chat_id, title, kind);
        }
    }

    /// Load a chat's admins ahead of its first message.
    ///
    /// Failures are logged; the next admin check retries the lookup.
    pub async fn warm_admins(&self, chat_id: ChatId) {
        if let Err(e) = self.admins.refresh(chat_id).await {
            warn!("Failed to preload admins for chat {}: {}", chat_id, e);
        }
    }

    /// Bot left or was removed: drop everything about the chat.
    pub fn forget_chat(&self, chat_id: ChatId) {
        self.store.remove_chat(chat_id);
        self.admins.invalidate(chat_id);
        self.directory.forget_chat(chat_id);
        info!(
            "Forgot chat {}, {} chats still moderated",
            chat_id,
            self.store.chat_count()
        );
    }

    /// Check one inbound message and enforce the first violated rule.
    ///
    /// Admins are never moderated. Returns what was done, if anything.
    pub async fn on_message(&self, msg: &InboundMessage) -> ModerationResult<Option<Enforcement>> {
        self.store.ensure_chat(msg.chat_id, ChatKind::Group);
        if msg.is_admin_hint {
            return Ok(None);
        }

        // One snapshot per message; later edits apply to later messages.
        let policy = self.store.snapshot(msg.chat_id)?;
        let Some(category) = self.detector.detect(&policy, msg) else {
            return Ok(None);
        };

        if self.admins.is_admin(msg.chat_id, msg.user_id).await {
            debug!(
                "Skipping {} violation by admin {} in chat {}",
                category, msg.user_id, msg.chat_id
            );
            return Ok(None);
        }

        let rule = policy.rule(category).clone();
        self.engine.enforce(msg, category, &rule).await.map(Some)
    }

    /// Settings button press.
    pub async fn on_admin_action(
        &self,
        admin: UserId,
        data: &str,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        self.settings.handle_callback(admin, data, responder).await
    }

    /// `/settings` in a chat.
    pub async fn open_settings(
        &self,
        chat_id: ChatId,
        admin: UserId,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        self.settings.open(chat_id, admin, responder).await
    }

    /// Private "My Groups" list.
    pub async fn show_groups(&self, user: UserId, responder: &dyn Responder) -> ModerationResult<()> {
        self.settings
            .apply(user, MenuAction::MyGroups, responder)
            .await
    }

    /// Private "My Channels" list.
    pub async fn show_channels(
        &self,
        user: UserId,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        self.settings
            .apply(user, MenuAction::MyChannels, responder)
            .await
    }

    /// Plain text that may answer a pending settings prompt.
    pub async fn on_text_input(
        &self,
        admin: UserId,
        text: &str,
        responder: &dyn Responder,
    ) -> ModerationResult<bool> {
        self.settings
            .consume_pending_input(admin, text, responder)
            .await
    }

    /// Reply with a refusal unless `user` is an admin of `chat_id`.
    async fn require_admin(
        &self,
        chat_id: ChatId,
        user: UserId,
        responder: &dyn Responder,
    ) -> ModerationResult<bool> {
        if self.admins.is_admin(chat_id, user).await {
            return Ok(true);
        }
        responder.reply(ADMINS_ONLY).await?;
        Ok(false)
    }

    /// Admin gate plus refusal to act on other admins.
    async fn check_target(
        &self,
        chat_id: ChatId,
        admin: UserId,
        target: &Target,
        responder: &dyn Responder,
    ) -> ModerationResult<bool> {
        if !self.require_admin(chat_id, admin, responder).await? {
            return Ok(false);
        }
        if self.admins.is_admin(chat_id, target.user_id).await {
            responder.reply(TARGET_IS_ADMIN).await?;
            return Ok(false);
        }
        self.store.ensure_chat(chat_id, ChatKind::Group);
        Ok(true)
    }

    /// `/warn`
    pub async fn warn(
        &self,
        chat_id: ChatId,
        admin: UserId,
        target: &Target,
        reason: Option<&str>,
        responder: &dyn Responder,
    ) -> ModerationResult<Option<Enforcement>> {
        if !self.check_target(chat_id, admin, target, responder).await? {
            return Ok(None);
        }
        self.engine
            .command_warn(chat_id, target.user_id, &target.name, reason)
            .await
            .map(Some)
    }

    /// `/rmwarn`: take back one warning.
    pub async fn remove_warning(
        &self,
        chat_id: ChatId,
        admin: UserId,
        target: &Target,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        if !self.require_admin(chat_id, admin, responder).await? {
            return Ok(());
        }
        self.store.ensure_chat(chat_id, ChatKind::Group);
        let remaining = self.store.adjust_warning(chat_id, target.user_id, -1)?;
        responder
            .reply(&format!(
                "✅ Removed a warning from {}. Warnings now: {}",
                target.name, remaining
            ))
            .await
    }

    /// `/resetwarn`
    pub async fn reset_warnings(
        &self,
        chat_id: ChatId,
        admin: UserId,
        target: &Target,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        if !self.require_admin(chat_id, admin, responder).await? {
            return Ok(());
        }
        self.store.ensure_chat(chat_id, ChatKind::Group);
        self.store.reset_warnings(chat_id, target.user_id)?;
        responder
            .reply(&format!("✅ Warnings for {} have been reset.", target.name))
            .await
    }

    /// `/warns`: anyone may look.
    pub async fn show_warnings(
        &self,
        chat_id: ChatId,
        target: &Target,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        self.store.ensure_chat(chat_id, ChatKind::Group);
        let count = self.store.warnings(chat_id, target.user_id)?;
        responder
            .reply(&format!("{} has {} warning(s).", target.name, count))
            .await
    }

    /// `/ban` and `/mute` with an optional duration argument.
    pub async fn punish(
        &self,
        chat_id: ChatId,
        admin: UserId,
        target: &Target,
        kind: Punishment,
        duration: Option<&str>,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        if !self.check_target(chat_id, admin, target, responder).await? {
            return Ok(());
        }

        let duration = duration.map(parse_duration).unwrap_or_else(default_duration);
        let until = self.engine.now() + duration;
        let result = match kind {
            Punishment::Ban => self.adapter.ban_user(chat_id, target.user_id, until).await,
            Punishment::Mute => {
                self.adapter
                    .restrict_user(chat_id, target.user_id, until)
                    .await
            }
        };

        if let Err(e) = result {
            warn!("{:?} of user {} in chat {} failed: {}", kind, target.user_id, chat_id, e);
            return responder.reply(SOMETHING_WRONG).await;
        }

        info!("{:?} user {} in chat {} until {}", kind, target.user_id, chat_id, until);
        let text = match kind {
            Punishment::Ban => format!(
                "🔨 {} has been banned for {}.",
                target.name,
                format_duration(duration)
            ),
            Punishment::Mute => format!(
                "🔇 {} has been muted for {}.",
                target.name,
                format_duration(duration)
            ),
        };
        responder.reply(&text).await
    }

    /// `/unban` and `/unmute`.
    pub async fn pardon(
        &self,
        chat_id: ChatId,
        admin: UserId,
        target: &Target,
        kind: Punishment,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        if !self.require_admin(chat_id, admin, responder).await? {
            return Ok(());
        }

        let (result, text) = match kind {
            Punishment::Ban => (
                self.adapter.unban_user(chat_id, target.user_id).await,
                format!("✅ {} has been unbanned.", target.name),
            ),
            Punishment::Mute => (
                self.adapter.unrestrict_user(chat_id, target.user_id).await,
                format!("✅ {} can speak again.", target.name),
            ),
        };

        match result {
            Ok(()) => responder.reply(&text).await,
            Err(e) => {
                warn!("Lifting {:?} for user {} in chat {} failed: {}", kind, target.user_id, chat_id, e);
                responder.reply(SOMETHING_WRONG).await
            }
        }
    }

    /// `/allowlink [domain]`: with no domain, list the allowed ones.
    pub async fn allow_link(
        &self,
        chat_id: ChatId,
        admin: UserId,
        domain: Option<&str>,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        if !self.require_admin(chat_id, admin, responder).await? {
            return Ok(());
        }
        self.store.ensure_chat(chat_id, ChatKind::Group);

        let Some(domain) = domain else {
            let domains = self.store.allowed_domains(chat_id)?;
            let text = if domains.is_empty() {
                "No domains are allowed. Usage: /allowlink <domain>".to_string()
            } else {
                format!("Allowed domains: {}", domains.join(", "))
            };
            return responder.reply(&text).await;
        };

        match self.store.allow_domain(chat_id, domain) {
            Ok(true) => responder.reply(&format!("✅ Links to {domain} are now allowed.")).await,
            Ok(false) => responder.reply(&format!("{domain} was already allowed.")).await,
            Err(ModerationError::InvalidInput(_)) => {
                responder.reply("Usage: /allowlink <domain>").await
            }
            Err(e) => Err(e),
        }
    }

    /// `/blocklink <domain>`
    pub async fn block_link(
        &self,
        chat_id: ChatId,
        admin: UserId,
        domain: Option<&str>,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        if !self.require_admin(chat_id, admin, responder).await? {
            return Ok(());
        }
        let Some(domain) = domain else {
            return responder.reply("Usage: /blocklink <domain>").await;
        };
        self.store.ensure_chat(chat_id, ChatKind::Group);

        let text = if self.store.block_domain(chat_id, domain)? {
            format!("✅ {domain} is no longer allowed.")
        } else {
            format!("{domain} was not on the allow list.")
        };
        responder.reply(&text).await
    }

    /// `/keywords`
    pub async fn list_keywords(
        &self,
        chat_id: ChatId,
        admin: UserId,
        responder: &dyn Responder,
    ) -> ModerationResult<()> {
        if !self.require_admin(chat_id, admin, responder).await? {
            return Ok(());
        }
        self.store.ensure_chat(chat_id, ChatKind::Group);
        let policy = self.store.snapshot(chat_id)?;
        responder.reply(&keyword_list(&policy)).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use teloxide::types::MessageId;

    use super::*;
    use crate::moderation::EntityKind;
    use crate::policy::{PostWarnAction, RuleAction, RuleCategory};
    use crate::testing::{Call, FixedClock, RecordingAdapter, RecordingResponder};

    const CHAT: ChatId = ChatId(-1001);
    const ADMIN: UserId = UserId(1);
    const USER: UserId = UserId(42);

    fn moderator() -> (Moderator, Arc<RecordingAdapter>, FixedClock) {
        let adapter = Arc::new(RecordingAdapter::default());
        adapter.set_admins(CHAT, [ADMIN]);
        let clock = FixedClock::default();
        let moderator = Moderator::new(
            adapter.clone(),
            Arc::new(clock),
            &CacheRegistry::new(),
            &ModeratorConfig::default(),
        );
        (moderator, adapter, clock)
    }

    fn message(user: UserId, text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: CHAT,
            message_id: MessageId(10),
            user_id: user,
            sender_name: "Mallory".to_string(),
            text: text.to_string(),
            is_forwarded: false,
            entities: Vec::new(),
            is_admin_hint: false,
        }
    }

    fn target(user: UserId) -> Target {
        Target {
            user_id: user,
            name: "Mallory".to_string(),
        }
    }

    fn enable(moderator: &Moderator, category: RuleCategory, action: RuleAction) {
        moderator.store().ensure_chat(CHAT, ChatKind::Group);
        moderator
            .store()
            .update_rule(CHAT, category, |r| {
                r.set_enabled(true);
                r.action = action;
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_first_message_creates_default_policy() {
        let (moderator, adapter, _) = moderator();
        let outcome = moderator.on_message(&message(USER, "https://example.com")).await.unwrap();
        assert_eq!(outcome, None);
        assert!(moderator.store().contains(CHAT));
        assert!(adapter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_link_mute_one_hour() {
        let (moderator, adapter, clock) = moderator();
        enable(&moderator, RuleCategory::Link, RuleAction::Mute);

        let outcome = moderator
            .on_message(&message(USER, "visit https://example.com"))
            .await
            .unwrap();

        let until = clock.0 + ChronoDuration::hours(1);
        assert_eq!(outcome, Some(Enforcement::Muted { until }));
        assert_eq!(adapter.count(|c| *c == Call::Delete(CHAT, MessageId(10))), 1);
        assert_eq!(adapter.count(|c| *c == Call::Restrict(CHAT, USER, until)), 1);
        assert_eq!(adapter.count(|c| matches!(c, Call::Ban(..))), 0);
    }

    #[tokio::test]
    async fn test_admin_is_never_moderated() {
        let (moderator, adapter, _) = moderator();
        enable(&moderator, RuleCategory::Link, RuleAction::Ban);
        moderator.admins().refresh(CHAT).await.unwrap();
        adapter.clear();

        let outcome = moderator
            .on_message(&message(ADMIN, "https://example.com"))
            .await
            .unwrap();
        assert_eq!(outcome, None);
        assert!(adapter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cold_cache_costs_one_admin_lookup() {
        let (moderator, adapter, _) = moderator();
        enable(&moderator, RuleCategory::Link, RuleAction::Ban);
        adapter.clear();

        let outcome = moderator
            .on_message(&message(ADMIN, "https://example.com"))
            .await
            .unwrap();
        assert_eq!(outcome, None);
        assert_eq!(adapter.calls(), vec![Call::ListAdmins(CHAT)]);

        adapter.clear();
        moderator
            .on_message(&message(ADMIN, "https://example.org"))
            .await
            .unwrap();
        assert!(adapter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_warm_admins_fills_cache() {
        let (moderator, adapter, _) = moderator();
        enable(&moderator, RuleCategory::Link, RuleAction::Ban);
        moderator.warm_admins(CHAT).await;
        adapter.clear();

        moderator
            .on_message(&message(ADMIN, "https://example.com"))
            .await
            .unwrap();
        assert!(adapter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_command_prefixed_link_is_enforced() {
        let (moderator, adapter, clock) = moderator();
        enable(&moderator, RuleCategory::Link, RuleAction::Ban);

        let outcome = moderator
            .on_message(&message(USER, "/help https://evil.example"))
            .await
            .unwrap();
        let until = clock.0 + ChronoDuration::hours(1);
        assert_eq!(outcome, Some(Enforcement::Banned { until }));
        assert_eq!(adapter.count(|c| *c == Call::Delete(CHAT, MessageId(10))), 1);
        assert_eq!(adapter.count(|c| *c == Call::Ban(CHAT, USER, until)), 1);
    }

    #[tokio::test]
    async fn test_admin_hint_skips_everything() {
        let (moderator, adapter, _) = moderator();
        enable(&moderator, RuleCategory::Link, RuleAction::Ban);
        let mut msg = message(USER, "https://example.com");
        msg.is_admin_hint = true;
        assert_eq!(moderator.on_message(&msg).await.unwrap(), None);
        assert!(adapter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_custom_keyword_deleted() {
        let (moderator, adapter, _) = moderator();
        enable(&moderator, RuleCategory::Custom, RuleAction::Delete);
        moderator.store().add_custom_keyword(CHAT, "spam").unwrap();

        let outcome = moderator.on_message(&message(USER, "this is SPAM")).await.unwrap();
        assert_eq!(outcome, Some(Enforcement::Deleted));
        assert_eq!(adapter.count(|c| matches!(c, Call::Delete(..))), 1);
    }

    #[tokio::test]
    async fn test_warn_rule_threshold_three() {
        let (moderator, adapter, _) = moderator();
        enable(&moderator, RuleCategory::Mention, RuleAction::Warn);
        moderator
            .store()
            .update_rule(CHAT, RuleCategory::Mention, |r| {
                r.warn_threshold = 3;
                r.post_warn_action = PostWarnAction::Mute;
            })
            .unwrap();

        let mut msg = message(USER, "hi @someone");
        msg.entities.push(EntityKind::Mention);
        for _ in 0..3 {
            moderator.on_message(&msg).await.unwrap();
        }
        assert_eq!(adapter.count(|c| matches!(c, Call::Restrict(..))), 1);
        assert_eq!(moderator.store().warnings(CHAT, USER).unwrap(), 0);

        let outcome = moderator.on_message(&msg).await.unwrap();
        assert_eq!(outcome, Some(Enforcement::Warned { count: 1, threshold: 3 }));
    }

    #[tokio::test]
    async fn test_warn_command_bans_after_three() {
        let (moderator, adapter, clock) = moderator();
        let responder = RecordingResponder::default();
        for _ in 0..3 {
            moderator
                .warn(CHAT, ADMIN, &target(USER), None, &responder)
                .await
                .unwrap();
        }

        let until = clock.0 + ChronoDuration::hours(1);
        assert_eq!(adapter.count(|c| *c == Call::Ban(CHAT, USER, until)), 1);
        assert_eq!(moderator.store().warnings(CHAT, USER).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_warn_command_ignores_category_threshold() {
        let (moderator, adapter, clock) = moderator();
        enable(&moderator, RuleCategory::Mention, RuleAction::Warn);
        moderator
            .store()
            .update_rule(CHAT, RuleCategory::Mention, |r| {
                r.warn_threshold = 1;
                r.post_warn_action = PostWarnAction::Mute;
            })
            .unwrap();
        let responder = RecordingResponder::default();

        for _ in 0..2 {
            moderator
                .warn(CHAT, ADMIN, &target(USER), None, &responder)
                .await
                .unwrap();
        }
        assert_eq!(adapter.count(|c| matches!(c, Call::Ban(..))), 0);
        assert_eq!(adapter.count(|c| matches!(c, Call::Restrict(..))), 0);
        assert_eq!(moderator.store().warnings(CHAT, USER).unwrap(), 2);

        let outcome = moderator
            .warn(CHAT, ADMIN, &target(USER), None, &responder)
            .await
            .unwrap();
        let until = clock.0 + ChronoDuration::hours(1);
        assert_eq!(
            outcome,
            Some(Enforcement::Escalated {
                action: PostWarnAction::Ban,
                until
            })
        );
        assert_eq!(adapter.count(|c| *c == Call::Ban(CHAT, USER, until)), 1);
        assert_eq!(adapter.count(|c| matches!(c, Call::Restrict(..))), 0);
    }

    #[tokio::test]
    async fn test_commands_require_admin() {
        let (moderator, adapter, _) = moderator();
        let responder = RecordingResponder::default();
        let outcome = moderator
            .warn(CHAT, USER, &target(UserId(7)), None, &responder)
            .await
            .unwrap();
        assert_eq!(outcome, None);
        assert_eq!(responder.replies(), vec![ADMINS_ONLY.to_string()]);

        moderator
            .punish(CHAT, USER, &target(UserId(7)), Punishment::Ban, None, &responder)
            .await
            .unwrap();
        assert_eq!(adapter.count(|c| matches!(c, Call::Ban(..))), 0);
    }

    #[tokio::test]
    async fn test_admin_targets_are_refused() {
        let (moderator, adapter, _) = moderator();
        let responder = RecordingResponder::default();
        moderator
            .punish(CHAT, ADMIN, &target(ADMIN), Punishment::Mute, None, &responder)
            .await
            .unwrap();
        assert_eq!(responder.replies(), vec![TARGET_IS_ADMIN.to_string()]);
        assert_eq!(adapter.count(|c| matches!(c, Call::Restrict(..))), 0);
    }

    #[tokio::test]
    async fn test_punish_parses_duration() {
        let (moderator, adapter, clock) = moderator();
        let responder = RecordingResponder::default();
        moderator
            .punish(CHAT, ADMIN, &target(USER), Punishment::Mute, Some("3d"), &responder)
            .await
            .unwrap();
        let until = clock.0 + ChronoDuration::days(3);
        assert_eq!(adapter.count(|c| *c == Call::Restrict(CHAT, USER, until)), 1);
        assert_eq!(responder.replies(), vec!["🔇 Mallory has been muted for 3 days.".to_string()]);

        moderator
            .pardon(CHAT, ADMIN, &target(USER), Punishment::Mute, &responder)
            .await
            .unwrap();
        assert_eq!(adapter.count(|c| *c == Call::Unrestrict(CHAT, USER)), 1);
    }

    #[tokio::test]
    async fn test_punish_reports_adapter_failure() {
        let (moderator, adapter, _) = moderator();
        adapter.fail("ban");
        let responder = RecordingResponder::default();
        moderator
            .punish(CHAT, ADMIN, &target(USER), Punishment::Ban, None, &responder)
            .await
            .unwrap();
        assert_eq!(responder.replies(), vec![SOMETHING_WRONG.to_string()]);
    }

    #[tokio::test]
    async fn test_allowed_link_passes() {
        let (moderator, adapter, _) = moderator();
        enable(&moderator, RuleCategory::Link, RuleAction::Ban);
        let responder = RecordingResponder::default();
        moderator
            .allow_link(CHAT, ADMIN, Some("github.com"), &responder)
            .await
            .unwrap();
        adapter.clear();

        let outcome = moderator
            .on_message(&message(USER, "https://github.com/rust-lang/rust"))
            .await
            .unwrap();
        assert_eq!(outcome, None);
        assert!(adapter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_forget_chat() {
        let (moderator, _, _) = moderator();
        moderator.register_chat(CHAT, ChatKind::Group, Some((ADMIN, "Rustaceans")));
        assert_eq!(moderator.directory().chats_for(ADMIN, ChatKind::Group).len(), 1);

        moderator.forget_chat(CHAT);
        assert!(!moderator.store().contains(CHAT));
        assert!(moderator.directory().chats_for(ADMIN, ChatKind::Group).is_empty());
    }

    #[tokio::test]
    async fn test_channel_keeps_its_kind() {
        let (moderator, _, _) = moderator();
        let channel = ChatId(-2002);
        moderator.register_chat(channel, ChatKind::Channel, Some((ADMIN, "News")));
        moderator.register_chat(channel, ChatKind::Group, Some((ADMIN, "News")));

        assert!(moderator.directory().chats_for(ADMIN, ChatKind::Group).is_empty());
        assert_eq!(
            moderator.directory().chats_for(ADMIN, ChatKind::Channel),
            vec![(channel, "News".to_string())]
        );

        let responder = RecordingResponder::default();
        moderator.show_channels(ADMIN, &responder).await.unwrap();
        let view = responder.last_view().unwrap();
        assert!(view.text.contains("My Channels"));
    }
}

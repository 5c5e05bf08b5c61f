//! Enforcement of detected violations.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use teloxide::types::{ChatId, UserId};
use tracing::{info, warn};

use super::adapter::ChatAdapter;
use super::clock::Clock;
use super::detector::InboundMessage;
use crate::error::ModerationResult;
use crate::policy::{CategoryRule, PolicyStore, PostWarnAction, RuleAction, RuleCategory};
use crate::utils::format_duration;

/// Warnings before `/warn` bans a user.
pub const COMMAND_WARN_LIMIT: u32 = 3;

/// How long a `/warn` ban lasts.
pub fn command_warn_ban() -> Duration {
    Duration::hours(1)
}

/// What the engine did about a violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enforcement {
    Deleted,
    Muted { until: DateTime<Utc> },
    Banned { until: DateTime<Utc> },
    Warned { count: u32, threshold: u32 },
    Escalated { action: PostWarnAction, until: DateTime<Utc> },
}

/// Applies rule actions through the chat adapter.
///
/// Adapter failures are logged and never abort the rest of the sequence.
#[derive(Clone)]
pub struct EscalationEngine {
    store: PolicyStore,
    adapter: Arc<dyn ChatAdapter>,
    clock: Arc<dyn Clock>,
}

impl EscalationEngine {
    pub fn new(store: PolicyStore, adapter: Arc<dyn ChatAdapter>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            adapter,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Enforce `rule` for a message that violated `category`.
    pub async fn enforce(
        &self,
        msg: &InboundMessage,
        category: RuleCategory,
        rule: &CategoryRule,
    ) -> ModerationResult<Enforcement> {
        if rule.deletes_message() {
            if let Err(e) = self.adapter.delete_message(msg.chat_id, msg.message_id).await {
                warn!(
                    "Failed to delete message {} in chat {}: {}",
                    msg.message_id.0, msg.chat_id, e
                );
            }
        }

        let name = &msg.sender_name;
        let duration = rule.duration.duration();

        let outcome = match rule.action {
            RuleAction::Off | RuleAction::Delete => Enforcement::Deleted,
            RuleAction::Mute => {
                let until = self.now() + duration;
                self.restrict(msg.chat_id, msg.user_id, until).await;
                self.notice(
                    msg.chat_id,
                    &format!(
                        "🔇 {} has been muted for {}: {}.",
                        name,
                        format_duration(duration),
                        category.violation_text()
                    ),
                )
                .await;
                Enforcement::Muted { until }
            }
            RuleAction::Ban => {
                let until = self.now() + duration;
                self.ban(msg.chat_id, msg.user_id, until).await;
                self.notice(
                    msg.chat_id,
                    &format!(
                        "🔨 {} has been banned for {}: {}.",
                        name,
                        format_duration(duration),
                        category.violation_text()
                    ),
                )
                .await;
                Enforcement::Banned { until }
            }
            RuleAction::Warn => {
                let threshold = u32::from(rule.warn_threshold);
                let count = self.store.record_warning(msg.chat_id, msg.user_id)?;
                self.notice(
                    msg.chat_id,
                    &format!(
                        "⚠️ {}, {}. Warning {}/{}",
                        name,
                        category.violation_text(),
                        count,
                        threshold
                    ),
                )
                .await;

                if count >= threshold {
                    let until = self.now() + duration;
                    let verb = match rule.post_warn_action {
                        PostWarnAction::Mute => {
                            self.restrict(msg.chat_id, msg.user_id, until).await;
                            "muted"
                        }
                        PostWarnAction::Ban => {
                            self.ban(msg.chat_id, msg.user_id, until).await;
                            "banned"
                        }
                    };
                    self.notice(
                        msg.chat_id,
                        &format!(
                            "{} reached {}/{} warnings and has been {} for {}.",
                            name,
                            count,
                            threshold,
                            verb,
                            format_duration(duration)
                        ),
                    )
                    .await;
                    self.store.reset_warnings(msg.chat_id, msg.user_id)?;
                    Enforcement::Escalated {
                        action: rule.post_warn_action,
                        until,
                    }
                } else {
                    Enforcement::Warned { count, threshold }
                }
            }
        };

        info!(
            "Enforced {} rule on user {} in chat {}: {:?}",
            category, msg.user_id, msg.chat_id, outcome
        );
        Ok(outcome)
    }

    /// Manual `/warn`: fixed limit, then a fixed one-hour ban.
    ///
    /// Shares the warning count with the category `Warn` action.
    pub async fn command_warn(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        name: &str,
        reason: Option<&str>,
    ) -> ModerationResult<Enforcement> {
        let count = self.store.record_warning(chat_id, user_id)?;
        let reason = reason
            .map(|r| format!("\nReason: {r}"))
            .unwrap_or_default();

        if count >= COMMAND_WARN_LIMIT {
            let until = self.now() + command_warn_ban();
            self.ban(chat_id, user_id, until).await;
            self.store.reset_warnings(chat_id, user_id)?;
            self.notice(
                chat_id,
                &format!(
                    "🔨 {} reached {}/{} warnings and has been banned for {}.{}",
                    name,
                    count,
                    COMMAND_WARN_LIMIT,
                    format_duration(command_warn_ban()),
                    reason
                ),
            )
            .await;
            return Ok(Enforcement::Escalated {
                action: PostWarnAction::Ban,
                until,
            });
        }

        self.notice(
            chat_id,
            &format!(
                "⚠️ {} has been warned ({}/{}).{}",
                name, count, COMMAND_WARN_LIMIT, reason
            ),
        )
        .await;
        Ok(Enforcement::Warned {
            count,
            threshold: COMMAND_WARN_LIMIT,
        })
    }

    async fn restrict(&self, chat_id: ChatId, user_id: UserId, until: DateTime<Utc>) {
        if let Err(e) = self.adapter.restrict_user(chat_id, user_id, until).await {
            warn!("Failed to mute user {} in chat {}: {}", user_id, chat_id, e);
        }
    }

    async fn ban(&self, chat_id: ChatId, user_id: UserId, until: DateTime<Utc>) {
        if let Err(e) = self.adapter.ban_user(chat_id, user_id, until).await {
            warn!("Failed to ban user {} in chat {}: {}", user_id, chat_id, e);
        }
    }

    async fn notice(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.adapter.send_notice(chat_id, text).await {
            warn!("Failed to send notice in chat {}: {}", chat_id, e);
        }
    }
}

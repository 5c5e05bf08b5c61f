//! Per-chat moderation policy models.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use teloxide::types::UserId;

use crate::utils::{DurationToken, cycle};

/// Moderation concern a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Link,
    Forward,
    Mention,
    Custom,
}

impl RuleCategory {
    /// Detection priority order; the first matching category wins.
    pub const ALL: [Self; 4] = [Self::Link, Self::Forward, Self::Mention, Self::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Forward => "forward",
            Self::Mention => "mention",
            Self::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "link" | "links" => Some(Self::Link),
            "forward" | "forwards" => Some(Self::Forward),
            "mention" | "mentions" => Some(Self::Mention),
            "custom" | "keyword" | "keywords" => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Link => "🔗 Links",
            Self::Forward => "↩️ Forwards",
            Self::Mention => "🗣 Mentions",
            Self::Custom => "🚫 Custom keywords",
        }
    }

    /// What the offending user is told was not allowed.
    pub fn violation_text(&self) -> &'static str {
        match self {
            Self::Link => "links are not allowed here",
            Self::Forward => "forwarded messages are not allowed here",
            Self::Mention => "mentions are not allowed here",
            Self::Custom => "that message contains a blocked word",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Link => 0,
            Self::Forward => 1,
            Self::Mention => 2,
            Self::Custom => 3,
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enforcement applied when a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    #[default]
    Off,
    Delete,
    Mute,
    Ban,
    Warn,
}

impl RuleAction {
    /// Order walked by the settings menu's action button.
    pub const MENU_CYCLE: [Self; 4] = [Self::Off, Self::Mute, Self::Ban, Self::Warn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Delete => "delete",
            Self::Mute => "mute",
            Self::Ban => "ban",
            Self::Warn => "warn",
        }
    }

    /// `Warn` is the only action that escalates on repetition.
    pub fn escalates(&self) -> bool {
        matches!(self, Self::Warn)
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action fired once the warning threshold is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostWarnAction {
    #[default]
    Mute,
    Ban,
}

impl PostWarnAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mute => "mute",
            Self::Ban => "ban",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Mute => Self::Ban,
            Self::Ban => Self::Mute,
        }
    }
}

/// Rule for one category in one chat.
///
/// Invariant: a disabled rule always has `action == Off`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub enabled: bool,
    pub action: RuleAction,
    pub duration: DurationToken,
    /// Warnings before `post_warn_action` fires, within `1..=3`.
    pub warn_threshold: u8,
    pub post_warn_action: PostWarnAction,
}

impl Default for CategoryRule {
    fn default() -> Self {
        Self {
            enabled: false,
            action: RuleAction::Off,
            duration: DurationToken::OneHour,
            warn_threshold: 1,
            post_warn_action: PostWarnAction::Mute,
        }
    }
}

impl CategoryRule {
    pub const THRESHOLDS: [u8; 3] = [1, 2, 3];

    /// Whether the detector should evaluate this rule at all.
    pub fn is_active(&self) -> bool {
        self.enabled && self.action != RuleAction::Off
    }

    /// Every action other than `Off` removes the offending message.
    pub fn deletes_message(&self) -> bool {
        self.action != RuleAction::Off
    }

    /// Turn the rule on or off.
    ///
    /// Enabling a rule that has no action yet starts it at `Delete`.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled && self.action == RuleAction::Off {
            self.action = RuleAction::Delete;
        }
        self.normalize();
    }

    pub fn toggle_enabled(&mut self) {
        self.set_enabled(!self.enabled);
    }

    /// Advance the action along [`RuleAction::MENU_CYCLE`].
    ///
    /// Picking a real action on a disabled rule enables it.
    pub fn cycle_action(&mut self) {
        self.action = cycle(self.action, &RuleAction::MENU_CYCLE);
        if self.action != RuleAction::Off {
            self.enabled = true;
        }
        self.normalize();
    }

    pub fn cycle_duration(&mut self) {
        self.duration = self.duration.next();
    }

    pub fn cycle_warn_threshold(&mut self) {
        self.warn_threshold = cycle(self.warn_threshold, &Self::THRESHOLDS);
    }

    pub fn toggle_post_warn_action(&mut self) {
        self.post_warn_action = self.post_warn_action.toggled();
    }

    /// Re-establish the rule invariants after any mutation.
    pub fn normalize(&mut self) {
        if !self.enabled {
            self.action = RuleAction::Off;
        }
        self.warn_threshold = self.warn_threshold.clamp(1, 3);
    }
}

/// Kind of chat a policy belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    #[default]
    Group,
    Channel,
}

impl ChatKind {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "channel" => Self::Channel,
            _ => Self::Group,
        }
    }
}

/// Everything the moderation core knows about one chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPolicy {
    pub kind: ChatKind,

    /// One rule per category, indexed in [`RuleCategory::ALL`] order.
    rules: [CategoryRule; 4],

    /// Lower-cased custom keywords.
    #[serde(default)]
    pub keywords: BTreeSet<String>,

    /// Lower-cased domains exempt from the link rule.
    #[serde(default)]
    pub allowed_domains: BTreeSet<String>,

    /// Active warning count per user.
    #[serde(default)]
    pub warnings: HashMap<UserId, u32>,
}

impl ChatPolicy {
    /// Fresh policy: every rule disabled, no keywords, no warnings.
    pub fn new(kind: ChatKind) -> Self {
        Self {
            kind,
            rules: Default::default(),
            keywords: BTreeSet::new(),
            allowed_domains: BTreeSet::new(),
            warnings: HashMap::new(),
        }
    }

    pub fn rule(&self, category: RuleCategory) -> &CategoryRule {
        &self.rules[category.index()]
    }

    pub fn rule_mut(&mut self, category: RuleCategory) -> &mut CategoryRule {
        &mut self.rules[category.index()]
    }

    /// Rules in detection priority order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleCategory, &CategoryRule)> {
        RuleCategory::ALL.into_iter().map(|c| (c, self.rule(c)))
    }

    /// First keyword contained in `text`, compared case-insensitively.
    pub fn matching_keyword(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn warning_count(&self, user_id: UserId) -> u32 {
        self.warnings.get(&user_id).copied().unwrap_or(0)
    }
}

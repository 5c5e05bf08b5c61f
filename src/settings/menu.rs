//! Settings menus as platform-neutral views.

use teloxide::types::ChatId;

use super::action::MenuAction;
use crate::policy::{CategoryRule, ChatKind, ChatPolicy, RuleAction, RuleCategory};
use crate::utils::html_escape;

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuButton {
    pub label: String,
    pub action: MenuAction,
}

impl MenuButton {
    pub fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Text plus rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuView {
    pub text: String,
    pub rows: Vec<Vec<MenuButton>>,
}

impl MenuView {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: Vec::new(),
        }
    }

    /// Every button, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &MenuButton> {
        self.rows.iter().flatten()
    }
}

fn status_icon(rule: &CategoryRule) -> &'static str {
    if rule.is_active() { "✅" } else { "❌" }
}

/// Top-level menu: one button per category.
pub fn root_menu(chat_id: ChatId, policy: &ChatPolicy) -> MenuView {
    let mut rows: Vec<Vec<MenuButton>> = policy
        .rules()
        .map(|(category, rule)| {
            vec![MenuButton::new(
                format!("{} {}", status_icon(rule), category.label()),
                MenuAction::Category(chat_id, category),
            )]
        })
        .collect();
    rows.push(vec![MenuButton::new("✖️ Close", MenuAction::Close(chat_id))]);

    MenuView {
        text: "⚙️ <b>Moderation settings</b>\n\nPick a rule to configure.".to_string(),
        rows,
    }
}

/// Menu for one category's rule.
pub fn category_menu(chat_id: ChatId, category: RuleCategory, policy: &ChatPolicy) -> MenuView {
    let rule = policy.rule(category);
    let mut text = format!(
        "{}\n\nEnabled: {}\nAction: {}\nDuration: {}",
        category.label(),
        if rule.enabled { "yes" } else { "no" },
        rule.action,
        rule.duration
    );
    if rule.action == RuleAction::Warn {
        text.push_str(&format!(
            "\nWarn limit: {}\nAfter warnings: {}",
            rule.warn_threshold,
            rule.post_warn_action.as_str()
        ));
    }

    let mut rows = vec![
        vec![
            MenuButton::new(
                format!("Enabled: {}", if rule.enabled { "✅" } else { "❌" }),
                MenuAction::ToggleEnabled(chat_id, category),
            ),
            MenuButton::new(
                format!("Action: {}", rule.action),
                MenuAction::CycleAction(chat_id, category),
            ),
        ],
        vec![MenuButton::new(
            format!("Duration: {}", rule.duration),
            MenuAction::CycleDuration(chat_id, category),
        )],
        vec![
            MenuButton::new(
                format!("Warn limit: {}", rule.warn_threshold),
                MenuAction::CycleThreshold(chat_id, category),
            ),
            MenuButton::new(
                format!("After warnings: {}", rule.post_warn_action.as_str()),
                MenuAction::TogglePostWarn(chat_id, category),
            ),
        ],
    ];

    if category == RuleCategory::Custom {
        text.push_str(&format!("\n\n{}", keyword_list(policy)));
        rows.push(vec![
            MenuButton::new("➕ Add keywords", MenuAction::AddKeywords(chat_id)),
            MenuButton::new("🗑 Clear keywords", MenuAction::ClearKeywords(chat_id)),
        ]);
    }

    rows.push(vec![MenuButton::new("⬅️ Back", MenuAction::Root(chat_id))]);
    MenuView { text, rows }
}

/// Prompt shown while waiting for keywords.
pub fn keyword_prompt(chat_id: ChatId) -> MenuView {
    MenuView {
        text: "✍️ Send the keywords to block, separated by spaces.".to_string(),
        rows: vec![vec![MenuButton::new(
            "⬅️ Cancel",
            MenuAction::Category(chat_id, RuleCategory::Custom),
        )]],
    }
}

/// Groups or channels a user can open settings for.
///
/// Ends with a button switching to the other list.
pub fn chats_menu(kind: ChatKind, chats: &[(ChatId, String)]) -> MenuView {
    let (heading, empty, switch) = match kind {
        ChatKind::Group => (
            "👥 <b>My Groups</b>\n\nPick a group to configure.",
            "You have no groups yet. Add me to a group and use /settings there.",
            MenuButton::new("📢 My Channels", MenuAction::MyChannels),
        ),
        ChatKind::Channel => (
            "📢 <b>My Channels</b>\n\nPick a channel to configure.",
            "You have no channels yet. Add me to a channel as an admin.",
            MenuButton::new("👥 My Groups", MenuAction::MyGroups),
        ),
    };

    let mut rows: Vec<Vec<MenuButton>> = chats
        .iter()
        .map(|(chat, title)| vec![MenuButton::new(title.clone(), MenuAction::Root(*chat))])
        .collect();
    rows.push(vec![switch]);

    MenuView {
        text: if chats.is_empty() { empty } else { heading }.to_string(),
        rows,
    }
}

/// Human-readable keyword list.
pub fn keyword_list(policy: &ChatPolicy) -> String {
    if policy.keywords.is_empty() {
        return "No custom keywords.".to_string();
    }
    let words: Vec<String> = policy.keywords.iter().map(|k| html_escape(k)).collect();
    format!("Keywords: {}", words.join(", "))
}

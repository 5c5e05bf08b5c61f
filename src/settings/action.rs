//! Typed settings actions and their callback-data encoding.
//!
//! Format: `cfg:<verb>[:<category>]:<chat id>`, or `cfg:groups` and
//! `cfg:channels` for the chat directory. Everything else decodes to `None`.

use teloxide::types::ChatId;

use crate::policy::RuleCategory;

const PREFIX: &str = "cfg";

/// A settings menu button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Root(ChatId),
    Category(ChatId, RuleCategory),
    ToggleEnabled(ChatId, RuleCategory),
    CycleAction(ChatId, RuleCategory),
    CycleDuration(ChatId, RuleCategory),
    CycleThreshold(ChatId, RuleCategory),
    TogglePostWarn(ChatId, RuleCategory),
    AddKeywords(ChatId),
    ClearKeywords(ChatId),
    Close(ChatId),
    /// List the groups the user can manage.
    MyGroups,
    /// List the channels the user can manage.
    MyChannels,
}

impl MenuAction {
    pub fn chat_id(&self) -> Option<ChatId> {
        match *self {
            Self::Root(chat)
            | Self::Category(chat, _)
            | Self::ToggleEnabled(chat, _)
            | Self::CycleAction(chat, _)
            | Self::CycleDuration(chat, _)
            | Self::CycleThreshold(chat, _)
            | Self::TogglePostWarn(chat, _)
            | Self::AddKeywords(chat)
            | Self::ClearKeywords(chat)
            | Self::Close(chat) => Some(chat),
            Self::MyGroups | Self::MyChannels => None,
        }
    }

    /// Callback data for this action.
    pub fn encode(&self) -> String {
        match *self {
            Self::Root(chat) => format!("{PREFIX}:root:{}", chat.0),
            Self::Category(chat, cat) => format!("{PREFIX}:cat:{}:{}", cat, chat.0),
            Self::ToggleEnabled(chat, cat) => format!("{PREFIX}:enabled:{}:{}", cat, chat.0),
            Self::CycleAction(chat, cat) => format!("{PREFIX}:action:{}:{}", cat, chat.0),
            Self::CycleDuration(chat, cat) => format!("{PREFIX}:duration:{}:{}", cat, chat.0),
            Self::CycleThreshold(chat, cat) => format!("{PREFIX}:limit:{}:{}", cat, chat.0),
            Self::TogglePostWarn(chat, cat) => format!("{PREFIX}:after:{}:{}", cat, chat.0),
            Self::AddKeywords(chat) => format!("{PREFIX}:kwadd:{}", chat.0),
            Self::ClearKeywords(chat) => format!("{PREFIX}:kwclear:{}", chat.0),
            Self::Close(chat) => format!("{PREFIX}:close:{}", chat.0),
            Self::MyGroups => format!("{PREFIX}:groups"),
            Self::MyChannels => format!("{PREFIX}:channels"),
        }
    }

    /// Parse callback data. Unknown or malformed data yields `None`.
    pub fn decode(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split(':').collect();

        match parts.as_slice() {
            [PREFIX, "groups"] => Some(Self::MyGroups),
            [PREFIX, "channels"] => Some(Self::MyChannels),
            [PREFIX, verb, chat] => {
                let chat = parse_chat(chat)?;
                match *verb {
                    "root" => Some(Self::Root(chat)),
                    "kwadd" => Some(Self::AddKeywords(chat)),
                    "kwclear" => Some(Self::ClearKeywords(chat)),
                    "close" => Some(Self::Close(chat)),
                    _ => None,
                }
            }
            [PREFIX, verb, category, chat] => {
                let chat = parse_chat(chat)?;
                let category = RuleCategory::from_str(category)?;
                match *verb {
                    "cat" => Some(Self::Category(chat, category)),
                    "enabled" => Some(Self::ToggleEnabled(chat, category)),
                    "action" => Some(Self::CycleAction(chat, category)),
                    "duration" => Some(Self::CycleDuration(chat, category)),
                    "limit" => Some(Self::CycleThreshold(chat, category)),
                    "after" => Some(Self::TogglePostWarn(chat, category)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Whether the callback data belongs to the settings menu at all.
    pub fn is_settings_data(data: &str) -> bool {
        data.split(':').next() == Some(PREFIX)
    }
}

fn parse_chat(raw: &str) -> Option<ChatId> {
    raw.parse::<i64>().ok().map(ChatId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let chat = ChatId(-1001234567890);
        let actions = [
            MenuAction::Root(chat),
            MenuAction::Category(chat, RuleCategory::Mention),
            MenuAction::CycleThreshold(chat, RuleCategory::Custom),
            MenuAction::TogglePostWarn(chat, RuleCategory::Link),
            MenuAction::ClearKeywords(chat),
            MenuAction::MyGroups,
            MenuAction::MyChannels,
        ];
        for action in actions {
            let data = action.encode();
            assert!(data.len() <= 64, "{data} exceeds the callback data limit");
            assert_eq!(MenuAction::decode(&data), Some(action));
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(MenuAction::decode(""), None);
        assert_eq!(MenuAction::decode("cfg"), None);
        assert_eq!(MenuAction::decode("cfg:explode:-100"), None);
        assert_eq!(MenuAction::decode("cfg:root:notanumber"), None);
        assert_eq!(MenuAction::decode("cfg:action:stickers:-100"), None);
        assert_eq!(MenuAction::decode("help:root:-100"), None);
    }

    #[test]
    fn test_settings_prefix() {
        assert!(MenuAction::is_settings_data("cfg:whatever"));
        assert!(!MenuAction::is_settings_data("help:main"));
    }
}

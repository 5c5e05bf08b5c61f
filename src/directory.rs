//! Which chats each admin has registered with the bot.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use teloxide::types::{ChatId, UserId};
use tracing::debug;

use crate::policy::ChatKind;

#[derive(Debug, Clone)]
struct DirectoryEntry {
    title: String,
    kind: ChatKind,
}

/// Chats per user, shown in the private "My Groups" and "My Channels" lists.
#[derive(Clone, Default)]
pub struct ChatDirectory {
    chats: Arc<DashMap<UserId, BTreeMap<i64, DirectoryEntry>>>,
}

impl ChatDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember that `user` manages `chat_id`. Updates the title if known.
    pub fn register(&self, user: UserId, chat_id: ChatId, title: &str, kind: ChatKind) {
        self.chats.entry(user).or_default().insert(
            chat_id.0,
            DirectoryEntry {
                title: title.to_string(),
                kind,
            },
        );
        debug!("Registered {:?} {} for user {}", kind, chat_id, user);
    }

    /// `(chat, title)` pairs of one kind, ordered by chat id.
    pub fn chats_for(&self, user: UserId, kind: ChatKind) -> Vec<(ChatId, String)> {
        self.chats
            .get(&user)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|(_, chat)| chat.kind == kind)
                    .map(|(id, chat)| (ChatId(*id), chat.title.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop a chat from every user's list.
    pub fn forget_chat(&self, chat_id: ChatId) {
        for mut entry in self.chats.iter_mut() {
            entry.value_mut().remove(&chat_id.0);
        }
        self.chats.retain(|_, chats| !chats.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_forget() {
        let directory = ChatDirectory::new();
        directory.register(UserId(1), ChatId(-2), "Second", ChatKind::Group);
        directory.register(UserId(1), ChatId(-1), "First", ChatKind::Group);
        directory.register(UserId(2), ChatId(-1), "First", ChatKind::Group);
        directory.register(UserId(1), ChatId(-1), "First (renamed)", ChatKind::Group);

        assert_eq!(
            directory.chats_for(UserId(1), ChatKind::Group),
            vec![
                (ChatId(-2), "Second".to_string()),
                (ChatId(-1), "First (renamed)".to_string())
            ]
        );

        directory.forget_chat(ChatId(-1));
        assert_eq!(directory.chats_for(UserId(1), ChatKind::Group).len(), 1);
        assert!(directory.chats_for(UserId(2), ChatKind::Group).is_empty());
    }

    #[test]
    fn test_groups_and_channels_are_listed_apart() {
        let directory = ChatDirectory::new();
        directory.register(UserId(1), ChatId(-10), "Chat", ChatKind::Group);
        directory.register(UserId(1), ChatId(-20), "News", ChatKind::Channel);

        assert_eq!(
            directory.chats_for(UserId(1), ChatKind::Group),
            vec![(ChatId(-10), "Chat".to_string())]
        );
        assert_eq!(
            directory.chats_for(UserId(1), ChatKind::Channel),
            vec![(ChatId(-20), "News".to_string())]
        );
    }
}

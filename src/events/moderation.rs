//! Inbound message moderation.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::MessageEntityKind;
use tracing::{debug, error};

use crate::bot::dispatcher::AppState;
use aegis::moderation::{EntityKind, InboundMessage};
use aegis::utils::display_name;

/// Normalize a Telegram message for the detector.
///
/// Returns `None` for messages without a sender (service messages).
pub fn inbound_message(msg: &Message) -> Option<InboundMessage> {
    let user = msg.from.as_ref()?;

    let text = msg.text().or_else(|| msg.caption()).unwrap_or_default();
    let entities = msg
        .parse_entities()
        .or_else(|| msg.parse_caption_entities())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entity| match entity.kind() {
            MessageEntityKind::Mention => Some(EntityKind::Mention),
            MessageEntityKind::TextMention { .. } => Some(EntityKind::TextMention),
            MessageEntityKind::Url => Some(EntityKind::Url(entity.text().to_string())),
            MessageEntityKind::TextLink { url } => Some(EntityKind::TextLink(url.to_string())),
            _ => None,
        })
        .collect();

    // Anonymous admins post as the chat itself; linked channel posts are
    // auto-forwarded into the discussion group.
    let posted_as_chat = msg
        .sender_chat
        .as_ref()
        .is_some_and(|chat| chat.id == msg.chat.id);
    let is_admin_hint = posted_as_chat || msg.is_automatic_forward();

    Some(InboundMessage {
        chat_id: msg.chat.id,
        message_id: msg.id,
        user_id: user.id,
        sender_name: display_name(Some(&user.first_name), user.id.0),
        text: text.to_string(),
        is_forwarded: msg.forward_origin().is_some(),
        entities,
        is_admin_hint,
    })
}

/// Returns the handler that moderates group messages.
///
/// It claims the update only when a violation was enforced, so that neither
/// commands nor pending settings input see the message.
pub fn handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter_async(was_enforced).endpoint(enforced)
}

async fn enforced() -> anyhow::Result<()> {
    Ok(())
}

async fn was_enforced(msg: Message, state: AppState) -> bool {
    if !(msg.chat.is_group() || msg.chat.is_supergroup()) {
        return false;
    }
    let Some(inbound) = inbound_message(&msg) else {
        return false;
    };

    match state.moderator.on_message(&inbound).await {
        Ok(Some(outcome)) => {
            debug!(
                "Message {} in chat {} handled: {:?}",
                inbound.message_id.0, inbound.chat_id, outcome
            );
            true
        }
        Ok(None) => false,
        Err(e) => {
            error!("Moderation error in chat {}: {}", inbound.chat_id, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis::moderation::Detector;
    use aegis::policy::{ChatKind, ChatPolicy, RuleAction, RuleCategory};

    fn group_message(text: &str, entities: serde_json::Value) -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 0,
            "chat": { "id": -1001, "type": "supergroup", "title": "Test" },
            "from": { "id": 42, "is_bot": false, "first_name": "Mallory" },
            "text": text,
            "entities": entities,
        }))
        .unwrap()
    }

    #[test]
    fn test_command_text_is_kept_for_detection() {
        let msg = group_message(
            "/help https://evil.example",
            serde_json::json!([
                { "type": "bot_command", "offset": 0, "length": 5 },
                { "type": "url", "offset": 6, "length": 20 }
            ]),
        );

        let inbound = inbound_message(&msg).unwrap();
        assert_eq!(inbound.text, "/help https://evil.example");
        assert_eq!(inbound.user_id, UserId(42));
        assert_eq!(
            inbound.entities,
            vec![EntityKind::Url("https://evil.example".to_string())]
        );
        assert!(!inbound.is_admin_hint);

        let mut policy = ChatPolicy::new(ChatKind::Group);
        let rule = policy.rule_mut(RuleCategory::Link);
        rule.set_enabled(true);
        rule.action = RuleAction::Ban;
        assert_eq!(
            Detector::default().detect(&policy, &inbound),
            Some(RuleCategory::Link)
        );
    }

    #[test]
    fn test_mentions_are_normalized() {
        let msg = group_message(
            "hi @someone",
            serde_json::json!([{ "type": "mention", "offset": 3, "length": 8 }]),
        );

        let inbound = inbound_message(&msg).unwrap();
        assert!(inbound.has_mention());
        assert_eq!(inbound.sender_name, "Mallory");
    }
}

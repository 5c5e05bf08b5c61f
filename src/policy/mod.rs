//! Policy store: per-chat rules, custom keywords, allowed domains and
//! warning counters.
//!
//! State lives in memory for the process lifetime. Chats are created lazily
//! through [`PolicyStore::ensure_chat`]; every other operation on an unknown
//! chat fails with [`ModerationError::UnknownChat`](crate::error::ModerationError).

mod model;
mod store;

pub use model::{
    CategoryRule, ChatKind, ChatPolicy, PostWarnAction, RuleAction, RuleCategory,
};
pub use store::{PolicyStore, normalize_domain};

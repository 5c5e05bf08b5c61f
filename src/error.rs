//! Error types for the moderation core.

use teloxide::types::ChatId;
use thiserror::Error;

/// Errors raised inside the moderation core.
///
/// None of these ever escape message processing: detection and escalation
/// log and swallow them, the settings protocol turns them into a terse alert.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// A rule was requested for a chat that was never initialized.
    #[error("Unknown chat: {0}")]
    UnknownChat(ChatId),

    /// An outbound chat platform call failed.
    #[error("Adapter call failed: {0}")]
    Adapter(String),

    /// Malformed input from an admin (callback payload, command argument).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<teloxide::RequestError> for ModerationError {
    fn from(error: teloxide::RequestError) -> Self {
        Self::Adapter(error.to_string())
    }
}

/// Result type for moderation operations.
pub type ModerationResult<T> = Result<T, ModerationError>;

//! Utility functions.
//!
//! Collection of helpers shared by the moderation core and the bot layer.

pub mod duration;

pub use duration::{DurationToken, cycle, default_duration, format_duration, parse_duration};

/// Display name for a user in notices.
///
/// Falls back to the numeric id when the adapter knows no name.
pub fn display_name(first_name: Option<&str>, user_id: u64) -> String {
    match first_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => format!("User {user_id}"),
    }
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

//! Bot module - Telegram side of the moderation core.

pub mod adapter;
pub mod dispatcher;
mod runtime;
pub mod webhook;

pub use dispatcher::build_dispatcher;
pub use runtime::run;

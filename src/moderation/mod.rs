//! Violation detection and enforcement.

mod adapter;
mod clock;
mod detector;
mod escalation;

pub use adapter::{ChatAdapter, ChatResponder, Responder};
pub use clock::{Clock, SystemClock};
pub use detector::{
    DEFAULT_SHORT_LINK_DOMAINS, Detector, EntityKind, InboundMessage, LinkMatcher,
};
pub use escalation::{COMMAND_WARN_LIMIT, Enforcement, EscalationEngine, command_warn_ban};

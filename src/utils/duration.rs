//! Duration tokens used by rules and moderation commands.
//!
//! Parsing is lenient: anything unrecognized becomes the one hour default,
//! callers never see an error from here.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Fallback for empty or unrecognized input: one hour.
pub fn default_duration() -> Duration {
    Duration::hours(1)
}

/// Fixed set of durations offered by the settings menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DurationToken {
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "7d")]
    SevenDays,
}

impl DurationToken {
    /// Menu order; tapping the duration button walks this list.
    pub const ALL: [Self; 6] = [
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::SixHours,
        Self::OneDay,
        Self::ThreeDays,
        Self::SevenDays,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::OneDay => "1d",
            Self::ThreeDays => "3d",
            Self::SevenDays => "7d",
        }
    }

    /// Match a canonical token exactly (`"30m"`, `"1h"`, ...).
    pub fn from_token(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s.trim())
    }

    pub fn duration(&self) -> Duration {
        parse_duration(self.as_str())
    }

    /// Next token in menu order, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        cycle(self, &Self::ALL)
    }
}

impl fmt::Display for DurationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a duration like `"30m"`, `"6h"`, `"3d"`, `"2 hours"` or `"45 min"`.
///
/// Unit letters `m`, `h`, `d` and their word forms are accepted in any case.
/// Empty, zero, overflowing or unrecognized input yields [`default_duration`].
pub fn parse_duration(input: &str) -> Duration {
    parse_amount(input).unwrap_or_else(default_duration)
}

fn parse_amount(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();
    let split = input.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = input.split_at(split);
    let amount: i64 = digits.parse().ok()?;
    if amount == 0 {
        return None;
    }

    let unit_secs = match unit.trim() {
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600,
        "d" | "day" | "days" => 86_400,
        _ => return None,
    };

    Duration::try_seconds(amount.checked_mul(unit_secs)?)
}

/// Render a duration using only its largest non-zero unit.
pub fn format_duration(duration: Duration) -> String {
    let days = duration.num_days();
    if days > 0 {
        return plural(days, "day");
    }
    let hours = duration.num_hours();
    if hours > 0 {
        return plural(hours, "hour");
    }
    let minutes = duration.num_minutes();
    if minutes > 0 {
        return plural(minutes, "minute");
    }
    "a few seconds".to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Value following `current` in `ordered`, wrapping to the first entry.
///
/// A value missing from the list also restarts at the first entry.
pub fn cycle<T: Copy + PartialEq>(current: T, ordered: &[T]) -> T {
    match ordered.iter().position(|v| *v == current) {
        Some(idx) => ordered[(idx + 1) % ordered.len()],
        None => ordered.first().copied().unwrap_or(current),
    }
}

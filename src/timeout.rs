//! Eviction policy — how long a pool entry stays eligible.
//!
//! The host application stores the timeout as a combo-box label
//! ("5 minutes", "1 hour", ...). Anything unrecognized means "never",
//! which is also the safe default.

use chrono::{DateTime, Duration, Utc};

/// Configured entry timeout, parsed from the settings combo selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutSetting {
    #[default]
    Never,
    Minutes5,
    Minutes10,
    Minutes15,
    Minutes30,
    Hours1,
    Hours2,
    Hours4,
}

impl TimeoutSetting {
    /// Parse a combo-box label. Case-insensitive; unknown labels are `Never`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "5 minutes" => Self::Minutes5,
            "10 minutes" => Self::Minutes10,
            "15 minutes" => Self::Minutes15,
            "30 minutes" => Self::Minutes30,
            "1 hour" => Self::Hours1,
            "2 hours" => Self::Hours2,
            "4 hours" => Self::Hours4,
            _ => Self::Never,
        }
    }

    /// The eligibility window, or `None` for `Never`.
    pub fn window(self) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::Minutes5 => Some(Duration::minutes(5)),
            Self::Minutes10 => Some(Duration::minutes(10)),
            Self::Minutes15 => Some(Duration::minutes(15)),
            Self::Minutes30 => Some(Duration::minutes(30)),
            Self::Hours1 => Some(Duration::hours(1)),
            Self::Hours2 => Some(Duration::hours(2)),
            Self::Hours4 => Some(Duration::hours(4)),
        }
    }

    /// Has an entry admitted at `entered_at` outlived its window at `now`?
    /// `Never` never expires. The boundary instant itself is still eligible.
    pub fn has_expired(self, entered_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.window() {
            None => false,
            Some(window) => entered_at + window < now,
        }
    }
}

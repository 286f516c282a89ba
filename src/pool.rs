//! Entry pool — the shared mapping of chatters eligible for selection.
//!
//! The pool itself is a plain container; the session controller owns the
//! one instance and serializes access through a `tokio::sync::Mutex`, so
//! admission (message handlers) and draws (the host's `next()` trigger)
//! never race.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::timeout::TimeoutSetting;

/// RGB display color decoded from a chat service hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Fallback when a chatter has no color set or the pool is empty.
    pub const DEFAULT: Color = Color {
        r: 0x8c,
        g: 0xb4,
        b: 0xff,
    };

    /// Decode `#RRGGBB` (leading `#` optional). Anything else is `None`.
    pub fn from_hex(hex: &str) -> Option<Color> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color { r, g, b })
    }
}

/// One chatter admitted into the pool. Never mutated after admission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entrant {
    /// Username exactly as received from chat.
    pub name: String,
    pub color: Color,
    /// When the entrant was admitted — only the eviction check reads this.
    pub entered_at: DateTime<Utc>,
}

/// Pool of current entrants, keyed by username exactly as received.
///
/// The duplicate check here is case-SENSITIVE, unlike the blacklist and
/// self-identity checks. That asymmetry is inherited behavior and kept
/// deliberately; `admit_differs_from_blacklist_on_case` documents it.
#[derive(Debug, Default)]
pub struct EntryPool {
    entries: HashMap<String, Entrant>,
}

impl EntryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit an entrant unless their exact username is already a key.
    /// Returns whether the entrant was inserted.
    pub fn try_admit(&mut self, entrant: Entrant) -> bool {
        if self.entries.contains_key(&entrant.name) {
            return false;
        }
        self.entries.insert(entrant.name.clone(), entrant);
        true
    }

    /// Exact-key membership check (case-sensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Draw one entrant at random, removing it from the pool.
    ///
    /// Expired entries found along the way are removed and the draw retries;
    /// each retry strictly shrinks the pool, so the loop always terminates.
    /// An empty pool yields a synthesized default entrant and stays empty.
    pub fn draw(&mut self, timeout: TimeoutSetting, default_name: &str) -> Entrant {
        let mut rng = rand::thread_rng();
        loop {
            if self.entries.is_empty() {
                return Entrant {
                    name: default_name.to_owned(),
                    color: Color::DEFAULT,
                    entered_at: Utc::now(),
                };
            }

            let key = {
                let keys: Vec<&String> = self.entries.keys().collect();
                keys[rng.gen_range(0..keys.len())].clone()
            };
            let Some(entry) = self.entries.remove(&key) else {
                continue;
            };

            if timeout.has_expired(entry.entered_at, Utc::now()) {
                debug!(name = %key, "entry timed out, removed from the pool");
                continue;
            }

            debug!(name = %key, "randomly chose entry");
            return entry;
        }
    }

    /// Drop every entry. Called when a new session begins.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Cloned snapshot of the current entries for the host application.
    pub fn entries(&self) -> HashMap<String, Entrant> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

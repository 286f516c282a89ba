//! Persistent settings collaborator.
//!
//! The host application owns the actual storage (and the widgets the keys
//! refer to); the registry only reads toggles and mirrors blacklist
//! mutations back through it.

use std::collections::HashMap;

/// Keys under which the host application stores our settings.
pub mod keys {
    /// Persisted blacklist entries (name → empty marker value).
    pub const BLACKLIST: &str = "sharkpoolBlacklist";
    /// Checkbox: only admit subscribers and moderators.
    pub const SUB_ONLY: &str = "sharkpoolSubOnly";
    /// Checkbox: announce pool changes in the chat channel.
    pub const ANNOUNCE_CHAT: &str = "sharkpoolAnnounceChat";
    /// Checkbox: announce pool changes in the host game's chat.
    pub const ANNOUNCE_GAME: &str = "sharkpoolAnnounceGame";
    /// Checkbox: extra-verbose lifecycle logging.
    pub const DEBUG: &str = "sharkpoolDebug";
    /// Combo: entry timeout ("never", "5 minutes", ..., "4 hours").
    pub const ENTRY_TIMEOUT: &str = "sharkpoolTimeout";
    /// Text input: fallback name used when the pool is empty.
    pub const DEFAULT_NAME: &str = "sharkpoolDefaultName";
}

/// Read/write access to the host application's settings storage.
///
/// Reads happen on every decision (checkboxes are live toggles, not cached);
/// writes happen only for blacklist mutations.
pub trait SettingsStore: Send + Sync {
    fn checkbox(&self, key: &str) -> bool;
    /// All stored entry names under a data key.
    fn names_list(&self, key: &str) -> Vec<String>;
    /// Write a single `name → value` entry under a data key.
    fn set_value(&self, key: &str, name: &str, value: &str);
    /// Replace every entry under a data key with the given mapping.
    fn set_all_values(&self, key: &str, values: HashMap<String, String>);
    fn combo_selection(&self, key: &str) -> String;
    fn text_input(&self, key: &str) -> String;
}

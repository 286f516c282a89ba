//! Moderator-managed blacklist, mirrored to the persistent settings store.
//!
//! Names are stored lowercased; membership checks fold case. Every
//! successful mutation is written through before the call returns, so the
//! persisted set and the in-memory set never disagree. Additions write a
//! single `name → ""` marker; removals rewrite the full remaining set —
//! the two mutation shapes the settings store's API offers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::settings::{keys, SettingsStore};

pub struct Blacklist {
    names: HashSet<String>,
    settings: Arc<dyn SettingsStore>,
}

impl Blacklist {
    /// Seed the in-memory set from the persisted entries.
    pub fn load(settings: Arc<dyn SettingsStore>) -> Self {
        let names = Self::persisted_names(&*settings);
        Blacklist { names, settings }
    }

    /// Re-read the persisted entries, discarding the in-memory set.
    /// Called at the start of every session.
    pub fn reload(&mut self) {
        self.names = Self::persisted_names(&*self.settings);
    }

    fn persisted_names(settings: &dyn SettingsStore) -> HashSet<String> {
        settings
            .names_list(keys::BLACKLIST)
            .into_iter()
            .map(|name| name.to_lowercase())
            .collect()
    }

    /// Case-insensitive membership check.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// Blacklist a name. Returns `false` (and changes nothing, persists
    /// nothing) when the name is already present.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.to_lowercase();
        if !self.names.insert(name.clone()) {
            return false;
        }
        self.settings.set_value(keys::BLACKLIST, &name, "");
        true
    }

    /// Un-blacklist a name. Returns `false` when the name was not present;
    /// otherwise rewrites the complete remaining set to the store.
    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.to_lowercase();
        if !self.names.remove(&name) {
            return false;
        }
        let persisted: HashMap<String, String> = self
            .names
            .iter()
            .map(|n| (n.clone(), String::new()))
            .collect();
        self.settings.set_all_values(keys::BLACKLIST, persisted);
        true
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

//! Name normalization and the persisted alias table ("merge memory")
//!
//! An alias maps the normalized form of a retired name to the canonical name
//! it was merged into. Resolution is one hop only: if `A → B` and `B → C`
//! both exist, `A` still resolves to `B`.

use crate::storage::SnapshotStore;
use crate::Result;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

/// Persisted shape of the alias table
pub type AliasMap = BTreeMap<String, String>;

/// Canonical comparison key: trimmed and case-folded
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Owner of the alias table
pub struct IdentityResolver {
    aliases: AliasMap,
    store: Box<dyn SnapshotStore<AliasMap>>,
}

impl IdentityResolver {
    /// Load the alias table; an unreadable snapshot starts empty
    pub fn load(store: Box<dyn SnapshotStore<AliasMap>>) -> Self {
        let aliases = match store.load() {
            Ok(aliases) => aliases.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load merge memory, starting empty: {}", e);
                AliasMap::new()
            }
        };
        debug!("Loaded {} aliases", aliases.len());
        Self { aliases, store }
    }

    /// Merged name recorded for `raw_name`, if any (one hop)
    pub fn resolve_alias(&self, raw_name: &str) -> Option<&str> {
        self.aliases.get(&normalize(raw_name)).map(String::as_str)
    }

    /// `raw_name` with its alias applied, or `raw_name` itself
    pub fn resolve_or_self<'a>(&'a self, raw_name: &'a str) -> &'a str {
        self.resolve_alias(raw_name).unwrap_or(raw_name)
    }

    /// Idempotent upsert of `old_name → new_name`
    pub fn record_alias(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let key = normalize(old_name);
        if key.is_empty() || new_name.trim().is_empty() {
            return Err(crate::Error::InvalidInput("alias names must not be empty".to_string()));
        }
        let previous = self.aliases.insert(key.clone(), new_name.trim().to_string());
        if previous.as_deref() != Some(new_name.trim()) {
            debug!("Alias recorded: {} → {}", key, new_name.trim());
            self.persist();
        }
        Ok(())
    }

    /// Forget every alias
    pub fn clear_aliases(&mut self) {
        self.aliases.clear();
        self.persist();
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    fn persist(&self) {
        if let Err(e) = self.store.save_all(&self.aliases) {
            error!("Failed to save merge memory: {}", e);
        }
    }
}

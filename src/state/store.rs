use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Branch;

/// Persisted branch selections, keyed by a team/repository identifier so each
/// board remembers its own BranchView selection across sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionStore {
    #[serde(default)]
    selections: HashMap<String, Vec<String>>,
}

fn store_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("branchview").join("selections.json"))
}

impl SelectionStore {
    /// Load the store, falling back to an empty one on any failure; a missing
    /// or corrupt file is not worth surfacing to the user.
    pub fn load() -> Self {
        if let Some(path) = store_path() {
            if let Ok(content) = std::fs::read_to_string(&path) {
                if let Ok(store) = serde_json::from_str(&content) {
                    return store;
                }
                debug!(?path, "selection store unreadable, starting empty");
            }
        }
        Self::default()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(path) = store_path() {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        }
        Ok(())
    }

    /// Stored selection for `key`, validated against the live branch list.
    /// Stale branch names (deleted or renamed since last session) are dropped
    /// silently; order is preserved so row assignment stays stable.
    pub fn selected_for(&self, key: &str, live: &[Branch]) -> Vec<String> {
        let Some(stored) = self.selections.get(key) else {
            return Vec::new();
        };
        stored
            .iter()
            .filter(|name| live.iter().any(|b| &b.name == *name))
            .cloned()
            .collect()
    }

    pub fn remember(&mut self, key: &str, branches: &[String]) {
        self.selections.insert(key.to_string(), branches.to_vec());
    }
}

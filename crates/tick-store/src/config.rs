//! Store configuration
//!
//! Usually embedded in a host's own TOML configuration as a `[store]` table.

use serde::{Deserialize, Serialize};

/// Tunables for a [`Store`](crate::Store)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Label used in the store's log lines
    #[serde(default = "default_name")]
    pub name: String,

    /// How many recently reduced actions are kept for error reports
    #[serde(default = "default_action_log_length")]
    pub action_log_length: usize,
}

fn default_name() -> String {
    "store".to_string()
}

fn default_action_log_length() -> usize {
    3
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            action_log_length: default_action_log_length(),
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

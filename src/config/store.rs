//! Settings store location.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the panel database.
pub const DEFAULT_STORE_PATH: &str = "/etc/x-ui/x-ui.db";

/// Settings store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the SQLite database file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

//! Settings store - persistent panel configuration and administrative data.
//!
//! The store is a single SQLite database holding panel settings, login users
//! and inbounds. It is opened once per process and shared by whichever
//! operating mode is active.

mod inbounds;
mod settings;
mod users;

pub use inbounds::{ImportCounts, NewInbound};
pub use settings::{PanelSettings, DEFAULT_BASE_PATH, DEFAULT_LISTEN, DEFAULT_PORT};
pub use users::{User, DEFAULT_PASSWORD, DEFAULT_USERNAME};

use crate::error::{PanelError, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inbounds (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER NOT NULL,
    remark          TEXT    NOT NULL DEFAULT '',
    enable          INTEGER NOT NULL DEFAULT 1,
    listen          TEXT    NOT NULL DEFAULT '',
    port            INTEGER NOT NULL UNIQUE,
    protocol        TEXT    NOT NULL,
    settings        TEXT    NOT NULL DEFAULT '',
    stream_settings TEXT    NOT NULL DEFAULT '',
    tag             TEXT    NOT NULL UNIQUE,
    sniffing        TEXT    NOT NULL DEFAULT '',
    up              INTEGER NOT NULL DEFAULT 0,
    down            INTEGER NOT NULL DEFAULT 0,
    expiry_time     INTEGER NOT NULL DEFAULT 0
);
"#;

/// SQLite-backed settings store.
///
/// All access goes through an internal mutex so the store can be shared as
/// `Arc<SettingsStore>` between the supervisor and the panel server.
pub struct SettingsStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Opens (creating if needed) the store at `path`.
    ///
    /// Creates missing parent directories, applies the schema and seeds the
    /// default login user when no user exists yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PanelError::store_with_source(
                    format!("Failed to create store directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            PanelError::store_with_source(
                format!("Failed to open store '{}'", path.display()),
                e,
            )
        })?;

        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.initialize()?;

        info!(path = %path.display(), "Settings store opened");
        Ok(store)
    }

    /// Opens an ephemeral in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path, or `None` for an in-memory store.
    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA).map_err(|e| {
            PanelError::store_with_source("Failed to apply store schema", e)
        })?;
        users::seed_default_user(&conn)?;
        debug!("Store schema ready");
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PanelError::store("Store connection lock poisoned"))
    }

    /// Restores every setting to its default and the first user's
    /// credentials to the seeded defaults.
    pub fn reset_all(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM settings", [])?;
        users::reset_first_user(&tx)?;
        tx.commit()?;

        info!("All settings reset to defaults");
        Ok(())
    }
}

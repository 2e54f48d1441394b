//! Key/value panel settings.

use super::SettingsStore;
use crate::error::{PanelError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// Default listen address (all interfaces).
pub const DEFAULT_LISTEN: &str = "";

/// Default panel port.
pub const DEFAULT_PORT: u16 = 54321;

/// Default URL base path.
pub const DEFAULT_BASE_PATH: &str = "/";

const DEFAULT_TIME_LOCATION: &str = "Local";

const KEY_LISTEN: &str = "webListen";
const KEY_PORT: &str = "webPort";
const KEY_BASE_PATH: &str = "webBasePath";
const KEY_TIME_LOCATION: &str = "timeLocation";

/// Snapshot of the settings the panel server needs to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelSettings {
    /// Listen address; empty means all interfaces.
    pub listen: String,
    /// Listen port.
    pub port: u16,
    /// URL base path, always starting and ending with `/`.
    pub base_path: String,
    /// Time zone name used for display.
    pub time_location: String,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            port: DEFAULT_PORT,
            base_path: DEFAULT_BASE_PATH.to_string(),
            time_location: DEFAULT_TIME_LOCATION.to_string(),
        }
    }
}

fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BASE_PATH.to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

impl SettingsStore {
    /// Returns the configured panel port.
    pub fn port(&self) -> Result<u16> {
        let conn = self.lock()?;
        match get(&conn, KEY_PORT)? {
            Some(raw) => raw.parse().map_err(|_| {
                PanelError::store(format!("Stored {} is not a valid port: {}", KEY_PORT, raw))
            }),
            None => Ok(DEFAULT_PORT),
        }
    }

    /// Sets the panel port. Port 0 is rejected.
    pub fn set_port(&self, port: u16) -> Result<()> {
        if port == 0 {
            return Err(PanelError::store("port must be between 1 and 65535"));
        }
        let conn = self.lock()?;
        set(&conn, KEY_PORT, &port.to_string())
    }

    /// Returns the listen address.
    pub fn listen(&self) -> Result<String> {
        let conn = self.lock()?;
        Ok(get(&conn, KEY_LISTEN)?.unwrap_or_else(|| DEFAULT_LISTEN.to_string()))
    }

    /// Sets the listen address; empty listens on all interfaces.
    #[cfg(test)]
    pub(crate) fn set_listen(&self, listen: &str) -> Result<()> {
        let conn = self.lock()?;
        set(&conn, KEY_LISTEN, listen)
    }

    /// Returns the normalized URL base path.
    pub fn base_path(&self) -> Result<String> {
        let conn = self.lock()?;
        Ok(get(&conn, KEY_BASE_PATH)?
            .map(|p| normalize_base_path(&p))
            .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()))
    }

    /// Sets the URL base path.
    #[cfg(test)]
    pub(crate) fn set_base_path(&self, base_path: &str) -> Result<()> {
        let conn = self.lock()?;
        set(&conn, KEY_BASE_PATH, &normalize_base_path(base_path))
    }

    /// Reads every setting the panel server needs in one go.
    pub fn panel_settings(&self) -> Result<PanelSettings> {
        let defaults = PanelSettings::default();
        Ok(PanelSettings {
            listen: self.listen()?,
            port: self.port()?,
            base_path: self.base_path()?,
            time_location: {
                let conn = self.lock()?;
                get(&conn, KEY_TIME_LOCATION)?.unwrap_or(defaults.time_location)
            },
        })
    }
}

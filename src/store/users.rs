//! Login users.

use super::SettingsStore;
use crate::error::{PanelError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

/// Username seeded into an empty store.
pub const DEFAULT_USERNAME: &str = "admin";

/// Password seeded into an empty store.
pub const DEFAULT_PASSWORD: &str = "admin";

/// A panel login user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Row id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

fn first(conn: &Connection) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, password FROM users ORDER BY id LIMIT 1",
            [],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

pub(super) fn seed_default_user(conn: &Connection) -> Result<()> {
    if first(conn)?.is_none() {
        conn.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2)",
            params![DEFAULT_USERNAME, DEFAULT_PASSWORD],
        )?;
        info!(username = DEFAULT_USERNAME, "Seeded default user");
    }
    Ok(())
}

pub(super) fn reset_first_user(conn: &Connection) -> Result<()> {
    match first(conn)? {
        Some(user) => {
            conn.execute(
                "UPDATE users SET username = ?1, password = ?2 WHERE id = ?3",
                params![DEFAULT_USERNAME, DEFAULT_PASSWORD, user.id],
            )?;
        }
        None => seed_default_user(conn)?,
    }
    Ok(())
}

impl SettingsStore {
    /// Returns the first (administrative) user.
    pub fn first_user(&self) -> Result<User> {
        let conn = self.lock()?;
        first(&conn)?.ok_or_else(|| PanelError::store("no user found in store"))
    }

    /// Updates the first user's credentials.
    ///
    /// An empty `username` or `password` leaves that field unchanged.
    pub fn update_first_user(&self, username: &str, password: &str) -> Result<()> {
        let conn = self.lock()?;
        let user = first(&conn)?.ok_or_else(|| PanelError::store("no user found in store"))?;

        let username = if username.is_empty() {
            user.username.as_str()
        } else {
            username
        };
        let password = if password.is_empty() {
            user.password.as_str()
        } else {
            password
        };

        conn.execute(
            "UPDATE users SET username = ?1, password = ?2 WHERE id = ?3",
            params![username, password, user.id],
        )?;
        Ok(())
    }
}

//! Proxy inbounds, populated by the legacy migration.

use super::SettingsStore;
use crate::error::Result;
use rusqlite::{params, Connection};
use tracing::warn;

/// An inbound about to be inserted into the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewInbound {
    /// Owning user id.
    pub user_id: i64,
    /// Free-form description.
    pub remark: String,
    /// Whether the inbound is active.
    pub enable: bool,
    /// Listen address; empty means all interfaces.
    pub listen: String,
    /// Listen port, unique across inbounds.
    pub port: u16,
    /// Proxy protocol name.
    pub protocol: String,
    /// Protocol settings as JSON text.
    pub settings: String,
    /// Transport settings as JSON text.
    pub stream_settings: String,
    /// Unique routing tag.
    pub tag: String,
    /// Sniffing settings as JSON text.
    pub sniffing: String,
    /// Uploaded bytes.
    pub up: i64,
    /// Downloaded bytes.
    pub down: i64,
    /// Expiry as Unix milliseconds, 0 for never.
    pub expiry_time: i64,
}

/// Outcome of [`SettingsStore::import_inbounds`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    /// Rows inserted.
    pub inserted: usize,
    /// Rows left out because their port was already taken.
    pub skipped: usize,
}

fn port_taken(conn: &Connection, port: u16) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM inbounds WHERE port = ?1",
        params![port],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn insert(conn: &Connection, inbound: &NewInbound) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO inbounds (user_id, remark, enable, listen, port, protocol, settings,
                               stream_settings, tag, sniffing, up, down, expiry_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            inbound.user_id,
            inbound.remark,
            inbound.enable,
            inbound.listen,
            inbound.port,
            inbound.protocol,
            inbound.settings,
            inbound.stream_settings,
            inbound.tag,
            inbound.sniffing,
            inbound.up,
            inbound.down,
            inbound.expiry_time,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl SettingsStore {
    /// Returns whether an inbound already listens on `port`.
    pub fn inbound_port_taken(&self, port: u16) -> Result<bool> {
        let conn = self.lock()?;
        Ok(port_taken(&conn, port)?)
    }

    /// Inserts an inbound and returns its row id.
    pub fn add_inbound(&self, inbound: &NewInbound) -> Result<i64> {
        let conn = self.lock()?;
        Ok(insert(&conn, inbound)?)
    }

    /// Inserts `inbounds` in one transaction, skipping any whose port is taken.
    ///
    /// Ports are checked against rows inserted earlier in the same batch too.
    /// On error nothing is written.
    pub fn import_inbounds(&self, inbounds: &[NewInbound]) -> Result<ImportCounts> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut counts = ImportCounts::default();

        for inbound in inbounds {
            if port_taken(&tx, inbound.port)? {
                warn!(port = inbound.port, "Skipping inbound, port already in use");
                counts.skipped += 1;
                continue;
            }
            insert(&tx, inbound)?;
            counts.inserted += 1;
        }

        tx.commit()?;
        Ok(counts)
    }

    /// Returns the number of stored inbounds.
    pub fn inbound_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM inbounds", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

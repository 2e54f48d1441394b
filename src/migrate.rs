//! Import of inbounds from a v2-ui database.
//!
//! The legacy database is opened read-only. Every row of its `inbound` table
//! becomes an inbound owned by the panel's first user. Rows whose port is
//! already in use are skipped rather than failing the whole import; any other
//! insert failure rolls the whole import back.

use crate::error::{PanelError, Result};
use crate::store::{NewInbound, SettingsStore};
use rusqlite::{Connection, OpenFlags, Row};
use std::path::Path;
use tracing::{info, warn};

/// Conventional location of the v2-ui database.
pub const DEFAULT_LEGACY_DB_PATH: &str = "/etc/v2-ui/v2-ui.db";

/// Counts reported after a migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Inbounds inserted into the store.
    pub imported: usize,
    /// Legacy inbounds left out (port clash or invalid port).
    pub skipped: usize,
}

#[derive(Debug)]
struct LegacyInbound {
    port: i64,
    listen: Option<String>,
    protocol: String,
    settings: Option<String>,
    stream_settings: Option<String>,
    tag: Option<String>,
    sniffing: Option<String>,
    remark: Option<String>,
    up: Option<i64>,
    down: Option<i64>,
    enable: Option<bool>,
}

impl LegacyInbound {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            port: row.get(0)?,
            listen: row.get(1)?,
            protocol: row.get(2)?,
            settings: row.get(3)?,
            stream_settings: row.get(4)?,
            tag: row.get(5)?,
            sniffing: row.get(6)?,
            remark: row.get(7)?,
            up: row.get(8)?,
            down: row.get(9)?,
            enable: row.get(10)?,
        })
    }

    fn into_inbound(self, user_id: i64, port: u16) -> NewInbound {
        let tag = self
            .tag
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("inbound-{}", port));

        NewInbound {
            user_id,
            remark: self.remark.unwrap_or_default(),
            enable: self.enable.unwrap_or(true),
            listen: self.listen.unwrap_or_default(),
            port,
            protocol: self.protocol,
            settings: self.settings.unwrap_or_default(),
            stream_settings: self.stream_settings.unwrap_or_default(),
            tag,
            sniffing: self.sniffing.unwrap_or_default(),
            up: self.up.unwrap_or_default(),
            down: self.down.unwrap_or_default(),
            expiry_time: 0,
        }
    }
}

fn read_legacy_inbounds(path: &Path) -> Result<Vec<LegacyInbound>> {
    if !path.exists() {
        return Err(PanelError::migration(format!(
            "legacy database not found: {}",
            path.display()
        )));
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
        |e| {
            PanelError::migration_with_source(
                format!("Failed to open legacy database '{}'", path.display()),
                e,
            )
        },
    )?;

    let read = |conn: &Connection| -> rusqlite::Result<Vec<LegacyInbound>> {
        let mut stmt = conn.prepare(
            "SELECT port, listen, protocol, settings, stream_settings, tag, sniffing,
                    remark, up, down, enable
             FROM inbound ORDER BY id",
        )?;
        let rows = stmt.query_map([], LegacyInbound::from_row)?;
        rows.collect()
    };

    read(&conn).map_err(|e| PanelError::migration_with_source("Failed to read legacy inbounds", e))
}

/// Imports the inbounds of the v2-ui database at `legacy_path` into `store`.
pub fn migrate_from_v2ui(store: &SettingsStore, legacy_path: &Path) -> Result<MigrationReport> {
    let legacy = read_legacy_inbounds(legacy_path)?;
    let owner = store.first_user()?;
    let mut skipped = 0;
    let mut batch = Vec::with_capacity(legacy.len());

    for inbound in legacy {
        match u16::try_from(inbound.port) {
            Ok(port) if port > 0 => batch.push(inbound.into_inbound(owner.id, port)),
            _ => {
                warn!(port = inbound.port, "Skipping legacy inbound with invalid port");
                skipped += 1;
            }
        }
    }

    let counts = store.import_inbounds(&batch)?;
    let report = MigrationReport {
        imported: counts.inserted,
        skipped: skipped + counts.skipped,
    };

    info!(
        legacy = %legacy_path.display(),
        imported = report.imported,
        skipped = report.skipped,
        "Legacy migration finished"
    );
    Ok(report)
}

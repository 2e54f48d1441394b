//! Mode execution.
//!
//! Each operating mode opens the settings store itself; the dispatcher in
//! `cli` never does. User-facing results of the one-shot modes are written to
//! the supplied writer (stdout in the binary), diagnostics go through tracing.

use crate::cli::OperatingMode;
use crate::config::Config;
use crate::error::{PanelError, Result};
use crate::migrate::migrate_from_v2ui;
use crate::server::PanelServerFactory;
use crate::settings::{self, SettingsRequest};
use crate::store::SettingsStore;
use crate::supervisor::{self, signals, Supervisor, SupervisorExit};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Executes `mode`, printing one-shot results to stdout.
pub fn execute(mode: OperatingMode, config: &Config) -> Result<()> {
    let mut out = std::io::stdout();
    match mode {
        OperatingMode::RunService => run_service(config).map(|_| ()),
        OperatingMode::Migrate { legacy_path } => run_migration(config, &legacy_path, &mut out),
        OperatingMode::ConfigureSettings(request) => run_settings(config, &request, &mut out),
    }
}

/// Runs the panel under the lifecycle supervisor until it is told to exit.
///
/// Fails if the store cannot be initialised, if the first start fails, or if a
/// restart after a reload fails.
pub fn run_service(config: &Config) -> Result<SupervisorExit> {
    let store = Arc::new(SettingsStore::open(&config.store.path)?);
    tracing::debug!(path = ?store.path(), "Settings store opened");

    let runtime = tokio::runtime::Runtime::new().map_err(|e| {
        PanelError::service_with_source("runtime", "Failed to create async runtime", e)
    })?;

    runtime.block_on(async move {
        let (handle, events) = supervisor::channel();
        let forwarder = signals::spawn_forwarder(handle.clone())?;
        let factory = PanelServerFactory::new(store, handle);

        let exit = Supervisor::new(factory, events).run().await;
        forwarder.abort();

        if let Ok(exit) = &exit {
            tracing::info!(reason = ?exit.reason, reloads = exit.reloads, "Panel exited");
        }
        exit
    })
}

/// Imports inbounds from a v2-ui database into the store.
pub fn run_migration<W: Write>(config: &Config, legacy_path: &Path, out: &mut W) -> Result<()> {
    let result = SettingsStore::open(&config.store.path)
        .and_then(|store| migrate_from_v2ui(&store, legacy_path));

    match result {
        Ok(report) => {
            writeln!(
                out,
                "migrate from v2-ui success: {} imported, {} skipped",
                report.imported, report.skipped
            )?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "migrate from v2-ui failed: {}", e)?;
            Err(e)
        }
    }
}

/// Applies one-shot settings changes and prints one line per operation.
///
/// A store that cannot be opened is reported and nothing is applied; failures
/// of individual operations are reported but do not fail the command.
pub fn run_settings<W: Write>(
    config: &Config,
    request: &SettingsRequest,
    out: &mut W,
) -> Result<()> {
    let store = match SettingsStore::open(&config.store.path) {
        Ok(store) => store,
        Err(e) => {
            writeln!(out, "{}", e)?;
            return Err(e);
        }
    };

    if request.is_noop() {
        writeln!(out, "no settings changed")?;
        return Ok(());
    }

    for outcome in settings::apply(&store, request) {
        writeln!(out, "{}", outcome)?;
    }
    Ok(())
}

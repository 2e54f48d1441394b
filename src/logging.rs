//! Tracing subscriber initialisation.

use crate::config::{LogFormat, LogOutput, LoggingConfig};
use crate::error::{PanelError, Result};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Builds the level filter: `RUST_LOG` directives when set, else the configured level.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let level: tracing::Level = config.level.into();
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// Installs the global tracing subscriber described by `config`.
///
/// Must be called once, before any mode runs.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let layer = match config.output {
        LogOutput::Stdout => format_layer(config.format, true, std::io::stdout),
        LogOutput::Stderr => format_layer(config.format, true, std::io::stderr),
        LogOutput::File => {
            let path = config
                .file_path
                .as_deref()
                .ok_or_else(|| PanelError::config("logging.file_path is required for file output"))?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    PanelError::config_with_source(format!("Failed to open log file {}", path), e)
                })?;
            format_layer(config.format, false, Arc::new(file))
        }
    };

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(layer)
        .try_init()
        .map_err(|e| PanelError::config(format!("Failed to initialise logging: {}", e)))
}

fn format_layer<S, W>(format: LogFormat, ansi: bool, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + 'static,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    }
}

//! xpanel - administrative web panel
//!
//! This crate provides the process entry point of the panel: a command
//! dispatcher that selects an operating mode, a lifecycle supervisor that
//! keeps exactly one panel server instance running across reload signals,
//! and one-shot settings administration.
//!
//! # Modules
//!
//! - [`cli`] - Command-line parsing into an [`cli::Invocation`]
//! - [`app`] - Execution of the selected operating mode
//! - [`config`] - Process configuration (YAML file and environment)
//! - [`error`] - Error types and exit codes
//! - [`logging`] - Tracing subscriber setup
//! - [`store`] - SQLite settings store
//! - [`settings`] - One-shot settings administration
//! - [`migrate`] - Import from a v2-ui database
//! - [`supervisor`] - Signal-driven lifecycle supervision
//! - [`server`] - The supervised panel HTTP server

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod settings;
pub mod store;
pub mod supervisor;

// Re-exports for convenience
pub use cli::{Invocation, OperatingMode};
pub use config::Config;
pub use error::{ErrorCode, PanelError, Result};
pub use server::{PanelServer, PanelServerFactory};
pub use store::SettingsStore;
pub use supervisor::{Supervisor, SupervisorHandle};

/// Application name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

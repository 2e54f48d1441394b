//! xpanel - administrative web panel
//!
//! Entry point for the xpanel application.

use std::path::Path;
use std::process::ExitCode;
use xpanel::cli::{parse_invocation, Invocation};
use xpanel::config::Config;
use xpanel::error::exit_code;

fn main() -> ExitCode {
    let args = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());

    let mode = match parse_invocation(args) {
        Invocation::Version => {
            println!("{}", xpanel::VERSION);
            return ExitCode::SUCCESS;
        }
        Invocation::Usage(text) | Invocation::Help(text) => {
            println!("{}", text);
            return ExitCode::SUCCESS;
        }
        Invocation::Invalid(message) => {
            eprintln!("{}", message);
            return ExitCode::from(exit_code::CLI_ERROR as u8);
        }
        Invocation::Mode(mode) => mode,
    };

    let config = match Config::load(None::<&Path>) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    if let Err(e) = xpanel::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::from(e.exit_code() as u8);
    }

    tracing::info!(
        store = %config.store.path.display(),
        "{} {}",
        xpanel::NAME,
        xpanel::VERSION
    );

    match xpanel::app::execute(mode, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

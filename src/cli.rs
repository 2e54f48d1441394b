//! Command-line interface definition for xpanel.
//!
//! The panel binary follows the single-dash flag convention (`-port 443`,
//! `-db=/path`). Arguments are normalised to clap's double-dash long form
//! before parsing, so both spellings are accepted.

use crate::migrate::DEFAULT_LEGACY_DB_PATH;
use crate::settings::SettingsRequest;
use clap::builder::BoolishValueParser;
use clap::{error::ErrorKind, ArgAction, Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Message printed before the combined usage when the mode is not recognised.
pub const UNKNOWN_MODE_MESSAGE: &str = "expect 'run' or 'v2-ui' or 'setting' subcommands";

const MODE_KEYWORDS: [&str; 3] = ["run", "v2-ui", "setting"];

/// Long flags that consume the following argument as their value.
const VALUE_FLAGS: [&str; 4] = ["db", "port", "username", "password"];

/// xpanel - web management panel
#[derive(Debug, Parser)]
#[command(name = "xpanel")]
#[command(about, long_about = None)]
#[command(disable_version_flag = true, disable_help_subcommand = true)]
pub struct Cli {
    /// Show version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Operating mode; the panel runs when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the web panel
    Run,

    /// Migrate inbounds from v2-ui
    #[command(name = "v2-ui")]
    V2ui(MigrateArgs),

    /// Change panel settings
    Setting(SettingArgs),
}

/// Arguments for the `v2-ui` subcommand.
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Database path of v2-ui
    #[arg(long, default_value = DEFAULT_LEGACY_DB_PATH, allow_hyphen_values = true)]
    pub db: PathBuf,
}

/// Arguments for the `setting` subcommand.
#[derive(Debug, Args)]
pub struct SettingArgs {
    /// Reset all settings
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub reset: bool,

    /// Set panel port
    #[arg(long, default_value_t = 0)]
    pub port: u16,

    /// Set login username
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub username: String,

    /// Set login password
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub password: String,
}

impl From<SettingArgs> for SettingsRequest {
    fn from(args: SettingArgs) -> Self {
        SettingsRequest {
            reset: args.reset,
            port: args.port,
            username: args.username,
            password: args.password,
        }
    }
}

/// The operating mode selected for this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatingMode {
    /// Run the panel under the lifecycle supervisor.
    RunService,
    /// Import data from a v2-ui database, then exit.
    Migrate {
        /// Path to the legacy database.
        legacy_path: PathBuf,
    },
    /// Apply one-shot settings changes, then exit.
    ConfigureSettings(SettingsRequest),
}

/// Outcome of argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print the version and exit.
    Version,
    /// Unknown mode: print the combined usage and exit.
    Usage(String),
    /// Help was requested.
    Help(String),
    /// Flags of the selected mode did not parse.
    Invalid(String),
    /// Execute a mode.
    Mode(OperatingMode),
}

fn is_mode_keyword(arg: &str) -> bool {
    MODE_KEYWORDS.contains(&arg)
}

/// Rewrites single-dash long flags (`-port`, `-db=x`) into `--port`, `--db=x`.
///
/// Single-letter flags and the values of value-taking flags are left alone.
pub fn normalize_flags<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut normalized = Vec::new();
    let mut value_pending = false;

    for (index, arg) in args.into_iter().map(Into::into).enumerate() {
        if index == 0 || value_pending {
            value_pending = false;
            normalized.push(arg);
            continue;
        }

        let Some(rest) = arg.strip_prefix('-') else {
            normalized.push(arg);
            continue;
        };

        let long = rest.strip_prefix('-').unwrap_or(rest);
        let name = long.split('=').next().unwrap_or_default();
        let is_long = name.chars().count() > 1
            && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());

        if is_long {
            value_pending = !long.contains('=') && VALUE_FLAGS.contains(&name);
            normalized.push(format!("--{}", long));
        } else {
            normalized.push(arg);
        }
    }

    normalized
}

/// Renders the message and usage of every subcommand shown for unknown modes.
pub fn usage_text() -> String {
    let mut cmd = Cli::command();
    cmd.build();

    let mut text = String::from(UNKNOWN_MODE_MESSAGE);
    for sub in cmd.get_subcommands_mut() {
        text.push_str("\n\n");
        text.push_str(&sub.render_help().to_string());
    }
    text
}

/// Parses the full process argument list (including the program name).
///
/// Never touches the store or any service.
pub fn parse_invocation<I, S>(args: I) -> Invocation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();

    let Some(first) = args.get(1) else {
        return Invocation::Mode(OperatingMode::RunService);
    };
    let keyword = is_mode_keyword(first);
    if !keyword && !first.starts_with('-') {
        return Invocation::Usage(usage_text());
    }

    match Cli::try_parse_from(normalize_flags(args.iter().cloned())) {
        Ok(cli) if cli.version => Invocation::Version,
        Ok(cli) => Invocation::Mode(match cli.command {
            None | Some(Commands::Run) => OperatingMode::RunService,
            Some(Commands::V2ui(args)) => OperatingMode::Migrate {
                legacy_path: args.db,
            },
            Some(Commands::Setting(args)) => OperatingMode::ConfigureSettings(args.into()),
        }),
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            Invocation::Help(e.render().to_string())
        }
        Err(_) if !keyword => Invocation::Usage(usage_text()),
        Err(e) => Invocation::Invalid(e.render().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Invocation {
        parse_invocation(std::iter::once("xpanel").chain(args.iter().copied()))
    }

    fn settings(args: &[&str]) -> SettingsRequest {
        match parse(args) {
            Invocation::Mode(OperatingMode::ConfigureSettings(request)) => request,
            other => panic!("Expected ConfigureSettings, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_debug() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_runs_service() {
        assert_eq!(parse(&[]), Invocation::Mode(OperatingMode::RunService));
    }

    #[test]
    fn test_run_command() {
        assert_eq!(parse(&["run"]), Invocation::Mode(OperatingMode::RunService));
    }

    #[test]
    fn test_version_flag() {
        assert_eq!(parse(&["-v"]), Invocation::Version);
        assert_eq!(parse(&["--version"]), Invocation::Version);
        assert_eq!(parse(&["-version"]), Invocation::Version);
    }

    #[test]
    fn test_unknown_mode_prints_usage() {
        match parse(&["bogus"]) {
            Invocation::Usage(text) => {
                assert!(text.starts_with(UNKNOWN_MODE_MESSAGE));
                assert!(text.contains("--port"));
                assert!(text.contains("--db"));
            }
            other => panic!("Expected Usage, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_top_level_flag_prints_usage() {
        assert!(matches!(parse(&["-x"]), Invocation::Usage(_)));
    }

    #[test]
    fn test_help_flag() {
        assert!(matches!(parse(&["-h"]), Invocation::Help(_)));
        assert!(matches!(parse(&["setting", "-h"]), Invocation::Help(_)));
    }

    #[test]
    fn test_migrate_default_path() {
        assert_eq!(
            parse(&["v2-ui"]),
            Invocation::Mode(OperatingMode::Migrate {
                legacy_path: PathBuf::from(DEFAULT_LEGACY_DB_PATH),
            })
        );
    }

    #[test]
    fn test_migrate_custom_path() {
        let expected = Invocation::Mode(OperatingMode::Migrate {
            legacy_path: PathBuf::from("/tmp/old.db"),
        });
        assert_eq!(parse(&["v2-ui", "-db", "/tmp/old.db"]), expected);
        assert_eq!(parse(&["v2-ui", "-db=/tmp/old.db"]), expected);
        assert_eq!(parse(&["v2-ui", "--db", "/tmp/old.db"]), expected);
    }

    #[test]
    fn test_setting_defaults_are_noop() {
        let request = settings(&["setting"]);
        assert!(request.is_noop());
    }

    #[test]
    fn test_setting_port() {
        let request = settings(&["setting", "-port", "443"]);
        assert_eq!(request.port, 443);
        assert!(!request.reset);
        assert!(request.username.is_empty());
    }

    #[test]
    fn test_setting_credentials() {
        let request = settings(&["setting", "-username", "root", "--password=s3cret"]);
        assert_eq!(request.username, "root");
        assert_eq!(request.password, "s3cret");
        assert_eq!(request.port, 0);
    }

    #[test]
    fn test_setting_value_starting_with_dash() {
        let request = settings(&["setting", "-password", "-weird-pass"]);
        assert_eq!(request.password, "-weird-pass");
    }

    #[test]
    fn test_setting_reset() {
        assert!(settings(&["setting", "-reset"]).reset);
    }

    #[test]
    fn test_setting_reset_with_explicit_value() {
        assert!(settings(&["setting", "-reset=true"]).reset);
        assert!(settings(&["setting", "--reset=1"]).reset);
        assert!(!settings(&["setting", "-reset=false"]).reset);
        assert_eq!(settings(&["setting", "-reset=false", "-port", "443"]).port, 443);
        assert!(matches!(
            parse(&["setting", "-reset=maybe"]),
            Invocation::Invalid(_)
        ));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(matches!(
            parse(&["setting", "-port", "abc"]),
            Invocation::Invalid(_)
        ));
        assert!(matches!(
            parse(&["setting", "-port", "70000"]),
            Invocation::Invalid(_)
        ));
    }

    #[test]
    fn test_unknown_mode_flag_is_invalid() {
        assert!(matches!(parse(&["run", "-bogus"]), Invocation::Invalid(_)));
    }

    #[test]
    fn test_normalize_flags() {
        let args = normalize_flags([
            "xpanel", "setting", "-port", "443", "-v", "--reset", "-db=/x", "-password", "-p",
        ]);
        assert_eq!(
            args,
            vec![
                "xpanel",
                "setting",
                "--port",
                "443",
                "-v",
                "--reset",
                "--db=/x",
                "--password",
                "-p",
            ]
        );
    }
}

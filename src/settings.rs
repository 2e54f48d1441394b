//! One-shot settings administration.
//!
//! Applies `setting` subcommand requests directly to the store, outside of a
//! running panel. Each requested operation is attempted and reported on its
//! own; a failure in one never prevents the next.

use crate::error::PanelError;
use crate::store::SettingsStore;
use std::fmt;
use tracing::{info, warn};

/// Settings changes requested on the command line.
///
/// Zero and empty values mean "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsRequest {
    /// Reset every setting to its default; other fields are ignored.
    pub reset: bool,
    /// New panel port, 0 for no change.
    pub port: u16,
    /// New login username, empty for no change.
    pub username: String,
    /// New login password, empty for no change.
    pub password: String,
}

impl SettingsRequest {
    /// Returns whether the request asks for any change at all.
    pub fn is_noop(&self) -> bool {
        !self.reset && self.port == 0 && self.username.is_empty() && self.password.is_empty()
    }
}

/// A single settings operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingOperation {
    /// Reset all settings.
    Reset,
    /// Change the panel port.
    SetPort(u16),
    /// Change the first user's credentials.
    UpdateCredentials,
}

/// Result of one settings operation.
#[derive(Debug)]
pub struct SettingOutcome {
    /// The operation attempted.
    pub operation: SettingOperation,
    /// Its result.
    pub result: Result<(), PanelError>,
}

impl SettingOutcome {
    /// Returns whether the operation succeeded.
    pub(crate) fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for SettingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.operation, &self.result) {
            (SettingOperation::Reset, Ok(())) => write!(f, "reset setting success"),
            (SettingOperation::Reset, Err(e)) => write!(f, "reset setting failed: {}", e),
            (SettingOperation::SetPort(port), Ok(())) => write!(f, "set port {} success", port),
            (SettingOperation::SetPort(_), Err(e)) => write!(f, "set port failed: {}", e),
            (SettingOperation::UpdateCredentials, Ok(())) => {
                write!(f, "set username and password success")
            }
            (SettingOperation::UpdateCredentials, Err(e)) => {
                write!(f, "set username and password failed: {}", e)
            }
        }
    }
}

fn record(operation: SettingOperation, result: Result<(), PanelError>) -> SettingOutcome {
    let outcome = SettingOutcome { operation, result };
    if outcome.is_success() {
        info!(operation = ?outcome.operation, "Setting updated");
    } else {
        warn!(operation = ?outcome.operation, outcome = %outcome, "Setting update failed");
    }
    outcome
}

/// Applies `request` to `store` and returns one outcome per attempted
/// operation, in the order they were attempted.
pub fn apply(store: &SettingsStore, request: &SettingsRequest) -> Vec<SettingOutcome> {
    if request.reset {
        return vec![record(SettingOperation::Reset, store.reset_all())];
    }

    let mut outcomes = Vec::new();

    if request.port > 0 {
        outcomes.push(record(
            SettingOperation::SetPort(request.port),
            store.set_port(request.port),
        ));
    }

    if !request.username.is_empty() || !request.password.is_empty() {
        outcomes.push(record(
            SettingOperation::UpdateCredentials,
            store.update_first_user(&request.username, &request.password),
        ));
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PanelSettings, DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_USERNAME};

    fn request(port: u16, username: &str, password: &str) -> SettingsRequest {
        SettingsRequest {
            reset: false,
            port,
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_port_only() {
        let store = SettingsStore::open_in_memory().unwrap();

        let outcomes = apply(&store, &request(8443, "", ""));

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[0].to_string(), "set port 8443 success");

        let settings = store.panel_settings().unwrap();
        assert_eq!(settings.port, 8443);
        assert_eq!(
            settings,
            PanelSettings {
                port: 8443,
                ..PanelSettings::default()
            }
        );
        let user = store.first_user().unwrap();
        assert_eq!(user.username, DEFAULT_USERNAME);
        assert_eq!(user.password, DEFAULT_PASSWORD);
    }

    #[test]
    fn test_username_only() {
        let store = SettingsStore::open_in_memory().unwrap();

        let outcomes = apply(&store, &request(0, "root", ""));

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].operation, SettingOperation::UpdateCredentials);
        assert_eq!(outcomes[0].to_string(), "set username and password success");

        let user = store.first_user().unwrap();
        assert_eq!(user.username, "root");
        assert_eq!(user.password, DEFAULT_PASSWORD);
        assert_eq!(store.port().unwrap(), DEFAULT_PORT);
    }

    #[test]
    fn test_port_and_credentials() {
        let store = SettingsStore::open_in_memory().unwrap();

        let outcomes = apply(&store, &request(443, "root", "toor"));

        let operations: Vec<_> = outcomes.iter().map(|o| o.operation).collect();
        assert_eq!(
            operations,
            vec![
                SettingOperation::SetPort(443),
                SettingOperation::UpdateCredentials
            ]
        );
        assert!(outcomes.iter().all(SettingOutcome::is_success));
    }

    #[test]
    fn test_failure_does_not_block_other_operation() {
        let store = SettingsStore::open_in_memory().unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute("DELETE FROM users", []).unwrap();
        }

        let outcomes = apply(&store, &request(2053, "root", "toor"));

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[1]
            .to_string()
            .starts_with("set username and password failed:"));
        assert_eq!(store.port().unwrap(), 2053);
    }

    #[test]
    fn test_reset_ignores_other_fields() {
        let store = SettingsStore::open_in_memory().unwrap();
        store.set_port(9999).unwrap();
        store.update_first_user("root", "toor").unwrap();

        let mut req = request(1234, "other", "");
        req.reset = true;
        let outcomes = apply(&store, &req);

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].to_string(), "reset setting success");
        assert_eq!(store.panel_settings().unwrap(), PanelSettings::default());
        assert_eq!(store.first_user().unwrap().username, DEFAULT_USERNAME);
    }

    #[test]
    fn test_noop_request() {
        let store = SettingsStore::open_in_memory().unwrap();
        let req = SettingsRequest::default();

        assert!(req.is_noop());
        assert!(apply(&store, &req).is_empty());
        assert_eq!(store.port().unwrap(), DEFAULT_PORT);
    }
}

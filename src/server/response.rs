//! API response types and formatting.
//!
//! This module defines the standard API response format used by all endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorResponse, PanelError};
use crate::server::state::StatsSnapshot;
use crate::supervisor::InstanceState;

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data (present on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error information (present on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
    /// Response timestamp.
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a failed response with an error.
    pub fn error(error: ErrorResponse) -> ApiResponse<T> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }

    /// Creates a failed response from a PanelError.
    pub fn from_error(err: &PanelError) -> ApiResponse<T> {
        Self::error(ErrorResponse::from_error(err))
    }
}

/// Health check response data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthData {
    /// Health status.
    pub status: HealthStatus,
    /// Application version.
    pub version: String,
    /// Uptime of this instance in seconds.
    pub uptime_seconds: u64,
}

/// Health status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Panel is serving.
    Healthy,
    /// Panel is serving but its supervisor is gone.
    Degraded,
}

/// Panel status response data.
#[derive(Debug, Clone, Serialize)]
pub struct StatusData {
    /// Identifier of the running instance; changes on every reload.
    pub instance_id: Uuid,
    /// Instance lifecycle state.
    pub state: InstanceState,
    /// Listener information.
    pub server: ServerInfo,
    /// Request counters of this instance.
    pub stats: StatsSnapshot,
    /// Application version.
    pub version: String,
    /// Uptime of this instance in seconds.
    pub uptime_seconds: u64,
}

/// Listener information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Listen address; empty means all interfaces.
    pub listen: String,
    /// Port number.
    pub port: u16,
    /// URL base path.
    pub base_path: String,
}

/// Response data for panel lifecycle requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelActionData {
    /// Request ID.
    pub request_id: Uuid,
    /// Action requested.
    pub action: PanelAction,
    /// Human-readable note.
    pub message: String,
}

/// Lifecycle actions the panel can ask its supervisor for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelAction {
    /// Stop and start a fresh instance.
    Restart,
    /// Stop the panel process.
    Stop,
}

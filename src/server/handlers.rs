//! HTTP request handlers of the panel API.

use crate::server::response::{
    ApiResponse, HealthData, HealthStatus, PanelAction, PanelActionData, ServerInfo, StatusData,
};
use crate::server::state::AppState;
use crate::supervisor::InstanceState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// GET /api/v1/health
///
/// Reports `degraded` once the supervisor no longer accepts requests.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = if state.supervisor.is_closed() {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let data = HealthData {
        status,
        version: crate::VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    state.stats.record(true);
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

/// GET /api/v1/status
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let data = StatusData {
        instance_id: state.instance_id,
        state: InstanceState::Running,
        server: ServerInfo {
            listen: state.settings.listen.clone(),
            port: state.settings.port,
            base_path: state.settings.base_path.clone(),
        },
        stats: state.stats.snapshot(),
        version: crate::VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    state.stats.record(true);
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

/// POST /api/v1/panel/restart
pub async fn restart_panel(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    panel_action(state, PanelAction::Restart).await
}

/// POST /api/v1/panel/stop
pub async fn stop_panel(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    panel_action(state, PanelAction::Stop).await
}

/// Queues a lifecycle request with the supervisor.
///
/// The supervisor stops this very instance afterwards, so the handler must
/// not wait for the outcome.
async fn panel_action(
    state: Arc<AppState>,
    action: PanelAction,
) -> (StatusCode, Json<ApiResponse<PanelActionData>>) {
    let request_id = Uuid::new_v4();
    info!(request_id = %request_id, action = ?action, "Panel lifecycle request");

    let (result, message) = match action {
        PanelAction::Restart => (
            state.supervisor.request_reload().await,
            "panel restart scheduled",
        ),
        PanelAction::Stop => (state.supervisor.request_stop().await, "panel stop scheduled"),
    };

    state.stats.record(result.is_ok());
    match result {
        Ok(()) => {
            let data = PanelActionData {
                request_id,
                action,
                message: message.to_string(),
            };
            (StatusCode::ACCEPTED, Json(ApiResponse::success(data)))
        }
        Err(err) => {
            error!(request_id = %request_id, error = %err, "Panel lifecycle request failed");
            let status = StatusCode::from_u16(err.code().http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(ApiResponse::from_error(&err)))
        }
    }
}

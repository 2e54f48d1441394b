//! Panel HTTP server - the service instance managed by the supervisor.
//!
//! Each [`PanelServer`] is single-use: it reads its listen settings from the
//! store when started, serves until stopped, and is then discarded. The
//! supervisor builds a new one through [`PanelServerFactory`] on every reload.

pub mod handlers;
pub mod response;
pub mod state;


use crate::error::{PanelError, Result};
use crate::store::{PanelSettings, SettingsStore};
use crate::supervisor::{InstanceState, ManagedService, ServiceFactory, SupervisorHandle};
use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use state::AppState;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Creates the API router with all endpoints, nested under the base path.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        // Health and status endpoints
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/status", get(handlers::status))
        // Lifecycle endpoints
        .route("/api/v1/panel/restart", post(handlers::restart_panel))
        .route("/api/v1/panel/stop", post(handlers::stop_panel));

    let prefix = state.settings.base_path.trim_end_matches('/').to_string();
    let router = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn listen_addr(settings: &PanelSettings) -> Result<SocketAddr> {
    let ip = if settings.listen.is_empty() {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        settings.listen.parse().map_err(|e| {
            PanelError::service_with_source(
                "start",
                format!("Invalid listen address '{}'", settings.listen),
                e,
            )
        })?
    };
    Ok(SocketAddr::new(ip, settings.port))
}

struct Serving {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// One run of the panel web server.
pub struct PanelServer {
    store: Arc<SettingsStore>,
    supervisor: SupervisorHandle,
    state: InstanceState,
    serving: Option<Serving>,
}

impl PanelServer {
    /// Constructs an instance; nothing is bound until [`ManagedService::start`].
    pub fn new(store: Arc<SettingsStore>, supervisor: SupervisorHandle) -> Self {
        Self {
            store,
            supervisor,
            state: InstanceState::Constructed,
            serving: None,
        }
    }

    /// Returns the bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.serving.as_ref().map(|s| s.addr)
    }
}

#[async_trait]
impl ManagedService for PanelServer {
    fn state(&self) -> InstanceState {
        self.state
    }

    async fn start(&mut self) -> Result<()> {
        if self.state != InstanceState::Constructed {
            return Err(PanelError::service(
                "start",
                format!("panel server instance is already {}", self.state),
            ));
        }

        let settings = self.store.panel_settings()?;
        let addr = listen_addr(&settings)?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            PanelError::service_with_source("start", format!("Failed to bind to {}", addr), e)
        })?;
        let bound = listener.local_addr()?;

        let base_path = settings.base_path.clone();
        let router = create_router(Arc::new(AppState::new(settings, self.supervisor.clone())));
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    // A dropped sender also means shut down.
                    let _ = shutdown_rx.await;
                })
                .await
        });

        self.serving = Some(Serving {
            addr: bound,
            shutdown,
            task,
        });
        self.state = InstanceState::Running;

        info!(addr = %bound, base_path = %base_path, "Panel server started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.state = InstanceState::Stopped;

        let Some(serving) = self.serving.take() else {
            debug!("Panel server was not running");
            return Ok(());
        };

        if serving.shutdown.send(()).is_err() {
            debug!("Panel server task already finished");
        }

        match serving.task.await {
            Ok(Ok(())) => {
                info!(addr = %serving.addr, "Panel server stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(PanelError::service_with_source(
                "stop",
                "Panel server terminated with an error",
                e,
            )),
            Err(e) => Err(PanelError::service_with_source(
                "stop",
                "Panel server task failed",
                e,
            )),
        }
    }
}

/// Builds panel server instances sharing one store and supervisor handle.
pub struct PanelServerFactory {
    store: Arc<SettingsStore>,
    supervisor: SupervisorHandle,
}

impl PanelServerFactory {
    /// Creates a factory.
    pub fn new(store: Arc<SettingsStore>, supervisor: SupervisorHandle) -> Self {
        Self { store, supervisor }
    }
}

impl ServiceFactory for PanelServerFactory {
    type Service = PanelServer;

    fn create(&mut self) -> PanelServer {
        PanelServer::new(Arc::clone(&self.store), self.supervisor.clone())
    }
}

//! Lifecycle supervisor - keeps exactly one panel service instance running.
//!
//! The supervisor owns the current instance outright. It starts one, then
//! waits on the control channel: a reload stops the instance and replaces it
//! with a freshly constructed one, a terminate stops it and returns. Events
//! are handled one at a time, so a stop/start pair is never interleaved with
//! another.

pub mod control;
pub mod signals;

#[cfg(test)]
mod supervisor_tests;

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub use control::{channel, SignalEvent, SupervisorHandle};

/// Lifecycle state of a managed service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    /// Built but not started.
    Constructed,
    /// Started and serving.
    Running,
    /// Stopped; the instance cannot be started again.
    Stopped,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceState::Constructed => write!(f, "constructed"),
            InstanceState::Running => write!(f, "running"),
            InstanceState::Stopped => write!(f, "stopped"),
        }
    }
}

/// A single-use service instance driven by the supervisor.
#[async_trait]
pub trait ManagedService: Send {
    /// Current lifecycle state.
    fn state(&self) -> InstanceState;

    /// Starts serving.
    async fn start(&mut self) -> Result<()>;

    /// Stops serving. The instance is `Stopped` afterwards even on error.
    async fn stop(&mut self) -> Result<()>;
}

/// Builds fresh service instances.
pub trait ServiceFactory: Send {
    /// The instance type produced.
    type Service: ManagedService;

    /// Constructs a new, not yet started, instance.
    fn create(&mut self) -> Self::Service;
}

/// Why the supervisor returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A terminate event was received.
    Terminated,
    /// Every control handle was dropped.
    ChannelClosed,
}

/// Summary returned when the supervisor shuts down cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorExit {
    /// Why the loop ended.
    pub reason: ExitReason,
    /// Number of completed reloads.
    pub reloads: u64,
}

/// Lifecycle supervisor.
pub struct Supervisor<F: ServiceFactory> {
    factory: F,
    events: mpsc::Receiver<SignalEvent>,
    reloads: u64,
}

impl<F: ServiceFactory> Supervisor<F> {
    /// Creates a supervisor reading events from `events`.
    pub fn new(factory: F, events: mpsc::Receiver<SignalEvent>) -> Self {
        Self {
            factory,
            events,
            reloads: 0,
        }
    }

    /// Runs until a terminate event, or until starting an instance fails.
    ///
    /// A start failure (initial or after a reload) is returned as the error;
    /// no further events are read in that case.
    pub async fn run(mut self) -> Result<SupervisorExit> {
        let mut current = self.start_instance("initial start").await?;
        info!("Panel service running, waiting for signals");

        loop {
            match self.events.recv().await {
                Some(SignalEvent::Reload) => {
                    info!(reloads = self.reloads, "Reloading panel service");
                    if let Err(e) = current.stop().await {
                        warn!(error = %e, "Failed to stop panel service, restarting anyway");
                    }
                    drop(current);

                    current = self.start_instance("restart").await?;
                    self.reloads += 1;
                    info!(reloads = self.reloads, "Panel service restarted");
                }
                Some(SignalEvent::Terminate) => {
                    return Ok(self.shutdown(current, ExitReason::Terminated).await);
                }
                None => {
                    return Ok(self.shutdown(current, ExitReason::ChannelClosed).await);
                }
            }
        }
    }

    async fn start_instance(&mut self, phase: &'static str) -> Result<F::Service> {
        let mut service = self.factory.create();
        match service.start().await {
            Ok(()) => Ok(service),
            Err(e) => {
                error!(phase, error = %e, "Failed to start panel service");
                Err(e)
            }
        }
    }

    async fn shutdown(&mut self, mut current: F::Service, reason: ExitReason) -> SupervisorExit {
        info!(reason = ?reason, "Stopping panel service");
        if let Err(e) = current.stop().await {
            warn!(error = %e, "Panel service reported an error while stopping");
        }
        SupervisorExit {
            reason,
            reloads: self.reloads,
        }
    }
}

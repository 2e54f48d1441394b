//! Control channel between signal sources and the supervisor.

use crate::error::{PanelError, Result};
use std::fmt;
use tokio::sync::mpsc;

/// Number of pending events the control channel buffers.
const CONTROL_CHANNEL_CAPACITY: usize = 16;

/// An external request for the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    /// Stop the current instance and start a fresh one.
    Reload,
    /// Stop the current instance and exit.
    Terminate,
}

impl fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalEvent::Reload => write!(f, "reload"),
            SignalEvent::Terminate => write!(f, "terminate"),
        }
    }
}

/// Cloneable sending side of the control channel.
///
/// This is the only way code outside the supervisor can influence the
/// managed instance: it can ask for a reload or a stop, never reach the
/// instance itself.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<SignalEvent>,
}

impl SupervisorHandle {
    /// Queues `event` for the supervisor.
    pub async fn send(&self, event: SignalEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| PanelError::supervisor("control channel closed"))
    }

    /// Asks the supervisor to restart the panel service.
    pub async fn request_reload(&self) -> Result<()> {
        self.send(SignalEvent::Reload).await
    }

    /// Asks the supervisor to stop the panel service and exit.
    pub async fn request_stop(&self) -> Result<()> {
        self.send(SignalEvent::Terminate).await
    }

    /// Returns whether the supervisor has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Creates the control channel.
pub fn channel() -> (SupervisorHandle, mpsc::Receiver<SignalEvent>) {
    let (tx, rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
    (SupervisorHandle { tx }, rx)
}

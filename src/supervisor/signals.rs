//! Adapter from operating-system signals to supervisor events.
//!
//! SIGHUP asks for a reload; SIGTERM, SIGINT and SIGQUIT ask for a stop.
//! SIGKILL also classifies as a stop, but the kernel never delivers it to the
//! process, so in practice it ends the process without the supervisor seeing it.

use super::control::{SignalEvent, SupervisorHandle};
use crate::error::Result;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Operating-system signals the panel reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsSignal {
    /// SIGHUP.
    Hangup,
    /// SIGTERM.
    Terminate,
    /// SIGINT.
    Interrupt,
    /// SIGQUIT.
    Quit,
    /// SIGKILL. Not interceptable.
    Kill,
}

impl OsSignal {
    /// Conventional signal name.
    pub fn name(&self) -> &'static str {
        match self {
            OsSignal::Hangup => "SIGHUP",
            OsSignal::Terminate => "SIGTERM",
            OsSignal::Interrupt => "SIGINT",
            OsSignal::Quit => "SIGQUIT",
            OsSignal::Kill => "SIGKILL",
        }
    }
}

/// Maps a signal onto the two-way reload/terminate classification.
pub fn classify(signal: OsSignal) -> SignalEvent {
    match signal {
        OsSignal::Hangup => SignalEvent::Reload,
        OsSignal::Terminate | OsSignal::Interrupt | OsSignal::Quit | OsSignal::Kill => {
            SignalEvent::Terminate
        }
    }
}

/// Installs signal handlers and spawns a task forwarding classified signals
/// to `handle` until the supervisor goes away.
///
/// Handlers are installed before this returns, so a signal arriving right
/// after is not lost.
#[cfg(unix)]
pub fn spawn_forwarder(handle: SupervisorHandle) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut quit = signal(SignalKind::quit())?;

    Ok(tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                _ = hangup.recv() => OsSignal::Hangup,
                _ = terminate.recv() => OsSignal::Terminate,
                _ = interrupt.recv() => OsSignal::Interrupt,
                _ = quit.recv() => OsSignal::Quit,
            };

            let event = classify(received);
            info!(signal = received.name(), event = %event, "Received signal");

            if handle.send(event).await.is_err() {
                debug!("Supervisor gone, signal forwarder exiting");
                break;
            }
        }
    }))
}

/// Installs a Ctrl-C handler and spawns a task forwarding it as a stop.
#[cfg(not(unix))]
pub fn spawn_forwarder(handle: SupervisorHandle) -> Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            info!(signal = OsSignal::Interrupt.name(), "Received signal");
            if handle.send(SignalEvent::Terminate).await.is_err() {
                debug!("Supervisor gone, signal forwarder exiting");
                break;
            }
        }
    }))
}

/// Serialises tests that deliver real signals to this process, since every
/// live forwarder sees every signal.
#[cfg(all(test, unix))]
pub(crate) static OS_SIGNAL_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Sends `signal` (e.g. `"-HUP"`) to this process.
#[cfg(all(test, unix))]
pub(crate) fn raise(signal: &str) {
    let status = std::process::Command::new("kill")
        .args([signal, &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success(), "kill {} failed", signal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hangup_reloads() {
        assert_eq!(classify(OsSignal::Hangup), SignalEvent::Reload);
    }

    #[test]
    fn test_everything_else_terminates() {
        for signal in [
            OsSignal::Terminate,
            OsSignal::Interrupt,
            OsSignal::Quit,
            OsSignal::Kill,
        ] {
            assert_eq!(classify(signal), SignalEvent::Terminate, "{}", signal.name());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_forwarder_delivers_os_signals() {
        use crate::supervisor::channel;
        use std::time::Duration;
        use tokio::time::timeout;

        let _guard = OS_SIGNAL_TEST_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let (handle, mut rx) = channel();
        let forwarder = spawn_forwarder(handle).unwrap();

        raise("-HUP");
        let event = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(event, Some(SignalEvent::Reload));

        raise("-TERM");
        let event = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(event, Some(SignalEvent::Terminate));

        forwarder.abort();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_forwarder_exits_when_supervisor_gone() {
        use crate::supervisor::channel;
        use std::time::Duration;
        use tokio::time::timeout;

        let _guard = OS_SIGNAL_TEST_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let (handle, rx) = channel();
        let forwarder = spawn_forwarder(handle).unwrap();
        drop(rx);

        raise("-HUP");
        timeout(Duration::from_secs(5), forwarder)
            .await
            .unwrap()
            .unwrap();
    }
}

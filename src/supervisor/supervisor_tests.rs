//! Tests for the lifecycle supervisor.

#[cfg(test)]
mod tests {
    use crate::error::{PanelError, Result};
    use crate::supervisor::{
        channel, ExitReason, InstanceState, ManagedService, ServiceFactory, SignalEvent,
        Supervisor, SupervisorHandle,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Created(usize),
        Started(usize),
        StartFailed(usize),
        Stopped(usize),
        Dropped(usize),
    }

    #[derive(Default)]
    struct Journal {
        events: Vec<Event>,
        running: usize,
        max_running: usize,
    }

    /// Per-instance behaviour, consumed in construction order.
    #[derive(Clone, Copy)]
    struct Script {
        start_ok: bool,
        stop_ok: bool,
    }

    const OK: Script = Script {
        start_ok: true,
        stop_ok: true,
    };

    struct FakeService {
        id: usize,
        script: Script,
        state: InstanceState,
        journal: Arc<Mutex<Journal>>,
    }

    impl FakeService {
        fn log(&self, event: Event) {
            self.journal.lock().unwrap().events.push(event);
        }
    }

    #[async_trait]
    impl ManagedService for FakeService {
        fn state(&self) -> InstanceState {
            self.state
        }

        async fn start(&mut self) -> Result<()> {
            assert_eq!(self.state, InstanceState::Constructed, "instance reused");
            if !self.script.start_ok {
                self.log(Event::StartFailed(self.id));
                return Err(PanelError::service("start", "address already in use"));
            }
            {
                let mut journal = self.journal.lock().unwrap();
                journal.running += 1;
                journal.max_running = journal.max_running.max(journal.running);
                journal.events.push(Event::Started(self.id));
            }
            self.state = InstanceState::Running;
            Ok(())
        }

        async fn stop(&mut self) -> Result<()> {
            if self.state == InstanceState::Running {
                self.journal.lock().unwrap().running -= 1;
            }
            self.state = InstanceState::Stopped;
            self.log(Event::Stopped(self.id));
            if self.script.stop_ok {
                Ok(())
            } else {
                Err(PanelError::service("stop", "listener already closed"))
            }
        }
    }

    impl Drop for FakeService {
        fn drop(&mut self) {
            if let Ok(mut journal) = self.journal.lock() {
                journal.events.push(Event::Dropped(self.id));
            }
        }
    }

    struct FakeFactory {
        next_id: usize,
        scripts: VecDeque<Script>,
        journal: Arc<Mutex<Journal>>,
    }

    impl ServiceFactory for FakeFactory {
        type Service = FakeService;

        fn create(&mut self) -> FakeService {
            let id = self.next_id;
            self.next_id += 1;
            self.journal.lock().unwrap().events.push(Event::Created(id));
            FakeService {
                id,
                script: self.scripts.pop_front().unwrap_or(OK),
                state: InstanceState::Constructed,
                journal: Arc::clone(&self.journal),
            }
        }
    }

    fn setup(
        scripts: Vec<Script>,
    ) -> (Supervisor<FakeFactory>, SupervisorHandle, Arc<Mutex<Journal>>) {
        let journal = Arc::new(Mutex::new(Journal::default()));
        let factory = FakeFactory {
            next_id: 0,
            scripts: scripts.into(),
            journal: Arc::clone(&journal),
        };
        let (handle, events) = channel();
        (Supervisor::new(factory, events), handle, journal)
    }

    fn position(events: &[Event], wanted: Event) -> usize {
        events
            .iter()
            .position(|e| *e == wanted)
            .unwrap_or_else(|| panic!("{:?} not found in {:?}", wanted, events))
    }

    #[tokio::test]
    async fn test_start_then_terminate() {
        let (supervisor, handle, journal) = setup(vec![]);
        handle.send(SignalEvent::Terminate).await.unwrap();

        let exit = supervisor.run().await.unwrap();

        assert_eq!(exit.reason, ExitReason::Terminated);
        assert_eq!(exit.reloads, 0);
        let journal = journal.lock().unwrap();
        assert_eq!(
            journal.events,
            vec![
                Event::Created(0),
                Event::Started(0),
                Event::Stopped(0),
                Event::Dropped(0)
            ]
        );
        assert_eq!(journal.running, 0);
    }

    #[tokio::test]
    async fn test_reload_stops_before_starting_replacement() {
        let (supervisor, handle, journal) = setup(vec![]);
        handle.send(SignalEvent::Reload).await.unwrap();
        handle.send(SignalEvent::Terminate).await.unwrap();

        let exit = supervisor.run().await.unwrap();

        assert_eq!(exit.reloads, 1);
        let journal = journal.lock().unwrap();
        let events = &journal.events;
        assert!(position(events, Event::Stopped(0)) < position(events, Event::Started(1)));
        assert!(position(events, Event::Dropped(0)) < position(events, Event::Created(1)));
        assert!(position(events, Event::Stopped(1)) < position(events, Event::Dropped(1)));
        assert_eq!(journal.max_running, 1);
        assert_eq!(journal.running, 0);
    }

    #[tokio::test]
    async fn test_many_reloads_keep_single_instance() {
        let (supervisor, handle, journal) = setup(vec![]);
        for _ in 0..5 {
            handle.send(SignalEvent::Reload).await.unwrap();
        }
        handle.send(SignalEvent::Terminate).await.unwrap();

        let exit = supervisor.run().await.unwrap();

        assert_eq!(exit.reloads, 5);
        let journal = journal.lock().unwrap();
        assert_eq!(journal.max_running, 1);
        let started = journal
            .events
            .iter()
            .filter(|e| matches!(e, Event::Started(_)))
            .count();
        assert_eq!(started, 6);
    }

    #[tokio::test]
    async fn test_initial_start_failure_skips_signal_wait() {
        let (supervisor, handle, journal) = setup(vec![Script {
            start_ok: false,
            stop_ok: true,
        }]);

        // The handle stays alive, so waiting for a signal would hang.
        let result = tokio::time::timeout(Duration::from_secs(5), supervisor.run())
            .await
            .expect("supervisor waited for signals after a failed start");

        assert!(matches!(result, Err(PanelError::Service { .. })));
        let journal = journal.lock().unwrap();
        assert_eq!(
            journal.events,
            vec![Event::Created(0), Event::StartFailed(0), Event::Dropped(0)]
        );
        drop(handle);
    }

    #[tokio::test]
    async fn test_reload_stop_failure_still_restarts_once() {
        let (supervisor, handle, journal) = setup(vec![
            Script {
                start_ok: true,
                stop_ok: false,
            },
            OK,
        ]);
        handle.send(SignalEvent::Reload).await.unwrap();
        handle.send(SignalEvent::Terminate).await.unwrap();

        let exit = supervisor.run().await.unwrap();

        assert_eq!(exit.reloads, 1);
        let journal = journal.lock().unwrap();
        let created = journal
            .events
            .iter()
            .filter(|e| matches!(e, Event::Created(_)))
            .count();
        assert_eq!(created, 2);
        assert!(journal.events.contains(&Event::Started(1)));
        assert!(journal.events.contains(&Event::Stopped(1)));
    }

    #[tokio::test]
    async fn test_restart_failure_ends_supervision() {
        let (supervisor, handle, journal) = setup(vec![
            OK,
            Script {
                start_ok: false,
                stop_ok: true,
            },
        ]);
        handle.send(SignalEvent::Reload).await.unwrap();
        handle.send(SignalEvent::Reload).await.unwrap();
        handle.send(SignalEvent::Terminate).await.unwrap();

        let result = supervisor.run().await;

        assert!(result.is_err());
        let journal = journal.lock().unwrap();
        assert_eq!(
            journal.events,
            vec![
                Event::Created(0),
                Event::Started(0),
                Event::Stopped(0),
                Event::Dropped(0),
                Event::Created(1),
                Event::StartFailed(1),
                Event::Dropped(1),
            ]
        );
        assert_eq!(journal.running, 0);
    }

    #[tokio::test]
    async fn test_closed_channel_stops_instance() {
        let (supervisor, handle, journal) = setup(vec![]);
        drop(handle);

        let exit = supervisor.run().await.unwrap();

        assert_eq!(exit.reason, ExitReason::ChannelClosed);
        assert!(journal.lock().unwrap().events.contains(&Event::Stopped(0)));
    }

    #[tokio::test]
    async fn test_terminate_ignores_stop_failure() {
        let (supervisor, handle, _journal) = setup(vec![Script {
            start_ok: true,
            stop_ok: false,
        }]);
        handle.send(SignalEvent::Terminate).await.unwrap();

        let exit = supervisor.run().await.unwrap();
        assert_eq!(exit.reason, ExitReason::Terminated);
    }

    #[tokio::test]
    async fn test_signal_sent_while_running() {
        let (supervisor, handle, journal) = setup(vec![]);
        let task = tokio::spawn(async move {
            tokio::task::yield_now().await;
            handle.request_reload().await.unwrap();
            handle.request_stop().await.unwrap();
        });

        let exit = supervisor.run().await.unwrap();
        task.await.unwrap();

        assert_eq!(exit.reloads, 1);
        assert_eq!(journal.lock().unwrap().max_running, 1);
    }
}

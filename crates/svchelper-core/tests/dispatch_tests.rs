//! Integration tests for the dispatch loop

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use svchelper_core::{
    Accepted, ChangeRequest, Cmd, Dispatcher, Error, EventLog, ExitCode, Result, Service,
    ServiceConfig, State, Status, StatusSink, StatusTracker, TaskGroup,
};
use tokio::sync::mpsc;

/// Records every status and log entry
#[derive(Clone, Default)]
struct Journal {
    states: Arc<Mutex<Vec<State>>>,
    entries: Arc<Mutex<Vec<(String, String)>>>,
    refused: Arc<Mutex<Option<State>>>,
}

impl Journal {
    /// Make every report of `state` fail after it is recorded
    fn refuse(&self, state: State) {
        *self.refused.lock() = Some(state);
    }

    fn states(&self) -> Vec<State> {
        self.states.lock().clone()
    }

    fn has_entry(&self, level: &str, msg: &str) -> bool {
        self.entries.lock().iter().any(|(l, m)| l == level && m == msg)
    }
}

impl StatusSink for Journal {
    fn set_status(&self, status: &Status) -> Result<()> {
        self.states.lock().push(status.state);
        if *self.refused.lock() == Some(status.state) {
            return Err(Error::StatusReport("refused".into()));
        }
        Ok(())
    }
}

impl EventLog for Journal {
    fn info(&self, _eid: u32, msg: &str) -> Result<()> {
        self.entries.lock().push(("info".into(), msg.into()));
        Ok(())
    }

    fn warning(&self, _eid: u32, msg: &str) -> Result<()> {
        self.entries.lock().push(("warning".into(), msg.into()));
        Ok(())
    }

    fn error(&self, _eid: u32, msg: &str) -> Result<()> {
        self.entries.lock().push(("error".into(), msg.into()));
        Ok(())
    }
}

/// Waits for cancellation, then takes a while to wind down
#[derive(Default)]
struct SlowStop {
    finished: Arc<AtomicBool>,
    pauses: Arc<AtomicUsize>,
    resumes: Arc<AtomicUsize>,
}

impl Service for SlowStop {
    fn schedule(&self, tasks: &TaskGroup) -> anyhow::Result<()> {
        let token = tasks.token();
        let finished = self.finished.clone();
        tasks.spawn("slow", async move {
            token.cancelled().await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            finished.store(true, Ordering::SeqCst);
            Ok(())
        });
        Ok(())
    }

    fn pause(&self) -> anyhow::Result<()> {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&self) -> anyhow::Result<()> {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Ends its own execution right away
struct OneShot;

impl Service for OneShot {
    fn schedule(&self, tasks: &TaskGroup) -> anyhow::Result<()> {
        let token = tasks.token();
        tasks.spawn("one-shot", async move {
            token.cancel();
            Ok(())
        });
        Ok(())
    }
}

/// Pause and continue hooks that can be made to fail
#[derive(Default)]
struct Hooks {
    fail_pause: bool,
    fail_resume: bool,
}

impl Service for Hooks {
    fn schedule(&self, tasks: &TaskGroup) -> anyhow::Result<()> {
        let token = tasks.token();
        tasks.spawn("hooks", async move {
            token.cancelled().await;
            Ok(())
        });
        Ok(())
    }

    fn pause(&self) -> anyhow::Result<()> {
        if self.fail_pause {
            anyhow::bail!("device busy");
        }
        Ok(())
    }

    fn resume(&self) -> anyhow::Result<()> {
        if self.fail_resume {
            anyhow::bail!("device gone");
        }
        Ok(())
    }
}

/// Fails once it is asked to stop
struct BrokenOnStop;

impl Service for BrokenOnStop {
    fn schedule(&self, tasks: &TaskGroup) -> anyhow::Result<()> {
        let token = tasks.token();
        tasks.spawn("flush", async move {
            token.cancelled().await;
            Err(anyhow::anyhow!("disk full"))
        });
        Ok(())
    }
}

fn pausable() -> ServiceConfig {
    let mut config = ServiceConfig::new("svc", "", "", false);
    config.accept_pause_continue = true;
    config
}

fn setup(
    service: Arc<dyn Service>,
    config: ServiceConfig,
) -> (Dispatcher, StatusTracker, Journal) {
    let journal = Journal::default();
    let dispatcher = Dispatcher::new(service, Arc::new(config), Arc::new(journal.clone()));
    let tracker = StatusTracker::new(Box::new(journal.clone()));
    (dispatcher, tracker, journal)
}

fn request(cmd: Cmd) -> ChangeRequest {
    ChangeRequest {
        cmd,
        current_status: Status::running(Accepted::STOP | Accepted::SHUTDOWN),
    }
}

#[tokio::test]
async fn test_stop_waits_for_tasks() {
    let service = Arc::new(SlowStop::default());
    let finished = service.finished.clone();
    let (dispatcher, tracker, journal) = setup(service, ServiceConfig::new("svc", "", "", false));
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Stop)).unwrap();

    let args = vec!["svc".to_string(), "is".to_string(), "manual-started".to_string()];
    let code = dispatcher.execute(&args, rx, &tracker).await;

    assert_eq!(code, ExitCode::SUCCESS);
    assert!(finished.load(Ordering::SeqCst));
    assert_eq!(
        journal.states(),
        vec![State::StartPending, State::Running, State::StopPending]
    );
    assert!(journal.has_entry("info", "svc-is-manual-started-Stop"));
}

#[tokio::test]
async fn test_shutdown_stops_like_stop() {
    let (dispatcher, tracker, journal) = setup(
        Arc::new(SlowStop::default()),
        ServiceConfig::new("svc", "", "", false),
    );
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Shutdown)).unwrap();

    let code = dispatcher.execute(&[], rx, &tracker).await;

    assert!(code.is_success());
    assert_eq!(journal.states().last(), Some(&State::StopPending));
}

#[tokio::test]
async fn test_service_cancelling_itself() {
    let (dispatcher, tracker, journal) =
        setup(Arc::new(OneShot), ServiceConfig::new("svc", "", "", false));
    let (_tx, rx) = mpsc::unbounded_channel();

    let code = tokio::time::timeout(Duration::from_secs(5), dispatcher.execute(&[], rx, &tracker))
        .await
        .expect("execute did not return");

    assert!(code.is_success());
    assert!(journal.has_entry("info", "The wrapped service cancelled the execution"));
    assert_eq!(
        journal.states(),
        vec![State::StartPending, State::Running, State::StopPending]
    );
}

#[tokio::test]
async fn test_interrogate_reports_current_status() {
    let (dispatcher, tracker, journal) = setup(
        Arc::new(SlowStop::default()),
        ServiceConfig::new("svc", "", "", false),
    );
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Interrogate)).unwrap();
    tx.send(request(Cmd::Stop)).unwrap();

    dispatcher.execute(&[], rx, &tracker).await;

    assert_eq!(
        journal.states(),
        vec![State::StartPending, State::Running, State::Running, State::StopPending]
    );
}

#[tokio::test]
async fn test_closed_channel_stops_service() {
    let service = Arc::new(SlowStop::default());
    let finished = service.finished.clone();
    let (dispatcher, tracker, _journal) = setup(service, ServiceConfig::new("svc", "", "", false));
    let (tx, rx) = mpsc::unbounded_channel::<ChangeRequest>();
    drop(tx);

    let code = dispatcher.execute(&[], rx, &tracker).await;

    assert!(code.is_success());
    assert!(finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_pause_and_continue_when_accepted() {
    let service = Arc::new(SlowStop::default());
    let pauses = service.pauses.clone();
    let resumes = service.resumes.clone();
    let mut config = ServiceConfig::new("svc", "", "", false);
    config.accept_pause_continue = true;
    let (dispatcher, tracker, journal) = setup(service, config);
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Pause)).unwrap();
    tx.send(request(Cmd::Continue)).unwrap();
    tx.send(request(Cmd::Stop)).unwrap();

    dispatcher.execute(&[], rx, &tracker).await;

    assert_eq!(pauses.load(Ordering::SeqCst), 1);
    assert_eq!(resumes.load(Ordering::SeqCst), 1);
    assert_eq!(
        journal.states(),
        vec![
            State::StartPending,
            State::Running,
            State::PausePending,
            State::Paused,
            State::ContinuePending,
            State::Running,
            State::StopPending,
        ]
    );
}

#[tokio::test]
async fn test_pause_rejected_when_not_accepted() {
    let service = Arc::new(SlowStop::default());
    let pauses = service.pauses.clone();
    let (dispatcher, tracker, journal) = setup(service, ServiceConfig::new("svc", "", "", false));
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Pause)).unwrap();
    tx.send(request(Cmd::Stop)).unwrap();

    dispatcher.execute(&[], rx, &tracker).await;

    assert_eq!(pauses.load(Ordering::SeqCst), 0);
    assert!(journal.has_entry("error", "unexpected control request #Pause"));
    assert!(!journal.states().contains(&State::Paused));
}

#[tokio::test]
async fn test_running_accepts_configured_controls() {
    let mut config = ServiceConfig::new("svc", "", "", false);
    config.accept_pause_continue = true;
    let (dispatcher, tracker, _journal) = setup(Arc::new(SlowStop::default()), config);
    let (tx, rx) = mpsc::unbounded_channel();
    let observed = Arc::new(Mutex::new(None));

    let run = dispatcher.execute(&[], rx, &tracker);
    let probe = {
        let observed = observed.clone();
        let tracker = &tracker;
        async move {
            while tracker.current().state != State::Running {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            *observed.lock() = Some(tracker.current().accepts);
            tx.send(request(Cmd::Stop)).unwrap();
        }
    };
    tokio::join!(run, probe);

    assert_eq!(
        *observed.lock(),
        Some(Accepted::STOP | Accepted::SHUTDOWN | Accepted::PAUSE_CONTINUE)
    );
}

#[tokio::test]
async fn test_failed_pause_reverts_to_running() {
    let service = Arc::new(Hooks {
        fail_pause: true,
        ..Hooks::default()
    });
    let (dispatcher, tracker, journal) = setup(service, pausable());
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Pause)).unwrap();
    tx.send(request(Cmd::Stop)).unwrap();

    dispatcher.execute(&[], rx, &tracker).await;

    assert_eq!(
        journal.states(),
        vec![
            State::StartPending,
            State::Running,
            State::PausePending,
            State::Running,
            State::StopPending,
        ]
    );
    assert!(journal.has_entry("error", "pausing the service 'svc' failed: device busy"));
}

#[tokio::test]
async fn test_failed_continue_stays_paused() {
    let service = Arc::new(Hooks {
        fail_resume: true,
        ..Hooks::default()
    });
    let (dispatcher, tracker, journal) = setup(service, pausable());
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Pause)).unwrap();
    tx.send(request(Cmd::Continue)).unwrap();
    tx.send(request(Cmd::Stop)).unwrap();

    dispatcher.execute(&[], rx, &tracker).await;

    assert_eq!(
        journal.states(),
        vec![
            State::StartPending,
            State::Running,
            State::PausePending,
            State::Paused,
            State::ContinuePending,
            State::Paused,
            State::StopPending,
        ]
    );
    assert!(journal.has_entry("error", "continuing the service 'svc' failed: device gone"));
}

#[tokio::test]
async fn test_continue_while_running_reports_current_status() {
    let (dispatcher, tracker, journal) = setup(Arc::new(Hooks::default()), pausable());
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Continue)).unwrap();
    tx.send(request(Cmd::Stop)).unwrap();

    dispatcher.execute(&[], rx, &tracker).await;

    assert_eq!(
        journal.states(),
        vec![State::StartPending, State::Running, State::Running, State::StopPending]
    );
}

#[tokio::test]
async fn test_pause_while_paused_reports_current_status() {
    let (dispatcher, tracker, journal) = setup(Arc::new(Hooks::default()), pausable());
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Pause)).unwrap();
    tx.send(request(Cmd::Pause)).unwrap();
    tx.send(request(Cmd::Stop)).unwrap();

    dispatcher.execute(&[], rx, &tracker).await;

    assert_eq!(
        journal.states(),
        vec![
            State::StartPending,
            State::Running,
            State::PausePending,
            State::Paused,
            State::Paused,
            State::StopPending,
        ]
    );
}

#[tokio::test]
async fn test_refused_report_is_a_warning_and_loop_continues() {
    let (dispatcher, tracker, journal) = setup(Arc::new(Hooks::default()), pausable());
    journal.refuse(State::Running);
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Pause)).unwrap();
    tx.send(request(Cmd::Stop)).unwrap();

    let code = dispatcher.execute(&[], rx, &tracker).await;

    assert!(code.is_success());
    assert!(journal.has_entry(
        "warning",
        "reporting state Running failed: could not report service status: refused"
    ));
    // Pause starts from the refused Running report, never from StartPending
    assert_eq!(
        journal.states(),
        vec![
            State::StartPending,
            State::Running,
            State::PausePending,
            State::Paused,
            State::StopPending,
        ]
    );
}

#[tokio::test]
async fn test_task_failure_is_logged_at_join() {
    let (dispatcher, tracker, journal) = setup(
        Arc::new(BrokenOnStop),
        ServiceConfig::new("svc", "", "", false),
    );
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(request(Cmd::Stop)).unwrap();

    let code = dispatcher.execute(&[], rx, &tracker).await;

    assert!(code.is_success());
    assert!(journal.has_entry("warning", "task 'flush' failed: disk full"));
}

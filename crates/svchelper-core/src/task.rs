//! Wrapped task contract
//!
//! A [`Service`] schedules its work on a [`TaskGroup`]. The group owns the
//! cancellation token shared by every task and the handles needed to wait
//! for all of them before the service reports that it stopped.

use std::future::Future;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A long-running program that can be run as a service
pub trait Service: Send + Sync + 'static {
    /// Start the service's work on `tasks` and return
    ///
    /// Work must stop once the group's token is cancelled. Cancelling the
    /// group from inside a task ends the service.
    fn schedule(&self, tasks: &TaskGroup) -> anyhow::Result<()>;

    /// Called when the service is paused
    fn pause(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when a paused service continues
    fn resume(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A task that finished with an error or panicked
#[derive(Debug)]
pub struct TaskFailure {
    /// Name given at spawn time
    pub name: String,
    /// Error or panic message
    pub message: String,
}

/// Tasks of one service run, sharing a cancellation token
pub struct TaskGroup {
    token: CancellationToken,
    handle: Handle,
    tasks: Mutex<Vec<(String, JoinHandle<anyhow::Result<()>>)>>,
}

impl TaskGroup {
    /// Create a group spawning on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    /// Create a group spawning on the given runtime
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            token: CancellationToken::new(),
            handle,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Token cancelled when the service must stop
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request every task to stop
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the group was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the group is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Spawn an async task
    pub fn spawn<F>(&self, name: impl Into<String>, future: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        debug!(task = %name, "Spawning task");
        let handle = self.handle.spawn(future);
        self.tasks.lock().push((name, handle));
    }

    /// Spawn a blocking task on a dedicated thread
    ///
    /// The closure receives the group's token and must return once it is
    /// cancelled.
    pub fn spawn_blocking<F>(&self, name: impl Into<String>, work: F)
    where
        F: FnOnce(CancellationToken) -> anyhow::Result<()> + Send + 'static,
    {
        let name = name.into();
        debug!(task = %name, "Spawning blocking task");
        let token = self.token();
        let handle = self.handle.spawn_blocking(move || work(token));
        self.tasks.lock().push((name, handle));
    }

    /// Number of tasks not yet waited for
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Whether no task is pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until every spawned task finished
    ///
    /// Tasks spawned while waiting are waited for as well.
    pub async fn wait(&self) -> Vec<TaskFailure> {
        let mut failures = Vec::new();
        loop {
            let pending = std::mem::take(&mut *self.tasks.lock());
            if pending.is_empty() {
                return failures;
            }
            for (name, handle) in pending {
                let message = match handle.await {
                    Ok(Ok(())) => {
                        debug!(task = %name, "Task finished");
                        continue;
                    }
                    Ok(Err(e)) => format!("{e:#}"),
                    Err(e) if e.is_panic() => "task panicked".to_string(),
                    Err(e) => e.to_string(),
                };
                failures.push(TaskFailure { name, message });
            }
        }
    }
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new()
    }
}

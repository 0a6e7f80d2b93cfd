//! Supervised background tasks with an explicit stop.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Handle to a spawned background task.
///
/// The task receives a [`CancellationToken`] and is expected to return
/// promptly once it is cancelled. Dropping the handle leaves the task running.
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `task` onto the current tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let join = tokio::spawn(task(cancel.clone()));
        debug!(task = name, "spawned background task");
        Self { name, cancel, join }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the task has returned.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Request cancellation and wait for the task to return.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        match self.join.await {
            Ok(()) => debug!(task = self.name, "background task stopped"),
            Err(e) => warn!(task = self.name, error = %e, "background task failed"),
        }
    }
}

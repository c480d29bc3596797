//! Background invocation handle.

use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::{CommandResult, HarnessError};

/// Handle to an invocation running on its own task.
///
/// The handle has a single owner: [`wait`](BackgroundTask::wait) consumes it,
/// so the result can be collected exactly once. Dropping the handle detaches
/// the task; it keeps running until its context is cancelled or the run ends.
#[derive(Debug)]
#[must_use = "a background invocation should be waited on"]
pub struct BackgroundTask {
    handle: JoinHandle<CommandResult>,
}

impl BackgroundTask {
    pub(crate) fn new(handle: JoinHandle<CommandResult>) -> Self {
        Self { handle }
    }

    /// Check whether the run has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run to finish and return its terminal error.
    pub async fn wait(self) -> CommandResult {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "background invocation did not complete");
                Err(HarnessError::TaskFailed(e.to_string()).into())
            }
        }
    }
}

use std::time::Duration;
use tokio::task::JoinHandle;

/// A one-shot callback run after a delay on the tokio runtime
///
/// Cancelling aborts the pending sleep. A callback that already ran cannot be
/// recalled, so receivers must still check whether its effect is wanted.
#[derive(Debug)]
pub struct ScheduledCallback {
    task: JoinHandle<()>,
}

impl ScheduledCallback {
    pub fn schedule<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        Self { task }
    }

    pub fn cancel(self) {
        self.task.abort();
    }
}

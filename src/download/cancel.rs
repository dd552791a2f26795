//! Cooperative cancellation for in-progress batch runs.
//!
//! A [`CancellationToken`] is a cloneable flag shared between the engine and
//! whoever requests shutdown (typically a Ctrl-C handler). Once cancelled it
//! stays cancelled: queued jobs are skipped and in-flight transfers are
//! aborted at the next await point.

use tokio::sync::watch;

/// Shared flag that signals a batch run to stop.
///
/// Cloning the token is cheap; all clones observe the same state. The token
/// starts out not-cancelled and [`cancel`](CancellationToken::cancel) is a
/// one-way transition.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: watch::Sender<bool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self { sender }
    }

    /// Requests cancellation. Idempotent; wakes every task waiting in
    /// [`cancelled`](CancellationToken::cancelled).
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves when cancellation is requested. Returns immediately if the
    /// token is already cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // wait_for checks the current value before awaiting changes, so a
        // cancel() that raced with subscribe() is not missed. The sender
        // lives inside self, so the channel cannot close while we wait.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

//! One-shot delivery of the run outcome back to whoever started it.

use tokio::sync::oneshot;
use tracing::warn;

use super::UploadOutcome;

/// Create a connected notifier / handle pair.
pub fn channel() -> (Notifier, CompletionHandle) {
    let (tx, rx) = oneshot::channel();
    (
        Notifier { tx },
        CompletionHandle {
            rx,
            received: None,
        },
    )
}

/// Worker side. Consumed by [`Notifier::notify`], so it fires at most once.
#[derive(Debug)]
pub struct Notifier {
    tx: oneshot::Sender<UploadOutcome>,
}

impl Notifier {
    pub fn notify(self, outcome: UploadOutcome) {
        if self.tx.send(outcome).is_err() {
            warn!(%outcome, "completion handle dropped before outcome was delivered");
        }
    }
}

/// Initiator side.
///
/// A worker that goes away without notifying (panic, runtime shutdown)
/// resolves as [`UploadOutcome::Exception`], so every run yields one outcome.
#[derive(Debug)]
pub struct CompletionHandle {
    rx: oneshot::Receiver<UploadOutcome>,
    // Set once `try_outcome` has handed the outcome out.
    received: Option<UploadOutcome>,
}

impl CompletionHandle {
    pub async fn outcome(self) -> UploadOutcome {
        if let Some(outcome) = self.received {
            return outcome;
        }
        self.rx.await.unwrap_or_else(|_| {
            warn!("upload worker ended without reporting an outcome");
            UploadOutcome::Exception
        })
    }

    /// Block the current thread until the outcome arrives. Must not be called
    /// from inside an async runtime.
    pub fn wait_blocking(self) -> UploadOutcome {
        if let Some(outcome) = self.received {
            return outcome;
        }
        self.rx.blocking_recv().unwrap_or_else(|_| {
            warn!("upload worker ended without reporting an outcome");
            UploadOutcome::Exception
        })
    }

    /// Non-blocking poll. `None` while the run is still in flight, and on
    /// every call after the outcome has been returned once.
    pub fn try_outcome(&mut self) -> Option<UploadOutcome> {
        if self.received.is_some() {
            return None;
        }
        let outcome = match self.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => UploadOutcome::Exception,
        };
        self.received = Some(outcome);
        Some(outcome)
    }
}

// Supervisor Stop Channel
//
// Signal listeners only publish here; teardown runs on the control flow.

use tokio::sync::watch;

/// Why supervision is being stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// Programmatic stop
    Requested,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Interrupt => write!(f, "interrupt"),
            StopReason::Terminate => write!(f, "terminate"),
            StopReason::Requested => write!(f, "requested"),
        }
    }
}

/// Receiving side of the stop channel
#[derive(Clone)]
pub struct StopToken {
    rx: watch::Receiver<Option<StopReason>>,
}

impl StopToken {
    /// Stop reason if a stop was requested
    pub fn reason(&self) -> Option<StopReason> {
        *self.rx.borrow()
    }

    /// Check if stop was requested
    pub fn is_stopped(&self) -> bool {
        self.reason().is_some()
    }

    /// Wait for a stop request
    ///
    /// Pends forever if every sender is gone without requesting a stop.
    pub async fn wait(&mut self) -> StopReason {
        loop {
            if let Some(reason) = *self.rx.borrow_and_update() {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Sending side of the stop channel
#[derive(Clone)]
pub struct StopSender {
    tx: watch::Sender<Option<StopReason>>,
}

impl StopSender {
    /// Request a stop; the first reason wins
    pub fn request(&self, reason: StopReason) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }
}

/// Create a stop channel
pub fn stop_channel() -> (StopSender, StopToken) {
    let (tx, rx) = watch::channel(None);
    (StopSender { tx }, StopToken { rx })
}

// Shutdown Coordinator - single-shot teardown shared by every exit path
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::registry::ProcessRegistry;
use crate::domain::{HandleId, StopOutcome};

/// One termination attempt made during teardown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopAttempt {
    pub id: HandleId,
    pub service: String,
    pub pid: Option<u32>,
    pub outcome: StopOutcome,
}

/// Everything the teardown did, in registry order
#[derive(Debug, Clone, Default)]
pub struct ShutdownReport {
    pub attempts: Vec<StopAttempt>,
}

impl ShutdownReport {
    /// Number of stop signals actually delivered
    pub fn stop_requests(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome == StopOutcome::StopRequested)
            .count()
    }
}

/// Terminates every still-registered handle, exactly once per coordinator
///
/// Trigger paths:
/// 1. Supervisor loop fall-through (registry empty)
/// 2. Stop request from a signal listener, handled by the supervisor loop
/// 3. [`ShutdownGuard`] dropped at program exit, including panic unwind
pub struct ShutdownCoordinator {
    registry: ProcessRegistry,
    done: AtomicBool,
}

impl ShutdownCoordinator {
    pub fn new(registry: ProcessRegistry) -> Self {
        Self {
            registry,
            done: AtomicBool::new(false),
        }
    }

    /// Run teardown if no one has yet
    ///
    /// Returns `None` for every call after the first, concurrent or not.
    /// Sends a graceful stop to each live handle without waiting for it to exit,
    /// and never escalates to a forced kill.
    pub fn shutdown(&self) -> Option<ShutdownReport> {
        if self
            .done
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Shutdown already performed, skipping");
            return None;
        }

        let handles = self.registry.snapshot();
        info!(tracked = handles.len(), "Cleaning up processes...");

        let mut report = ShutdownReport::default();
        for handle in handles {
            let outcome = handle.request_stop();
            match &outcome {
                StopOutcome::StopRequested => info!(
                    service = %handle.name(),
                    pid = ?handle.pid(),
                    "Terminated process (stop requested)"
                ),
                StopOutcome::AlreadyExited(code) => info!(
                    service = %handle.name(),
                    pid = ?handle.pid(),
                    exit_code = ?code,
                    "Process had already exited"
                ),
                StopOutcome::Failed(reason) => warn!(
                    service = %handle.name(),
                    pid = ?handle.pid(),
                    error = %reason,
                    "Error terminating process"
                ),
            }

            self.registry.remove(handle.id());
            report.attempts.push(StopAttempt {
                id: handle.id(),
                service: handle.name().to_string(),
                pid: handle.pid(),
                outcome,
            });
        }

        info!(
            stop_requests = report.stop_requests(),
            "Cleanup complete"
        );
        Some(report)
    }

    /// Check if teardown already ran
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Guard that runs teardown when dropped
    pub fn guard(self: &Arc<Self>) -> ShutdownGuard {
        ShutdownGuard {
            coordinator: Arc::clone(self),
        }
    }
}

/// Runs [`ShutdownCoordinator::shutdown`] on drop
///
/// Held by the entry point so that any exit path, including a panic unwind,
/// still reaches teardown.
pub struct ShutdownGuard {
    coordinator: Arc<ShutdownCoordinator>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            warn!("Unwinding after panic, running shutdown");
        }
        self.coordinator.shutdown();
    }
}

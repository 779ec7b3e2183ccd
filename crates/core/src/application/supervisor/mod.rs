// Supervisor - liveness polling loop

pub mod constants;
mod coordinator;
mod shutdown;

pub use coordinator::{ShutdownCoordinator, ShutdownGuard, ShutdownReport, StopAttempt};
pub use shutdown::{stop_channel, StopReason, StopSender, StopToken};

use crate::application::registry::ProcessRegistry;
use crate::domain::{ExitState, HandleId};
use crate::port::TimeProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// How the supervisor loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// Every child exited on its own
    AllExited,
    /// A stop was requested (signal or explicit)
    Stopped(StopReason),
}

/// Exit observed during a sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitRecord {
    pub id: HandleId,
    pub service: String,
    pub pid: Option<u32>,
    pub exit_code: Option<i32>,
    pub uptime_ms: i64,
}

/// Supervisor polls registered children until none are left or a stop arrives
pub struct Supervisor {
    registry: ProcessRegistry,
    coordinator: Arc<ShutdownCoordinator>,
    time_provider: Arc<dyn TimeProvider>,
    tick: Duration,
}

impl Supervisor {
    /// Create a new supervisor
    ///
    /// # Arguments
    /// * `registry` - Handles to watch (shared with the launcher and coordinator)
    /// * `coordinator` - Teardown invoked when the loop ends
    /// * `time_provider` - Clock for uptime reporting
    /// * `tick` - Delay between polls (default: 1s, at least 1ms)
    pub fn new(
        registry: ProcessRegistry,
        coordinator: Arc<ShutdownCoordinator>,
        time_provider: Arc<dyn TimeProvider>,
        tick: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            coordinator,
            time_provider,
            tick: tick
                .unwrap_or(constants::DEFAULT_TICK_INTERVAL)
                .max(constants::MIN_TICK_INTERVAL),
        }
    }

    /// Run until the registry empties or `stop` fires, then run teardown
    ///
    /// The wait between polls is raced against the stop channel, so a stop
    /// request takes effect immediately.
    pub async fn run(&self, mut stop: StopToken) -> SupervisorExit {
        info!(
            tracked = self.registry.len(),
            tick_ms = self.tick.as_millis() as u64,
            "Supervisor started"
        );

        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let exit = loop {
            if let Some(reason) = stop.reason() {
                break SupervisorExit::Stopped(reason);
            }

            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                    if self.registry.is_empty() {
                        info!("All processes have terminated. Exiting.");
                        break SupervisorExit::AllExited;
                    }
                }
                reason = stop.wait() => {
                    info!(reason = %reason, "Received signal to terminate. Shutting down...");
                    break SupervisorExit::Stopped(reason);
                }
            }
        };

        self.coordinator.shutdown();
        info!(exit = ?exit, "Supervisor stopped");
        exit
    }

    /// Poll every tracked handle once and drop the ones that exited
    pub fn sweep(&self) -> Vec<ExitRecord> {
        let mut exited = Vec::new();

        for handle in self.registry.snapshot() {
            let exit_code = match handle.poll() {
                Ok(ExitState::Running) => continue,
                Ok(ExitState::Exited(code)) => code,
                Err(e) => {
                    warn!(
                        service = %handle.name(),
                        pid = ?handle.pid(),
                        error = %e,
                        "Status query failed, treating process as exited"
                    );
                    None
                }
            };

            // A concurrent teardown may already have removed and reported it
            if self.registry.remove(handle.id()).is_none() {
                continue;
            }

            let uptime_ms = self.time_provider.now_millis() - handle.started_at_ms();
            info!(
                service = %handle.name(),
                pid = ?handle.pid(),
                exit_code = ?exit_code,
                uptime_ms = uptime_ms,
                "Process exited"
            );
            exited.push(ExitRecord {
                id: handle.id(),
                service: handle.name().to_string(),
                pid: handle.pid(),
                exit_code,
                uptime_ms,
            });
        }

        exited
    }
}

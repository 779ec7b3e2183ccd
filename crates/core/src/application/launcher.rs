// Service launcher - spawn, wrap and register each configured service
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::application::registry::{ProcessHandle, ProcessRegistry};
use crate::application::supervisor::StopToken;
use crate::domain::CommandSpec;
use crate::port::{LaunchError, ProcessLauncher, TimeProvider};

/// Result of launching a whole service list
#[derive(Debug, Default)]
pub struct LaunchSummary {
    /// Started handles, in launch order
    pub started: Vec<Arc<ProcessHandle>>,
    /// Services whose spawn failed
    pub failed: Vec<LaunchError>,
    /// Services not attempted because a stop arrived first
    pub skipped: Vec<String>,
}

impl LaunchSummary {
    pub fn all_started(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Launches services through a [`ProcessLauncher`] and registers their handles
pub struct ServiceLauncher {
    launcher: Arc<dyn ProcessLauncher>,
    registry: ProcessRegistry,
    time_provider: Arc<dyn TimeProvider>,
    stagger: Duration,
}

impl ServiceLauncher {
    /// Create a new service launcher
    ///
    /// # Arguments
    /// * `launcher` - Process spawning adapter
    /// * `registry` - Registry that receives every started handle
    /// * `time_provider` - Clock used for start timestamps
    /// * `stagger` - Pause after each launch before starting the next one
    pub fn new(
        launcher: Arc<dyn ProcessLauncher>,
        registry: ProcessRegistry,
        time_provider: Arc<dyn TimeProvider>,
        stagger: Duration,
    ) -> Self {
        Self {
            launcher,
            registry,
            time_provider,
            stagger,
        }
    }

    /// Spawn one service and register it
    ///
    /// # Errors
    /// - LaunchError if the OS refuses the spawn; the registry is left unchanged
    pub async fn launch(&self, spec: &CommandSpec) -> Result<Arc<ProcessHandle>, LaunchError> {
        let child = self.launcher.spawn(spec).await?;

        let handle = Arc::new(ProcessHandle::new(
            self.registry.next_id(),
            spec.clone(),
            child,
            self.time_provider.now_millis(),
        ));
        self.registry.add(Arc::clone(&handle));

        info!(
            service = %spec.name(),
            pid = ?handle.pid(),
            command = %spec.command(),
            "Started process"
        );
        if let Some(url) = spec.url() {
            info!(service = %spec.name(), url = %url, "Service starting at {}", url);
        }

        Ok(handle)
    }

    /// Launch every spec in order, each independently of the others' failures
    ///
    /// Stops early (recording the rest as skipped) once `stop` fires, including
    /// while waiting out the stagger delay.
    pub async fn launch_all(&self, specs: &[CommandSpec], stop: &StopToken) -> LaunchSummary {
        let mut stop = stop.clone();
        let mut summary = LaunchSummary::default();

        for (index, spec) in specs.iter().enumerate() {
            if stop.is_stopped() {
                warn!(service = %spec.name(), "Stop requested, not launching");
                summary.skipped.push(spec.name().to_string());
                continue;
            }

            match self.launch(spec).await {
                Ok(handle) => summary.started.push(handle),
                Err(e) => {
                    error!(service = %spec.name(), error = %e, "Error starting service");
                    summary.failed.push(e);
                }
            }

            // Pacing is the same whether or not the launch succeeded
            let is_last = index + 1 == specs.len();
            if !is_last && !self.stagger.is_zero() {
                tokio::select! {
                    _ = sleep(self.stagger) => {},
                    _ = stop.wait() => {}
                }
            }
        }

        info!(
            started = summary.started.len(),
            failed = summary.failed.len(),
            skipped = summary.skipped.len(),
            "Launch complete"
        );
        summary
    }
}

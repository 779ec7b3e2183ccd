// Detached launch policy - one host terminal session per service, no supervision
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

use crate::domain::CommandSpec;
use crate::port::{LaunchError, SessionOpener};

/// Result of opening every session
#[derive(Debug, Default)]
pub struct DetachedSummary {
    pub opened: Vec<String>,
    pub failed: Vec<LaunchError>,
}

/// Opens each service in its own interactive session
///
/// Nothing is tracked afterwards: the user stops a service by closing its window.
pub struct DetachedLauncher {
    opener: Arc<dyn SessionOpener>,
    stagger: Duration,
}

impl DetachedLauncher {
    pub fn new(opener: Arc<dyn SessionOpener>, stagger: Duration) -> Self {
        Self { opener, stagger }
    }

    /// Open a single detached session
    pub async fn open_detached(&self, spec: &CommandSpec) -> Result<(), LaunchError> {
        self.opener.open(spec).await?;
        info!(
            service = %spec.name(),
            working_dir = %spec.working_dir().display(),
            "Service starting in new terminal window"
        );
        Ok(())
    }

    /// Open every spec in order; a refused session does not stop the others
    pub async fn open_all(&self, specs: &[CommandSpec]) -> DetachedSummary {
        let mut summary = DetachedSummary::default();

        for (index, spec) in specs.iter().enumerate() {
            match self.open_detached(spec).await {
                Ok(()) => summary.opened.push(spec.name().to_string()),
                Err(e) => {
                    error!(service = %spec.name(), error = %e, "Error opening terminal session");
                    summary.failed.push(e);
                }
            }

            if index + 1 < specs.len() && !self.stagger.is_zero() {
                sleep(self.stagger).await;
            }
        }

        summary
    }
}

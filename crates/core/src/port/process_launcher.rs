// Process Launcher Port
// Abstraction for spawning a service command as an OS process

use crate::domain::CommandSpec;
use crate::port::ChildProcess;
use async_trait::async_trait;
use thiserror::Error;

/// Launch errors
///
/// Always local to one service: the remaining launches still run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Spawn failed for '{service}': {reason}")]
    SpawnFailed { service: String, reason: String },

    #[error("Working directory for '{service}' is unusable: {reason}")]
    WorkingDir { service: String, reason: String },

    #[error("Host refused to open a session for '{service}': {reason}")]
    SessionRefused { service: String, reason: String },
}

impl LaunchError {
    /// Name of the service the error belongs to
    pub fn service(&self) -> &str {
        match self {
            LaunchError::SpawnFailed { service, .. }
            | LaunchError::WorkingDir { service, .. }
            | LaunchError::SessionRefused { service, .. } => service,
        }
    }
}

/// Process Launcher trait
///
/// Implementations:
/// - ShellProcessLauncher: spawns `sh -c <command>` with captured output
/// - MockProcessLauncher: hands out scripted MockChild instances
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Spawn the service described by `spec`
    ///
    /// # Errors
    /// - LaunchError::WorkingDir if the OS rejects the working directory
    /// - LaunchError::SpawnFailed for any other spawn failure
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ChildProcess>, LaunchError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::child_process::mocks::{MockChild, MockChildProbe};
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// Mock launcher: every spawn succeeds unless the service name is marked failing
    pub struct MockProcessLauncher {
        failing: HashSet<String>,
        next_pid: Mutex<u32>,
        probes: Mutex<HashMap<String, Arc<MockChildProbe>>>,
        spawn_order: Mutex<Vec<String>>,
    }

    impl MockProcessLauncher {
        pub fn new() -> Self {
            Self {
                failing: HashSet::new(),
                next_pid: Mutex::new(4000),
                probes: Mutex::new(HashMap::new()),
                spawn_order: Mutex::new(Vec::new()),
            }
        }

        /// Mark a service name whose spawn must fail
        pub fn failing(mut self, service: impl Into<String>) -> Self {
            self.failing.insert(service.into());
            self
        }

        /// Probe of the child spawned for `service`
        pub fn probe(&self, service: &str) -> Option<Arc<MockChildProbe>> {
            self.probes.lock().unwrap().get(service).cloned()
        }

        /// Service names in the order spawn was attempted
        pub fn spawn_order(&self) -> Vec<String> {
            self.spawn_order.lock().unwrap().clone()
        }
    }

    impl Default for MockProcessLauncher {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ProcessLauncher for MockProcessLauncher {
        async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ChildProcess>, LaunchError> {
            self.spawn_order
                .lock()
                .unwrap()
                .push(spec.name().to_string());

            if self.failing.contains(spec.name()) {
                return Err(LaunchError::SpawnFailed {
                    service: spec.name().to_string(),
                    reason: "mock spawn failure".to_string(),
                });
            }

            let pid = {
                let mut next = self.next_pid.lock().unwrap();
                *next += 1;
                *next
            };
            let (child, probe) = MockChild::new(pid);
            self.probes
                .lock()
                .unwrap()
                .insert(spec.name().to_string(), probe);
            Ok(Box::new(child))
        }
    }
}

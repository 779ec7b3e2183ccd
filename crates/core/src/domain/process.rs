// Process state Domain Model

use serde::{Deserialize, Serialize};

/// Registry-local identity of a launched service
///
/// Assigned in launch order. The OS pid is only reported, never used for identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(pub u64);

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Observed liveness of a child process
///
/// Transitions at most once, from `Running` to `Exited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitState {
    Running,
    /// `None` when the code is unknown (killed by a signal, or status query failed)
    Exited(Option<i32>),
}

impl ExitState {
    pub fn is_exited(&self) -> bool {
        matches!(self, ExitState::Exited(_))
    }
}

impl std::fmt::Display for ExitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitState::Running => write!(f, "RUNNING"),
            ExitState::Exited(Some(code)) => write!(f, "EXITED({})", code),
            ExitState::Exited(None) => write!(f, "EXITED(?)"),
        }
    }
}

/// Outcome of one shutdown attempt against a tracked handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopOutcome {
    /// Process had already exited when the sweep reached it
    AlreadyExited(Option<i32>),
    /// Graceful stop signal delivered; there is no forced-kill follow-up
    StopRequested,
    /// Stop signal could not be delivered (process gone or unreachable)
    Failed(String),
}

impl std::fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopOutcome::AlreadyExited(Some(code)) => write!(f, "already exited ({})", code),
            StopOutcome::AlreadyExited(None) => write!(f, "already exited"),
            StopOutcome::StopRequested => write!(f, "stop requested"),
            StopOutcome::Failed(reason) => write!(f, "stop failed: {}", reason),
        }
    }
}

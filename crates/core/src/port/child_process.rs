// Child Process Port
// Abstraction over one spawned OS process (poll + graceful stop)

use crate::domain::ExitState;
use thiserror::Error;

/// Stop request could not be delivered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminationError {
    #[error("Process {0} is already gone")]
    AlreadyGone(u32),

    #[error("Process has no pid (already reaped)")]
    NoPid,

    #[error("Signal delivery failed: {0}")]
    SignalFailed(String),
}

/// Status query failed; callers treat the process as exited with unknown code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Status query failed: {0}")]
pub struct PollError(pub String);

/// Live child process
///
/// Implementations:
/// - ShellChild: tokio child spawned through the platform shell
/// - MockChild: scripted exits for tests
pub trait ChildProcess: Send {
    /// OS process identifier, `None` once the process has been reaped
    fn pid(&self) -> Option<u32>;

    /// Non-blocking exit check
    ///
    /// # Errors
    /// - PollError if the OS status query fails
    fn try_wait(&mut self) -> Result<ExitState, PollError>;

    /// Request a graceful stop (SIGTERM or platform equivalent)
    ///
    /// Never escalates to a forced kill.
    ///
    /// # Errors
    /// - TerminationError::AlreadyGone if the process no longer exists
    fn terminate(&mut self) -> Result<(), TerminationError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Shared view into a MockChild, kept by the test after the child is boxed
    #[derive(Debug, Default)]
    pub struct MockChildProbe {
        exit: Mutex<Option<Option<i32>>>,
        terminate_calls: AtomicUsize,
        poll_calls: AtomicUsize,
        exit_on_terminate: Mutex<Option<Option<i32>>>,
        poll_error: Mutex<Option<String>>,
    }

    impl MockChildProbe {
        /// Make the child report an exit on its next poll
        pub fn exit_with(&self, code: Option<i32>) {
            *self.exit.lock().unwrap() = Some(code);
        }

        /// Make the child exit as soon as it receives a stop request
        pub fn exit_on_terminate(&self, code: Option<i32>) {
            *self.exit_on_terminate.lock().unwrap() = Some(code);
        }

        /// Make every poll fail with the given message
        pub fn fail_polls(&self, message: impl Into<String>) {
            *self.poll_error.lock().unwrap() = Some(message.into());
        }

        pub fn terminate_calls(&self) -> usize {
            self.terminate_calls.load(Ordering::SeqCst)
        }

        pub fn poll_calls(&self) -> usize {
            self.poll_calls.load(Ordering::SeqCst)
        }

        pub fn has_exited(&self) -> bool {
            self.exit.lock().unwrap().is_some()
        }
    }

    /// Mock child process for testing
    pub struct MockChild {
        pid: u32,
        probe: Arc<MockChildProbe>,
    }

    impl MockChild {
        pub fn new(pid: u32) -> (Self, Arc<MockChildProbe>) {
            let probe = Arc::new(MockChildProbe::default());
            (
                Self {
                    pid,
                    probe: Arc::clone(&probe),
                },
                probe,
            )
        }
    }

    impl ChildProcess for MockChild {
        fn pid(&self) -> Option<u32> {
            Some(self.pid)
        }

        fn try_wait(&mut self) -> Result<ExitState, PollError> {
            self.probe.poll_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(msg) = self.probe.poll_error.lock().unwrap().clone() {
                return Err(PollError(msg));
            }
            Ok(match *self.probe.exit.lock().unwrap() {
                Some(code) => ExitState::Exited(code),
                None => ExitState::Running,
            })
        }

        fn terminate(&mut self) -> Result<(), TerminationError> {
            self.probe.terminate_calls.fetch_add(1, Ordering::SeqCst);
            if self.probe.has_exited() {
                return Err(TerminationError::AlreadyGone(self.pid));
            }
            if let Some(code) = *self.probe.exit_on_terminate.lock().unwrap() {
                self.probe.exit_with(code);
            }
            Ok(())
        }
    }
}

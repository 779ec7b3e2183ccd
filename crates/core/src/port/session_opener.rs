// Session Opener Port
// Asks the host environment to open an interactive terminal session for a service

use crate::domain::CommandSpec;
use crate::port::LaunchError;
use async_trait::async_trait;

/// Session Opener trait
///
/// The opened session is fire-and-forget: nothing about its later state comes back.
#[async_trait]
pub trait SessionOpener: Send + Sync {
    /// Open a new session titled with the spec's name, in its working directory,
    /// running its command
    ///
    /// # Errors
    /// - LaunchError::SessionRefused if the host call fails or reports failure
    async fn open(&self, spec: &CommandSpec) -> Result<(), LaunchError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Mock SessionOpener recording every request
    #[derive(Default)]
    pub struct MockSessionOpener {
        refused: HashSet<String>,
        opened: Mutex<Vec<String>>,
    }

    impl MockSessionOpener {
        pub fn new() -> Self {
            Self::default()
        }

        /// Refuse to open a session for `service`
        pub fn refusing(mut self, service: impl Into<String>) -> Self {
            self.refused.insert(service.into());
            self
        }

        /// Names of all sessions requested, in order
        pub fn opened(&self) -> Vec<String> {
            self.opened.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionOpener for MockSessionOpener {
        async fn open(&self, spec: &CommandSpec) -> Result<(), LaunchError> {
            self.opened.lock().unwrap().push(spec.name().to_string());
            if self.refused.contains(spec.name()) {
                return Err(LaunchError::SessionRefused {
                    service: spec.name().to_string(),
                    reason: "mock refusal".to_string(),
                });
            }
            Ok(())
        }
    }
}

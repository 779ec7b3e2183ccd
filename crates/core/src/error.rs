// Application error type

use thiserror::Error;

/// Failures that abort startup
///
/// Launch and teardown problems are reported per service through
/// `LaunchError` / `StopOutcome` and never surface here.
#[derive(Error, Debug)]
pub enum AppError {
    /// Startup cannot continue without a working stop path
    #[error("Signal handler installation failed: {0}")]
    SignalSetup(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

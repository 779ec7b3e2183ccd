// Port Layer - Interfaces for external dependencies

pub mod child_process;
pub mod process_launcher;
pub mod session_opener; // Detached policy
pub mod time_provider;

// Re-exports
pub use child_process::{ChildProcess, PollError, TerminationError};
pub use process_launcher::{LaunchError, ProcessLauncher};
pub use session_opener::SessionOpener;
pub use time_provider::TimeProvider;

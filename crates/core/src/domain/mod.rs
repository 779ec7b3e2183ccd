// Domain Layer - Pure descriptions of services and their observed state

pub mod command_spec;
pub mod error;
pub mod process;

// Re-exports
pub use command_spec::CommandSpec;
pub use error::DomainError;
pub use process::{ExitState, HandleId, StopOutcome};

// Application Layer - Use Cases

pub mod detached; // Detached policy
pub mod launcher;
pub mod registry;
pub mod supervisor;

// Re-exports
pub use detached::{DetachedLauncher, DetachedSummary};
pub use launcher::{LaunchSummary, ServiceLauncher};
pub use registry::{ProcessHandle, ProcessRegistry};
pub use supervisor::{
    stop_channel, ShutdownCoordinator, ShutdownGuard, ShutdownReport, StopReason, StopSender,
    StopToken, Supervisor, SupervisorExit,
};

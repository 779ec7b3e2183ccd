// Signal listeners
// Handlers only publish a stop reason; teardown runs on the supervisor's control flow
use stagehand_core::application::{StopReason, StopSender};
use stagehand_core::AppError;
use tokio::task::JoinHandle;
use tracing::info;

/// Install interrupt and termination listeners
///
/// Registration happens before this returns, so a signal arriving right after
/// startup is never lost. Must be called inside a tokio runtime.
///
/// # Errors
/// - AppError::SignalSetup if the OS refuses a handler; callers abort startup
pub fn install_signal_handlers(sender: StopSender) -> Result<JoinHandle<()>, AppError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())
            .map_err(|e| AppError::SignalSetup(format!("SIGINT: {}", e)))?;
        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| AppError::SignalSetup(format!("SIGTERM: {}", e)))?;

        Ok(tokio::spawn(async move {
            loop {
                let reason = tokio::select! {
                    Some(()) = sigint.recv() => StopReason::Interrupt,
                    Some(()) = sigterm.recv() => StopReason::Terminate,
                    else => break,
                };
                info!(reason = %reason, "Received signal to terminate...");
                sender.request(reason);
            }
        }))
    }

    #[cfg(windows)]
    {
        let mut ctrl_c = tokio::signal::windows::ctrl_c()
            .map_err(|e| AppError::SignalSetup(format!("Ctrl-C: {}", e)))?;

        Ok(tokio::spawn(async move {
            while ctrl_c.recv().await.is_some() {
                info!(reason = %StopReason::Interrupt, "Received signal to terminate...");
                sender.request(StopReason::Interrupt);
            }
        }))
    }
}

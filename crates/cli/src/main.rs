//! Stagehand - launch the demo services and keep them under one roof
//!
//! `supervise` (default) runs every service as a child of this process and
//! stops them all on Ctrl+C. `detach` opens one terminal window per service
//! and exits.

mod logging;
mod report;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use stagehand_core::application::supervisor::constants::{
    DEFAULT_DETACHED_STAGGER, DEFAULT_SUPERVISED_STAGGER,
};
use stagehand_core::application::{
    stop_channel, DetachedLauncher, LaunchSummary, ProcessRegistry, ServiceLauncher,
    ShutdownCoordinator, Supervisor, SupervisorExit,
};
use stagehand_core::port::time_provider::SystemTimeProvider;
use stagehand_core::port::TimeProvider;
use stagehand_infra_system::{
    install_signal_handlers, output_channel, ShellProcessLauncher, TerminalKind,
    TerminalSessionOpener,
};

use settings::{LauncherConfig, Overrides};

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Start the demo services together", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML file describing the services
    #[arg(long, global = true, env = "STAGEHAND_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the service paths are relative to (default: current directory)
    #[arg(long, global = true, env = "STAGEHAND_BASE_DIR")]
    base_dir: Option<String>,

    /// Liveness poll interval in milliseconds
    #[arg(long, global = true, env = "STAGEHAND_TICK_MS")]
    tick_ms: Option<u64>,

    /// Pause between service launches in milliseconds
    #[arg(long, global = true, env = "STAGEHAND_STAGGER_MS")]
    stagger_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every service as a child and stop them all on Ctrl+C (default)
    Supervise,

    /// Open each service in its own terminal window and exit
    Detach {
        /// Terminal to use: terminal.app, gnome-terminal, konsole, xterm,
        /// x-terminal-emulator or start
        #[arg(long, env = "STAGEHAND_TERMINAL")]
        terminal: Option<TerminalKind>,
    },

    /// Show the configured services
    List,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    logging::init()?;

    let cli = Cli::parse();
    let config = LauncherConfig::load(
        cli.config.as_deref(),
        Overrides {
            base_dir: cli.base_dir,
            stagger_ms: cli.stagger_ms,
            tick_ms: cli.tick_ms,
        },
    )?;

    match cli.command.unwrap_or(Commands::Supervise) {
        Commands::Supervise => supervise(&config).await,
        Commands::Detach { terminal } => detach(&config, terminal).await,
        Commands::List => {
            println!("{}", "Configured services".cyan().bold());
            println!("  {} {}", "Base directory:".bold(), config.base_dir.display());
            println!();
            println!("{}", report::services_table(&config.services));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Supervised policy: spawn, watch, tear down
async fn supervise(config: &LauncherConfig) -> Result<ExitCode> {
    info!(
        version = stagehand_core::VERSION,
        services = config.services.len(),
        "Stagehand starting"
    );

    // 1. Stop channel and signal listeners (before anything is spawned)
    let (stop_tx, stop_rx) = stop_channel();
    let _signals = install_signal_handlers(stop_tx)
        .context("Cannot supervise services without signal handlers")?;

    // 2. Shared state; the guard covers early returns and panics
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let registry = ProcessRegistry::new();
    let coordinator = Arc::new(ShutdownCoordinator::new(registry.clone()));
    let _guard = coordinator.guard();

    // 3. Child output
    let (output_tx, output_rx) = output_channel();
    tokio::spawn(report::echo_output(output_rx));

    // 4. Launch
    println!("{}", "Starting demo services...".cyan().bold());
    let launcher = ServiceLauncher::new(
        Arc::new(ShellProcessLauncher::new(output_tx)),
        registry.clone(),
        time_provider.clone(),
        config.stagger_or(DEFAULT_SUPERVISED_STAGGER),
    );
    let summary = launcher.launch_all(&config.services, &stop_rx).await;

    report::announce_started(&summary);
    println!();

    if summary.started.is_empty() {
        error!("No service could be started");
        coordinator.shutdown();
        println!("{}", report::outcome_table(&summary));
        return Ok(ExitCode::from(exit_status(&summary)));
    }

    if summary.all_started() {
        println!("{}", "All services started".green().bold());
    } else {
        warn!(
            failed = summary.failed.len(),
            skipped = summary.skipped.len(),
            "Some services were not started"
        );
        println!(
            "{}",
            format!(
                "{} of {} services started",
                summary.started.len(),
                config.services.len()
            )
            .yellow()
            .bold()
        );
    }
    println!("{}", "Press Ctrl+C to stop all services".bold());
    println!();

    // 5. Supervise until everything exits or a stop arrives
    let supervisor = Supervisor::new(
        registry,
        coordinator.clone(),
        time_provider,
        Some(config.tick),
    );
    let exit = supervisor.run(stop_rx).await;

    match exit {
        SupervisorExit::AllExited => println!("{}", "All services have exited".cyan().bold()),
        SupervisorExit::Stopped(reason) => {
            println!("{}", format!("Stopped ({})", reason).cyan().bold())
        }
    }
    println!("{}", report::outcome_table(&summary));

    info!(exit = ?exit, "Shutdown complete.");

    Ok(ExitCode::from(exit_status(&summary)))
}

/// Process exit status after supervision
///
/// How supervision ended does not matter: children exiting on their own and
/// a signal-driven teardown are both clean. Any launch failure is not.
fn exit_status(summary: &LaunchSummary) -> u8 {
    if summary.started.is_empty() || !summary.failed.is_empty() {
        1
    } else {
        0
    }
}

/// Detached policy: one terminal window per service, nothing tracked
async fn detach(config: &LauncherConfig, terminal: Option<TerminalKind>) -> Result<ExitCode> {
    let kind = terminal
        .or(config.terminal)
        .unwrap_or_else(TerminalKind::platform_default);
    info!(terminal = %kind, services = config.services.len(), "Opening terminal sessions");

    println!(
        "{}",
        "Starting demo services in separate terminal windows..."
            .cyan()
            .bold()
    );

    let launcher = DetachedLauncher::new(
        Arc::new(TerminalSessionOpener::new(kind)),
        config.stagger_or(DEFAULT_DETACHED_STAGGER),
    );
    let summary = launcher.open_all(&config.services).await;

    for spec in &config.services {
        if !summary.opened.iter().any(|name| name == spec.name()) {
            continue;
        }
        match spec.url() {
            Some(url) => println!(
                "  {} {} starting at {}",
                "✓".green(),
                spec.name().bold(),
                url.cyan()
            ),
            None => println!("  {} {} starting", "✓".green(), spec.name().bold()),
        }
    }
    for err in &summary.failed {
        println!("  {} {}", "✗".red(), err);
    }
    println!();
    println!("{}", "Services are starting in separate terminal windows.".bold());
    println!("{}", "Close the terminal windows to stop the services.".bold());

    if summary.failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::application::ProcessHandle;
    use stagehand_core::domain::{CommandSpec, HandleId};
    use stagehand_core::port::child_process::mocks::MockChild;
    use stagehand_core::port::LaunchError;

    fn started(name: &str) -> Arc<ProcessHandle> {
        let (child, _probe) = MockChild::new(100);
        let spec = CommandSpec::new(name, "sleep 100", "/tmp").unwrap();
        Arc::new(ProcessHandle::new(HandleId(1), spec, Box::new(child), 0))
    }

    fn failed(name: &str) -> LaunchError {
        LaunchError::SpawnFailed {
            service: name.to_string(),
            reason: "not found".to_string(),
        }
    }

    #[test]
    fn test_clean_run_exits_zero() {
        let summary = LaunchSummary {
            started: vec![started("web"), started("api")],
            ..Default::default()
        };

        assert_eq!(exit_status(&summary), 0);
    }

    #[test]
    fn test_stop_during_launch_exits_zero() {
        // Interrupted during the stagger: what started is torn down cleanly
        let summary = LaunchSummary {
            started: vec![started("web")],
            skipped: vec!["api".to_string()],
            ..Default::default()
        };

        assert_eq!(exit_status(&summary), 0);
    }

    #[test]
    fn test_any_launch_failure_exits_one() {
        let summary = LaunchSummary {
            started: vec![started("web")],
            failed: vec![failed("api")],
            ..Default::default()
        };

        assert_eq!(exit_status(&summary), 1);
    }

    #[test]
    fn test_nothing_started_exits_one() {
        let summary = LaunchSummary {
            failed: vec![failed("web")],
            ..Default::default()
        };

        assert_eq!(exit_status(&summary), 1);
    }
}

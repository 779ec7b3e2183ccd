// Shell process launcher
// reason: tokio for async child I/O, nix for process-group signals
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use stagehand_core::domain::{CommandSpec, ExitState};
use stagehand_core::port::{
    ChildProcess, LaunchError, PollError, ProcessLauncher, TerminationError,
};

use crate::output::{forward_lines, OutputSender, OutputStream};

/// Spawns each service through the platform shell
///
/// - stdin is null, stdout and stderr are piped into the merged output channel
/// - on Unix the child leads its own process group, so a stop request reaches
///   every process the service forks and a terminal Ctrl-C only reaches us
pub struct ShellProcessLauncher {
    output: OutputSender,
}

impl ShellProcessLauncher {
    /// Create a new shell launcher
    ///
    /// # Arguments
    /// * `output` - Receives every line the services print
    pub fn new(output: OutputSender) -> Self {
        Self { output }
    }

    fn shell_command(command: &str) -> Command {
        #[cfg(unix)]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }

        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        }
    }

    /// Map the OS spawn error; the directory is only inspected after the OS refused
    fn classify_spawn_error(spec: &CommandSpec, err: io::Error) -> LaunchError {
        if err.kind() == io::ErrorKind::NotFound && !spec.working_dir().is_dir() {
            LaunchError::WorkingDir {
                service: spec.name().to_string(),
                reason: format!("{}: {}", spec.working_dir().display(), err),
            }
        } else {
            LaunchError::SpawnFailed {
                service: spec.name().to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ProcessLauncher for ShellProcessLauncher {
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ChildProcess>, LaunchError> {
        let mut command = Self::shell_command(spec.command());
        command
            .current_dir(spec.working_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Stop requests are explicit; dropping the handle must not kill
            .kill_on_drop(false);

        #[cfg(unix)]
        command.process_group(0);

        debug!(
            service = %spec.name(),
            command = %spec.command(),
            working_dir = %spec.working_dir().display(),
            "Spawning service"
        );

        let mut child = command
            .spawn()
            .map_err(|e| Self::classify_spawn_error(spec, e))?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(
                spec.name().to_string(),
                OutputStream::Stdout,
                stdout,
                self.output.clone(),
            );
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(
                spec.name().to_string(),
                OutputStream::Stderr,
                stderr,
                self.output.clone(),
            );
        }

        let pid = child.id();
        Ok(Box::new(ShellChild { child, pid }))
    }
}

/// Child spawned by [`ShellProcessLauncher`]
pub struct ShellChild {
    child: Child,
    pid: Option<u32>,
}

impl ChildProcess for ShellChild {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn try_wait(&mut self) -> Result<ExitState, PollError> {
        match self.child.try_wait() {
            Ok(Some(status)) => Ok(ExitState::Exited(status.code())),
            Ok(None) => Ok(ExitState::Running),
            Err(e) => Err(PollError(e.to_string())),
        }
    }

    /// SIGTERM to the service's process group; no SIGKILL follow-up
    fn terminate(&mut self) -> Result<(), TerminationError> {
        let pid = self.pid.ok_or(TerminationError::NoPid)?;

        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            info!(pid = %pid, "Sending SIGTERM to process group");
            killpg(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|e| match e {
                Errno::ESRCH => TerminationError::AlreadyGone(pid),
                other => TerminationError::SignalFailed(format!("SIGTERM failed: {}", other)),
            })
        }

        #[cfg(windows)]
        {
            // No graceful console signal for a non-attached child on Windows
            info!(pid = %pid, "Requesting process termination");
            self.child
                .start_kill()
                .map_err(|e| TerminationError::SignalFailed(e.to_string()))
        }
    }
}

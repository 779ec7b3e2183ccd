// Terminal session opener (detached policy)
// One host call per service; the opened window is never tracked afterwards
use async_trait::async_trait;
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;
use tracing::{debug, info};

use stagehand_core::domain::CommandSpec;
use stagehand_core::port::{LaunchError, SessionOpener};

/// Host terminal used to open detached sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// macOS Terminal.app driven through `osascript`
    AppleTerminal,
    GnomeTerminal,
    Konsole,
    Xterm,
    /// Debian-style alternatives link to the user's preferred terminal
    XTerminalEmulator,
    /// `cmd /C start`
    WindowsStart,
}

impl TerminalKind {
    /// Terminal picked when none is configured
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            TerminalKind::AppleTerminal
        } else if cfg!(windows) {
            TerminalKind::WindowsStart
        } else {
            TerminalKind::XTerminalEmulator
        }
    }

    /// Whether the host program returns once the window is open
    ///
    /// Emulators launched directly keep running for the life of the window, so
    /// those are spawned and left alone instead of awaited.
    fn returns_after_open(&self) -> bool {
        matches!(
            self,
            TerminalKind::AppleTerminal | TerminalKind::GnomeTerminal | TerminalKind::WindowsStart
        )
    }
}

impl FromStr for TerminalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "apple" | "terminal.app" | "macos" => Ok(TerminalKind::AppleTerminal),
            "gnome" | "gnome-terminal" => Ok(TerminalKind::GnomeTerminal),
            "konsole" => Ok(TerminalKind::Konsole),
            "xterm" => Ok(TerminalKind::Xterm),
            "x-terminal-emulator" | "default" => Ok(TerminalKind::XTerminalEmulator),
            "windows" | "start" => Ok(TerminalKind::WindowsStart),
            other => Err(format!("unknown terminal '{}'", other)),
        }
    }
}

impl std::fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TerminalKind::AppleTerminal => "terminal.app",
            TerminalKind::GnomeTerminal => "gnome-terminal",
            TerminalKind::Konsole => "konsole",
            TerminalKind::Xterm => "xterm",
            TerminalKind::XTerminalEmulator => "x-terminal-emulator",
            TerminalKind::WindowsStart => "start",
        };
        write!(f, "{}", name)
    }
}

/// Program and arguments for one host call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Arguments are already quoted for the host command line
    pub verbatim: bool,
}

impl HostInvocation {
    fn apply(&self, command: &mut Command) {
        if !self.verbatim {
            command.args(&self.args);
            return;
        }

        #[cfg(windows)]
        for arg in &self.args {
            command.raw_arg(arg);
        }

        #[cfg(not(windows))]
        command.args(&self.args);
    }
}

/// Quote for POSIX `sh`
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Double-quote for `cmd`; `start` only reads a quoted first argument as the title
fn cmd_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', ""))
}

/// Escape for an AppleScript string literal
fn applescript_escape(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', "\\\"")
}

/// `cd <dir> && <command>`, then keep the window open on an interactive shell
fn session_script(spec: &CommandSpec) -> String {
    format!(
        "cd {} && {}; exec \"${{SHELL:-sh}}\"",
        shell_quote(&spec.working_dir().to_string_lossy()),
        spec.command()
    )
}

/// Build the host call that opens a session for `spec`
pub fn host_invocation(kind: TerminalKind, spec: &CommandSpec) -> HostInvocation {
    let title = spec.name().to_string();
    let dir = spec.working_dir().to_string_lossy().into_owned();

    let verbatim = kind == TerminalKind::WindowsStart;
    let (program, args): (&str, Vec<String>) = match kind {
        TerminalKind::AppleTerminal => {
            // Terminal.app keeps the window open by itself
            let inner = format!("cd {} && {}", shell_quote(&dir), spec.command());
            let script = format!(
                concat!(
                    "tell application \"Terminal\"\n",
                    "    do script \"{}\"\n",
                    "    set custom title of front window to \"{}\"\n",
                    "    activate\n",
                    "end tell"
                ),
                applescript_escape(&inner),
                applescript_escape(&title)
            );
            ("osascript", vec!["-e".to_string(), script])
        }
        TerminalKind::GnomeTerminal => (
            "gnome-terminal",
            vec![
                format!("--title={}", title),
                "--".to_string(),
                "sh".to_string(),
                "-c".to_string(),
                session_script(spec),
            ],
        ),
        TerminalKind::Konsole => (
            "konsole",
            vec![
                "-p".to_string(),
                format!("tabtitle={}", title),
                "-e".to_string(),
                "sh".to_string(),
                "-c".to_string(),
                session_script(spec),
            ],
        ),
        TerminalKind::Xterm | TerminalKind::XTerminalEmulator => (
            if kind == TerminalKind::Xterm {
                "xterm"
            } else {
                "x-terminal-emulator"
            },
            vec![
                "-T".to_string(),
                title,
                "-e".to_string(),
                "sh".to_string(),
                "-c".to_string(),
                session_script(spec),
            ],
        ),
        TerminalKind::WindowsStart => (
            "cmd",
            vec![
                "/C".to_string(),
                "start".to_string(),
                cmd_quote(&title),
                "/D".to_string(),
                cmd_quote(&dir),
                "cmd".to_string(),
                "/K".to_string(),
                spec.command().to_string(),
            ],
        ),
    };

    HostInvocation {
        program: program.to_string(),
        args,
        verbatim,
    }
}

/// Opens each service in a new host terminal window
pub struct TerminalSessionOpener {
    kind: TerminalKind,
}

impl TerminalSessionOpener {
    pub fn new(kind: TerminalKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> TerminalKind {
        self.kind
    }

    fn refused(spec: &CommandSpec, reason: impl Into<String>) -> LaunchError {
        LaunchError::SessionRefused {
            service: spec.name().to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SessionOpener for TerminalSessionOpener {
    async fn open(&self, spec: &CommandSpec) -> Result<(), LaunchError> {
        let invocation = host_invocation(self.kind, spec);
        debug!(
            service = %spec.name(),
            terminal = %self.kind,
            program = %invocation.program,
            "Opening terminal session"
        );

        let mut command = Command::new(&invocation.program);
        invocation.apply(&mut command);
        command.stdin(Stdio::null()).stdout(Stdio::null());

        if self.kind.returns_after_open() {
            let output = command
                .stderr(Stdio::piped())
                .output()
                .await
                .map_err(|e| Self::refused(spec, format!("{}: {}", invocation.program, e)))?;

            if !output.status.success() {
                return Err(Self::refused(
                    spec,
                    format!(
                        "{} exited with {:?}: {}",
                        invocation.program,
                        output.status.code(),
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                ));
            }
        } else {
            // Window lifetime belongs to the user; the handle is dropped unwaited
            let child = command
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| Self::refused(spec, format!("{}: {}", invocation.program, e)))?;
            info!(service = %spec.name(), pid = ?child.id(), "Terminal window process started");
        }

        Ok(())
    }
}

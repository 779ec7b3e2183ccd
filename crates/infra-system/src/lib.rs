// Stagehand Infrastructure - System Adapters
// Implements: ProcessLauncher, ChildProcess, SessionOpener; installs signal listeners

pub mod output;
pub mod shell_launcher;
pub mod signals;
pub mod terminal_session;

pub use output::{output_channel, OutputLine, OutputReceiver, OutputSender, OutputStream};
pub use shell_launcher::{ShellChild, ShellProcessLauncher};
pub use signals::install_signal_handlers;
pub use terminal_session::{TerminalKind, TerminalSessionOpener};

//! Shared fixtures: real `sh` children behind a launcher that counts stop signals
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stagehand_core::application::{ProcessHandle, ProcessRegistry, ServiceLauncher, ShutdownCoordinator};
use stagehand_core::domain::{CommandSpec, ExitState};
use stagehand_core::port::time_provider::SystemTimeProvider;
use stagehand_core::port::{
    ChildProcess, LaunchError, PollError, ProcessLauncher, TerminationError, TimeProvider,
};
use stagehand_infra_system::{output_channel, OutputReceiver, ShellProcessLauncher};

/// Wraps the shell launcher and records every terminate per service
pub struct CountingLauncher {
    inner: ShellProcessLauncher,
    terminations: Mutex<HashMap<String, Arc<AtomicUsize>>>,
}

impl CountingLauncher {
    pub fn new() -> (Self, OutputReceiver) {
        let (tx, rx) = output_channel();
        (
            Self {
                inner: ShellProcessLauncher::new(tx),
                terminations: Mutex::new(HashMap::new()),
            },
            rx,
        )
    }

    /// Terminate calls seen for `service` (0 if it never started)
    pub fn terminate_calls(&self, service: &str) -> usize {
        self.terminations
            .lock()
            .unwrap()
            .get(service)
            .map(|count| count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ProcessLauncher for CountingLauncher {
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ChildProcess>, LaunchError> {
        let inner = self.inner.spawn(spec).await?;
        let count = Arc::new(AtomicUsize::new(0));
        self.terminations
            .lock()
            .unwrap()
            .insert(spec.name().to_string(), Arc::clone(&count));
        Ok(Box::new(CountingChild { inner, count }))
    }
}

struct CountingChild {
    inner: Box<dyn ChildProcess>,
    count: Arc<AtomicUsize>,
}

impl ChildProcess for CountingChild {
    fn pid(&self) -> Option<u32> {
        self.inner.pid()
    }

    fn try_wait(&mut self) -> Result<ExitState, PollError> {
        self.inner.try_wait()
    }

    fn terminate(&mut self) -> Result<(), TerminationError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.terminate()
    }
}

/// Wired launcher, registry and coordinator
pub struct Harness {
    pub launcher: Arc<CountingLauncher>,
    pub output: OutputReceiver,
    pub registry: ProcessRegistry,
    pub coordinator: Arc<ShutdownCoordinator>,
    pub time_provider: Arc<dyn TimeProvider>,
}

impl Harness {
    pub fn new() -> Self {
        let (launcher, output) = CountingLauncher::new();
        let registry = ProcessRegistry::new();
        Self {
            launcher: Arc::new(launcher),
            output,
            coordinator: Arc::new(ShutdownCoordinator::new(registry.clone())),
            registry,
            time_provider: Arc::new(SystemTimeProvider),
        }
    }

    pub fn service_launcher(&self) -> ServiceLauncher {
        ServiceLauncher::new(
            self.launcher.clone(),
            self.registry.clone(),
            self.time_provider.clone(),
            Duration::ZERO,
        )
    }

    /// Wait for a line of child output
    pub async fn expect_line(&mut self, expected: &str) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let line = tokio::time::timeout_at(deadline, self.output.recv())
                .await
                .expect("timed out waiting for child output")
                .expect("output channel closed");
            if line.line == expected {
                return;
            }
        }
    }
}

pub fn spec(name: &str, command: &str) -> CommandSpec {
    CommandSpec::new(name, command, std::env::temp_dir()).unwrap()
}

/// Poll until the handle reports an exit
pub async fn wait_exit(handle: &ProcessHandle) -> ExitState {
    for _ in 0..250 {
        let state = handle.poll().unwrap();
        if state.is_exited() {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{} did not exit in time", handle.name());
}

/// Poll until `cond` holds
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    for _ in 0..250 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not met in time");
}

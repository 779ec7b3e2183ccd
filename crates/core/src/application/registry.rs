// Process Registry - tracked live handles, insertion ordered
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{CommandSpec, ExitState, HandleId, StopOutcome};
use crate::port::{ChildProcess, PollError, TerminationError};

/// Live handle to one spawned service
///
/// Exit state moves from `Running` to `Exited` at most once. The child is only
/// touched under the handle's own lock, so a poll and a shutdown sweep never
/// act on it at the same time.
pub struct ProcessHandle {
    id: HandleId,
    spec: CommandSpec,
    pid: Option<u32>,
    started_at_ms: i64,
    state: Mutex<HandleState>,
}

struct HandleState {
    child: Box<dyn ChildProcess>,
    exit: ExitState,
    stop_requested: bool,
}

impl ProcessHandle {
    pub fn new(
        id: HandleId,
        spec: CommandSpec,
        child: Box<dyn ChildProcess>,
        started_at_ms: i64,
    ) -> Self {
        let pid = child.pid();
        Self {
            id,
            spec,
            pid,
            started_at_ms,
            state: Mutex::new(HandleState {
                child,
                exit: ExitState::Running,
                stop_requested: false,
            }),
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Pid reported at spawn time
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn started_at_ms(&self) -> i64 {
        self.started_at_ms
    }

    /// Last observed exit state (does not query the OS)
    pub fn exit_state(&self) -> ExitState {
        self.lock().exit
    }

    pub fn stop_requested(&self) -> bool {
        self.lock().stop_requested
    }

    /// Query the OS for an exit and record it
    ///
    /// A failed query records the process as exited with unknown code, and the
    /// error is still returned so the caller can report it.
    pub fn poll(&self) -> Result<ExitState, PollError> {
        let mut state = self.lock();
        Self::refresh(&mut state)
    }

    /// Send the graceful stop request, once
    ///
    /// Returns the outcome instead of an error: failures during teardown are
    /// reported, never propagated.
    pub fn request_stop(&self) -> StopOutcome {
        let mut state = self.lock();

        match Self::refresh(&mut state) {
            Ok(ExitState::Exited(code)) => return StopOutcome::AlreadyExited(code),
            Err(e) => return StopOutcome::Failed(e.to_string()),
            Ok(ExitState::Running) => {}
        }

        if state.stop_requested {
            return StopOutcome::StopRequested;
        }

        match state.child.terminate() {
            Ok(()) => {
                state.stop_requested = true;
                StopOutcome::StopRequested
            }
            Err(e) => {
                if matches!(e, TerminationError::AlreadyGone(_) | TerminationError::NoPid) {
                    state.exit = ExitState::Exited(None);
                }
                StopOutcome::Failed(e.to_string())
            }
        }
    }

    fn refresh(state: &mut HandleState) -> Result<ExitState, PollError> {
        if state.exit.is_exited() {
            return Ok(state.exit);
        }
        match state.child.try_wait() {
            Ok(exit) => {
                state.exit = exit;
                Ok(exit)
            }
            Err(e) => {
                state.exit = ExitState::Exited(None);
                Err(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HandleState> {
        // Teardown must keep working even if a reporting thread panicked
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("id", &self.id)
            .field("name", &self.spec.name())
            .field("pid", &self.pid)
            .finish()
    }
}

/// Registry of handles the supervisor still owes a stop request
///
/// Cheap to clone; all clones share the same set.
#[derive(Clone, Default)]
pub struct ProcessRegistry {
    handles: Arc<Mutex<Vec<Arc<ProcessHandle>>>>,
    next_id: Arc<AtomicU64>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the identity for the next handle
    pub fn next_id(&self) -> HandleId {
        HandleId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn add(&self, handle: Arc<ProcessHandle>) {
        self.lock().push(handle);
    }

    /// Remove by identity, returning the handle if it was still tracked
    pub fn remove(&self, id: HandleId) -> Option<Arc<ProcessHandle>> {
        let mut handles = self.lock();
        let index = handles.iter().position(|h| h.id() == id)?;
        Some(handles.remove(index))
    }

    /// Point-in-time copy in insertion order
    ///
    /// Safe to iterate while other callers add or remove.
    pub fn snapshot(&self) -> Vec<Arc<ProcessHandle>> {
        self.lock().clone()
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.lock().iter().any(|h| h.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<ProcessHandle>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::child_process::mocks::MockChild;

    fn handle(registry: &ProcessRegistry, name: &str, pid: u32) -> Arc<ProcessHandle> {
        let (child, _probe) = MockChild::new(pid);
        let spec = CommandSpec::new(name, "sleep 100", "/tmp").unwrap();
        Arc::new(ProcessHandle::new(registry.next_id(), spec, Box::new(child), 0))
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let registry = ProcessRegistry::new();
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            registry.add(handle(&registry, name, 100 + i as u32));
        }

        let names: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_remove_during_snapshot_iteration() {
        let registry = ProcessRegistry::new();
        for name in ["A", "B", "C", "D"] {
            registry.add(handle(&registry, name, 1));
        }

        let mut visited = Vec::new();
        for h in registry.snapshot() {
            visited.push(h.name().to_string());
            registry.remove(h.id());
        }

        assert_eq!(visited, vec!["A", "B", "C", "D"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_id_is_none() {
        let registry = ProcessRegistry::new();
        let h = handle(&registry, "A", 1);
        let id = h.id();
        registry.add(h);

        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert!(!registry.contains(id));
    }

    #[test]
    fn test_poll_transition_is_monotonic() {
        let registry = ProcessRegistry::new();
        let (child, probe) = MockChild::new(42);
        let spec = CommandSpec::new("A", "false", "/tmp").unwrap();
        let h = ProcessHandle::new(registry.next_id(), spec, Box::new(child), 0);

        assert_eq!(h.poll().unwrap(), ExitState::Running);
        probe.exit_with(Some(1));
        assert_eq!(h.poll().unwrap(), ExitState::Exited(Some(1)));

        // Recorded exit is never re-queried
        let polls = probe.poll_calls();
        assert_eq!(h.poll().unwrap(), ExitState::Exited(Some(1)));
        assert_eq!(probe.poll_calls(), polls);
    }

    #[test]
    fn test_poll_error_records_unknown_exit() {
        let registry = ProcessRegistry::new();
        let (child, probe) = MockChild::new(42);
        let spec = CommandSpec::new("A", "sleep 1", "/tmp").unwrap();
        let h = ProcessHandle::new(registry.next_id(), spec, Box::new(child), 0);

        probe.fail_polls("EPERM");
        assert!(h.poll().is_err());
        assert_eq!(h.exit_state(), ExitState::Exited(None));
    }

    #[test]
    fn test_request_stop_sends_once() {
        let registry = ProcessRegistry::new();
        let (child, probe) = MockChild::new(7);
        let spec = CommandSpec::new("A", "sleep 100", "/tmp").unwrap();
        let h = ProcessHandle::new(registry.next_id(), spec, Box::new(child), 0);

        assert_eq!(h.request_stop(), StopOutcome::StopRequested);
        assert_eq!(h.request_stop(), StopOutcome::StopRequested);
        assert_eq!(probe.terminate_calls(), 1);
        assert!(h.stop_requested());
    }

    #[test]
    fn test_request_stop_on_exited_child() {
        let registry = ProcessRegistry::new();
        let (child, probe) = MockChild::new(7);
        let spec = CommandSpec::new("A", "true", "/tmp").unwrap();
        let h = ProcessHandle::new(registry.next_id(), spec, Box::new(child), 0);

        probe.exit_with(Some(0));
        assert_eq!(h.request_stop(), StopOutcome::AlreadyExited(Some(0)));
        assert_eq!(probe.terminate_calls(), 0);
    }
}

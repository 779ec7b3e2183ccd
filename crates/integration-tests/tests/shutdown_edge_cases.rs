//! Shutdown edge cases with real process groups
#![cfg(unix)]

mod common;

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::sync::Arc;
use std::time::Duration;

use common::{spec, wait_exit, Harness};
use stagehand_core::domain::{ExitState, StopOutcome};

/// A child that ignores SIGTERM is asked once and left running (no escalation)
#[tokio::test]
async fn test_ignored_stop_is_not_escalated() {
    let mut h = Harness::new();
    let handle = h
        .service_launcher()
        .launch(&spec("stubborn", "trap '' TERM; echo ready; sleep 5"))
        .await
        .unwrap();
    h.expect_line("ready").await;

    let report = h.coordinator.shutdown().unwrap();
    assert_eq!(report.stop_requests(), 1);
    assert!(h.registry.is_empty());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(handle.poll().unwrap(), ExitState::Running);
    assert!(handle.stop_requested());
    assert_eq!(h.launcher.terminate_calls("stubborn"), 1);

    // A later stop request on the same handle sends nothing new
    assert_eq!(handle.request_stop(), StopOutcome::StopRequested);
    assert_eq!(h.launcher.terminate_calls("stubborn"), 1);

    // Cleanup
    let pid = handle.pid().unwrap();
    killpg(Pid::from_raw(pid as i32), Signal::SIGKILL).unwrap();
    assert_eq!(wait_exit(&handle).await, ExitState::Exited(None));
}

/// A child that exited before teardown is reported, not signalled
#[tokio::test]
async fn test_already_exited_child_is_not_signalled() {
    let h = Harness::new();
    let handle = h
        .service_launcher()
        .launch(&spec("quick", "exit 4"))
        .await
        .unwrap();
    wait_exit(&handle).await;

    let report = h.coordinator.shutdown().unwrap();

    assert_eq!(report.stop_requests(), 0);
    assert_eq!(report.attempts.len(), 1);
    assert_eq!(report.attempts[0].outcome, StopOutcome::AlreadyExited(Some(4)));
    assert_eq!(h.launcher.terminate_calls("quick"), 0);
}

/// Racing teardowns from several tasks signal each child once in total
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_teardown_signals_once() {
    let h = Harness::new();
    let launcher = h.service_launcher();
    let a = launcher.launch(&spec("a", "sleep 100")).await.unwrap();
    let b = launcher.launch(&spec("b", "sleep 100")).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let coordinator = Arc::clone(&h.coordinator);
        tasks.push(tokio::task::spawn_blocking(move || coordinator.shutdown()));
    }
    let mut reports = 0;
    for task in tasks {
        if task.await.unwrap().is_some() {
            reports += 1;
        }
    }

    assert_eq!(reports, 1);
    assert_eq!(h.launcher.terminate_calls("a"), 1);
    assert_eq!(h.launcher.terminate_calls("b"), 1);
    assert_eq!(wait_exit(&a).await, ExitState::Exited(None));
    assert_eq!(wait_exit(&b).await, ExitState::Exited(None));
}

/// Dropping the guard (early return or unwind) still stops the children
#[tokio::test]
async fn test_guard_drop_stops_children() {
    let h = Harness::new();
    let handle = h
        .service_launcher()
        .launch(&spec("web", "sleep 100"))
        .await
        .unwrap();

    {
        let _guard = h.coordinator.guard();
    }

    assert!(h.coordinator.is_done());
    assert_eq!(h.launcher.terminate_calls("web"), 1);
    assert_eq!(wait_exit(&handle).await, ExitState::Exited(None));
}

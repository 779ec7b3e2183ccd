// Console output: service tables, banners, child output echo
use colored::Colorize;
use tabled::{Table, Tabled};

use stagehand_core::application::{LaunchSummary, ProcessHandle};
use stagehand_core::domain::{CommandSpec, ExitState};
use stagehand_infra_system::{OutputReceiver, OutputStream};

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Command")]
    command: String,
    #[tabled(rename = "Directory")]
    dir: String,
    #[tabled(rename = "URL")]
    url: String,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "PID")]
    pid: String,
    #[tabled(rename = "Result")]
    result: String,
}

/// Table of configured services (`list`)
pub fn services_table(specs: &[CommandSpec]) -> String {
    let rows: Vec<ServiceRow> = specs
        .iter()
        .map(|spec| ServiceRow {
            name: spec.name().to_string(),
            command: spec.command().to_string(),
            dir: spec.working_dir().display().to_string(),
            url: spec.url().unwrap_or("-").to_string(),
        })
        .collect();
    Table::new(rows).to_string()
}

fn describe(handle: &ProcessHandle) -> String {
    match handle.exit_state() {
        ExitState::Running if handle.stop_requested() => {
            "stop requested, still running".to_string()
        }
        ExitState::Running => "running".to_string(),
        ExitState::Exited(_) if handle.stop_requested() => "stopped".to_string(),
        ExitState::Exited(Some(code)) => format!("exited ({})", code),
        ExitState::Exited(None) => "exited (signal)".to_string(),
    }
}

/// Final state of every service after a supervised run
pub fn outcome_table(summary: &LaunchSummary) -> String {
    let mut rows: Vec<OutcomeRow> = summary
        .started
        .iter()
        .map(|handle| OutcomeRow {
            name: handle.name().to_string(),
            pid: handle
                .pid()
                .map(|pid| pid.to_string())
                .unwrap_or_else(|| "-".to_string()),
            result: describe(handle),
        })
        .collect();

    rows.extend(summary.failed.iter().map(|err| OutcomeRow {
        name: err.service().to_string(),
        pid: "-".to_string(),
        result: format!("launch failed: {}", err),
    }));
    rows.extend(summary.skipped.iter().map(|name| OutcomeRow {
        name: name.clone(),
        pid: "-".to_string(),
        result: "not started".to_string(),
    }));

    Table::new(rows).to_string()
}

/// Print "<name> starting at <url>" for every started service that has one
pub fn announce_started(summary: &LaunchSummary) {
    for handle in &summary.started {
        if let Some(url) = handle.spec().url() {
            println!("  {} {} starting at {}", "✓".green(), handle.name().bold(), url.cyan());
        } else {
            println!("  {} {} starting", "✓".green(), handle.name().bold());
        }
    }
    for err in &summary.failed {
        println!("  {} {}", "✗".red(), err);
    }
}

/// Echo merged child output as `[service] line` until every producer is gone
pub async fn echo_output(mut rx: OutputReceiver) {
    while let Some(line) = rx.recv().await {
        let tag = format!("[{}]", line.service);
        match line.stream {
            OutputStream::Stdout => println!("{} {}", tag.cyan(), line.line),
            OutputStream::Stderr => eprintln!("{} {}", tag.yellow(), line.line),
        }
    }
}

//! Plain-text rendering to stdout.

use std::time::Duration;

use explog_core::RunBreakdown;
use explog_core::model::{
    ConfigExecution, Experiment, ExperimentRun, LogEntry, Timestamp, User,
};

const NONE: &str = "-";

pub fn clear_screen() {
    print!("\x1b[2J\x1b[H");
}

pub fn user(user: &User) {
    match &user.email {
        Some(email) => println!("{} <{}> (id {})", user.username, email, user.id),
        None => println!("{} (id {})", user.username, user.id),
    }
}

pub fn experiments(items: &[Experiment]) {
    if items.is_empty() {
        println!("no experiments");
        return;
    }
    println!("{:>6}  {:<32}  {:<10}  {:>8}  {:<25}", "ID", "NAME", "STATUS", "CONFIGS", "LAST RUN");
    for exp in items {
        let (configs, started) = match &exp.last_run {
            Some(last) => (
                format!("{}/{}", last.finished_configs, last.number_of_configs.max(0)),
                time_or_none(last.started.as_ref()),
            ),
            None => (NONE.to_string(), NONE.to_string()),
        };
        println!(
            "{:>6}  {:<32}  {:<10}  {:>8}  {:<25}",
            exp.id,
            exp.name,
            exp.status().to_string(),
            configs,
            started
        );
    }
}

pub fn experiment(exp: &Experiment) {
    println!("experiment {}  {}  [{}]", exp.id, exp.name, exp.status());
    if let Some(description) = &exp.description {
        println!("  {}", description);
    }
    match &exp.last_run {
        Some(last) => {
            println!("  last run: {}", last.id);
            println!("    started:  {}", time_or_none(last.started.as_ref()));
            println!("    finished: {}", time_or_none(last.finished.as_ref()));
            println!(
                "    configs:  {}/{}",
                last.finished_configs,
                last.number_of_configs.max(0)
            );
        }
        None => println!("  no runs yet"),
    }
}

pub fn runs(items: &[ExperimentRun]) {
    if items.is_empty() {
        println!("no runs");
        return;
    }
    println!("{:>6}  {:<10}  {:>8}  {:<25}  {:<25}", "ID", "STATUS", "CONFIGS", "STARTED", "FINISHED");
    for run in items {
        let configs = match run.expected_configs() {
            Some(n) => format!("{}/{}", run.finished_configs, n),
            None => run.finished_configs.to_string(),
        };
        println!(
            "{:>6}  {:<10}  {:>8}  {:<25}  {:<25}",
            run.id,
            run.status().to_string(),
            configs,
            time_or_none(run.started.as_ref()),
            time_or_none(run.finished.as_ref())
        );
    }
}

pub fn run(run: &ExperimentRun, breakdown: &RunBreakdown) {
    println!("run {}  [{}]", run.id, run.status());
    println!("  started:  {}", time_or_none(run.started.as_ref()));
    println!("  finished: {}", time_or_none(run.finished.as_ref()));
    println!(
        "  configs:  {}/{} finished ({:.0}%)",
        breakdown.finished(),
        run.expected_configs().unwrap_or(breakdown.total()),
        breakdown.progress() * 100.0
    );
    if !breakdown.steps.is_empty() {
        println!("  steps:    {}", breakdown.steps.join(" > "));
    }

    if !breakdown.running.is_empty() {
        println!("\nrunning ({})", breakdown.running.len());
        for exec in &breakdown.running {
            let step = exec.current_step_name().unwrap_or(NONE);
            println!(
                "  {:<32}  step {}/{}  {}",
                exec.config_name,
                exec.steps_done(),
                exec.steps.len(),
                step
            );
        }
    }

    finished_group("succeeded", &breakdown.succeeded);
    finished_group("failed", &breakdown.failed);
}

fn finished_group(title: &str, group: &[ConfigExecution]) {
    if group.is_empty() {
        return;
    }
    println!("\n{} ({})", title, group.len());
    for exec in group {
        let elapsed = exec
            .elapsed
            .map(|e| e.to_string())
            .unwrap_or_else(|| NONE.to_string());
        println!(
            "  {:<32}  {:>14}  {}",
            exec.config_name,
            elapsed,
            time_or_none(exec.finished.as_ref())
        );
        if let Some(message) = &exec.error_message {
            println!("      error: {}", message);
        }
    }
}

pub fn logs(entries: &[LogEntry]) {
    for entry in entries {
        let origin = match (&entry.config_name, &entry.step_name) {
            (Some(config), Some(step)) => format!("{config}/{step}"),
            (Some(config), None) => config.clone(),
            _ => NONE.to_string(),
        };
        println!(
            "{}  {:<7}  {:<24}  {}",
            entry.timestamp, entry.level, origin, entry.message
        );
        if let Some(location) = entry.location() {
            println!("    at {}", location);
        }
        if let Some(stack) = &entry.stack_info {
            for line in stack.lines() {
                println!("    {}", line);
            }
        }
    }
}

pub fn refreshed(at: Option<Timestamp>, every: Duration) {
    println!(
        "\nupdated {}, next refresh in {}s (Ctrl+C to stop)",
        time_or_none(at.as_ref()),
        every.as_secs()
    );
}

fn time_or_none(ts: Option<&Timestamp>) -> String {
    ts.map(|t| t.to_string()).unwrap_or_else(|| NONE.to_string())
}

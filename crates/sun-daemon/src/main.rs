// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sunwelld: runs a single goal to completion, escalation, or
//! cancellation as a standalone process, writing its event stream to
//! `.sunwell/events/{run_id}.ndjson` instead of a terminal. Intended for
//! unattended invocation (systemd, CI) where `sunwell run` is not.

use std::path::PathBuf;
use std::sync::Arc;
use sun_adapters::HttpLlmClient;
use sun_core::{EventSource, Goal, GoalId, GoalType, RunId, SystemClock};
use sun_daemon::{Config, DaemonError, EventBus, EventBusConfig, Runtime, WorkspaceLock};
use sun_wire::EventLog;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

fn print_usage() {
    println!("sunwelld {}", env!("CARGO_PKG_VERSION"));
    println!("Runs a single Sunwell goal to completion as an unattended process.");
    println!();
    println!("USAGE:");
    println!("    sunwelld <goal> [--workspace <dir>]");
    println!();
    println!("Events are appended as NDJSON to .sunwell/events/{{run_id}}.ndjson");
    println!("under the workspace. Provider settings come from SUNWELL_LLM_BASE_URL,");
    println!("SUNWELL_LLM_API_KEY, and SUNWELL_LLM_MODEL.");
}

fn setup_logging(log_path: &std::path::Path) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("sunwelld.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();
    Ok(guard)
}

fn parse_args() -> Result<(String, Option<PathBuf>), i32> {
    let mut args = std::env::args().skip(1);
    let mut goal = None;
    let mut workspace = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Err(0);
            }
            "--version" | "-v" => {
                println!("sunwelld {}", env!("CARGO_PKG_VERSION"));
                return Err(0);
            }
            "--workspace" => {
                workspace = args.next().map(PathBuf::from);
                if workspace.is_none() {
                    eprintln!("sunwelld: --workspace requires a value");
                    return Err(5);
                }
            }
            other if goal.is_none() => goal = Some(other.to_string()),
            other => {
                eprintln!("sunwelld: unexpected argument '{other}'");
                return Err(5);
            }
        }
    }
    match goal {
        Some(goal) => Ok((goal, workspace)),
        None => {
            print_usage();
            Err(5)
        }
    }
}

#[tokio::main]
async fn main() {
    let (goal_text, workspace_arg) = match parse_args() {
        Ok(parsed) => parsed,
        Err(code) => std::process::exit(code),
    };

    let workspace = match workspace_arg {
        Some(path) => path,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let _log_guard = match setup_logging(&workspace.join(".sunwell/sunwelld.log")) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("sunwelld: failed to set up logging: {err}");
            std::process::exit(5);
        }
    };

    tracing::info!(workspace = %workspace.display(), "starting sunwelld");

    let code = run(&workspace, goal_text).await;
    std::process::exit(code);
}

async fn run(workspace: &std::path::Path, goal_text: String) -> i32 {
    let lock = match WorkspaceLock::try_acquire(workspace) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            tracing::error!("{}", DaemonError::WorkspaceLocked);
            return 5;
        }
        Err(err) => {
            tracing::error!(%err, "failed to acquire workspace lock");
            return 5;
        }
    };

    let config = match Config::load(workspace) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "failed to load configuration");
            return 5;
        }
    };

    let event_bus = Arc::new(EventBus::new(EventBusConfig::from(&config.event_bus)));
    let llm = HttpLlmClient::new(
        std::env::var("SUNWELL_LLM_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        std::env::var("SUNWELL_LLM_API_KEY").unwrap_or_default(),
        std::env::var("SUNWELL_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
    );
    let runtime = Runtime::new(llm, SystemClock, workspace.to_path_buf(), config, event_bus.clone());

    let goal = Goal::new(GoalId::new(), goal_text, GoalType::Task);
    let run_id = RunId::new();
    let cancel = CancellationToken::new();

    let log_path = workspace.join(".sunwell/events").join(format!("{run_id}.ndjson"));
    let subscription = event_bus.subscribe(Some(run_id)).ok();
    let subscription_id = subscription.as_ref().map(|s| s.id);
    if subscription.is_none() {
        tracing::warn!("event log subscriber rejected, run will not be persisted to disk");
    }
    let drain = subscription.map(|mut subscription| {
        tokio::spawn(async move {
            let log = EventLog::new(log_path);
            while let Some(event) = subscription.receiver.recv().await {
                if let Err(err) = log.append(&event) {
                    tracing::warn!(%err, "failed to append event to run log");
                }
            }
        })
    });

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sig) => sig,
        Err(err) => {
            tracing::error!(%err, "failed to install SIGTERM handler");
            return 5;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(sig) => sig,
        Err(err) => {
            tracing::error!(%err, "failed to install SIGINT handler");
            return 5;
        }
    };

    let outcome = tokio::select! {
        result = runtime.run(goal, run_id, EventSource::Cli, &cancel) => result,
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM, cancelling run");
            cancel.cancel();
            return 4;
        }
        _ = sigint.recv() => {
            tracing::info!("received SIGINT, cancelling run");
            cancel.cancel();
            return 4;
        }
    };

    drop(runtime);
    if let Some(id) = subscription_id {
        event_bus.unsubscribe(id);
    }
    if let Some(drain) = drain {
        let _ = drain.await;
    }
    drop(lock);

    match outcome {
        Ok(outcome) => {
            tracing::info!(?outcome, "run finished");
            sun_cli_exit_code(&outcome)
        }
        Err(err) => {
            tracing::error!(%err, "run failed");
            5
        }
    }
}

/// Same §6 mapping the CLI uses, duplicated here rather than shared
/// because `sun-cli` depends on `sun-daemon`, not the other way around.
fn sun_cli_exit_code(outcome: &sun_daemon::RunOutcome) -> i32 {
    use sun_daemon::RunOutcome;
    use sun_engine::EscalationReason;
    match outcome {
        RunOutcome::Completed => 0,
        RunOutcome::NeedsConfirmation { .. } | RunOutcome::NeedsClarification { .. } => 1,
        RunOutcome::Cancelled { .. } => 4,
        RunOutcome::Escalated { reason, .. } => {
            if reason == EscalationReason::MaxIterations.as_str() {
                2
            } else {
                3
            }
        }
    }
}

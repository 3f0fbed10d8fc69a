// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations: `sunwell run` and `sunwell review`.

pub mod review;
pub mod run;

use crate::exit_error::ExitError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sun_adapters::HttpLlmClient;
use sun_core::SystemClock;
use sun_daemon::{Config, DaemonError, EventBus, EventBusConfig, Runtime, RunOutcome, WorkspaceLock};
use sun_engine::EscalationReason;

/// Shared args for both commands: workspace root and provider settings.
#[derive(Debug, clap::Args)]
pub struct ProviderArgs {
    /// Base URL of an OpenAI-compatible chat completions endpoint.
    #[arg(long, env = "SUNWELL_LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub llm_base_url: String,
    #[arg(long, env = "SUNWELL_LLM_API_KEY", default_value = "")]
    pub llm_api_key: String,
    #[arg(long, env = "SUNWELL_LLM_MODEL", default_value = "gpt-4o-mini")]
    pub llm_model: String,
}

pub fn build_runtime(
    workspace: &Path,
    provider: &ProviderArgs,
) -> Result<(Runtime<HttpLlmClient, SystemClock>, Arc<EventBus>, WorkspaceLock), ExitError> {
    let lock = WorkspaceLock::try_acquire(workspace)
        .map_err(|err| ExitError::new(5, format!("failed to acquire workspace lock: {err}")))?
        .ok_or_else(|| ExitError::new(5, DaemonError::WorkspaceLocked.to_string()))?;

    let config = Config::load(workspace).map_err(|err| ExitError::new(5, err.to_string()))?;
    let event_bus = Arc::new(EventBus::new(EventBusConfig::from(&config.event_bus)));
    let llm = HttpLlmClient::new(provider.llm_base_url.clone(), provider.llm_api_key.clone(), provider.llm_model.clone());
    let runtime = Runtime::new(llm, SystemClock, workspace.to_path_buf(), config, event_bus.clone());
    Ok((runtime, event_bus, lock))
}

pub fn workspace_path(workspace: &Option<PathBuf>) -> std::io::Result<PathBuf> {
    match workspace {
        Some(path) => path.canonicalize(),
        None => std::env::current_dir(),
    }
}

/// Print every event the bus retained for `run_id` as a single NDJSON line
/// each, exactly as `sunwelld` would write to
/// `.sunwell/events/{run_id}.ndjson`. Called once a run has finished, not
/// streamed live — the CLI is a thin, synchronous client of the
/// orchestrator, not a server with its own subscriber lifecycle to manage.
pub fn print_events(bus: &EventBus, run_id: sun_core::RunId) {
    for event in bus.list_events(run_id) {
        match sun_wire::encode(&event) {
            Ok(line) => print!("{line}"),
            Err(err) => tracing::warn!(%err, "failed to encode event as NDJSON"),
        }
    }
}

/// Map a finished run's outcome to the process exit code from §6: 0
/// success, 1 stopped short (dangerous/ambiguous goal, not in the
/// canonical table but distinct from both success and failure), 2 gate
/// failure (iteration cap exhausted), 3 escalated to recovery
/// (non-progressing), 4 user-cancelled. Also prints the human-readable
/// summary the spec's `recovery_hint` calls for.
pub fn outcome_to_exit_code(outcome: RunOutcome) -> i32 {
    match outcome {
        RunOutcome::Completed => 0,
        RunOutcome::NeedsConfirmation { reason } => {
            eprintln!("sunwell: goal needs confirmation before proceeding: {reason}");
            1
        }
        RunOutcome::NeedsClarification { reason } => {
            eprintln!("sunwell: goal is ambiguous: {reason}");
            1
        }
        RunOutcome::Cancelled { goal_hash } => {
            eprintln!("sunwell: run cancelled. Resume with `sunwell review {goal_hash}`.");
            4
        }
        RunOutcome::Escalated { goal_hash, reason } => {
            eprintln!("sunwell: run escalated ({reason}). Resume with `sunwell review {goal_hash}`.");
            if reason == EscalationReason::MaxIterations.as_str() {
                2
            } else {
                3
            }
        }
    }
}

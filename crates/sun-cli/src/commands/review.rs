// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{build_runtime, outcome_to_exit_code, print_events, workspace_path, ProviderArgs};
use crate::exit_error::ExitError;
use std::path::PathBuf;
use sun_core::{EventSource, RunId};
use sun_storage::RecoveryStore;
use tokio_util::sync::CancellationToken;

#[derive(Debug, clap::Args)]
pub struct ReviewArgs {
    /// The goal hash printed when a run escalated or was cancelled.
    pub goal_hash: String,
    /// Workspace root. Defaults to the current directory.
    #[arg(long)]
    pub workspace: Option<PathBuf>,
    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Resume a pending recovery state by goal hash. Prints the status
/// summary the original escalation saved, then runs the same goal
/// again — the orchestrator sees the pending recovery file and resumes
/// from it rather than starting fresh (§4.10).
pub async fn execute(args: ReviewArgs) -> Result<i32, ExitError> {
    let workspace = workspace_path(&args.workspace).map_err(|err| ExitError::new(5, err.to_string()))?;
    let recovery_store = RecoveryStore::new(workspace.join(".sunwell"));
    let pending = recovery_store
        .load(&args.goal_hash)
        .ok_or_else(|| ExitError::new(5, format!("no pending recovery state for goal hash {}", args.goal_hash)))?;

    let counts = pending.status_counts();
    eprintln!(
        "sunwell: resuming goal '{}' (passed={}, failed={}, waiting={})",
        pending.goal.description, counts.passed, counts.failed, counts.waiting
    );
    if let Some(gate) = &pending.failed_gate {
        eprintln!("sunwell: previously failed gate: {gate}");
    }
    if let Some(reason) = &pending.failure_reason {
        eprintln!("sunwell: failure reason: {reason}");
    }

    let (runtime, event_bus, _lock) = build_runtime(&workspace, &args.provider)?;
    let goal = pending.goal.clone();
    let run_id = RunId::new();
    let cancel = CancellationToken::new();
    let ctrl_c = tokio::signal::ctrl_c();
    let run = runtime.run(goal, run_id, EventSource::Cli, &cancel);

    let outcome = tokio::select! {
        result = run => {
            print_events(&event_bus, run_id);
            result.map_err(|err| ExitError::new(5, err.to_string()))?
        }
        _ = ctrl_c => {
            cancel.cancel();
            return Err(ExitError::new(4, "cancelled by user".to_string()));
        }
    };

    Ok(outcome_to_exit_code(outcome))
}

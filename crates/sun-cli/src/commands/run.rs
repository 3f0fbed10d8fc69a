// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{build_runtime, outcome_to_exit_code, print_events, workspace_path, ProviderArgs};
use crate::exit_error::ExitError;
use std::path::PathBuf;
use sun_core::{EventSource, Goal, GoalId, GoalType, RunId};
use tokio_util::sync::CancellationToken;

#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Natural-language description of what to accomplish.
    pub goal: String,
    /// Workspace root. Defaults to the current directory.
    #[arg(long)]
    pub workspace: Option<PathBuf>,
    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Run `goal` to completion, escalation, or cancellation, returning the
/// process exit code from §6: 0 success, 2 gate failure (iteration cap
/// exhausted), 3 escalated to recovery (non-progressing), 4 user-cancelled,
/// 5 system error.
pub async fn execute(args: RunArgs) -> Result<i32, ExitError> {
    let workspace = workspace_path(&args.workspace).map_err(|err| ExitError::new(5, err.to_string()))?;
    let (runtime, event_bus, _lock) = build_runtime(&workspace, &args.provider)?;

    let goal = Goal::new(GoalId::new(), args.goal, GoalType::Task);
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

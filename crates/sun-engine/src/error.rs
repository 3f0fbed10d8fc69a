// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("core invariant violated: {0}")]
    Core(#[from] sun_core::CoreError),
    #[error("storage error: {0}")]
    Storage(#[from] sun_storage::StorageError),
    #[error("adapter error: {0}")]
    Adapter(#[from] sun_adapters::AdapterError),
    #[error("planner could not produce a valid artifact graph: {0}")]
    Planning(String),
    #[error("decomposer could not produce a valid milestone graph: {0}")]
    Decomposition(String),
    #[error("router returned an unparsable classification: {0}")]
    Routing(String),
    #[error("convergence loop failure: {0}")]
    Convergence(String),
    #[error("run cancelled")]
    Cancelled,
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("engine error: {0}")]
    Engine(#[from] sun_engine::EngineError),
    #[error("storage error: {0}")]
    Storage(#[from] sun_storage::StorageError),
    #[error("adapter error: {0}")]
    Adapter(#[from] sun_adapters::AdapterError),
    #[error("wire error: {0}")]
    Wire(#[from] sun_wire::WireError),
    #[error("config error: {0}")]
    Config(String),
    #[error("workspace is locked by another sunwell process")]
    WorkspaceLocked,
    #[error("server at capacity: {0} runs already in progress")]
    AtCapacity(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

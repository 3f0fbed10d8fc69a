// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use sun_core::{AgentEvent, SCHEMA_VERSION};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed event line: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event log I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode an event as a single NDJSON line, including the trailing `\n`.
pub fn encode(event: &AgentEvent) -> Result<String, WireError> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    Ok(line)
}

/// Decode a single NDJSON line (without its trailing newline) into an event.
///
/// Events carrying an unrecognized `v` are still parsed — the schema has no
/// breaking changes yet, so an unexpected version is logged rather than
/// rejected, matching the read-path leniency used throughout storage.
pub fn decode_line(line: &str) -> Result<AgentEvent, WireError> {
    let event: AgentEvent = serde_json::from_str(line.trim_end())?;
    if event.v != SCHEMA_VERSION {
        tracing::warn!(found = event.v, expected = SCHEMA_VERSION, "event schema version mismatch");
    }
    Ok(event)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;

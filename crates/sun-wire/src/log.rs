// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use sun_core::AgentEvent;

use crate::wire::{decode_line, encode, WireError};

/// Append-only NDJSON event log backing a single run's event stream.
///
/// Appends are `O_APPEND` writes followed by an explicit `flush`, so
/// concurrent readers tailing the file always see whole lines. This is
/// the durability primitive the daemon's bus persists through; it does
/// not itself fan events out to subscribers.
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &AgentEvent) -> Result<(), WireError> {
        let line = encode(event)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Replay all events currently on disk, in append order.
    ///
    /// A malformed trailing line (e.g. a torn write after a crash) is
    /// skipped with a `tracing::warn!` rather than aborting the replay.
    pub fn replay(&self) -> Result<Vec<AgentEvent>, WireError> {
        let file = match OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut events = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            match decode_line(&line) {
                Ok(event) => events.push(event),
                Err(err) => tracing::warn!(%err, "skipping malformed event log line"),
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;

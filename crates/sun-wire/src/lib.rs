// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NDJSON wire framing for the agent event stream.
//!
//! One [`AgentEvent`] per line, UTF-8, newline-terminated, as emitted by
//! the daemon and tailed by the CLI and any external subscriber. This
//! crate owns the framing (`encode`/`decode_line`) and the file-backed
//! [`EventLog`] append/replay primitive; the event bus that fans events
//! out to live subscribers lives in the daemon crate.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod log;
mod wire;

pub use log::EventLog;
pub use wire::{decode_line, encode, WireError};

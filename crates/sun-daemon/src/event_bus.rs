// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Bus: fan-out of [`AgentEvent`]s to live subscribers, plus an
//! in-memory retention buffer for `list_events`. A single
//! `parking_lot::Mutex` guards the subscriber list and retention buffer
//! (the Checkpoint Engine's single-mutex pattern, applied here) — there
//! is no background eviction task; retention is swept opportunistically
//! on `broadcast` and `list_events`.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use sun_core::{AgentEvent, EventType, RunId};
use tokio::sync::mpsc;
use tokio::time::timeout;

const SUBSCRIBER_SEND_TIMEOUT: Duration = Duration::from_secs(1);
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;

/// A run is no longer retained once it has been on the bus for
/// `retention_seconds`, or once more than `retention_runs` *runs* (not
/// events — a single run emits many) are held — §4.1's "TTL 1h or 100
/// runs, whichever is smaller". We approximate "smaller" here by
/// evicting on either bound, preferring runs that already reached a
/// terminal event (`task_complete`/`task_failed`/`recovery_saved`) when
/// the run-count bound forces an eviction.
pub struct EventBusConfig {
    pub max_subscribers: usize,
    pub retention_runs: usize,
    pub retention_seconds: u64,
}

impl From<&crate::config::EventBusConfig> for EventBusConfig {
    fn from(cfg: &crate::config::EventBusConfig) -> Self {
        Self { max_subscribers: cfg.max_subscribers, retention_runs: cfg.retention_runs, retention_seconds: cfg.retention_seconds }
    }
}

fn is_terminal(event_type: EventType) -> bool {
    matches!(event_type, EventType::TaskComplete | EventType::TaskFailed | EventType::RecoverySaved)
}

struct RetainedRun {
    run_id: RunId,
    events: Vec<AgentEvent>,
    first_received_at: Instant,
    completed: bool,
}

struct Subscriber {
    id: u64,
    filter: Option<RunId>,
    sender: mpsc::Sender<AgentEvent>,
}

struct Inner {
    subscribers: Vec<Subscriber>,
    runs: VecDeque<RetainedRun>,
    next_subscriber_id: u64,
}

pub struct EventBus {
    inner: Mutex<Inner>,
    config: EventBusConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionRejected;

/// A live subscription. Dropping this (or passing its `id` to
/// [`EventBus::unsubscribe`]) removes the subscriber from the bus.
pub struct Subscription {
    pub id: u64,
    pub receiver: mpsc::Receiver<AgentEvent>,
}

impl EventBus {
    pub fn new(config: EventBusConfig) -> Self {
        Self { inner: Mutex::new(Inner { subscribers: Vec::new(), runs: VecDeque::new(), next_subscriber_id: 0 }), config }
    }

    /// Subscribe to events, optionally filtered to a single run. Rejected
    /// once `max_subscribers` live subscriptions are already held (§4.1,
    /// S6's "subscriber #101 is refused").
    pub fn subscribe(&self, filter: Option<RunId>) -> Result<Subscription, SubscriptionRejected> {
        let mut inner = self.inner.lock();
        if inner.subscribers.len() >= self.config.max_subscribers {
            return Err(SubscriptionRejected);
        }
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        inner.subscribers.push(Subscriber { id, filter, sender });
        Ok(Subscription { id, receiver })
    }

    pub fn unsubscribe(&self, subscription_id: u64) {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|s| s.id != subscription_id);
    }

    /// Broadcast to every matching subscriber with a per-send timeout;
    /// slow subscribers are dropped rather than allowed to stall the bus.
    pub async fn broadcast(&self, event: AgentEvent) {
        let recipients: Vec<(u64, mpsc::Sender<AgentEvent>)> = {
            let mut inner = self.inner.lock();
            self.evict_expired(&mut inner);
            match inner.runs.iter_mut().find(|r| r.run_id == event.run_id) {
                Some(run) => {
                    run.completed |= is_terminal(event.event_type);
                    run.events.push(event.clone());
                }
                None => inner.runs.push_back(RetainedRun {
                    run_id: event.run_id,
                    events: vec![event.clone()],
                    first_received_at: Instant::now(),
                    completed: is_terminal(event.event_type),
                }),
            }
            inner
                .subscribers
                .iter()
                .filter(|s| s.filter.is_none_or(|run_id| run_id == event.run_id))
                .map(|s| (s.id, s.sender.clone()))
                .collect()
        };

        let mut dead = Vec::new();
        for (id, sender) in &recipients {
            match timeout(SUBSCRIBER_SEND_TIMEOUT, sender.send(event.clone())).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) | Err(_) => {
                    tracing::warn!(event_type = ?event.event_type, "dropping slow or closed event bus subscriber");
                    dead.push(*id);
                }
            }
        }
        if !dead.is_empty() {
            let mut inner = self.inner.lock();
            inner.subscribers.retain(|s| !dead.contains(&s.id));
        }
    }

    /// Events retained in memory for a given run, in broadcast order.
    pub fn list_events(&self, run_id: RunId) -> Vec<AgentEvent> {
        let mut inner = self.inner.lock();
        self.evict_expired(&mut inner);
        inner.runs.iter().find(|r| r.run_id == run_id).map(|r| r.events.clone()).unwrap_or_default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    fn evict_expired(&self, inner: &mut Inner) {
        let ttl = Duration::from_secs(self.config.retention_seconds);
        while inner.runs.front().is_some_and(|r| r.first_received_at.elapsed() > ttl) {
            inner.runs.pop_front();
        }
        while inner.runs.len() > self.config.retention_runs {
            match inner.runs.iter().position(|r| r.completed) {
                Some(index) => {
                    inner.runs.remove(index);
                }
                None => {
                    inner.runs.pop_front();
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;

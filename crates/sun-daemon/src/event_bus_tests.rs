// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use sun_core::{EventSource, EventType};

fn event(run_id: RunId) -> AgentEvent {
    AgentEvent::new(EventType::TaskStart, run_id, EventSource::Cli, 0, json!({}))
}

fn bus(max_subscribers: usize) -> EventBus {
    EventBus::new(EventBusConfig { max_subscribers, retention_runs: 100, retention_seconds: 3600 })
}

#[tokio::test]
async fn subscriber_receives_broadcast_event() {
    let bus = bus(100);
    let run_id = RunId::new();
    let mut sub = bus.subscribe(None).unwrap();
    bus.broadcast(event(run_id)).await;
    let received = sub.receiver.recv().await.unwrap();
    assert_eq!(received.run_id, run_id);
}

#[tokio::test]
async fn filtered_subscriber_ignores_other_runs() {
    let bus = bus(100);
    let wanted = RunId::new();
    let other = RunId::new();
    let mut sub = bus.subscribe(Some(wanted)).unwrap();
    bus.broadcast(event(other)).await;
    bus.broadcast(event(wanted)).await;
    let received = sub.receiver.recv().await.unwrap();
    assert_eq!(received.run_id, wanted);
}

#[tokio::test]
async fn subscription_cap_rejects_overflow() {
    let bus = bus(2);
    let _a = bus.subscribe(None).unwrap();
    let _b = bus.subscribe(None).unwrap();
    assert!(bus.subscribe(None).is_err());
}

#[tokio::test]
async fn unsubscribe_stops_future_delivery() {
    let bus = bus(100);
    let sub = bus.subscribe(None).unwrap();
    bus.unsubscribe(sub.id);
    assert_eq!(bus.subscriber_count(), 0);
}

#[tokio::test]
async fn list_events_returns_retained_events_for_run() {
    let bus = bus(100);
    let run_id = RunId::new();
    bus.broadcast(event(run_id)).await;
    bus.broadcast(event(RunId::new())).await;
    let events = bus.list_events(run_id);
    assert_eq!(events.len(), 1);
}

fn terminal_event(run_id: RunId) -> AgentEvent {
    AgentEvent::new(EventType::TaskComplete, run_id, EventSource::Cli, 0, json!({}))
}

/// `retention_runs` caps the number of distinct runs, not raw events — a
/// single run with several in-flight events must be evicted as a unit
/// once a newer run pushes the bus over the cap, not trimmed one event
/// at a time from the front.
#[tokio::test]
async fn retention_runs_evicts_whole_runs_not_individual_events() {
    let bus = EventBus::new(EventBusConfig { max_subscribers: 100, retention_runs: 1, retention_seconds: 3600 });
    let run_a = RunId::new();
    bus.broadcast(event(run_a)).await;
    bus.broadcast(event(run_a)).await;
    bus.broadcast(event(run_a)).await;
    let run_b = RunId::new();
    bus.broadcast(event(run_b)).await;

    assert_eq!(bus.list_events(run_a).len(), 0);
    assert_eq!(bus.list_events(run_b).len(), 1);
}

#[tokio::test]
async fn completed_runs_are_evicted_before_incomplete_ones() {
    let bus = EventBus::new(EventBusConfig { max_subscribers: 100, retention_runs: 1, retention_seconds: 3600 });
    let completed = RunId::new();
    bus.broadcast(terminal_event(completed)).await;
    let incomplete = RunId::new();
    bus.broadcast(event(incomplete)).await;

    assert_eq!(bus.list_events(completed).len(), 0);
    assert_eq!(bus.list_events(incomplete).len(), 1);
}

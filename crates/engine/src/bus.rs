// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-job event log with broadcast subscriptions.
//!
//! The bus owns each job's event sequence: appends are serialized under
//! the bus lock, cursor reads copy a slice, and subscriber dispatch
//! happens off-lock with a bounded per-send timeout so a slow or dead
//! subscriber never blocks the publisher or reorders events for others.

use nr_core::{ExecutionEvent, JobId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

/// Default per-subscriber send timeout.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Buffered events per subscriber channel.
const SUBSCRIBER_CAPACITY: usize = 64;

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<ExecutionEvent>,
}

#[derive(Default)]
struct BusState {
    events: HashMap<JobId, Vec<ExecutionEvent>>,
    subscribers: HashMap<JobId, Vec<Subscriber>>,
    next_subscriber_id: u64,
}

/// Per-job ordered event log with live fan-out.
pub struct EventBus {
    state: Mutex<BusState>,
    send_timeout: Duration,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_send_timeout(SEND_TIMEOUT)
    }

    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self { state: Mutex::new(BusState::default()), send_timeout }
    }

    /// Append an event and hand it to live subscribers.
    ///
    /// The append is O(1) under the lock; dispatch runs off-lock.
    /// Subscribers that error or miss the send timeout are dropped.
    /// Events arriving after a job's `job_complete` are discarded: the
    /// final event terminates the sequence.
    pub async fn publish(&self, event: ExecutionEvent) {
        let job_id = event.job_id;
        let is_final = event.is_final();
        let targets: Vec<(u64, mpsc::Sender<ExecutionEvent>)> = {
            let mut state = self.state.lock();
            {
                let events = state.events.entry(job_id).or_default();
                if events.last().is_some_and(ExecutionEvent::is_final) {
                    tracing::debug!(job_id = %job_id, "event after job_complete discarded");
                    return;
                }
                events.push(event.clone());
            }
            state
                .subscribers
                .get(&job_id)
                .map(|subs| subs.iter().map(|s| (s.id, s.tx.clone())).collect())
                .unwrap_or_default()
        };

        let mut dropped = Vec::new();
        for (id, tx) in targets {
            if tokio::time::timeout(self.send_timeout, tx.send(event.clone())).await.is_err()
                || tx.is_closed()
            {
                dropped.push(id);
            }
        }

        let mut state = self.state.lock();
        if is_final {
            // Stream ends after job_complete; closing the senders lets
            // receivers observe termination.
            state.subscribers.remove(&job_id);
        } else if !dropped.is_empty() {
            if let Some(subs) = state.subscribers.get_mut(&job_id) {
                subs.retain(|s| !dropped.contains(&s.id));
            }
        }
    }

    /// Cursor read from `start_index`.
    pub fn list(&self, job_id: JobId, start_index: usize) -> Vec<ExecutionEvent> {
        let state = self.state.lock();
        state
            .events
            .get(&job_id)
            .map(|events| events.get(start_index..).unwrap_or_default().to_vec())
            .unwrap_or_default()
    }

    pub fn event_count(&self, job_id: JobId) -> usize {
        self.state.lock().events.get(&job_id).map(Vec::len).unwrap_or(0)
    }

    /// Register a live subscriber with backfill from `start_index`.
    ///
    /// The returned receiver yields a contiguous suffix of the job's
    /// stream; the channel closes after the final event. When the stream
    /// already ended, the backfill carries it and the receiver is closed.
    pub fn subscribe(
        &self,
        job_id: JobId,
        start_index: usize,
    ) -> (Vec<ExecutionEvent>, mpsc::Receiver<ExecutionEvent>) {
        let mut state = self.state.lock();
        let backfill: Vec<ExecutionEvent> = state
            .events
            .get(&job_id)
            .map(|events| events.get(start_index..).unwrap_or_default().to_vec())
            .unwrap_or_default();

        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        let finished = state
            .events
            .get(&job_id)
            .and_then(|events| events.last())
            .is_some_and(ExecutionEvent::is_final);
        if !finished {
            let id = state.next_subscriber_id;
            state.next_subscriber_id += 1;
            state.subscribers.entry(job_id).or_default().push(Subscriber { id, tx });
        }
        (backfill, rx)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job publish/subscribe fan-out

use gantry_core::{JobEvent, JobId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

type Subscribers = Vec<(u64, mpsc::UnboundedSender<JobEvent>)>;

#[derive(Default)]
struct BusState {
    next_id: u64,
    subscribers: HashMap<JobId, Subscribers>,
}

/// Registry of live subscriptions, keyed by job
#[derive(Default)]
pub struct EventBus {
    state: Mutex<BusState>,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new unbounded delivery channel for `job_id`.
    pub fn subscribe(self: &Arc<Self>, job_id: &JobId) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            state
                .subscribers
                .entry(job_id.clone())
                .or_default()
                .push((id, tx));
            id
        };
        tracing::debug!(%job_id, subscription = id, "subscribed");
        Subscription {
            bus: Arc::clone(self),
            job_id: job_id.clone(),
            id,
            rx,
        }
    }

    /// Remove one subscription; drops the job entry when it becomes empty.
    pub fn unsubscribe(&self, job_id: &JobId, id: u64) {
        let mut state = self.state.lock();
        if let Some(subscribers) = state.subscribers.get_mut(job_id) {
            subscribers.retain(|(sub_id, _)| *sub_id != id);
            if subscribers.is_empty() {
                state.subscribers.remove(job_id);
            }
        }
    }

    /// Deliver `event` to every subscriber of `job_id`, in registration order.
    ///
    /// Delivery failures are logged and otherwise ignored.
    pub fn publish(&self, job_id: &JobId, event: &JobEvent) {
        let state = self.state.lock();
        let Some(subscribers) = state.subscribers.get(job_id) else {
            return;
        };
        for (id, tx) in subscribers {
            if tx.send(event.clone()).is_err() {
                tracing::debug!(%job_id, subscription = id, "dropping event for closed subscriber");
            }
        }
    }

    pub fn subscriber_count(&self, job_id: &str) -> usize {
        self.state
            .lock()
            .subscribers
            .get(job_id)
            .map_or(0, Vec::len)
    }

    /// Number of jobs with at least one subscriber
    pub fn job_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

/// A live interest in one job's events
///
/// Deregisters itself from the bus when dropped.
pub struct Subscription {
    bus: Arc<EventBus>,
    job_id: JobId,
    id: u64,
    rx: mpsc::UnboundedReceiver<JobEvent>,
}

impl Subscription {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub async fn recv(&mut self) -> Option<JobEvent> {
        self.rx.recv().await
    }

    /// Next already-delivered event, without waiting
    pub fn try_recv(&mut self) -> Option<JobEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.job_id, self.id);
        tracing::debug!(job_id = %self.job_id, subscription = self.id, "unsubscribed");
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;

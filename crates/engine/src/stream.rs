// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live per-client view of one job's events

use crate::event_bus::Subscription;
use gantry_core::{JobEvent, JobId};
use std::collections::VecDeque;
use std::time::Duration;

/// One item delivered to a streaming client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Event(JobEvent),
    /// Nothing happened for a full heartbeat interval
    Heartbeat,
}

/// Snapshot, then live events, then a `complete` marker.
///
/// Created by [`crate::Runtime::stream`]. The subscription is released as
/// soon as the stream ends, or when the stream is dropped.
pub struct JobStream {
    job_id: JobId,
    pending: VecDeque<JobEvent>,
    subscription: Option<Subscription>,
    heartbeat: Duration,
}

impl JobStream {
    pub(crate) fn new(snapshot: JobEvent, subscription: Subscription, heartbeat: Duration) -> Self {
        let job_id = subscription.job_id().clone();
        let mut stream = Self {
            job_id,
            pending: VecDeque::new(),
            subscription: Some(subscription),
            heartbeat,
        };
        // A job waiting for input can still resume, so only a terminal
        // snapshot closes the stream
        let terminal =
            matches!(&snapshot, JobEvent::Status { status, .. } if status.is_terminal());
        if terminal {
            stream.enqueue(snapshot);
        } else {
            stream.pending.push_back(snapshot);
        }
        stream
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Queue an event; a stream-ending status also queues `complete` and
    /// releases the subscription.
    fn enqueue(&mut self, event: JobEvent) {
        let ends = event.ends_stream();
        self.pending.push_back(event);
        if ends {
            self.pending.push_back(JobEvent::Complete);
            self.subscription = None;
        }
    }

    /// Next item, or `None` once the `complete` marker has been delivered.
    pub async fn next(&mut self) -> Option<StreamItem> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(StreamItem::Event(event));
            }
            let subscription = self.subscription.as_mut()?;
            match tokio::time::timeout(self.heartbeat, subscription.recv()).await {
                Err(_) => return Some(StreamItem::Heartbeat),
                Ok(Some(event)) => self.enqueue(event),
                Ok(None) => {
                    self.subscription = None;
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;

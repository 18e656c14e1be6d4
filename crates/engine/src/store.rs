// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job registry

use gantry_adapters::WorkerHandle;
use gantry_core::{Job, JobId, JobStatus};
use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::Arc;

/// Mutable state of one job, guarded by the record's mutex
pub(crate) struct JobSlot {
    pub job: Job,
    /// Live worker for the current attempt
    pub worker: Option<WorkerHandle>,
    /// Set by cancel and shutdown; the executor must stop touching the job
    pub stopping: bool,
}

impl JobSlot {
    /// Whether worker events may still change this job
    pub fn is_live(&self) -> bool {
        !self.stopping && self.job.status == JobStatus::Running
    }
}

/// One job plus its per-job lock
pub(crate) struct JobRecord {
    slot: Mutex<JobSlot>,
}

impl JobRecord {
    fn new(job: Job) -> Self {
        Self {
            slot: Mutex::new(JobSlot {
                job,
                worker: None,
                stopping: false,
            }),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, JobSlot> {
        self.slot.lock()
    }

    pub fn snapshot(&self) -> Job {
        self.slot.lock().job.clone()
    }
}

/// Job records in creation order
///
/// The map lock is only held long enough to clone an `Arc`; it is never held
/// while a job lock is taken for writing.
#[derive(Default)]
pub(crate) struct JobStore {
    jobs: RwLock<IndexMap<JobId, Arc<JobRecord>>>,
}

impl JobStore {
    pub fn insert(&self, job: Job) -> Arc<JobRecord> {
        let record = Arc::new(JobRecord::new(job));
        let job_id = record.lock().job.job_id.clone();
        self.jobs.write().insert(job_id, Arc::clone(&record));
        record
    }

    pub fn get(&self, job_id: &str) -> Option<Arc<JobRecord>> {
        self.jobs.read().get(job_id).cloned()
    }

    pub fn records(&self) -> Vec<Arc<JobRecord>> {
        self.jobs.read().values().cloned().collect()
    }

    pub fn snapshots(&self) -> Vec<Job> {
        self.records().iter().map(|r| r.snapshot()).collect()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

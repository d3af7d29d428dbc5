// Thread-safe min-priority queue of pending jobs

use crate::models::Job;
use chrono::{DateTime, Utc};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Heap entry: orders by fire time, then by insertion sequence
struct QueuedJob {
    job: Job,
    seq: u64,
}

impl QueuedJob {
    fn key(&self) -> (DateTime<Utc>, u64) {
        (self.job.next_fire_at(), self.seq)
    }
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earliest first, FIFO among equal deadlines
        Reverse(self.key()).cmp(&Reverse(other.key()))
    }
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<QueuedJob>,
    next_seq: u64,
}

/// Pending jobs ordered by `next_fire_at` ascending.
///
/// Every operation takes one short mutex; no user code runs under the lock.
#[derive(Default)]
pub struct JobQueue {
    state: Mutex<QueueState>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // The heap stays consistent even if a holder panicked mid-call
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, job: Job) {
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.heap.push(QueuedJob { job, seq });
    }

    /// Clone of the earliest job, left in place
    pub fn peek_min(&self) -> Option<Job> {
        self.lock().heap.peek().map(|entry| entry.job.clone())
    }

    /// Fire time of the earliest job
    pub fn peek_deadline(&self) -> Option<DateTime<Utc>> {
        self.lock().heap.peek().map(|entry| entry.job.next_fire_at())
    }

    pub fn remove_min(&self) -> Option<Job> {
        self.lock().heap.pop().map(|entry| entry.job)
    }

    /// Remove the earliest job only if it is due at `now`
    pub fn remove_due(&self, now: DateTime<Utc>) -> Option<Job> {
        let mut state = self.lock();
        match state.heap.peek() {
            Some(entry) if entry.job.is_due(now) => state.heap.pop().map(|entry| entry.job),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }
}

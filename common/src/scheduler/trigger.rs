// Trigger: the single thread deciding when pending jobs are due

use crate::scheduler::queue::JobQueue;
use crate::scheduler::signal::WakeSignal;
use crate::telemetry;
use crate::worker::JobDispatcher;
use chrono::{DateTime, Utc};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace};

/// What the trigger should do next, given the queue head and the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// Queue is empty: park until any job is scheduled
    IdleWait,
    /// Earliest job fires at the given instant
    DeadlineWait(DateTime<Utc>),
    /// Earliest job is due now
    Dispatch,
}

/// Dispatch loop state shared with the scheduling façade
pub struct Trigger {
    queue: Arc<JobQueue>,
    signal: Arc<WakeSignal>,
    dispatcher: Arc<dyn JobDispatcher>,
}

impl Trigger {
    pub fn new(
        queue: Arc<JobQueue>,
        signal: Arc<WakeSignal>,
        dispatcher: Arc<dyn JobDispatcher>,
    ) -> Self {
        Self {
            queue,
            signal,
            dispatcher,
        }
    }

    pub fn state(&self, now: DateTime<Utc>) -> TriggerState {
        match self.queue.peek_deadline() {
            None => TriggerState::IdleWait,
            Some(fire_at) if fire_at <= now => TriggerState::Dispatch,
            Some(fire_at) => TriggerState::DeadlineWait(fire_at),
        }
    }

    /// Dispatch the earliest job if it is due and queue its next occurrence.
    ///
    /// Returns `false` when nothing was due.
    pub fn dispatch_due(&self, now: DateTime<Utc>) -> bool {
        let Some(job) = self.queue.remove_due(now) else {
            return false;
        };

        let lag = (now - job.next_fire_at()).to_std().unwrap_or_default();
        self.dispatcher.submit(Arc::clone(job.action()));

        // Rescheduled regardless of how the body turns out
        let next = job.reschedule(Utc::now());
        let next_fire_at = next.next_fire_at();
        self.queue.insert(next);

        telemetry::record_job_dispatched(lag.as_secs_f64());
        telemetry::update_queue_depth(self.queue.len());
        debug!(
            fire_at = %job.next_fire_at(),
            lag_ms = lag.as_millis() as u64,
            next_fire_at = %next_fire_at,
            "Job dispatched"
        );
        true
    }

    /// Evaluate the queue once and either dispatch or wait
    pub fn run_once(&self) {
        let now = Utc::now();
        match self.state(now) {
            TriggerState::IdleWait => {
                trace!("Queue empty, waiting for a job");
                self.signal.park();
            }
            TriggerState::DeadlineWait(fire_at) => {
                let wait = (fire_at - now).to_std().unwrap_or(Duration::ZERO);
                trace!(wait_ms = wait.as_millis() as u64, "Waiting for next deadline");
                // Woken early by a new job or by the deadline: both lead back to
                // re-evaluating the (possibly changed) queue head
                self.signal.park_timeout(wait);
            }
            TriggerState::Dispatch => {
                self.dispatch_due(now);
            }
        }
    }

    pub fn run(self) {
        info!("Trigger started");
        loop {
            self.run_once();
        }
    }

    /// Start the dispatch loop on a dedicated, named thread
    pub fn spawn(self, thread_name: &str) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Job};
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Dispatcher that runs actions inline on the trigger thread
    struct InlineDispatcher {
        submitted: AtomicUsize,
    }

    impl JobDispatcher for InlineDispatcher {
        fn submit(&self, action: Action) {
            self.submitted.fetch_add(1, Ordering::SeqCst);
            action();
        }
    }

    fn trigger_with_queue() -> (Trigger, Arc<JobQueue>, Arc<InlineDispatcher>) {
        let queue = Arc::new(JobQueue::new());
        let dispatcher = Arc::new(InlineDispatcher {
            submitted: AtomicUsize::new(0),
        });
        let trigger = Trigger::new(
            Arc::clone(&queue),
            Arc::new(WakeSignal::new()),
            Arc::clone(&dispatcher) as Arc<dyn JobDispatcher>,
        );
        (trigger, queue, dispatcher)
    }

    fn labelled(label: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Action {
        let log = Arc::clone(log);
        Arc::new(move || log.lock().unwrap().push(label))
    }

    #[test]
    fn test_state_transitions() {
        let (trigger, queue, _) = trigger_with_queue();
        let now = Utc::now();
        assert_eq!(trigger.state(now), TriggerState::IdleWait);

        let later = now + ChronoDuration::seconds(5);
        queue.insert(Job::new(Arc::new(|| {}), later, ChronoDuration::seconds(5)));
        assert_eq!(trigger.state(now), TriggerState::DeadlineWait(later));
        assert_eq!(trigger.state(later), TriggerState::Dispatch);
    }

    #[test]
    fn test_dispatch_reinserts_next_occurrence() {
        let (trigger, queue, dispatcher) = trigger_with_queue();
        let now = Utc::now();
        queue.insert(Job::new(Arc::new(|| {}), now, ChronoDuration::seconds(2)));

        assert!(trigger.dispatch_due(now));
        assert_eq!(dispatcher.submitted.load(Ordering::SeqCst), 1);
        assert_eq!(queue.len(), 1);

        let next = queue.peek_min().unwrap();
        assert!(next.next_fire_at() >= now + ChronoDuration::seconds(2));
        assert_eq!(next.interval(), ChronoDuration::seconds(2));
    }

    #[test]
    fn test_nothing_due_dispatches_nothing() {
        let (trigger, queue, dispatcher) = trigger_with_queue();
        let now = Utc::now();
        queue.insert(Job::new(
            Arc::new(|| {}),
            now + ChronoDuration::seconds(1),
            ChronoDuration::seconds(1),
        ));

        assert!(!trigger.dispatch_due(now));
        assert_eq!(dispatcher.submitted.load(Ordering::SeqCst), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_stalled_job_dispatches_once() {
        let (trigger, queue, dispatcher) = trigger_with_queue();
        let now = Utc::now();
        // Ten intervals overdue
        queue.insert(Job::new(
            Arc::new(|| {}),
            now - ChronoDuration::seconds(10),
            ChronoDuration::seconds(1),
        ));

        assert!(trigger.dispatch_due(now));
        assert!(!trigger.dispatch_due(now));
        assert_eq!(dispatcher.submitted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_due_jobs_dispatch_in_deadline_order() {
        let (trigger, queue, _) = trigger_with_queue();
        let log = Arc::new(Mutex::new(Vec::new()));
        let now = Utc::now();
        let interval = ChronoDuration::hours(1);

        queue.insert(Job::new(labelled("c", &log), now - ChronoDuration::milliseconds(1), interval));
        queue.insert(Job::new(labelled("a", &log), now - ChronoDuration::milliseconds(30), interval));
        queue.insert(Job::new(labelled("b", &log), now - ChronoDuration::milliseconds(20), interval));

        while trigger.dispatch_due(now) {}
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_run_once_returns_when_woken_from_idle() {
        let queue = Arc::new(JobQueue::new());
        let signal = Arc::new(WakeSignal::new());
        let dispatcher = Arc::new(InlineDispatcher {
            submitted: AtomicUsize::new(0),
        });
        let trigger = Trigger::new(
            Arc::clone(&queue),
            Arc::clone(&signal),
            dispatcher as Arc<dyn JobDispatcher>,
        );

        // Permit delivered before the trigger parks
        signal.unpark();
        trigger.run_once();
        assert!(queue.is_empty());
    }
}

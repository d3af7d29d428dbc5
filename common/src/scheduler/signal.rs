// Permit-based wake signal for the trigger thread

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A single accumulating permit.
///
/// `unpark` stores the permit even when nobody is waiting, so a wake sent
/// just before the trigger parks is still observed. Repeated unparks
/// collapse into one permit.
#[derive(Default)]
pub struct WakeSignal {
    permit: Mutex<bool>,
    cvar: Condvar,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.permit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn unpark(&self) {
        let mut permit = self.lock();
        *permit = true;
        self.cvar.notify_one();
    }

    /// Block until a permit is available, then consume it
    pub fn park(&self) {
        let mut permit = self.lock();
        while !*permit {
            permit = self
                .cvar
                .wait(permit)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *permit = false;
    }

    /// Block until a permit arrives or `timeout` elapses.
    ///
    /// Returns `true` when woken by a permit, `false` on timeout.
    pub fn park_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut permit = self.lock();
        loop {
            if *permit {
                *permit = false;
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            permit = self
                .cvar
                .wait_timeout(permit, remaining)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_unpark_before_park_is_not_lost() {
        let signal = WakeSignal::new();
        signal.unpark();

        let started = Instant::now();
        signal.park();
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_permits_do_not_accumulate_past_one() {
        let signal = WakeSignal::new();
        signal.unpark();
        signal.unpark();
        signal.unpark();

        assert!(signal.park_timeout(Duration::from_millis(10)));
        assert!(!signal.park_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_park_timeout_expires_without_permit() {
        let signal = WakeSignal::new();
        let started = Instant::now();
        assert!(!signal.park_timeout(Duration::from_millis(50)));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_unpark_wakes_parked_thread() {
        let signal = Arc::new(WakeSignal::new());
        let waiter = Arc::clone(&signal);

        let handle = thread::spawn(move || {
            let started = Instant::now();
            let woken = waiter.park_timeout(Duration::from_secs(10));
            (woken, started.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        signal.unpark();

        let (woken, waited) = handle.join().unwrap();
        assert!(woken);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_indefinite_park_released_by_other_thread() {
        let signal = Arc::new(WakeSignal::new());
        let waker = Arc::clone(&signal);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            waker.unpark();
        });

        signal.park();
        handle.join().unwrap();
    }
}

//! Cooperative stop signalling between a run and its controllers

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Flags {
    cancel: bool,
    emergency: bool,
}

impl Flags {
    fn any(&self) -> bool {
        self.cancel || self.emergency
    }
}

/// Cancel and emergency-stop flags with an interruptible wait
///
/// Cloning shares the flags.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<Flags>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop at its next waypoint boundary
    pub fn request_cancel(&self) {
        self.raise(|flags| flags.cancel = true);
    }

    /// Mark an emergency stop
    pub fn request_emergency_stop(&self) {
        self.raise(|flags| flags.emergency = true);
    }

    fn raise(&self, set: impl FnOnce(&mut Flags)) {
        let (lock, cvar) = &*self.inner;
        let mut flags = lock.lock();
        set(&mut flags);
        cvar.notify_all();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.inner.0.lock().cancel
    }

    pub fn is_emergency_stop(&self) -> bool {
        self.inner.0.lock().emergency
    }

    /// Check if either flag is raised
    pub fn is_stop_requested(&self) -> bool {
        self.inner.0.lock().any()
    }

    /// Clear both flags
    pub fn reset(&self) {
        *self.inner.0.lock() = Flags::default();
    }

    /// Sleep for `timeout` unless a stop is raised first
    ///
    /// Returns `true` if the wait ended because of a stop request (including
    /// one raised before the call).
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let (lock, cvar) = &*self.inner;
        let mut flags = lock.lock();
        while !flags.any() {
            if cvar.wait_until(&mut flags, deadline).timed_out() {
                break;
            }
        }
        flags.any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_times_out_without_request() {
        let signal = StopSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_pending_request_returns_immediately() {
        let signal = StopSignal::new();
        signal.request_cancel();
        let start = Instant::now();
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_emergency_stop_interrupts_wait() {
        let signal = StopSignal::new();
        let remote = signal.clone();
        let waiter = std::thread::spawn(move || remote.wait_timeout(Duration::from_secs(10)));

        std::thread::sleep(Duration::from_millis(20));
        signal.request_emergency_stop();

        assert!(waiter.join().unwrap());
        assert!(signal.is_emergency_stop());
        assert!(!signal.is_cancel_requested());
    }

    #[test]
    fn test_reset_clears_flags() {
        let signal = StopSignal::new();
        signal.request_cancel();
        signal.request_emergency_stop();
        signal.reset();
        assert!(!signal.is_stop_requested());
    }
}

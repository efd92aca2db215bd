//! Session counters, modeled on the teacher's `tcp::metrics::ConnectionCount`.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct SessionCounters {
    current: AtomicUsize,
    total: AtomicUsize,
    errors: AtomicUsize,
    simulating: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSnapshot {
    pub current: usize,
    pub total: usize,
    pub errors: usize,
    pub simulating: usize,
}

impl SessionCounters {
    pub fn session_opened(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_closed(&self) {
        self.current
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1))
            .ok();
    }

    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entered_simulation(&self) {
        self.simulating.fetch_add(1, Ordering::Relaxed);
    }

    pub fn left_simulation(&self) {
        self.simulating
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1))
            .ok();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current: self.current.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            simulating: self.simulating.load(Ordering::Relaxed),
        }
    }
}

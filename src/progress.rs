//! Progress reporting for long request loops.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives one tick per request issued by a chunked or per-entity loop.
pub trait Progress: Send + Sync {
    fn tick(&self);
}

/// Prints one `.` per tick to stderr.
#[derive(Debug, Default)]
pub struct Ticker;

impl Progress for Ticker {
    fn tick(&self) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, ".");
        let _ = stderr.flush();
    }
}

/// Ignores ticks.
#[derive(Debug, Default)]
pub struct Silent;

impl Progress for Silent {
    fn tick(&self) {}
}

/// Counts ticks; useful for asserting how many requests a loop issued.
#[derive(Debug, Default)]
pub struct TickCounter(AtomicUsize);

impl TickCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

impl Progress for TickCounter {
    fn tick(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

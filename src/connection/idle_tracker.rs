use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Last-read and last-write timestamps of a connection, updated lock-free
/// from the reader and writer tasks.
#[derive(Debug)]
pub struct IdleTracker {
    origin: Instant,
    last_read_micros: AtomicU64,
    last_write_micros: AtomicU64,
}

impl IdleTracker {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_read_micros: AtomicU64::new(0),
            last_write_micros: AtomicU64::new(0),
        }
    }

    fn elapsed_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    pub fn mark_read(&self) {
        self.last_read_micros
            .store(self.elapsed_micros(), Ordering::Relaxed);
    }

    pub fn mark_write(&self) {
        self.last_write_micros
            .store(self.elapsed_micros(), Ordering::Relaxed);
    }

    pub fn read_idle(&self) -> Duration {
        let last = self.last_read_micros.load(Ordering::Relaxed);
        Duration::from_micros(self.elapsed_micros().saturating_sub(last))
    }

    pub fn write_idle(&self) -> Duration {
        let last = self.last_write_micros.load(Ordering::Relaxed);
        Duration::from_micros(self.elapsed_micros().saturating_sub(last))
    }
}

impl Default for IdleTracker {
    fn default() -> Self {
        Self::new()
    }
}

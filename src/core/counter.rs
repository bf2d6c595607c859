use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide number of collages delivered successfully.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    total: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one and returns the new total.
    pub fn increment(&self) -> u64 {
        self.total.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

use folio_types::Height;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the external, non-decreasing height.
///
/// The registry only reads it; advancing it is the environment's job.
pub trait HeightClock: Send + Sync {
    fn current_height(&self) -> Height;
}

/// Clock driven by hand, for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    height: AtomicU64,
}

impl ManualClock {
    pub fn new(height: Height) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Move the clock forward by `delta` and return the new height.
    pub fn advance(&self, delta: Height) -> Height {
        self.height.fetch_add(delta, Ordering::SeqCst) + delta
    }

    /// Jump to `height`. Never moves backwards.
    pub fn set(&self, height: Height) -> Height {
        self.height.fetch_max(height, Ordering::SeqCst).max(height)
    }
}

impl HeightClock for ManualClock {
    fn current_height(&self) -> Height {
        self.height.load(Ordering::SeqCst)
    }
}

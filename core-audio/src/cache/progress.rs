//! Cache fill progress snapshots.

use serde::{Deserialize, Serialize};

/// A point-in-time view of how far the disk cache has filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheProgress {
    /// Samples from the start of the stream already in the cache
    pub decoded_samples: u64,
    /// Total samples in the stream
    pub total_samples: u64,
}

impl CacheProgress {
    pub fn new(decoded_samples: u64, total_samples: u64) -> Self {
        Self {
            decoded_samples,
            total_samples,
        }
    }

    /// Fill percentage (0.0 - 100.0). An empty stream counts as complete.
    pub fn percent(&self) -> f64 {
        if self.total_samples == 0 {
            return 100.0;
        }
        (self.decoded_samples as f64 / self.total_samples as f64) * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.decoded_samples >= self.total_samples
    }

    pub fn remaining_samples(&self) -> u64 {
        self.total_samples.saturating_sub(self.decoded_samples)
    }
}

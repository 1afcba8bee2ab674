// ============================================================================
// Engine Configuration
// ============================================================================

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default capacity of each per-symbol request queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Configuration for the dispatcher and its symbol workers.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Capacity of each symbol worker's bounded request queue.
    ///
    /// A full queue surfaces back-pressure to the submitter instead of
    /// buffering without bound. Tune against the expected arrival rate and
    /// the acceptable submit latency.
    pub queue_capacity: usize,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the per-symbol request queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

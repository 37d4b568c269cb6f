//! Retention cap for example collections.
//!
//! Collections are ordered by insertion: index 0 is the oldest record.
//! When a write would leave more than `max` records, the oldest are evicted
//! from the front until exactly `max` remain.
//!
//! ```text
//! [e1 e2 ... e10] + e11  ──▶  [e2 ... e10 e11]   evicted: e1
//! ```

use crate::types::Example;

/// Result of applying the retention cap.
#[derive(Debug, Default)]
pub struct RetentionOutcome {
    /// Records that stay, in original order.
    pub retained: Vec<Example>,
    /// Ids of records dropped, oldest first.
    pub evicted: Vec<String>,
}

/// Keep the newest `max` examples by insertion order.
///
/// `max` of 0 would empty every collection; configuration validation
/// rejects it before it reaches here, so it is treated as 1.
#[must_use]
pub fn apply_retention(mut examples: Vec<Example>, max: usize) -> RetentionOutcome {
    let max = max.max(1);
    if examples.len() <= max {
        return RetentionOutcome {
            retained: examples,
            evicted: Vec::new(),
        };
    }

    let overflow = examples.len() - max;
    let evicted = examples.drain(..overflow).map(|e| e.id).collect();
    RetentionOutcome {
        retained: examples,
        evicted,
    }
}

//! Runtime counters and span names.
//!
//! Lock-free `AtomicU64` counters incremented on the request path and
//! rendered as Prometheus text by the server's `/metrics` route.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters.
pub static COUNTERS: CurationCounters = CurationCounters::new();

/// Atomic counters for store and chat events.
pub struct CurationCounters {
    /// Examples created through add-example.
    pub examples_added: AtomicU64,
    /// Examples dropped by the retention cap.
    pub examples_evicted: AtomicU64,
    /// Corrections applied.
    pub corrections_applied: AtomicU64,
    /// Collections reset.
    pub resets: AtomicU64,
    /// Backup snapshots written.
    pub backups_created: AtomicU64,
    /// Collection writes completed.
    pub saves_completed: AtomicU64,
    /// Chat replies served by the gateway tier.
    pub chat_gateway: AtomicU64,
    /// Chat replies served by a direct endpoint.
    pub chat_direct: AtomicU64,
    /// Chat replies served by the local mock.
    pub chat_mock: AtomicU64,
    /// Network attempts that failed and fell through.
    pub chat_fallthroughs: AtomicU64,
    /// Structured correction calls that succeeded.
    pub correction_calls_ok: AtomicU64,
    /// Structured correction calls that returned `success=false`.
    pub correction_calls_failed: AtomicU64,
}

impl CurationCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            examples_added: AtomicU64::new(0),
            examples_evicted: AtomicU64::new(0),
            corrections_applied: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            backups_created: AtomicU64::new(0),
            saves_completed: AtomicU64::new(0),
            chat_gateway: AtomicU64::new(0),
            chat_direct: AtomicU64::new(0),
            chat_mock: AtomicU64::new(0),
            chat_fallthroughs: AtomicU64::new(0),
            correction_calls_ok: AtomicU64::new(0),
            correction_calls_failed: AtomicU64::new(0),
        }
    }

    /// Increment a counter by one.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            examples_added: self.examples_added.load(Ordering::Relaxed),
            examples_evicted: self.examples_evicted.load(Ordering::Relaxed),
            corrections_applied: self.corrections_applied.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            backups_created: self.backups_created.load(Ordering::Relaxed),
            saves_completed: self.saves_completed.load(Ordering::Relaxed),
            chat_replies: [
                self.chat_gateway.load(Ordering::Relaxed),
                self.chat_direct.load(Ordering::Relaxed),
                self.chat_mock.load(Ordering::Relaxed),
            ],
            chat_fallthroughs: self.chat_fallthroughs.load(Ordering::Relaxed),
            correction_calls: [
                self.correction_calls_ok.load(Ordering::Relaxed),
                self.correction_calls_failed.load(Ordering::Relaxed),
            ],
        }
    }
}

impl Default for CurationCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone)]
pub struct CounterSnapshot {
    /// Examples added.
    pub examples_added: u64,
    /// Examples evicted.
    pub examples_evicted: u64,
    /// Corrections applied.
    pub corrections_applied: u64,
    /// Collections reset.
    pub resets: u64,
    /// Backups written.
    pub backups_created: u64,
    /// Saves completed.
    pub saves_completed: u64,
    /// Chat replies by tier [gateway, direct, mock].
    pub chat_replies: [u64; 3],
    /// Failed network attempts.
    pub chat_fallthroughs: u64,
    /// Correction calls [ok, failed].
    pub correction_calls: [u64; 2],
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP daxcur_examples_added_total Examples created through add-example\n\
             # TYPE daxcur_examples_added_total counter\n\
             daxcur_examples_added_total {}\n\
             # HELP daxcur_examples_evicted_total Examples dropped by the retention cap\n\
             # TYPE daxcur_examples_evicted_total counter\n\
             daxcur_examples_evicted_total {}\n\
             # HELP daxcur_corrections_applied_total Corrections applied\n\
             # TYPE daxcur_corrections_applied_total counter\n\
             daxcur_corrections_applied_total {}\n\
             # HELP daxcur_resets_total Collections reset\n\
             # TYPE daxcur_resets_total counter\n\
             daxcur_resets_total {}\n\
             # HELP daxcur_backups_created_total Backup snapshots written\n\
             # TYPE daxcur_backups_created_total counter\n\
             daxcur_backups_created_total {}\n\
             # HELP daxcur_saves_completed_total Collection writes completed\n\
             # TYPE daxcur_saves_completed_total counter\n\
             daxcur_saves_completed_total {}\n\
             # HELP daxcur_chat_replies_total Chat replies by serving tier\n\
             # TYPE daxcur_chat_replies_total counter\n\
             daxcur_chat_replies_total{{tier=\"gateway\"}} {}\n\
             daxcur_chat_replies_total{{tier=\"direct\"}} {}\n\
             daxcur_chat_replies_total{{tier=\"mock\"}} {}\n\
             # HELP daxcur_chat_fallthroughs_total Failed upstream chat attempts\n\
             # TYPE daxcur_chat_fallthroughs_total counter\n\
             daxcur_chat_fallthroughs_total {}\n\
             # HELP daxcur_correction_calls_total Structured correction calls by outcome\n\
             # TYPE daxcur_correction_calls_total counter\n\
             daxcur_correction_calls_total{{outcome=\"ok\"}} {}\n\
             daxcur_correction_calls_total{{outcome=\"failed\"}} {}\n",
            self.examples_added,
            self.examples_evicted,
            self.corrections_applied,
            self.resets,
            self.backups_created,
            self.saves_completed,
            self.chat_replies[0],
            self.chat_replies[1],
            self.chat_replies[2],
            self.chat_fallthroughs,
            self.correction_calls[0],
            self.correction_calls[1],
        )
    }
}

/// Span names used with `tracing::info_span!`.
pub mod spans {
    /// Collection load.
    pub const STORE_LOAD: &str = "daxcur::store::load";
    /// Collection save (backup + write).
    pub const STORE_SAVE: &str = "daxcur::store::save";
    /// Backup snapshot.
    pub const STORE_BACKUP: &str = "daxcur::store::backup";
    /// Add-example flow.
    pub const REPO_ADD: &str = "daxcur::repo::add";
    /// Update-correction flow.
    pub const REPO_CORRECT: &str = "daxcur::repo::correct";
    /// Chat routing across tiers.
    pub const CHAT_SEND: &str = "daxcur::chat::send";
    /// Structured DAX correction call.
    pub const DAX_CORRECT: &str = "daxcur::chat::correct";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_default_zero() {
        let c = CurationCounters::new();
        let snap = c.snapshot();
        assert_eq!(snap.examples_added, 0);
        assert_eq!(snap.chat_replies, [0, 0, 0]);
        assert_eq!(snap.correction_calls, [0, 0]);
    }

    #[test]
    fn counters_increment_and_snapshot() {
        let c = CurationCounters::new();
        c.examples_added.fetch_add(5, Ordering::Relaxed);
        CurationCounters::bump(&c.chat_direct);
        CurationCounters::bump(&c.chat_mock);
        CurationCounters::bump(&c.chat_mock);
        CurationCounters::bump(&c.correction_calls_failed);

        let snap = c.snapshot();
        assert_eq!(snap.examples_added, 5);
        assert_eq!(snap.chat_replies, [0, 1, 2]);
        assert_eq!(snap.correction_calls, [0, 1]);
    }

    #[test]
    fn prometheus_format_valid() {
        let c = CurationCounters::new();
        c.backups_created.fetch_add(42, Ordering::Relaxed);
        let prom = c.snapshot().to_prometheus();
        assert!(prom.contains("daxcur_backups_created_total 42"));
        assert!(prom.contains("daxcur_chat_replies_total{tier=\"mock\"} 0"));
        assert!(prom.contains("# TYPE"));
        assert!(prom.contains("# HELP"));
    }

    #[test]
    fn span_names_are_not_empty() {
        assert!(!spans::STORE_SAVE.is_empty());
        assert!(!spans::CHAT_SEND.is_empty());
    }
}

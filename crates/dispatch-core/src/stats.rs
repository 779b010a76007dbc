use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Dispatch counters, for observability only.
#[derive(Debug, Default)]
pub struct DispatchStats {
    shell_writes: AtomicU64,
    ai_replies: AtomicU64,
    fallbacks: AtomicU64,
    failures: AtomicU64,
    discarded: AtomicU64,
    low_confidence: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub shell_writes: u64,
    pub ai_replies: u64,
    pub fallbacks: u64,
    pub failures: u64,
    pub discarded: u64,
    pub low_confidence: u64,
}

impl DispatchStats {
    pub fn record_shell_write(&self) {
        self.shell_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ai_reply(&self) {
        self.ai_replies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_low_confidence(&self) {
        self.low_confidence.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            shell_writes: self.shell_writes.load(Ordering::Relaxed),
            ai_replies: self.ai_replies.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            low_confidence: self.low_confidence.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Share of non-discarded dispatches that needed the fallback heuristic.
    pub fn fallback_rate(&self) -> f32 {
        let total = self.shell_writes + self.ai_replies + self.failures;
        if total == 0 {
            0.0
        } else {
            self.fallbacks as f32 / total as f32
        }
    }
}

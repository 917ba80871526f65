use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::{Outcome, Verdict};

#[derive(Default)]
pub struct RunStats {
    start_ms: AtomicU64,

    evaluated: AtomicU64,
    deals: AtomicU64,

    invalid: AtomicU64,
    raw_skipped: AtomicU64,
    blacklisted: AtomicU64,
    retrieval_failed: AtomicU64,
    no_comps: AtomicU64,
    low_volume: AtomicU64,
}

impl RunStats {
    pub fn new(now_ms: u64) -> Arc<Self> {
        let s = Arc::new(Self::default());
        s.start_ms.store(now_ms, Ordering::Relaxed);
        s
    }

    pub fn record(&self, v: &Verdict) {
        self.evaluated.fetch_add(1, Ordering::Relaxed);
        if v.is_undervalued {
            self.deals.fetch_add(1, Ordering::Relaxed);
        }
        let counter = match v.outcome {
            Outcome::Invalid => &self.invalid,
            Outcome::RawSkipped => &self.raw_skipped,
            Outcome::Blacklisted => &self.blacklisted,
            Outcome::RetrievalFailed => &self.retrieval_failed,
            Outcome::NoComps => &self.no_comps,
            Outcome::LowVolume => &self.low_volume,
            Outcome::SufficientComps => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, now_ms: u64) -> RunStatsSnapshot {
        let start = self.start_ms.load(Ordering::Relaxed);
        RunStatsSnapshot {
            now_ms,
            up_sec: now_ms.saturating_sub(start) / 1000,
            evaluated: self.evaluated.load(Ordering::Relaxed),
            deals: self.deals.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            raw_skipped: self.raw_skipped.load(Ordering::Relaxed),
            blacklisted: self.blacklisted.load(Ordering::Relaxed),
            retrieval_failed: self.retrieval_failed.load(Ordering::Relaxed),
            no_comps: self.no_comps.load(Ordering::Relaxed),
            low_volume: self.low_volume.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatsSnapshot {
    pub now_ms: u64,
    pub up_sec: u64,
    pub evaluated: u64,
    pub deals: u64,
    pub invalid: u64,
    pub raw_skipped: u64,
    pub blacklisted: u64,
    pub retrieval_failed: u64,
    pub no_comps: u64,
    pub low_volume: u64,
}

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::wire::LineOutcome;

/// Cumulative counter values keyed by metric name.
pub type MetricAggregate = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    pub datagrams: u64,
    pub accepted: u64,
    pub ignored: u64,
    pub rejected: u64,
}

/// Counter totals for one run.
///
/// Every datagram is applied under a single write lock, so a snapshot never
/// observes a datagram half-applied.
#[derive(Debug, Default)]
pub struct CounterStore {
    totals: RwLock<MetricAggregate>,
    datagrams: AtomicU64,
    accepted: AtomicU64,
    ignored: AtomicU64,
    rejected: AtomicU64,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the decoded lines of one datagram.
    pub fn apply(&self, outcomes: &[LineOutcome]) {
        self.datagrams.fetch_add(1, Ordering::Relaxed);

        let mut totals = self.totals.write();
        for outcome in outcomes {
            match outcome {
                LineOutcome::Sample(s) => {
                    add(&mut totals, &s.name, s.delta);
                    self.accepted.fetch_add(1, Ordering::Relaxed);
                }
                LineOutcome::Ignored(_) => {
                    self.ignored.fetch_add(1, Ordering::Relaxed);
                }
                LineOutcome::Rejected(_) => {
                    self.rejected.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    pub fn snapshot(&self) -> MetricAggregate {
        self.totals.read().clone()
    }

    pub fn stats(&self) -> CollectorStats {
        CollectorStats {
            datagrams: self.datagrams.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

fn add(totals: &mut MetricAggregate, name: &str, delta: f64) {
    match totals.get_mut(name) {
        Some(v) => *v += delta,
        None => {
            totals.insert(name.to_string(), delta);
        }
    }
}

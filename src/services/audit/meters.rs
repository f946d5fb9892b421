use dashmap::DashMap;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec};

use crate::services::metrics::Metrics;

use super::record::Outcome;

/// Counter + timer pair for one `(method, outcome)`.
#[derive(Clone)]
pub struct AuditMeters {
    pub counter: IntCounter,
    pub timer: Histogram,
}

/// Per-key meter cache shared by all concurrent audited calls.
///
/// Tags are only `method` and `outcome`, so cardinality is bounded by the
/// number of audited operations.
pub struct MeterCache {
    counters: IntCounterVec,
    timers: HistogramVec,
    cache: DashMap<(String, Outcome), AuditMeters>,
}

impl MeterCache {
    pub fn new(metrics: &Metrics) -> Self {
        Self {
            counters: metrics.audit_events().clone(),
            timers: metrics.audit_durations().clone(),
            cache: DashMap::new(),
        }
    }

    pub fn get(&self, operation: &str, outcome: Outcome) -> AuditMeters {
        let key = (operation.to_string(), outcome);
        if let Some(found) = self.cache.get(&key) {
            return found.value().clone();
        }

        self.cache
            .entry(key)
            .or_insert_with(|| {
                let labels = [operation, outcome.as_str()];
                AuditMeters {
                    counter: self.counters.with_label_values(&labels),
                    timer: self.timers.with_label_values(&labels),
                }
            })
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

use crate::aggregation::parser;
use crate::config::catalog::{OperatorCatalog, TrafficKind};
use crate::observability::metrics::RECORDS_REJECTED;
use crate::types::{AggregateSnapshot, OperatorPerformance, PerformanceMetrics, RawPerformanceRecord};

pub const DEFAULT_MIN_SAMPLE: u64 = 10;

const CANCELLED_WEIGHT: f64 = 2.0;
const LATE_WEIGHT: f64 = 1.0;

/// Weighted lateness ratio, lower is better. An operator that ran nothing
/// scores infinity so it can only ever be the worst.
pub fn performance_score(metrics: &PerformanceMetrics) -> f64 {
    if metrics.total == 0 {
        return f64::INFINITY;
    }
    (metrics.cancelled_or_very_late as f64 * CANCELLED_WEIGHT + metrics.late as f64 * LATE_WEIGHT)
        / metrics.total as f64
}

/// Outcome of one ranking pass, kept separate from the snapshot so callers can
/// tell an all-invalid batch from an empty one.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub snapshot: AggregateSnapshot,
    pub included: usize,
    pub rejected: usize,
}

#[derive(Clone, Copy, Default)]
struct Totals {
    on_time: u64,
    cancelled_or_very_late: u64,
    late: i64,
    total: u64,
}

impl Totals {
    /// Add a record's counters. Returns `None`, leaving the running totals as
    /// they were, if any sum would overflow.
    fn checked_add(&self, metrics: &PerformanceMetrics) -> Option<Totals> {
        Some(Totals {
            on_time: self.on_time.checked_add(metrics.on_time)?,
            cancelled_or_very_late: self
                .cancelled_or_very_late
                .checked_add(metrics.cancelled_or_very_late)?,
            late: self.late.checked_add(metrics.late)?,
            total: self.total.checked_add(metrics.total)?,
        })
    }

    fn into_metrics(self) -> PerformanceMetrics {
        PerformanceMetrics::new(self.on_time, self.cancelled_or_very_late, self.late, self.total)
    }
}

/// Fold a batch of operator records of one traffic kind into an aggregate.
///
/// Records are walked in input order. Best and worst are only chosen among
/// operators with at least `min_sample` trains, and on an equal score the
/// operator seen first keeps the slot.
pub fn aggregate(
    records: &[RawPerformanceRecord],
    catalog: &OperatorCatalog,
    traffic_kind: TrafficKind,
    min_sample: u64,
) -> Ranking {
    let mut totals = Totals::default();
    let mut best: Option<OperatorPerformance> = None;
    let mut worst: Option<OperatorPerformance> = None;
    let mut included = 0;
    let mut rejected = 0;

    for raw in records {
        if catalog.traffic_kind(raw.operator_code.as_deref()) != traffic_kind {
            continue;
        }

        let metrics = match parser::parse(raw) {
            Ok(metrics) => metrics,
            Err(e) => {
                RECORDS_REJECTED.inc();
                tracing::warn!(operator = raw.label(), "Skipping operator record: {}", e);
                rejected += 1;
                continue;
            }
        };

        let Some(next) = totals.checked_add(&metrics) else {
            RECORDS_REJECTED.inc();
            tracing::warn!(operator = raw.label(), "Skipping operator record: totals would overflow");
            rejected += 1;
            continue;
        };
        totals = next;
        included += 1;

        if metrics.total < min_sample {
            continue;
        }

        let operator = OperatorPerformance {
            code: raw.operator_code.clone().unwrap_or_default(),
            name: raw.operator_name.clone().unwrap_or_default(),
            performance_score: performance_score(&metrics),
            metrics,
        };

        if best.as_ref().is_none_or(|b| operator.performance_score < b.performance_score) {
            best = Some(operator.clone());
        }
        if worst.as_ref().is_none_or(|w| operator.performance_score > w.performance_score) {
            worst = Some(operator);
        }
    }

    Ranking {
        snapshot: AggregateSnapshot {
            metrics: totals.into_metrics(),
            best_operator: best,
            worst_operator: worst,
        },
        included,
        rejected,
    }
}

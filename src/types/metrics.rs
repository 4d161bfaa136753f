use serde::{Deserialize, Serialize};
use crate::types::percentage::Percentage;

/// Validated counters for one record or for a whole aggregate.
///
/// `late` is already adjusted: trains counted as cancelled or very late are
/// removed from it, so it can go negative when the feed is inconsistent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub on_time: u64,
    pub cancelled_or_very_late: u64,
    pub late: i64,
    pub total: u64,
    pub on_time_percentage: Percentage,
    pub cancelled_or_very_late_percentage: Percentage,
    pub late_percentage: Percentage,
}

impl PerformanceMetrics {
    pub fn new(on_time: u64, cancelled_or_very_late: u64, late: i64, total: u64) -> Self {
        PerformanceMetrics {
            on_time,
            cancelled_or_very_late,
            late,
            total,
            on_time_percentage: Percentage::of(on_time as f64, total),
            cancelled_or_very_late_percentage: Percentage::of(cancelled_or_very_late as f64, total),
            late_percentage: Percentage::of(late as f64, total),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperatorPerformance {
    pub code: String,
    pub name: String,
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
    pub performance_score: f64,
}

/// The published view of one domain.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub best_operator: Option<OperatorPerformance>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub worst_operator: Option<OperatorPerformance>,
}

impl AggregateSnapshot {
    pub fn zero() -> Self {
        AggregateSnapshot::default()
    }

    pub fn from_metrics(metrics: PerformanceMetrics) -> Self {
        AggregateSnapshot {
            metrics,
            best_operator: None,
            worst_operator: None,
        }
    }
}

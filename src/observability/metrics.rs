use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Feed metrics
    pub static ref FEED_MESSAGES_RECEIVED: IntCounter = IntCounter::new(
        "feed_messages_received_total",
        "Total number of composite messages pulled from the feed"
    ).unwrap();

    pub static ref RECORDS_REJECTED: IntCounter = IntCounter::new(
        "records_rejected_total",
        "Total number of raw records that failed validation"
    ).unwrap();

    pub static ref NEGATIVE_LATE_RECORDS: IntCounter = IntCounter::new(
        "negative_late_records_total",
        "Records whose cancelled count exceeded their late count"
    ).unwrap();

    // Aggregation metrics
    pub static ref SNAPSHOTS_PUBLISHED: IntCounterVec = IntCounterVec::new(
        Opts::new("snapshots_published_total", "Snapshots published per domain"),
        &["domain"]
    ).unwrap();

    pub static ref WATCHDOG_WARNINGS: IntCounterVec = IntCounterVec::new(
        Opts::new("watchdog_warnings_total", "Watchdog intervals that passed without input"),
        &["domain"]
    ).unwrap();

    pub static ref PERSISTENCE_FAILURES: IntCounter = IntCounter::new(
        "persistence_failures_total",
        "League table writes or reads that failed"
    ).unwrap();

    // Subscriber metrics
    pub static ref ACTIVE_SUBSCRIBERS: IntGauge = IntGauge::new(
        "active_subscribers",
        "Currently connected streaming subscribers"
    ).unwrap();
}

pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(FEED_MESSAGES_RECEIVED.clone()))?;
    REGISTRY.register(Box::new(RECORDS_REJECTED.clone()))?;
    REGISTRY.register(Box::new(NEGATIVE_LATE_RECORDS.clone()))?;
    REGISTRY.register(Box::new(SNAPSHOTS_PUBLISHED.clone()))?;
    REGISTRY.register(Box::new(WATCHDOG_WARNINGS.clone()))?;
    REGISTRY.register(Box::new(PERSISTENCE_FAILURES.clone()))?;
    REGISTRY.register(Box::new(ACTIVE_SUBSCRIBERS.clone()))?;
    Ok(())
}

/// Prometheus text exposition of everything registered.
pub fn gather_text() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

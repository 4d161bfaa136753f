use std::sync::Arc;
use async_trait::async_trait;
use serde::Serialize;
use crate::aggregation::{parser, ranking};
use crate::config::catalog::{OperatorCatalog, TrafficKind};
use crate::error::{Error, Result};
use crate::observability::metrics::{PERSISTENCE_FAILURES, RECORDS_REJECTED};
use crate::store::league_sink::{self, LeagueSink};
use crate::types::{AggregateSnapshot, LeagueSnapshot, RawPerformanceRecord};

/// How one domain turns an inbound input into the next published snapshot.
///
/// A fold never merges with the previous snapshot: whatever it returns
/// replaces it outright.
#[async_trait]
pub trait DomainFold: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Serialize + Send + Sync + 'static;

    fn name(&self) -> &str;

    fn initial(&self) -> Self::Output;

    async fn fold(&self, input: Self::Input) -> Result<Self::Output>;
}

/// National summary: one record per tick, no operator ranking.
pub struct NationalFold;

#[async_trait]
impl DomainFold for NationalFold {
    type Input = RawPerformanceRecord;
    type Output = AggregateSnapshot;

    fn name(&self) -> &str {
        "national"
    }

    fn initial(&self) -> AggregateSnapshot {
        AggregateSnapshot::zero()
    }

    async fn fold(&self, input: RawPerformanceRecord) -> Result<AggregateSnapshot> {
        let metrics = parser::parse(&input).inspect_err(|_| RECORDS_REJECTED.inc())?;
        Ok(AggregateSnapshot::from_metrics(metrics))
    }
}

/// All operators of one traffic kind, ranked per tick.
pub struct NetworkFold {
    name: String,
    catalog: Arc<OperatorCatalog>,
    traffic_kind: TrafficKind,
    min_sample: u64,
}

impl NetworkFold {
    pub fn new(catalog: Arc<OperatorCatalog>, traffic_kind: TrafficKind, min_sample: u64) -> Self {
        let name = match traffic_kind {
            TrafficKind::Passenger => "passenger",
            TrafficKind::Freight => "freight",
        };
        NetworkFold {
            name: name.to_string(),
            catalog,
            traffic_kind,
            min_sample,
        }
    }
}

#[async_trait]
impl DomainFold for NetworkFold {
    type Input = Vec<RawPerformanceRecord>;
    type Output = AggregateSnapshot;

    fn name(&self) -> &str {
        &self.name
    }

    fn initial(&self) -> AggregateSnapshot {
        AggregateSnapshot::zero()
    }

    async fn fold(&self, input: Vec<RawPerformanceRecord>) -> Result<AggregateSnapshot> {
        let ranking = ranking::aggregate(&input, &self.catalog, self.traffic_kind, self.min_sample);

        if ranking.included == 0 && ranking.rejected > 0 {
            return Err(Error::EmptyAggregate(ranking.rejected));
        }
        Ok(ranking.snapshot)
    }
}

/// Per-operator league table, persisted to the sink and read back whole.
pub struct LeagueFold {
    sink: Arc<dyn LeagueSink>,
}

impl LeagueFold {
    pub fn new(sink: Arc<dyn LeagueSink>) -> Self {
        LeagueFold { sink }
    }
}

#[async_trait]
impl DomainFold for LeagueFold {
    type Input = RawPerformanceRecord;
    type Output = LeagueSnapshot;

    fn name(&self) -> &str {
        "operators"
    }

    fn initial(&self) -> LeagueSnapshot {
        LeagueSnapshot::default()
    }

    async fn fold(&self, input: RawPerformanceRecord) -> Result<LeagueSnapshot> {
        let record = parser::parse_operator_record(&input).inspect_err(|_| RECORDS_REJECTED.inc())?;

        let league = async {
            league_sink::record_operator(self.sink.as_ref(), &record).await?;
            league_sink::load_league(self.sink.as_ref()).await
        };
        league.await.inspect_err(|_| PERSISTENCE_FAILURES.inc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;
    use crate::aggregation::DomainAggregator;
    use crate::store::league_sink::{InMemoryLeagueSink, MockLeagueSink};
    use crate::store::snapshot_store::snapshot_store;
    use crate::types::{LeagueTableEntry, OperatorRecord};

    #[tokio::test]
    async fn national_fold_adjusts_late() {
        let snapshot = NationalFold
            .fold(RawPerformanceRecord::new("80", "20", "10", "100"))
            .await
            .unwrap();

        assert_eq!(snapshot.metrics.on_time, 80);
        assert_eq!(snapshot.metrics.cancelled_or_very_late, 10);
        assert_eq!(snapshot.metrics.late, 10);
        assert_eq!(snapshot.metrics.total, 100);
        assert!(snapshot.best_operator.is_none());
    }

    #[tokio::test]
    async fn network_fold_rejects_all_invalid_batch() {
        let fold = NetworkFold::new(Arc::new(OperatorCatalog::default()), TrafficKind::Passenger, 10);
        let bad = RawPerformanceRecord::new("x", "1", "1", "1").with_operator("61", "Northern");

        assert!(matches!(fold.fold(vec![bad]).await, Err(Error::EmptyAggregate(1))));
        assert_eq!(fold.fold(Vec::new()).await.unwrap(), AggregateSnapshot::zero());
    }

    #[tokio::test]
    async fn league_fold_reads_back_whole_table() {
        let fold = LeagueFold::new(Arc::new(InMemoryLeagueSink::new()));

        let first = RawPerformanceRecord::new("30", "10", "2", "40")
            .with_operator("61", "Northern")
            .with_ppm("75");
        let second = RawPerformanceRecord::new("45", "5", "0", "50")
            .with_operator("65", "Avanti")
            .with_ppm("90");

        fold.fold(first).await.unwrap();
        let league = fold.fold(second).await.unwrap();

        assert_eq!(league.current_data.len(), 2);
        assert_eq!(league.league_table[0].name, "Avanti");
        assert_eq!(league.current_data["Northern"].late, 8);
    }

    #[tokio::test]
    async fn league_write_failure_keeps_published_table() {
        let mut sink = MockLeagueSink::new();
        sink.expect_put_operator()
            .times(1)
            .returning(|_| Err(Error::Persistence("connection refused".to_string())));
        sink.expect_add_to_league().never();
        sink.expect_operators().never();
        sink.expect_league_table().never();

        let existing = OperatorRecord {
            name: "Northern".to_string(),
            total: 40,
            on_time: 30,
            late: 8,
            cancelled_or_very_late: 2,
            percentage: 75,
        };
        let initial = LeagueSnapshot {
            current_data: BTreeMap::from([("Northern".to_string(), existing)]),
            league_table: vec![LeagueTableEntry {
                name: "Northern".to_string(),
                percentage: 75.0,
            }],
        };

        let (tx, rx) = mpsc::channel(4);
        let (publisher, reader) = snapshot_store(initial.clone());
        let aggregator = DomainAggregator::new(
            LeagueFold::new(Arc::new(sink)),
            rx,
            publisher,
            Duration::from_secs(300),
            CancellationToken::new(),
        );
        let before = PERSISTENCE_FAILURES.get();
        let handle = tokio::spawn(aggregator.run());

        let record = RawPerformanceRecord::new("45", "5", "0", "50")
            .with_operator("65", "Avanti")
            .with_ppm("90");
        tx.send(record).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(*reader.current(), initial);
        assert_eq!(PERSISTENCE_FAILURES.get(), before + 1);
    }
}

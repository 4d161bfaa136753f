use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use crate::aggregation::domains::DomainFold;
use crate::observability::metrics::{SNAPSHOTS_PUBLISHED, WATCHDOG_WARNINGS};
use crate::observability::tracing::trace_domain;
use crate::store::snapshot_store::SnapshotPublisher;

/// Consumes one domain's inbound channel and keeps its snapshot store current.
///
/// A failed fold leaves the published snapshot untouched. The watchdog only
/// warns: a quiet feed is never an error.
pub struct DomainAggregator<F: DomainFold> {
    fold: F,
    inbound: mpsc::Receiver<F::Input>,
    publisher: SnapshotPublisher<F::Output>,
    watchdog: Duration,
    shutdown: CancellationToken,
}

impl<F: DomainFold> DomainAggregator<F> {
    pub fn new(
        fold: F,
        inbound: mpsc::Receiver<F::Input>,
        publisher: SnapshotPublisher<F::Output>,
        watchdog: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        DomainAggregator {
            fold,
            inbound,
            publisher,
            watchdog,
            shutdown,
        }
    }

    pub async fn run(self) {
        let span = trace_domain(self.fold.name());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(mut self) {
        let domain = self.fold.name().to_string();
        let watchdog = tokio::time::sleep(self.watchdog);
        tokio::pin!(watchdog);

        tracing::info!("Aggregator started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Aggregator stopping on shutdown");
                    break;
                }
                input = self.inbound.recv() => {
                    let Some(input) = input else {
                        tracing::info!("Inbound channel closed, aggregator exiting");
                        break;
                    };

                    watchdog.as_mut().reset(tokio::time::Instant::now() + self.watchdog);

                    match self.fold.fold(input).await {
                        Ok(snapshot) => {
                            self.publisher.publish(snapshot);
                            SNAPSHOTS_PUBLISHED.with_label_values(&[&domain]).inc();
                        }
                        Err(e) => {
                            tracing::warn!("Keeping previous snapshot: {}", e);
                        }
                    }
                }
                _ = &mut watchdog => {
                    tracing::warn!("No input received for {:?}", self.watchdog);
                    WATCHDOG_WARNINGS.with_label_values(&[&domain]).inc();
                    watchdog.as_mut().reset(tokio::time::Instant::now() + self.watchdog);
                }
            }
        }
    }
}

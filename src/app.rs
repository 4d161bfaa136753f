use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use crate::aggregation::{DomainAggregator, DomainFold, LeagueFold, NationalFold, NetworkFold};
use crate::api::rest::{create_router, ApiState};
use crate::config::{AppConfig, RedisConfig, TrafficKind};
use crate::controls::{os_signal, ShutdownSignal};
use crate::error::Result;
use crate::feed::dispatcher::{national_input, operator_batch, operator_pages};
use crate::feed::{FanOutDispatcher, FeedClient, RouteTo};
use crate::store::{snapshot_store, InMemoryLeagueSink, LeagueSink, RedisLeagueSink, SnapshotReader};
use crate::types::FeedMessage;
use crate::utils::task_supervisor::TaskSupervisor;

/// The spawned dispatcher and aggregators, plus the read side for the server.
pub struct Pipeline {
    pub state: Arc<ApiState>,
    pub supervisor: TaskSupervisor,
}

pub async fn league_sink(config: &RedisConfig) -> Result<Arc<dyn LeagueSink>> {
    match &config.url {
        Some(url) => Ok(Arc::new(RedisLeagueSink::connect(url).await?)),
        None => {
            tracing::warn!("No redis url configured, league table is kept in memory");
            Ok(Arc::new(InMemoryLeagueSink::new()))
        }
    }
}

/// Wire feed → dispatcher → aggregators → stores and spawn every task under
/// one supervisor.
pub fn spawn_pipeline(
    config: &AppConfig,
    feed: mpsc::Receiver<FeedMessage>,
    sink: Arc<dyn LeagueSink>,
    signal: &ShutdownSignal,
) -> Pipeline {
    let catalog = Arc::new(config.catalog());
    let capacity = config.pipeline.domain_channel_capacity;
    let mut supervisor = TaskSupervisor::new();

    let (national_tx, national) = spawn_domain(&mut supervisor, NationalFold, config, signal);
    let (passenger_tx, passenger) = spawn_domain(
        &mut supervisor,
        NetworkFold::new(catalog.clone(), TrafficKind::Passenger, config.pipeline.min_sample),
        config,
        signal,
    );
    let (freight_tx, freight) = spawn_domain(
        &mut supervisor,
        NetworkFold::new(catalog, TrafficKind::Freight, config.pipeline.min_sample),
        config,
        signal,
    );
    let (operators_tx, operators) = spawn_domain(&mut supervisor, LeagueFold::new(sink), config, signal);

    let dispatcher = FanOutDispatcher::new(feed, signal.token())
        .route(RouteTo::new("national", national_input, national_tx))
        .route(RouteTo::new("passenger", operator_batch, passenger_tx))
        .route(RouteTo::new("freight", operator_batch, freight_tx))
        .route(RouteTo::new("operators", operator_pages, operators_tx));
    supervisor.spawn("dispatcher", dispatcher.run());

    tracing::info!(
        "Pipeline started with {} tasks, domain channel capacity {}",
        supervisor.active_task_count(),
        capacity
    );

    let state = Arc::new(ApiState {
        national,
        passenger,
        freight,
        operators,
        push_interval: config.server.push_interval(),
        league_push_interval: config.server.league_push_interval(),
        shutdown: signal.token(),
    });

    Pipeline { state, supervisor }
}

fn spawn_domain<F: DomainFold>(
    supervisor: &mut TaskSupervisor,
    fold: F,
    config: &AppConfig,
    signal: &ShutdownSignal,
) -> (mpsc::Sender<F::Input>, SnapshotReader<F::Output>) {
    let (tx, rx) = mpsc::channel(config.pipeline.domain_channel_capacity);
    let (publisher, reader) = snapshot_store(fold.initial());
    let name = format!("aggregator:{}", fold.name());

    let aggregator = DomainAggregator::new(fold, rx, publisher, config.pipeline.watchdog(), signal.token());
    supervisor.spawn(name, aggregator.run());

    (tx, reader)
}

/// Run the service until SIGINT/SIGTERM or a fatal server error.
pub async fn run(config: AppConfig, feed_client: &dyn FeedClient) -> Result<()> {
    let signal = ShutdownSignal::new();

    let feed = feed_client.subscribe(signal.token()).await?;
    let sink = league_sink(&config.redis).await?;
    let mut pipeline = spawn_pipeline(&config, feed.messages, sink, &signal);
    pipeline.supervisor.track("feed", feed.pump);

    let listener = TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!("Broadcast server listening on {}", config.server.bind_addr);

    let router = create_router(pipeline.state.clone());
    let server_signal = signal.clone();
    pipeline.supervisor.spawn("http_server", async move {
        let stopped = server_signal.token().cancelled_owned();
        if let Err(e) = axum::serve(listener, router).with_graceful_shutdown(stopped).await {
            tracing::error!("Broadcast server failed: {}", e);
            server_signal.trigger("broadcast server failed");
        }
    });

    tokio::select! {
        _ = os_signal() => {
            signal.trigger("termination signal received");
        }
        _ = signal.triggered() => {}
    }

    let report = pipeline.supervisor.join_all(config.pipeline.shutdown_grace()).await;
    if report.is_clean() {
        tracing::info!("All tasks stopped");
    } else {
        tracing::warn!(
            "Shutdown finished with {} failed and {} aborted tasks",
            report.failed.len(),
            report.aborted.len()
        );
    }

    Ok(())
}

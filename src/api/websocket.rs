use std::borrow::Cow;
use std::time::Duration;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures::stream::SplitSink;
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Serialize;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use crate::error::{Error, Result};
use crate::observability::metrics::ACTIVE_SUBSCRIBERS;
use crate::observability::tracing::trace_subscriber;
use crate::store::SnapshotReader;

/// Keeps the subscriber gauge right on every exit path.
struct SubscriberGuard;

impl SubscriberGuard {
    fn register() -> Self {
        ACTIVE_SUBSCRIBERS.inc();
        SubscriberGuard
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        ACTIVE_SUBSCRIBERS.dec();
    }
}

/// Stream one domain's snapshots to a connected subscriber until it goes away
/// or the process shuts down.
///
/// The current snapshot is sent straight away, then again every `period`.
/// Frames from the client are read only to notice a disconnect.
pub async fn stream_snapshots<T>(
    socket: WebSocket,
    reader: SnapshotReader<T>,
    period: Duration,
    shutdown: CancellationToken,
    route: &'static str,
) where
    T: Serialize + Send + Sync + 'static,
{
    run_connection(socket, reader, period, shutdown)
        .instrument(trace_subscriber(route))
        .await
}

async fn run_connection<T>(
    socket: WebSocket,
    reader: SnapshotReader<T>,
    period: Duration,
    shutdown: CancellationToken,
) where
    T: Serialize + Send + Sync + 'static,
{
    let _guard = SubscriberGuard::register();
    let (mut sender, mut receiver) = socket.split();
    tracing::info!("Subscriber connected");

    let mut watcher = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    if let Err(e) = push(&mut sender, &reader).await {
        tracing::debug!("Initial push failed: {}", e);
        watcher.abort();
        return;
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let frame = CloseFrame {
                    code: close_code::AWAY,
                    reason: Cow::from("server shutting down"),
                };
                let _ = sender.send(Message::Close(Some(frame))).await;
                break;
            }
            _ = &mut watcher => {
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = push(&mut sender, &reader).await {
                    tracing::debug!("Push failed: {}", e);
                    break;
                }
            }
        }
    }

    watcher.abort();
    tracing::info!("Subscriber disconnected");
}

async fn push<T: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    reader: &SnapshotReader<T>,
) -> Result<()> {
    let snapshot = reader.current();
    let text = serde_json::to_string(&*snapshot)?;
    sender
        .send(Message::Text(text))
        .await
        .map_err(|e| Error::Transport(e.to_string()))
}

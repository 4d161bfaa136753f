use std::time::Duration;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use crate::config::FeedConfig;
use crate::error::{Error, Result};
use crate::feed::{FeedClient, FeedSubscription};
use crate::observability::metrics::FEED_MESSAGES_RECEIVED;
use crate::types::FeedMessage;

type FeedStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Reads RTPPM JSON text frames from a WebSocket endpoint.
pub struct WebSocketFeedClient {
    url: String,
    channel_capacity: usize,
    reconnect_delay: Duration,
}

impl WebSocketFeedClient {
    pub fn new(config: &FeedConfig) -> Self {
        WebSocketFeedClient {
            url: config.url.clone(),
            channel_capacity: config.channel_capacity,
            reconnect_delay: config.reconnect_delay(),
        }
    }

    async fn connect(url: &str) -> Result<FeedStream> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::Subscription(format!("{}: {}", url, e)))?;
        tracing::info!("Connected to feed: {}", url);
        Ok(stream)
    }

    async fn pump(
        url: String,
        mut stream: FeedStream,
        tx: mpsc::Sender<FeedMessage>,
        reconnect_delay: Duration,
        shutdown: CancellationToken,
    ) {
        loop {
            let frame = tokio::select! {
                _ = shutdown.cancelled() => break,
                frame = stream.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => {
                    let message = match FeedMessage::from_json(&text) {
                        Ok(message) => message,
                        Err(e) => {
                            tracing::warn!("Skipping feed frame: {}", e);
                            continue;
                        }
                    };
                    FEED_MESSAGES_RECEIVED.inc();

                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        sent = tx.send(message) => {
                            if sent.is_err() {
                                tracing::info!("Feed consumer gone, closing feed");
                                break;
                            }
                        }
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Feed connection error: {}", e);
                    match Self::reconnect(&url, reconnect_delay, &shutdown).await {
                        Some(next) => stream = next,
                        None => break,
                    }
                }
                None => {
                    tracing::warn!("Feed connection closed by peer");
                    match Self::reconnect(&url, reconnect_delay, &shutdown).await {
                        Some(next) => stream = next,
                        None => break,
                    }
                }
            }
        }

        let _ = stream.close(None).await;
        tracing::info!("Feed client stopped");
    }

    /// Retry with a fixed delay until connected or shut down.
    async fn reconnect(
        url: &str,
        delay: Duration,
        shutdown: &CancellationToken,
    ) -> Option<FeedStream> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }

            match Self::connect(url).await {
                Ok(stream) => return Some(stream),
                Err(e) => tracing::warn!("Reconnect failed, retrying in {:?}: {}", delay, e),
            }
        }
    }
}

#[async_trait]
impl FeedClient for WebSocketFeedClient {
    async fn subscribe(&self, shutdown: CancellationToken) -> Result<FeedSubscription> {
        let stream = Self::connect(&self.url).await?;
        let (tx, messages) = mpsc::channel(self.channel_capacity);

        let pump = tokio::spawn(Self::pump(
            self.url.clone(),
            stream,
            tx,
            self.reconnect_delay,
            shutdown,
        ));

        Ok(FeedSubscription { messages, pump })
    }
}

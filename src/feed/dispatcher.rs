use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::types::{FeedMessage, RawPerformanceRecord};

/// Outcome of forwarding one message to one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The domain's receiver is gone.
    Closed,
    /// Shutdown fired while waiting for channel capacity.
    Cancelled,
}

/// One outbound leg of the fan-out.
#[async_trait]
pub trait DomainRoute: Send + Sync {
    fn label(&self) -> &str;

    async fn deliver(&self, message: &FeedMessage, shutdown: &CancellationToken) -> Delivery;
}

/// Extracts a domain's inputs from a message and sends them on its channel.
pub struct RouteTo<T> {
    label: String,
    extract: fn(&FeedMessage) -> Vec<T>,
    tx: mpsc::Sender<T>,
}

impl<T> RouteTo<T> {
    pub fn new(label: impl Into<String>, extract: fn(&FeedMessage) -> Vec<T>, tx: mpsc::Sender<T>) -> Self {
        RouteTo {
            label: label.into(),
            extract,
            tx,
        }
    }
}

#[async_trait]
impl<T: Send + 'static> DomainRoute for RouteTo<T> {
    fn label(&self) -> &str {
        &self.label
    }

    async fn deliver(&self, message: &FeedMessage, shutdown: &CancellationToken) -> Delivery {
        for input in (self.extract)(message) {
            tokio::select! {
                _ = shutdown.cancelled() => return Delivery::Cancelled,
                sent = self.tx.send(input) => {
                    if sent.is_err() {
                        return Delivery::Closed;
                    }
                }
            }
        }
        Delivery::Sent
    }
}

pub fn national_input(message: &FeedMessage) -> Vec<RawPerformanceRecord> {
    vec![message.national.clone()]
}

pub fn operator_batch(message: &FeedMessage) -> Vec<Vec<RawPerformanceRecord>> {
    vec![message.operators.clone()]
}

pub fn operator_pages(message: &FeedMessage) -> Vec<RawPerformanceRecord> {
    message.operators.clone()
}

/// Splits the single inbound feed into per-domain channels.
///
/// Sends wait for capacity, so a slow domain slows the whole dispatcher
/// rather than losing input.
pub struct FanOutDispatcher {
    inbound: mpsc::Receiver<FeedMessage>,
    routes: Vec<Box<dyn DomainRoute>>,
    shutdown: CancellationToken,
}

impl FanOutDispatcher {
    pub fn new(inbound: mpsc::Receiver<FeedMessage>, shutdown: CancellationToken) -> Self {
        FanOutDispatcher {
            inbound,
            routes: Vec::new(),
            shutdown,
        }
    }

    pub fn route(mut self, route: impl DomainRoute + 'static) -> Self {
        self.routes.push(Box::new(route));
        self
    }

    pub async fn run(mut self) {
        tracing::info!("Dispatcher started with {} routes", self.routes.len());

        loop {
            let message = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Dispatcher stopping on shutdown");
                    return;
                }
                message = self.inbound.recv() => message,
            };

            let Some(message) = message else {
                tracing::info!("Feed channel closed, dispatcher exiting");
                return;
            };

            let mut closed = Vec::new();
            for (index, route) in self.routes.iter().enumerate() {
                match route.deliver(&message, &self.shutdown).await {
                    Delivery::Sent => {}
                    Delivery::Closed => {
                        tracing::warn!(domain = route.label(), "Domain receiver gone, dropping route");
                        closed.push(index);
                    }
                    Delivery::Cancelled => {
                        tracing::info!("Dispatcher stopping on shutdown");
                        return;
                    }
                }
            }

            for index in closed.into_iter().rev() {
                self.routes.remove(index);
            }
        }
    }
}

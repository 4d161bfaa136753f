pub mod dispatcher;
pub mod ws_client;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use crate::error::Result;
use crate::types::FeedMessage;

pub use dispatcher::{DomainRoute, FanOutDispatcher, RouteTo};
pub use ws_client::WebSocketFeedClient;

/// A live feed: the message channel and the task filling it.
pub struct FeedSubscription {
    pub messages: mpsc::Receiver<FeedMessage>,
    pub pump: JoinHandle<()>,
}

/// Source of composite performance messages.
///
/// `subscribe` fails only if the first connection cannot be made. After that
/// the client owns reconnection, and the pump task ends (closing the channel)
/// once `shutdown` fires.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn subscribe(&self, shutdown: CancellationToken) -> Result<FeedSubscription>;
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Process-wide stop signal. Closed at most once; every task holds a child
/// view through `token()`.
#[derive(Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    token: CancellationToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        ShutdownSignal {
            triggered: Arc::new(AtomicBool::new(false)),
            token: CancellationToken::new(),
        }
    }

    /// Close the signal. Returns false, and changes nothing, if it was
    /// already closed.
    pub fn trigger(&self, reason: &str) -> bool {
        if self.triggered.swap(true, Ordering::SeqCst) {
            tracing::warn!("Shutdown already in progress, ignoring second close ({})", reason);
            return false;
        }

        tracing::warn!("SHUTDOWN TRIGGERED: {}", reason);
        self.token.cancel();
        true
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub async fn triggered(&self) {
        self.token.cancelled().await
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn os_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_trigger_is_ignored() {
        let signal = ShutdownSignal::new();
        let token = signal.token();

        assert!(!token.is_cancelled());
        assert!(signal.trigger("first"));
        assert!(!signal.trigger("second"));
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn clones_share_one_signal() {
        let signal = ShutdownSignal::new();
        let other = signal.clone();

        let waiter = tokio::spawn(async move { other.triggered().await });
        signal.trigger("test");

        waiter.await.unwrap();
        assert!(!signal.clone().trigger("again"));
    }
}

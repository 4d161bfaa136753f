use std::sync::Arc;
use std::time::Duration;
use futures::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use trainstats_realtime::api::rest::create_router;
use trainstats_realtime::app::spawn_pipeline;
use trainstats_realtime::config::AppConfig;
use trainstats_realtime::controls::ShutdownSignal;
use trainstats_realtime::store::InMemoryLeagueSink;

#[tokio::test]
async fn every_task_exits_within_grace_after_signal() {
    let config = AppConfig::default();
    // Sender stays alive: tasks must stop on the signal, not on channel close.
    let (_feed, feed_rx) = mpsc::channel(8);
    let signal = ShutdownSignal::new();
    let mut pipeline = spawn_pipeline(&config, feed_rx, Arc::new(InMemoryLeagueSink::new()), &signal);

    assert_eq!(pipeline.supervisor.active_task_count(), 5);

    assert!(signal.trigger("test"));
    assert!(!signal.trigger("test again"));

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        pipeline.supervisor.join_all(Duration::from_secs(5)),
    )
    .await
    .expect("join was not bounded");

    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.completed.len(), 5);
}

#[tokio::test]
async fn subscribers_get_a_close_frame_on_shutdown() {
    let config = AppConfig::default();
    let (_feed, feed_rx) = mpsc::channel(8);
    let signal = ShutdownSignal::new();
    let mut pipeline = spawn_pipeline(&config, feed_rx, Arc::new(InMemoryLeagueSink::new()), &signal);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = create_router(pipeline.state.clone());
    let stopped = signal.token().cancelled_owned();
    pipeline.supervisor.spawn("http_server", async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(stopped)
            .await
            .unwrap();
    });

    let (mut client, _) = connect_async(format!("ws://{}/national", addr)).await.unwrap();
    let first = client.next().await.unwrap().unwrap();
    assert!(matches!(first, Message::Text(_)));

    signal.trigger("test");

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(frame) = client.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => return,
                Ok(_) => {}
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "subscriber was not closed");

    let report = pipeline.supervisor.join_all(Duration::from_secs(5)).await;
    assert!(report.is_clean(), "{:?}", report);
}

use std::sync::Arc;
use std::time::Duration;
use axum::{
    Router,
    routing::get,
    extract::{State, WebSocketUpgrade},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use crate::api::websocket::stream_snapshots;
use crate::observability::metrics::gather_text;
use crate::store::SnapshotReader;
use crate::types::{AggregateSnapshot, LeagueSnapshot};

/// Read side of every domain plus what each connection needs to stream.
pub struct ApiState {
    pub national: SnapshotReader<AggregateSnapshot>,
    pub passenger: SnapshotReader<AggregateSnapshot>,
    pub freight: SnapshotReader<AggregateSnapshot>,
    pub operators: SnapshotReader<LeagueSnapshot>,
    pub push_interval: Duration,
    pub league_push_interval: Duration,
    pub shutdown: CancellationToken,
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/national", get(national))
        .route("/passenger", get(passenger))
        .route("/freight", get(freight))
        .route("/operators", get(operators))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_text(),
    )
}

async fn national(ws: WebSocketUpgrade, State(state): State<Arc<ApiState>>) -> Response {
    let reader = state.national.clone();
    ws.on_upgrade(move |socket| {
        stream_snapshots(socket, reader, state.push_interval, state.shutdown.clone(), "national")
    })
}

async fn passenger(ws: WebSocketUpgrade, State(state): State<Arc<ApiState>>) -> Response {
    let reader = state.passenger.clone();
    ws.on_upgrade(move |socket| {
        stream_snapshots(socket, reader, state.push_interval, state.shutdown.clone(), "passenger")
    })
}

async fn freight(ws: WebSocketUpgrade, State(state): State<Arc<ApiState>>) -> Response {
    let reader = state.freight.clone();
    ws.on_upgrade(move |socket| {
        stream_snapshots(socket, reader, state.push_interval, state.shutdown.clone(), "freight")
    })
}

async fn operators(ws: WebSocketUpgrade, State(state): State<Arc<ApiState>>) -> Response {
    let reader = state.operators.clone();
    ws.on_upgrade(move |socket| {
        stream_snapshots(
            socket,
            reader,
            state.league_push_interval,
            state.shutdown.clone(),
            "operators",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use crate::store::snapshot_store;

    fn state() -> Arc<ApiState> {
        let (_national, national) = snapshot_store(AggregateSnapshot::zero());
        let (_passenger, passenger) = snapshot_store(AggregateSnapshot::zero());
        let (_freight, freight) = snapshot_store(AggregateSnapshot::zero());
        let (_operators, operators) = snapshot_store(LeagueSnapshot::default());

        Arc::new(ApiState {
            national,
            passenger,
            freight,
            operators,
            push_interval: Duration::from_secs(15),
            league_push_interval: Duration::from_secs(5),
            shutdown: CancellationToken::new(),
        })
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = create_router(state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn snapshot_routes_require_upgrade() {
        let response = create_router(state())
            .oneshot(Request::builder().uri("/national").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}

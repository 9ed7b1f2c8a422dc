mod error;
mod http;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use tracker_api::MessagePublisher;
use trajectory::TrajectoryAnalyzer;

pub use error::ApiError;

/// Shared handler state: the analyzer (and through it the position
/// source) plus the optional ingestion publisher.
#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<TrajectoryAnalyzer>,
    default_window: u32,
    ingest: Option<(Arc<dyn MessagePublisher>, String)>,
}

impl AppState {
    /// `default_window` applies when a request omits `minutes` or sends `0`.
    pub fn new(analyzer: Arc<TrajectoryAnalyzer>, default_window: u32) -> Self {
        Self {
            analyzer,
            default_window,
            ingest: None,
        }
    }

    /// Mount `PATCH /drivers/{id}/locations`, publishing to `topic`.
    pub fn with_ingest(mut self, publisher: Arc<dyn MessagePublisher>, topic: impl Into<String>) -> Self {
        self.ingest = Some((publisher, topic.into()));
        self
    }
}

/// Routes:
/// - `GET /health`
/// - `GET /drivers/{id}?minutes=N`: stall classification
/// - `GET /drivers/{id}/locations?minutes=N`: windowed positions
/// - `PATCH /drivers/{id}/locations`: enqueue a position update (ingest only)
pub fn router(state: AppState) -> Router {
    let locations = match state.ingest {
        Some(_) => get(http::handle_locations).patch(http::handle_ingest),
        None => get(http::handle_locations),
    };

    Router::new()
        .route("/health", get(http::handle_health))
        .route("/drivers/{id}", get(http::handle_classify))
        .route("/drivers/{id}/locations", locations)
        .with_state(state)
}

/// Bind `0.0.0.0:{port}` and serve until `shutdown` fires.
pub async fn run(port: u16, state: AppState, shutdown: CancellationToken) -> Result<(), String> {
    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|e| format!("bind api :{port}: {e}"))?;
    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, state: AppState, shutdown: CancellationToken) -> Result<(), String> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::{TimeDelta, Utc};
    use tower::ServiceExt;

    use ingest::{ChannelQueue, QueueConfig, SaveToStore, spawn_consumer};
    use storage_memory::MemoryPositionStore;
    use tracker_api::{
        ActorId, Coordinates, PositionRecord, PositionSource, PositionStore, TrackerError, ZombieResponse,
    };
    use trajectory::StallDetector;

    use super::*;

    fn state_with(store: Arc<MemoryPositionStore>, minimum: f64) -> AppState {
        let analyzer = TrajectoryAnalyzer::new(store, StallDetector::new(minimum));
        AppState::new(Arc::new(analyzer), 5)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn seed(store: &MemoryPositionStore, id: i64, points: &[(f64, f64)]) {
        let start = Utc::now() - TimeDelta::minutes(2);
        for (i, &(lat, lon)) in points.iter().enumerate() {
            store
                .save(&ActorId::from(id), Coordinates::new(lat, lon), start + TimeDelta::seconds(i as i64))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = router(state_with(Arc::new(MemoryPositionStore::new()), 1.0));
        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    struct Unreachable;

    impl PositionSource for Unreachable {
        fn fetch(
            &self,
            _actor: &ActorId,
            _window_minutes: u32,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<PositionRecord>, TrackerError>> + Send + '_>> {
            Box::pin(async { Err(TrackerError::unavailable("connection refused")) })
        }

        fn ping(&self) -> Pin<Box<dyn Future<Output = Result<(), TrackerError>> + Send + '_>> {
            Box::pin(async { Err(TrackerError::unavailable("connection refused")) })
        }
    }

    fn unreachable_state() -> AppState {
        let analyzer = TrajectoryAnalyzer::new(Arc::new(Unreachable), StallDetector::new(0.5));
        AppState::new(Arc::new(analyzer), 5)
    }

    #[tokio::test]
    async fn health_is_500_when_store_unreachable() {
        let (status, body) = get(router(unreachable_state()), "/health").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(String::from_utf8_lossy(&body).contains("connection refused"));
    }

    #[tokio::test]
    async fn classify_is_500_when_store_unreachable() {
        let (status, _) = get(router(unreachable_state()), "/drivers/1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn parked_driver_is_zombie() {
        let store = Arc::new(MemoryPositionStore::new());
        seed(&store, 7, &[(48.8566, 2.3522), (48.8566, 2.3523)]).await;

        let (status, body) = get(router(state_with(store, 0.5)), "/drivers/7").await;
        assert_eq!(status, StatusCode::OK);
        let resp: ZombieResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp, ZombieResponse { id: 7, zombie: true });
    }

    #[tokio::test]
    async fn travelling_driver_is_not_zombie() {
        let store = Arc::new(MemoryPositionStore::new());
        seed(&store, 8, &[(48.8566, 2.3522), (51.5074, 0.1278)]).await;

        let (_, body) = get(router(state_with(store, 0.5)), "/drivers/8?minutes=10").await;
        let resp: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp, serde_json::json!({ "id": 8, "zombie": false }));
    }

    #[tokio::test]
    async fn unknown_driver_is_not_zombie() {
        let app = router(state_with(Arc::new(MemoryPositionStore::new()), 0.5));
        let (status, body) = get(app, "/drivers/404").await;
        assert_eq!(status, StatusCode::OK);
        let resp: ZombieResponse = serde_json::from_slice(&body).unwrap();
        assert!(!resp.zombie);
    }

    #[tokio::test]
    async fn bad_id_or_minutes_is_400() {
        let app = router(state_with(Arc::new(MemoryPositionStore::new()), 0.5));
        for uri in ["/drivers/abc", "/drivers/1?minutes=x", "/drivers/abc/locations", "/drivers/1/locations?minutes=-3"] {
            let (status, _) = get(app.clone(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn locations_are_windowed_and_ordered() {
        let store = Arc::new(MemoryPositionStore::new());
        let actor = ActorId::from(3);
        let now = Utc::now();
        store.save(&actor, Coordinates::new(2.0, 2.0), now).await.unwrap();
        store.save(&actor, Coordinates::new(1.0, 1.0), now - TimeDelta::minutes(1)).await.unwrap();
        store.save(&actor, Coordinates::new(9.0, 9.0), now - TimeDelta::minutes(30)).await.unwrap();

        let (status, body) = get(router(state_with(store, 0.5)), "/drivers/3/locations?minutes=5").await;
        assert_eq!(status, StatusCode::OK);
        let payload: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        let lats: Vec<f64> = payload.iter().map(|p| p["latitude"].as_f64().unwrap()).collect();
        assert_eq!(lats, vec![1.0, 2.0]);
        assert!(payload[0]["updated_at"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn patch_is_not_routed_without_publisher() {
        let app = router(state_with(Arc::new(MemoryPositionStore::new()), 0.5));
        let resp = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/drivers/1/locations")
                    .body(Body::from(r#"{"latitude":1,"longitude":2}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn patch_flows_through_queue_into_store() {
        let store = Arc::new(MemoryPositionStore::new());
        let (queue, receiver) = ChannelQueue::new(&QueueConfig::default());
        let token = CancellationToken::new();
        let consumer = spawn_consumer(receiver, Arc::new(SaveToStore::new(store.clone())), token.clone());

        let state = state_with(store.clone(), 0.5).with_ingest(Arc::new(queue), "locations");
        let resp = router(state)
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/drivers/11/locations")
                    .header("X-Trace-Id", "trace-1")
                    .body(Body::from(r#"{"latitude":1,"longitude":2}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let actor = ActorId::from(11);
        let mut stored = Vec::new();
        for _ in 0..100 {
            stored = store.fetch_at(&actor, 5, Utc::now()).await;
            if !stored.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].coordinates(), Coordinates::new(1.0, 2.0));

        token.cancel();
        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn patch_with_bad_id_is_400() {
        let (queue, _receiver) = ChannelQueue::new(&QueueConfig::default());
        let state = state_with(Arc::new(MemoryPositionStore::new()), 0.5).with_ingest(Arc::new(queue), "locations");
        let resp = router(state)
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/drivers/x/locations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

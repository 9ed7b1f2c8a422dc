use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use ingest::{ChannelQueue, SaveToStore, spawn_consumer};
use storage_memory::MemoryPositionStore;
use storage_remote::RemotePositionSource;
use tracker_api::PositionSource;
use tracker_api_server::AppState;
use trajectory::{StallDetector, TrajectoryAnalyzer};

use crate::config::{ServeArgs, ServerConfig, StorageConfig};
use crate::error::ServerError;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("tracker-server starting");

    // --- Load config ---
    let config = ServerConfig::load(&args.config)?;
    tracing::info!(
        config = %args.config,
        window_minutes = config.window_minutes,
        minimum_distance = config.minimum_distance,
        "loaded config"
    );

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    // --- Storage (+ ingestion when colocated) ---
    let (source, ingest): (Arc<dyn PositionSource>, Option<ChannelQueue>) = match &config.storage {
        StorageConfig::Memory => {
            let store = Arc::new(MemoryPositionStore::new());
            let (queue, receiver) = ChannelQueue::new(&config.queue);
            handles.push(spawn_consumer(
                receiver,
                Arc::new(SaveToStore::new(store.clone())),
                token.clone(),
            ));
            tracing::info!(
                topic = %config.queue.topic,
                buffer = config.queue.buffer,
                overflow = ?config.queue.overflow,
                "memory store with ingestion queue"
            );
            let source: Arc<dyn PositionSource> = store;
            (source, Some(queue))
        }
        StorageConfig::Remote(remote) => {
            let source = RemotePositionSource::new(remote)?;
            tracing::info!(url = %remote.url, timeout_ms = remote.timeout_ms, "remote position source");
            let source: Arc<dyn PositionSource> = Arc::new(source);
            (source, None)
        }
    };

    source.ping().await.map_err(ServerError::StartupPing)?;

    // --- Orchestration ---
    let analyzer = TrajectoryAnalyzer::new(source, StallDetector::new(config.minimum_distance))
        .with_fetch_timeout(Duration::from_millis(config.fetch_timeout_ms));

    let mut state = AppState::new(Arc::new(analyzer), config.window_minutes);
    if let Some(queue) = ingest {
        let topic = queue.topic().to_string();
        state = state.with_ingest(Arc::new(queue), topic);
    }

    // --- API server ---
    let api_port = config.api_port;
    let mut api_handle = tokio::spawn(tracker_api_server::run(api_port, state, token.clone()));

    tracing::info!(port = api_port, "api server listening");
    tracing::info!("server ready");

    // --- Wait for Ctrl+C or the API server exiting on its own ---
    let mut api_joined = false;
    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down...");
            signal.map_err(ServerError::from)
        }
        joined = &mut api_handle => {
            api_joined = true;
            let outcome = api_outcome(joined);
            if let Err(e) = &outcome {
                tracing::error!(error = %e, "api server stopped, shutting down...");
            }
            outcome
        }
    };
    token.cancel();

    if !api_joined {
        match tokio::time::timeout(DRAIN_TIMEOUT, &mut api_handle).await {
            Ok(joined) => {
                if let Err(e) = api_outcome(joined) {
                    tracing::error!(error = %e, "api server error during shutdown");
                }
            }
            Err(_) => {
                tracing::warn!("api server did not stop in time, aborting");
                api_handle.abort();
            }
        }
    }

    // Drain; abort anything still running after the deadline
    for mut h in handles {
        if tokio::time::timeout(DRAIN_TIMEOUT, &mut h).await.is_err() {
            tracing::warn!("task did not stop in time, aborting");
            h.abort();
            let _ = h.await;
        }
    }

    tracing::info!("shutdown complete");
    outcome
}

/// Fold the API task's join result into a server error.
fn api_outcome(joined: Result<Result<(), String>, JoinError>) -> Result<(), ServerError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ServerError::Api(e)),
        Err(e) => Err(ServerError::Api(format!("api task: {e}"))),
    }
}

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{StatusCode, Url};

use tracker_api::{ActorId, LocationPayload, PositionRecord, PositionSource, TrackerError};

// ═══════════════════════════════════════════════════════════════
//  RemoteSourceConfig
// ═══════════════════════════════════════════════════════════════

fn default_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RemoteSourceConfig {
    /// Base URL of the locations service, e.g. `http://driver-location:8080`.
    pub url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

// ═══════════════════════════════════════════════════════════════
//  RemotePositionSource
// ═══════════════════════════════════════════════════════════════

/// PositionSource backed by a sibling service over HTTP.
///
/// `GET {url}/drivers/{id}/locations?minutes=N` must answer a JSON array
/// of `LocationPayload`. Read-only: the sibling owns the store.
pub struct RemotePositionSource {
    http: reqwest::Client,
    base_url: Url,
}

impl RemotePositionSource {
    pub fn new(config: &RemoteSourceConfig) -> Result<Self, TrackerError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| TrackerError::config(format!("remote url '{}': {e}", config.url)))?;
        if base_url.cannot_be_a_base() {
            return Err(TrackerError::config(format!("remote url '{}' cannot be a base", config.url)));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| TrackerError::config(format!("HTTP client: {e}")))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, url: Url, query: &[(&str, String)]) -> Result<reqwest::Response, TrackerError> {
        let resp = self
            .http
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| TrackerError::unavailable(format!("GET {url}: {e}")))?;

        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::BAD_REQUEST => Err(TrackerError::invalid_input(format!("GET {url}: rejected (400)"))),
            status => Err(TrackerError::unavailable(format!("GET {url}: received http code {status}"))),
        }
    }
}

impl PositionSource for RemotePositionSource {
    fn fetch(
        &self,
        actor: &ActorId,
        window_minutes: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PositionRecord>, TrackerError>> + Send + '_>> {
        let actor = actor.clone();
        Box::pin(async move {
            // An empty window admits nothing. The service reads `minutes=0`
            // as its default window, so it is never sent.
            if window_minutes == 0 {
                return Ok(Vec::new());
            }
            let url = self.endpoint(&["drivers", actor.as_str(), "locations"]);
            let resp = self.get(url, &[("minutes", window_minutes.to_string())]).await?;
            let body = resp
                .bytes()
                .await
                .map_err(|e| TrackerError::unavailable(format!("read locations body: {e}")))?;

            let payloads: Vec<LocationPayload> = serde_json::from_slice(&body)
                .map_err(|e| TrackerError::from(e).with_context("decode locations body"))?;

            let mut records: Vec<PositionRecord> = payloads
                .into_iter()
                .map(|p| p.into_record(actor.clone()))
                .collect();
            records.sort_by_key(PositionRecord::observed_at);

            tracing::debug!(actor = %actor, window_minutes, count = records.len(), "fetched remote positions");
            Ok(records)
        })
    }

    fn ping(&self) -> Pin<Box<dyn Future<Output = Result<(), TrackerError>> + Send + '_>> {
        Box::pin(async {
            self.get(self.endpoint(&["health"]), &[]).await?;
            Ok(())
        })
    }
}

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use tracker_api::wire::{PARAM_ACTOR_ID, TRACE_ID_HEADER};
use tracker_api::{ActorId, Envelope, LocationPayload, ZombieResponse};

use super::AppState;
use crate::error::ApiError;

// ═══════════════════════════════════════════════════════════════
//  Request parsing
// ═══════════════════════════════════════════════════════════════

/// Path ids are integers on the wire; the store key is their decimal form.
fn parse_actor(raw: &str) -> Result<(i64, ActorId), ApiError> {
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid driver id '{raw}'")))?;
    Ok((id, ActorId::from(id)))
}

/// `minutes` absent or `0` means the configured default.
fn parse_window(params: &HashMap<String, String>, default_window: u32) -> Result<u32, ApiError> {
    match params.get("minutes").map(|m| m.trim()) {
        None | Some("") => Ok(default_window),
        Some(raw) => match raw.parse::<u32>() {
            Ok(0) => Ok(default_window),
            Ok(minutes) => Ok(minutes),
            Err(_) => Err(ApiError::bad_request(format!("invalid minutes '{raw}'"))),
        },
    }
}

fn trace_id(headers: &HeaderMap) -> String {
    headers
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /health
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    match state.analyzer.source().ping().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            ApiError::from(e).into_response()
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /drivers/{id}?minutes=N
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_classify(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<axum::Json<ZombieResponse>, ApiError> {
    let (id, actor) = parse_actor(&raw_id)?;
    let window = parse_window(&params, state.default_window)?;
    let trace_id = trace_id(&headers);

    let verdict = state.analyzer.classify(&actor, window).await.map_err(|e| {
        tracing::error!(%trace_id, actor = %actor, error = %e, "classification failed");
        ApiError::from(e)
    })?;

    Ok(axum::Json(ZombieResponse {
        id,
        zombie: verdict.stalled,
    }))
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /drivers/{id}/locations?minutes=N
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_locations(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<axum::Json<Vec<LocationPayload>>, ApiError> {
    let (_, actor) = parse_actor(&raw_id)?;
    let window = parse_window(&params, state.default_window)?;
    let trace_id = trace_id(&headers);

    let records = state.analyzer.fetch(&actor, window).await.map_err(|e| {
        tracing::error!(%trace_id, actor = %actor, error = %e, "fetch failed");
        ApiError::from(e)
    })?;

    tracing::debug!(%trace_id, actor = %actor, window, count = records.len(), "served locations");
    Ok(axum::Json(records.iter().map(LocationPayload::from).collect()))
}

// ═══════════════════════════════════════════════════════════════
//  REST: PATCH /drivers/{id}/locations
// ═══════════════════════════════════════════════════════════════

/// Wraps the raw body into an [`Envelope`] and hands it to the queue.
/// The body is not decoded here; malformed positions fail in the consumer.
pub(crate) async fn handle_ingest(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let Some((publisher, topic)) = state.ingest.as_ref() else {
        return Ok(StatusCode::NOT_FOUND);
    };
    let (_, actor) = parse_actor(&raw_id)?;
    let trace_id = trace_id(&headers);

    let mut parameters = HashMap::with_capacity(2);
    parameters.insert(PARAM_ACTOR_ID.to_string(), actor.to_string());
    parameters.insert(TRACE_ID_HEADER.to_string(), trace_id.clone());
    let message = Envelope::new(body.to_vec(), parameters).to_bytes()?;

    publisher.publish(topic, message).await.map_err(|e| {
        tracing::error!(%trace_id, %topic, error = %e, "publish failed");
        ApiError::from(e)
    })?;

    tracing::debug!(%trace_id, actor = %actor, %topic, "position enqueued");
    Ok(StatusCode::OK)
}

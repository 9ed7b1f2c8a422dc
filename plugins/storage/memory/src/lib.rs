use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use tracker_api::{ActorId, Coordinates, PositionRecord, PositionSource, PositionStore, TrackerError};

// ═══════════════════════════════════════════════════════════════
//  MemoryPositionStore
// ═══════════════════════════════════════════════════════════════

/// In-process position store, keyed by actor.
///
/// Everything saved is kept; staleness is a read-time predicate only.
/// Records per actor are an unordered bag: duplicates are kept and
/// ordering is imposed on fetch.
#[derive(Default)]
pub struct MemoryPositionStore {
    records: RwLock<HashMap<ActorId, Vec<PositionRecord>>>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Windowed fetch against an explicit `now`.
    ///
    /// Keeps records with `now - observed_at < window_minutes` (a record
    /// exactly on the boundary is stale), oldest first.
    pub async fn fetch_at(
        &self,
        actor: &ActorId,
        window_minutes: u32,
        now: DateTime<Utc>,
    ) -> Vec<PositionRecord> {
        let window = TimeDelta::minutes(i64::from(window_minutes));
        let buf = self.records.read().await;
        let mut visible: Vec<PositionRecord> = buf
            .get(actor)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| now.signed_duration_since(r.observed_at()) < window)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        visible.sort_by_key(PositionRecord::observed_at);
        visible
    }

    /// Drop every record of `actor`. Returns how many were removed.
    pub async fn purge(&self, actor: &ActorId) -> usize {
        let removed = self
            .records
            .write()
            .await
            .remove(actor)
            .map_or(0, |records| records.len());
        tracing::debug!(actor = %actor, removed, "purged positions");
        removed
    }

    /// Total records held, stale ones included.
    pub async fn len(&self) -> usize {
        self.records.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl PositionSource for MemoryPositionStore {
    fn fetch(
        &self,
        actor: &ActorId,
        window_minutes: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PositionRecord>, TrackerError>> + Send + '_>> {
        let actor = actor.clone();
        Box::pin(async move {
            let now = Utc::now();
            Ok(self.fetch_at(&actor, window_minutes, now).await)
        })
    }

    fn ping(&self) -> Pin<Box<dyn Future<Output = Result<(), TrackerError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}

impl PositionStore for MemoryPositionStore {
    fn save(
        &self,
        actor: &ActorId,
        position: Coordinates,
        now: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<(), TrackerError>> + Send + '_>> {
        let record = PositionRecord::new(actor.clone(), position, now);
        Box::pin(async move {
            tracing::debug!(actor = %record.actor(), "saving position");
            let mut buf = self.records.write().await;
            buf.entry(record.actor().clone()).or_default().push(record);
            Ok(())
        })
    }
}

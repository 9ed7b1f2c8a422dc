use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::{ActorId, Coordinates, PositionRecord, TrackerError};

// ════════════════════════════════════════════════════════════════
//  Position capabilities
// ════════════════════════════════════════════════════════════════

/// Read side of a position store: windowed fetch + reachability.
///
/// Realizations: colocated memory store, remote sibling service.
/// Orchestration only depends on this trait, so it behaves the same
/// whichever deployment is chosen.
pub trait PositionSource: Send + Sync {
    /// Records for `actor` with `now - observed_at < window_minutes`,
    /// oldest first. `now` is taken once per call. An unknown actor or a
    /// fully stale history yields an empty vector, not an error.
    fn fetch(
        &self,
        actor: &ActorId,
        window_minutes: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PositionRecord>, TrackerError>> + Send + '_>>;

    /// Verify the backing store is reachable.
    fn ping(&self) -> Pin<Box<dyn Future<Output = Result<(), TrackerError>> + Send + '_>>;
}

/// Write side. Appends without deduplication: saving the same data
/// twice stores two records.
pub trait PositionStore: PositionSource {
    /// Store `position` for `actor`, stamped with `now`.
    fn save(
        &self,
        actor: &ActorId,
        position: Coordinates,
        now: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<(), TrackerError>> + Send + '_>>;
}

// ════════════════════════════════════════════════════════════════
//  Queue capability
// ════════════════════════════════════════════════════════════════

/// Producer side of the position-update queue.
pub trait MessagePublisher: Send + Sync {
    fn publish(
        &self,
        topic: &str,
        message: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<(), TrackerError>> + Send + '_>>;
}

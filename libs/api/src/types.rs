use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TrackerError;

// ════════════════════════════════════════════════════════════════
//  Overflow Policy
// ════════════════════════════════════════════════════════════════

/// Behaviour of a bounded queue when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// try_send(): drop the message and log it.
    Drop,
    /// .send().await: wait for capacity (back-pressure).
    #[serde(alias = "backpressure")]
    BackPressure,
}

// ════════════════════════════════════════════════════════════════
//  ActorId
// ════════════════════════════════════════════════════════════════

/// Opaque identity of a tracked actor.
///
/// Assigned by the caller, never generated by the store. Boundary
/// collaborators convert from path integers or envelope strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(String);

impl ActorId {
    /// Rejects empty or whitespace-only identities.
    pub fn parse(raw: &str) -> Result<Self, TrackerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::invalid_input("empty actor id"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for ActorId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ActorId {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ════════════════════════════════════════════════════════════════
//  Coordinates
// ════════════════════════════════════════════════════════════════

/// A point in signed degrees. No range validation is performed;
/// out-of-range values are measured geometrically as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

// ════════════════════════════════════════════════════════════════
//  PositionRecord
// ════════════════════════════════════════════════════════════════

/// An observed position of an actor. Immutable once constructed:
/// re-stamping produces a new record via [`PositionRecord::with_observed_at`].
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    actor: ActorId,
    coordinates: Coordinates,
    observed_at: DateTime<Utc>,
}

impl PositionRecord {
    pub fn new(actor: ActorId, coordinates: Coordinates, observed_at: DateTime<Utc>) -> Self {
        Self { actor, coordinates, observed_at }
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    pub fn with_observed_at(self, observed_at: DateTime<Utc>) -> Self {
        Self { observed_at, ..self }
    }
}

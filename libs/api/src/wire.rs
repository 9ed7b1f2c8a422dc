use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{ActorId, Coordinates, PositionRecord, TrackerError};

/// Envelope parameter carrying the actor identity.
pub const PARAM_ACTOR_ID: &str = "id";

/// Header (and envelope parameter) propagating the request trace id.
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

// ════════════════════════════════════════════════════════════════
//  Timestamp codec
// ════════════════════════════════════════════════════════════════

/// Format as `YYYY-MM-DDThh:mm:ss.ccZ`: UTC, two fractional digits (truncated).
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    // leap seconds report nanos >= 1e9
    let centis = (t.timestamp_subsec_nanos() / 10_000_000).min(99);
    format!("{}.{centis:02}Z", t.format("%Y-%m-%dT%H:%M:%S"))
}

/// Parse an RFC 3339 timestamp. Only the `Z` designator is accepted.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TrackerError> {
    if !s.ends_with('Z') {
        return Err(TrackerError::invalid_input(format!(
            "timestamp '{s}' must be UTC with a 'Z' suffix"
        )));
    }
    let parsed = DateTime::parse_from_rfc3339(s)
        .map_err(|e| TrackerError::from(e).with_context(format!("timestamp '{s}'")))?;
    Ok(parsed.with_timezone(&Utc))
}

/// `#[serde(with = "timestamp")]` adapter for the fixed UTC format.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

// ════════════════════════════════════════════════════════════════
//  LocationPayload
// ════════════════════════════════════════════════════════════════

/// A position record crossing a service boundary. The actor travels
/// out-of-band (path parameter or envelope field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPayload {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl LocationPayload {
    pub fn into_record(self, actor: ActorId) -> PositionRecord {
        PositionRecord::new(
            actor,
            Coordinates::new(self.latitude, self.longitude),
            self.updated_at,
        )
    }
}

impl From<&PositionRecord> for LocationPayload {
    fn from(record: &PositionRecord) -> Self {
        let c = record.coordinates();
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
            updated_at: record.observed_at(),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Envelope
// ════════════════════════════════════════════════════════════════

/// Queue message: raw request body plus routing parameters.
///
/// `body` is base64 in JSON, `null` or absent is read as empty. `parameters`
/// carries the actor id and trace id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, with = "base64_bytes")]
    pub body: Vec<u8>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: HashMap<String, String>,
}

impl Envelope {
    pub fn new(body: Vec<u8>, parameters: HashMap<String, String>) -> Self {
        Self { body, parameters }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn trace_id(&self) -> &str {
        self.param(TRACE_ID_HEADER).unwrap_or("-")
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TrackerError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TrackerError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(b64) => base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  ZombieResponse
// ════════════════════════════════════════════════════════════════

/// Classification reply of the query boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZombieResponse {
    pub id: i64,
    pub zombie: bool,
}

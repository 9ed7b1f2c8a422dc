use std::sync::Arc;

use chrono::Utc;

use tracker_api::wire::PARAM_ACTOR_ID;
use tracker_api::{ActorId, Coordinates, Envelope, PositionStore};

use crate::error::IngestError;

/// Queue handler: envelope → coordinates → `save(actor, coords, now)`.
///
/// Any timestamp carried in the message body is ignored; the record is
/// stamped with the processing time.
pub struct SaveToStore {
    store: Arc<dyn PositionStore>,
}

impl SaveToStore {
    pub fn new(store: Arc<dyn PositionStore>) -> Self {
        Self { store }
    }

    pub async fn handle_message(&self, message: &[u8]) -> Result<ActorId, IngestError> {
        let envelope: Envelope = serde_json::from_slice(message).map_err(IngestError::Envelope)?;
        let trace_id = envelope.trace_id();

        let position: Coordinates = serde_json::from_slice(&envelope.body).map_err(|e| {
            tracing::warn!(trace_id, error = %e, "undecodable position body");
            IngestError::Body(e)
        })?;

        let actor = envelope
            .param(PARAM_ACTOR_ID)
            .and_then(|raw| ActorId::parse(raw).ok())
            .ok_or(IngestError::MissingActorId)?;

        self.store.save(&actor, position, Utc::now()).await?;
        tracing::debug!(trace_id, actor = %actor, "position saved");
        Ok(actor)
    }
}

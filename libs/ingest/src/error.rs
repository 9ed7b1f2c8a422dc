use tracker_api::{ErrorKind, TrackerError};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("body: {0}")]
    Body(#[source] serde_json::Error),

    #[error("no actor id found in message")]
    MissingActorId,

    #[error("store: {0}")]
    Store(#[from] TrackerError),
}

impl IngestError {
    /// Decode problems are bad input; store failures keep their own kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Envelope(_) | IngestError::Body(_) | IngestError::MissingActorId => {
                ErrorKind::InvalidInput
            }
            IngestError::Store(e) => e.kind(),
        }
    }
}

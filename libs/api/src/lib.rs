mod error;
mod store;
mod types;
pub mod wire;

pub use error::{ErrorKind, TrackerError};
pub use store::{MessagePublisher, PositionSource, PositionStore};
pub use types::{ActorId, Coordinates, OverflowPolicy, PositionRecord};
pub use wire::{Envelope, LocationPayload, ZombieResponse};

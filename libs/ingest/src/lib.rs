pub mod config;
pub mod error;
mod consumer;
mod handler;
mod queue;

pub use config::QueueConfig;
pub use consumer::spawn_consumer;
pub use error::IngestError;
pub use handler::SaveToStore;
pub use queue::{ChannelQueue, QueueReceiver};

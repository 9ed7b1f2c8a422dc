use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use tracker_api::{MessagePublisher, OverflowPolicy, TrackerError};

use crate::config::QueueConfig;

// ═══════════════════════════════════════════════════════════════
//  ChannelQueue: in-process MessagePublisher
// ═══════════════════════════════════════════════════════════════

/// Bounded single-topic queue. The publisher half is cheap to clone;
/// the receiver half goes to [`crate::spawn_consumer`].
#[derive(Clone)]
pub struct ChannelQueue {
    topic: String,
    tx: mpsc::Sender<Vec<u8>>,
    overflow: OverflowPolicy,
}

pub struct QueueReceiver {
    topic: String,
    rx: mpsc::Receiver<Vec<u8>>,
}

impl ChannelQueue {
    pub fn new(config: &QueueConfig) -> (Self, QueueReceiver) {
        let (tx, rx) = mpsc::channel(config.buffer.max(1));
        let queue = Self {
            topic: config.topic.clone(),
            tx,
            overflow: config.overflow,
        };
        let receiver = QueueReceiver {
            topic: config.topic.clone(),
            rx,
        };
        (queue, receiver)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl MessagePublisher for ChannelQueue {
    fn publish(
        &self,
        topic: &str,
        message: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<(), TrackerError>> + Send + '_>> {
        let topic = topic.to_string();
        Box::pin(async move {
            if topic != self.topic {
                return Err(TrackerError::invalid_input(format!("unknown topic '{topic}'")));
            }
            match self.overflow {
                OverflowPolicy::Drop => match self.tx.try_send(message) {
                    Ok(()) => Ok(()),
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(%topic, "queue full, dropping message");
                        Ok(())
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        Err(TrackerError::unavailable(format!("queue '{topic}' closed")))
                    }
                },
                OverflowPolicy::BackPressure => self
                    .tx
                    .send(message)
                    .await
                    .map_err(|_| TrackerError::unavailable(format!("queue '{topic}' closed"))),
            }
        })
    }
}

impl QueueReceiver {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next message. `None` once every publisher is dropped.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}

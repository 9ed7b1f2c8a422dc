use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::handler::SaveToStore;
use crate::queue::QueueReceiver;

// ═══════════════════════════════════════════════════════════════
//  Consumer task: queue → SaveToStore
// ═══════════════════════════════════════════════════════════════

/// Drain the queue until cancelled or closed. Each message is handled on
/// its own task; failures are logged and the message is dropped.
///
/// On stop, in-flight saves are awaited before the returned handle resolves.
pub fn spawn_consumer(
    mut receiver: QueueReceiver,
    handler: Arc<SaveToStore>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let topic = receiver.topic().to_string();
        let in_flight = TaskTracker::new();
        tracing::info!(%topic, "consumer started");

        loop {
            tokio::select! {
                message = receiver.recv() => {
                    match message {
                        Some(message) => {
                            let handler = handler.clone();
                            let topic = topic.clone();
                            in_flight.spawn(async move {
                                if let Err(e) = handler.handle_message(&message).await {
                                    tracing::error!(%topic, kind = %e.kind(), error = %e, "dropping message");
                                }
                            });
                        }
                        None => break,
                    }
                }
                _ = token.cancelled() => break,
            }
        }

        in_flight.close();
        in_flight.wait().await;
        tracing::info!(%topic, "consumer stopped");
    })
}

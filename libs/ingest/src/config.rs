use serde::Deserialize;

use tracker_api::OverflowPolicy;

// ═══════════════════════════════════════════════════════════════
//  Queue Config
// ═══════════════════════════════════════════════════════════════

/// In-process position-update queue.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Topic name the ingestion route publishes to.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Channel capacity in messages.
    #[serde(default = "default_buffer")]
    pub buffer: usize,
    /// What to do when the channel is full.
    #[serde(default = "default_overflow")]
    pub overflow: OverflowPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            buffer: default_buffer(),
            overflow: default_overflow(),
        }
    }
}

fn default_topic() -> String {
    "locations".into()
}
fn default_buffer() -> usize {
    4096
}
fn default_overflow() -> OverflowPolicy {
    OverflowPolicy::BackPressure
}

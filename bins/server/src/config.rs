use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

pub use ingest::QueueConfig;
pub use storage_remote::RemoteSourceConfig;

use crate::error::ServerError;

#[derive(Parser)]
#[command(name = "tracker-server", about = "Driver location tracking and stall detection service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml", env = "CONFIG_PATH")]
    pub config: String,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Trailing window used when a request does not name one.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,
    /// Path length (km) under which an actor is considered stalled.
    pub minimum_distance: f64,
    /// Deadline for every position fetch issued while classifying.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Where positions live.
///
/// `memory` keeps them in-process and enables the ingestion route;
/// `remote` reads them from a sibling locations service.
#[derive(Debug, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    #[default]
    Memory,
    Remote(RemoteSourceConfig),
}

fn default_api_port() -> u16 {
    8080
}
fn default_window_minutes() -> u32 {
    5
}
fn default_fetch_timeout_ms() -> u64 {
    5_000
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content)
            .map_err(|e| match e {
                ServerError::Config { context, detail } => ServerError::Config { context, detail: format!("'{path}': {detail}") },
                other => other,
            })
    }

    pub fn parse(content: &str) -> Result<Self, ServerError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ServerError::Config { context: "parse", detail: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ServerError> {
        let invalid = |detail: String| ServerError::Config { context: "validate", detail };

        if self.window_minutes == 0 {
            return Err(invalid("window_minutes must be > 0".into()));
        }
        if !self.minimum_distance.is_finite() {
            return Err(invalid(format!("minimum_distance must be finite, got {}", self.minimum_distance)));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(invalid("fetch_timeout_ms must be > 0".into()));
        }
        if self.queue.topic.trim().is_empty() {
            return Err(invalid("queue.topic must not be empty".into()));
        }
        if self.queue.buffer == 0 {
            return Err(invalid("queue.buffer must be > 0".into()));
        }
        if let StorageConfig::Remote(remote) = &self.storage {
            if remote.url.trim().is_empty() {
                return Err(invalid("storage.url must not be empty".into()));
            }
        }
        Ok(())
    }
}

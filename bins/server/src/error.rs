use tracker_api::TrackerError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("storage: {0}")]
    Storage(#[from] TrackerError),

    #[error("position store unreachable at startup: {0}")]
    StartupPing(#[source] TrackerError),

    #[error("api: {0}")]
    Api(String),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}

impl ServerError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServerError::StartupPing(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_ping_failure_exits_with_2() {
        let err = ServerError::StartupPing(TrackerError::unavailable("connection refused"));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn other_failures_exit_with_1() {
        let config = ServerError::Config { context: "parse", detail: "bad".into() };
        assert_eq!(config.exit_code(), 1);
        assert_eq!(ServerError::Storage(TrackerError::config("bad url")).exit_code(), 1);
        assert_eq!(ServerError::Api("bind".into()).exit_code(), 1);
    }
}

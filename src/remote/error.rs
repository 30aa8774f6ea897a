use crate::player::PlayerError;

/// Every way a single remote request can fail. All of them surface to the
/// caller as HTTP 500 with `diagnostic()` as the body.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid parameter {field}: {value}")]
    InvalidParameter { field: &'static str, value: String },
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("shutdown in progress")]
    ShutdownInProgress,
    #[error("player failure: {0}")]
    Player(#[from] PlayerError),
}

impl RemoteError {
    /// Display text followed by the full source chain, one cause per line.
    pub fn diagnostic(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\ncaused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

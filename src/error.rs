use thiserror::Error;

/// Failure raised by a client or tool. Tools never let this escape: the
/// executor folds it into a [`crate::tools::ToolOutcome::Failure`].
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Spotify request failed: {0}")]
    Spotify(#[from] rspotify::ClientError),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("Invalid catalog URI '{0}'")]
    InvalidUri(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tool timed out after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, ToolError>;

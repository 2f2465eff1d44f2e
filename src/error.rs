use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum StanzaError {
    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("failed to parse {format} payload: {message}")]
    Parse { format: String, message: String },

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("invalid tree structure: {0}")]
    Structural(String),

    #[error("invalid node at position {index}: {message}")]
    InvalidNode { index: usize, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl StanzaError {
    pub fn parse(format: impl ToString, message: impl ToString) -> Self {
        StanzaError::Parse {
            format: format.to_string(),
            message: message.to_string(),
        }
    }

    pub fn notification_message(&self) -> String {
        match self {
            StanzaError::Timeout => "Request timed out".to_string(),
            other => other.to_string(),
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack API error in {method}: {error}")]
    Api { method: String, error: String },

    #[error("Unexpected status {status} from {method}: {body}")]
    Status {
        method: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid bot token: {0}")]
    InvalidToken(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

//! Client error types

use bgv_types::BgvError;
use thiserror::Error;

/// Errors raised while talking to the verification service
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Non-success response; `message` is the server's detail text
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for BgvError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_timeout() => BgvError::Timeout,
            ClientError::Http(e) if e.is_decode() => BgvError::Decode(e.to_string()),
            ClientError::Http(e) => BgvError::Transport(e.to_string()),
            ClientError::InvalidEndpoint(endpoint) => {
                BgvError::Transport(format!("invalid endpoint: {}", endpoint))
            }
            ClientError::Api { status, message } => BgvError::server(Some(status), message),
            ClientError::Decode(e) => BgvError::Decode(e.to_string()),
        }
    }
}

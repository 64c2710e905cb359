use reqwest::StatusCode;
use thiserror::Error;

/// Every way a search flow can fail. The menu loop prints these with their
/// kind tag and then goes back to the menu.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Error [EMPTY_INPUT]: nothing was entered")]
    EmptyInput,
    #[error("Error [INVALID_RESPONSE]: {0}")]
    InvalidResponse(String),
    #[error("Error [NETWORK]: request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Error [NETWORK]: {url} answered with status {status}")]
    Status { status: StatusCode, url: String },
    #[error("Error [DECODE]: unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Error [IO]: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        SearchError::InvalidResponse(reason.into())
    }

    /// Short upper-snake tag for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::EmptyInput => "EMPTY_INPUT",
            SearchError::InvalidResponse(_) => "INVALID_RESPONSE",
            SearchError::Transport(_) | SearchError::Status { .. } => "NETWORK",
            SearchError::Decode(_) => "DECODE",
            SearchError::Io(_) => "IO",
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Malformed target: {0}")]
    MalformedTarget(String),

    #[error("Imagery service error: {0}")]
    Imagery(String),

    #[error("Cannot {action} while round is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

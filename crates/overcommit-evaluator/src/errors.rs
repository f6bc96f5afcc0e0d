use http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReviewError>;

/// Failures of a single admission review. None of them is retried and none
/// outlives the request it occurred in.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("no body found")]
    EmptyPayload,

    #[error("could not decode the admission review from the request: {0}")]
    Decode(String),

    #[error("could not decode admission request object: {0}")]
    MalformedObject(String),

    #[error("error marshaling to json admission review response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ReviewError {
    /// HTTP status the endpoint should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::EmptyPayload | ReviewError::Decode(_) | ReviewError::MalformedObject(_) => {
                StatusCode::BAD_REQUEST
            }
            ReviewError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

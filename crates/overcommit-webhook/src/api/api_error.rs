use axum::{http::StatusCode, response::IntoResponse};
use overcommit_evaluator::ReviewError;

/// An error returned by the review endpoint, written back as plain text.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl From<ReviewError> for ApiError {
    fn from(error: ReviewError) -> Self {
        Self {
            status: error.status_code(),
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use overcommit_evaluator::Outcome;
use tracing::{Span, debug, error, info};

use crate::api::{api_error::ApiError, state::ApiServerState};

#[tracing::instrument(
    name = "review",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        policy=state.pipeline.policy_name(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        kind=tracing::field::Empty,
        allowed=tracing::field::Empty,
        response_code=tracing::field::Empty,
    ),
    skip_all)]
/// Evaluate the AdmissionReview carried by the request body.
pub(crate) async fn review_handler(
    State(state): State<Arc<ApiServerState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    match state.pipeline.evaluate(&body) {
        Ok(Outcome::Reviewed(verdict)) => {
            Span::current().record("allowed", verdict.response.allowed);
            Span::current().record("response_code", verdict.status.as_u16());
            info!(allowed = verdict.response.allowed, "review evaluated");

            Ok((
                verdict.status,
                [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
                verdict.body,
            )
                .into_response())
        }
        Ok(Outcome::Skipped { uid, kind }) => {
            Span::current().record("response_code", StatusCode::OK.as_u16());
            debug!(uid = uid.as_str(), kind = kind.as_str(), "no admission response written");

            Ok(StatusCode::OK.into_response())
        }
        Err(err) => {
            let err = ApiError::from(err);
            Span::current().record("response_code", err.status.as_u16());
            error!(status = err.status.as_u16(), error = %err.message, "cannot review request");

            Err(err)
        }
    }
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

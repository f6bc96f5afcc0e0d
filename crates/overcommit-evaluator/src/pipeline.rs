use std::sync::Arc;

use http::StatusCode;
use tracing::{Span, debug};

use crate::admission_request::AdmissionRequest;
use crate::admission_response::AdmissionResponse;
use crate::admission_review::{decode_review, encode_review};
use crate::errors::Result;
use crate::policy::Policy;
use crate::workload::WorkloadDescription;

/// Result of a successful run of the pipeline.
#[derive(Debug)]
pub enum Outcome {
    /// The object is not of the policy's subject kind: no admission response
    /// is produced and nothing must be written back.
    Skipped { uid: String, kind: String },

    /// The object has been evaluated.
    Reviewed(Verdict),
}

/// An encoded admission review response, together with the HTTP status the
/// endpoint has to use when writing it.
#[derive(Debug)]
pub struct Verdict {
    pub response: AdmissionResponse,
    pub body: Vec<u8>,
    pub status: StatusCode,
}

/// Decode, extract, evaluate, encode.
///
/// Built once at startup and shared between all the requests; it holds no
/// mutable state, concurrent evaluations need no coordination.
#[derive(Clone)]
pub struct ReviewPipeline {
    policy: Arc<dyn Policy>,
}

impl ReviewPipeline {
    pub fn new(policy: Arc<dyn Policy>) -> Self {
        ReviewPipeline { policy }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn evaluate(&self, raw: &[u8]) -> Result<Outcome> {
        let (review, admission_request) = decode_review(raw)?;
        let request = &admission_request;
        populate_span_with_admission_request_data(request);
        debug!(
            uid = request.uid.as_str(),
            kind = request.kind.kind.as_str(),
            operation = request.operation.as_str(),
            namespace = request.namespace.as_deref().unwrap_or_default(),
            "new admission request"
        );

        let Some(workload) = WorkloadDescription::from_request(request)? else {
            debug!(kind = request.kind.kind.as_str(), "resource kind not subject to policy, skipped");
            return Ok(Outcome::Skipped {
                uid: request.uid.clone(),
                kind: request.kind.kind.clone(),
            });
        };

        let decision = self.policy.evaluate(&workload);
        let response = AdmissionResponse::from_decision(request.uid.clone(), &decision);
        let body = encode_review(&review, response.clone())?;

        // a rejected review is reported as a server error
        let status = if response.is_failure() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };

        Ok(Outcome::Reviewed(Verdict {
            response,
            body,
            status,
        }))
    }
}

/// Record the coordinates of the admission request on the current span.
/// Fields the span does not declare are ignored.
fn populate_span_with_admission_request_data(request: &AdmissionRequest) {
    let span = Span::current();
    span.record("request_uid", request.uid.as_str());
    span.record("kind", request.kind.kind.as_str());
    span.record("name", request.name.as_deref().unwrap_or_default());
    span.record("namespace", request.namespace.as_deref().unwrap_or_default());
    span.record("operation", request.operation.as_str());
}

use crate::admission_request::AdmissionRequest;
use crate::admission_response::AdmissionResponse;
use crate::constants::{ADMISSION_REVIEW_API_VERSION, ADMISSION_REVIEW_KIND};
use crate::errors::{Result, ReviewError};

/// The AdmissionReview envelope, in both directions: the API server fills
/// `request`, the webhook answers with `response`.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReview {
    /// Builds the reply to `review`, keeping the apiVersion and kind the API
    /// server used: it refuses replies whose version differs from the request.
    pub fn reply_to(review: &AdmissionReview, response: AdmissionResponse) -> Self {
        AdmissionReview {
            api_version: Some(
                review
                    .api_version
                    .clone()
                    .unwrap_or_else(|| String::from(ADMISSION_REVIEW_API_VERSION)),
            ),
            kind: Some(
                review
                    .kind
                    .clone()
                    .unwrap_or_else(|| String::from(ADMISSION_REVIEW_KIND)),
            ),
            request: None,
            response: Some(response),
        }
    }
}

/// Decodes the body of an admission webhook call.
///
/// The request is moved out of the returned envelope, which only keeps the
/// fields needed to address the reply.
pub fn decode_review(raw: &[u8]) -> Result<(AdmissionReview, AdmissionRequest)> {
    if raw.is_empty() {
        return Err(ReviewError::EmptyPayload);
    }

    let mut review: AdmissionReview =
        serde_json::from_slice(raw).map_err(|e| ReviewError::Decode(e.to_string()))?;
    let request = review
        .request
        .take()
        .ok_or_else(|| ReviewError::Decode("missing field `request`".to_string()))?;

    Ok((review, request))
}

/// Serializes the reply to `review` carrying `response`.
pub fn encode_review(review: &AdmissionReview, response: AdmissionResponse) -> Result<Vec<u8>> {
    serde_json::to_vec(&AdmissionReview::reply_to(review, response)).map_err(ReviewError::Encode)
}

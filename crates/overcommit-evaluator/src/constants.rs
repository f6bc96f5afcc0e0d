/// The only object kind inspected by the overcommit policy.
pub const SUBJECT_KIND: &str = "Pod";

/// Name of the resource whose limit/request ratio is bounded.
pub const CPU_RESOURCE: &str = "cpu";

/// A container is rejected when `limit / request` (integer division) exceeds this value.
pub const MAX_CPU_OVERCOMMIT_RATIO: i64 = 3;

/// Message carried by every decision, whatever its outcome.
pub const DECISION_MESSAGE: &str = "ok";

pub const ADMISSION_REVIEW_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

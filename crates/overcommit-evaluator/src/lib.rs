pub mod admission_request;
pub mod admission_response;
pub mod admission_review;
pub mod constants;
pub mod errors;
pub mod pipeline;
pub mod policy;
pub mod quantity;
pub mod workload;

pub use errors::{Result, ReviewError};
pub use pipeline::{Outcome, ReviewPipeline, Verdict};
pub use policy::{AlwaysAllowPolicy, CpuOvercommitPolicy, Decision, Policy};
pub use workload::{ContainerResources, WorkloadDescription};

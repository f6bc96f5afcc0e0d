use tracing::{debug, info};

use crate::admission_response::AdmissionResponseStatusValue;
use crate::constants::{DECISION_MESSAGE, MAX_CPU_OVERCOMMIT_RATIO};
use crate::quantity;
use crate::workload::{ContainerResources, WorkloadDescription};

/// Outcome of a policy evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub status: AdmissionResponseStatusValue,
    pub message: String,
}

impl Decision {
    pub fn allow() -> Self {
        Decision {
            allowed: true,
            status: AdmissionResponseStatusValue::Success,
            message: DECISION_MESSAGE.to_string(),
        }
    }

    pub fn deny() -> Self {
        Decision {
            allowed: false,
            status: AdmissionResponseStatusValue::Failure,
            message: DECISION_MESSAGE.to_string(),
        }
    }
}

/// A predicate over the workload under review.
///
/// Implementations must be pure: the same workload always yields the same
/// decision, and nothing is remembered between evaluations.
pub trait Policy: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, workload: &WorkloadDescription) -> Decision;
}

/// Rejects Pods having a container whose CPU limit exceeds its CPU request
/// by more than [`MAX_CPU_OVERCOMMIT_RATIO`] times.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuOvercommitPolicy;

impl CpuOvercommitPolicy {
    /// `limit / request`, truncated. `None` when the container cannot be
    /// judged: limit or request missing or not an integer, or a request of
    /// zero (or less).
    pub fn overcommit_ratio(container: &ContainerResources) -> Option<i64> {
        let limit = quantity::as_int64(container.cpu_limit.as_ref()?)?;
        let request = quantity::as_int64(container.cpu_request.as_ref()?)?;
        if request <= 0 {
            return None;
        }
        Some(limit / request)
    }
}

impl Policy for CpuOvercommitPolicy {
    fn name(&self) -> &'static str {
        "cpu-overcommit"
    }

    fn evaluate(&self, workload: &WorkloadDescription) -> Decision {
        let mut decision = Decision::allow();

        // every container is inspected, even after the first violation
        for container in &workload.containers {
            debug!(
                container = container.name.as_str(),
                cpu_limit = container.cpu_limit.as_ref().map(|q| q.0.as_str()),
                cpu_request = container.cpu_request.as_ref().map(|q| q.0.as_str()),
                "container resources"
            );

            let Some(ratio) = Self::overcommit_ratio(container) else {
                continue;
            };
            debug!(container = container.name.as_str(), ratio, "container overcommit ratio");

            if ratio > MAX_CPU_OVERCOMMIT_RATIO {
                info!(
                    workload = workload.name.as_str(),
                    container = container.name.as_str(),
                    ratio,
                    max_ratio = MAX_CPU_OVERCOMMIT_RATIO,
                    "cpu overcommit ratio exceeded"
                );
                decision = Decision::deny();
            }
        }

        decision
    }
}

/// Accepts everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysAllowPolicy;

impl Policy for AlwaysAllowPolicy {
    fn name(&self) -> &'static str {
        "always-allow"
    }

    fn evaluate(&self, _workload: &WorkloadDescription) -> Decision {
        Decision::allow()
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use rstest::*;

    use super::*;

    fn container(name: &str, limit: Option<&str>, request: Option<&str>) -> ContainerResources {
        ContainerResources {
            name: name.to_string(),
            cpu_limit: limit.map(|l| Quantity(l.to_string())),
            cpu_request: request.map(|r| Quantity(r.to_string())),
        }
    }

    fn workload(containers: Vec<ContainerResources>) -> WorkloadDescription {
        WorkloadDescription {
            name: "test".to_string(),
            containers,
        }
    }

    #[rstest]
    #[case::same_limit_and_request(Some("100"), Some("100"), Some(1))]
    #[case::exactly_three(Some("300"), Some("100"), Some(3))]
    #[case::truncated_to_three(Some("390"), Some("100"), Some(3))]
    #[case::four(Some("400"), Some("100"), Some(4))]
    #[case::limit_below_request(Some("1"), Some("4"), Some(0))]
    #[case::zero_request(Some("4"), Some("0"), None)]
    #[case::negative_request(Some("4"), Some("-1"), None)]
    #[case::missing_limit(None, Some("1"), None)]
    #[case::missing_request(Some("4"), None, None)]
    #[case::fractional_request(Some("4"), Some("100m"), None)]
    #[case::fractional_limit(Some("1500m"), Some("1"), None)]
    #[case::whole_millicores(Some("4000m"), Some("1000m"), None)]
    #[case::millicore_request(Some("4"), Some("1000m"), None)]
    #[case::suffixed(Some("8k"), Some("2k"), Some(4))]
    fn compute_overcommit_ratio(
        #[case] limit: Option<&str>,
        #[case] request: Option<&str>,
        #[case] expected: Option<i64>,
    ) {
        let c = container("c", limit, request);
        assert_eq!(CpuOvercommitPolicy::overcommit_ratio(&c), expected);
    }

    #[rstest]
    #[case::ratio_one(vec![container("a", Some("100"), Some("100"))], true)]
    #[case::ratio_exactly_three(vec![container("a", Some("300"), Some("100"))], true)]
    #[case::ratio_three_plus_one(vec![container("a", Some("301"), Some("100"))], true)]
    #[case::ratio_four(vec![container("a", Some("400"), Some("100"))], false)]
    #[case::zero_request(vec![container("a", Some("400"), Some("0"))], true)]
    #[case::no_resources(vec![container("a", None, None)], true)]
    #[case::no_containers(vec![], true)]
    #[case::millicores_are_not_judged(vec![container("a", Some("4000m"), Some("1000m"))], true)]
    #[case::deny_then_allow(
        vec![
            container("a", Some("500"), Some("100")),
            container("b", Some("100"), Some("100")),
        ],
        false
    )]
    #[case::allow_then_deny(
        vec![
            container("a", Some("100"), Some("100")),
            container("b", Some("5"), Some("1")),
        ],
        false
    )]
    #[case::deny_then_unjudgeable(
        vec![
            container("a", Some("8"), Some("1")),
            container("b", Some("8"), Some("0")),
            container("c", None, Some("1")),
        ],
        false
    )]
    fn evaluate_cpu_overcommit(
        #[case] containers: Vec<ContainerResources>,
        #[case] expected_allowed: bool,
    ) {
        let decision = CpuOvercommitPolicy.evaluate(&workload(containers));

        let expected = if expected_allowed {
            Decision::allow()
        } else {
            Decision::deny()
        };
        assert_eq!(decision, expected);
    }

    // the truncating division absorbs the extra unit unless the request is 1
    #[rstest]
    #[case::request_one(1, false)]
    #[case::request_two(2, true)]
    #[case::request_hundred(100, true)]
    fn limit_of_three_times_request_plus_one(#[case] request: i64, #[case] expected_allowed: bool) {
        let limit = 3 * request + 1;
        let c = container("a", Some(&limit.to_string()), Some(&request.to_string()));

        let decision = CpuOvercommitPolicy.evaluate(&workload(vec![c]));

        assert_eq!(decision.allowed, expected_allowed);
    }

    #[test]
    fn deny_is_never_reverted() {
        let mut containers = vec![container("greedy", Some("10"), Some("1"))];
        for i in 0..10 {
            containers.push(container(&format!("safe-{i}"), Some("2"), Some("1")));
        }

        let decision = CpuOvercommitPolicy.evaluate(&workload(containers));

        assert_eq!(decision, Decision::deny());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let w = workload(vec![
            container("a", Some("4"), Some("1")),
            container("b", Some("1"), Some("1")),
        ]);

        assert_eq!(CpuOvercommitPolicy.evaluate(&w), CpuOvercommitPolicy.evaluate(&w));
    }

    #[test]
    fn decision_message_is_not_policy_specific() {
        assert_eq!(Decision::allow().message, "ok");
        assert_eq!(Decision::deny().message, "ok");
    }

    #[test]
    fn always_allow_ignores_resources() {
        let w = workload(vec![container("greedy", Some("100"), Some("1"))]);

        assert_eq!(AlwaysAllowPolicy.evaluate(&w), Decision::allow());
        assert_eq!(AlwaysAllowPolicy.name(), "always-allow");
        assert_eq!(CpuOvercommitPolicy.name(), "cpu-overcommit");
    }
}

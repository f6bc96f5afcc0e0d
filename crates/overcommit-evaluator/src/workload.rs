use k8s_openapi::api::core::v1::{Container, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use tracing::debug;

use crate::admission_request::AdmissionRequest;
use crate::constants::{CPU_RESOURCE, SUBJECT_KIND};
use crate::errors::{Result, ReviewError};

/// The parts of a Pod the overcommit policy looks at.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkloadDescription {
    pub name: String,
    /// Containers in the order they are declared by the Pod spec.
    pub containers: Vec<ContainerResources>,
}

/// CPU limit and request of a single container. Either of them can be
/// missing, that's a legit configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContainerResources {
    pub name: String,
    pub cpu_limit: Option<Quantity>,
    pub cpu_request: Option<Quantity>,
}

impl WorkloadDescription {
    /// Extracts the workload under review.
    ///
    /// Returns `Ok(None)` when the request targets a kind other than Pod: the
    /// policy has nothing to say about it.
    pub fn from_request(request: &AdmissionRequest) -> Result<Option<Self>> {
        if request.kind.kind != SUBJECT_KIND {
            return Ok(None);
        }

        let raw = request
            .object
            .as_ref()
            .ok_or_else(|| ReviewError::MalformedObject("object is missing".to_string()))?;
        // the Pod schema is enforced: a container without a name is malformed
        let pod: Pod = serde_json::from_value(raw.0.clone())
            .map_err(|e| ReviewError::MalformedObject(e.to_string()))?;

        let workload = Self::from_pod(&pod, request.name.as_deref());
        debug!(
            name = workload.name.as_str(),
            containers = workload.containers.len(),
            "workload extracted"
        );

        Ok(Some(workload))
    }

    /// `fallback_name` is used when the Pod has neither a name nor a
    /// `generateName`, which is the case of Pods created by controllers
    /// before the API server assigns them one.
    pub fn from_pod(pod: &Pod, fallback_name: Option<&str>) -> Self {
        let name = pod
            .metadata
            .name
            .as_deref()
            .or(pod.metadata.generate_name.as_deref())
            .or(fallback_name)
            .unwrap_or_default()
            .to_string();

        let containers = pod
            .spec
            .as_ref()
            .map(|spec| spec.containers.iter().map(ContainerResources::from).collect())
            .unwrap_or_default();

        WorkloadDescription { name, containers }
    }
}

impl From<&Container> for ContainerResources {
    fn from(container: &Container) -> Self {
        let resources = container.resources.as_ref();
        let cpu_limit = resources
            .and_then(|r| r.limits.as_ref())
            .and_then(|limits| limits.get(CPU_RESOURCE))
            .cloned();
        let cpu_request = resources
            .and_then(|r| r.requests.as_ref())
            .and_then(|requests| requests.get(CPU_RESOURCE))
            .cloned();

        ContainerResources {
            name: container.name.clone(),
            cpu_limit,
            cpu_request,
        }
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
    use serde_json::json;

    use super::*;
    use crate::admission_request::GroupVersionKind;

    fn request_for(kind: &str, object: Option<serde_json::Value>) -> AdmissionRequest {
        AdmissionRequest {
            uid: "uid".to_string(),
            kind: GroupVersionKind {
                group: String::new(),
                version: "v1".to_string(),
                kind: kind.to_string(),
            },
            name: Some("from-request".to_string()),
            operation: "CREATE".to_string(),
            object: object.map(RawExtension),
            ..Default::default()
        }
    }

    #[test]
    fn extract_containers_in_declared_order() {
        let object = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "web"},
            "spec": {
                "containers": [
                    {
                        "name": "app",
                        "image": "nginx",
                        "resources": {
                            "limits": {"cpu": "4", "memory": "1Gi"},
                            "requests": {"cpu": "1"}
                        }
                    },
                    {
                        "name": "sidecar",
                        "image": "envoy",
                        "resources": {"limits": {"cpu": "500m"}}
                    },
                    {"name": "bare", "image": "busybox"}
                ]
            }
        });

        let workload = WorkloadDescription::from_request(&request_for("Pod", Some(object)))
            .expect("extraction should work")
            .expect("pods are subject to the policy");

        assert_eq!(workload.name, "web");
        let names: Vec<&str> = workload.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["app", "sidecar", "bare"]);

        assert_eq!(workload.containers[0].cpu_limit, Some(Quantity("4".to_string())));
        assert_eq!(workload.containers[0].cpu_request, Some(Quantity("1".to_string())));
        assert_eq!(workload.containers[1].cpu_limit, Some(Quantity("500m".to_string())));
        assert_eq!(workload.containers[1].cpu_request, None);
        assert_eq!(workload.containers[2], ContainerResources {
            name: "bare".to_string(),
            cpu_limit: None,
            cpu_request: None,
        });
    }

    #[test]
    fn other_kinds_are_not_applicable() {
        let object = json!({"apiVersion": "v1", "kind": "ConfigMap", "data": {"a": "b"}});

        let workload = WorkloadDescription::from_request(&request_for("ConfigMap", Some(object)))
            .expect("not applicable is not an error");

        assert!(workload.is_none());
    }

    #[test]
    fn missing_object_is_malformed() {
        let result = WorkloadDescription::from_request(&request_for("Pod", None));

        assert!(matches!(result, Err(ReviewError::MalformedObject(_))));
    }

    #[test]
    fn object_with_wrong_shape_is_malformed() {
        let object = json!({"apiVersion": "v1", "kind": "Pod", "spec": {"containers": "nope"}});

        let result = WorkloadDescription::from_request(&request_for("Pod", Some(object)));

        assert!(matches!(result, Err(ReviewError::MalformedObject(_))));
    }

    #[test]
    fn container_without_name_is_malformed() {
        let object = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "spec": {
                "containers": [{"resources": {"limits": {"cpu": "8"}, "requests": {"cpu": "1"}}}]
            }
        });

        let result = WorkloadDescription::from_request(&request_for("Pod", Some(object)));

        match result {
            Err(ReviewError::MalformedObject(message)) => assert!(message.contains("name")),
            other => panic!("expected a malformed object, got {other:?}"),
        }
    }

    #[test]
    fn name_falls_back_to_generate_name_then_request() {
        let generated = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"generateName": "web-"},
            "spec": {"containers": []}
        });
        let anonymous = json!({"apiVersion": "v1", "kind": "Pod", "spec": {"containers": []}});

        let generated = WorkloadDescription::from_request(&request_for("Pod", Some(generated)))
            .unwrap()
            .unwrap();
        let anonymous = WorkloadDescription::from_request(&request_for("Pod", Some(anonymous)))
            .unwrap()
            .unwrap();

        assert_eq!(generated.name, "web-");
        assert_eq!(anonymous.name, "from-request");
    }

    #[test]
    fn pod_without_spec_has_no_containers() {
        let object = json!({"apiVersion": "v1", "kind": "Pod", "metadata": {"name": "empty"}});

        let workload = WorkloadDescription::from_request(&request_for("Pod", Some(object)))
            .unwrap()
            .unwrap();

        assert!(workload.containers.is_empty());
    }
}

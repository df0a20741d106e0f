// Flattens k8s-openapi pod objects into the engine's snapshot model.
//
// Absent fields degrade to defaults (empty vecs, Unknown states) so a pod
// fetched mid-creation still produces a snapshot instead of an error.
use k8s_openapi::api::core::v1 as corev1;

use crate::models::pod::{ContainerState, ContainerStatus, PodCondition, PodSnapshot, PodTarget};

fn convert_state(state: Option<&corev1::ContainerState>) -> ContainerState {
    let Some(state) = state else {
        return ContainerState::Unknown;
    };

    if let Some(t) = &state.terminated {
        ContainerState::Terminated {
            exit_code: t.exit_code,
            signal: t.signal.unwrap_or(0),
            reason: t.reason.clone(),
            message: t.message.clone(),
            finished_at: t.finished_at.as_ref().map(|time| time.0),
        }
    } else if let Some(w) = &state.waiting {
        ContainerState::Waiting {
            reason: w.reason.clone(),
            message: w.message.clone(),
        }
    } else if state.running.is_some() {
        ContainerState::Running {}
    } else {
        ContainerState::Unknown
    }
}

fn convert_status(status: &corev1::ContainerStatus) -> ContainerStatus {
    ContainerStatus {
        name: status.name.clone(),
        ready: status.ready,
        restart_count: u32::try_from(status.restart_count).unwrap_or(0),
        state: convert_state(status.state.as_ref()),
        last_state: convert_state(status.last_state.as_ref()),
    }
}

impl From<&corev1::Pod> for PodSnapshot {
    fn from(pod: &corev1::Pod) -> Self {
        let spec = pod.spec.as_ref();
        let status = pod.status.as_ref();

        let convert_all = |statuses: Option<&Vec<corev1::ContainerStatus>>| {
            statuses
                .map(|list| list.iter().map(convert_status).collect())
                .unwrap_or_default()
        };

        PodSnapshot {
            resource_version: pod.metadata.resource_version.clone().unwrap_or_default(),
            deletion_timestamp: pod.metadata.deletion_timestamp.as_ref().map(|time| time.0),
            spec_container_count: spec.map(|s| s.containers.len() as u32).unwrap_or(0),
            spec_init_container_count: spec
                .and_then(|s| s.init_containers.as_ref())
                .map(|c| c.len() as u32)
                .unwrap_or(0),
            status_phase: status.and_then(|s| s.phase.clone()).unwrap_or_default(),
            status_reason: status.and_then(|s| s.reason.clone()),
            init_container_statuses: convert_all(
                status.and_then(|s| s.init_container_statuses.as_ref()),
            ),
            container_statuses: convert_all(status.and_then(|s| s.container_statuses.as_ref())),
            conditions: status
                .and_then(|s| s.conditions.as_ref())
                .map(|list| {
                    list.iter()
                        .map(|c| PodCondition {
                            type_: c.type_.clone(),
                            status: c.status.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl PodTarget {
    /// Addressing pair for a fetched pod.  Falls back to empty strings when
    /// metadata is incomplete; callers should not stream against such pods.
    pub fn from_pod(pod: &corev1::Pod) -> Self {
        PodTarget::new(
            pod.metadata.namespace.clone().unwrap_or_default(),
            pod.metadata.name.clone().unwrap_or_default(),
        )
    }
}

// Rust structs mirroring the API server's pod status payloads, flattened to
// just the fields the status algorithm and the stream endpoints consume.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the three mutually exclusive container states.
///
/// The API server populates exactly one branch of the `state` object; an
/// absent object means "not in this state", which maps to [`ContainerState::Unknown`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContainerState {
    #[serde(rename_all = "camelCase")]
    Waiting {
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Running {},
    #[serde(rename_all = "camelCase")]
    Terminated {
        #[serde(default)]
        exit_code: i32,
        #[serde(default)]
        signal: i32,
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        finished_at: Option<DateTime<Utc>>,
    },
    #[default]
    Unknown,
}

/// Status of a single container (main or init) as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatus {
    pub name: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub restart_count: u32,
    #[serde(default)]
    pub state: ContainerState,
    #[serde(default)]
    pub last_state: ContainerState,
}

/// A pod condition — only `type` and `status` matter here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodCondition {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub status: String,
}

/// Immutable flattened view of one pod revision.
///
/// Everything optional on the wire defaults to empty here, so a sparse or
/// partially populated payload still synthesizes without error.  Order of
/// `container_statuses` / `init_container_statuses` mirrors the server's
/// declaration order and is significant for precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSnapshot {
    #[serde(default)]
    pub resource_version: String,
    #[serde(default)]
    pub deletion_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub spec_container_count: u32,
    #[serde(default)]
    pub spec_init_container_count: u32,
    #[serde(default)]
    pub status_phase: String,
    #[serde(default)]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub init_container_statuses: Vec<ContainerStatus>,
    #[serde(default)]
    pub container_statuses: Vec<ContainerStatus>,
    #[serde(default)]
    pub conditions: Vec<PodCondition>,
}

/// Display-ready status summary for one pod revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStatus {
    pub restarts: u32,
    pub reason: String,
    pub message: String,
    pub total_containers: u32,
    pub ready_containers: u32,
    pub last_restart_date: DateTime<Utc>,
}

/// Namespace/name pair used to address a pod's sub-resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTarget {
    pub namespace: String,
    pub name: String,
}

impl PodTarget {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Path of a pod sub-resource: `/api/v1/namespaces/<ns>/pods/<name>/<sub>`.
    pub fn subresource_path(&self, subresource: &str) -> String {
        format!(
            "/api/v1/namespaces/{}/pods/{}/{}",
            self.namespace, self.name, subresource
        )
    }
}

// Status synthesis — derives the single human-facing reason/restarts/ready
// summary from a pod's raw container statuses, matching what kubectl prints
// in its STATUS column.  The tie-breaks are ordering-sensitive: init
// containers are scanned in declared order and the first blocking one wins;
// main containers are scanned in reverse so the first declared container's
// signal takes precedence.
use chrono::{DateTime, Utc};

use crate::models::pod::{ContainerState, ContainerStatus, DetailedStatus, PodSnapshot};

/// Waiting reason the server reports for init containers that are simply
/// queued behind earlier ones; it carries no signal of its own.
const POD_INITIALIZING: &str = "PodInitializing";

/// Reason/message pair extracted from one container's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerReason {
    pub reason: String,
    pub message: String,
}

/// Init-loop position, used to synthesize the `Init:<index>/<total>` fallback.
#[derive(Debug, Clone, Copy)]
pub struct InitContext {
    pub index: usize,
    pub total: u32,
}

fn exit_reason(exit_code: i32, signal: i32) -> String {
    if signal != 0 {
        format!("Signal:{signal}")
    } else {
        format!("ExitCode:{exit_code}")
    }
}

fn nonempty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Advances the running last-restart timestamp from a container's previous
/// termination, independent of how its current state classifies.
fn advance_last_restart(status: &ContainerStatus, current: DateTime<Utc>) -> DateTime<Utc> {
    if let ContainerState::Terminated {
        finished_at: Some(finished),
        ..
    } = &status.last_state
    {
        if *finished > current {
            return *finished;
        }
    }
    current
}

/// Classifies one container's state into a display reason.
///
/// Returns the advanced last-restart timestamp plus `None` when the container
/// carries no signal that should replace the pod-level reason (a cleanly
/// finished container, or — outside the init loop — a running/unknown one).
/// With `init` set, every outcome except clean termination blocks: waiting
/// behind `PodInitializing` (or running) falls back to `Init:<index>/<total>`.
pub fn classify_container(
    status: &ContainerStatus,
    init: Option<InitContext>,
    last_restart: DateTime<Utc>,
) -> (DateTime<Utc>, Option<ContainerReason>) {
    let last_restart = advance_last_restart(status, last_restart);
    let prefix = if init.is_some() { "Init:" } else { "" };

    let classified = match &status.state {
        ContainerState::Terminated { exit_code: 0, .. } => None,
        ContainerState::Terminated {
            exit_code,
            signal,
            reason,
            message,
            ..
        } => {
            let base = match nonempty(reason) {
                Some(r) => r.to_string(),
                None => exit_reason(*exit_code, *signal),
            };
            Some(ContainerReason {
                reason: format!("{prefix}{base}"),
                message: message.clone().unwrap_or_default(),
            })
        }
        ContainerState::Waiting { reason, message }
            if nonempty(reason).is_some_and(|r| init.is_none() || r != POD_INITIALIZING) =>
        {
            Some(ContainerReason {
                reason: format!("{prefix}{}", reason.as_deref().unwrap_or_default()),
                message: message.clone().unwrap_or_default(),
            })
        }
        _ => init.map(|ctx| ContainerReason {
            reason: format!("Init:{}/{}", ctx.index, ctx.total),
            message: String::new(),
        }),
    };

    (last_restart, classified)
}

/// Synthesizes the display-ready status for one pod revision.  Pure; malformed
/// or sparse snapshots degrade to the pod-level phase rather than erroring.
pub fn synthesize(snapshot: &PodSnapshot) -> DetailedStatus {
    let mut reason = nonempty(&snapshot.status_reason)
        .unwrap_or(&snapshot.status_phase)
        .to_string();
    let mut message = String::new();
    let mut restarts: u32 = 0;
    let mut last_restart = DateTime::<Utc>::UNIX_EPOCH;
    let mut ready_containers: u32 = 0;
    let total_containers = snapshot.spec_container_count;
    let mut initializing = false;

    // First blocking init container determines status; later ones are not
    // visited at all.
    for (index, status) in snapshot.init_container_statuses.iter().enumerate() {
        restarts += status.restart_count;
        let ctx = InitContext {
            index,
            total: snapshot.spec_init_container_count,
        };
        let (advanced, classified) = classify_container(status, Some(ctx), last_restart);
        last_restart = advanced;
        if let Some(blocking) = classified {
            reason = blocking.reason;
            message = blocking.message;
            initializing = true;
            break;
        }
    }

    let mut has_running = false;
    if !initializing {
        // Init restarts do not count once initialization is done.
        restarts = 0;

        // Reverse order: the first declared container's reason is assigned
        // last and therefore wins.
        for status in snapshot.container_statuses.iter().rev() {
            restarts += status.restart_count;
            last_restart = advance_last_restart(status, last_restart);

            match &status.state {
                ContainerState::Waiting {
                    reason: state_reason,
                    message: state_message,
                } if nonempty(state_reason).is_some() => {
                    reason = state_reason.clone().unwrap_or_default();
                    message = state_message.clone().unwrap_or_default();
                }
                ContainerState::Terminated {
                    exit_code,
                    signal,
                    reason: state_reason,
                    message: state_message,
                    ..
                } => {
                    reason = match nonempty(state_reason) {
                        Some(r) => r.to_string(),
                        None => exit_reason(*exit_code, *signal),
                    };
                    message = state_message.clone().unwrap_or_default();
                }
                ContainerState::Running {} if status.ready => {
                    has_running = true;
                    ready_containers += 1;
                }
                _ => {}
            }
        }
    }

    // A pod whose first declared container completed while others still run
    // reports Running/NotReady depending on the Ready condition.
    if reason == "Completed" && has_running {
        let ready = snapshot
            .conditions
            .iter()
            .any(|c| c.type_ == "Ready" && c.status == "True");
        reason = if ready { "Running" } else { "NotReady" }.to_string();
    }

    if snapshot.deletion_timestamp.is_some() {
        reason = if snapshot.status_reason.as_deref() == Some("NodeLost") {
            "Unknown"
        } else {
            "Terminating"
        }
        .to_string();
    }

    DetailedStatus {
        restarts,
        reason,
        message,
        total_containers,
        ready_containers,
        last_restart_date: last_restart,
    }
}

// End-to-end properties of the status synthesis algorithm and its cache.
use chrono::{DateTime, Utc};

use podcore::{
    synthesize, ContainerState, ContainerStatus, PodCondition, PodSnapshot, StatusCache,
};

fn terminated(exit_code: i32, signal: i32, reason: Option<&str>) -> ContainerState {
    ContainerState::Terminated {
        exit_code,
        signal,
        reason: reason.map(String::from),
        message: None,
        finished_at: None,
    }
}

fn waiting(reason: &str) -> ContainerState {
    ContainerState::Waiting {
        reason: Some(reason.to_string()),
        message: None,
    }
}

fn container(name: &str, restart_count: u32, ready: bool, state: ContainerState) -> ContainerStatus {
    ContainerStatus {
        name: name.into(),
        ready,
        restart_count,
        state,
        last_state: ContainerState::Unknown,
    }
}

fn base_snapshot(phase: &str) -> PodSnapshot {
    PodSnapshot {
        resource_version: "1".into(),
        status_phase: phase.into(),
        ..Default::default()
    }
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn no_statuses_and_no_deletion_passes_phase_through() {
    let snapshot = base_snapshot("Pending");
    let status = synthesize(&snapshot);
    assert_eq!(status.reason, "Pending");
    assert_eq!(status.restarts, 0);
    assert_eq!(status.ready_containers, 0);
    assert_eq!(status.last_restart_date, DateTime::<Utc>::UNIX_EPOCH);
}

#[test]
fn synthesis_is_idempotent() {
    let mut snapshot = base_snapshot("Running");
    snapshot.spec_container_count = 2;
    snapshot.container_statuses = vec![
        container("a", 1, false, terminated(137, 9, None)),
        container("b", 0, true, ContainerState::Running {}),
    ];
    assert_eq!(synthesize(&snapshot), synthesize(&snapshot));
}

#[test]
fn first_blocking_init_container_wins() {
    let mut snapshot = base_snapshot("Pending");
    snapshot.spec_init_container_count = 2;
    snapshot.init_container_statuses = vec![
        container("init-a", 0, false, waiting("ErrImagePull")),
        container("init-b", 0, false, terminated(1, 0, Some("Error"))),
    ];
    let status = synthesize(&snapshot);
    assert_eq!(status.reason, "Init:ErrImagePull");
}

#[test]
fn init_restarts_accumulate_up_to_the_blocking_entry() {
    let mut snapshot = base_snapshot("Pending");
    snapshot.spec_init_container_count = 3;
    snapshot.init_container_statuses = vec![
        container("init-a", 2, false, terminated(0, 0, Some("Completed"))),
        container("init-b", 3, false, waiting("CrashLoopBackOff")),
        // Never visited: the blocking entry above stops iteration.
        container("init-c", 9, false, waiting("ErrImagePull")),
    ];
    let status = synthesize(&snapshot);
    assert_eq!(status.reason, "Init:CrashLoopBackOff");
    assert_eq!(status.restarts, 5);
}

#[test]
fn completed_init_containers_do_not_block() {
    let mut snapshot = base_snapshot("Running");
    snapshot.spec_container_count = 1;
    snapshot.spec_init_container_count = 1;
    snapshot.init_container_statuses =
        vec![container("init-a", 0, false, terminated(0, 0, Some("Completed")))];
    snapshot.container_statuses = vec![container("a", 0, true, ContainerState::Running {})];
    let status = synthesize(&snapshot);
    assert_eq!(status.reason, "Running");
    assert_eq!(status.ready_containers, 1);
}

#[test]
fn first_declared_main_container_wins_via_reverse_iteration() {
    let mut snapshot = base_snapshot("Running");
    snapshot.spec_container_count = 2;
    snapshot.container_statuses = vec![
        container("a", 0, false, terminated(137, 0, Some("OOMKilled"))),
        container("b", 0, true, ContainerState::Running {}),
    ];
    let status = synthesize(&snapshot);
    assert_eq!(status.reason, "OOMKilled");
    assert_eq!(status.ready_containers, 1);
    assert_eq!(status.total_containers, 2);
}

#[test]
fn terminated_without_reason_synthesizes_signal_or_exit_code() {
    let mut snapshot = base_snapshot("Running");
    snapshot.spec_container_count = 1;
    snapshot.container_statuses = vec![container("a", 0, false, terminated(137, 9, None))];
    assert_eq!(synthesize(&snapshot).reason, "Signal:9");

    snapshot.container_statuses = vec![container("a", 0, false, terminated(3, 0, None))];
    assert_eq!(synthesize(&snapshot).reason, "ExitCode:3");
}

#[test]
fn completed_with_running_container_checks_ready_condition() {
    let mut snapshot = base_snapshot("Running");
    snapshot.spec_container_count = 2;
    snapshot.container_statuses = vec![
        container("a", 0, false, terminated(0, 0, Some("Completed"))),
        container("b", 0, true, ContainerState::Running {}),
    ];

    snapshot.conditions = vec![PodCondition {
        type_: "Ready".into(),
        status: "True".into(),
    }];
    assert_eq!(synthesize(&snapshot).reason, "Running");

    snapshot.conditions = vec![PodCondition {
        type_: "Ready".into(),
        status: "False".into(),
    }];
    assert_eq!(synthesize(&snapshot).reason, "NotReady");
}

#[test]
fn deletion_override_trumps_everything() {
    let mut snapshot = base_snapshot("Running");
    snapshot.spec_container_count = 1;
    snapshot.container_statuses = vec![container("a", 0, false, waiting("CrashLoopBackOff"))];
    snapshot.deletion_timestamp = Some(at("2024-05-01T10:00:00Z"));
    assert_eq!(synthesize(&snapshot).reason, "Terminating");

    snapshot.status_reason = Some("NodeLost".into());
    assert_eq!(synthesize(&snapshot).reason, "Unknown");
}

#[test]
fn main_phase_restarts_replace_init_restarts() {
    let mut snapshot = base_snapshot("Running");
    snapshot.spec_container_count = 2;
    snapshot.spec_init_container_count = 1;
    snapshot.init_container_statuses =
        vec![container("init-a", 7, false, terminated(0, 0, Some("Completed")))];
    snapshot.container_statuses = vec![
        container("a", 1, true, ContainerState::Running {}),
        container("b", 4, true, ContainerState::Running {}),
    ];
    let status = synthesize(&snapshot);
    assert_eq!(status.restarts, 5);
    assert_eq!(status.ready_containers, 2);
}

#[test]
fn last_restart_date_takes_the_latest_previous_termination() {
    let older = at("2024-01-01T00:00:00Z");
    let newer = at("2024-06-01T00:00:00Z");

    let mut a = container("a", 1, true, ContainerState::Running {});
    a.last_state = ContainerState::Terminated {
        exit_code: 1,
        signal: 0,
        reason: None,
        message: None,
        finished_at: Some(newer),
    };
    let mut b = container("b", 1, true, ContainerState::Running {});
    b.last_state = ContainerState::Terminated {
        exit_code: 1,
        signal: 0,
        reason: None,
        message: None,
        finished_at: Some(older),
    };

    let mut snapshot = base_snapshot("Running");
    snapshot.spec_container_count = 2;
    snapshot.container_statuses = vec![a, b];
    assert_eq!(synthesize(&snapshot).last_restart_date, newer);
}

#[test]
fn cache_returns_cached_value_until_resource_version_changes() {
    let cache = StatusCache::new();

    let mut snapshot = base_snapshot("Running");
    snapshot.resource_version = "10".into();
    let first = cache.get(&snapshot);
    assert_eq!(first.reason, "Running");

    // Same version, different payload: cached value comes back untouched.
    snapshot.status_phase = "Pending".into();
    assert_eq!(cache.get(&snapshot), first);

    // New version: the changed payload is visible.
    snapshot.resource_version = "11".into();
    assert_eq!(cache.get(&snapshot).reason, "Pending");
}

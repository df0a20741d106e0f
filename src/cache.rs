// Per-pod memoization of the synthesized status, keyed on resource version.
use std::sync::Mutex;

use crate::models::pod::{DetailedStatus, PodSnapshot};
use crate::status::synthesize;

struct CacheEntry {
    resource_version: String,
    details: DetailedStatus,
}

/// One cache slot for one pod object.
///
/// The read-check-then-write is done under a single lock so concurrent readers
/// of a shared pod never observe a half-updated slot.  A snapshot with an
/// empty resource version is never compared against the stored key — every
/// such call recomputes.
#[derive(Default)]
pub struct StatusCache {
    slot: Mutex<Option<CacheEntry>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached status when the resource version is unchanged,
    /// otherwise synthesizes a fresh one and replaces the slot.
    pub fn get(&self, snapshot: &PodSnapshot) -> DetailedStatus {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if !snapshot.resource_version.is_empty() {
            if let Some(entry) = slot.as_ref() {
                if entry.resource_version == snapshot.resource_version {
                    return entry.details.clone();
                }
            }
        }

        let details = synthesize(snapshot);
        *slot = Some(CacheEntry {
            resource_version: snapshot.resource_version.clone(),
            details: details.clone(),
        });
        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(resource_version: &str, phase: &str) -> PodSnapshot {
        PodSnapshot {
            resource_version: resource_version.into(),
            status_phase: phase.into(),
            ..Default::default()
        }
    }

    #[test]
    fn unchanged_resource_version_returns_cached_value() {
        let cache = StatusCache::new();
        let first = cache.get(&snapshot("7", "Running"));
        assert_eq!(first.reason, "Running");

        // Same version but different phase: the stale cached value proves no
        // recomputation happened.
        let second = cache.get(&snapshot("7", "Pending"));
        assert_eq!(second.reason, "Running");
    }

    #[test]
    fn changed_resource_version_recomputes() {
        let cache = StatusCache::new();
        assert_eq!(cache.get(&snapshot("7", "Running")).reason, "Running");
        assert_eq!(cache.get(&snapshot("8", "Pending")).reason, "Pending");
    }

    #[test]
    fn empty_resource_version_always_misses() {
        let cache = StatusCache::new();
        assert_eq!(cache.get(&snapshot("", "Running")).reason, "Running");
        assert_eq!(cache.get(&snapshot("", "Pending")).reason, "Pending");
    }
}

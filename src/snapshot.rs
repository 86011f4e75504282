//! Snapshot — a timestamped, immutable capture of the registry state.
//!
//! Equality and hashing go by payload ONLY: two snapshots with identical
//! payloads but different capture times compare equal. Change detection in
//! the watcher relies on exactly this.

use std::hash::{Hash, Hasher};

/// One captured registry state: opaque text payload + capture time (ms).
#[derive(Debug, Clone)]
pub struct Snapshot {
    payload: String,
    captured_at: i64,
}

impl Snapshot {
    /// Freshly fetched snapshot, stamped with the current wall-clock time.
    pub fn new(payload: String) -> Self {
        Self {
            payload,
            captured_at: now_millis(),
        }
    }

    /// Snapshot reloaded from storage; the stored key is carried verbatim.
    pub fn with_timestamp(payload: String, captured_at: i64) -> Self {
        Self {
            payload,
            captured_at,
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Capture time in milliseconds since epoch.
    pub fn captured_at(&self) -> i64 {
        self.captured_at
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
    }
}

impl Eq for Snapshot {}

impl Hash for Snapshot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.payload.hash(state);
    }
}

/// Current Unix time in milliseconds.
#[inline]
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_payload_only() {
        let a = Snapshot::with_timestamp("members".into(), 1);
        let b = Snapshot::with_timestamp("members".into(), 2);
        let c = Snapshot::with_timestamp("changed".into(), 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn hash_follows_equality() {
        use std::collections::hash_map::DefaultHasher;

        fn h(s: &Snapshot) -> u64 {
            let mut hasher = DefaultHasher::new();
            s.hash(&mut hasher);
            hasher.finish()
        }

        let a = Snapshot::with_timestamp("members".into(), 1);
        let b = Snapshot::with_timestamp("members".into(), 99);
        assert_eq!(h(&a), h(&b));
    }

    #[test]
    fn reload_keeps_stored_timestamp() {
        let s = Snapshot::with_timestamp("x".into(), 1_693_000_000_123);
        assert_eq!(s.captured_at(), 1_693_000_000_123);
        assert_eq!(s.payload(), "x");
    }

    #[test]
    fn fresh_snapshot_is_stamped_now() {
        let before = now_millis();
        let s = Snapshot::new("x".into());
        let after = now_millis();
        assert!(s.captured_at() >= before && s.captured_at() <= after);
    }
}

//! Stable handles for cached computed poses.

use std::collections::HashMap;

/// Opaque handle to a cached computed pose.
///
/// Keys are issued monotonically per engine instance and stay valid until
/// the entry they reference is evicted by windowed culling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoseKey(u32);

impl PoseKey {
    /// Wrap a raw key value.
    #[inline]
    pub fn new(key: u32) -> Self {
        Self(key)
    }

    /// Get the numeric value.
    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PoseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PoseKey({})", self.0)
    }
}

/// Two-way key <-> timestamp bookkeeping for the computed-pose store.
///
/// The counter is a per-instance field, so independent engines (one per
/// robot, or one per test) issue independent key sequences.
#[derive(Clone, Debug, Default)]
pub struct KeyRegistry {
    last_key: u32,
    ts_by_key: HashMap<PoseKey, u32>,
    key_by_ts: HashMap<u32, PoseKey>,
}

impl KeyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next key and record the association both ways.
    ///
    /// If the timestamp already had a key, the stale key is invalidated so
    /// no orphaned mapping survives.
    pub fn issue_key(&mut self, timestamp_ms: u32) -> PoseKey {
        self.last_key += 1;
        let key = PoseKey::new(self.last_key);
        if let Some(stale) = self.key_by_ts.insert(timestamp_ms, key) {
            self.ts_by_key.remove(&stale);
        }
        self.ts_by_key.insert(key, timestamp_ms);
        key
    }

    /// Key associated with a timestamp, if any.
    pub fn lookup_key(&self, timestamp_ms: u32) -> Option<PoseKey> {
        self.key_by_ts.get(&timestamp_ms).copied()
    }

    /// Timestamp associated with a key, if the key is still live.
    pub fn lookup_ts(&self, key: PoseKey) -> Option<u32> {
        self.ts_by_key.get(&key).copied()
    }

    /// Remove both directions of the mapping for a timestamp.
    ///
    /// Returns whether a mapping existed.
    pub fn evict(&mut self, timestamp_ms: u32) -> bool {
        match self.key_by_ts.remove(&timestamp_ms) {
            Some(key) => {
                self.ts_by_key.remove(&key);
                true
            }
            None => false,
        }
    }

    /// Whether the key still references a live entry.
    pub fn is_valid(&self, key: PoseKey) -> bool {
        self.ts_by_key.contains_key(&key)
    }

    /// Number of live mappings.
    pub fn len(&self) -> usize {
        self.ts_by_key.len()
    }

    /// Whether no mappings are live.
    pub fn is_empty(&self) -> bool {
        self.ts_by_key.is_empty()
    }

    /// Drop all mappings. The counter is not reset, so previously issued
    /// keys can never be re-issued within an instance's lifetime.
    pub fn clear(&mut self) {
        self.ts_by_key.clear();
        self.key_by_ts.clear();
    }
}

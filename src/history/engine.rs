//! Time-indexed pose history with odometry/vision fusion.
//!
//! [`PoseHistory`] maintains three timestamp-sorted stores:
//!
//! 1. **Raw odometry poses**: dense dead-reckoned samples, one per robot
//!    tick, subject to drift
//! 2. **Vision correction poses**: sparse accurate poses from an external
//!    landmark localizer, each tagged with the localization epoch (frame
//!    id) it established
//! 3. **Computed poses**: cached fusion results, each with a stable
//!    [`PoseKey`] handle for external reference
//!
//! # Algorithm
//!
//! A fused query at time `t` resolves the raw pose at `t` (exact,
//! interpolated, or nearest), finds the latest vision correction at or
//! before it (the anchor), and then:
//!
//! - no anchor, or the anchor's epoch is not newer than the raw pose's:
//!   the raw pose already reflects every known correction and is returned
//!   unchanged;
//! - otherwise the raw entries between the anchor and `t` are walked,
//!   grouped into frame-id segments, and each segment's relative motion is
//!   folded onto the anchor, yielding the raw motion replayed from the
//!   corrected pose.
//!
//! # Memory
//!
//! Every raw insert culls all three stores to a sliding window behind the
//! newest raw timestamp. Each store always keeps its single newest entry,
//! and evicting a computed pose invalidates its key in the same step.
//!
//! # Example
//!
//! ```rust,ignore
//! use smriti_pose::{HistoryConfig, Pose, PoseHistory};
//!
//! let mut history = PoseHistory::new(HistoryConfig::default());
//!
//! // Feed odometry every tick, corrections when a landmark resolves
//! history.add_raw_odometry_pose(t, odom_pose)?;
//! history.add_vision_correction_pose(t_seen, corrected_pose)?;
//!
//! // Fused lookup for planning / docking
//! let pose = history.compute_pose_at(t_query, true)?;
//! ```

use log::{debug, warn};

use crate::config::HistoryConfig;
use crate::core::{chain_compose, interpolate_pose, Pose};
use crate::error::{HistoryError, Result};

use super::keys::{KeyRegistry, PoseKey};
use super::time_series::{InsertPolicy, TimeSeriesStore};

/// Fused pose history for one robot session.
///
/// Owns its stores and key registry exclusively; there is no shared or
/// global state, so independent instances (one per robot, one per test)
/// never interfere. The engine holds no synchronization primitives and
/// expects at most one in-flight operation at a time.
#[derive(Clone, Debug)]
pub struct PoseHistory {
    /// Retention horizon in milliseconds
    window_ms: u32,

    /// Dense dead-reckoned samples
    raw_poses: TimeSeriesStore<Pose>,

    /// Sparse landmark-based corrections
    vision_poses: TimeSeriesStore<Pose>,

    /// Cached fusion results
    computed_poses: TimeSeriesStore<Pose>,

    /// Stable handles into `computed_poses`
    keys: KeyRegistry,

    /// Root reference frame, fixed at construction
    origin: Pose,
}

impl PoseHistory {
    /// Create an empty history with the given configuration.
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            window_ms: config.window_ms,
            raw_poses: TimeSeriesStore::new(),
            vision_poses: TimeSeriesStore::new(),
            computed_poses: TimeSeriesStore::new(),
            keys: KeyRegistry::new(),
            origin: Pose::default(),
        }
    }

    /// The root reference frame all stored poses are expressed against.
    pub fn origin(&self) -> &Pose {
        &self.origin
    }

    /// Current retention horizon in milliseconds.
    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    /// Set the retention horizon and cull immediately.
    pub fn set_time_window(&mut self, window_ms: u32) {
        self.window_ms = window_ms;
        self.cull_to_window();
    }

    /// Record a dead-reckoned pose sample.
    ///
    /// Fails with `TooOld` when the sample falls behind the retention
    /// horizon, or `DuplicateInsert` when a raw sample already exists at
    /// that timestamp. Culls all stores on success.
    pub fn add_raw_odometry_pose(&mut self, timestamp_ms: u32, pose: Pose) -> Result<()> {
        self.check_against_window(timestamp_ms)?;

        // Frame ids only ever increase along the timeline; a violation is
        // a bug in the feeding odometry pipeline.
        #[cfg(debug_assertions)]
        {
            if let Some((_, prev)) = self.raw_poses.prev_of(timestamp_ms) {
                debug_assert!(
                    prev.frame_id <= pose.frame_id,
                    "raw frame id regressed: {} after {}",
                    pose.frame_id,
                    prev.frame_id
                );
            }
            if let Some((next_ms, next)) = self.raw_poses.lower_bound(timestamp_ms) {
                debug_assert!(
                    next_ms == timestamp_ms || pose.frame_id <= next.frame_id,
                    "raw frame id regressed: {} before {}",
                    pose.frame_id,
                    next.frame_id
                );
            }
        }

        if let Err(err) = self
            .raw_poses
            .insert(timestamp_ms, pose, InsertPolicy::FailOnDuplicate)
        {
            warn!("raw odometry pose at t={} already recorded", timestamp_ms);
            return Err(err);
        }

        self.cull_to_window();
        Ok(())
    }

    /// Record a vision-based correction.
    ///
    /// A second correction at the same timestamp replaces the first.
    /// Fails with `TooOld` when the sample falls behind the retention
    /// horizon.
    pub fn add_vision_correction_pose(&mut self, timestamp_ms: u32, pose: Pose) -> Result<()> {
        self.check_against_window(timestamp_ms)?;

        let fresh = self.vision_poses.get_exact(timestamp_ms).is_none();
        self.vision_poses
            .insert(timestamp_ms, pose, InsertPolicy::OverwriteExisting)?;
        if fresh {
            self.cull_to_window();
        }
        Ok(())
    }

    /// Raw (uncorrected) pose at a timestamp.
    ///
    /// An exact hit returns the stored pose. Between samples, either the
    /// time-weighted interpolation of the straddling neighbors
    /// (`interpolate = true`; fails with `MismatchedOrigin` across a
    /// frame boundary) or the nearer neighbor, ties resolving to the
    /// later one. Fails with `OutOfRange` outside the retained raw span.
    pub fn get_raw_pose_at(&self, timestamp_ms: u32, interpolate: bool) -> Result<Pose> {
        self.resolved_raw_at(timestamp_ms, interpolate)
            .map(|(_, pose)| pose)
    }

    /// The stored raw samples strictly straddling a timestamp.
    ///
    /// Returns `(t_before, pose_before, t_after, pose_after)`. Fails with
    /// `OutOfRange` when `timestamp_ms` is at or beyond either end of the
    /// raw store (the oldest sample has no predecessor, the newest no
    /// successor).
    pub fn get_raw_pose_before_and_after(
        &self,
        timestamp_ms: u32,
    ) -> Result<(u32, Pose, u32, Pose)> {
        let (before_ms, before) = self
            .raw_poses
            .prev_of(timestamp_ms)
            .ok_or(HistoryError::OutOfRange)?;
        let (after_ms, after) = self
            .raw_poses
            .next_of(timestamp_ms)
            .ok_or(HistoryError::OutOfRange)?;
        Ok((before_ms, *before, after_ms, *after))
    }

    /// Fused pose at a timestamp.
    ///
    /// A vision correction stored exactly at `timestamp_ms` is returned
    /// directly. Otherwise the raw pose is resolved and corrected by the
    /// latest prior vision anchor when that anchor belongs to a newer
    /// localization epoch (see the module docs for the walk).
    pub fn compute_pose_at(&self, timestamp_ms: u32, interpolate: bool) -> Result<Pose> {
        self.compute_pose_resolved(timestamp_ms, interpolate)
            .map(|(_, pose)| pose)
    }

    /// Fused pose at a timestamp, cached with a stable key.
    ///
    /// The result is stored in the computed-pose store at the resolved
    /// timestamp (replacing any previous result there) and associated
    /// with a key that stays valid until windowed culling evicts the
    /// entry. Re-computing an already-cached timestamp refreshes the
    /// entry and returns the existing key.
    pub fn compute_and_insert_pose_at(
        &mut self,
        timestamp_ms: u32,
        interpolate: bool,
    ) -> Result<(Pose, PoseKey)> {
        let (resolved_ms, pose) = self.compute_pose_resolved(timestamp_ms, interpolate)?;

        self.computed_poses
            .insert(resolved_ms, pose, InsertPolicy::OverwriteExisting)?;
        let key = match self.keys.lookup_key(resolved_ms) {
            Some(existing) => existing,
            None => self.keys.issue_key(resolved_ms),
        };
        Ok((pose, key))
    }

    /// Cached computed pose at a timestamp, with its key.
    pub fn get_computed_pose_at(&self, timestamp_ms: u32) -> Option<(Pose, PoseKey)> {
        let pose = self.computed_poses.get_exact(timestamp_ms)?;
        match self.keys.lookup_key(timestamp_ms) {
            Some(key) => Some((*pose, key)),
            None => {
                debug_assert!(false, "computed pose at t={} has no key", timestamp_ms);
                warn!("computed pose at t={} has no key mapping", timestamp_ms);
                None
            }
        }
    }

    /// Cached computed pose referenced by a key.
    pub fn get_computed_pose_by_key(&self, key: PoseKey) -> Option<(u32, Pose)> {
        let timestamp_ms = self.keys.lookup_ts(key)?;
        match self.computed_poses.get_exact(timestamp_ms) {
            Some(pose) => Some((timestamp_ms, *pose)),
            None => {
                debug_assert!(false, "{} maps to missing entry at t={}", key, timestamp_ms);
                warn!("{} maps to a missing computed pose at t={}", key, timestamp_ms);
                None
            }
        }
    }

    /// Whether a key still references a live computed pose.
    pub fn is_valid_key(&self, key: PoseKey) -> bool {
        self.keys.is_valid(key)
    }

    /// Vision correction stored exactly at a timestamp.
    pub fn get_vision_only_pose_at(&self, timestamp_ms: u32) -> Option<Pose> {
        self.vision_poses.get_exact(timestamp_ms).copied()
    }

    /// Most recent vision correction, with its timestamp.
    pub fn latest_vision_only_pose(&self) -> Option<(u32, Pose)> {
        self.vision_poses.newest().map(|(ts, pose)| (ts, *pose))
    }

    /// Most recent raw sample from the given localization epoch.
    ///
    /// Scans the raw store newest-to-oldest; since frame ids only
    /// increase with time the scan stops as soon as an older epoch is
    /// reached. Fails with `NotFound` when the store is empty or holds no
    /// sample from that epoch.
    pub fn get_last_pose_with_frame_id(&self, frame_id: u32) -> Result<Pose> {
        for (_, pose) in self.raw_poses.iter().rev() {
            if pose.frame_id == frame_id {
                return Ok(*pose);
            }
            if pose.frame_id < frame_id {
                break;
            }
        }
        Err(HistoryError::NotFound)
    }

    /// Evict entries that fell behind the retention window.
    ///
    /// The window trails the newest raw timestamp. Each store keeps at
    /// least its single newest entry; computed-pose evictions invalidate
    /// their keys in the same step.
    pub fn cull_to_window(&mut self) {
        if self.raw_poses.len() <= 1 {
            return;
        }
        let newest_ms = match self.raw_poses.newest() {
            Some((ts, _)) => ts,
            None => return,
        };
        if newest_ms < self.window_ms {
            return;
        }
        let cutoff_ms = newest_ms - self.window_ms;

        self.raw_poses.remove_before(cutoff_ms);
        self.vision_poses.remove_before(cutoff_ms);
        for timestamp_ms in self.computed_poses.remove_before(cutoff_ms) {
            if !self.keys.evict(timestamp_ms) {
                debug_assert!(false, "culled computed pose at t={} had no key", timestamp_ms);
                warn!("culled computed pose at t={} had no key mapping", timestamp_ms);
            }
        }
    }

    /// Oldest retained raw timestamp.
    pub fn oldest_timestamp(&self) -> Option<u32> {
        self.raw_poses.oldest().map(|(ts, _)| ts)
    }

    /// Newest retained raw timestamp.
    pub fn newest_timestamp(&self) -> Option<u32> {
        self.raw_poses.newest().map(|(ts, _)| ts)
    }

    /// Oldest retained vision-correction timestamp.
    pub fn oldest_vision_timestamp(&self) -> Option<u32> {
        self.vision_poses.oldest().map(|(ts, _)| ts)
    }

    /// Newest retained vision-correction timestamp.
    pub fn newest_vision_timestamp(&self) -> Option<u32> {
        self.vision_poses.newest().map(|(ts, _)| ts)
    }

    /// Number of retained raw samples.
    pub fn raw_pose_count(&self) -> usize {
        self.raw_poses.len()
    }

    /// Number of retained vision corrections.
    pub fn vision_pose_count(&self) -> usize {
        self.vision_poses.len()
    }

    /// Number of cached computed poses.
    pub fn computed_pose_count(&self) -> usize {
        self.computed_poses.len()
    }

    /// Drop all history and invalidate every key.
    pub fn clear(&mut self) {
        self.raw_poses.clear();
        self.vision_poses.clear();
        self.computed_poses.clear();
        self.keys.clear();
    }

    /// Reject inserts that fell behind the window trailing the newest raw
    /// sample. An empty raw store admits anything.
    fn check_against_window(&self, timestamp_ms: u32) -> Result<()> {
        if let Some((newest_ms, _)) = self.raw_poses.newest() {
            if newest_ms > self.window_ms && timestamp_ms < newest_ms - self.window_ms {
                let oldest_allowed_ms = newest_ms - self.window_ms;
                warn!(
                    "pose at t={} too old to add (newest t={}, oldest allowed t={})",
                    timestamp_ms, newest_ms, oldest_allowed_ms
                );
                return Err(HistoryError::TooOld {
                    timestamp_ms,
                    oldest_allowed_ms,
                });
            }
        }
        Ok(())
    }

    /// Raw pose lookup returning the timestamp it resolved to.
    ///
    /// The resolved timestamp equals the query for exact hits and
    /// interpolation, and the chosen neighbor's timestamp for nearest
    /// selection.
    fn resolved_raw_at(&self, timestamp_ms: u32, interpolate: bool) -> Result<(u32, Pose)> {
        let (oldest_ms, _) = self.raw_poses.oldest().ok_or(HistoryError::OutOfRange)?;
        if timestamp_ms < oldest_ms {
            return Err(HistoryError::OutOfRange);
        }
        if let Some(pose) = self.raw_poses.get_exact(timestamp_ms) {
            return Ok((timestamp_ms, *pose));
        }

        // Non-exact: need both straddling neighbors. No entry at or after
        // the query means it is beyond the newest sample.
        let (next_ms, next) = self
            .raw_poses
            .lower_bound(timestamp_ms)
            .ok_or(HistoryError::OutOfRange)?;
        let (prev_ms, prev) = self
            .raw_poses
            .prev_of(timestamp_ms)
            .ok_or(HistoryError::OutOfRange)?;

        if interpolate {
            let fraction = (timestamp_ms - prev_ms) as f32 / (next_ms - prev_ms) as f32;
            match interpolate_pose(prev, next, fraction) {
                Ok(pose) => Ok((timestamp_ms, pose)),
                Err(err) => {
                    debug!(
                        "cannot interpolate at t={}: neighbors span frames {} and {}",
                        timestamp_ms, prev.frame_id, next.frame_id
                    );
                    Err(err)
                }
            }
        } else if next_ms - timestamp_ms <= timestamp_ms - prev_ms {
            Ok((next_ms, *next))
        } else {
            Ok((prev_ms, *prev))
        }
    }

    /// Fusion with the resolved timestamp, for caching.
    fn compute_pose_resolved(&self, timestamp_ms: u32, interpolate: bool) -> Result<(u32, Pose)> {
        // A correction stored exactly at the query is ground truth.
        if let Some(pose) = self.vision_poses.get_exact(timestamp_ms) {
            return Ok((timestamp_ms, *pose));
        }

        let (resolved_ms, raw) = self.resolved_raw_at(timestamp_ms, interpolate)?;

        // Latest correction at or before the resolved raw sample.
        let (anchor_ms, anchor) = match self.latest_vision_at_or_before(resolved_ms) {
            Some((ts, pose)) => (ts, *pose),
            None => return Ok((resolved_ms, raw)),
        };

        // The raw sample already lives in an epoch at least as new as the
        // anchor's: every known correction is baked in.
        if anchor.frame_id <= raw.frame_id {
            return Ok((resolved_ms, raw));
        }

        // The anchor re-based the world after this stretch of odometry was
        // recorded. Replay the raw motion since the anchor's timestamp on
        // top of the corrected pose, one frame-id segment at a time.
        let mut chain: Vec<Pose> = self
            .raw_poses
            .range(anchor_ms..resolved_ms)
            .map(|(_, pose)| *pose)
            .collect();
        chain.push(raw);

        Ok((resolved_ms, chain_compose(&anchor, &chain)))
    }

    /// Vision entry at `timestamp_ms`, or the latest one before it.
    fn latest_vision_at_or_before(&self, timestamp_ms: u32) -> Option<(u32, &Pose)> {
        if let Some(pose) = self.vision_poses.get_exact(timestamp_ms) {
            return Some((timestamp_ms, pose));
        }
        self.vision_poses.prev_of(timestamp_ms)
    }
}

impl Default for PoseHistory {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

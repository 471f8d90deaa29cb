//! Pose type and geometric composition.
//!
//! A [`Pose`] is the robot's position and heading in a localization epoch,
//! plus the head and lift joint angles carried alongside it. Rotation is
//! about the vertical axis only, so composition is planar with z translated
//! straight through.
//!
//! # Frames
//!
//! Every pose is tagged with a `frame_id` naming the localization epoch it
//! is expressed in. The id increases each time a vision correction resets
//! accumulated odometry drift. Two poses can only be related geometrically
//! when they share a frame id; operations that would have to relate poses
//! across epochs fail with [`MismatchedOrigin`](crate::HistoryError::MismatchedOrigin)
//! instead of producing a silently wrong answer.
//!
//! # Convention
//!
//! Relative transforms are body-frame deltas: `base.compose(&delta)`
//! applies `delta` in the base pose's own frame (dx forward, dy left,
//! dtheta CCW), and `a.transform_to(&b)` returns the delta that takes `a`
//! to `b` under that composition.

use serde::{Deserialize, Serialize};

use crate::error::{HistoryError, Result};

/// Robot pose within a single localization epoch.
///
/// Translation is in millimeters, angles in radians. The heading is kept
/// wrapped to (-PI, PI]. Head and lift angles are joint state carried with
/// the pose but never algebraically composed with the spatial transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// X translation in millimeters
    pub x_mm: f32,
    /// Y translation in millimeters
    pub y_mm: f32,
    /// Z translation in millimeters
    pub z_mm: f32,
    /// Heading about the vertical axis, wrapped to (-PI, PI]
    pub heading_rad: f32,
    /// Head joint angle (radians)
    pub head_angle_rad: f32,
    /// Lift joint angle (radians)
    pub lift_angle_rad: f32,
    /// Localization epoch this pose is expressed in
    pub frame_id: u32,
}

impl Pose {
    /// Create a pose with zeroed joint angles.
    pub fn new(x_mm: f32, y_mm: f32, z_mm: f32, heading_rad: f32, frame_id: u32) -> Self {
        Self {
            x_mm,
            y_mm,
            z_mm,
            heading_rad: normalize_angle(heading_rad),
            head_angle_rad: 0.0,
            lift_angle_rad: 0.0,
            frame_id,
        }
    }

    /// Set the joint angles, consuming and returning the pose.
    pub fn with_joints(mut self, head_angle_rad: f32, lift_angle_rad: f32) -> Self {
        self.head_angle_rad = head_angle_rad;
        self.lift_angle_rad = lift_angle_rad;
        self
    }

    /// Apply a body-frame delta onto this pose.
    ///
    /// The delta's translation is rotated by this pose's heading and the
    /// headings add (wrapped). The result keeps this pose's frame id and
    /// joint angles; joints are carried, not composed.
    pub fn compose(&self, delta: &Pose) -> Pose {
        let (sin_h, cos_h) = self.heading_rad.sin_cos();
        Pose {
            x_mm: self.x_mm + delta.x_mm * cos_h - delta.y_mm * sin_h,
            y_mm: self.y_mm + delta.x_mm * sin_h + delta.y_mm * cos_h,
            z_mm: self.z_mm + delta.z_mm,
            heading_rad: normalize_angle(self.heading_rad + delta.heading_rad),
            head_angle_rad: self.head_angle_rad,
            lift_angle_rad: self.lift_angle_rad,
            frame_id: self.frame_id,
        }
    }

    /// Spatial inverse: `p.compose(&p.inverse())` is the identity transform.
    ///
    /// Joint angles and frame id are carried through unchanged.
    pub fn inverse(&self) -> Pose {
        let (sin_h, cos_h) = self.heading_rad.sin_cos();
        Pose {
            x_mm: -(self.x_mm * cos_h + self.y_mm * sin_h),
            y_mm: self.x_mm * sin_h - self.y_mm * cos_h,
            z_mm: -self.z_mm,
            heading_rad: normalize_angle(-self.heading_rad),
            head_angle_rad: self.head_angle_rad,
            lift_angle_rad: self.lift_angle_rad,
            frame_id: self.frame_id,
        }
    }

    /// The body-frame delta `d` with `self.compose(&d)` spatially equal to `other`.
    ///
    /// Fails with `MismatchedOrigin` when the two poses belong to different
    /// localization epochs. The returned delta has zeroed joint angles
    /// (joints are not part of the spatial transform) and carries this
    /// pose's frame id.
    pub fn transform_to(&self, other: &Pose) -> Result<Pose> {
        if self.frame_id != other.frame_id {
            return Err(HistoryError::MismatchedOrigin {
                expected: self.frame_id,
                actual: other.frame_id,
            });
        }
        Ok(self.spatial_delta(other))
    }

    /// Body-frame delta without the frame lineage check.
    ///
    /// Callers must already know both poses share a frame.
    fn spatial_delta(&self, other: &Pose) -> Pose {
        let (sin_h, cos_h) = self.heading_rad.sin_cos();
        let dx = other.x_mm - self.x_mm;
        let dy = other.y_mm - self.y_mm;
        Pose {
            x_mm: dx * cos_h + dy * sin_h,
            y_mm: -dx * sin_h + dy * cos_h,
            z_mm: other.z_mm - self.z_mm,
            heading_rad: normalize_angle(other.heading_rad - self.heading_rad),
            head_angle_rad: 0.0,
            lift_angle_rad: 0.0,
            frame_id: self.frame_id,
        }
    }
}

/// Normalize angle to the (-PI, PI] range.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle;
    while a > std::f32::consts::PI {
        a -= 2.0 * std::f32::consts::PI;
    }
    while a <= -std::f32::consts::PI {
        a += 2.0 * std::f32::consts::PI;
    }
    a
}

/// Interpolate between two poses of the same epoch.
///
/// Translation (x, y, z) is interpolated component-wise. The heading
/// follows the shortest angular path, so interpolating across the +/-PI
/// seam does not swing through zero. Head and lift angles are interpolated
/// linearly and independently. The result carries `p0`'s frame id.
///
/// # Errors
///
/// - `OutOfRange` when `t` is outside `[0, 1]`
/// - `MismatchedOrigin` when the poses belong to different epochs
pub fn interpolate_pose(p0: &Pose, p1: &Pose, t: f32) -> Result<Pose> {
    if !(0.0..=1.0).contains(&t) {
        return Err(HistoryError::OutOfRange);
    }
    if p0.frame_id != p1.frame_id {
        return Err(HistoryError::MismatchedOrigin {
            expected: p0.frame_id,
            actual: p1.frame_id,
        });
    }

    let heading_delta = normalize_angle(p1.heading_rad - p0.heading_rad);
    Ok(Pose {
        x_mm: p0.x_mm + (p1.x_mm - p0.x_mm) * t,
        y_mm: p0.y_mm + (p1.y_mm - p0.y_mm) * t,
        z_mm: p0.z_mm + (p1.z_mm - p0.z_mm) * t,
        heading_rad: normalize_angle(p0.heading_rad + heading_delta * t),
        head_angle_rad: p0.head_angle_rad + (p1.head_angle_rad - p0.head_angle_rad) * t,
        lift_angle_rad: p0.lift_angle_rad + (p1.lift_angle_rad - p0.lift_angle_rad) * t,
        frame_id: p0.frame_id,
    })
}

/// Fold an ordered raw-odometry chain onto a correction anchor.
///
/// The chain is grouped into runs of equal frame id. Each run's relative
/// motion (first entry to last entry, body frame) is composed onto the
/// anchor in order, including the final partial run ending at the last
/// chain element. Motion *across* a frame boundary is never folded: a
/// frame transition means the odometry coordinates were rebased, so the
/// jump between the last pose of one run and the first pose of the next
/// carries no physical motion.
///
/// The result is expressed in the anchor's epoch: it keeps the anchor's
/// frame id, and takes the head/lift angles of the last chain element.
/// An empty chain returns the anchor unchanged.
pub fn chain_compose(anchor: &Pose, raw_chain: &[Pose]) -> Pose {
    let mut fused = *anchor;

    let mut idx = 0;
    while idx < raw_chain.len() {
        let start = &raw_chain[idx];
        let mut last = idx;
        while last + 1 < raw_chain.len() && raw_chain[last + 1].frame_id == start.frame_id {
            last += 1;
        }
        let delta = start.spatial_delta(&raw_chain[last]);
        fused = fused.compose(&delta);
        idx = last + 1;
    }

    if let Some(tail) = raw_chain.last() {
        fused.head_angle_rad = tail.head_angle_rad;
        fused.lift_angle_rad = tail.lift_angle_rad;
    }
    fused
}

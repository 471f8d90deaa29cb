//! Core types for pose history.
//!
//! Fundamental value types and the geometric operations used throughout
//! the crate:
//!
//! - [`Pose`]: position, heading, and joint angles in a localization epoch
//! - [`interpolate_pose`]: time-weighted blend of two same-epoch poses
//! - [`chain_compose`]: fold a raw-odometry chain onto a correction anchor
//! - [`normalize_angle`]: wrap an angle to (-PI, PI]
//!
//! All coordinates follow the robot convention: X forward, Y left,
//! heading CCW from +X, translation in millimeters.

mod pose;

pub use pose::{chain_compose, interpolate_pose, normalize_angle, Pose};

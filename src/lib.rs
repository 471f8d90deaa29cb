//! # smriti-pose
//!
//! Time-indexed pose history for mobile robot localization.
//!
//! ## Overview
//!
//! The crate fuses two pose streams into one queryable timeline:
//!
//! - **Raw odometry**: dense dead-reckoned samples, cheap but drifting
//! - **Vision corrections**: sparse accurate poses from an external
//!   landmark localizer, each starting a new localization epoch (frame id)
//!
//! [`PoseHistory`] answers "what was the robot's pose at time T" for
//! planning, docking, and diagnostics, replaying raw motion on top of the
//! most relevant correction. Results can be cached under stable
//! [`PoseKey`] handles that downstream consumers hold across calls.
//! History is kept to a sliding time window so the engine runs forever in
//! bounded memory.
//!
//! ## Quick Start
//!
//! ```rust
//! use smriti_pose::{HistoryConfig, Pose, PoseHistory};
//!
//! let mut history = PoseHistory::new(HistoryConfig::default());
//!
//! // Odometry every tick
//! history.add_raw_odometry_pose(0, Pose::new(0.0, 0.0, 0.0, 0.0, 1)).unwrap();
//! history.add_raw_odometry_pose(1000, Pose::new(100.0, 0.0, 0.0, 0.0, 1)).unwrap();
//!
//! // A landmark observation from t=500 resolves into a correction
//! history.add_vision_correction_pose(500, Pose::new(60.0, 0.0, 0.0, 0.0, 2)).unwrap();
//!
//! // Fused pose: raw motion since t=500 replayed from the correction
//! let pose = history.compute_pose_at(1000, false).unwrap();
//! assert_eq!(pose.frame_id, 2);
//! ```
//!
//! ## Coordinate System
//!
//! X forward, Y left, heading CCW from +X in radians, translation in
//! millimeters. Rotation is about the vertical axis only.
//!
//! ## Concurrency
//!
//! The engine is a plain synchronous data structure: no threads, timers,
//! or I/O. Callers sharing one instance across contexts wrap it in their
//! own exclusive-access region per operation.

#![warn(missing_docs)]

// Core types and geometry
pub mod core;

// Timestamp-indexed stores and the fusion engine
pub mod history;

// Unified configuration
pub mod config;

// Error types
pub mod error;

// Re-export commonly used types
pub use crate::core::{chain_compose, interpolate_pose, normalize_angle, Pose};
pub use config::{ConfigLoadError, HistoryConfig};
pub use error::{HistoryError, Result};
pub use history::{InsertPolicy, KeyRegistry, PoseHistory, PoseKey, TimeSeriesStore};

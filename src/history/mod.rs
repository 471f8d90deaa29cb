//! Timestamp-indexed storage and the fused history engine.
//!
//! - [`TimeSeriesStore`]: sorted timestamp -> value container with
//!   boundary queries and keep-newest prefix eviction
//! - [`KeyRegistry`] / [`PoseKey`]: stable handles for cached computed poses
//! - [`PoseHistory`]: the engine fusing raw odometry with vision corrections

mod engine;
mod keys;
mod time_series;

pub use engine::PoseHistory;
pub use keys::{KeyRegistry, PoseKey};
pub use time_series::{InsertPolicy, TimeSeriesStore};

//! Trajectory pipeline: windowed fetch → path distance → stall verdict.

pub mod analyzer;
pub mod detector;
pub mod distance;

pub use analyzer::{Classification, TrajectoryAnalyzer};
pub use detector::StallDetector;
pub use distance::{DistanceEstimator, Haversine, EARTH_RADIUS_KM};

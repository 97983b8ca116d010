#![deny(unreachable_patterns)]
//! Key-frame extraction and rule-based movement scoring.
//!
//! This crate provides:
//! - Geometry primitives over landmark positions (angles, slopes,
//!   percent-difference scoring)
//! - Camera-profile detection (front-on vs side-on)
//! - Sinusoid fitting and key-frame extraction from joint-angle series
//! - The rule-based scoring engine over movement criteria
//! - The orchestration layer tying a pose-estimation adapter to the above

pub mod analyzer;
pub mod error;
pub mod geometry;
pub mod keyframe;
pub mod pose;
pub mod profile;
pub mod scoring;
pub mod sine_fit;

pub use analyzer::{AnalyzerConfig, MovementAnalyzer};
pub use error::{AnalysisError, AnalysisResult};
pub use geometry::{angle, magnitude, percent_diff, slope, Slope, DEFAULT_INF_THRESHOLD};
pub use keyframe::{extract_key_frames, AngleSeries};
pub use pose::PoseEstimator;
pub use profile::{ProfileDetector, DEFAULT_SIDE_THRESHOLD};
pub use scoring::ScoringEngine;
pub use sine_fit::{fit_sine, SineFit};

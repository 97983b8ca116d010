//! Shared data models for FormCheck movement analysis.
//!
//! This crate provides Serde-serializable types for:
//! - The fixed 33-point landmark topology and per-frame pose snapshots
//! - Movement criteria documents (action joints + assessment rule sets)
//! - Camera profile classification and per-key-frame score reports

pub mod criteria;
pub mod landmark;
pub mod report;
pub mod snapshot;

// Re-export common types
pub use criteria::{
    side_variants, ActionJoint, AssessmentType, Condition, CriteriaError, CriteriaResult,
    JointPair, JointSet, MovementCriteria, MovementLibrary, TargetSlope,
};
pub use landmark::{DetectedPose, Landmark, LandmarkId};
pub use report::{KeyFrameAssessment, MovementAssessment, Profile, ScoreReport};
pub use snapshot::PoseSnapshot;

//! Error types for movement analysis.
//!
//! Missing landmarks are not errors: they are represented as absent map
//! entries or `None` values and recovered locally by skipping the affected
//! computation. The variants here cover the failures that must be signaled
//! distinctly -- degenerate geometry, regression failure, bad criteria, and
//! pose-adapter trouble. None of them is allowed to abort a whole batch;
//! callers scope each one to the frame or condition it came from.

use formcheck_models::CriteriaError;
use thiserror::Error;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that can occur during movement analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Two landmarks of an angle computation collapsed onto each other,
    /// leaving a zero-magnitude direction vector. Indicates duplicated
    /// landmark positions, so it is signaled rather than coerced to a value.
    #[error("degenerate geometry: zero-magnitude vector in angle computation")]
    DegenerateGeometry,

    /// The sinusoid regression could not produce a usable fit. The key-frame
    /// extractor recovers from this by falling back to the global minimum.
    #[error("sinusoid fit failed: {reason}")]
    FitFailed { reason: String },

    #[error(transparent)]
    Criteria(#[from] CriteriaError),

    #[error("pose estimation failed for frame {frame}: {message}")]
    Pose { frame: u32, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Create a fit failure with a diagnostic reason.
    pub fn fit_failed(reason: impl Into<String>) -> Self {
        Self::FitFailed {
            reason: reason.into(),
        }
    }

    /// Create a pose-adapter failure scoped to one frame.
    pub fn pose(frame: u32, message: impl Into<String>) -> Self {
        Self::Pose {
            frame,
            message: message.into(),
        }
    }
}

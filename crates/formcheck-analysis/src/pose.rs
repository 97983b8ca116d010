//! Pose-estimation adapter seam.
//!
//! The pose model itself (and the video decoding that feeds it) lives
//! outside this crate. The analyzer only needs: given a frame, zero or more
//! detected skeletons. Zero detections mean "no data for this frame" and the
//! frame is skipped downstream; it is not an error.

use async_trait::async_trait;
use formcheck_models::DetectedPose;

use crate::error::AnalysisResult;

/// External pose-estimation collaborator.
///
/// Implementations wrap whatever model runtime produces landmarks for a
/// frame. The analyzer consumes only the first detected skeleton; multi-person
/// tracking is out of scope.
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    /// Detect skeletons in the given frame.
    ///
    /// An empty vector means no person was detected. Errors are scoped to
    /// the frame: the analyzer logs and skips, it does not abort the batch.
    async fn detect(&self, frame: u32) -> AnalysisResult<Vec<DetectedPose>>;
}

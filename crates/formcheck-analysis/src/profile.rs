//! Camera-profile detection.
//!
//! A side-on camera collapses the left and right instances of each landmark
//! to nearly the same horizontal position, while a front-on camera separates
//! them. Comparing the average left/right x-distance of the movement's
//! required landmarks therefore tells the two apart.

use formcheck_models::{LandmarkId, PoseSnapshot, Profile};
use tracing::debug;

/// Default maximum average left/right x-delta (normalized units) that still
/// counts as a side-on view.
pub const DEFAULT_SIDE_THRESHOLD: f64 = 0.075;

/// Classifies a single frame's snapshot as front- or side-on.
#[derive(Debug, Clone)]
pub struct ProfileDetector {
    side_threshold: f64,
}

impl Default for ProfileDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SIDE_THRESHOLD)
    }
}

impl ProfileDetector {
    pub fn new(side_threshold: f64) -> Self {
        Self { side_threshold }
    }

    /// Classify the camera profile for one frame.
    ///
    /// `left_required` and `right_required` list the same landmarks in the
    /// same order for each side. If either side's set is not entirely
    /// visible the frame is classified side-on immediately; bilateral
    /// symmetry cannot be judged with one side missing.
    pub fn detect(
        &self,
        snapshot: &PoseSnapshot,
        left_required: &[LandmarkId],
        right_required: &[LandmarkId],
    ) -> Profile {
        if !snapshot.contains_all(left_required) || !snapshot.contains_all(right_required) {
            debug!("required landmarks missing on one side, classifying side-on");
            return Profile::Side;
        }

        let mut deltas = Vec::with_capacity(left_required.len());
        for (left, right) in left_required.iter().zip(right_required.iter()) {
            let (Some(l), Some(r)) = (snapshot.get(*left), snapshot.get(*right)) else {
                continue;
            };
            deltas.push((l.x.abs() - r.x.abs()).abs());
        }

        if deltas.is_empty() {
            return Profile::Side;
        }

        let avg = deltas.iter().sum::<f64>() / deltas.len() as f64;
        debug!(avg_delta_x = avg, threshold = self.side_threshold, "profile deltas");
        if avg <= self.side_threshold {
            Profile::Side
        } else {
            Profile::Front
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formcheck_models::Landmark;

    const LEFT: [LandmarkId; 2] = [LandmarkId::LeftKnee, LandmarkId::LeftHip];
    const RIGHT: [LandmarkId; 2] = [LandmarkId::RightKnee, LandmarkId::RightHip];

    fn snapshot(entries: &[(LandmarkId, f64)]) -> PoseSnapshot {
        PoseSnapshot::from_entries(
            entries
                .iter()
                .map(|(id, x)| (*id, Landmark::new(*x, 0.5, 0.0, 1.0))),
        )
    }

    #[test]
    fn identical_x_coordinates_classify_side() {
        let snap = snapshot(&[
            (LandmarkId::LeftKnee, 0.5),
            (LandmarkId::LeftHip, 0.5),
            (LandmarkId::RightKnee, 0.5),
            (LandmarkId::RightHip, 0.5),
        ]);
        let detector = ProfileDetector::default();
        assert_eq!(detector.detect(&snap, &LEFT, &RIGHT), Profile::Side);
    }

    #[test]
    fn separated_sides_classify_front() {
        let snap = snapshot(&[
            (LandmarkId::LeftKnee, 0.6),
            (LandmarkId::LeftHip, 0.6),
            (LandmarkId::RightKnee, 0.4),
            (LandmarkId::RightHip, 0.4),
        ]);
        let detector = ProfileDetector::default();
        assert_eq!(detector.detect(&snap, &LEFT, &RIGHT), Profile::Front);
    }

    #[test]
    fn missing_side_classifies_side_immediately() {
        // Right hip invisible: bilateral comparison impossible.
        let snap = snapshot(&[
            (LandmarkId::LeftKnee, 0.6),
            (LandmarkId::LeftHip, 0.6),
            (LandmarkId::RightKnee, 0.4),
        ]);
        let detector = ProfileDetector::default();
        assert_eq!(detector.detect(&snap, &LEFT, &RIGHT), Profile::Side);
    }

    #[test]
    fn average_delta_at_threshold_is_side() {
        let snap = snapshot(&[
            (LandmarkId::LeftKnee, 0.575),
            (LandmarkId::LeftHip, 0.575),
            (LandmarkId::RightKnee, 0.5),
            (LandmarkId::RightHip, 0.5),
        ]);
        let detector = ProfileDetector::default();
        assert_eq!(detector.detect(&snap, &LEFT, &RIGHT), Profile::Side);
    }
}

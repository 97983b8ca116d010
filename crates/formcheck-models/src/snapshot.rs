//! Per-frame landmark snapshots.

use std::collections::BTreeMap;

use crate::landmark::{DetectedPose, Landmark, LandmarkId};

/// The visible landmarks of exactly one analyzed frame.
///
/// Only landmarks whose visibility exceeds the sensitivity threshold used at
/// construction are present; a missing key means "not observed", never a
/// zero/default position. Snapshots are immutable, and every geometric
/// comparison must resolve all of its landmarks through the same snapshot --
/// mixing landmarks across frames is never valid.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSnapshot {
    landmarks: BTreeMap<LandmarkId, Landmark>,
}

impl PoseSnapshot {
    /// Filter a detected skeleton down to its confidently visible landmarks.
    ///
    /// A higher `sensitivity` drops more uncertain landmarks; too high and
    /// key joints go missing, too low and misplaced landmarks leak through.
    pub fn from_pose(pose: &DetectedPose, sensitivity: f64) -> Self {
        let landmarks = pose
            .iter()
            .filter(|(_, lm)| lm.visibility > sensitivity)
            .map(|(id, lm)| (id, *lm))
            .collect();
        Self { landmarks }
    }

    /// Build a snapshot directly from landmark entries. Used by callers that
    /// already applied their own visibility filtering, and by tests.
    pub fn from_entries(entries: impl IntoIterator<Item = (LandmarkId, Landmark)>) -> Self {
        Self {
            landmarks: entries.into_iter().collect(),
        }
    }

    /// The landmark's data, if it was observed in this frame.
    pub fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        self.landmarks.get(&id)
    }

    pub fn contains(&self, id: LandmarkId) -> bool {
        self.landmarks.contains_key(&id)
    }

    /// True when every listed landmark was observed.
    pub fn contains_all(&self, ids: &[LandmarkId]) -> bool {
        ids.iter().all(|id| self.contains(*id))
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Observed landmarks in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (LandmarkId, &Landmark)> {
        self.landmarks.iter().map(|(id, lm)| (*id, lm))
    }
}

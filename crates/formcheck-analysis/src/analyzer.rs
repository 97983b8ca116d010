//! Orchestration: frames in, scored key frames out.
//!
//! For a movement type the analyzer walks the available frames, collects the
//! tracked joint-angle series through the pose adapter, hands the series to
//! the key-frame extractor, and scores each selected key frame against the
//! movement's criteria. Every per-frame failure is scoped to that frame;
//! the batch always completes.

use std::collections::BTreeMap;

use formcheck_models::{
    ActionJoint, Condition, KeyFrameAssessment, MovementAssessment, MovementLibrary, PoseSnapshot,
    Profile, ScoreReport,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::geometry::{self, DEFAULT_INF_THRESHOLD};
use crate::keyframe::{extract_key_frames, AngleSeries};
use crate::pose::PoseEstimator;
use crate::profile::{ProfileDetector, DEFAULT_SIDE_THRESHOLD};
use crate::scoring::ScoringEngine;

/// Tunable thresholds for one analysis run. Explicit configuration instead
/// of process-wide constants; the defaults match the historical values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Visibility threshold a landmark must exceed to enter a snapshot.
    pub sensitivity: f64,
    /// Slope magnitude treated as infinite.
    pub inf_threshold: f64,
    /// Maximum average left/right x-delta for a side-on classification.
    pub side_threshold: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.5,
            inf_threshold: DEFAULT_INF_THRESHOLD,
            side_threshold: DEFAULT_SIDE_THRESHOLD,
        }
    }
}

/// Analyzes one movement type at a time over a frame range.
pub struct MovementAnalyzer<P> {
    estimator: P,
    library: MovementLibrary,
    config: AnalyzerConfig,
    profile_detector: ProfileDetector,
    scoring: ScoringEngine,
}

impl<P: PoseEstimator> MovementAnalyzer<P> {
    pub fn new(estimator: P, library: MovementLibrary, config: AnalyzerConfig) -> Self {
        Self {
            estimator,
            profile_detector: ProfileDetector::new(config.side_threshold),
            scoring: ScoringEngine::new(config.inf_threshold),
            library,
            config,
        }
    }

    /// Analyze the given frames for one movement type.
    ///
    /// An assessment with no key frames means no repetition extremum could
    /// be identified; that is a reportable outcome, not an error. Only bad
    /// criteria (unknown movement) fail the call.
    pub async fn analyze(
        &self,
        movement: &str,
        frames: impl IntoIterator<Item = u32>,
    ) -> AnalysisResult<MovementAssessment> {
        let criteria = self.library.get(movement)?;
        let action_joints = criteria.action_joint_sides();
        let Some(tracked) = action_joints.first().copied() else {
            warn!(movement, "criteria names no action joints, nothing to track");
            return Ok(MovementAssessment::empty(movement));
        };

        let mut series = AngleSeries::new();
        let mut snapshots: BTreeMap<u32, PoseSnapshot> = BTreeMap::new();

        for frame in frames {
            let poses = match self.estimator.detect(frame).await {
                Ok(poses) => poses,
                Err(err) => {
                    warn!(frame, error = %err, "pose estimation failed, skipping frame");
                    counter!("formcheck_pose_failures_total").increment(1);
                    continue;
                }
            };
            // Only the first detected skeleton is analyzed; none at all means
            // the frame carries no data.
            let Some(pose) = poses.first() else {
                debug!(frame, "no pose detected, skipping frame");
                continue;
            };

            let snapshot = PoseSnapshot::from_pose(pose, self.config.sensitivity);
            series.insert(frame, self.tracked_angle(&snapshot, tracked, frame));
            snapshots.insert(frame, snapshot);
            counter!("formcheck_frames_analyzed_total").increment(1);
        }

        debug!(
            movement,
            frames = snapshots.len(),
            angles = series.dense_values().len(),
            "collected angle series"
        );

        let Some(key_frames) = extract_key_frames(&series) else {
            info!(movement, "no key frame found");
            return Ok(MovementAssessment::empty(movement));
        };
        counter!("formcheck_key_frames_total").increment(key_frames.len() as u64);

        let (left_required, right_required) = criteria.required_landmarks();
        let mut assessments = Vec::with_capacity(key_frames.len());

        for frame in key_frames {
            let Some(snapshot) = snapshots.get(&frame) else {
                // Key frames come from the collected series, so this cannot
                // happen; skip rather than trust it.
                warn!(frame, "key frame without snapshot, skipping");
                continue;
            };

            let profile = self
                .profile_detector
                .detect(snapshot, &left_required, &right_required);
            info!(movement, frame, profile = %profile, "scoring key frame");

            let mut report = ScoreReport::new();
            // Side conditions apply regardless of the detected profile; a
            // front-on view additionally unlocks the front rule set. Each
            // rule set is evaluated with its own naming convention (side:
            // bare names expanded to both sides, front: qualified names).
            self.score_rule_set(snapshot, &criteria.assessment_side, Profile::Side, &mut report);
            if profile == Profile::Front {
                self.score_rule_set(
                    snapshot,
                    &criteria.assessment_front,
                    Profile::Front,
                    &mut report,
                );
            }

            counter!("formcheck_conditions_scored_total").increment(report.len() as u64);
            assessments.push(KeyFrameAssessment {
                frame,
                profile,
                report,
            });
        }

        Ok(MovementAssessment {
            movement: movement.to_string(),
            key_frames: assessments,
        })
    }

    /// The tracked action-joint angle for one frame, or `None` when a
    /// required landmark is invisible or the geometry degenerates.
    fn tracked_angle(
        &self,
        snapshot: &PoseSnapshot,
        tracked: ActionJoint,
        frame: u32,
    ) -> Option<f64> {
        let target = snapshot.get(tracked.joint)?;
        let adj1 = snapshot.get(tracked.adjacent[0])?;
        let adj2 = snapshot.get(tracked.adjacent[1])?;
        match geometry::angle(target, adj1, adj2) {
            Ok(angle) => Some(angle),
            Err(AnalysisError::DegenerateGeometry) => {
                warn!(frame, joint = %tracked.joint, "degenerate angle geometry, dropping sample");
                None
            }
            Err(err) => {
                warn!(frame, error = %err, "angle computation failed, dropping sample");
                None
            }
        }
    }

    fn score_rule_set(
        &self,
        snapshot: &PoseSnapshot,
        conditions: &BTreeMap<String, Condition>,
        naming: Profile,
        report: &mut ScoreReport,
    ) {
        for (name, condition) in conditions {
            if let Some(score) = self.scoring.score_condition(snapshot, condition, naming) {
                report.insert(name.clone(), score);
            } else {
                debug!(condition = %name, "condition not evaluable, omitting");
            }
        }
    }
}

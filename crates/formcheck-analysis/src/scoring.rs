//! Rule-based scoring of a frame's landmark geometry.
//!
//! Each named condition of a movement's criteria compares the slopes of one
//! or more landmark pairs against a target, using one of four assessment
//! rules. Every evaluable pair instance produces a candidate score; the
//! condition's final score is the smallest absolute candidate, and a
//! condition with no evaluable instance is reported as absent rather than
//! scored.

use formcheck_models::{
    side_variants, AssessmentType, Condition, JointPair, JointSet, LandmarkId, PoseSnapshot,
    Profile, TargetSlope,
};
use tracing::debug;

use crate::geometry::{percent_diff, slope, Slope, DEFAULT_INF_THRESHOLD};

/// Evaluates conditions against a single frame's snapshot.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    inf_threshold: f64,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(DEFAULT_INF_THRESHOLD)
    }
}

impl ScoringEngine {
    pub fn new(inf_threshold: f64) -> Self {
        Self { inf_threshold }
    }

    /// Score one condition against one frame.
    ///
    /// Returns the minimum absolute percent-difference across all evaluable
    /// landmark-pair instances, or `None` when no instance had all of its
    /// landmarks visible. All landmarks resolve through the given snapshot;
    /// cross-frame mixing is impossible by construction.
    pub fn score_condition(
        &self,
        snapshot: &PoseSnapshot,
        condition: &Condition,
        profile: Profile,
    ) -> Option<f64> {
        let scores = match condition.assessment_type {
            AssessmentType::Line => self.score_line(snapshot, condition, profile),
            AssessmentType::ParallelLines => self.score_parallel(snapshot, condition, profile),
            AssessmentType::MinLine => self.score_bounded(snapshot, condition, profile, Bound::Min),
            AssessmentType::MaxLine => self.score_bounded(snapshot, condition, profile, Bound::Max),
        };

        let best = scores
            .iter()
            .map(|s| s.abs())
            .min_by(|a, b| a.total_cmp(b));
        debug!(
            assessment = %condition.assessment_type,
            profile = %profile,
            candidates = scores.len(),
            best,
            "condition scored"
        );
        best
    }

    /// `line`: each pair's absolute slope against the numeric target;
    /// vertical lines are compared as the symbolic infinity.
    fn score_line(
        &self,
        snapshot: &PoseSnapshot,
        condition: &Condition,
        profile: Profile,
    ) -> Vec<f64> {
        let Some(target) = condition.m.value() else {
            return Vec::new();
        };
        let JointSet::Pairs(pairs) = &condition.joints else {
            return Vec::new();
        };

        let mut scores = Vec::new();
        for pair in pairs {
            for instance in pair_instances(pair, profile) {
                let Some(m) = self.pair_slope(snapshot, instance) else {
                    continue;
                };
                scores.push(self.diff_to_target(m, target));
            }
        }
        scores
    }

    /// `parallel_lines`: cross-combine the two pair groups. With a numeric
    /// target, each line is scored against the target and the two scores
    /// averaged; with no target, the two lines are scored against each other
    /// (a pure parallelism check). Side profiles evaluate the left and right
    /// instances independently.
    fn score_parallel(
        &self,
        snapshot: &PoseSnapshot,
        condition: &Condition,
        profile: Profile,
    ) -> Vec<f64> {
        let JointSet::ParallelLines { first_line, second_line } = &condition.joints else {
            return Vec::new();
        };

        let mut scores = Vec::new();
        for first in first_line {
            for second in second_line {
                let first_instances = pair_instances(first, profile);
                let second_instances = pair_instances(second, profile);
                for (fi, si) in first_instances.iter().zip(second_instances.iter()) {
                    let (Some(s1), Some(s2)) = (
                        self.pair_slope(snapshot, *fi),
                        self.pair_slope(snapshot, *si),
                    ) else {
                        continue;
                    };
                    let score = match condition.m {
                        TargetSlope::Value(target) => {
                            let d1 = self.diff_to_target(s1, target);
                            let d2 = self.diff_to_target(s2, target);
                            (d1 + d2) / 2.0
                        }
                        TargetSlope::None => percent_diff(s1, s2, self.inf_threshold),
                    };
                    scores.push(score);
                }
            }
        }
        scores
    }

    /// `min_line` / `max_line`: a slope already satisfying the threshold
    /// inequality scores zero; anything else is penalized like `line`.
    /// Vertical lines never satisfy either bound and are scored.
    fn score_bounded(
        &self,
        snapshot: &PoseSnapshot,
        condition: &Condition,
        profile: Profile,
        bound: Bound,
    ) -> Vec<f64> {
        let Some(target) = condition.m.value() else {
            return Vec::new();
        };
        let JointSet::Pairs(pairs) = &condition.joints else {
            return Vec::new();
        };

        let mut scores = Vec::new();
        for pair in pairs {
            for instance in pair_instances(pair, profile) {
                let Some((p1, p2)) = self.pair_landmarks(snapshot, instance) else {
                    continue;
                };
                let m = slope(p1, p2, self.inf_threshold);
                let satisfied = match (m, bound) {
                    (Slope::Finite(m), Bound::Min) => m >= target,
                    (Slope::Finite(m), Bound::Max) => m <= target,
                    (Slope::Infinite, _) => false,
                };
                if satisfied {
                    scores.push(0.0);
                } else {
                    scores.push(self.diff_to_target(m, target));
                }
            }
        }
        scores
    }

    /// Absolute slope of a pair instance, if both landmarks are visible.
    fn pair_slope(&self, snapshot: &PoseSnapshot, instance: [LandmarkId; 2]) -> Option<Slope> {
        let (p1, p2) = self.pair_landmarks(snapshot, instance)?;
        Some(slope(p1, p2, self.inf_threshold).abs())
    }

    fn pair_landmarks<'a>(
        &self,
        snapshot: &'a PoseSnapshot,
        instance: [LandmarkId; 2],
    ) -> Option<(&'a formcheck_models::Landmark, &'a formcheck_models::Landmark)> {
        Some((snapshot.get(instance[0])?, snapshot.get(instance[1])?))
    }

    /// Percent difference of a measured slope against the numeric target.
    /// Infinite slopes are compared symbolically; finite slopes by absolute
    /// value.
    fn diff_to_target(&self, m: Slope, target: f64) -> f64 {
        match m {
            Slope::Infinite => {
                percent_diff(Slope::Infinite, Slope::Finite(target), self.inf_threshold)
            }
            Slope::Finite(v) => percent_diff(
                Slope::Finite(v.abs()),
                Slope::Finite(target),
                self.inf_threshold,
            ),
        }
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Min,
    Max,
}

/// Resolve a criteria joint pair to the landmark-pair instances to evaluate.
///
/// Side profiles expand bare names to their left and right variants and try
/// both; front profiles use the already-qualified names as given. Names that
/// do not resolve produce no instance (criteria validation rejects them at
/// load, so this only guards against mixed naming).
fn pair_instances(pair: &JointPair, profile: Profile) -> Vec<[LandmarkId; 2]> {
    match profile {
        Profile::Side => {
            let Some(((l0, r0), (l1, r1))) = side_variants(&pair[0]).zip(side_variants(&pair[1]))
            else {
                return Vec::new();
            };
            vec![[l0, l1], [r0, r1]]
        }
        Profile::Front => {
            let Some((id0, id1)) =
                LandmarkId::from_name(&pair[0]).zip(LandmarkId::from_name(&pair[1]))
            else {
                return Vec::new();
            };
            vec![[id0, id1]]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formcheck_models::Landmark;

    fn snapshot(entries: &[(LandmarkId, (f64, f64))]) -> PoseSnapshot {
        PoseSnapshot::from_entries(
            entries
                .iter()
                .map(|(id, (x, y))| (*id, Landmark::new(*x, *y, 0.0, 1.0))),
        )
    }

    fn pairs_condition(
        pairs: Vec<JointPair>,
        m: TargetSlope,
        assessment_type: AssessmentType,
    ) -> Condition {
        Condition {
            joints: JointSet::Pairs(pairs),
            m,
            assessment_type,
        }
    }

    #[test]
    fn line_scores_best_matching_side() {
        // Left shoulder-hip slope: (0.8-0.2)/(0.55-0.25) = 2.0 (exact target).
        // Right side slope: 1.0 (off target).
        let snap = snapshot(&[
            (LandmarkId::LeftShoulder, (0.25, 0.2)),
            (LandmarkId::LeftHip, (0.55, 0.8)),
            (LandmarkId::RightShoulder, (0.2, 0.2)),
            (LandmarkId::RightHip, (0.8, 0.8)),
        ]);
        let condition = pairs_condition(
            vec![["SHOULDER".into(), "HIP".into()]],
            TargetSlope::Value(2.0),
            AssessmentType::Line,
        );
        let score = ScoringEngine::default()
            .score_condition(&snap, &condition, Profile::Side)
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn line_with_no_visible_landmarks_is_not_evaluable() {
        let snap = snapshot(&[(LandmarkId::LeftShoulder, (0.25, 0.2))]);
        let condition = pairs_condition(
            vec![["SHOULDER".into(), "HIP".into()]],
            TargetSlope::Value(2.0),
            AssessmentType::Line,
        );
        assert_eq!(
            ScoringEngine::default().score_condition(&snap, &condition, Profile::Side),
            None
        );
    }

    #[test]
    fn line_vertical_pair_against_finite_target_is_unbounded() {
        let snap = snapshot(&[
            (LandmarkId::LeftShoulder, (0.5, 0.2)),
            (LandmarkId::LeftHip, (0.5, 0.8)),
        ]);
        let condition = pairs_condition(
            vec![["SHOULDER".into(), "HIP".into()]],
            TargetSlope::Value(2.0),
            AssessmentType::Line,
        );
        let score = ScoringEngine::default()
            .score_condition(&snap, &condition, Profile::Side)
            .unwrap();
        assert_eq!(score, f64::INFINITY);
    }

    #[test]
    fn front_profile_uses_qualified_names_as_given() {
        let snap = snapshot(&[
            (LandmarkId::LeftKnee, (0.3, 0.6)),
            (LandmarkId::RightKnee, (0.7, 0.6)),
        ]);
        // Level knees: slope 0 against target 0 scores 0 (via the zero-target
        // branch: actual 0 * 100).
        let condition = pairs_condition(
            vec![["LEFT_KNEE".into(), "RIGHT_KNEE".into()]],
            TargetSlope::Value(0.0),
            AssessmentType::Line,
        );
        let score = ScoringEngine::default()
            .score_condition(&snap, &condition, Profile::Front)
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn min_line_satisfied_scores_exactly_zero() {
        // Hip-knee slope 0.5, comfortably above the 0.15 minimum.
        let snap = snapshot(&[
            (LandmarkId::LeftHip, (0.4, 0.5)),
            (LandmarkId::LeftKnee, (0.6, 0.6)),
            (LandmarkId::RightHip, (0.4, 0.5)),
            (LandmarkId::RightKnee, (0.6, 0.6)),
        ]);
        let condition = pairs_condition(
            vec![["HIP".into(), "KNEE".into()]],
            TargetSlope::Value(0.15),
            AssessmentType::MinLine,
        );
        let score = ScoringEngine::default()
            .score_condition(&snap, &condition, Profile::Side)
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn min_line_at_the_boundary_scores_zero() {
        // Slope exactly equal to the target satisfies the minimum.
        let snap = snapshot(&[
            (LandmarkId::LeftHip, (0.0, 0.0)),
            (LandmarkId::LeftKnee, (1.0, 0.15)),
        ]);
        let condition = pairs_condition(
            vec![["HIP".into(), "KNEE".into()]],
            TargetSlope::Value(0.15),
            AssessmentType::MinLine,
        );
        let score = ScoringEngine::default()
            .score_condition(&snap, &condition, Profile::Side)
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn min_line_below_target_is_penalized() {
        // Slope 0.05 below a 0.15 minimum: percent diff of (0.05, 0.15).
        let snap = snapshot(&[
            (LandmarkId::LeftHip, (0.0, 0.0)),
            (LandmarkId::LeftKnee, (1.0, 0.05)),
        ]);
        let condition = pairs_condition(
            vec![["HIP".into(), "KNEE".into()]],
            TargetSlope::Value(0.15),
            AssessmentType::MinLine,
        );
        let score = ScoringEngine::default()
            .score_condition(&snap, &condition, Profile::Side)
            .unwrap();
        let expected = percent_diff(
            Slope::Finite(0.05),
            Slope::Finite(0.15),
            DEFAULT_INF_THRESHOLD,
        );
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn max_line_mirrors_min_line() {
        // Slope 0.1 at or below the 0.1 maximum scores zero.
        let snap = snapshot(&[
            (LandmarkId::LeftHip, (0.0, 0.0)),
            (LandmarkId::LeftKnee, (1.0, 0.1)),
        ]);
        let condition = pairs_condition(
            vec![["HIP".into(), "KNEE".into()]],
            TargetSlope::Value(0.1),
            AssessmentType::MaxLine,
        );
        let score = ScoringEngine::default()
            .score_condition(&snap, &condition, Profile::Side)
            .unwrap();
        assert_eq!(score, 0.0);

        // Slope 0.5 above the maximum is penalized.
        let steep = snapshot(&[
            (LandmarkId::LeftHip, (0.0, 0.0)),
            (LandmarkId::LeftKnee, (1.0, 0.5)),
        ]);
        let score = ScoringEngine::default()
            .score_condition(&steep, &condition, Profile::Side)
            .unwrap();
        assert!(score > 0.0);
    }

    #[test]
    fn vertical_slope_never_satisfies_a_bound() {
        let snap = snapshot(&[
            (LandmarkId::LeftHip, (0.5, 0.0)),
            (LandmarkId::LeftKnee, (0.5, 1.0)),
        ]);
        let condition = pairs_condition(
            vec![["HIP".into(), "KNEE".into()]],
            TargetSlope::Value(0.15),
            AssessmentType::MinLine,
        );
        let score = ScoringEngine::default()
            .score_condition(&snap, &condition, Profile::Side)
            .unwrap();
        assert_eq!(score, f64::INFINITY);
    }

    #[test]
    fn parallel_lines_without_target_checks_parallelism() {
        // Shin and torso lines share slope 2.0 on the left side: parallel,
        // score 0. Right side landmarks are absent and skipped.
        let snap = snapshot(&[
            (LandmarkId::LeftKnee, (0.4, 0.6)),
            (LandmarkId::LeftAnkle, (0.3, 0.4)),
            (LandmarkId::LeftShoulder, (0.5, 0.2)),
            (LandmarkId::LeftHip, (0.6, 0.4)),
        ]);
        let condition = Condition {
            joints: JointSet::ParallelLines {
                first_line: vec![["KNEE".into(), "ANKLE".into()]],
                second_line: vec![["SHOULDER".into(), "HIP".into()]],
            },
            m: TargetSlope::None,
            assessment_type: AssessmentType::ParallelLines,
        };
        let score = ScoringEngine::default()
            .score_condition(&snap, &condition, Profile::Side)
            .unwrap();
        assert!(score.abs() < 1e-12);
    }

    #[test]
    fn parallel_lines_with_target_averages_both_lines() {
        // First line slope 1.0, second line slope 3.0, target 2.0: the score
        // is the mean of the two percent differences.
        let snap = snapshot(&[
            (LandmarkId::LeftKnee, (0.0, 0.0)),
            (LandmarkId::LeftAnkle, (0.2, 0.2)),
            (LandmarkId::LeftShoulder, (0.0, 0.0)),
            (LandmarkId::LeftHip, (0.2, 0.6)),
        ]);
        let condition = Condition {
            joints: JointSet::ParallelLines {
                first_line: vec![["KNEE".into(), "ANKLE".into()]],
                second_line: vec![["SHOULDER".into(), "HIP".into()]],
            },
            m: TargetSlope::Value(2.0),
            assessment_type: AssessmentType::ParallelLines,
        };
        let score = ScoringEngine::default()
            .score_condition(&snap, &condition, Profile::Side)
            .unwrap();
        let d1 = percent_diff(Slope::Finite(1.0), Slope::Finite(2.0), DEFAULT_INF_THRESHOLD);
        let d2 = percent_diff(Slope::Finite(3.0), Slope::Finite(2.0), DEFAULT_INF_THRESHOLD);
        assert!((score - (d1 + d2) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn condition_with_no_evaluable_instances_is_omitted() {
        let empty = PoseSnapshot::from_entries([]);
        let condition = pairs_condition(
            vec![["HIP".into(), "KNEE".into()]],
            TargetSlope::Value(1.0),
            AssessmentType::Line,
        );
        for profile in [Profile::Side, Profile::Front] {
            assert_eq!(
                ScoringEngine::default().score_condition(&empty, &condition, profile),
                None
            );
        }
    }
}

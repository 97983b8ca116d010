//! Movement criteria schema.
//!
//! A criteria document is keyed by movement-type name. Each movement names
//! the action joints whose angle tracks the repetition, plus two rule sets
//! (`assessment_side`, `assessment_front`) of named conditions. Side
//! conditions use bare joint names (`KNEE`) that expand to their
//! `LEFT_`/`RIGHT_` variants at evaluation time; front conditions use
//! already-qualified names.
//!
//! Documents are loaded once per analysis run and validated eagerly: every
//! joint name must resolve inside the fixed landmark topology, and each
//! assessment type must carry the joint-set shape and target it can actually
//! evaluate. Bad criteria fail at load, never mid-scoring.

use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::landmark::LandmarkId;

/// Result type for criteria loading and validation.
pub type CriteriaResult<T> = Result<T, CriteriaError>;

/// Errors raised while loading or validating a criteria document.
#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("unknown movement type: {0}")]
    UnknownMovement(String),

    #[error("movement {movement}: unknown landmark name {name:?} in {context}")]
    UnknownLandmark {
        movement: String,
        context: String,
        name: String,
    },

    #[error("movement {movement}: action_joints has {count} entries, at most 2 (left/right) allowed")]
    TooManyActionJoints { movement: String, count: usize },

    #[error("movement {movement}, condition {condition}: {assessment} requires a numeric target slope")]
    MissingNumericTarget {
        movement: String,
        condition: String,
        assessment: AssessmentType,
    },

    #[error("movement {movement}, condition {condition}: joint set shape does not match {assessment}")]
    MismatchedJointSet {
        movement: String,
        condition: String,
        assessment: AssessmentType,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One of the four scoring rules applied to landmark-pair slopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    /// Compare each pair's absolute slope against the target.
    Line,
    /// Compare two lines against each other (or each against the target).
    ParallelLines,
    /// Slope must not fall below the target; satisfied scores zero.
    MinLine,
    /// Slope must not rise above the target; satisfied scores zero.
    MaxLine,
}

impl std::fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AssessmentType::Line => "line",
            AssessmentType::ParallelLines => "parallel_lines",
            AssessmentType::MinLine => "min_line",
            AssessmentType::MaxLine => "max_line",
        };
        f.write_str(name)
    }
}

/// A pair of joint names forming a line, e.g. `["SHOULDER", "HIP"]`.
pub type JointPair = [String; 2];

/// The landmark pairs a condition evaluates.
///
/// `line`, `min_line` and `max_line` carry a flat list of pairs;
/// `parallel_lines` carries two named groups that are cross-combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum JointSet {
    Pairs(Vec<JointPair>),
    ParallelLines {
        first_line: Vec<JointPair>,
        second_line: Vec<JointPair>,
    },
}

/// Target slope of a condition: a numeric value, or the symbolic `"None"`
/// marker used by `parallel_lines` to request a pure parallelism check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetSlope {
    Value(f64),
    None,
}

impl TargetSlope {
    /// The numeric target, if one was given.
    pub fn value(&self) -> Option<f64> {
        match self {
            TargetSlope::Value(m) => Some(*m),
            TargetSlope::None => None,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
enum TargetSlopeRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<TargetSlopeRepr> for TargetSlope {
    type Error = String;

    fn try_from(repr: TargetSlopeRepr) -> Result<Self, Self::Error> {
        match repr {
            TargetSlopeRepr::Number(m) => Ok(TargetSlope::Value(m)),
            TargetSlopeRepr::Text(s) if s == "None" => Ok(TargetSlope::None),
            TargetSlopeRepr::Text(s) => Err(format!("invalid target slope {s:?}, expected a number or \"None\"")),
        }
    }
}

impl From<TargetSlope> for TargetSlopeRepr {
    fn from(m: TargetSlope) -> Self {
        match m {
            TargetSlope::Value(v) => TargetSlopeRepr::Number(v),
            TargetSlope::None => TargetSlopeRepr::Text("None".to_string()),
        }
    }
}

impl Serialize for TargetSlope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TargetSlopeRepr::from(*self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TargetSlope {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = TargetSlopeRepr::deserialize(deserializer)?;
        TargetSlope::try_from(repr).map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for TargetSlope {
    fn schema_name() -> String {
        "TargetSlope".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        TargetSlopeRepr::json_schema(gen)
    }
}

/// One named scoring condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    /// Landmark pairs to evaluate.
    pub joints: JointSet,
    /// Target slope, or `"None"` for parallelism-only checks.
    pub m: TargetSlope,
    /// Which scoring rule applies.
    pub assessment_type: AssessmentType,
}

/// The action joint whose angle tracks one side's repetition movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionJoint {
    pub joint: LandmarkId,
    pub adjacent: [LandmarkId; 2],
}

/// Criteria for one movement type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MovementCriteria {
    /// Tracked joint name -> its two adjacent joint names; at most two
    /// entries, left side first. `LEFT_*` orders before `RIGHT_*`, so the
    /// map's natural ordering preserves the left-then-right convention.
    pub action_joints: BTreeMap<String, [String; 2]>,
    /// Conditions evaluated for every key frame.
    #[serde(default)]
    pub assessment_side: BTreeMap<String, Condition>,
    /// Conditions evaluated additionally when the camera profile is front-on.
    #[serde(default)]
    pub assessment_front: BTreeMap<String, Condition>,
}

impl MovementCriteria {
    /// The validated action joints in left-then-right order.
    ///
    /// Only valid after `MovementLibrary` validation; unknown names make
    /// loading fail, so resolution cannot fail here.
    pub fn action_joint_sides(&self) -> Vec<ActionJoint> {
        self.action_joints
            .iter()
            .filter_map(|(joint, adjacent)| {
                Some(ActionJoint {
                    joint: LandmarkId::from_name(joint)?,
                    adjacent: [
                        LandmarkId::from_name(&adjacent[0])?,
                        LandmarkId::from_name(&adjacent[1])?,
                    ],
                })
            })
            .collect()
    }

    /// Required landmark names per side, as used by profile detection:
    /// every action joint and adjacent joint, split by its `LEFT_` prefix.
    pub fn required_landmarks(&self) -> (Vec<LandmarkId>, Vec<LandmarkId>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for (joint, adjacent) in &self.action_joints {
            let names = std::iter::once(joint.as_str()).chain(adjacent.iter().map(String::as_str));
            for name in names {
                if let Some(id) = LandmarkId::from_name(name) {
                    if name.contains("LEFT") {
                        left.push(id);
                    } else {
                        right.push(id);
                    }
                }
            }
        }
        (left, right)
    }
}

/// Expand a bare joint name into its left/right qualified variants.
///
/// `KNEE` becomes (`LEFT_KNEE`, `RIGHT_KNEE`); `MOUTH` is the one landmark
/// whose qualified form uses a suffix (`MOUTH_LEFT`/`MOUTH_RIGHT`).
/// Returns `None` when either variant falls outside the topology.
pub fn side_variants(name: &str) -> Option<(LandmarkId, LandmarkId)> {
    let (left, right) = if name == "MOUTH" {
        (format!("{name}_LEFT"), format!("{name}_RIGHT"))
    } else {
        (format!("LEFT_{name}"), format!("RIGHT_{name}"))
    };
    Some((
        LandmarkId::from_name(&left)?,
        LandmarkId::from_name(&right)?,
    ))
}

/// All movement criteria for an analysis run, keyed by movement-type name.
/// Read-only after loading; safe to share across concurrent frame analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct MovementLibrary {
    movements: BTreeMap<String, MovementCriteria>,
}

impl MovementLibrary {
    /// Parse and validate a criteria document.
    pub fn from_json_str(json: &str) -> CriteriaResult<Self> {
        let library: MovementLibrary = serde_json::from_str(json)?;
        library.validate()?;
        Ok(library)
    }

    /// Load and validate a criteria document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> CriteriaResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Criteria for a movement type.
    pub fn get(&self, movement: &str) -> CriteriaResult<&MovementCriteria> {
        self.movements
            .get(movement)
            .ok_or_else(|| CriteriaError::UnknownMovement(movement.to_string()))
    }

    pub fn movements(&self) -> impl Iterator<Item = (&str, &MovementCriteria)> {
        self.movements.iter().map(|(name, c)| (name.as_str(), c))
    }

    /// Reject unknown landmark names and shape mismatches up front, so
    /// condition evaluation never has to cope with unresolvable names.
    fn validate(&self) -> CriteriaResult<()> {
        for (movement, criteria) in &self.movements {
            if criteria.action_joints.len() > 2 {
                return Err(CriteriaError::TooManyActionJoints {
                    movement: movement.clone(),
                    count: criteria.action_joints.len(),
                });
            }

            for (joint, adjacent) in &criteria.action_joints {
                let names = std::iter::once(joint).chain(adjacent.iter());
                for name in names {
                    if LandmarkId::from_name(name).is_none() {
                        return Err(CriteriaError::UnknownLandmark {
                            movement: movement.clone(),
                            context: "action_joints".to_string(),
                            name: name.clone(),
                        });
                    }
                }
            }

            for (condition, rule) in &criteria.assessment_side {
                validate_condition(movement, condition, rule, JointNaming::BareSuffix)?;
            }
            for (condition, rule) in &criteria.assessment_front {
                validate_condition(movement, condition, rule, JointNaming::Qualified)?;
            }
        }
        Ok(())
    }
}

/// How a rule set names its joints.
#[derive(Clone, Copy)]
enum JointNaming {
    /// Bare suffix names that expand to left/right variants (`assessment_side`).
    BareSuffix,
    /// Already-qualified names used as given (`assessment_front`).
    Qualified,
}

fn validate_condition(
    movement: &str,
    condition: &str,
    rule: &Condition,
    naming: JointNaming,
) -> CriteriaResult<()> {
    let pairs: Vec<&JointPair> = match (&rule.joints, rule.assessment_type) {
        (JointSet::Pairs(pairs), AssessmentType::Line)
        | (JointSet::Pairs(pairs), AssessmentType::MinLine)
        | (JointSet::Pairs(pairs), AssessmentType::MaxLine) => pairs.iter().collect(),
        (
            JointSet::ParallelLines { first_line, second_line },
            AssessmentType::ParallelLines,
        ) => first_line.iter().chain(second_line.iter()).collect(),
        _ => {
            return Err(CriteriaError::MismatchedJointSet {
                movement: movement.to_string(),
                condition: condition.to_string(),
                assessment: rule.assessment_type,
            })
        }
    };

    // line / min_line / max_line compare against an absolute slope, so the
    // symbolic "None" target is only meaningful for parallel_lines.
    if rule.m.value().is_none() && rule.assessment_type != AssessmentType::ParallelLines {
        return Err(CriteriaError::MissingNumericTarget {
            movement: movement.to_string(),
            condition: condition.to_string(),
            assessment: rule.assessment_type,
        });
    }

    for pair in pairs {
        for name in pair {
            let resolved = match naming {
                JointNaming::BareSuffix => side_variants(name).is_some(),
                JointNaming::Qualified => LandmarkId::from_name(name).is_some(),
            };
            if !resolved {
                return Err(CriteriaError::UnknownLandmark {
                    movement: movement.to_string(),
                    context: format!("condition {condition}"),
                    name: name.clone(),
                });
            }
        }
    }
    Ok(())
}

//! Assessment output types.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Camera-relative orientation of the subject in a frame.
///
/// A side-on view collapses left/right landmarks to nearly the same
/// horizontal position; a front-on view visibly separates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Front,
    Side,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Front => "front",
            Profile::Side => "side",
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-condition scores for one analyzed frame.
///
/// Scores are non-negative percent-difference values; lower is better, zero
/// means the condition's geometry matched its target exactly. A condition
/// that could not be evaluated (no visible landmarks) is absent, not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ScoreReport {
    scores: BTreeMap<String, f64>,
}

impl ScoreReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a condition's score.
    pub fn insert(&mut self, condition: impl Into<String>, score: f64) {
        self.scores.insert(condition.into(), score);
    }

    pub fn get(&self, condition: &str) -> Option<f64> {
        self.scores.get(condition).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(name, score)| (name.as_str(), *score))
    }
}

/// Scores for one selected key frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeyFrameAssessment {
    /// Original frame index of the repetition extremum.
    pub frame: u32,
    /// Detected camera profile for that frame.
    pub profile: Profile,
    /// Per-condition scores.
    pub report: ScoreReport,
}

/// Full result of analyzing one movement: the selected key frames and the
/// scores each one earned. An empty `key_frames` list means no repetition
/// extremum could be identified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MovementAssessment {
    pub movement: String,
    pub key_frames: Vec<KeyFrameAssessment>,
}

impl MovementAssessment {
    pub fn empty(movement: impl Into<String>) -> Self {
        Self {
            movement: movement.into(),
            key_frames: Vec::new(),
        }
    }
}

//! Body landmark topology and per-landmark data.
//!
//! The upstream pose model reports a fixed 33-point skeleton. The identifiers
//! here mirror its naming exactly (`LEFT_KNEE`, `MOUTH_LEFT`, ...), so
//! criteria documents written against the model's names deserialize directly.
//! Unknown names are rejected when criteria are loaded, not when a frame is
//! scored.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one point of the fixed 33-landmark skeleton topology.
///
/// Variant order matches the upstream model's landmark indices, so
/// `LandmarkId::index` is also the position of the landmark in a detected
/// skeleton's landmark list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandmarkId {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkId {
    /// Every landmark in topology (index) order.
    pub const ALL: [LandmarkId; 33] = [
        LandmarkId::Nose,
        LandmarkId::LeftEyeInner,
        LandmarkId::LeftEye,
        LandmarkId::LeftEyeOuter,
        LandmarkId::RightEyeInner,
        LandmarkId::RightEye,
        LandmarkId::RightEyeOuter,
        LandmarkId::LeftEar,
        LandmarkId::RightEar,
        LandmarkId::MouthLeft,
        LandmarkId::MouthRight,
        LandmarkId::LeftShoulder,
        LandmarkId::RightShoulder,
        LandmarkId::LeftElbow,
        LandmarkId::RightElbow,
        LandmarkId::LeftWrist,
        LandmarkId::RightWrist,
        LandmarkId::LeftPinky,
        LandmarkId::RightPinky,
        LandmarkId::LeftIndex,
        LandmarkId::RightIndex,
        LandmarkId::LeftThumb,
        LandmarkId::RightThumb,
        LandmarkId::LeftHip,
        LandmarkId::RightHip,
        LandmarkId::LeftKnee,
        LandmarkId::RightKnee,
        LandmarkId::LeftAnkle,
        LandmarkId::RightAnkle,
        LandmarkId::LeftHeel,
        LandmarkId::RightHeel,
        LandmarkId::LeftFootIndex,
        LandmarkId::RightFootIndex,
    ];

    /// Position of this landmark in the model's output list.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The upstream model's name for this landmark.
    pub fn name(&self) -> &'static str {
        match self {
            LandmarkId::Nose => "NOSE",
            LandmarkId::LeftEyeInner => "LEFT_EYE_INNER",
            LandmarkId::LeftEye => "LEFT_EYE",
            LandmarkId::LeftEyeOuter => "LEFT_EYE_OUTER",
            LandmarkId::RightEyeInner => "RIGHT_EYE_INNER",
            LandmarkId::RightEye => "RIGHT_EYE",
            LandmarkId::RightEyeOuter => "RIGHT_EYE_OUTER",
            LandmarkId::LeftEar => "LEFT_EAR",
            LandmarkId::RightEar => "RIGHT_EAR",
            LandmarkId::MouthLeft => "MOUTH_LEFT",
            LandmarkId::MouthRight => "MOUTH_RIGHT",
            LandmarkId::LeftShoulder => "LEFT_SHOULDER",
            LandmarkId::RightShoulder => "RIGHT_SHOULDER",
            LandmarkId::LeftElbow => "LEFT_ELBOW",
            LandmarkId::RightElbow => "RIGHT_ELBOW",
            LandmarkId::LeftWrist => "LEFT_WRIST",
            LandmarkId::RightWrist => "RIGHT_WRIST",
            LandmarkId::LeftPinky => "LEFT_PINKY",
            LandmarkId::RightPinky => "RIGHT_PINKY",
            LandmarkId::LeftIndex => "LEFT_INDEX",
            LandmarkId::RightIndex => "RIGHT_INDEX",
            LandmarkId::LeftThumb => "LEFT_THUMB",
            LandmarkId::RightThumb => "RIGHT_THUMB",
            LandmarkId::LeftHip => "LEFT_HIP",
            LandmarkId::RightHip => "RIGHT_HIP",
            LandmarkId::LeftKnee => "LEFT_KNEE",
            LandmarkId::RightKnee => "RIGHT_KNEE",
            LandmarkId::LeftAnkle => "LEFT_ANKLE",
            LandmarkId::RightAnkle => "RIGHT_ANKLE",
            LandmarkId::LeftHeel => "LEFT_HEEL",
            LandmarkId::RightHeel => "RIGHT_HEEL",
            LandmarkId::LeftFootIndex => "LEFT_FOOT_INDEX",
            LandmarkId::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }

    /// Look up a landmark by the upstream model's name.
    ///
    /// Returns `None` for anything outside the fixed topology.
    pub fn from_name(name: &str) -> Option<LandmarkId> {
        LandmarkId::ALL.iter().copied().find(|id| id.name() == name)
    }
}

impl fmt::Display for LandmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single detected body landmark for one frame.
///
/// `x` and `y` are normalized image coordinates in `[0, 1]`; `z` is
/// depth-relative (not image-normalized); `visibility` is the model's
/// confidence in `[0, 1]`. Values are immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// Position as an `(x, y, z)` tuple.
    pub fn position(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

/// One skeleton as reported by the upstream model, landmarks in topology
/// order. Zero detections for a frame are represented upstream by an empty
/// skeleton list, not by an empty `DetectedPose`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPose {
    landmarks: Vec<Landmark>,
}

impl DetectedPose {
    /// Wrap a model output. The landmark list is expected in topology order;
    /// a short list simply makes the trailing landmarks unobservable.
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Landmark data for `id`, if the model reported it.
    pub fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        self.landmarks.get(id.index())
    }

    /// All reported landmarks paired with their identifiers.
    pub fn iter(&self) -> impl Iterator<Item = (LandmarkId, &Landmark)> {
        LandmarkId::ALL
            .iter()
            .copied()
            .zip(self.landmarks.iter())
    }
}

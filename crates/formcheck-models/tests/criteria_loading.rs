//! Criteria document loading from disk.

use std::io::Write;

use formcheck_models::{AssessmentType, CriteriaError, LandmarkId, MovementLibrary, TargetSlope};

const LIBRARY_JSON: &str = r#"{
    "squat": {
        "action_joints": {
            "LEFT_KNEE": ["LEFT_HIP", "LEFT_ANKLE"],
            "RIGHT_KNEE": ["RIGHT_HIP", "RIGHT_ANKLE"]
        },
        "assessment_side": {
            "back_line": {
                "joints": [["SHOULDER", "HIP"]],
                "m": 1.25,
                "assessment_type": "line"
            },
            "shin_torso": {
                "joints": {
                    "first_line": [["KNEE", "ANKLE"]],
                    "second_line": [["SHOULDER", "HIP"]]
                },
                "m": "None",
                "assessment_type": "parallel_lines"
            }
        },
        "assessment_front": {
            "knee_level": {
                "joints": [["LEFT_KNEE", "RIGHT_KNEE"]],
                "m": 0.0,
                "assessment_type": "max_line"
            }
        }
    },
    "push_up": {
        "action_joints": {
            "LEFT_ELBOW": ["LEFT_SHOULDER", "LEFT_WRIST"]
        },
        "assessment_side": {
            "plank": {
                "joints": [["SHOULDER", "ANKLE"]],
                "m": 0.1,
                "assessment_type": "max_line"
            }
        }
    }
}"#;

fn write_criteria(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_a_multi_movement_library_from_disk() {
    let file = write_criteria(LIBRARY_JSON);
    let library = MovementLibrary::from_path(file.path()).unwrap();

    let squat = library.get("squat").unwrap();
    assert_eq!(squat.assessment_side.len(), 2);
    let back_line = &squat.assessment_side["back_line"];
    assert_eq!(back_line.assessment_type, AssessmentType::Line);
    assert_eq!(back_line.m, TargetSlope::Value(1.25));

    let push_up = library.get("push_up").unwrap();
    let sides = push_up.action_joint_sides();
    assert_eq!(sides.len(), 1);
    assert_eq!(sides[0].joint, LandmarkId::LeftElbow);
    assert_eq!(
        sides[0].adjacent,
        [LandmarkId::LeftShoulder, LandmarkId::LeftWrist]
    );
}

#[test]
fn missing_file_surfaces_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = MovementLibrary::from_path(dir.path().join("absent.json"));
    assert!(matches!(result, Err(CriteriaError::Io(_))));
}

#[test]
fn malformed_json_surfaces_parse_error() {
    let file = write_criteria("{ \"squat\": ");
    let result = MovementLibrary::from_path(file.path());
    assert!(matches!(result, Err(CriteriaError::Json(_))));
}

#[test]
fn invalid_landmark_fails_at_load_not_at_lookup() {
    let file = write_criteria(
        r#"{
            "squat": {
                "action_joints": { "LEFT_KNEECAP": ["LEFT_HIP", "LEFT_ANKLE"] }
            }
        }"#,
    );
    let result = MovementLibrary::from_path(file.path());
    assert!(matches!(
        result,
        Err(CriteriaError::UnknownLandmark { name, .. }) if name == "LEFT_KNEECAP"
    ));
}

#[test]
fn library_survives_a_serialization_round_trip() {
    let library = MovementLibrary::from_json_str(LIBRARY_JSON).unwrap();
    let json = serde_json::to_string(&library).unwrap();
    let reloaded = MovementLibrary::from_json_str(&json).unwrap();
    assert_eq!(library, reloaded);
}

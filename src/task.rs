// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Task declared in a model's metadata.
//!
//! Ultralytics exports record which head a model was trained with. Only pose
//! models are usable here, but every task is parsed so a wrong model can be
//! reported by name instead of failing somewhere inside postprocessing.

use std::fmt;
use std::str::FromStr;

/// YOLO model task types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Task {
    /// Object detection.
    Detect,
    /// Instance segmentation.
    Segment,
    /// Pose estimation - predicts keypoints for each detected person.
    #[default]
    Pose,
    /// Image classification.
    Classify,
    /// Oriented bounding box detection.
    Obb,
}

impl Task {
    /// Returns the string representation used in ONNX model metadata.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Segment => "segment",
            Self::Pose => "pose",
            Self::Classify => "classify",
            Self::Obb => "obb",
        }
    }

    /// Returns whether this task produces keypoints.
    #[must_use]
    pub const fn has_keypoints(&self) -> bool {
        matches!(self, Self::Pose)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Task {
    type Err = TaskParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "detect" | "detection" => Ok(Self::Detect),
            "segment" | "segmentation" => Ok(Self::Segment),
            "pose" | "keypoint" | "keypoints" => Ok(Self::Pose),
            "classify" | "classification" | "cls" => Ok(Self::Classify),
            "obb" | "oriented" => Ok(Self::Obb),
            _ => Err(TaskParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid task string.
#[derive(Debug, Clone)]
pub struct TaskParseError(String);

impl fmt::Display for TaskParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid task '{}', expected one of: detect, segment, pose, classify, obb",
            self.0
        )
    }
}

impl std::error::Error for TaskParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_from_str() {
        assert_eq!("pose".parse::<Task>().unwrap(), Task::Pose);
        assert_eq!("Keypoints".parse::<Task>().unwrap(), Task::Pose);
        assert_eq!("detect".parse::<Task>().unwrap(), Task::Detect);
        assert_eq!("cls".parse::<Task>().unwrap(), Task::Classify);
        assert!("tracking".parse::<Task>().is_err());
    }

    #[test]
    fn test_only_pose_has_keypoints() {
        assert!(Task::Pose.has_keypoints());
        assert!(!Task::Detect.has_keypoints());
        assert!(!Task::Segment.has_keypoints());
        assert_eq!(Task::default(), Task::Pose);
    }
}

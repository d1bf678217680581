// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Named body keypoints.
//!
//! YOLO pose models emit the 17 COCO keypoints as an indexed array. This module
//! turns them into a [`KeyPointMap`] keyed by human-readable joint names, which is
//! the shape every consumer downstream of the estimator works with.

use std::collections::HashMap;

/// COCO-Pose keypoint names in model output order.
pub const COCO_KEYPOINTS: [&str; 17] = [
    "Nose",
    "Left Eye",
    "Right Eye",
    "Left Ear",
    "Right Ear",
    "Left Shoulder",
    "Right Shoulder",
    "Left Elbow",
    "Right Elbow",
    "Left Wrist",
    "Right Wrist",
    "Left Hip",
    "Right Hip",
    "Left Knee",
    "Right Knee",
    "Left Ankle",
    "Right Ankle",
];

/// Name of the synthesized neck keypoint.
pub const NECK: &str = "Neck";

/// Joints recorded in every output table, in column order.
pub const JOINT_WHITELIST: [&str; 13] = [
    NECK,
    "Right Shoulder",
    "Right Elbow",
    "Right Wrist",
    "Left Shoulder",
    "Left Elbow",
    "Left Wrist",
    "Right Hip",
    "Right Knee",
    "Right Ankle",
    "Left Hip",
    "Left Knee",
    "Left Ankle",
];

/// A 2D pixel coordinate in original image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal pixel position.
    pub x: f32,
    /// Vertical pixel position.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both components are finite and non-negative.
    ///
    /// Engines commonly report an undetected joint as `(-1, -1)`; such points
    /// fail this check.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x >= 0.0 && self.y >= 0.0
    }

    /// Midpoint between two points.
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Mapping from keypoint name to its coordinate, or `None` if not detected.
pub type KeyPointMap = HashMap<String, Option<Point>>;

/// A single detected person.
#[derive(Debug, Clone, Default)]
pub struct Pose {
    /// Named keypoints for this person.
    pub keypoints: KeyPointMap,
    /// Detection confidence of the person box.
    pub score: f32,
}

impl Pose {
    /// Create a pose from a keypoint map and score.
    #[must_use]
    pub const fn new(keypoints: KeyPointMap, score: f32) -> Self {
        Self { keypoints, score }
    }

    /// Build a pose from raw COCO keypoints `[x, y, conf]`.
    ///
    /// Keypoints with confidence below `threshold` are recorded as absent. The
    /// neck is added as the shoulder midpoint when both shoulders are present.
    #[must_use]
    pub fn from_coco(raw: &[[f32; 3]], score: f32, threshold: f32) -> Self {
        let mut keypoints: KeyPointMap = COCO_KEYPOINTS
            .iter()
            .zip(raw)
            .map(|(name, kpt)| {
                let point = (kpt[2] >= threshold).then(|| Point::new(kpt[0], kpt[1]));
                ((*name).to_string(), point)
            })
            .collect();

        let neck = match (
            keypoints.get("Left Shoulder").copied().flatten(),
            keypoints.get("Right Shoulder").copied().flatten(),
        ) {
            (Some(left), Some(right)) => Some(left.midpoint(&right)),
            _ => None,
        };
        keypoints.insert(NECK.to_string(), neck);

        Self { keypoints, score }
    }

    /// Look up a keypoint by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Point> {
        self.keypoints.get(name).copied().flatten()
    }
}

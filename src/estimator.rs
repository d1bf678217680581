// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The pose estimation seam.
//!
//! The recorder only needs "image in, people out". [`PoseEstimator`] captures
//! that contract so the driver can be exercised with a fake in tests and with
//! [`crate::YOLOPoseModel`] in production.

use std::fmt;

use image::DynamicImage;

use crate::error::Result;
use crate::keypoints::Pose;

/// Identity of a loaded model, reported once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model identifier (file stem or embedded description).
    pub model_id: String,
    /// Inference engine name.
    pub engine: String,
    /// Hardware accelerator the engine runs on.
    pub accelerator: String,
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} on {})",
            self.model_id, self.engine, self.accelerator
        )
    }
}

/// Anything that can find people and their keypoints in an image.
pub trait PoseEstimator {
    /// Detect poses in `image`, most confident first.
    ///
    /// An empty vector means nobody was found; that is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the model output is malformed.
    fn estimate(&mut self, image: &DynamicImage) -> Result<Vec<Pose>>;

    /// Identity of the underlying model.
    fn info(&self) -> ModelInfo;
}

impl<E: PoseEstimator + ?Sized> PoseEstimator for Box<E> {
    fn estimate(&mut self, image: &DynamicImage) -> Result<Vec<Pose>> {
        (**self).estimate(image)
    }

    fn info(&self) -> ModelInfo {
        (**self).info()
    }
}

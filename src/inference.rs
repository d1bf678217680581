// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Inference configuration.
//!
//! [`InferenceConfig`] controls how the pose model is run: detection and
//! keypoint thresholds, NMS, input sizing, and the execution device.

use crate::device::Device;

/// Configuration for YOLO pose inference.
///
/// # Example
///
/// ```rust
/// use pose_recorder::{Device, InferenceConfig};
///
/// let config = InferenceConfig::new()
///     .with_confidence(0.5)
///     .with_keypoint_threshold(0.3)
///     .with_device(Device::Cpu);
/// ```
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Person confidence threshold (0.0 to 1.0).
    pub confidence_threshold: f32,
    /// `IoU` threshold for Non-Maximum Suppression.
    pub iou_threshold: f32,
    /// Maximum number of people returned per image.
    pub max_detections: usize,
    /// Keypoints with confidence below this are reported as absent.
    pub keypoint_threshold: f32,
    /// Explicit input image size (height, width). `None` uses model metadata.
    pub imgsz: Option<(usize, usize)>,
    /// Number of intra-op threads for ONNX Runtime. `0` lets ONNX Runtime decide.
    pub num_threads: usize,
    /// Whether to feed FP16 input regardless of model metadata.
    pub half: bool,
    /// Execution device.
    pub device: Device,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
            keypoint_threshold: 0.5,
            imgsz: None,
            num_threads: 0,
            half: false,
            device: Device::Cpu,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the person confidence threshold.
    #[must_use]
    pub const fn with_confidence(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the IoU threshold for NMS.
    #[must_use]
    pub const fn with_iou(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Set the maximum number of detections per image.
    #[must_use]
    pub const fn with_max_detections(mut self, max: usize) -> Self {
        self.max_detections = max;
        self
    }

    /// Set the keypoint visibility threshold.
    #[must_use]
    pub const fn with_keypoint_threshold(mut self, threshold: f32) -> Self {
        self.keypoint_threshold = threshold;
        self
    }

    /// Set the input image size.
    #[must_use]
    pub const fn with_imgsz(mut self, height: usize, width: usize) -> Self {
        self.imgsz = Some((height, width));
        self
    }

    /// Set the number of intra-op threads.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Enable or disable FP16 input.
    #[must_use]
    pub const fn with_half(mut self, half: bool) -> Self {
        self.half = half;
        self
    }

    /// Set the execution device.
    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }
}

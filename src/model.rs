// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! YOLO pose model loading and inference.
//!
//! [`YOLOPoseModel`] wraps an ONNX Runtime session for an Ultralytics pose
//! export and implements [`PoseEstimator`] on top of it.

use std::collections::HashMap;
use std::path::Path;

use half::f16;
use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::value::TensorRef;

use crate::device::Device;
use crate::download::{DEFAULT_POSE_MODEL, try_download_model};
use crate::error::{RecorderError, Result};
use crate::estimator::{ModelInfo, PoseEstimator};
use crate::inference::InferenceConfig;
use crate::keypoints::Pose;
use crate::metadata::ModelMetadata;
use crate::postprocessing::postprocess_pose;
use crate::preprocessing::preprocess_image;
use crate::warn;

/// Inference engine name reported in [`ModelInfo`].
pub const ENGINE: &str = "ONNX Runtime";

/// Metadata keys Ultralytics writes as individual ONNX properties.
const METADATA_KEYS: [&str; 14] = [
    "description", "author", "date", "version", "license", "docs", "stride", "task",
    "batch", "imgsz", "names", "half", "channels", "kpt_shape",
];

/// A YOLO pose model.
///
/// # Example
///
/// ```no_run
/// use pose_recorder::{PoseEstimator, YOLOPoseModel};
///
/// let mut model = YOLOPoseModel::load("yolo11n-pose.onnx")?;
/// let image = image::open("tree.jpg")?;
/// let poses = model.estimate(&image)?;
/// println!("Found {} people", poses.len());
/// # Ok::<(), pose_recorder::RecorderError>(())
/// ```
pub struct YOLOPoseModel {
    session: Session,
    metadata: ModelMetadata,
    input_name: String,
    output_name: String,
    config: InferenceConfig,
    model_id: String,
    /// Device actually in use; falls back to CPU when the feature is missing.
    device: Device,
    warmed_up: bool,
}

impl YOLOPoseModel {
    /// Load a pose model with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model can't be found, downloaded or loaded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, InferenceConfig::default())
    }

    /// Load a pose model with a custom configuration.
    ///
    /// A missing `yolo11n-pose.onnx` is downloaded first. Models whose metadata
    /// declares a task other than pose are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::ModelLoadError`] if the file is missing and
    /// cannot be downloaded, the session can't be created, or the model is not
    /// a pose model.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: InferenceConfig) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let is_default = path.file_name().and_then(|n| n.to_str()) == Some(DEFAULT_POSE_MODEL);
            if !is_default {
                return Err(RecorderError::ModelLoadError(format!(
                    "Model file not found: {}",
                    path.display()
                )));
            }
            try_download_model(path)?;
        }

        let builder = Session::builder().map_err(|e| {
            RecorderError::ModelLoadError(format!("Failed to create session builder: {e}"))
        })?;
        let (builder, device) = register_device(builder, &config.device)?;

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                RecorderError::ModelLoadError(format!("Failed to set optimization level: {e}"))
            })?
            .with_intra_threads(config.num_threads)
            .map_err(|e| {
                RecorderError::ModelLoadError(format!("Failed to set intra-thread count: {e}"))
            })?
            .commit_from_file(path)
            .map_err(|e| RecorderError::ModelLoadError(format!("Failed to load model: {e}")))?;

        let metadata = extract_metadata(&session)?;
        if !metadata.task.has_keypoints() {
            return Err(RecorderError::ModelLoadError(format!(
                "{} is a {} model, a pose model is required",
                path.display(),
                metadata.task
            )));
        }

        let input_name = session
            .inputs
            .first()
            .map_or_else(|| "images".to_string(), |i| i.name.clone());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| RecorderError::ModelLoadError("Model has no outputs".to_string()))?;

        let model_id = metadata.model_name().map_or_else(
            || {
                path.file_stem()
                    .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
            },
            str::to_string,
        );

        let config = InferenceConfig {
            imgsz: config.imgsz.or(Some(metadata.imgsz)),
            ..config
        };

        Ok(Self {
            session,
            metadata,
            input_name,
            output_name,
            config,
            model_id,
            device,
            warmed_up: false,
        })
    }

    /// Run one dummy inference so the first real image isn't slowed by
    /// allocation and graph setup. Called automatically by [`Self::estimate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the dummy inference fails.
    pub fn warmup(&mut self) -> Result<()> {
        if self.warmed_up {
            return Ok(());
        }
        let (h, w) = self.imgsz();
        let dummy = Array4::<f32>::zeros((1, 3, h, w));
        let dummy_f16 = self.use_half().then(|| dummy.mapv(f16::from_f32));
        self.run_inference(&dummy, dummy_f16.as_ref())?;
        self.warmed_up = true;
        Ok(())
    }

    /// Input size (height, width) actually used for inference.
    #[must_use]
    pub fn imgsz(&self) -> (usize, usize) {
        self.config.imgsz.unwrap_or(self.metadata.imgsz)
    }

    /// Model metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Inference configuration.
    #[must_use]
    pub const fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Device the session runs on.
    #[must_use]
    pub const fn device(&self) -> &Device {
        &self.device
    }

    fn use_half(&self) -> bool {
        self.config.half || self.metadata.half
    }

    /// Run the session, returning flat f32 output data and its shape.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn run_inference(
        &mut self,
        input: &Array4<f32>,
        input_f16: Option<&Array4<f16>>,
    ) -> Result<(Vec<f32>, Vec<usize>)> {
        let run = if let Some(half_input) = input_f16 {
            let contiguous = half_input.as_standard_layout();
            let tensor = TensorRef::from_array_view(&contiguous).map_err(|e| {
                RecorderError::InferenceError(format!("Failed to create input tensor: {e}"))
            })?;
            self.session.run(ort::inputs![self.input_name.as_str() => tensor])
        } else {
            let contiguous = input.as_standard_layout();
            let tensor = TensorRef::from_array_view(&contiguous).map_err(|e| {
                RecorderError::InferenceError(format!("Failed to create input tensor: {e}"))
            })?;
            self.session.run(ort::inputs![self.input_name.as_str() => tensor])
        };
        let outputs =
            run.map_err(|e| RecorderError::InferenceError(format!("Inference failed: {e}")))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            RecorderError::InferenceError(format!("Output '{}' not found", self.output_name))
        })?;

        // FP16 exports may also emit half-precision output
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let shape = shape.iter().map(|&d| d.max(0) as usize).collect();
            return Ok((data.to_vec(), shape));
        }
        let (shape, data) = output.try_extract_tensor::<f16>().map_err(|e| {
            RecorderError::InferenceError(format!("Failed to extract output: {e}"))
        })?;
        let shape = shape.iter().map(|&d| d.max(0) as usize).collect();
        Ok((data.iter().map(|v| v.to_f32()).collect(), shape))
    }
}

impl PoseEstimator for YOLOPoseModel {
    fn estimate(&mut self, image: &DynamicImage) -> Result<Vec<Pose>> {
        self.warmup()?;

        let preprocess = preprocess_image(image, self.imgsz(), self.use_half())?;
        let (output, shape) =
            self.run_inference(&preprocess.tensor, preprocess.tensor_f16.as_ref())?;

        postprocess_pose(
            &output,
            &shape,
            &preprocess,
            &self.config,
            self.metadata.num_classes(),
            self.metadata.kpt_shape,
        )
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            model_id: self.model_id.clone(),
            engine: ENGINE.to_string(),
            accelerator: self.device.accelerator(),
        }
    }
}

impl std::fmt::Debug for YOLOPoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YOLOPoseModel")
            .field("model_id", &self.model_id)
            .field("task", &self.metadata.task)
            .field("imgsz", &self.imgsz())
            .field("kpt_shape", &self.metadata.kpt_shape)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

/// Collect Ultralytics metadata from the session's custom properties.
fn extract_metadata(session: &Session) -> Result<ModelMetadata> {
    let model_metadata = session.metadata().map_err(|e| {
        RecorderError::ModelLoadError(format!("Failed to get model metadata: {e}"))
    })?;

    let lines: Vec<String> = METADATA_KEYS
        .iter()
        .filter_map(|key| match model_metadata.custom(key) {
            Ok(Some(value)) => Some(format!("{key}: {value}")),
            _ => None,
        })
        .collect();
    if !lines.is_empty() {
        return ModelMetadata::from_yaml_str(&lines.join("\n"));
    }

    let combined: HashMap<String, String> = ["metadata", "model_metadata"]
        .iter()
        .filter_map(|key| match model_metadata.custom(key) {
            Ok(Some(value)) => Some(((*key).to_string(), value)),
            _ => None,
        })
        .collect();
    if combined.is_empty() {
        warn!("No Ultralytics metadata found, assuming a COCO pose model");
        return Ok(ModelMetadata::default());
    }
    ModelMetadata::from_onnx_metadata(&combined)
}

/// Register the execution provider for `device`.
///
/// Returns the device actually used: CPU when the matching Cargo feature was
/// not compiled in.
fn register_device(builder: SessionBuilder, device: &Device) -> Result<(SessionBuilder, Device)> {
    #[allow(unused_variables)]
    let ep_error =
        |e: ort::Error| RecorderError::ModelLoadError(format!("Failed to register {device}: {e}"));

    match device {
        Device::Cpu => Ok((builder, Device::Cpu)),
        #[cfg(feature = "cuda")]
        Device::Cuda(id) => {
            use ort::execution_providers::CUDAExecutionProvider;
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let ep = CUDAExecutionProvider::default().with_device_id(*id as i32).build();
            Ok((builder.with_execution_providers([ep]).map_err(ep_error)?, device.clone()))
        }
        #[cfg(feature = "tensorrt")]
        Device::TensorRt(id) => {
            use ort::execution_providers::TensorRTExecutionProvider;
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let ep = TensorRTExecutionProvider::default().with_device_id(*id as i32).build();
            Ok((builder.with_execution_providers([ep]).map_err(ep_error)?, device.clone()))
        }
        #[cfg(feature = "coreml")]
        Device::CoreMl => {
            use ort::execution_providers::CoreMLExecutionProvider;
            let ep = CoreMLExecutionProvider::default().with_subgraphs(true).build();
            Ok((builder.with_execution_providers([ep]).map_err(ep_error)?, device.clone()))
        }
        #[cfg(feature = "openvino")]
        Device::OpenVino => {
            use ort::execution_providers::OpenVINOExecutionProvider;
            let ep = OpenVINOExecutionProvider::default().build();
            Ok((builder.with_execution_providers([ep]).map_err(ep_error)?, device.clone()))
        }
        #[cfg(feature = "directml")]
        Device::DirectMl(id) => {
            use ort::execution_providers::DirectMLExecutionProvider;
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let ep = DirectMLExecutionProvider::default().with_device_id(*id as i32).build();
            Ok((builder.with_execution_providers([ep]).map_err(ep_error)?, device.clone()))
        }
        #[allow(unreachable_patterns)]
        other => {
            warn!(
                "{other} requested but the '{}' feature is not enabled, falling back to CPU",
                other.feature().unwrap_or_default()
            );
            Ok((builder, Device::Cpu))
        }
    }
}

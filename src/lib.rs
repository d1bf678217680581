// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Yoga Pose Recorder
//!
//! Batch-extracts body joint coordinates from folders of yoga pose images with an
//! [Ultralytics](https://ultralytics.com) YOLO pose model running on ONNX Runtime,
//! and writes one CSV file per pose category.
//!
//! ## Pipeline
//!
//! For each category `<base_dir>/<category>/`:
//!
//! 1. every image is decoded and passed through the pose model,
//! 2. the most confident person is kept and reduced to 13 whitelisted joints
//!    (`Neck`, shoulders, elbows, wrists, hips, knees, ankles),
//! 3. one row of 26 `x`/`y` columns is appended per image with a person,
//! 4. `<category>.csv` is written once the directory is exhausted.
//!
//! Joints the model didn't find are left blank, never zero. Images with nobody
//! in them or that fail to decode are logged and skipped.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use pose_recorder::{InferenceConfig, Recorder, RecorderConfig, YOLOPoseModel};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = YOLOPoseModel::load_with_config(
//!         "yolo11n-pose.onnx",
//!         InferenceConfig::new().with_keypoint_threshold(0.5),
//!     )?;
//!
//!     let config = RecorderConfig::new()
//!         .with_base_dir("images/downloads")
//!         .with_categories(["Tree_Pose_or_Vrksasana_"]);
//!
//!     for report in Recorder::new(model, config).run() {
//!         println!("{}: {} rows", report.category, report.rows);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Estimators
//!
//! [`Recorder`] works with anything implementing [`PoseEstimator`], which makes
//! the batch logic testable without a model file.
//!
//! ## Cargo Features
//!
//! | Feature    | Execution provider |
//! |------------|--------------------|
//! | `cuda`     | NVIDIA CUDA        |
//! | `tensorrt` | NVIDIA `TensorRT`  |
//! | `coreml`   | Apple `CoreML`     |
//! | `openvino` | Intel `OpenVINO`   |
//! | `directml` | `DirectML`         |

pub mod cli;
pub mod device;
pub mod download;
pub mod error;
pub mod estimator;
pub mod inference;
pub mod keypoints;
pub mod metadata;
pub mod model;
pub mod postprocessing;
pub mod preprocessing;
pub mod recorder;
pub mod row;
pub mod source;
pub mod table;
pub mod task;
pub mod utils;

// Re-export main types for convenience
pub use device::Device;
pub use error::{RecorderError, Result};
pub use estimator::{ModelInfo, PoseEstimator};
pub use inference::InferenceConfig;
pub use keypoints::{COCO_KEYPOINTS, JOINT_WHITELIST, KeyPointMap, NECK, Point, Pose};
pub use model::YOLOPoseModel;
pub use recorder::{
    CategoryReport, ImageOutcome, POSE_CATEGORIES, Recorder, RecorderConfig, diagnostic,
};
pub use row::{PoseRow, build_row, header_for};
pub use source::CategorySource;
pub use table::PoseTable;
pub use task::Task;

// Re-export metadata for advanced use
pub use metadata::ModelMetadata;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

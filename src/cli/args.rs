// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::Parser;

use crate::device::Device;
use crate::download::DEFAULT_POSE_MODEL;
use crate::inference::InferenceConfig;
use crate::recorder::{DEFAULT_BASE_DIR, RecorderConfig};

/// Largest YOLO pose output stride.
const STRIDE: usize = 32;

/// Record yoga pose keypoints from image folders into one CSV per pose.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"Every flag is optional. With no arguments the five default pose
categories are read from images/downloads/<category>/ and written to
./<category>.csv using yolo11n-pose.onnx (downloaded if missing).

Examples:
    pose-recorder
    pose-recorder --category Tree_Pose_or_Vrksasana_ --output-dir results
    pose-recorder -m yolo11s-pose.onnx -b ~/datasets/yoga --kpt-conf 0.3
    pose-recorder --device cuda:0 --half"#)]
pub struct Cli {
    /// Path to ONNX pose model file
    #[arg(short, long, default_value = DEFAULT_POSE_MODEL)]
    pub model: PathBuf,

    /// Directory containing one subdirectory per pose category
    #[arg(short, long, default_value = DEFAULT_BASE_DIR)]
    pub base_dir: PathBuf,

    /// Directory to write the CSV files to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Pose category to process (repeatable; default: all five reference categories)
    #[arg(short, long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Person confidence threshold
    #[arg(long, default_value_t = 0.25, value_parser = parse_unit)]
    pub conf: f32,

    /// `IoU` threshold for NMS
    #[arg(long, default_value_t = 0.45, value_parser = parse_unit)]
    pub iou: f32,

    /// Keypoint confidence below which a joint is left blank
    #[arg(long, default_value_t = 0.5, value_parser = parse_unit)]
    pub kpt_conf: f32,

    /// Inference image size (square, multiple of 32)
    #[arg(long, value_parser = parse_imgsz)]
    pub imgsz: Option<usize>,

    /// Use FP16 half-precision input
    #[arg(long, default_value_t = false)]
    pub half: bool,

    /// Device to use (cpu, cuda:0, tensorrt:0, coreml, openvino, directml:0)
    #[arg(long, default_value = "cpu")]
    pub device: Device,

    /// ONNX Runtime intra-op threads (0 = automatic)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

impl Cli {
    /// Model inference settings from the flags.
    #[must_use]
    pub fn inference_config(&self) -> InferenceConfig {
        let config = InferenceConfig::new()
            .with_confidence(self.conf)
            .with_iou(self.iou)
            .with_keypoint_threshold(self.kpt_conf)
            .with_half(self.half)
            .with_threads(self.threads)
            .with_device(self.device.clone());
        match self.imgsz {
            Some(size) => config.with_imgsz(size, size),
            None => config,
        }
    }

    /// Batch layout from the flags.
    #[must_use]
    pub fn recorder_config(&self) -> RecorderConfig {
        let config = RecorderConfig::new()
            .with_base_dir(&self.base_dir)
            .with_output_dir(&self.output_dir);
        if self.categories.is_empty() {
            config
        } else {
            config.with_categories(self.categories.iter().cloned())
        }
    }
}

/// Parse a threshold in `[0, 1]`.
fn parse_unit(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in [0, 1]"))
    }
}

/// Parse a square input size: positive and a multiple of the model stride.
fn parse_imgsz(s: &str) -> Result<usize, String> {
    let value: usize = s.parse().map_err(|_| format!("'{s}' is not a whole number"))?;
    if value > 0 && value % STRIDE == 0 {
        Ok(value)
    } else {
        Err(format!("{value} is not a positive multiple of {STRIDE}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::POSE_CATEGORIES;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_uses_reference_defaults() {
        let cli = Cli::parse_from(["pose-recorder"]);
        assert_eq!(cli.model, PathBuf::from("yolo11n-pose.onnx"));
        assert_eq!(cli.base_dir, PathBuf::from("images/downloads"));
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert!(cli.categories.is_empty());
        assert_eq!(cli.device, Device::Cpu);
        assert!(cli.verbose);

        let recorder = cli.recorder_config();
        assert_eq!(recorder.categories, POSE_CATEGORIES);

        let inference = cli.inference_config();
        assert!((inference.confidence_threshold - 0.25).abs() < f32::EPSILON);
        assert!((inference.keypoint_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(inference.imgsz, None);
    }

    #[test]
    fn test_custom_arguments() {
        let cli = Cli::parse_from([
            "pose-recorder",
            "-m",
            "custom-pose.onnx",
            "-b",
            "data",
            "-o",
            "out",
            "-c",
            "Tree_Pose_or_Vrksasana_",
            "--category",
            "Warrior_I_Pose_or_Virabhadrasana_I_",
            "--kpt-conf",
            "0.3",
            "--imgsz",
            "320",
            "--device",
            "cuda:1",
            "--verbose",
            "false",
        ]);
        assert_eq!(cli.model, PathBuf::from("custom-pose.onnx"));
        assert!(!cli.verbose);

        let recorder = cli.recorder_config();
        assert_eq!(recorder.base_dir, PathBuf::from("data"));
        assert_eq!(
            recorder.categories,
            ["Tree_Pose_or_Vrksasana_", "Warrior_I_Pose_or_Virabhadrasana_I_"]
        );
        assert_eq!(
            recorder.output_path("Tree_Pose_or_Vrksasana_"),
            PathBuf::from("out/Tree_Pose_or_Vrksasana_.csv")
        );

        let inference = cli.inference_config();
        assert!((inference.keypoint_threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(inference.imgsz, Some((320, 320)));
        assert_eq!(inference.device, Device::Cuda(1));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["pose-recorder", "--conf", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["pose-recorder", "--device", "tpu"]).is_err());
    }

    #[test]
    fn test_imgsz_must_be_stride_multiple() {
        for bad in ["0", "100", "-32", "abc"] {
            assert!(
                Cli::try_parse_from(["pose-recorder", "--imgsz", bad]).is_err(),
                "--imgsz {bad} should be rejected"
            );
        }
        let cli = Cli::try_parse_from(["pose-recorder", "--imgsz", "640"]).unwrap();
        assert_eq!(cli.imgsz, Some(640));
    }
}

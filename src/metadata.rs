// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX model metadata parsing.
//!
//! Ultralytics exports embed a small YAML document in the ONNX custom metadata.
//! Only the handful of fields the pose pipeline needs are extracted here.

use std::collections::HashMap;

use crate::error::{RecorderError, Result};
use crate::task::Task;

/// Metadata extracted from an Ultralytics YOLO ONNX model.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    /// Model description (e.g., "Ultralytics YOLO11n-pose model trained on coco-pose.yaml").
    pub description: String,
    /// Ultralytics version used for export.
    pub version: String,
    /// The task this model performs.
    pub task: Task,
    /// Model stride (typically 32 for YOLO).
    pub stride: u32,
    /// Input image size as (height, width).
    pub imgsz: (usize, usize),
    /// Whether the model uses FP16 (half precision).
    pub half: bool,
    /// Keypoint shape as (count, dims), e.g. (17, 3).
    pub kpt_shape: (usize, usize),
    /// Class ID to class name mapping.
    pub names: HashMap<usize, String>,
}

impl ModelMetadata {
    /// Parse metadata from ONNX custom metadata properties.
    ///
    /// # Errors
    ///
    /// Returns an error if no Ultralytics metadata is present or it is malformed.
    pub fn from_onnx_metadata(metadata_map: &HashMap<String, String>) -> Result<Self> {
        let yaml_str = metadata_map
            .get("metadata")
            .or_else(|| metadata_map.values().find(|v| v.contains("task:")))
            .ok_or_else(|| {
                RecorderError::MetadataError(
                    "No Ultralytics metadata found in ONNX model".to_string(),
                )
            })?;

        Self::from_yaml_str(yaml_str)
    }

    /// Parse metadata from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if a recognized field has an invalid value.
    pub fn from_yaml_str(yaml_str: &str) -> Result<Self> {
        let mut metadata = Self::default();

        for line in yaml_str.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('\'').trim_matches('"');

            match key {
                "description" => metadata.description = value.to_string(),
                "version" => metadata.version = value.to_string(),
                "task" => {
                    metadata.task = value.parse().map_err(|e| {
                        RecorderError::MetadataError(format!("Invalid task in metadata: {e}"))
                    })?;
                }
                "stride" => {
                    metadata.stride = value.parse().map_err(|_| {
                        RecorderError::MetadataError(format!("Invalid stride value: {value}"))
                    })?;
                }
                "half" => metadata.half = value == "true" || value == "True",
                "kpt_shape" => {
                    if let Some((count, dims)) = parse_pair(value) {
                        metadata.kpt_shape = (count, dims);
                    }
                }
                "imgsz" => {
                    if let Some(pair) = parse_pair(value) {
                        metadata.imgsz = pair;
                    }
                }
                _ => {}
            }
        }

        // Multi-line list form of imgsz and kpt_shape
        if let Some(pair) = parse_block_pair(yaml_str, "imgsz:") {
            metadata.imgsz = pair;
        }
        if let Some(pair) = parse_block_pair(yaml_str, "kpt_shape:") {
            metadata.kpt_shape = pair;
        }

        metadata.names = parse_names(yaml_str);

        Ok(metadata)
    }

    /// Short model name taken from the description, e.g. `YOLO11n-pose`.
    #[must_use]
    pub fn model_name(&self) -> Option<&str> {
        self.description
            .split_whitespace()
            .find(|word| word.starts_with("YOLO"))
    }

    /// Get the number of classes in this model.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.names.len()
    }
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            version: String::new(),
            task: Task::Pose,
            stride: 32,
            imgsz: (640, 640),
            half: false,
            kpt_shape: (17, 3),
            names: HashMap::from([(0, "person".to_string())]),
        }
    }
}

/// Parse an inline list like `[640, 640]`.
fn parse_pair(value: &str) -> Option<(usize, usize)> {
    let inner = value.strip_prefix('[')?.strip_suffix(']')?;
    let values: Vec<usize> = inner
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    (values.len() >= 2).then(|| (values[0], values[1]))
}

/// Parse a YAML block list following `key`, e.g. `imgsz:\n- 640\n- 640`.
fn parse_block_pair(yaml_str: &str, key: &str) -> Option<(usize, usize)> {
    let mut lines = yaml_str.lines().skip_while(|l| !l.trim_start().starts_with(key));
    let header = lines.next()?;
    if !header.trim().ends_with(':') {
        return None;
    }

    let values: Vec<usize> = lines
        .map(str::trim)
        .take_while(|l| l.starts_with('-'))
        .filter_map(|l| l.trim_start_matches('-').trim().parse().ok())
        .take(2)
        .collect();
    (values.len() == 2).then(|| (values[0], values[1]))
}

/// Parse `names` in either Python dict (`{0: 'person'}`) or YAML block form.
fn parse_names(yaml_str: &str) -> HashMap<usize, String> {
    let mut names = HashMap::new();

    let Some(start) = yaml_str.find("names:") else {
        return HashMap::from([(0, "person".to_string())]);
    };
    let after = &yaml_str[start + "names:".len()..];

    if let Some(dict) = after.trim_start().strip_prefix('{') {
        let dict = dict.split('}').next().unwrap_or_default();
        for entry in dict.split(',') {
            if let Some((key, value)) = entry.split_once(':')
                && let Ok(id) = key.trim().parse::<usize>()
            {
                let value = value.trim().trim_matches('\'').trim_matches('"');
                names.insert(id, value.to_string());
            }
        }
    } else {
        for line in after.lines().skip(1) {
            let trimmed = line.trim();
            let Some((key, value)) = trimmed.split_once(':') else {
                break;
            };
            let Ok(id) = key.trim().parse::<usize>() else {
                break;
            };
            names.insert(id, value.trim().trim_matches('\'').trim_matches('"').to_string());
        }
    }

    if names.is_empty() {
        names.insert(0, "person".to_string());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSE_METADATA: &str = r#"
description: Ultralytics YOLO11n-pose model trained on /usr/src/ultralytics/ultralytics/cfg/datasets/coco-pose.yaml
author: Ultralytics
date: '2025-12-11T20:19:45.464021'
version: 8.3.236
license: AGPL-3.0 License (https://ultralytics.com/license)
docs: https://docs.ultralytics.com
stride: 32
task: pose
batch: 1
imgsz:
- 640
- 640
names:
  0: person
kpt_shape:
- 17
- 3
channels: 3
"#;

    #[test]
    fn test_parse_pose_metadata() {
        let metadata = ModelMetadata::from_yaml_str(POSE_METADATA).unwrap();

        assert_eq!(metadata.task, Task::Pose);
        assert_eq!(metadata.stride, 32);
        assert_eq!(metadata.imgsz, (640, 640));
        assert_eq!(metadata.kpt_shape, (17, 3));
        assert_eq!(metadata.num_classes(), 1);
        assert_eq!(metadata.names.get(&0).map(String::as_str), Some("person"));
        assert_eq!(metadata.version, "8.3.236");
        assert_eq!(metadata.model_name(), Some("YOLO11n-pose"));
        assert!(!metadata.half);
    }

    #[test]
    fn test_parse_inline_forms() {
        let yaml = "task: pose\nimgsz: [480, 640]\nkpt_shape: [17, 3]\nhalf: true\nnames: {0: 'person'}";
        let metadata = ModelMetadata::from_yaml_str(yaml).unwrap();
        assert_eq!(metadata.imgsz, (480, 640));
        assert_eq!(metadata.kpt_shape, (17, 3));
        assert!(metadata.half);
        assert_eq!(metadata.num_classes(), 1);
    }

    #[test]
    fn test_detect_task_is_parsed() {
        let metadata = ModelMetadata::from_yaml_str("task: detect").unwrap();
        assert_eq!(metadata.task, Task::Detect);
    }

    #[test]
    fn test_invalid_task_is_error() {
        let err = ModelMetadata::from_yaml_str("task: dance").unwrap_err();
        assert!(matches!(err, RecorderError::MetadataError(_)));
    }

    #[test]
    fn test_missing_metadata() {
        let err = ModelMetadata::from_onnx_metadata(&HashMap::new()).unwrap_err();
        assert!(matches!(err, RecorderError::MetadataError(_)));
    }
}

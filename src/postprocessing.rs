// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Decoding of raw YOLO pose output into [`Pose`]s.
//!
//! The pose head emits one row per anchor: `[cx, cy, w, h, class scores...,
//! kpt0_x, kpt0_y, kpt0_conf, ...]`. Exports differ on whether the tensor is
//! `[1, features, preds]` or `[1, preds, features]`, so both are accepted.

use ndarray::{Array2, ArrayView2, s};

use crate::error::{RecorderError, Result};
use crate::inference::InferenceConfig;
use crate::keypoints::Pose;
use crate::preprocessing::{PreprocessResult, clip_coords, scale_coords, scale_point};
use crate::utils::{nms, score_desc};

/// A person candidate before NMS.
struct Candidate {
    bbox: [f32; 4],
    score: f32,
    keypoints: Vec<[f32; 3]>,
}

/// Decode pose model output into people, most confident first.
///
/// # Arguments
///
/// * `output` - Flat output tensor data.
/// * `output_shape` - Output tensor shape, `[1, F, N]`, `[1, N, F]` or 2-D.
/// * `preprocess` - Letterbox parameters used to map points back to the image.
/// * `config` - Thresholds and detection limit.
/// * `num_classes` - Number of class score columns (1 for COCO pose).
/// * `kpt_shape` - Keypoint count and values per keypoint (2 or 3).
///
/// # Errors
///
/// Returns [`RecorderError::PostProcessingError`] if the shape does not match
/// the expected feature layout or the data length.
pub fn postprocess_pose(
    output: &[f32],
    output_shape: &[usize],
    preprocess: &PreprocessResult,
    config: &InferenceConfig,
    num_classes: usize,
    kpt_shape: (usize, usize),
) -> Result<Vec<Pose>> {
    let num_classes = num_classes.max(1);
    let (num_keypoints, kpt_dim) = kpt_shape;
    if !(2..=3).contains(&kpt_dim) {
        return Err(RecorderError::PostProcessingError(format!(
            "Unsupported keypoint dimension {kpt_dim}, expected 2 or 3"
        )));
    }
    let features = 4 + num_classes + num_keypoints * kpt_dim;

    let (num_preds, transposed) = parse_pose_shape(output_shape, features)?;
    if num_preds == 0 || output.is_empty() {
        return Ok(Vec::new());
    }
    if output.len() != num_preds * features {
        return Err(RecorderError::PostProcessingError(format!(
            "Output has {} values, expected {num_preds}x{features}",
            output.len()
        )));
    }

    // Row-major [preds, features]
    let rows: Array2<f32> = if transposed {
        ArrayView2::from_shape((num_preds, features), output)
            .map_err(|e| RecorderError::PostProcessingError(e.to_string()))?
            .to_owned()
    } else {
        ArrayView2::from_shape((features, num_preds), output)
            .map_err(|e| RecorderError::PostProcessingError(e.to_string()))?
            .t()
            .to_owned()
    };

    let kpt_start = 4 + num_classes;
    let mut candidates = Vec::new();

    for row in rows.outer_iter() {
        let score = row
            .slice(s![4..kpt_start])
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(0.0_f32, f32::max);
        if score < config.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let xyxy = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];
        let bbox = clip_coords(
            &scale_coords(&xyxy, preprocess.scale, preprocess.padding),
            preprocess.orig_shape,
        );

        let keypoints = (0..num_keypoints)
            .map(|k| {
                let offset = kpt_start + k * kpt_dim;
                let (x, y) =
                    scale_point(row[offset], row[offset + 1], preprocess.scale, preprocess.padding);
                let conf = if kpt_dim == 3 { row[offset + 2] } else { 1.0 };
                clip_keypoint([x, y, conf], preprocess.orig_shape)
            })
            .collect();

        candidates.push(Candidate {
            bbox,
            score,
            keypoints,
        });
    }

    let boxes: Vec<([f32; 4], f32)> = candidates.iter().map(|c| (c.bbox, c.score)).collect();
    let keep = nms(&boxes, config.iou_threshold);

    let mut poses: Vec<Pose> = keep
        .into_iter()
        .take(config.max_detections)
        .map(|i| {
            let c = &candidates[i];
            Pose::from_coco(&c.keypoints, c.score, config.keypoint_threshold)
        })
        .collect();
    poses.sort_by(|a, b| score_desc(a.score, b.score));

    Ok(poses)
}

/// Work out `(num_preds, transposed)` from the output shape.
///
/// `transposed` means the layout is `[preds, features]`.
fn parse_pose_shape(shape: &[usize], features: usize) -> Result<(usize, bool)> {
    let dims = match shape {
        [1, a, b] | [a, b] => (*a, *b),
        _ => {
            return Err(RecorderError::PostProcessingError(format!(
                "Unexpected pose output shape {shape:?}"
            )));
        }
    };

    match dims {
        (a, b) if a == features => Ok((b, false)),
        (a, b) if b == features => Ok((a, true)),
        (a, b) => Err(RecorderError::PostProcessingError(format!(
            "Pose output shape [{a}, {b}] has no axis of {features} features"
        ))),
    }
}

/// Clamp a keypoint into image bounds, leaving non-finite values untouched.
#[allow(clippy::cast_precision_loss)]
fn clip_keypoint([x, y, conf]: [f32; 3], (h, w): (u32, u32)) -> [f32; 3] {
    let clamp = |v: f32, max: f32| if v.is_finite() { v.clamp(0.0, max) } else { v };
    [clamp(x, w as f32), clamp(y, h as f32), conf]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::NECK;

    const FEATURES: usize = 56;

    fn identity_preprocess() -> PreprocessResult {
        PreprocessResult {
            tensor: ndarray::Array4::zeros((1, 3, 640, 640)),
            tensor_f16: None,
            orig_shape: (640, 640),
            scale: (1.0, 1.0),
            padding: (0.0, 0.0),
        }
    }

    /// Write one person into a `[features, preds]` layout.
    fn put_person(output: &mut [f32], preds: usize, idx: usize, center: f32, score: f32, kpt_conf: f32) {
        output[idx] = center;
        output[idx + preds] = center;
        output[idx + preds * 2] = 50.0;
        output[idx + preds * 3] = 50.0;
        output[idx + preds * 4] = score;
        for k in 0..17 {
            let offset = 5 + k * 3;
            output[idx + preds * offset] = center + k as f32;
            output[idx + preds * (offset + 1)] = center;
            output[idx + preds * (offset + 2)] = kpt_conf;
        }
    }

    #[test]
    fn test_postprocess_pose_logic() {
        let preds = 100;
        let mut output = vec![0.0; preds * FEATURES];
        put_person(&mut output, preds, 0, 100.0, 0.9, 0.8);

        let poses = postprocess_pose(
            &output,
            &[1, FEATURES, preds],
            &identity_preprocess(),
            &InferenceConfig::default(),
            1,
            (17, 3),
        )
        .unwrap();

        assert_eq!(poses.len(), 1);
        let nose = poses[0].get("Nose").unwrap();
        assert!((nose.x - 100.0).abs() < 1e-4);
        assert!((nose.y - 100.0).abs() < 1e-4);
        assert!(poses[0].get(NECK).is_some());
        assert!((poses[0].score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_transposed_layout() {
        let preds = 3;
        let mut columns = vec![0.0; preds * FEATURES];
        put_person(&mut columns, preds, 1, 200.0, 0.7, 0.9);

        // Re-lay out as [preds, features]
        let mut rows = vec![0.0; preds * FEATURES];
        for f in 0..FEATURES {
            for p in 0..preds {
                rows[p * FEATURES + f] = columns[f * preds + p];
            }
        }

        let poses = postprocess_pose(
            &rows,
            &[1, preds, FEATURES],
            &identity_preprocess(),
            &InferenceConfig::default(),
            1,
            (17, 3),
        )
        .unwrap();
        assert_eq!(poses.len(), 1);
        assert!((poses[0].get("Nose").unwrap().x - 200.0).abs() < 1e-4);
    }

    #[test]
    fn test_low_keypoint_confidence_is_absent() {
        let preds = 10;
        let mut output = vec![0.0; preds * FEATURES];
        put_person(&mut output, preds, 0, 100.0, 0.9, 0.2);

        let poses = postprocess_pose(
            &output,
            &[1, FEATURES, preds],
            &identity_preprocess(),
            &InferenceConfig::default(),
            1,
            (17, 3),
        )
        .unwrap();
        assert_eq!(poses.len(), 1);
        assert!(poses[0].get("Nose").is_none());
        assert!(poses[0].get(NECK).is_none());
    }

    #[test]
    fn test_overlapping_people_suppressed_and_sorted() {
        let preds = 10;
        let mut output = vec![0.0; preds * FEATURES];
        put_person(&mut output, preds, 0, 100.0, 0.6, 0.8);
        put_person(&mut output, preds, 1, 102.0, 0.8, 0.8);
        put_person(&mut output, preds, 2, 400.0, 0.95, 0.8);
        put_person(&mut output, preds, 3, 500.0, 0.1, 0.8);

        let poses = postprocess_pose(
            &output,
            &[1, FEATURES, preds],
            &identity_preprocess(),
            &InferenceConfig::default(),
            1,
            (17, 3),
        )
        .unwrap();

        assert_eq!(poses.len(), 2);
        assert!((poses[0].score - 0.95).abs() < 1e-6);
        assert!((poses[1].score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_max_detections() {
        let preds = 10;
        let mut output = vec![0.0; preds * FEATURES];
        put_person(&mut output, preds, 0, 100.0, 0.9, 0.8);
        put_person(&mut output, preds, 1, 400.0, 0.8, 0.8);

        let config = InferenceConfig::default().with_max_detections(1);
        let poses = postprocess_pose(
            &output,
            &[1, FEATURES, preds],
            &identity_preprocess(),
            &config,
            1,
            (17, 3),
        )
        .unwrap();
        assert_eq!(poses.len(), 1);
        assert!((poses[0].score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_empty_output() {
        let poses = postprocess_pose(
            &[],
            &[1, FEATURES, 0],
            &identity_preprocess(),
            &InferenceConfig::default(),
            1,
            (17, 3),
        )
        .unwrap();
        assert!(poses.is_empty());
    }

    #[test]
    fn test_malformed_shape_is_error() {
        let output = vec![0.0; 84 * 10];
        let err = postprocess_pose(
            &output,
            &[1, 84, 10],
            &identity_preprocess(),
            &InferenceConfig::default(),
            1,
            (17, 3),
        )
        .unwrap_err();
        assert!(matches!(err, RecorderError::PostProcessingError(_)));

        let err = postprocess_pose(
            &output,
            &[840],
            &identity_preprocess(),
            &InferenceConfig::default(),
            1,
            (17, 3),
        )
        .unwrap_err();
        assert!(matches!(err, RecorderError::PostProcessingError(_)));
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let output = vec![0.0; FEATURES * 9];
        let err = postprocess_pose(
            &output,
            &[1, FEATURES, 10],
            &identity_preprocess(),
            &InferenceConfig::default(),
            1,
            (17, 3),
        )
        .unwrap_err();
        assert!(matches!(err, RecorderError::PostProcessingError(_)));
    }

    #[test]
    fn test_clip_keypoint() {
        assert_eq!(clip_keypoint([-5.0, 700.0, 0.9], (480, 640)), [0.0, 480.0, 0.9]);
        assert!(clip_keypoint([f32::NAN, 1.0, 0.9], (480, 640))[0].is_nan());
    }
}

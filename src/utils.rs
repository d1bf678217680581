// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Box overlap utilities for postprocessing.

use std::cmp::Ordering;

/// Calculate `IoU` (Intersection over Union) between two boxes `[x1, y1, x2, y2]`.
///
/// Returns a value between 0.0 and 1.0.
#[must_use]
pub fn calculate_iou(box1: &[f32; 4], box2: &[f32; 4]) -> f32 {
    let x1 = box1[0].max(box2[0]);
    let y1 = box1[1].max(box2[1]);
    let x2 = box1[2].min(box2[2]);
    let y2 = box1[3].min(box2[3]);

    let intersection = ((x2 - x1).max(0.0)) * ((y2 - y1).max(0.0));

    let area1 = (box1[2] - box1[0]) * (box1[3] - box1[1]);
    let area2 = (box2[2] - box2[0]) * (box2[3] - box2[1]);
    let union = area1 + area2 - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Non-Maximum Suppression over `(bbox, score)` candidates.
///
/// Returns indices of kept boxes, highest score first. NaN scores sort last.
#[must_use]
pub fn nms(boxes: &[([f32; 4], f32)], iou_threshold: f32) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..boxes.len()).collect();
    indices.sort_by(|&a, &b| score_desc(boxes[a].1, boxes[b].1));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for (pos, &i) in indices.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        for &j in &indices[pos + 1..] {
            if !suppressed[j] && calculate_iou(&boxes[i].0, &boxes[j].0) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Compare two scores descending, treating NaN as lowest.
#[must_use]
pub fn score_desc(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

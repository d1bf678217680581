// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Whitelist filtering and row construction.
//!
//! Everything here is pure: a detected keypoint map goes in, a fixed-width row
//! of optional coordinates comes out. No image or file I/O is involved.

use crate::keypoints::{KeyPointMap, Point};

/// One output row: a coordinate (or nothing) per whitelisted joint.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseRow {
    cells: Vec<Option<Point>>,
}

impl PoseRow {
    /// Create a row from cells already in column order.
    #[must_use]
    pub const fn from_cells(cells: Vec<Option<Point>>) -> Self {
        Self { cells }
    }

    /// Number of joints in the row (half the column count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no joints at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in column order.
    #[must_use]
    pub fn cells(&self) -> &[Option<Point>] {
        &self.cells
    }

    /// Number of joints with a coordinate.
    #[must_use]
    pub fn present(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Flatten into `x, y` string fields; absent joints become empty strings.
    #[must_use]
    pub fn to_record(&self) -> Vec<String> {
        self.cells
            .iter()
            .flat_map(|cell| match cell {
                Some(p) => [p.x.to_string(), p.y.to_string()],
                None => [String::new(), String::new()],
            })
            .collect()
    }
}

/// Build the CSV header for a whitelist: `"<name> x", "<name> y"` per joint.
#[must_use]
pub fn header_for(whitelist: &[&str]) -> Vec<String> {
    whitelist
        .iter()
        .flat_map(|name| [format!("{name} x"), format!("{name} y")])
        .collect()
}

/// Build a row from a detected keypoint map.
///
/// Only names in `whitelist` are looked up, in `whitelist` order, so anything
/// else in `keypoints` is dropped. Missing names, undetected joints, and
/// malformed coordinates (see [`Point::is_valid`]) all yield an empty cell.
#[must_use]
pub fn build_row(keypoints: &KeyPointMap, whitelist: &[&str]) -> PoseRow {
    let cells = whitelist
        .iter()
        .map(|name| {
            keypoints
                .get(*name)
                .copied()
                .flatten()
                .filter(Point::is_valid)
        })
        .collect();
    PoseRow { cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::JOINT_WHITELIST;

    fn full_map() -> KeyPointMap {
        JOINT_WHITELIST
            .iter()
            .enumerate()
            .map(|(i, name)| {
                #[allow(clippy::cast_precision_loss)]
                let v = i as f32;
                ((*name).to_string(), Some(Point::new(v, v * 2.0)))
            })
            .collect()
    }

    #[test]
    fn test_header_for_whitelist() {
        let header = header_for(&JOINT_WHITELIST);
        assert_eq!(header.len(), 26);
        assert_eq!(header[0], "Neck x");
        assert_eq!(header[1], "Neck y");
        assert_eq!(header[25], "Left Ankle y");
    }

    #[test]
    fn test_build_row_full() {
        let row = build_row(&full_map(), &JOINT_WHITELIST);
        assert_eq!(row.len(), 13);
        assert_eq!(row.present(), 13);
        assert_eq!(row.cells()[3], Some(Point::new(3.0, 6.0)));
    }

    #[test]
    fn test_build_row_ignores_non_whitelisted() {
        let mut map = full_map();
        map.insert("Nose".to_string(), Some(Point::new(999.0, 999.0)));
        map.insert("Left Eye".to_string(), Some(Point::new(998.0, 998.0)));

        let row = build_row(&map, &JOINT_WHITELIST);
        assert_eq!(row, build_row(&full_map(), &JOINT_WHITELIST));
        assert!(!row.to_record().iter().any(|v| v.starts_with("99")));
    }

    #[test]
    fn test_build_row_missing_joint_is_blank_not_zero() {
        let mut map = full_map();
        map.remove("Neck");
        map.insert("Left Knee".to_string(), None);

        let row = build_row(&map, &JOINT_WHITELIST);
        assert_eq!(row.len(), 13);
        assert_eq!(row.present(), 11);

        let record = row.to_record();
        assert_eq!(record.len(), 26);
        assert_eq!(record[0], "");
        assert_eq!(record[1], "");
        assert_eq!(record[22], "");
        assert_eq!(record[23], "");
        assert_eq!(record[2], "1");
    }

    #[test]
    fn test_build_row_malformed_coordinate_is_blank() {
        let mut map = full_map();
        map.insert("Right Wrist".to_string(), Some(Point::new(-1.0, -1.0)));
        map.insert("Left Wrist".to_string(), Some(Point::new(f32::NAN, 4.0)));

        let row = build_row(&map, &JOINT_WHITELIST);
        assert_eq!(row.cells()[3], None);
        assert_eq!(row.cells()[6], None);
        assert_eq!(row.present(), 11);
    }

    #[test]
    fn test_build_row_empty_map() {
        let row = build_row(&KeyPointMap::new(), &JOINT_WHITELIST);
        assert_eq!(row.len(), 13);
        assert_eq!(row.present(), 0);
        assert!(row.to_record().iter().all(String::is_empty));
    }

    #[test]
    fn test_record_formatting() {
        let row = PoseRow::from_cells(vec![Some(Point::new(12.5, 300.0)), None]);
        assert_eq!(row.to_record(), vec!["12.5", "300", "", ""]);
    }
}

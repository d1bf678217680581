// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The batch driver.
//!
//! [`Recorder`] walks the configured categories in order. For each one it
//! iterates the images of `<base_dir>/<category>`, keeps the first detected
//! person of every image as one whitelisted row, and writes
//! `<output_dir>/<category>.<extension>` once the category is done. A bad image
//! is logged and skipped; it never stops the batch.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{RecorderError, Result};
use crate::estimator::PoseEstimator;
use crate::keypoints::JOINT_WHITELIST;
use crate::row::{PoseRow, build_row};
use crate::source::{CategorySource, load_image};
use crate::table::PoseTable;
use crate::{error, info, section, success, verbose, warn};

/// Default pose categories, processed in this order.
pub const POSE_CATEGORIES: [&str; 5] = [
    "Tree_Pose_or_Vrksasana_",
    "Extended_Revolved_Triangle_Pose_or_Utthita_Trikonasana_",
    "Warrior_I_Pose_or_Virabhadrasana_I_",
    "Warrior_II_Pose_or_Virabhadrasana_II_",
    "Warrior_III_Pose_or_Virabhadrasana_III_",
];

/// Default directory holding one subdirectory per category.
pub const DEFAULT_BASE_DIR: &str = "images/downloads";

/// Default output table extension.
pub const DEFAULT_EXTENSION: &str = "csv";

/// What to process and where to write it.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory containing one subdirectory per category.
    pub base_dir: PathBuf,
    /// Directory the tables are written to.
    pub output_dir: PathBuf,
    /// Categories in processing order.
    pub categories: Vec<String>,
    /// Joint whitelist; also defines the column order.
    pub keypoints: Vec<&'static str>,
    /// Output file extension.
    pub extension: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            output_dir: PathBuf::from("."),
            categories: POSE_CATEGORIES.iter().map(ToString::to_string).collect(),
            keypoints: JOINT_WHITELIST.to_vec(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl RecorderConfig {
    /// Create a configuration with the default categories and layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input base directory.
    #[must_use]
    pub fn with_base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Set the output directory.
    #[must_use]
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Replace the category list.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Output path for a category.
    #[must_use]
    pub fn output_path(&self, category: &str) -> PathBuf {
        self.output_dir
            .join(format!("{category}.{}", self.extension))
    }
}

/// Result of processing one image.
#[derive(Debug)]
pub enum ImageOutcome {
    /// The first person's whitelisted joints.
    Row(PoseRow),
    /// The image decoded but nobody was found.
    NoPose,
    /// Decoding or estimation failed.
    Failed(RecorderError),
}

/// Summary of one processed category.
#[derive(Debug)]
pub struct CategoryReport {
    /// Category name.
    pub category: String,
    /// Table path.
    pub output: PathBuf,
    /// Images found in the category directory.
    pub images: usize,
    /// Rows written.
    pub rows: usize,
    /// Images with no detected person.
    pub skipped: usize,
    /// Images that failed to decode or estimate.
    pub failed: usize,
    /// Skip and exception messages, in file order.
    pub diagnostics: Vec<String>,
    /// Set when the table could not be written.
    pub write_error: Option<RecorderError>,
}

impl CategoryReport {
    /// Whether the table was written.
    #[must_use]
    pub const fn is_written(&self) -> bool {
        self.write_error.is_none()
    }
}

/// Batch pose recorder over a [`PoseEstimator`].
#[derive(Debug)]
pub struct Recorder<E> {
    estimator: E,
    config: RecorderConfig,
}

impl<E: PoseEstimator> Recorder<E> {
    /// Create a recorder that owns `estimator`.
    pub const fn new(estimator: E, config: RecorderConfig) -> Self {
        Self { estimator, config }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// The wrapped estimator.
    pub const fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Give back the estimator.
    pub fn into_estimator(self) -> E {
        self.estimator
    }

    /// Process every configured category in order.
    pub fn run(&mut self) -> Vec<CategoryReport> {
        let categories = self.config.categories.clone();
        categories
            .iter()
            .map(|category| self.process_category(category))
            .collect()
    }

    /// Process one category and write its table.
    ///
    /// A missing or empty directory still writes a header-only table. A write
    /// failure is logged and returned in the report.
    pub fn process_category(&mut self, category: &str) -> CategoryReport {
        section!("Generating results for {category}");

        let source = CategorySource::new(&self.config.base_dir, category);
        if source.is_empty() {
            verbose!("No images found in {}", source.dir().display());
        }

        let mut table = PoseTable::new(&self.config.keypoints);
        let mut report = CategoryReport {
            category: category.to_string(),
            output: self.config.output_path(category),
            images: source.len(),
            rows: 0,
            skipped: 0,
            failed: 0,
            diagnostics: Vec::new(),
            write_error: None,
        };

        for (path, image) in source {
            let outcome = match image {
                Ok(image) => self.estimate(&image),
                Err(e) => ImageOutcome::Failed(e),
            };
            record(&path, outcome, &mut table, &mut report);
        }

        match table.write_csv(&report.output) {
            Ok(()) => success!(
                "Saved {} rows to {}",
                table.len(),
                report.output.display()
            ),
            Err(e) => {
                error!("Failed to write {}: {e}", report.output.display());
                report.write_error = Some(e);
            }
        }
        report
    }

    /// Decode and estimate a single image.
    pub fn process_image(&mut self, path: &Path) -> ImageOutcome {
        match load_image(path) {
            Ok(image) => self.estimate(&image),
            Err(e) => ImageOutcome::Failed(e),
        }
    }

    fn estimate(&mut self, image: &DynamicImage) -> ImageOutcome {
        match self.estimator.estimate(image) {
            Ok(poses) => poses.first().map_or(ImageOutcome::NoPose, |pose| {
                ImageOutcome::Row(build_row(&pose.keypoints, &self.config.keypoints))
            }),
            Err(e) => ImageOutcome::Failed(e),
        }
    }
}

/// The message printed for an image that produced no row.
#[must_use]
pub fn diagnostic(path: &Path, outcome: &ImageOutcome) -> Option<String> {
    match outcome {
        ImageOutcome::Row(_) => None,
        ImageOutcome::NoPose => Some(format!("Skipping {}, no pose detected!", path.display())),
        ImageOutcome::Failed(e) => Some(format!("Exception on {}! {e}", path.display())),
    }
}

/// Add a row to `table`, or log why there is none, and count it in `report`.
fn record(path: &Path, outcome: ImageOutcome, table: &mut PoseTable, report: &mut CategoryReport) {
    let outcome = match outcome {
        ImageOutcome::Row(row) => match table.push(row) {
            Ok(()) => {
                report.rows += 1;
                return;
            }
            Err(e) => ImageOutcome::Failed(e),
        },
        other => other,
    };
    let Some(message) = diagnostic(path, &outcome) else {
        return;
    };
    if matches!(outcome, ImageOutcome::NoPose) {
        info!("{message}");
        report.skipped += 1;
    } else {
        warn!("{message}");
        report.failed += 1;
    }
    report.diagnostics.push(message);
}

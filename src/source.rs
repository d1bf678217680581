// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image discovery for one pose category.
//!
//! A category is a directory `<base_dir>/<category>` of images. Paths are
//! collected and sorted up front; decoding happens lazily as the source is
//! iterated, so one bad file never affects the others.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{RecorderError, Result};
use crate::warn;

/// Image file extensions picked up from a category directory.
pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff", "tif"];

/// Sorted image paths of a category directory.
#[derive(Debug, Clone)]
pub struct CategorySource {
    category: String,
    dir: PathBuf,
    paths: Vec<PathBuf>,
    cursor: usize,
}

impl CategorySource {
    /// Collect the images of `<base_dir>/<category>`.
    ///
    /// A missing or unreadable directory gives an empty source.
    pub fn new<P: AsRef<Path>>(base_dir: P, category: &str) -> Self {
        let dir = base_dir.as_ref().join(category);
        let paths = collect_images(&dir);
        Self {
            category: category.to_string(),
            dir,
            paths,
            cursor: 0,
        }
    }

    /// Category name.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Directory the images were collected from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All collected image paths, sorted.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of images in the category.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the category has no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Iterator for CategorySource {
    type Item = (PathBuf, Result<DynamicImage>);

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.get(self.cursor)?.clone();
        self.cursor += 1;
        let image = load_image(&path);
        Some((path, image))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.paths.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CategorySource {}

/// Decode an image file.
///
/// # Errors
///
/// Returns [`RecorderError::ImageError`] if the file can't be read or decoded.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path)
        .map_err(|e| RecorderError::ImageError(format!("Failed to load {}: {e}", path.display())))
}

/// Check if a path has an image extension (case-insensitive).
#[must_use]
pub fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        IMAGE_EXTENSIONS.contains(&ext.as_str())
    })
}

fn collect_images(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();
    paths.sort();
    paths
}

// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-category output tables.

use std::fs;
use std::path::Path;

use crate::error::{RecorderError, Result};
use crate::row::{PoseRow, header_for};

/// Accumulated rows for one pose category.
///
/// Rows keep insertion order. The table is serialized once with
/// [`PoseTable::write_csv`] after the category has been fully processed.
#[derive(Debug, Clone)]
pub struct PoseTable {
    header: Vec<String>,
    rows: Vec<PoseRow>,
}

impl PoseTable {
    /// Create an empty table with a header built from `whitelist`.
    #[must_use]
    pub fn new(whitelist: &[&str]) -> Self {
        Self {
            header: header_for(whitelist),
            rows: Vec::new(),
        }
    }

    /// Column names.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Rows in processing order.
    #[must_use]
    pub fn rows(&self) -> &[PoseRow] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row width does not match the header.
    pub fn push(&mut self, row: PoseRow) -> Result<()> {
        if row.len() * 2 != self.header.len() {
            return Err(RecorderError::TableError(format!(
                "Row has {} columns, header has {}",
                row.len() * 2,
                self.header.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Write the header and all rows as CSV, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path).map_err(|e| {
            RecorderError::TableError(format!("Failed to create {}: {e}", path.display()))
        })?;

        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row.to_record())?;
        }
        writer.flush()?;
        Ok(())
    }
}

//! Output storage
//!
//! Owns the output directory and names generated files
//! `{Title_With_Underscores}_{YYYYMMDD_HHMMSS}.{ext}`, with a numeric suffix
//! when that name is taken.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use tracing::debug;

use crate::core::{DiagramError, OutputFormat};

/// Stem used when a title has no usable characters
const FALLBACK_STEM: &str = "diagram";

/// Output directory and file naming for generated diagrams
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemStorage {
    output_dir: PathBuf,
}

impl FilesystemStorage {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if it does not exist
    pub fn ensure_dir(&self) -> Result<(), DiagramError> {
        if !self.output_dir.is_dir() {
            std::fs::create_dir_all(&self.output_dir)?;
            debug!(dir = %self.output_dir.display(), "Created output directory");
        }
        Ok(())
    }

    /// File name for a diagram rendered at `timestamp`
    pub fn file_name<Tz: TimeZone>(
        title: &str,
        format: OutputFormat,
        timestamp: &DateTime<Tz>,
    ) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!(
            "{}.{}",
            Self::file_stem(title, timestamp),
            format.extension()
        )
    }

    /// Path for a diagram rendered now
    ///
    /// Names are unique within the output directory: when a diagram with the
    /// same title was saved in the same second, a `_2`, `_3`, ... suffix is
    /// added to the stem.
    pub fn next_path(&self, title: &str, format: OutputFormat) -> PathBuf {
        let stem = Self::file_stem(title, &Local::now());
        let mut path = self
            .output_dir
            .join(format!("{}.{}", stem, format.extension()));
        let mut suffix = 2;
        while path.exists() {
            path = self
                .output_dir
                .join(format!("{}_{}.{}", stem, suffix, format.extension()));
            suffix += 1;
        }
        path
    }

    fn file_stem<Tz: TimeZone>(title: &str, timestamp: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!(
            "{}_{}",
            sanitize_title(title),
            timestamp.format("%Y%m%d_%H%M%S")
        )
    }
}

/// Replace whitespace with underscores and drop characters unsafe in file names
fn sanitize_title(title: &str) -> String {
    let stem: String = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-'))
        .collect();

    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

//! Category-to-file resolution and paginated fetch.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::DatasetConfig;
use crate::observability::metrics;
use crate::store::{DatasetReader, Record};

/// Error type for record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No dataset file exists for the category.
    #[error("no dataset for category '{category}'")]
    NotFound { category: String },
    /// The category would escape the data directory.
    #[error("invalid category '{category}'")]
    InvalidCategory { category: String },
    /// The dataset exists but could not be read.
    #[error("failed to read dataset for '{category}': {source}")]
    Io {
        category: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only access to the per-category dataset files.
///
/// Holds no mutable state; clones share nothing but the configured paths, so
/// concurrent fetches never observe each other.
#[derive(Debug, Clone)]
pub struct RecordStore {
    data_dir: PathBuf,
    extension: String,
}

impl RecordStore {
    /// Create a store rooted at `data_dir` reading `<category>.<extension>` files.
    pub fn new(data_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            extension: extension.into(),
        }
    }

    /// Create a store from the dataset section of the config.
    pub fn from_config(config: &DatasetConfig) -> Self {
        Self::new(config.data_dir.clone(), config.extension.clone())
    }

    /// Map a category onto its backing file.
    ///
    /// Categories are single file-name stems; anything that could act as a
    /// path component is refused.
    pub fn resolve(&self, category: &str) -> Result<PathBuf, StoreError> {
        let invalid = category.is_empty()
            || category == "."
            || category == ".."
            || category.contains(['/', '\\', '\0']);
        if invalid {
            return Err(StoreError::InvalidCategory {
                category: category.to_string(),
            });
        }

        Ok(self
            .data_dir
            .join(format!("{}.{}", category, self.extension)))
    }

    /// Return the records at positions `[start, start + count)` of a category.
    ///
    /// The window is clipped to the rows available; a start past the end
    /// yields an empty vector. Malformed rows are skipped and do not occupy a
    /// position.
    pub async fn fetch(
        &self,
        category: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let path = self.resolve(category)?;

        let content = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound {
                category: category.to_string(),
            },
            _ => StoreError::Io {
                category: category.to_string(),
                source: e,
            },
        })?;

        let reader = DatasetReader::new(&content);
        if !reader.header_ok() {
            tracing::warn!(
                category = %category,
                path = %path.display(),
                "Dataset header does not match expected columns"
            );
        }

        let mut skipped = 0u64;
        let records: Vec<Record> = reader
            .filter_map(|row| match row {
                Ok(record) => Some(record),
                Err(e) => {
                    skipped += 1;
                    tracing::debug!(category = %category, error = %e, "Skipping malformed row");
                    None
                }
            })
            .skip(start)
            .take(count)
            .collect();

        if skipped > 0 {
            metrics::record_skipped_rows(skipped);
            tracing::warn!(category = %category, skipped, "Skipped malformed rows");
        }

        tracing::debug!(
            category = %category,
            start,
            count,
            returned = records.len(),
            "Fetched records"
        );

        Ok(records)
    }
}

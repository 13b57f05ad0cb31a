//! Arc catalog
//!
//! The `arcs.csv` index of uploaded transcript units: which arc belongs to
//! which batch, its domain description, and the cluster files holding the
//! raw conversation text.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

/// One rateable transcript unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArcEntry {
    pub arc_no: String,
    pub batch_no: String,
    pub domain: String,
    /// File names under the arc-files directory; the first is the
    /// conversation transcript shown to raters
    pub cluster_files: Vec<String>,
}

impl ArcEntry {
    /// The transcript file raters are shown, if any files were uploaded
    pub(crate) fn conversation_file(&self) -> Option<&str> {
        self.cluster_files.first().map(String::as_str)
    }
}

/// On-disk row shape; cluster files are stored `;`-joined in one column
#[derive(Debug, Serialize, Deserialize)]
struct ArcRow {
    #[serde(rename = "Arc No")]
    arc_no: String,
    #[serde(rename = "Batch No")]
    batch_no: String,
    #[serde(rename = "Domain")]
    domain: String,
    #[serde(rename = "Cluster Files")]
    cluster_files: String,
}

impl From<&ArcEntry> for ArcRow {
    fn from(entry: &ArcEntry) -> Self {
        ArcRow {
            arc_no: entry.arc_no.clone(),
            batch_no: entry.batch_no.clone(),
            domain: entry.domain.clone(),
            cluster_files: entry.cluster_files.join(";"),
        }
    }
}

impl From<ArcRow> for ArcEntry {
    fn from(row: ArcRow) -> Self {
        ArcEntry {
            arc_no: row.arc_no,
            batch_no: row.batch_no,
            domain: row.domain,
            cluster_files: row
                .cluster_files
                .split(';')
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ArcCatalog {
    entries: Vec<ArcEntry>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum CatalogError {
    #[error("Failed to read arc catalog {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write arc catalog {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to create catalog directory {path}: {source}")]
    CreateDirectory {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArcCatalog {
    /// Load the catalog; a missing file is an empty catalog, not an error
    pub(crate) fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Ok(ArcCatalog::default());
        }

        let mut reader = csv::Reader::from_path(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut entries = Vec::new();
        for row in reader.deserialize::<ArcRow>() {
            let row = row.map_err(|e| CatalogError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
            entries.push(ArcEntry::from(row));
        }
        Ok(ArcCatalog { entries })
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| CatalogError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let mut writer = csv::Writer::from_path(path).map_err(|e| CatalogError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
        for entry in &self.entries {
            writer
                .serialize(ArcRow::from(entry))
                .map_err(|e| CatalogError::Write {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
        writer.flush().map_err(|e| CatalogError::Write {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;
        info!(path = %path.display(), entries = self.entries.len(), "Saved arc catalog");
        Ok(())
    }

    pub(crate) fn push(&mut self, entry: ArcEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn entries(&self) -> &[ArcEntry] {
        &self.entries
    }

    /// Batch names in first-appearance order, without duplicates
    pub(crate) fn batches(&self) -> Vec<String> {
        let mut batches: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !batches.contains(&entry.batch_no) {
                batches.push(entry.batch_no.clone());
            }
        }
        batches
    }

    pub(crate) fn arcs_in_batch(&self, batch_no: &str) -> Vec<&ArcEntry> {
        self.entries
            .iter()
            .filter(|e| e.batch_no == batch_no)
            .collect()
    }

    pub(crate) fn find(&self, arc_no: &str, batch_no: &str) -> Option<&ArcEntry> {
        self.entries
            .iter()
            .find(|e| e.arc_no == arc_no && e.batch_no == batch_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(arc: &str, batch: &str) -> ArcEntry {
        ArcEntry {
            arc_no: arc.into(),
            batch_no: batch.into(),
            domain: "Self-worth and avoidance".into(),
            cluster_files: vec!["arc12_conversation.txt".into(), "arc12_notes.txt".into()],
        }
    }

    #[test]
    fn test_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arcs.csv");

        let mut catalog = ArcCatalog::default();
        catalog.push(sample_entry("12", "Batch_1"));
        catalog.push(sample_entry("13", "Batch_2"));
        catalog.save(&path).unwrap();

        let loaded = ArcCatalog::load(&path).unwrap();
        assert_eq!(loaded, catalog);
        assert_eq!(
            loaded.entries()[0].conversation_file(),
            Some("arc12_conversation.txt")
        );
    }

    #[test]
    fn test_missing_file_is_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ArcCatalog::load(&dir.path().join("absent.csv")).unwrap();
        assert!(catalog.entries().is_empty());
        assert!(catalog.batches().is_empty());
    }

    #[test]
    fn test_batch_and_arc_queries() {
        let mut catalog = ArcCatalog::default();
        catalog.push(sample_entry("1", "Batch_1"));
        catalog.push(sample_entry("2", "Batch_1"));
        catalog.push(sample_entry("1", "Batch_2"));

        assert_eq!(catalog.batches(), vec!["Batch_1", "Batch_2"]);
        assert_eq!(catalog.arcs_in_batch("Batch_1").len(), 2);
        assert!(catalog.find("1", "Batch_2").is_some());
        assert!(catalog.find("9", "Batch_1").is_none());
    }
}

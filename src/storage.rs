//! Local data storage
//!
//! Owns the on-disk layout under the data root: uploaded arc files, the
//! credential table, the arc catalog, PDF exports, and the append-only
//! submission log. Each submission is written twice, as its own CSV file
//! and as a row appended to the master `rater_entries.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::coding::SubmissionRecord;
use crate::config::StorageConfig;

/// Timestamp format used in submission and export file names
const FILE_TIMESTAMP: &str = "%Y-%m-%d-%H-%M-%S";

/// Resolved data directory layout
#[derive(Debug, Clone)]
pub(crate) struct DataDirs {
    root: PathBuf,
    arc_dir: PathBuf,
    pdf_dir: PathBuf,
}

/// Where one submission landed on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubmissionPaths {
    pub submission_csv: PathBuf,
    pub master_csv: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum StorageError {
    #[error("Could not find a data directory for this platform")]
    NoDataDir,

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read transcript file {path}: {source}")]
    ReadTranscript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy arc file to {path}: {source}")]
    CopyArcFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to update submission log {path}: {source}")]
    SubmissionLog {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to replace submission log {path}: {source}")]
    ReplaceLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DataDirs {
    /// Resolve the layout from config, creating the directories.
    ///
    /// Falls back to the platform data dir when no root is configured.
    pub(crate) fn resolve(config: &StorageConfig) -> Result<Self, StorageError> {
        let root = match &config.data_root {
            Some(root) => root.clone(),
            None => dirs::data_dir()
                .map(|d| d.join("RsctRater"))
                .ok_or(StorageError::NoDataDir)?,
        };
        let dirs = DataDirs {
            arc_dir: root.join("arc_files"),
            pdf_dir: root.join("pdf_exports"),
            root,
        };
        for dir in [&dirs.root, &dirs.arc_dir, &dirs.pdf_dir] {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| StorageError::CreateDirectory {
                    path: dir.clone(),
                    source: e,
                })?;
                info!(path = %dir.display(), "Created data directory");
            }
        }
        Ok(dirs)
    }

    pub(crate) fn credentials_file(&self) -> PathBuf {
        self.root.join("rater_credentials.json")
    }

    pub(crate) fn arcs_file(&self) -> PathBuf {
        self.root.join("arcs.csv")
    }

    pub(crate) fn entries_file(&self) -> PathBuf {
        self.root.join("rater_entries.csv")
    }

    pub(crate) fn arc_file(&self, name: &str) -> PathBuf {
        self.arc_dir.join(name)
    }

    /// Destination for a submission's PDF export
    pub(crate) fn pdf_path(&self, rater_key: &str, submitted_at: &DateTime<Local>) -> PathBuf {
        let stamp = submitted_at.format(FILE_TIMESTAMP);
        self.pdf_dir.join(format!("{rater_key}_{stamp}.pdf"))
    }

    /// Read the raw transcript text for an uploaded arc file
    pub(crate) fn read_transcript(&self, name: &str) -> Result<String, StorageError> {
        let path = self.arc_file(name);
        fs::read_to_string(&path).map_err(|e| StorageError::ReadTranscript { path, source: e })
    }

    /// Copy an uploaded cluster file into the arc-files directory,
    /// returning the stored file name
    pub(crate) fn store_arc_file(&self, source: &Path) -> Result<String, StorageError> {
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::CopyArcFile {
                path: source.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
            })?
            .to_string();
        let dest = self.arc_file(&name);
        fs::copy(source, &dest).map_err(|e| StorageError::CopyArcFile {
            path: dest.clone(),
            source: e,
        })?;
        Ok(name)
    }

    /// Persist one finished submission record.
    ///
    /// Writes the record as its own CSV file and appends it to the master
    /// log. Append-only at record granularity: existing rows are carried
    /// over untouched, with the header set widened to the union when the
    /// new record brings columns the log has not seen (sessions vary in
    /// row count, so this happens routinely).
    pub(crate) fn append_submission(
        &self,
        record: &SubmissionRecord,
        rater_key: &str,
        arc_no: &str,
        submitted_at: &DateTime<Local>,
    ) -> Result<SubmissionPaths, StorageError> {
        let stamp = submitted_at.format(FILE_TIMESTAMP);
        let submission_csv = self.root.join(format!("{rater_key}_{arc_no}_{stamp}.csv"));
        write_single_record(&submission_csv, record)?;

        let master_csv = self.entries_file();
        append_with_header_union(&master_csv, record)?;

        info!(
            submission = %submission_csv.display(),
            master = %master_csv.display(),
            "Persisted submission"
        );
        Ok(SubmissionPaths {
            submission_csv,
            master_csv,
        })
    }
}

/// Write a record as a standalone two-line CSV (header row plus values)
fn write_single_record(path: &Path, record: &SubmissionRecord) -> Result<(), StorageError> {
    let log_err = |e: csv::Error| StorageError::SubmissionLog {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(log_err)?;
    writer.write_record(record.headers()).map_err(log_err)?;
    writer
        .write_record(record.fields().iter().map(|(_, value)| value.as_str()))
        .map_err(log_err)?;
    writer
        .flush()
        .map_err(|e| StorageError::SubmissionLog {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })
}

/// Append a record to the master log, widening the header set to the
/// union of the existing columns (kept in their order) and any new
/// columns the record introduces (appended in record order). Existing
/// rows are rewritten verbatim, padded with empty values for columns
/// they predate.
///
/// The rewrite goes through a sibling temp file that is renamed over the
/// log only after a successful flush, so the existing records survive an
/// append that fails partway.
fn append_with_header_union(path: &Path, record: &SubmissionRecord) -> Result<(), StorageError> {
    let log_err = |e: csv::Error| StorageError::SubmissionLog {
        path: path.to_path_buf(),
        source: e,
    };

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    if path.exists() {
        let mut reader = csv::Reader::from_path(path).map_err(log_err)?;
        headers = reader
            .headers()
            .map_err(log_err)?
            .iter()
            .map(str::to_string)
            .collect();
        for row in reader.records() {
            let row = row.map_err(log_err)?;
            rows.push(row.iter().map(str::to_string).collect());
        }
    }

    for name in record.headers() {
        if !headers.iter().any(|h| h == name) {
            headers.push(name.to_string());
        }
    }

    let tmp = log_tmp_path(path);
    if let Err(e) = write_unioned_log(&tmp, path, &headers, &rows, record) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StorageError::ReplaceLog {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// Write the widened log to the staging path. `path` only names the log
/// in errors; nothing is written there.
fn write_unioned_log(
    tmp: &Path,
    path: &Path,
    headers: &[String],
    rows: &[Vec<String>],
    record: &SubmissionRecord,
) -> Result<(), StorageError> {
    let log_err = |e: csv::Error| StorageError::SubmissionLog {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(tmp).map_err(log_err)?;
    writer.write_record(headers).map_err(log_err)?;
    for row in rows {
        let padded = (0..headers.len()).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
        writer.write_record(padded).map_err(log_err)?;
    }
    writer
        .write_record(headers.iter().map(|h| record.get(h).unwrap_or("")))
        .map_err(log_err)?;
    writer.flush().map_err(|e| StorageError::SubmissionLog {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })
}

/// Sibling temp path the master log is staged at during a rewrite
fn log_tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::{CodingRow, CodingSession, Confidence, Impact, Provenance, Stance};
    use chrono::TimeZone;

    fn record(row_count: usize) -> SubmissionRecord {
        let mut session = CodingSession::new();
        session.rows = (1..=row_count as u32)
            .map(|ts| CodingRow {
                therapist_index: Some(ts),
                stance: Some(Stance::Tf1),
                impact: Some(Impact::Minus),
                confidence: Some(Confidence::new(2).unwrap()),
                notes: format!("note {ts}"),
            })
            .collect();
        let provenance = Provenance {
            rater_name: "Example Rater".into(),
            arc_no: "7".into(),
            batch_no: "Batch_1".into(),
            submitted_at: Local.with_ymd_and_hms(2025, 3, 9, 9, 15, 0).unwrap(),
        };
        session.to_submission_record(&provenance).unwrap()
    }

    fn test_dirs(root: &Path) -> DataDirs {
        DataDirs::resolve(&StorageConfig {
            data_root: Some(root.to_path_buf()),
        })
        .unwrap()
    }

    #[test]
    fn test_resolve_creates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = test_dirs(&tmp.path().join("data"));
        assert!(dirs.arc_file("x.txt").parent().unwrap().exists());
        assert!(dirs.entries_file().parent().unwrap().exists());
    }

    #[test]
    fn test_missing_transcript_is_reported_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = test_dirs(tmp.path());
        let err = dirs.read_transcript("absent.txt").unwrap_err();
        assert!(matches!(err, StorageError::ReadTranscript { .. }));
    }

    #[test]
    fn test_submission_written_to_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = test_dirs(tmp.path());
        let submitted_at = Local.with_ymd_and_hms(2025, 3, 9, 9, 15, 0).unwrap();

        let paths = dirs
            .append_submission(&record(2), "rater", "7", &submitted_at)
            .unwrap();
        assert!(paths.submission_csv.exists());
        assert!(paths.master_csv.exists());

        let standalone = fs::read_to_string(&paths.submission_csv).unwrap();
        assert!(standalone.starts_with("Rater,Arc No,Batch No,Date,Time"));
        assert!(standalone.contains("Row2_Notes"));
    }

    #[test]
    fn test_master_log_unions_headers_on_ragged_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = test_dirs(tmp.path());
        let submitted_at = Local.with_ymd_and_hms(2025, 3, 9, 9, 15, 0).unwrap();

        dirs.append_submission(&record(1), "rater", "7", &submitted_at)
            .unwrap();
        dirs.append_submission(&record(3), "rater", "8", &submitted_at)
            .unwrap();

        let mut reader = csv::Reader::from_path(dirs.entries_file()).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert!(headers.contains(&"Row1_TS#".to_string()));
        assert!(headers.contains(&"Row3_Confidence".to_string()));

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        // the one-row submission predates the Row3_* columns and is padded
        let row3_ts = headers.iter().position(|h| h == "Row3_TS#").unwrap();
        assert_eq!(rows[0].get(row3_ts), Some(""));
        assert_eq!(rows[1].get(row3_ts), Some("3"));
    }

    #[test]
    fn test_failed_master_rewrite_keeps_existing_records() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = test_dirs(tmp.path());
        let submitted_at = Local.with_ymd_and_hms(2025, 3, 9, 9, 15, 0).unwrap();

        dirs.append_submission(&record(2), "rater", "7", &submitted_at)
            .unwrap();
        let staging = log_tmp_path(&dirs.entries_file());
        assert!(!staging.exists());

        // occupy the staging path so the rewrite cannot even start
        fs::create_dir_all(&staging).unwrap();
        let result = dirs.append_submission(&record(3), "rater", "8", &submitted_at);
        assert!(result.is_err());

        // the master log is untouched by the failed append
        let mut reader = csv::Reader::from_path(dirs.entries_file()).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some("Example Rater"));
    }
}

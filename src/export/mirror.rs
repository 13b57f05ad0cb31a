//! Remote mirror seam.
//!
//! Stands in for the shared drive the research team collects submissions
//! on. The only supported target is a mounted directory; mirroring is a
//! best-effort copy and a failure never touches the local record.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::ExportConfig;

pub trait SubmissionMirror {
    /// Human-readable target for log lines
    fn describe(&self) -> String;

    /// Copy one finished output file to the mirror target
    fn mirror_file(&self, path: &Path) -> Result<PathBuf, MirrorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("Mirror target {path} is not available: {source}")]
    TargetUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {path} to mirror: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File {path} has no usable file name")]
    BadFileName { path: PathBuf },
}

/// Mirrors outputs into a mounted drive folder
#[derive(Debug, Clone)]
pub struct DirectoryMirror {
    target: PathBuf,
}

impl DirectoryMirror {
    pub fn new(target: PathBuf) -> Self {
        DirectoryMirror { target }
    }
}

impl SubmissionMirror for DirectoryMirror {
    fn describe(&self) -> String {
        self.target.display().to_string()
    }

    fn mirror_file(&self, path: &Path) -> Result<PathBuf, MirrorError> {
        if !self.target.exists() {
            fs::create_dir_all(&self.target).map_err(|e| MirrorError::TargetUnavailable {
                path: self.target.clone(),
                source: e,
            })?;
        }

        let name = path
            .file_name()
            .ok_or_else(|| MirrorError::BadFileName {
                path: path.to_path_buf(),
            })?;
        let dest = self.target.join(name);
        fs::copy(path, &dest).map_err(|e| MirrorError::Copy {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(dest)
    }
}

/// Build the configured mirror, if any
pub fn mirror_from_config(config: &ExportConfig) -> Option<Box<dyn SubmissionMirror>> {
    config
        .mirror_dir
        .as_ref()
        .map(|dir| Box::new(DirectoryMirror::new(dir.clone())) as Box<dyn SubmissionMirror>)
}

/// Best-effort copy of finished outputs to the mirror.
///
/// Failures are logged and swallowed; the local records these paths point
/// at are already written and stay valid.
pub fn mirror_outputs(mirror: &dyn SubmissionMirror, paths: &[&Path]) {
    for path in paths {
        match mirror.mirror_file(path) {
            Ok(dest) => info!(
                source = %path.display(),
                dest = %dest.display(),
                "Mirrored submission output"
            ),
            Err(e) => warn!(
                source = %path.display(),
                target = %mirror.describe(),
                error = %e,
                "Mirror copy failed; local record is unaffected"
            ),
        }
    }
}

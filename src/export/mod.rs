//! Submission export
//!
//! Renders finished submissions to PDF and optionally copies the outputs
//! to a mounted drive folder. Export failures are soft: the local CSV
//! record is already durable before anything here runs.

mod mirror;
mod pdf;

pub use mirror::{mirror_from_config, mirror_outputs, DirectoryMirror, SubmissionMirror};
pub use pdf::write_submission_pdf;

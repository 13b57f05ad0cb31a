//! Coding session model
//!
//! Holds the in-progress rating a rater builds against one transcript:
//! readiness before/after, the client-statement span the before-rating
//! covers, and a growable table of per-statement coding rows. Validated
//! sessions flatten into the stable record shape the submission log expects.

mod record;
mod session;
mod types;

pub use record::{Provenance, SubmissionRecord};
pub use session::{CodingSession, IncompleteRow};
pub use types::{CodingRow, Confidence, Impact, InvalidConfidence, ReadinessRating, Stance};

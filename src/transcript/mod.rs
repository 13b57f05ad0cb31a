//! Transcript segmentation
//!
//! Turns a raw conversation document into an ordered sequence of tagged
//! therapist/client statements with stable per-role indices. The indices
//! (TS1, CS1, ...) are what raters reference in the coding table.

mod segmenter;
mod types;

pub use segmenter::segment;
pub use types::{Role, Statement, Transcript};

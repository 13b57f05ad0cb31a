use serde::{Deserialize, Serialize};

use super::types::{CodingRow, ReadinessRating};

/// Number of empty coding rows a fresh session starts with
pub const INITIAL_ROWS: usize = 5;

/// The full in-progress rating for one (rater, transcript) pair.
///
/// Owned by the interactive session building it; the rendering surface
/// reads and writes it through these operations rather than through
/// widget-keyed globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingSession {
    pub readiness_before: ReadinessRating,
    pub readiness_after: ReadinessRating,
    /// Inclusive client-statement span the before-rating applies to
    pub client_range_start: u32,
    pub client_range_end: u32,
    pub rows: Vec<CodingRow>,
}

impl CodingSession {
    pub fn new() -> Self {
        CodingSession {
            readiness_before: ReadinessRating::NotOpen,
            readiness_after: ReadinessRating::NotOpen,
            client_range_start: 1,
            client_range_end: 1,
            rows: vec![CodingRow::default(); INITIAL_ROWS],
        }
    }

    /// Append one empty coding row. Always succeeds; there is no upper
    /// bound on the table length.
    pub fn add_row(&mut self) {
        self.rows.push(CodingRow::default());
    }

    /// Advisory check that the client range runs forward in document
    /// order. Returns true when the end statement precedes the start.
    ///
    /// This never blocks interaction or submission; callers surface it as
    /// a warning only. Indices absent from the transcript produce no
    /// warning, matching the guarded check in the rating view.
    pub fn range_order_warning(&self, client_indices: &[u32]) -> bool {
        let start_pos = client_indices.iter().position(|&i| i == self.client_range_start);
        let end_pos = client_indices.iter().position(|&i| i == self.client_range_end);
        match (start_pos, end_pos) {
            (Some(start), Some(end)) => end < start,
            _ => false,
        }
    }

    /// Check every row is complete, stopping at the first that is not.
    ///
    /// The error carries the offending row's 1-based position so the
    /// caller can point the rater at it. Recoverable: fix the row and
    /// resubmit.
    pub fn validate_for_submission(&self) -> Result<(), IncompleteRow> {
        for (i, row) in self.rows.iter().enumerate() {
            if !row.is_complete() {
                return Err(IncompleteRow { position: i + 1 });
            }
        }
        Ok(())
    }
}

impl Default for CodingSession {
    fn default() -> Self {
        CodingSession::new()
    }
}

/// A coding row missing one of its required fields at submission time
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Row {position} is incomplete")]
pub struct IncompleteRow {
    /// 1-based position of the first incomplete row
    pub position: usize,
}

use chrono::{DateTime, Local};

use super::session::{CodingSession, IncompleteRow};

/// Who submitted what, and when. Copied verbatim into the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub rater_name: String,
    pub arc_no: String,
    pub batch_no: String,
    pub submitted_at: DateTime<Local>,
}

/// Number of fixed (non-row) columns in a flattened record
pub const FIXED_FIELDS: usize = 9;

/// Number of columns each coding row contributes
pub const FIELDS_PER_ROW: usize = 5;

/// The flattened, persisted form of a finalized coding session.
///
/// An ordered field-name to value mapping: the 9 fixed columns (provenance
/// plus readiness/range), then `Row{n}_TS#`, `Row{n}_TF`, `Row{n}_Impact`,
/// `Row{n}_Confidence`, `Row{n}_Notes` for each row in table order.
/// Immutable once created; the submission log appends it and never mutates
/// it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    fields: Vec<(String, String)>,
}

impl SubmissionRecord {
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

impl CodingSession {
    /// Flatten a validated session plus provenance into a submission
    /// record.
    ///
    /// Pure and deterministic: the same session and provenance always
    /// produce an identical record. Fails with the first incomplete row,
    /// the same error `validate_for_submission` reports. The range-order
    /// advisory never prevents flattening; both range indices are copied
    /// verbatim whatever their order.
    pub fn to_submission_record(
        &self,
        provenance: &Provenance,
    ) -> Result<SubmissionRecord, IncompleteRow> {
        self.validate_for_submission()?;

        let mut fields = Vec::with_capacity(FIXED_FIELDS + self.rows.len() * FIELDS_PER_ROW);
        let mut push = |name: String, value: String| fields.push((name, value));

        push("Rater".into(), provenance.rater_name.clone());
        push("Arc No".into(), provenance.arc_no.clone());
        push("Batch No".into(), provenance.batch_no.clone());
        push(
            "Date".into(),
            provenance.submitted_at.format("%Y-%m-%d").to_string(),
        );
        push(
            "Time".into(),
            provenance.submitted_at.format("%H:%M:%S").to_string(),
        );
        push(
            "Client Readiness (Before)".into(),
            self.readiness_before.label().into(),
        );
        push("CS Range Start".into(), self.client_range_start.to_string());
        push("CS Range End".into(), self.client_range_end.to_string());
        push(
            "Client Readiness (After)".into(),
            self.readiness_after.label().into(),
        );

        for (i, row) in self.rows.iter().enumerate() {
            let n = i + 1;
            let (Some(ts), Some(stance), Some(impact), Some(confidence)) = (
                row.therapist_index,
                row.stance,
                row.impact,
                row.confidence,
            ) else {
                return Err(IncompleteRow { position: n });
            };
            push(format!("Row{n}_TS#"), ts.to_string());
            push(format!("Row{n}_TF"), stance.numeral().to_string());
            push(format!("Row{n}_Impact"), impact.as_str().into());
            push(format!("Row{n}_Confidence"), confidence.score().to_string());
            push(format!("Row{n}_Notes"), row.notes.clone());
        }

        Ok(SubmissionRecord { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::types::{CodingRow, Confidence, Impact, ReadinessRating, Stance};
    use chrono::TimeZone;

    fn provenance() -> Provenance {
        Provenance {
            rater_name: "Avery Kim".into(),
            arc_no: "12".into(),
            batch_no: "Batch_1".into(),
            submitted_at: Local.with_ymd_and_hms(2025, 6, 1, 14, 30, 5).unwrap(),
        }
    }

    fn complete_row(ts: u32, notes: &str) -> CodingRow {
        CodingRow {
            therapist_index: Some(ts),
            stance: Some(Stance::Tf2),
            impact: Some(Impact::Plus),
            confidence: Some(Confidence::new(4).unwrap()),
            notes: notes.into(),
        }
    }

    fn session_with_rows(rows: Vec<CodingRow>) -> CodingSession {
        CodingSession {
            readiness_before: ReadinessRating::SomewhatOpen,
            readiness_after: ReadinessRating::OpenToInsight,
            client_range_start: 1,
            client_range_end: 3,
            rows,
        }
    }

    #[test]
    fn test_field_count_and_row_naming() {
        let session = session_with_rows(vec![complete_row(1, ""), complete_row(2, "shift")]);
        let record = session.to_submission_record(&provenance()).unwrap();

        assert_eq!(record.fields().len(), FIXED_FIELDS + 2 * FIELDS_PER_ROW);
        let headers: Vec<&str> = record.headers().collect();
        assert_eq!(&headers[..5], &["Rater", "Arc No", "Batch No", "Date", "Time"]);
        assert!(headers.contains(&"Row1_TS#"));
        assert!(headers.contains(&"Row2_Notes"));
        assert_eq!(record.get("Row2_Notes"), Some("shift"));
        assert_eq!(record.get("Row1_TF"), Some("2"));
        assert_eq!(record.get("Row1_Impact"), Some("+1"));
    }

    #[test]
    fn test_flattening_is_deterministic() {
        let session = session_with_rows(vec![complete_row(3, "note")]);
        let prov = provenance();
        let first = session.to_submission_record(&prov).unwrap();
        let second = session.to_submission_record(&prov).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_provenance_and_readiness_copied_verbatim() {
        let session = session_with_rows(vec![complete_row(1, "")]);
        let record = session.to_submission_record(&provenance()).unwrap();

        assert_eq!(record.get("Rater"), Some("Avery Kim"));
        assert_eq!(record.get("Date"), Some("2025-06-01"));
        assert_eq!(record.get("Time"), Some("14:30:05"));
        assert_eq!(record.get("Client Readiness (Before)"), Some("Somewhat open"));
        assert_eq!(
            record.get("Client Readiness (After)"),
            Some("Open to more perspectives and insight")
        );
    }

    #[test]
    fn test_inverted_range_still_flattens() {
        let mut session = session_with_rows(vec![complete_row(1, "")]);
        session.client_range_start = 2;
        session.client_range_end = 1;
        assert!(session.range_order_warning(&[1, 2, 3]));

        let record = session.to_submission_record(&provenance()).unwrap();
        assert_eq!(record.get("CS Range Start"), Some("2"));
        assert_eq!(record.get("CS Range End"), Some("1"));
    }

    #[test]
    fn test_incomplete_session_refuses_to_flatten() {
        let mut session = session_with_rows(vec![complete_row(1, ""), complete_row(2, "")]);
        session.rows[1].impact = None;

        let err = session.to_submission_record(&provenance()).unwrap_err();
        assert_eq!(err.position, 2);
    }
}

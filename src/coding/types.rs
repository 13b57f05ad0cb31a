use std::fmt;

use serde::{Deserialize, Serialize};

/// Client readiness, a fixed 5-point ordinal scale.
///
/// Ordinal, not numeric: the declaration order is the display order and
/// nothing computes on it. Serialized as the full display label so session
/// files and persisted records read the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReadinessRating {
    #[serde(rename = "Not open")]
    NotOpen,
    #[serde(rename = "Somewhat open")]
    SomewhatOpen,
    #[serde(rename = "Open to more perspectives and insight")]
    OpenToInsight,
    #[serde(rename = "Responsive to deeper reflections or interventions")]
    ResponsiveToReflections,
    #[serde(rename = "Highly open and filtered")]
    HighlyOpenAndFiltered,
}

impl ReadinessRating {
    /// All ratings in scale order, for selection controls
    pub const ALL: [ReadinessRating; 5] = [
        ReadinessRating::NotOpen,
        ReadinessRating::SomewhatOpen,
        ReadinessRating::OpenToInsight,
        ReadinessRating::ResponsiveToReflections,
        ReadinessRating::HighlyOpenAndFiltered,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReadinessRating::NotOpen => "Not open",
            ReadinessRating::SomewhatOpen => "Somewhat open",
            ReadinessRating::OpenToInsight => "Open to more perspectives and insight",
            ReadinessRating::ResponsiveToReflections => {
                "Responsive to deeper reflections or interventions"
            }
            ReadinessRating::HighlyOpenAndFiltered => "Highly open and filtered",
        }
    }
}

impl fmt::Display for ReadinessRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Therapist stance taxonomy, TF1 through TF5.
///
/// Persisted as its numeral (1-5) in submission records; serialized as the
/// short code in session files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stance {
    #[serde(rename = "TF1")]
    Tf1,
    #[serde(rename = "TF2")]
    Tf2,
    #[serde(rename = "TF3")]
    Tf3,
    #[serde(rename = "TF4")]
    Tf4,
    #[serde(rename = "TF5")]
    Tf5,
}

impl Stance {
    /// All stances in taxonomy order, for selection controls
    pub const ALL: [Stance; 5] = [
        Stance::Tf1,
        Stance::Tf2,
        Stance::Tf3,
        Stance::Tf4,
        Stance::Tf5,
    ];

    pub fn numeral(&self) -> u8 {
        match self {
            Stance::Tf1 => 1,
            Stance::Tf2 => 2,
            Stance::Tf3 => 3,
            Stance::Tf4 => 4,
            Stance::Tf5 => 5,
        }
    }

    /// Full option label shown to raters
    pub fn label(&self) -> &'static str {
        match self {
            Stance::Tf1 => "TF1: Directive and Expert position",
            Stance::Tf2 => "TF2: Suggestive Interpretation",
            Stance::Tf3 => "TF3: Collaborative Exploration",
            Stance::Tf4 => "TF4: Pattern-oriented Reflection",
            Stance::Tf5 => "TF5: Client-led Integration",
        }
    }
}

/// Intervention impact score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    #[serde(rename = "+1")]
    Plus,
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "-1")]
    Minus,
}

impl Impact {
    /// Persisted encoding ("+1", "0", "-1")
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Plus => "+1",
            Impact::Zero => "0",
            Impact::Minus => "-1",
        }
    }
}

/// Confidence score, 1 (total guess) through 5 (very clear).
///
/// Construction is validated; out-of-range values are rejected at the
/// serde boundary too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub fn new(score: u8) -> Result<Self, InvalidConfidence> {
        if (1..=5).contains(&score) {
            Ok(Confidence(score))
        } else {
            Err(InvalidConfidence(score))
        }
    }

    pub fn score(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Confidence {
    type Error = InvalidConfidence;

    fn try_from(score: u8) -> Result<Self, Self::Error> {
        Confidence::new(score)
    }
}

impl From<Confidence> for u8 {
    fn from(confidence: Confidence) -> u8 {
        confidence.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Confidence score must be between 1 and 5, got {0}")]
pub struct InvalidConfidence(pub u8);

/// Maximum therapist index offered by the coding table's TS# selector.
///
/// The selectable range is fixed at 1..=25 independent of how many
/// therapist statements the transcript actually contains.
pub const MAX_SELECTABLE_TS: u32 = 25;

/// One rater judgment attached to a therapist statement index.
///
/// Complete when all four required fields are set; notes are optional and
/// may stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingRow {
    #[serde(default, rename = "ts")]
    pub therapist_index: Option<u32>,
    #[serde(default)]
    pub stance: Option<Stance>,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub notes: String,
}

impl CodingRow {
    /// TS# values the coding table's selector offers, regardless of how
    /// long the parsed transcript actually is
    pub fn selectable_indices() -> std::ops::RangeInclusive<u32> {
        1..=MAX_SELECTABLE_TS
    }

    pub fn is_complete(&self) -> bool {
        self.therapist_index.is_some()
            && self.stance.is_some()
            && self.impact.is_some()
            && self.confidence.is_some()
    }

    /// Whether the row's TS# refers to a statement that actually exists in
    /// the given therapist index list. Submission does not require this;
    /// it is offered for callers that want the stricter check.
    pub fn references_transcript(&self, therapist_indices: &[u32]) -> bool {
        self.therapist_index
            .map(|ts| therapist_indices.contains(&ts))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bounds() {
        assert!(Confidence::new(0).is_err());
        assert!(Confidence::new(6).is_err());
        assert_eq!(Confidence::new(3).unwrap().score(), 3);
    }

    #[test]
    fn test_confidence_serde_rejects_out_of_range() {
        let parsed: Result<Confidence, _> = serde_json::from_str("7");
        assert!(parsed.is_err());
        let parsed: Confidence = serde_json::from_str("5").unwrap();
        assert_eq!(parsed.score(), 5);
    }

    #[test]
    fn test_scale_and_taxonomy_orderings() {
        let readiness: Vec<&str> = ReadinessRating::ALL.iter().map(|r| r.label()).collect();
        assert_eq!(
            readiness,
            vec![
                "Not open",
                "Somewhat open",
                "Open to more perspectives and insight",
                "Responsive to deeper reflections or interventions",
                "Highly open and filtered",
            ]
        );

        let numerals: Vec<u8> = Stance::ALL.iter().map(|s| s.numeral()).collect();
        assert_eq!(numerals, vec![1, 2, 3, 4, 5]);
        assert_eq!(Stance::ALL[0].label(), "TF1: Directive and Expert position");
        assert_eq!(Stance::ALL[4].label(), "TF5: Client-led Integration");
    }

    #[test]
    fn test_readiness_serde_uses_display_labels() {
        let json = serde_json::to_string(&ReadinessRating::HighlyOpenAndFiltered).unwrap();
        assert_eq!(json, "\"Highly open and filtered\"");
        let back: ReadinessRating = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ReadinessRating::HighlyOpenAndFiltered);
    }

    #[test]
    fn test_row_completeness_ignores_notes() {
        let mut row = CodingRow {
            therapist_index: Some(1),
            stance: Some(Stance::Tf3),
            impact: Some(Impact::Zero),
            confidence: Some(Confidence::new(3).unwrap()),
            notes: String::new(),
        };
        assert!(row.is_complete());

        row.confidence = None;
        assert!(!row.is_complete());
    }

    #[test]
    fn test_row_transcript_reference_check() {
        let row = CodingRow {
            therapist_index: Some(12),
            ..CodingRow::default()
        };
        assert!(row.references_transcript(&[11, 12, 13]));
        assert!(!row.references_transcript(&[1, 2]));
    }
}

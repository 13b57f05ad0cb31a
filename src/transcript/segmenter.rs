//! Span-capture transcript scanner.
//!
//! A statement opens at a line-leading role marker ("Therapist"/"Client",
//! or a "TS"/"CS" numbered label) and its body runs to the next marker, so
//! multi-line utterances are kept intact rather than dropped. Text before
//! the first marker is ignored. Matching is case-insensitive throughout.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Role, Statement, Transcript};

/// Role marker at the start of a line, with an optional `:`/`-`/`.`
/// separator consumed along with surrounding spaces.
static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:(?P<therapist>therapist\b|ts\d+\b)|(?P<client>client\b|cs\d+\b))[ \t]*[:.\-]?[ \t]*").unwrap()
});

/// Segment a raw transcript document into an ordered statement sequence.
///
/// Per-role indices are assigned from independent 1-based counters in
/// document order. An empty document, or one with no recognized markers,
/// yields an empty transcript.
pub fn segment(raw: &str) -> Transcript {
    let mut statements = Vec::new();
    let mut therapist_count = 0u32;
    let mut client_count = 0u32;

    let markers: Vec<regex::Captures> = MARKER.captures_iter(raw).collect();

    for (i, cap) in markers.iter().enumerate() {
        let marker = cap.get(0).unwrap();
        let body_end = markers
            .get(i + 1)
            .map_or(raw.len(), |next| next.get(0).unwrap().start());
        let text = normalize_body(&raw[marker.end()..body_end]);

        let (role, index) = if cap.name("therapist").is_some() {
            therapist_count += 1;
            (Role::Therapist, therapist_count)
        } else {
            client_count += 1;
            (Role::Client, client_count)
        };

        statements.push(Statement { role, index, text });
    }

    Transcript::new(statements)
}

/// Trim a statement body and collapse escaped newline sequences and
/// interior line breaks to single spaces.
fn normalize_body(body: &str) -> String {
    let unescaped = body.replace("\\n", " ");
    unescaped.split_whitespace().collect::<Vec<_>>().join(" ")
}

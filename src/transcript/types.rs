use std::fmt;

use serde::Serialize;

/// Speaker role of one statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Therapist,
    Client,
}

impl Role {
    /// Tag prefix used throughout the rating UI ("TS" / "CS")
    pub fn tag_prefix(&self) -> &'static str {
        match self {
            Role::Therapist => "TS",
            Role::Client => "CS",
        }
    }
}

/// One utterance extracted from a transcript.
///
/// `index` is 1-based and counts within the statement's own role, so the
/// first therapist statement is TS1 no matter how many client statements
/// preceded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub role: Role,
    pub index: u32,
    pub text: String,
}

impl Statement {
    /// Display tag, e.g. "TS3" or "CS1"
    pub fn tag(&self) -> String {
        format!("{}{}", self.role.tag_prefix(), self.index)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tag(), self.text)
    }
}

/// Ordered statement sequence produced from one raw document.
///
/// Order equals document order across both roles. A transcript with zero
/// statements of one role (or zero statements overall) is legal.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    statements: Vec<Statement>,
}

impl Transcript {
    pub fn new(statements: Vec<Statement>) -> Self {
        Transcript { statements }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Therapist indices in document order (1..=N, no gaps)
    pub fn therapist_indices(&self) -> Vec<u32> {
        self.indices_for(Role::Therapist)
    }

    /// Client indices in document order (1..=N, no gaps)
    pub fn client_indices(&self) -> Vec<u32> {
        self.indices_for(Role::Client)
    }

    fn indices_for(&self, role: Role) -> Vec<u32> {
        self.statements
            .iter()
            .filter(|s| s.role == role)
            .map(|s| s.index)
            .collect()
    }
}

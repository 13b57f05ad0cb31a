//! Rater credential store
//!
//! A JSON table keyed by email, seeded with placeholder entries on first
//! load so a fresh deployment has something to edit. Passwords are stored
//! in the clear, matching the research tool this serves; there is no
//! security model here.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Which batches a rater may code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum BatchAccess {
    /// Explicit batch list
    Listed(Vec<String>),
    /// The keyword "all" grants every batch in the catalog
    Keyword(String),
}

impl BatchAccess {
    /// Resolve against the catalog's batch set
    pub(crate) fn resolve(&self, all_batches: &[String]) -> Vec<String> {
        match self {
            BatchAccess::Listed(batches) => batches.clone(),
            BatchAccess::Keyword(word) if word.eq_ignore_ascii_case("all") => {
                all_batches.to_vec()
            }
            BatchAccess::Keyword(_) => Vec::new(),
        }
    }

    pub(crate) fn allows(&self, batch: &str, all_batches: &[String]) -> bool {
        self.resolve(all_batches).iter().any(|b| b == batch)
    }
}

/// One credential table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CredentialEntry {
    pub name: String,
    pub password: String,
    pub batches: BatchAccess,
}

/// The authenticated rater, as consumed for provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RaterIdentity {
    /// Display name, recorded in the "Rater" column
    pub name: String,
    pub batches: BatchAccess,
}

impl RaterIdentity {
    /// File-name form of the rater: the display name with spaces
    /// underscored, used to name submission CSVs and PDF exports
    pub(crate) fn rater_id(&self) -> String {
        self.name.replace(' ', "_")
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum CredentialError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Failed to read credential file {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write credential file {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file {path} is not valid JSON: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Credential table keyed by lowercase email
pub(crate) type CredentialTable = BTreeMap<String, CredentialEntry>;

/// Load the credential table, seeding the file with placeholder entries if
/// it does not exist yet.
pub(crate) fn load_credentials(path: &Path) -> Result<CredentialTable, CredentialError> {
    if !path.exists() {
        let table = default_credentials();
        save_credentials(path, &table)?;
        info!(path = %path.display(), "Seeded credential file with placeholder entries");
        return Ok(table);
    }

    let contents = fs::read_to_string(path).map_err(|e| CredentialError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&contents).map_err(|e| CredentialError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

pub(crate) fn save_credentials(
    path: &Path,
    table: &CredentialTable,
) -> Result<(), CredentialError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| CredentialError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
    }
    let json = serde_json::to_string_pretty(table).map_err(|e| CredentialError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, json).map_err(|e| CredentialError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Check a login attempt against the table.
///
/// Email lookup is case-insensitive; the password must match exactly.
/// Returns the identity used for provenance and batch gating.
pub(crate) fn authenticate(
    table: &CredentialTable,
    email: &str,
    password: &str,
) -> Result<RaterIdentity, CredentialError> {
    let email_key = email.trim().to_lowercase();
    let entry = table
        .get(&email_key)
        .filter(|entry| entry.password == password)
        .ok_or(CredentialError::InvalidCredentials)?;

    Ok(RaterIdentity {
        name: entry.name.clone(),
        batches: entry.batches.clone(),
    })
}

fn default_credentials() -> CredentialTable {
    let mut table = CredentialTable::new();
    table.insert(
        "researcher@example.org".into(),
        CredentialEntry {
            name: "Lead Researcher".into(),
            password: "changeme".into(),
            batches: BatchAccess::Keyword("all".into()),
        },
    );
    table.insert(
        "rater@example.org".into(),
        CredentialEntry {
            name: "Example Rater".into(),
            password: "changeme".into(),
            batches: BatchAccess::Listed(vec!["Batch_1".into()]),
        },
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_is_email_case_insensitive() {
        let table = default_credentials();
        let identity = authenticate(&table, "Rater@Example.ORG", "changeme").unwrap();
        assert_eq!(identity.name, "Example Rater");
    }

    #[test]
    fn test_rater_id_underscores_display_name() {
        let table = default_credentials();
        let identity = authenticate(&table, "rater@example.org", "changeme").unwrap();
        assert_eq!(identity.rater_id(), "Example_Rater");
    }

    #[test]
    fn test_wrong_password_rejected() {
        let table = default_credentials();
        let result = authenticate(&table, "rater@example.org", "nope");
        assert!(matches!(result, Err(CredentialError::InvalidCredentials)));
    }

    #[test]
    fn test_unknown_email_rejected() {
        let table = default_credentials();
        let result = authenticate(&table, "ghost@example.org", "changeme");
        assert!(matches!(result, Err(CredentialError::InvalidCredentials)));
    }

    #[test]
    fn test_batch_access_resolution() {
        let all = vec!["Batch_1".to_string(), "Batch_2".to_string()];

        let keyword = BatchAccess::Keyword("all".into());
        assert_eq!(keyword.resolve(&all), all);
        assert!(keyword.allows("Batch_2", &all));

        let listed = BatchAccess::Listed(vec!["Batch_1".into()]);
        assert!(listed.allows("Batch_1", &all));
        assert!(!listed.allows("Batch_2", &all));
    }

    #[test]
    fn test_first_load_seeds_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rater_credentials.json");

        let table = load_credentials(&path).unwrap();
        assert!(path.exists());
        assert_eq!(table.len(), 2);

        // second load reads the seeded file back
        let reloaded = load_credentials(&path).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn test_batch_access_round_trips_both_shapes() {
        let json = r#"{"name":"A","password":"p","batches":"all"}"#;
        let entry: CredentialEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.batches, BatchAccess::Keyword("all".into()));

        let json = r#"{"name":"A","password":"p","batches":["Batch_3"]}"#;
        let entry: CredentialEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.batches, BatchAccess::Listed(vec!["Batch_3".into()]));
    }
}

//! Record Types
//!
//! Rows of the legacy `record_a` table and the helpers that turn an escaped
//! wildcard name into its bare form.

use serde::{Deserialize, Serialize};

use crate::error::MigrateError;

/// Escaped form of the wildcard label `*.` as stored in `record_a.fqdn`
pub const ESCAPED_WILDCARD: &str = r"\052.";

/// Literal wildcard label
pub const WILDCARD: &str = "*.";

/// `LIKE` pattern selecting escaped wildcard rows.
///
/// MySQL reads `\\` inside a LIKE pattern as one literal backslash.
pub const WILDCARD_LIKE_PATTERN: &str = r"\\052.%";

/// A row of `record_a`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub fqdn: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub record_type: i32,
    pub content: String,
    pub created_on: i64,
    pub updated_on: Option<i64>,
    pub tid: i64,
}

impl Record {
    /// Name with the escaped wildcard marker removed
    pub fn bare_name(&self) -> Result<String, MigrateError> {
        bare_name(&self.fqdn)
    }
}

/// Payload for a new `record_a` row; `id` and `updated_on` are left to MySQL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub fqdn: String,
    #[serde(rename = "type")]
    pub record_type: i32,
    pub content: String,
    pub created_on: i64,
    pub tid: i64,
}

impl NewRecord {
    /// Copy of `source` renamed to `fqdn`
    pub fn renamed(source: &Record, fqdn: &str) -> Self {
        Self {
            fqdn: fqdn.to_string(),
            record_type: source.record_type,
            content: source.content.clone(),
            created_on: source.created_on,
            tid: source.tid,
        }
    }
}

/// Second segment of `fqdn` split on the escaped wildcard marker.
///
/// `\052.example.com` gives `example.com`. A name without the marker is an
/// error.
pub fn bare_name(fqdn: &str) -> Result<String, MigrateError> {
    fqdn.split(ESCAPED_WILDCARD)
        .nth(1)
        .map(str::to_string)
        .ok_or_else(|| MigrateError::MalformedWildcard(fqdn.to_string()))
}

/// Whether a provider record set name is the wildcard form of `bare`.
///
/// One trailing dot is ignored; both `*.` and `\052.` spellings match.
pub fn is_wildcard_of(record_set_name: &str, bare: &str) -> bool {
    let name = record_set_name
        .strip_suffix('.')
        .unwrap_or(record_set_name);

    [WILDCARD, ESCAPED_WILDCARD].iter().any(|prefix| {
        name.strip_prefix(prefix)
            .map(|rest| rest == bare)
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wildcard_row(fqdn: &str) -> Record {
        Record {
            id: 7,
            fqdn: fqdn.to_string(),
            record_type: 1,
            content: "10.0.0.1".to_string(),
            created_on: 1_520_000_000,
            updated_on: Some(1_520_000_100),
            tid: 42,
        }
    }

    #[test]
    fn test_bare_name_strips_escaped_wildcard() {
        assert_eq!(bare_name(r"\052.example.com").unwrap(), "example.com");
        assert_eq!(
            bare_name(r"\052.abcdef.lb.rancher.cloud").unwrap(),
            "abcdef.lb.rancher.cloud"
        );
    }

    #[test]
    fn test_bare_name_takes_second_segment_only() {
        assert_eq!(bare_name(r"\052.a.\052.b.com").unwrap(), "a.");
    }

    #[test]
    fn test_bare_name_without_marker_is_malformed() {
        let err = bare_name("example.com").unwrap_err();
        assert!(matches!(err, MigrateError::MalformedWildcard(name) if name == "example.com"));
    }

    #[test]
    fn test_wildcard_match_accepts_both_spellings() {
        assert!(is_wildcard_of("*.example.com.", "example.com"));
        assert!(is_wildcard_of(r"\052.example.com.", "example.com"));
        assert!(is_wildcard_of("*.example.com", "example.com"));
    }

    #[test]
    fn test_wildcard_match_rejects_other_names() {
        assert!(!is_wildcard_of("example.com.", "example.com"));
        assert!(!is_wildcard_of("*.sub.example.com.", "example.com"));
        assert!(!is_wildcard_of("*.example.com..", "example.com"));
        assert!(!is_wildcard_of("www.example.com.", "example.com"));
    }

    #[test]
    fn test_new_record_copies_source_fields() {
        let source = wildcard_row(r"\052.example.com");
        let new = NewRecord::renamed(&source, "example.com");

        assert_eq!(new.fqdn, "example.com");
        assert_eq!(new.record_type, source.record_type);
        assert_eq!(new.content, source.content);
        assert_eq!(new.created_on, source.created_on);
        assert_eq!(new.tid, source.tid);
    }

    #[test]
    fn test_record_serialization_uses_column_names() {
        let json = serde_json::to_string(&wildcard_row(r"\052.example.com")).unwrap();
        assert!(json.contains("\"type\":1"));
        assert!(json.contains("\"tid\":42"));
    }
}

//! Types for base URL substitution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of the blocklist: a deprecated URL and what replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubstitutionRule {
    /// Whole base URL match, ignoring case and trailing slashes.
    Exact { from: String, to: String },
    /// Regular expression (e.g. a hostname pattern) with a replacement that
    /// may reference capture groups (`$1`, `${name}`).
    Pattern { pattern: String, replacement: String },
}

/// Errors that can occur while fetching the blocklist.
///
/// These never leave the resolver; they only decide what gets logged.
#[derive(Debug, Error)]
pub enum BlocklistError {
    #[error("Blocklist source connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Blocklist source timed out after {0}ms")]
    Timeout(u64),

    #[error("Blocklist source returned HTTP {0}")]
    Http(u16),

    #[error("Failed to parse blocklist: {0}")]
    Parse(String),

    #[error("Invalid substitution pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Where the blocklist comes from.
#[async_trait]
pub trait BlocklistSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Fetch the current rules.
    async fn fetch(&self) -> Result<Vec<SubstitutionRule>, BlocklistError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_deserialization() {
        let json = r#"[
            {"kind": "exact", "from": "http://old.example.com", "to": "http://new.example.com"},
            {"kind": "pattern", "pattern": "^https?://(www\\.)?old\\.org", "replacement": "https://new.org"}
        ]"#;
        let rules: Vec<SubstitutionRule> = serde_json::from_str(json).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules[0],
            SubstitutionRule::Exact {
                from: "http://old.example.com".to_string(),
                to: "http://new.example.com".to_string(),
            }
        );
        assert!(matches!(rules[1], SubstitutionRule::Pattern { .. }));
    }

    #[test]
    fn test_rule_unknown_kind_fails() {
        let json = r#"{"kind": "prefix", "from": "a", "to": "b"}"#;
        assert!(serde_json::from_str::<SubstitutionRule>(json).is_err());
    }
}

//! Tag types - what the store writes and what it reports back
//!
//! A tag row is one tagging event: (name, author, time). Rows are never
//! deduplicated, so the same name can appear many times on one version.

use chrono::{DateTime, Utc};
use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tag row, assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub i64);

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for TagId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for TagId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(TagId)
    }
}

/// A tag to be written: name, author and when it was applied.
///
/// Reading these back from one version and resubmitting them to another is
/// how tags are copied between versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub name: String,
    pub author: String,
    pub tagged_at: DateTime<Utc>,
}

impl TagRecord {
    /// A record stamped with the current time
    pub fn new(name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            tagged_at: Utc::now(),
        }
    }
}

/// A stored tagging as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tagging {
    pub id: TagId,
    pub name: String,
    pub author: String,
    pub tagged_at: DateTime<Utc>,
    /// Absent when the owning version could not be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
}

/// Number of tag rows sharing one name on a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: u64,
}

/// Author restriction for tagging lookups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthorFilter {
    /// Taggings by every author
    #[default]
    Any,
    /// Taggings by exactly this author
    Exactly(String),
}

impl AuthorFilter {
    pub fn exactly(author: impl Into<String>) -> Self {
        AuthorFilter::Exactly(author.into())
    }

    pub fn author(&self) -> Option<&str> {
        match self {
            AuthorFilter::Any => None,
            AuthorFilter::Exactly(author) => Some(author),
        }
    }
}

impl From<Option<String>> for AuthorFilter {
    fn from(author: Option<String>) -> Self {
        author.map_or(AuthorFilter::Any, AuthorFilter::Exactly)
    }
}

impl fmt::Display for AuthorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorFilter::Any => write!(f, "any author"),
            AuthorFilter::Exactly(author) => write!(f, "{}", author),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_filter_from_option() {
        assert_eq!(AuthorFilter::from(None), AuthorFilter::Any);
        assert_eq!(
            AuthorFilter::from(Some("*".to_string())),
            AuthorFilter::Exactly("*".to_string())
        );
        assert_eq!(AuthorFilter::exactly("alice").author(), Some("alice"));
        assert_eq!(AuthorFilter::Any.author(), None);
    }

    #[test]
    fn test_tagging_omits_missing_path() {
        let tagging = Tagging {
            id: TagId(1),
            name: "release".to_string(),
            author: "alice".to_string(),
            tagged_at: Utc::now(),
            resource_path: None,
        };
        let json = serde_json::to_value(&tagging).unwrap();
        assert!(json.get("resource_path").is_none());
        assert_eq!(json["id"], 1);
    }
}

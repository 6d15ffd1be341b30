//! Tag identifier allocation
//!
//! Two strategies:
//! - `GeneratedKeys`: `INSERT ... RETURNING id`, one statement, no lock
//! - `MaxId`: plain insert followed by `SELECT MAX(id)`, for backends that
//!   cannot hand back generated keys. Both statements run under a process-wide
//!   lock, otherwise two writers can read the same maximum and attach their
//!   taggings to the wrong tag row.

use crate::tag::TagId;
use crate::tenant::TenantId;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Mutex;

/// Guards insert + read-back for the `MaxId` strategy.
static ADD_TAG_LOCK: Mutex<()> = Mutex::new(());

/// How the store learns the id of a freshly inserted tag row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStrategy {
    #[default]
    GeneratedKeys,
    MaxId,
}

/// A tag row about to be inserted
#[derive(Debug, Clone, Copy)]
pub(crate) struct NewTagRow<'a> {
    pub name: &'a str,
    pub author: &'a str,
    pub tagged_at: DateTime<Utc>,
    pub tenant: TenantId,
}

impl KeyStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStrategy::GeneratedKeys => "generated-keys",
            KeyStrategy::MaxId => "max-id",
        }
    }

    /// Insert `row` into the tag table and return its id.
    pub(crate) fn insert_tag(&self, conn: &Connection, row: &NewTagRow<'_>) -> rusqlite::Result<TagId> {
        match self {
            KeyStrategy::GeneratedKeys => conn.query_row(
                "INSERT INTO tag (name, author_id, tagged_time, tenant_id) VALUES (?1, ?2, ?3, ?4) RETURNING id",
                params![row.name, row.author, row.tagged_at, row.tenant],
                |r| r.get(0),
            ),
            KeyStrategy::MaxId => {
                let _guard = ADD_TAG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
                conn.execute(
                    "INSERT INTO tag (name, author_id, tagged_time, tenant_id) VALUES (?1, ?2, ?3, ?4)",
                    params![row.name, row.author, row.tagged_at, row.tenant],
                )?;
                let max: Option<i64> = conn.query_row("SELECT MAX(id) FROM tag", [], |r| r.get(0))?;
                max.map(TagId).ok_or(rusqlite::Error::QueryReturnedNoRows)
            }
        }
    }
}

impl FromStr for KeyStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "generated-keys" | "generated_keys" | "native" | "returning" => Ok(KeyStrategy::GeneratedKeys),
            "max-id" | "max_id" | "locked" => Ok(KeyStrategy::MaxId),
            _ => Err(Error::InvalidArgument(format!("Unknown key strategy: {}", s))),
        }
    }
}

impl std::fmt::Display for KeyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, []).unwrap();
        }
        conn
    }

    fn row(name: &str) -> NewTagRow<'_> {
        NewTagRow {
            name,
            author: "alice",
            tagged_at: Utc::now(),
            tenant: TenantId(1),
        }
    }

    #[test]
    fn test_both_strategies_allocate_increasing_ids() {
        let conn = conn();
        let a = KeyStrategy::GeneratedKeys.insert_tag(&conn, &row("a")).unwrap();
        let b = KeyStrategy::MaxId.insert_tag(&conn, &row("b")).unwrap();
        let c = KeyStrategy::GeneratedKeys.insert_tag(&conn, &row("c")).unwrap();
        assert!(a < b && b < c);

        let name: String = conn
            .query_row("SELECT name FROM tag WHERE id = ?1", [b], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "b");
    }

    #[test]
    fn test_insert_failure_is_reported() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(KeyStrategy::GeneratedKeys.insert_tag(&conn, &row("a")).is_err());
        assert!(KeyStrategy::MaxId.insert_tag(&conn, &row("a")).is_err());
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("native".parse::<KeyStrategy>().unwrap(), KeyStrategy::GeneratedKeys);
        assert_eq!("MAX-ID".parse::<KeyStrategy>().unwrap(), KeyStrategy::MaxId);
        assert!("sequence".parse::<KeyStrategy>().is_err());
    }
}

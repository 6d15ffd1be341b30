//! Tag and tagging operations
//!
//! Every query joins `tag` and `resource_tag` and filters *both* by the
//! caller's tenant. Name matching for existence, search, count and removal
//! lower-cases both sides; stored casing is returned untouched.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, params, params_from_iter};

use super::allocator::NewTagRow;
use super::sqlite::TagStore;
use crate::resource::{ResourceLocator, ResourceVersion};
use crate::tag::{AuthorFilter, TagId, TagRecord, Tagging};
use crate::tenant::TenantId;
use crate::{Error, Result};

impl TagStore {
    // ========== Writes ==========

    /// Tag `version` with `tag_name` on behalf of `author`.
    ///
    /// The tag row and its tagging row are written atomically.
    pub fn add_tagging(&self, tag_name: &str, version: ResourceVersion, author: &str) -> Result<()> {
        let record = TagRecord::new(tag_name, author);
        let tenant = self.tenant_id();

        let write = || -> rusqlite::Result<TagId> {
            let scope = self.write_scope()?;
            let id = self.insert_tagging(&record, version, tenant)?;
            scope.commit()?;
            Ok(id)
        };

        match write() {
            Ok(id) => {
                tracing::debug!("Added tag {} ({}) to version {}", tag_name, id, version);
                Ok(())
            }
            Err(e) => Err(Error::storage(
                format!(
                    "Failed to add tag {} to resource {} by user {}",
                    tag_name,
                    self.describe(version),
                    author
                ),
                e,
            )),
        }
    }

    /// Write every record in `taggings` against `version`, all or nothing.
    pub fn add_taggings(&self, version: ResourceVersion, taggings: &[TagRecord]) -> Result<()> {
        let tenant = self.tenant_id();

        let write = || -> rusqlite::Result<()> {
            let scope = self.write_scope()?;
            for record in taggings {
                self.insert_tagging(record, version, tenant)?;
            }
            scope.commit()
        };

        write().map_err(|e| {
            Error::storage(format!("Failed to add tags to resource {}", self.describe(version)), e)
        })
    }

    /// Copy the taggings of one version onto another.
    ///
    /// Copies get fresh tag rows and ids; nothing is shared between the two
    /// versions afterwards.
    pub fn copy_tags(&self, from: ResourceVersion, to: ResourceVersion) -> Result<()> {
        let records = self.get_tag_dos(from)?;
        self.add_taggings(to, &records)
    }

    /// Taggings follow versions, not paths, so a move needs no rewrite.
    pub fn move_tags(&self, _source: ResourceVersion, _target: ResourceVersion) -> Result<()> {
        Ok(())
    }

    /// See [`move_tags`](Self::move_tags).
    pub fn move_tag_paths(&self, _source: ResourceVersion, _target: ResourceVersion) -> Result<()> {
        Ok(())
    }

    fn insert_tagging(
        &self,
        record: &TagRecord,
        version: ResourceVersion,
        tenant: TenantId,
    ) -> rusqlite::Result<TagId> {
        let row = NewTagRow {
            name: &record.name,
            author: &record.author,
            tagged_at: record.tagged_at,
            tenant,
        };
        let id = self.key_strategy.insert_tag(&self.conn, &row)?;
        self.conn.execute(
            "INSERT INTO resource_tag (tag_id, version, tenant_id) VALUES (?1, ?2, ?3)",
            params![id, version, tenant],
        )?;
        Ok(id)
    }

    // ========== Removal ==========

    /// Remove every tag named `tag_name` (any casing) from `version`.
    /// Returns the number of tag rows removed.
    pub fn remove_tagging(&self, version: ResourceVersion, tag_name: &str) -> Result<usize> {
        self.remove_matching(version, Some(tag_name), &AuthorFilter::Any)
            .map_err(|e| {
                Error::storage(
                    format!("Failed to remove tag {} from resource {}", tag_name, self.describe(version)),
                    e,
                )
            })
    }

    /// Remove the tags named `tag_name` that `author` put on `version`.
    pub fn remove_taggings(&self, version: ResourceVersion, tag_name: &str, author: &str) -> Result<usize> {
        self.remove_matching(version, Some(tag_name), &AuthorFilter::exactly(author))
            .map_err(|e| {
                Error::storage(
                    format!(
                        "Failed to remove tag {} from resource {} by user {}",
                        tag_name,
                        self.describe(version),
                        author
                    ),
                    e,
                )
            })
    }

    /// Drop all tags of a version that is being destroyed.
    pub fn purge_version(&self, version: ResourceVersion) -> Result<usize> {
        self.remove_matching(version, None, &AuthorFilter::Any)
            .map_err(|e| Error::storage(format!("Failed to purge tags of version {}", version), e))
    }

    fn remove_matching(
        &self,
        version: ResourceVersion,
        tag_name: Option<&str>,
        author: &AuthorFilter,
    ) -> rusqlite::Result<usize> {
        let tenant = self.tenant_id();

        let mut sql = String::from(
            "SELECT t.id FROM tag t JOIN resource_tag rt ON rt.tag_id = t.id \
             WHERE rt.version = ?1 AND t.tenant_id = ?2 AND rt.tenant_id = ?2",
        );
        let mut values = vec![Value::Integer(version.0), Value::Integer(tenant.0 as i64)];
        if let Some(name) = tag_name {
            values.push(Value::Text(name.to_string()));
            sql.push_str(&format!(" AND casefold(t.name) = casefold(?{})", values.len()));
        }
        if let Some(author) = author.author() {
            values.push(Value::Text(author.to_string()));
            sql.push_str(&format!(" AND t.author_id = ?{}", values.len()));
        }

        let scope = self.write_scope()?;
        let ids: Vec<TagId> = {
            let mut stmt = self.conn.prepare(&sql)?;
            let ids = stmt
                .query_map(params_from_iter(values.iter()), |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;
            ids
        };
        for id in &ids {
            self.conn.execute(
                "DELETE FROM resource_tag WHERE tag_id = ?1 AND tenant_id = ?2",
                params![id, tenant],
            )?;
            self.conn.execute(
                "DELETE FROM tag WHERE id = ?1 AND tenant_id = ?2",
                params![id, tenant],
            )?;
        }
        scope.commit()?;

        tracing::debug!("Removed {} tag rows from version {}", ids.len(), version);
        Ok(ids.len())
    }

    // ========== Reads ==========

    /// Whether `author` tagged `version` with `tag_name` (any casing).
    pub fn tagging_exists(&self, tag_name: &str, version: ResourceVersion, author: &str) -> Result<bool> {
        let tenant = self.tenant_id();
        self.conn
            .query_row(
                "SELECT t.id FROM tag t JOIN resource_tag rt ON rt.tag_id = t.id \
                 WHERE casefold(t.name) = casefold(?1) AND t.author_id = ?2 AND rt.version = ?3 \
                 AND t.tenant_id = ?4 AND rt.tenant_id = ?4 LIMIT 1",
                params![tag_name, author, version, tenant],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(|e| {
                Error::storage(
                    format!(
                        "Failed to check the existence of the tag {} on resource {} by user {}",
                        tag_name,
                        self.describe(version),
                        author
                    ),
                    e,
                )
            })
    }

    /// Names of all tags on `version`, repeats included.
    pub fn get_tags(&self, version: ResourceVersion) -> Result<Vec<String>> {
        let tenant = self.tenant_id();
        let query = || -> rusqlite::Result<Vec<String>> {
            let mut stmt = self.conn.prepare(
                "SELECT t.name FROM tag t JOIN resource_tag rt ON rt.tag_id = t.id \
                 WHERE rt.version = ?1 AND t.tenant_id = ?2 AND rt.tenant_id = ?2",
            )?;
            let names = stmt
                .query_map(params![version, tenant], |row| row.get(0))?
                .collect();
            names
        };
        query().map_err(|e| {
            Error::storage(
                format!("Failed to get tags associated with the resource path {}", self.describe(version)),
                e,
            )
        })
    }

    /// (name, author, time) of every tag on `version`.
    pub fn get_tag_dos(&self, version: ResourceVersion) -> Result<Vec<TagRecord>> {
        let tenant = self.tenant_id();
        let query = || -> rusqlite::Result<Vec<TagRecord>> {
            let mut stmt = self.conn.prepare(
                "SELECT t.name, t.author_id, t.tagged_time FROM tag t \
                 JOIN resource_tag rt ON rt.tag_id = t.id \
                 WHERE rt.version = ?1 AND t.tenant_id = ?2 AND rt.tenant_id = ?2",
            )?;
            let records = stmt
                .query_map(params![version, tenant], |row| {
                    Ok(TagRecord {
                        name: row.get(0)?,
                        author: row.get(1)?,
                        tagged_at: row.get(2)?,
                    })
                })?
                .collect();
            records
        };
        query().map_err(|e| {
            Error::storage(
                format!("Failed to get tags associated with the resource path {}", self.describe(version)),
                e,
            )
        })
    }

    /// Paths of the resources carrying any of `tag_names` (any casing).
    ///
    /// Each matching version is reported once. Versions the locator cannot
    /// resolve are dropped.
    pub fn get_paths_with_any_tag<S: AsRef<str>>(&self, tag_names: &[S]) -> Result<Vec<String>> {
        if tag_names.is_empty() {
            return Ok(Vec::new());
        }
        let tenant = self.tenant_id();

        let placeholders = (1..=tag_names.len())
            .map(|i| format!("casefold(?{})", i))
            .collect::<Vec<_>>()
            .join(", ");
        let tenant_param = tag_names.len() + 1;
        let sql = format!(
            "SELECT DISTINCT rt.version FROM resource_tag rt JOIN tag t ON rt.tag_id = t.id \
             WHERE casefold(t.name) IN ({}) AND rt.tenant_id = ?{p} AND t.tenant_id = ?{p} \
             ORDER BY rt.version",
            placeholders,
            p = tenant_param
        );

        let mut values: Vec<Value> = tag_names
            .iter()
            .map(|name| Value::Text(name.as_ref().to_string()))
            .collect();
        values.push(Value::Integer(tenant.0 as i64));

        let query = || -> rusqlite::Result<Vec<ResourceVersion>> {
            let mut stmt = self.conn.prepare(&sql)?;
            let versions = stmt
                .query_map(params_from_iter(values.iter()), |row| row.get(0))?
                .collect();
            versions
        };
        let versions = query().map_err(|e| {
            let names: Vec<&str> = tag_names.iter().map(AsRef::as_ref).collect();
            Error::storage(format!("Failed to get resource paths with any of the tags {:?}", names), e)
        })?;

        Ok(resolve_paths(self.locator.as_ref(), &versions))
    }

    /// Number of tags named `tag_name` (any casing) on `version`.
    pub fn get_tag_count(&self, version: ResourceVersion, tag_name: &str) -> Result<u64> {
        let tenant = self.tenant_id();
        self.conn
            .query_row(
                "SELECT COUNT(t.id) FROM tag t JOIN resource_tag rt ON rt.tag_id = t.id \
                 WHERE casefold(t.name) = casefold(?1) AND rt.version = ?2 \
                 AND t.tenant_id = ?3 AND rt.tenant_id = ?3",
                params![tag_name, version, tenant],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count as u64)
            .map_err(|e| {
                Error::storage(
                    format!("Failed to get tag count of tag {} on resource {}", tag_name, self.describe(version)),
                    e,
                )
            })
    }

    /// Taggings named exactly `tag_name` on `version`, optionally restricted
    /// to one author.
    pub fn get_tagging(
        &self,
        version: ResourceVersion,
        tag_name: &str,
        author: &AuthorFilter,
    ) -> Result<Vec<Tagging>> {
        let tenant = self.tenant_id();

        let mut sql = String::from(
            "SELECT t.id, t.name, t.author_id, t.tagged_time FROM tag t \
             JOIN resource_tag rt ON rt.tag_id = t.id \
             WHERE rt.version = ?1 AND t.name = ?2 AND t.tenant_id = ?3 AND rt.tenant_id = ?3",
        );
        let mut values = vec![
            Value::Integer(version.0),
            Value::Text(tag_name.to_string()),
            Value::Integer(tenant.0 as i64),
        ];
        if let Some(author) = author.author() {
            sql.push_str(" AND t.author_id = ?4");
            values.push(Value::Text(author.to_string()));
        }

        let query = || -> rusqlite::Result<Vec<Tagging>> {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), tagging_row)?
                .collect();
            rows
        };
        let rows = query().map_err(|e| {
            Error::storage(
                format!(
                    "Failed to get tagging information for tag {} on resource {} by user {}",
                    tag_name,
                    self.describe(version),
                    author
                ),
                e,
            )
        })?;

        Ok(self.with_path(version, rows))
    }

    /// Every tagging on `version`.
    pub fn get_taggings(&self, version: ResourceVersion) -> Result<Vec<Tagging>> {
        let tenant = self.tenant_id();
        let query = || -> rusqlite::Result<Vec<Tagging>> {
            let mut stmt = self.conn.prepare(
                "SELECT t.id, t.name, t.author_id, t.tagged_time FROM tag t \
                 JOIN resource_tag rt ON rt.tag_id = t.id \
                 WHERE rt.version = ?1 AND t.tenant_id = ?2 AND rt.tenant_id = ?2",
            )?;
            let rows = stmt.query_map(params![version, tenant], tagging_row)?.collect();
            rows
        };
        let rows = query().map_err(|e| {
            Error::storage(
                format!("Failed to get tagging information for the resource {}", self.describe(version)),
                e,
            )
        })?;

        Ok(self.with_path(version, rows))
    }

    /// Look up one tagging by id, resolving the path of its version.
    ///
    /// Returns `None` for unknown ids. A version that no longer resolves
    /// leaves `resource_path` empty.
    pub fn get_tagging_by_id(&self, id: TagId) -> Result<Option<Tagging>> {
        let tenant = self.tenant_id();
        let found = self
            .conn
            .query_row(
                "SELECT t.id, t.name, t.author_id, t.tagged_time, rt.version FROM tag t \
                 JOIN resource_tag rt ON rt.tag_id = t.id \
                 WHERE t.id = ?1 AND t.tenant_id = ?2 AND rt.tenant_id = ?2",
                params![id, tenant],
                |row| Ok((tagging_row(row)?, row.get::<_, ResourceVersion>(4)?)),
            )
            .optional()
            .map_err(|e| Error::storage(format!("Failed to get tagging information for tag ID {}", id), e))?;

        Ok(found.map(|(mut tagging, version)| {
            if version.is_resolvable() {
                tagging.resource_path = self.locator.path_for_version(version);
            }
            if tagging.resource_path.is_none() {
                tracing::debug!("Version {} of tagging {} does not resolve to a path", version, id);
            }
            tagging
        }))
    }

    fn with_path(&self, version: ResourceVersion, mut rows: Vec<Tagging>) -> Vec<Tagging> {
        if rows.is_empty() {
            return rows;
        }
        let path = self.locator.path_for_version(version);
        for row in &mut rows {
            row.resource_path = path.clone();
        }
        rows
    }
}

fn tagging_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tagging> {
    Ok(Tagging {
        id: row.get(0)?,
        name: row.get(1)?,
        author: row.get(2)?,
        tagged_at: row.get::<_, DateTime<Utc>>(3)?,
        resource_path: None,
    })
}

/// Resolve `versions` in one batch, keeping their order and dropping the ones
/// that are placeholders, stale or deleted.
fn resolve_paths(locator: &dyn ResourceLocator, versions: &[ResourceVersion]) -> Vec<String> {
    let wanted: Vec<ResourceVersion> = versions.iter().copied().filter(|v| v.is_resolvable()).collect();
    let mut resolved = locator.paths_for_versions(&wanted);

    let mut seen = HashSet::new();
    let mut paths = Vec::with_capacity(resolved.len());
    for version in wanted {
        match resolved.remove(&version) {
            Some(path) => {
                if seen.insert(path.clone()) {
                    paths.push(path);
                }
            }
            None => tracing::debug!("Dropping unresolved version {}", version),
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MapLocator;
    use crate::storage::KeyStrategy;
    use crate::tenant::SessionTenant;
    use std::sync::Arc;

    const V100: ResourceVersion = ResourceVersion(100);
    const V200: ResourceVersion = ResourceVersion(200);

    fn locator() -> Arc<MapLocator> {
        let locator = MapLocator::new();
        locator.insert(V100, "/_system/governance/service.wsdl");
        locator.insert(V200, "/_system/governance/service-copy.wsdl");
        Arc::new(locator)
    }

    fn store() -> TagStore {
        TagStore::open_in_memory(Arc::new(TenantId(1)), locator()).unwrap()
    }

    #[test]
    fn test_release_scenario() {
        let store = store();

        store.add_tagging("release", V100, "alice").unwrap();
        assert_eq!(store.get_tag_count(V100, "release").unwrap(), 1);

        store.add_tagging("release", V100, "bob").unwrap();
        assert_eq!(store.get_tag_count(V100, "release").unwrap(), 2);

        let paths = store.get_paths_with_any_tag(&["release"]).unwrap();
        assert_eq!(paths, vec!["/_system/governance/service.wsdl".to_string()]);
    }

    #[test]
    fn test_tagging_exists_ignores_case() {
        let store = store();
        store.add_tagging("foo", V100, "alice").unwrap();

        assert!(store.tagging_exists("Foo", V100, "alice").unwrap());
        assert!(store.tagging_exists("FOO", V100, "alice").unwrap());
        assert!(!store.tagging_exists("foo", V100, "bob").unwrap());
        assert!(!store.tagging_exists("foo", V200, "alice").unwrap());
        assert!(!store.tagging_exists("bar", V100, "alice").unwrap());
    }

    #[test]
    fn test_stored_casing_is_kept() {
        let store = store();
        store.add_tagging("Release-Candidate", V100, "alice").unwrap();

        assert_eq!(store.get_tags(V100).unwrap(), vec!["Release-Candidate".to_string()]);
        assert_eq!(store.get_tag_count(V100, "release-candidate").unwrap(), 1);
    }

    #[test]
    fn test_non_ascii_names_ignore_case() {
        let store = store();
        store.add_tagging("Ärger", V100, "alice").unwrap();
        store.add_tagging("ÉTÉ", V100, "bob").unwrap();

        assert!(store.tagging_exists("ärger", V100, "alice").unwrap());
        assert!(store.tagging_exists("ÄRGER", V100, "alice").unwrap());
        assert_eq!(store.get_tag_count(V100, "été").unwrap(), 1);
        assert_eq!(store.get_paths_with_any_tag(&["été"]).unwrap().len(), 1);

        assert_eq!(store.remove_tagging(V100, "ärger").unwrap(), 1);
        assert_eq!(store.get_tags(V100).unwrap(), vec!["ÉTÉ".to_string()]);
    }

    #[test]
    fn test_tags_are_not_deduplicated() {
        let store = store();
        store.add_tagging("wsdl", V100, "alice").unwrap();
        store.add_tagging("wsdl", V100, "alice").unwrap();

        assert_eq!(store.get_tags(V100).unwrap().len(), 2);
        assert_eq!(store.get_taggings(V100).unwrap().len(), 2);
    }

    #[test]
    fn test_tag_count_zero_when_absent() {
        let store = store();
        assert_eq!(store.get_tag_count(V100, "missing").unwrap(), 0);
        assert!(store.get_tags(V100).unwrap().is_empty());
    }

    #[test]
    fn test_tenant_isolation() {
        let session = Arc::new(SessionTenant::new(TenantId(1)));
        let store = TagStore::open_in_memory(session.clone(), locator()).unwrap();

        store.add_tagging("shared", V100, "alice").unwrap();
        session.set(TenantId(2));
        store.add_tagging("shared", V100, "mallory").unwrap();
        store.add_tagging("other", V100, "mallory").unwrap();

        session.set(TenantId(1));
        assert_eq!(store.get_tags(V100).unwrap(), vec!["shared".to_string()]);
        assert_eq!(store.get_tag_count(V100, "shared").unwrap(), 1);
        assert!(!store.tagging_exists("shared", V100, "mallory").unwrap());
        assert!(store.get_paths_with_any_tag(&["other"]).unwrap().is_empty());

        let only_own = store
            .get_taggings(V100)
            .unwrap()
            .into_iter()
            .all(|t| t.author == "alice");
        assert!(only_own);

        session.set(TenantId(2));
        assert_eq!(store.get_tags(V100).unwrap().len(), 2);
    }

    #[test]
    fn test_tenant_cannot_read_foreign_tagging_by_id() {
        let session = Arc::new(SessionTenant::new(TenantId(1)));
        let store = TagStore::open_in_memory(session.clone(), locator()).unwrap();
        store.add_tagging("secret", V100, "alice").unwrap();
        let id = store.get_taggings(V100).unwrap()[0].id;

        session.set(TenantId(2));
        assert!(store.get_tagging_by_id(id).unwrap().is_none());
        assert_eq!(store.remove_tagging(V100, "secret").unwrap(), 0);

        session.set(TenantId(1));
        assert!(store.get_tagging_by_id(id).unwrap().is_some());
    }

    #[test]
    fn test_copy_tags_creates_new_rows() {
        let store = store();
        store.add_tagging("release", V100, "alice").unwrap();
        store.add_tagging("stable", V100, "bob").unwrap();

        store.copy_tags(V100, V200).unwrap();

        let pairs = |v| {
            let mut pairs: Vec<(String, String)> = store
                .get_tag_dos(v)
                .unwrap()
                .into_iter()
                .map(|r| (r.name, r.author))
                .collect();
            pairs.sort();
            pairs
        };
        assert_eq!(pairs(V100), pairs(V200));

        let source_ids: HashSet<TagId> = store.get_taggings(V100).unwrap().iter().map(|t| t.id).collect();
        let copy_ids: HashSet<TagId> = store.get_taggings(V200).unwrap().iter().map(|t| t.id).collect();
        assert!(source_ids.is_disjoint(&copy_ids));

        store.remove_tagging(V200, "release").unwrap();
        assert_eq!(store.get_tag_count(V100, "release").unwrap(), 1);
        assert_eq!(store.get_tag_count(V200, "release").unwrap(), 0);
    }

    #[test]
    fn test_copy_keeps_original_timestamps() {
        let store = store();
        let tagged_at = "2020-01-02T03:04:05Z".parse::<DateTime<Utc>>().unwrap();
        store
            .add_taggings(
                V100,
                &[TagRecord {
                    name: "legacy".to_string(),
                    author: "carol".to_string(),
                    tagged_at,
                }],
            )
            .unwrap();

        store.copy_tags(V100, V200).unwrap();
        assert_eq!(store.get_tag_dos(V200).unwrap()[0].tagged_at, tagged_at);
    }

    #[test]
    fn test_add_taggings_is_all_or_nothing() {
        let store = store();
        store.add_tagging("keep", V100, "alice").unwrap();
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_bad AFTER INSERT ON tag WHEN NEW.name = 'bad' \
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let batch = vec![
            TagRecord::new("one", "alice"),
            TagRecord::new("two", "alice"),
            TagRecord::new("bad", "alice"),
        ];
        let err = store.add_taggings(V100, &batch).unwrap_err();
        assert!(err.to_string().contains("/_system/governance/service.wsdl"));

        assert_eq!(store.get_tags(V100).unwrap(), vec!["keep".to_string()]);
        assert_eq!(store.stats().unwrap().tags, 1);
    }

    #[test]
    fn test_failed_add_leaves_no_partial_rows() {
        let store = store();
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_link BEFORE INSERT ON resource_tag \
                 BEGIN SELECT RAISE(ABORT, 'no links'); END;",
            )
            .unwrap();

        let err = store.add_tagging("orphan", V100, "alice").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("orphan"));
        assert!(message.contains("alice"));
        assert!(message.contains("/_system/governance/service.wsdl"));

        let stats = store.stats().unwrap();
        assert_eq!(stats.tags, 0);
        assert_eq!(stats.taggings, 0);
    }

    #[test]
    fn test_wildcard_author() {
        let store = store();
        store.add_tagging("foo", V100, "alice").unwrap();
        store.add_tagging("foo", V100, "bob").unwrap();
        store.add_tagging("bar", V100, "alice").unwrap();

        let any = store.get_tagging(V100, "foo", &AuthorFilter::Any).unwrap();
        assert_eq!(any.len(), 2);

        let alice = store.get_tagging(V100, "foo", &AuthorFilter::exactly("alice")).unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].author, "alice");
        assert_eq!(alice[0].resource_path.as_deref(), Some("/_system/governance/service.wsdl"));

        let star = store.get_tagging(V100, "foo", &AuthorFilter::exactly("*")).unwrap();
        assert!(star.is_empty());
    }

    #[test]
    fn test_tagging_by_id_without_path() {
        let locator = locator();
        let store = TagStore::open_in_memory(Arc::new(TenantId(1)), locator.clone()).unwrap();
        store.add_tagging("gone", V100, "alice").unwrap();
        let id = store.get_taggings(V100).unwrap()[0].id;

        let tagging = store.get_tagging_by_id(id).unwrap().unwrap();
        assert_eq!(tagging.resource_path.as_deref(), Some("/_system/governance/service.wsdl"));

        locator.remove(V100);
        let tagging = store.get_tagging_by_id(id).unwrap().unwrap();
        assert_eq!(tagging.name, "gone");
        assert_eq!(tagging.resource_path, None);

        assert!(store.get_tagging_by_id(TagId(9999)).unwrap().is_none());
    }

    #[test]
    fn test_paths_with_any_tag() {
        let locator = locator();
        let store = TagStore::open_in_memory(Arc::new(TenantId(1)), locator.clone()).unwrap();
        store.add_tagging("Alpha", V100, "alice").unwrap();
        store.add_tagging("beta", V100, "alice").unwrap();
        store.add_tagging("beta", V200, "bob").unwrap();
        store.add_tagging("beta", ResourceVersion(300), "bob").unwrap();

        let paths = store.get_paths_with_any_tag(&["ALPHA", "Beta"]).unwrap();
        assert_eq!(paths.len(), 2);

        locator.remove(V200);
        let paths = store.get_paths_with_any_tag(&["beta"]).unwrap();
        assert_eq!(paths, vec!["/_system/governance/service.wsdl".to_string()]);

        let empty: [&str; 0] = [];
        assert!(store.get_paths_with_any_tag(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_remove_by_author_and_purge() {
        let store = store();
        store.add_tagging("foo", V100, "alice").unwrap();
        store.add_tagging("FOO", V100, "bob").unwrap();
        store.add_tagging("bar", V100, "bob").unwrap();

        assert_eq!(store.remove_taggings(V100, "foo", "bob").unwrap(), 1);
        assert!(store.tagging_exists("foo", V100, "alice").unwrap());
        assert!(!store.tagging_exists("foo", V100, "bob").unwrap());

        assert_eq!(store.purge_version(V100).unwrap(), 2);
        assert!(store.get_taggings(V100).unwrap().is_empty());
        assert_eq!(store.stats().unwrap().tags, 0);
    }

    #[test]
    fn test_moves_are_no_ops() {
        let store = store();
        store.add_tagging("foo", V100, "alice").unwrap();
        store.move_tags(V100, V200).unwrap();
        store.move_tag_paths(V100, V200).unwrap();

        assert_eq!(store.get_tags(V100).unwrap().len(), 1);
        assert!(store.get_tags(V200).unwrap().is_empty());
    }

    #[test]
    fn test_max_id_strategy_links_the_right_row() {
        let store = store().with_key_strategy(KeyStrategy::MaxId);
        store.add_tagging("first", V100, "alice").unwrap();
        store.add_tagging("second", V200, "bob").unwrap();

        let second = &store.get_taggings(V200).unwrap()[0];
        assert_eq!(second.name, "second");
        assert_eq!(store.get_tagging_by_id(second.id).unwrap().unwrap().author, "bob");
    }
}

//! Aggregated tag counts with optional windowing
//!
//! The total is taken with a separate `COUNT(*)` over the grouped query, so
//! the reported row count never depends on the page that was returned.

use rusqlite::params;

use super::sqlite::TagStore;
use crate::pagination::{PaginationContext, RequestContext};
use crate::resource::ResourceVersion;
use crate::tag::TagCount;
use crate::{Error, Result};

const GROUPED_COUNTS: &str = "SELECT t.name, COUNT(t.id) AS tag_count FROM tag t \
     JOIN resource_tag rt ON rt.tag_id = t.id \
     WHERE rt.version = ?1 AND t.tenant_id = ?2 AND rt.tenant_id = ?2 \
     GROUP BY t.name";

impl TagStore {
    /// Tag names on `version` with the number of rows carrying each name.
    ///
    /// When pagination is enabled and `request` asks for a window, only that
    /// window is returned and the total number of names is reported through
    /// [`RequestContext::set_row_count`].
    pub fn get_tags_with_count(
        &self,
        version: ResourceVersion,
        request: Option<&dyn RequestContext>,
    ) -> Result<Vec<TagCount>> {
        let window = match request {
            Some(request) if self.pagination_enabled => request.pagination().map(|page| (request, page)),
            _ => None,
        };

        let context = || format!("Failed to get tags and tag counts of the resource {}", self.describe(version));

        match window {
            None => self.all_counts(version).map_err(|e| Error::storage(context(), e)),
            Some((request, page)) => {
                let (rows, total) = self.page_counts(version, &page).map_err(|e| Error::storage(context(), e))?;
                if page.offset() >= total {
                    tracing::debug!("start index {} doesn't exist in the result set", page.start.max(1));
                }
                request.set_row_count(total);
                Ok(rows)
            }
        }
    }

    fn all_counts(&self, version: ResourceVersion) -> rusqlite::Result<Vec<TagCount>> {
        let tenant = self.tenant_id();
        let mut stmt = self.conn.prepare(GROUPED_COUNTS)?;
        let rows = stmt.query_map(params![version, tenant], tag_count_row)?.collect();
        rows
    }

    fn page_counts(
        &self,
        version: ResourceVersion,
        page: &PaginationContext,
    ) -> rusqlite::Result<(Vec<TagCount>, usize)> {
        let tenant = self.tenant_id();

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM ({})", GROUPED_COUNTS),
            params![version, tenant],
            |row| row.get(0),
        )?;

        let sql = match page.order_clause() {
            Some(order) => format!("{} {} LIMIT ?3 OFFSET ?4", GROUPED_COUNTS, order),
            None => format!("{} LIMIT ?3 OFFSET ?4", GROUPED_COUNTS),
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    version,
                    tenant,
                    i64::try_from(page.count).unwrap_or(i64::MAX),
                    i64::try_from(page.offset()).unwrap_or(i64::MAX)
                ],
                tag_count_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total as usize))
    }
}

fn tag_count_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TagCount> {
    Ok(TagCount {
        name: row.get(0)?,
        count: row.get::<_, i64>(1)? as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{PageRequest, SortField, SortOrder};
    use crate::resource::MapLocator;
    use crate::tenant::TenantId;
    use std::sync::Arc;

    const V: ResourceVersion = ResourceVersion(100);

    fn seeded() -> TagStore {
        let store = TagStore::open_in_memory(Arc::new(TenantId(1)), Arc::new(MapLocator::new())).unwrap();
        for (name, times) in [("alpha", 1), ("beta", 3), ("gamma", 2), ("delta", 5)] {
            for i in 0..times {
                store.add_tagging(name, V, &format!("user{}", i)).unwrap();
            }
        }
        store
    }

    #[test]
    fn test_unpaginated_returns_everything() {
        let store = seeded();
        let mut counts = store.get_tags_with_count(V, None).unwrap();
        counts.sort_by(|a, b| a.name.cmp(&b.name));
        let flat: Vec<(&str, u64)> = counts.iter().map(|c| (c.name.as_str(), c.count)).collect();
        assert_eq!(flat, vec![("alpha", 1), ("beta", 3), ("delta", 5), ("gamma", 2)]);

        let request = PageRequest::unpaginated();
        assert_eq!(store.get_tags_with_count(V, Some(&request)).unwrap().len(), 4);
        assert_eq!(request.row_count(), None);
    }

    #[test]
    fn test_total_is_independent_of_window() {
        let store = seeded();
        for (start, count) in [(1, 2), (3, 10), (0, 1), (4, 1), (9, 3), (2, 0)] {
            let request = PageRequest::new(PaginationContext::new(start, count));
            store.get_tags_with_count(V, Some(&request)).unwrap();
            assert_eq!(request.row_count(), Some(4), "window ({}, {})", start, count);
        }
    }

    #[test]
    fn test_sorted_window() {
        let store = seeded();
        let request = PageRequest::new(PaginationContext::new(1, 2).sorted(SortField::TagCount, SortOrder::Desc));
        let page = store.get_tags_with_count(V, Some(&request)).unwrap();
        let names: Vec<&str> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["delta", "beta"]);

        let request = PageRequest::new(PaginationContext::new(2, 2).sorted(SortField::TagName, SortOrder::Asc));
        let page = store.get_tags_with_count(V, Some(&request)).unwrap();
        let names: Vec<&str> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "delta"]);
    }

    #[test]
    fn test_start_zero_is_first_row() {
        let store = seeded();
        let sort = |start| {
            let request = PageRequest::new(PaginationContext::new(start, 1).sorted(SortField::TagName, SortOrder::Asc));
            store.get_tags_with_count(V, Some(&request)).unwrap()
        };
        assert_eq!(sort(0), sort(1));
        assert_eq!(sort(0)[0].name, "alpha");
    }

    #[test]
    fn test_start_past_end_is_empty_page() {
        let store = seeded();
        let request = PageRequest::new(PaginationContext::new(20, 5));
        assert!(store.get_tags_with_count(V, Some(&request)).unwrap().is_empty());
        assert_eq!(request.row_count(), Some(4));
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let store = seeded();
        let request = PageRequest::new(PaginationContext::new(2, usize::MAX).sorted(SortField::TagName, SortOrder::Asc));
        let names: Vec<String> = store
            .get_tags_with_count(V, Some(&request))
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["beta", "delta", "gamma"]);
        assert_eq!(request.row_count(), Some(4));

        let request = PageRequest::new(PaginationContext::new(usize::MAX, usize::MAX));
        assert!(store.get_tags_with_count(V, Some(&request)).unwrap().is_empty());
        assert_eq!(request.row_count(), Some(4));
    }

    #[test]
    fn test_disabled_pagination_ignores_window() {
        let store = seeded().with_pagination(false);
        let request = PageRequest::new(PaginationContext::new(1, 1));
        assert_eq!(store.get_tags_with_count(V, Some(&request)).unwrap().len(), 4);
        assert_eq!(request.row_count(), None);
    }
}

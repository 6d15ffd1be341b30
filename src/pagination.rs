//! Pagination requests for aggregated tag counts
//!
//! A caller opts into windowing by handing the store a [`RequestContext`] that
//! carries a [`PaginationContext`]. The store reads the window from it and
//! writes the total row count back, independent of the page returned.
//!
//! Sorting is restricted to [`SortField`] and [`SortOrder`]. Raw strings are
//! parsed against that allow-list and never reach the SQL text.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

/// Columns of the aggregated tag-count query that callers may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    TagName,
    TagCount,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::TagName => "name",
            SortField::TagCount => "count",
        }
    }

    /// The fixed SQL expression this field sorts on
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            SortField::TagName => "t.name",
            SortField::TagCount => "tag_count",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "name" | "tag" | "tag_name" | "tagname" => Ok(SortField::TagName),
            "count" | "tag_count" | "tagcount" => Ok(SortField::TagCount),
            _ => Err(Error::InvalidArgument(format!("Unknown sort field: {}", s))),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(Error::InvalidArgument(format!("Unknown sort order: {}", s))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The window a caller asked for.
///
/// `start` is 1-based; a start of 0 is treated as 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationContext {
    pub start: usize,
    pub count: usize,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

impl PaginationContext {
    pub fn new(start: usize, count: usize) -> Self {
        Self {
            start,
            count,
            sort_by: None,
            sort_order: None,
        }
    }

    pub fn sorted(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.sort_order = Some(order);
        self
    }

    /// Build a context from raw request values.
    ///
    /// Empty sort strings mean "unsorted". Anything else must name a known
    /// field or order, otherwise this fails with [`Error::InvalidArgument`].
    pub fn from_raw(start: i64, count: i64, sort_by: &str, sort_order: &str) -> Result<Self> {
        if start < 0 {
            return Err(Error::InvalidArgument(format!("Negative page start: {}", start)));
        }
        if count < 0 {
            return Err(Error::InvalidArgument(format!("Negative page size: {}", count)));
        }

        let sort_by = parse_optional::<SortField>(sort_by)?;
        let sort_order = parse_optional::<SortOrder>(sort_order)?;

        Ok(Self {
            start: start as usize,
            count: count as usize,
            sort_by,
            sort_order,
        })
    }

    /// Zero-based offset of the first row in the page
    pub fn offset(&self) -> usize {
        self.start.max(1) - 1
    }

    /// ORDER BY clause, present only when both field and order were given
    pub(crate) fn order_clause(&self) -> Option<String> {
        match (self.sort_by, self.sort_order) {
            (Some(field), Some(order)) => {
                Some(format!("ORDER BY {} {}", field.as_sql(), order.as_sql()))
            }
            _ => None,
        }
    }
}

fn parse_optional<T: FromStr<Err = Error>>(raw: &str) -> Result<Option<T>> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        raw.parse().map(Some)
    }
}

/// The caller's request, as seen by the pagination controller.
pub trait RequestContext {
    /// The requested window, or `None` when the request carries no
    /// pagination headers.
    fn pagination(&self) -> Option<PaginationContext>;

    /// Report the total number of rows in the unpaginated result.
    fn set_row_count(&self, rows: usize);
}

/// A request context holding an optional window and the reported total.
#[derive(Debug, Default)]
pub struct PageRequest {
    context: Option<PaginationContext>,
    row_count: Cell<Option<usize>>,
}

impl PageRequest {
    /// A request that asks for the given window
    pub fn new(context: PaginationContext) -> Self {
        Self {
            context: Some(context),
            row_count: Cell::new(None),
        }
    }

    /// A request without pagination headers
    pub fn unpaginated() -> Self {
        Self::default()
    }

    /// Total reported by the last paginated query, if any
    pub fn row_count(&self) -> Option<usize> {
        self.row_count.get()
    }
}

impl RequestContext for PageRequest {
    fn pagination(&self) -> Option<PaginationContext> {
        self.context
    }

    fn set_row_count(&self, rows: usize) {
        self.row_count.set(Some(rows));
    }
}

//! Storage Layer - SQLite-backed tag persistence
//!
//! System of record is SQLite with tables:
//! - tag(id, name, author_id, tagged_time, tenant_id)
//! - resource_tag(tag_id, version, tenant_id)

pub mod schema;
pub mod sqlite;
mod allocator;
mod paging;
mod tags;

pub use allocator::KeyStrategy;
pub use sqlite::{DbStats, TagStore, DEFAULT_BUSY_TIMEOUT};

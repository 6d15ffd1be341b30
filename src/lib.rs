//! # Regtags - Multi-tenant tag persistence for a versioned resource registry
//!
//! Regtags attaches free-text tags to immutable resource *versions*:
//! - Tag rows (name, author, time) plus one tagging row per tag, written atomically
//! - Tenant-scoped queries with case-insensitive tag matching
//! - Aggregated tag counts with optional windowing and an allow-listed sort
//! - Version to path resolution through an injected [`ResourceLocator`]

pub mod tenant;
pub mod resource;
pub mod tag;
pub mod pagination;
pub mod storage;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use tenant::{SessionTenant, TenantContext, TenantId};
pub use resource::{MapLocator, ResourceLocator, ResourceVersion};
pub use tag::{AuthorFilter, TagCount, TagId, TagRecord, Tagging};
pub use pagination::{PageRequest, PaginationContext, RequestContext, SortField, SortOrder};
pub use storage::{KeyStrategy, TagStore};

/// Result type alias for Regtags operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Regtags operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any failure reported by the backing store. `context` names the tag,
    /// resource and author the failed operation was working on.
    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a storage error and log it, so that callers who only see the
    /// propagated value still leave a trace at the failure site.
    pub fn storage(context: impl Into<String>, source: rusqlite::Error) -> Self {
        let context = context.into();
        tracing::error!(error = %source, "{}", context);
        Error::Storage { context, source }
    }

    /// Returns true for errors caused by bad caller input rather than storage.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }
}

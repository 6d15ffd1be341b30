//! SQLite storage implementation

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

use super::allocator::KeyStrategy;
use super::schema;
use crate::resource::{ResourceLocator, ResourceVersion};
use crate::tenant::{TenantContext, TenantId};
use crate::{Error, Result};

/// Default wait for a competing writer before giving up with `SQLITE_BUSY`.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// SQLite-backed tag store for one connection.
///
/// Every statement is bound to the tenant reported by the injected
/// [`TenantContext`]; paths are resolved through the injected
/// [`ResourceLocator`]. Each thread should own its own store.
pub struct TagStore {
    pub(super) conn: Connection,
    tenant: Arc<dyn TenantContext>,
    pub(super) locator: Arc<dyn ResourceLocator>,
    pub(super) key_strategy: KeyStrategy,
    pub(super) pagination_enabled: bool,
}

impl TagStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(
        path: &Path,
        tenant: Arc<dyn TenantContext>,
        locator: Arc<dyn ResourceLocator>,
    ) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("Failed to open tag database {}", path.display()), e))?;
        Self::with_connection(conn, tenant, locator)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(
        tenant: Arc<dyn TenantContext>,
        locator: Arc<dyn ResourceLocator>,
    ) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage("Failed to open in-memory tag database", e))?;
        Self::with_connection(conn, tenant, locator)
    }

    /// Wrap an existing connection, creating the schema if needed
    pub fn with_connection(
        conn: Connection,
        tenant: Arc<dyn TenantContext>,
        locator: Arc<dyn ResourceLocator>,
    ) -> Result<Self> {
        let store = Self {
            conn,
            tenant,
            locator,
            key_strategy: KeyStrategy::default(),
            pagination_enabled: true,
        };
        store.set_busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        store.register_functions()?;
        store.initialize_schema()?;
        Ok(store)
    }

    /// Choose how tag ids are read back after insert
    pub fn with_key_strategy(mut self, strategy: KeyStrategy) -> Self {
        tracing::debug!("Tag id allocation strategy: {}", strategy);
        self.key_strategy = strategy;
        self
    }

    /// Enable or disable windowing of tag counts for every request
    pub fn with_pagination(mut self, enabled: bool) -> Self {
        self.pagination_enabled = enabled;
        self
    }

    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn
            .busy_timeout(timeout)
            .map_err(|e| Error::storage("Failed to set busy timeout", e))
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    /// `casefold(text)` lower-cases with full Unicode rules. SQLite's own
    /// `lower()` only folds ASCII.
    fn register_functions(&self) -> Result<()> {
        self.conn
            .create_scalar_function(
                "casefold",
                1,
                FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
                |ctx| Ok(ctx.get::<String>(0)?.to_lowercase()),
            )
            .map_err(|e| Error::storage("Failed to register casefold()", e))
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn
                .execute(stmt, [])
                .map_err(|e| Error::storage("Failed to initialize tag schema", e))?;
        }
        Ok(())
    }

    /// Tenant of the current caller
    pub fn tenant_id(&self) -> TenantId {
        self.tenant.current_tenant_id()
    }

    /// Human-readable name of a version for error messages: its path when
    /// resolvable, otherwise the bare version number.
    pub(super) fn describe(&self, version: ResourceVersion) -> String {
        self.locator
            .path_for_version(version)
            .unwrap_or_else(|| format!("<version {}>", version))
    }

    pub(super) fn write_scope(&self) -> rusqlite::Result<WriteScope<'_>> {
        WriteScope::begin(&self.conn)
    }

    // ========== Transactions ==========

    /// Begin an outer transaction. Writes issued before [`commit`](Self::commit)
    /// nest inside it as savepoints.
    pub fn begin_transaction(&self) -> Result<()> {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| Error::storage("Failed to begin transaction", e))
    }

    /// Commit a transaction
    pub fn commit(&self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| Error::storage("Failed to commit transaction", e))
    }

    /// Rollback a transaction
    pub fn rollback(&self) -> Result<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| Error::storage("Failed to roll back transaction", e))
    }

    /// Get statistics for the current tenant
    pub fn stats(&self) -> Result<DbStats> {
        let tenant = self.tenant_id();
        let count = |sql: &str| -> rusqlite::Result<usize> {
            let n: i64 = self.conn.query_row(sql, [tenant], |row| row.get(0))?;
            Ok(n as usize)
        };
        let collect = || -> rusqlite::Result<DbStats> {
            Ok(DbStats {
                tenant,
                tags: count("SELECT COUNT(*) FROM tag WHERE tenant_id = ?1")?,
                taggings: count("SELECT COUNT(*) FROM resource_tag WHERE tenant_id = ?1")?,
                versions: count("SELECT COUNT(DISTINCT version) FROM resource_tag WHERE tenant_id = ?1")?,
            })
        };
        collect().map_err(|e| Error::storage(format!("Failed to collect statistics for tenant {}", tenant), e))
    }
}

enum ScopeKind {
    Transaction,
    Savepoint,
}

/// Atomic boundary for one write operation.
///
/// Opens an immediate transaction when the connection is in autocommit mode,
/// otherwise a savepoint nested in the caller's transaction. Rolls back on
/// drop unless [`commit`](Self::commit) was called.
pub(crate) struct WriteScope<'c> {
    conn: &'c Connection,
    kind: ScopeKind,
    finished: bool,
}

impl<'c> WriteScope<'c> {
    fn begin(conn: &'c Connection) -> rusqlite::Result<Self> {
        let kind = if conn.is_autocommit() {
            conn.execute_batch("BEGIN IMMEDIATE")?;
            ScopeKind::Transaction
        } else {
            conn.execute_batch("SAVEPOINT regtags_write")?;
            ScopeKind::Savepoint
        };
        Ok(Self {
            conn,
            kind,
            finished: false,
        })
    }

    pub fn commit(mut self) -> rusqlite::Result<()> {
        self.finished = true;
        match self.kind {
            ScopeKind::Transaction => self.conn.execute_batch("COMMIT"),
            ScopeKind::Savepoint => self.conn.execute_batch("RELEASE regtags_write"),
        }
    }
}

impl Drop for WriteScope<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let sql = match self.kind {
            ScopeKind::Transaction => "ROLLBACK",
            ScopeKind::Savepoint => "ROLLBACK TO regtags_write; RELEASE regtags_write",
        };
        if let Err(e) = self.conn.execute_batch(sql) {
            tracing::error!(error = %e, "Failed to roll back tag write");
        }
    }
}

/// Row counts for one tenant
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub tenant: TenantId,
    pub tags: usize,
    pub taggings: usize,
    pub versions: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tag Statistics (tenant {}):", self.tenant)?;
        writeln!(f, "  Tags: {}", self.tags)?;
        writeln!(f, "  Taggings: {}", self.taggings)?;
        writeln!(f, "  Tagged versions: {}", self.versions)
    }
}

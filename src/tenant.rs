//! Tenant identity - the isolation boundary carried by every operation
//!
//! The tenant is never inferred from stored data. Every statement the store
//! issues binds the id returned by [`TenantContext::current_tenant_id`].

use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Opaque tenant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub i32);

/// The super tenant owns rows written without an explicit tenant.
pub const SUPER_TENANT: TenantId = TenantId(-1234);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for TenantId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

/// Supplies the tenant of the caller's session.
pub trait TenantContext: Send + Sync {
    fn current_tenant_id(&self) -> TenantId;
}

/// A fixed tenant, for callers bound to one tenant for their whole lifetime.
impl TenantContext for TenantId {
    fn current_tenant_id(&self) -> TenantId {
        *self
    }
}

/// A tenant that can be switched between operations, the way a request
/// thread rebinds its session for each incoming call.
#[derive(Debug)]
pub struct SessionTenant {
    current: AtomicI32,
}

impl SessionTenant {
    pub fn new(tenant: TenantId) -> Self {
        Self {
            current: AtomicI32::new(tenant.0),
        }
    }

    /// Rebind the session to another tenant
    pub fn set(&self, tenant: TenantId) {
        self.current.store(tenant.0, Ordering::SeqCst);
    }
}

impl Default for SessionTenant {
    fn default() -> Self {
        Self::new(SUPER_TENANT)
    }
}

impl TenantContext for SessionTenant {
    fn current_tenant_id(&self) -> TenantId {
        TenantId(self.current.load(Ordering::SeqCst))
    }
}

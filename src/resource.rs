//! Resource versions and the version to path resolver
//!
//! Taggings are keyed by immutable version numbers. The human-readable path of
//! a version lives with the registry, so the store asks a [`ResourceLocator`]
//! whenever it reports a path.

use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Identifier of one immutable snapshot of a registry resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVersion(pub i64);

impl ResourceVersion {
    /// Versions below one are placeholders and never resolve to a path.
    pub fn is_resolvable(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for ResourceVersion {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for ResourceVersion {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(ResourceVersion)
    }
}

/// Resolves a version number to the current path of its resource.
pub trait ResourceLocator: Send + Sync {
    /// Returns `None` when the version is stale or has been deleted.
    fn path_for_version(&self, version: ResourceVersion) -> Option<String>;

    /// Resolve many versions at once. Unresolvable versions are absent from
    /// the returned map.
    fn paths_for_versions(&self, versions: &[ResourceVersion]) -> HashMap<ResourceVersion, String> {
        versions
            .iter()
            .filter_map(|v| self.path_for_version(*v).map(|path| (*v, path)))
            .collect()
    }
}

impl<F> ResourceLocator for F
where
    F: Fn(ResourceVersion) -> Option<String> + Send + Sync,
{
    fn path_for_version(&self, version: ResourceVersion) -> Option<String> {
        self(version)
    }
}

/// In-memory locator backed by a version to path map
#[derive(Debug, Default)]
pub struct MapLocator {
    paths: RwLock<HashMap<ResourceVersion, String>>,
}

impl MapLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, version: ResourceVersion, path: impl Into<String>) {
        self.paths
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(version, path.into());
    }

    /// Forget a version, as the registry does when a resource is deleted
    pub fn remove(&self, version: ResourceVersion) -> Option<String> {
        self.paths
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&version)
    }

    pub fn len(&self) -> usize {
        self.paths.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(ResourceVersion, String)> for MapLocator {
    fn from_iter<I: IntoIterator<Item = (ResourceVersion, String)>>(iter: I) -> Self {
        Self {
            paths: RwLock::new(iter.into_iter().collect()),
        }
    }
}

impl ResourceLocator for MapLocator {
    fn path_for_version(&self, version: ResourceVersion) -> Option<String> {
        self.paths
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&version)
            .cloned()
    }

    fn paths_for_versions(&self, versions: &[ResourceVersion]) -> HashMap<ResourceVersion, String> {
        let paths = self.paths.read().unwrap_or_else(|e| e.into_inner());
        versions
            .iter()
            .filter_map(|v| paths.get(v).map(|path| (*v, path.clone())))
            .collect()
    }
}

use crate::resource::{MapLocator, ResourceVersion};
use crate::storage::KeyStrategy;
use crate::tenant::{SUPER_TENANT, TenantId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegtagsConfig {
    pub database: Option<String>,
    pub tenant: Option<i32>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Version number to resource path, used to resolve tagged versions.
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub key_strategy: KeyStrategy,
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key_strategy: KeyStrategy::default(),
            busy_timeout_ms: 5000,
        }
    }
}

impl StorageConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub enabled: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl RegtagsConfig {
    pub fn tenant_id(&self) -> TenantId {
        self.tenant.map(TenantId).unwrap_or(SUPER_TENANT)
    }

    /// Build the path locator from the `[paths]` table
    pub fn locator(&self) -> Result<MapLocator> {
        let locator = MapLocator::new();
        for (version, path) in &self.paths {
            let number: i64 = version
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid version number in [paths]: {:?}", version)))?;
            locator.insert(ResourceVersion(number), path.clone());
        }
        Ok(locator)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("regtags.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".regtags").join("regtags.db")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<RegtagsConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RegtagsConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RegtagsConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

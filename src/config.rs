use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tool configuration, loaded from `scopedb.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScopeDbConfig {
    /// Read-lock budget for queries, in milliseconds
    pub lock_timeout_ms: Option<u64>,
    /// Suffix identifying fragment files when indexing a directory
    pub fragment_suffix: Option<String>,
    /// Default language tag for indexed files
    pub language: Option<String>,
}

impl ScopeDbConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms.unwrap_or(5000))
    }

    pub fn fragment_suffix(&self) -> &str {
        self.fragment_suffix.as_deref().unwrap_or(".scope.json")
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("scopedb.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ScopeDbConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ScopeDbConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ScopeDbConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bookmarks::IndexPolicy;

const CONFIG_FILE: &str = "config.yaml";

/// Collections smaller than this are scanned without building an index
const DEFAULT_INDEX_MIN_BOOKMARKS: usize = 64;

/// Configuration for the search command
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result limit applied when `--limit` is not given
    #[serde(default)]
    pub default_limit: Option<usize>,

    /// Consult the candidate index before scanning
    #[serde(default = "default_use_index")]
    pub use_index: bool,

    #[serde(default = "default_index_min_bookmarks")]
    pub index_min_bookmarks: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: None,
            use_index: default_use_index(),
            index_min_bookmarks: DEFAULT_INDEX_MIN_BOOKMARKS,
        }
    }
}

fn default_use_index() -> bool {
    true
}

fn default_index_min_bookmarks() -> usize {
    DEFAULT_INDEX_MIN_BOOKMARKS
}

impl SearchConfig {
    pub fn index_policy(&self) -> IndexPolicy {
        IndexPolicy {
            enabled: self.use_index,
            min_bookmarks: self.index_min_bookmarks,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        if self.search.default_limit == Some(0) {
            bail!("search.default_limit must be greater than 0");
        }
        Ok(())
    }

    pub fn load_with(base_path: &Path) -> anyhow::Result<Self> {
        let path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !path.exists() {
            log::info!("Writing default config to {}", path.display());
            let defaults = Config {
                base_path: base_path.to_path_buf(),
                ..Default::default()
            };
            defaults.save()?;
        }

        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str)
            .with_context(|| format!("{} is malformed", path.display()))?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = self.base_path.join(CONFIG_FILE);
        let temp_path = self.base_path.join(format!("{CONFIG_FILE}-tmp"));

        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(&temp_path, config_str)
            .with_context(|| format!("failed to write {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with(dir.path()).unwrap();

        assert!(dir.path().join(CONFIG_FILE).exists());
        assert!(config.search.use_index);
        assert_eq!(config.search.index_min_bookmarks, DEFAULT_INDEX_MIN_BOOKMARKS);
        assert_eq!(config.search.default_limit, None);
    }

    #[test]
    fn test_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "search:\n  default_limit: 5\n").unwrap();

        let config = Config::load_with(dir.path()).unwrap();
        assert_eq!(config.search.default_limit, Some(5));
        assert!(config.search.use_index);

        // upgraded file now carries every field
        let saved = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(saved.contains("index_min_bookmarks"));
    }

    #[test]
    fn test_rejects_zero_limit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "search:\n  default_limit: 0\n").unwrap();

        assert!(Config::load_with(dir.path()).is_err());
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "search: [not, a, map").unwrap();

        assert!(Config::load_with(dir.path()).is_err());
    }

    #[test]
    fn test_index_policy_from_config() {
        let config = SearchConfig {
            use_index: false,
            index_min_bookmarks: 10,
            ..Default::default()
        };
        let policy = config.index_policy();
        assert!(!policy.enabled);
        assert_eq!(policy.min_bookmarks, 10);
    }
}

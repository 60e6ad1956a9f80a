use crate::{bookmarks::BackendCsv, config::Config};
use anyhow::{Context, Result};
use homedir::my_home;
use std::path::PathBuf;

/// Application factory for creating and configuring application components
pub struct AppFactory;

impl AppFactory {
    /// Get application paths, creating the base directory if needed
    pub fn get_paths() -> Result<AppPaths> {
        let base_path = Self::get_base_path()?;

        std::fs::create_dir_all(&base_path)
            .context("Failed to create application base directory")?;

        Ok(AppPaths::new(base_path))
    }

    pub fn create_config(paths: &AppPaths) -> Result<Config> {
        Config::load_with(&paths.base_path)
    }

    /// Open the bookmark store with the index policy from config
    pub fn create_backend(paths: &AppPaths, config: &Config) -> Result<BackendCsv> {
        let bookmarks_path = paths.bookmarks_path.to_string_lossy();
        let backend = BackendCsv::load(&bookmarks_path)
            .with_context(|| format!("Failed to open {bookmarks_path}"))?;
        Ok(backend.with_index_policy(config.search.index_policy()))
    }

    /// `BMFIND_BASE_PATH`, or `~/.local/share/bmfind`
    fn get_base_path() -> Result<PathBuf> {
        if let Ok(base_path) = std::env::var("BMFIND_BASE_PATH") {
            return Ok(PathBuf::from(base_path));
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;
        Ok(home.join(".local/share/bmfind"))
    }
}

/// Application paths configuration
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub base_path: PathBuf,
    pub bookmarks_path: PathBuf,
}

impl AppPaths {
    pub fn new(base_path: PathBuf) -> Self {
        let bookmarks_path = base_path.join("bookmarks.csv");
        Self {
            base_path,
            bookmarks_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_paths() {
        let paths = AppPaths::new(PathBuf::from("/test/base"));
        assert_eq!(paths.base_path, PathBuf::from("/test/base"));
        assert_eq!(paths.bookmarks_path, PathBuf::from("/test/base/bookmarks.csv"));
    }

    #[test]
    fn test_create_backend_in_fresh_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(dir.path().to_path_buf());
        let config = AppFactory::create_config(&paths).unwrap();

        AppFactory::create_backend(&paths, &config).unwrap();
        assert!(paths.bookmarks_path.exists());
    }
}

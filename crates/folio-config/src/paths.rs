//! Platform paths for config and data.

use directories::ProjectDirs;
use crate::error::{ConfigError, ConfigResult};
use std::path::PathBuf;

/// Where Folio keeps its config file and store by default.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
}

impl AppPaths {
    /// Resolve the platform-specific directories.
    pub fn new() -> Option<Self> {
        let proj_dirs = ProjectDirs::from("com", "folio", "folio")?;

        let config_dir = proj_dirs.config_dir().to_path_buf();
        let data_dir = proj_dirs.data_dir().to_path_buf();

        Some(Self::rooted(config_dir, data_dir))
    }

    /// Paths under explicit directories.
    pub fn rooted(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_file: config_dir.join("config.toml"),
            database_file: data_dir.join("folio.db"),
            config_dir,
            data_dir,
        }
    }

    /// Create the config and data directories.
    pub fn ensure_dirs(&self) -> ConfigResult<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::write(dir, e))?;
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

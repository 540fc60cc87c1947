//! CLI command implementations.

pub mod config;
pub mod init;
pub mod list;
pub mod poll;
pub mod search;
pub mod show;
pub mod stats;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use folio_config::{AppPaths, Config};
use folio_db::Database;
use folio_ingest::{Coordinator, CoordinatorConfig, ExtractorRegistry};
use std::path::{Path, PathBuf};

/// Paths and configuration resolved for one invocation.
pub struct AppContext {
    pub paths: AppPaths,
    pub config_file: PathBuf,
    pub config: Config,
}

impl AppContext {
    /// Load the config (default location unless overridden) and apply
    /// environment overrides.
    pub fn load(config_override: Option<&Path>) -> Result<Self> {
        let paths = AppPaths::new().context("Failed to determine application directories")?;
        let config_file = config_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths.config_file.clone());

        let mut config = Config::load_from(&config_file)
            .with_context(|| format!("Failed to load config from {}", config_file.display()))?;
        config.apply_env();

        Ok(Self {
            paths,
            config_file,
            config,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.config.database_path(&self.paths)
    }

    /// Open the store, creating it if needed.
    pub fn open_database(&self) -> Result<Database> {
        let path = self.database_path();
        Database::open_with_pool_size(&path, self.config.database.pool_size)
            .with_context(|| format!("Failed to open database at {}", path.display()))
    }

    /// Open a store that must already exist.
    pub fn existing_database(&self) -> Result<Database> {
        if !self.database_path().exists() {
            anyhow::bail!("Folio is not initialized. Run 'folio init' first.");
        }
        self.open_database()
    }

    /// Validate the config and wire up the remote, store and extractors.
    pub fn coordinator(&self, poll: CoordinatorConfig) -> Result<Coordinator> {
        self.config.validate().context("Invalid configuration")?;
        let source = folio_ingest::remote::from_config(&self.config.remote)
            .context("Failed to set up the remote source")?;
        let db = self.open_database()?;
        Ok(Coordinator::new(
            source,
            db,
            ExtractorRegistry::with_defaults(),
            poll,
        ))
    }
}

/// Format a file size in human-readable form.
pub fn format_size(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = KB * 1024;
    const GB: i64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format a timestamp in local time.
pub fn format_time(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Shorten text to at most `max` characters on a char boundary.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }
}

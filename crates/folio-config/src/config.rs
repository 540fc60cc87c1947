//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding `remote.folder_id`.
pub const ENV_FOLDER_ID: &str = "FOLIO_FOLDER_ID";
/// Environment variable overriding `remote.access_token`.
pub const ENV_ACCESS_TOKEN: &str = "FOLIO_ACCESS_TOKEN";
/// Environment variable overriding `remote.credentials_file`.
pub const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Environment variable overriding `database.path`.
pub const ENV_DATABASE: &str = "FOLIO_DATABASE";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        write_file(path, &self.to_toml_string()?)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the commented default config file.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        write_file(path, &Self::default_config_string())
    }

    /// Apply `FOLIO_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(folder_id) = lookup(ENV_FOLDER_ID) {
            self.remote.folder_id = Some(folder_id);
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            self.remote.access_token = Some(token);
        }
        if let Some(path) = lookup(ENV_CREDENTIALS) {
            self.remote.credentials_file = Some(path);
        }
        if let Some(path) = lookup(ENV_DATABASE) {
            self.database.path = Some(path);
        }
    }

    /// Check that the configured remote can actually be reached.
    pub fn validate(&self) -> ConfigResult<()> {
        match self.remote.kind {
            RemoteKind::Drive => {
                if is_blank(&self.remote.folder_id) {
                    return Err(ConfigError::Invalid(format!(
                        "remote.folder_id is required for the drive remote (or set {ENV_FOLDER_ID})"
                    )));
                }
                if is_blank(&self.remote.credentials_file) && is_blank(&self.remote.access_token) {
                    return Err(ConfigError::Invalid(format!(
                        "the drive remote needs remote.credentials_file or remote.access_token \
                         (or set {ENV_CREDENTIALS} / {ENV_ACCESS_TOKEN})"
                    )));
                }
            }
            RemoteKind::Local => {
                if is_blank(&self.remote.local_path) {
                    return Err(ConfigError::Invalid(
                        "remote.local_path is required for the local remote".to_string(),
                    ));
                }
            }
        }

        if self.poll.interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "poll.interval_seconds must be at least 1".to_string(),
            ));
        }
        if self.poll.max_concurrent_jobs == 0 {
            return Err(ConfigError::Invalid(
                "poll.max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::Invalid(
                "database.pool_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve the database file: explicit path, then `general.data_dir`,
    /// then the platform data directory.
    pub fn database_path(&self, paths: &AppPaths) -> PathBuf {
        if let Some(path) = self.database.path.as_deref() {
            return expand(path);
        }
        match self.general.data_dir.as_deref() {
            Some(dir) => expand(dir).join("folio.db"),
            None => paths.database_file.clone(),
        }
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Folio Configuration
# Mirrors a remote folder of slides and documents into a searchable store

[general]
# Data directory for the database
# data_dir = "~/.local/share/folio"

[remote]
# Where files come from: "drive" or "local"
kind = "drive"

# Drive folder to mirror (or set FOLIO_FOLDER_ID)
# folder_id = ""

# Service account key file (or set GOOGLE_APPLICATION_CREDENTIALS)
# credentials_file = "~/.config/folio/service-account.json"

# Static OAuth bearer token, used when no credentials file is set
# (or set FOLIO_ACCESS_TOKEN)
# access_token = ""

# Drive API base URL
api_base = "https://www.googleapis.com/drive/v3"

# Directory to mirror when kind = "local"
# local_path = "~/Documents/Slides"

# File patterns the local remote ignores
ignore_patterns = [
    "*.tmp",
    "~$*",
    ".DS_Store",
    "*.part",
]

# HTTP request timeout in seconds
timeout_seconds = 60

[poll]
# Seconds between polling cycles
interval_seconds = 300

# Files fetched and extracted at once
max_concurrent_jobs = 2

# Attempts for listing and downloading before giving up
retry_attempts = 3

# Initial backoff between attempts, doubled each time
retry_backoff_ms = 500

[database]
# Explicit database file (or set FOLIO_DATABASE)
# path = "~/.local/share/folio/folio.db"

# Connection pool size
pool_size = 10
"#
        .to_string()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub data_dir: Option<String>,
}

/// Which kind of remote to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    #[default]
    Drive,
    Local,
}

/// Remote folder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub kind: RemoteKind,
    pub folder_id: Option<String>,
    pub access_token: Option<String>,
    pub credentials_file: Option<String>,
    pub api_base: String,
    pub local_path: Option<String>,
    pub ignore_patterns: Vec<String>,
    pub timeout_seconds: u64,
}

impl RemoteConfig {
    /// Local folder path with `~` expanded.
    pub fn expanded_local_path(&self) -> Option<PathBuf> {
        self.local_path.as_deref().map(expand)
    }

    /// Service account key path with `~` expanded; blank values count as unset.
    pub fn expanded_credentials_file(&self) -> Option<PathBuf> {
        self.credentials_file
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(expand)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            kind: RemoteKind::Drive,
            folder_id: None,
            access_token: None,
            credentials_file: None,
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            local_path: None,
            ignore_patterns: vec![
                "*.tmp".to_string(),
                "~$*".to_string(),
                ".DS_Store".to_string(),
                "*.part".to_string(),
            ],
            timeout_seconds: 60,
        }
    }
}

/// Polling loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_seconds: u64,
    pub max_concurrent_jobs: usize,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            max_concurrent_jobs: 2,
            retry_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// Store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<String>,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: 10,
        }
    }
}

fn write_file(path: &Path, contents: &str) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::write(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| ConfigError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.remote.kind, RemoteKind::Drive);
        assert_eq!(config.poll.interval_seconds, 300);
        assert_eq!(config.database.pool_size, 10);
    }

    #[test]
    fn test_default_string_matches_defaults() {
        let parsed: Config = toml::from_str(&Config::default_config_string()).unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.remote.kind, defaults.remote.kind);
        assert_eq!(parsed.remote.api_base, defaults.remote.api_base);
        assert_eq!(parsed.remote.ignore_patterns, defaults.remote.ignore_patterns);
        assert_eq!(parsed.poll.interval_seconds, defaults.poll.interval_seconds);
        assert_eq!(parsed.poll.retry_attempts, defaults.poll.retry_attempts);
        assert_eq!(parsed.database.pool_size, defaults.database.pool_size);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            [remote]
            kind = "local"
            local_path = "/srv/slides"

            [poll]
            interval_seconds = 60
            "#
        )
        .unwrap();

        let config = Config::load_from(temp_file.path()).unwrap();
        assert_eq!(config.remote.kind, RemoteKind::Local);
        assert_eq!(config.poll.interval_seconds, 60);
        // Defaults should still work
        assert_eq!(config.poll.max_concurrent_jobs, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.poll.interval_seconds, 300);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.remote.folder_id = Some("abc".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.remote.folder_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_FOLDER_ID, "folder-1"),
            (ENV_ACCESS_TOKEN, "  "),
            (ENV_DATABASE, "/tmp/x.db"),
            (ENV_CREDENTIALS, "/keys/sa.json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.remote.access_token = Some("from-file".to_string());
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.remote.folder_id.as_deref(), Some("folder-1"));
        assert_eq!(config.remote.access_token.as_deref(), Some("from-file"));
        assert_eq!(config.database.path.as_deref(), Some("/tmp/x.db"));
        assert_eq!(
            config.remote.credentials_file.as_deref(),
            Some("/keys/sa.json")
        );
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.remote.folder_id = Some("folder".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.remote.credentials_file = Some("/keys/sa.json".to_string());
        assert!(config.validate().is_ok());

        config.remote.credentials_file = None;
        config.remote.access_token = Some("token".to_string());
        assert!(config.validate().is_ok());

        config.poll.interval_seconds = 0;
        assert!(config.validate().is_err());

        let mut local = Config::default();
        local.remote.kind = RemoteKind::Local;
        assert!(local.validate().is_err());
    }

    #[test]
    fn test_database_path_resolution() {
        let paths = AppPaths::rooted(PathBuf::from("/cfg"), PathBuf::from("/data"));
        let mut config = Config::default();
        assert_eq!(config.database_path(&paths), PathBuf::from("/data/folio.db"));

        config.general.data_dir = Some("/elsewhere".to_string());
        assert_eq!(
            config.database_path(&paths),
            PathBuf::from("/elsewhere/folio.db")
        );

        config.database.path = Some("/explicit.db".to_string());
        assert_eq!(config.database_path(&paths), PathBuf::from("/explicit.db"));
    }
}

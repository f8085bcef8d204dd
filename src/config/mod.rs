//! Configuration management for CLI, environment variables, and config files.

use crate::client::ClientKind;
use crate::error::{TidyError, TidyResult, ValidationIssue};
use crate::paths::{IgnoreList, PathMapEntry, PathMapping};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration for torrent-tidy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub orphan: OrphanConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where torrents come from and how their paths translate locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub name: String,
    pub kind: ClientKind,
    /// Local directory scanned for orphans
    pub download_path: Option<PathBuf>,
    /// Prefix rewrites, first match wins. Written as an array of tables so
    /// declaration order survives parsing.
    pub download_path_mapping: Vec<PathMapEntry>,
    /// Snapshot file for the `snapshot` client kind
    pub torrents_file: Option<PathBuf>,
    pub categories: Vec<String>,
    pub exclude_categories: Vec<String>,
    /// Local save path per category, overriding the one derived from
    /// torrent labels in category mode
    pub category_paths: BTreeMap<String, PathBuf>,
}

/// Configuration for orphan scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrphanConfig {
    pub grace_period_secs: u64,
    pub ignore_paths: Vec<String>,
    pub workers: usize,
    pub dry_run: bool,
    /// Scan each category's save path against that category's torrents only
    pub use_category_paths: bool,
}

/// Configuration for the containment result cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_path_entries: u64,
}

/// Configuration for logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            kind: ClientKind::default(),
            download_path: None,
            download_path_mapping: Vec::new(),
            torrents_file: None,
            categories: Vec::new(),
            exclude_categories: Vec::new(),
            category_paths: BTreeMap::new(),
        }
    }
}

impl Default for OrphanConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 600,
            ignore_paths: Vec::new(),
            workers: 10,
            dry_run: false,
            use_category_paths: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_path_entries: 100_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> TidyResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TidyError::InvalidArgument(format!("{name} has invalid format")))
}

fn parse_env_bool(name: &str, value: &str) -> TidyResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TidyError::InvalidArgument(format!(
            "{name} has invalid format"
        ))),
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> TidyResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Ok(toml::from_str(&content)?),
        }
    }

    pub fn from_default_locations() -> TidyResult<Self> {
        let config_dirs = [
            dirs::config_dir().map(|d| d.join("torrent-tidy/config.toml")),
            Some(PathBuf::from("/etc/torrent-tidy/config.toml")),
            Some(PathBuf::from("./torrent-tidy.toml")),
        ];

        for path in config_dirs.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    pub fn merge_from_env(mut self) -> TidyResult<Self> {
        if let Ok(val) = std::env::var("TORRENT_TIDY_CLIENT_KIND") {
            self.client.kind = parse_env("TORRENT_TIDY_CLIENT_KIND", &val)?;
        }
        if let Ok(val) = std::env::var("TORRENT_TIDY_DOWNLOAD_PATH") {
            self.client.download_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("TORRENT_TIDY_TORRENTS_FILE") {
            self.client.torrents_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("TORRENT_TIDY_GRACE_PERIOD") {
            self.orphan.grace_period_secs = parse_env("TORRENT_TIDY_GRACE_PERIOD", &val)?;
        }
        if let Ok(val) = std::env::var("TORRENT_TIDY_WORKERS") {
            self.orphan.workers = parse_env("TORRENT_TIDY_WORKERS", &val)?;
        }
        if let Ok(val) = std::env::var("TORRENT_TIDY_DRY_RUN") {
            self.orphan.dry_run = parse_env_bool("TORRENT_TIDY_DRY_RUN", &val)?;
        }
        if let Ok(val) = std::env::var("TORRENT_TIDY_USE_CATEGORY_PATHS") {
            self.orphan.use_category_paths =
                parse_env_bool("TORRENT_TIDY_USE_CATEGORY_PATHS", &val)?;
        }
        if let Ok(val) = std::env::var("TORRENT_TIDY_MAX_CACHE_ENTRIES") {
            self.cache.max_path_entries = parse_env("TORRENT_TIDY_MAX_CACHE_ENTRIES", &val)?;
        }
        if let Ok(val) = std::env::var("TORRENT_TIDY_LOG_LEVEL") {
            self.logging.level = val;
        }

        Ok(self)
    }

    pub fn merge_from_cli(mut self, cli: &CliArgs) -> Self {
        if let Some(ref path) = cli.download_path {
            self.client.download_path = Some(path.clone());
        }

        if let Some(ref path) = cli.torrents_file {
            self.client.torrents_file = Some(path.clone());
            self.client.kind = ClientKind::Snapshot;
        }

        if cli.dry_run {
            self.orphan.dry_run = true;
        }

        if cli.use_category_paths {
            self.orphan.use_category_paths = true;
        }

        if let Some(ref level) = cli.log_level {
            self.logging.level = level.clone();
        }

        self
    }

    /// Layers defaults, the config file, environment and CLI. An explicit
    /// `--config` replaces the default search.
    pub fn load_with_cli(cli: &CliArgs) -> TidyResult<Self> {
        let base = match cli.config_file {
            Some(ref path) => Self::from_file(path)?,
            None => Self::from_default_locations()?,
        };
        Ok(base.merge_from_env()?.merge_from_cli(cli))
    }

    pub fn validate(&self) -> TidyResult<()> {
        let mut issues = Vec::new();

        for (i, rule) in self.client.download_path_mapping.iter().enumerate() {
            if rule.from.is_empty() {
                issues.push(ValidationIssue {
                    field: format!("client.download_path_mapping[{i}].from"),
                    message: "Source prefix cannot be empty".to_string(),
                });
            } else if self.client.download_path_mapping[..i]
                .iter()
                .any(|earlier| earlier.from == rule.from)
            {
                issues.push(ValidationIssue {
                    field: format!("client.download_path_mapping[{i}].from"),
                    message: format!("Source prefix '{}' is declared more than once", rule.from),
                });
            }
        }

        if let Some(ref path) = self.client.download_path {
            if !path.is_absolute() {
                issues.push(ValidationIssue {
                    field: "client.download_path".to_string(),
                    message: "Download path must be an absolute path".to_string(),
                });
            }
        }

        for (name, path) in &self.client.category_paths {
            if !path.is_absolute() {
                issues.push(ValidationIssue {
                    field: format!("client.category_paths.{name}"),
                    message: "Category path must be an absolute path".to_string(),
                });
            }
        }

        if self.orphan.workers == 0 {
            issues.push(ValidationIssue {
                field: "orphan.workers".to_string(),
                message: "Worker count must be at least 1".to_string(),
            });
        }

        if let Err(e) = IgnoreList::new(&self.orphan.ignore_paths) {
            issues.push(ValidationIssue {
                field: "orphan.ignore_paths".to_string(),
                message: e.to_string(),
            });
        }

        if self.cache.max_path_entries == 0 {
            issues.push(ValidationIssue {
                field: "cache.max_path_entries".to_string(),
                message: "Cache size must be at least 1".to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            issues.push(ValidationIssue {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(TidyError::ValidationError(issues))
        }
    }

    /// The configured mapping table, in declaration order.
    pub fn path_mapping(&self) -> TidyResult<PathMapping> {
        PathMapping::new(self.client.download_path_mapping.clone())
    }
}

/// Command-line arguments that override configuration values.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_file: Option<PathBuf>,
    pub torrents_file: Option<PathBuf>,
    pub download_path: Option<PathBuf>,
    pub dry_run: bool,
    pub use_category_paths: bool,
    pub log_level: Option<String>,
}

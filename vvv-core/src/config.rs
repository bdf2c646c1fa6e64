//! Configuration loading and data folder resolution
//!
//! Two tiers:
//! 1. **TOML bootstrap** (`vvv.toml`): data folder, HTTP port, super admin,
//!    retention windows, logging. Read once at startup.
//! 2. **Runtime blob** (`bot_config.json`): command prefix, feature toggles and
//!    the admin list. Rewritten in full whenever it changes.
//!
//! Data folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `VVV_DATA_DIR` environment variable
//! 3. TOML config file `data_dir` key
//! 4. OS-dependent compiled default (fallback)

use crate::storage::{JsonFile, SnapshotStore};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the data folder
pub const DATA_DIR_ENV: &str = "VVV_DATA_DIR";

pub const LEADERBOARD_FILE: &str = "leaderboard.json";
pub const HISTORY_FILE: &str = "history.json";
pub const MERGE_MEMORY_FILE: &str = "merge_memory.json";
pub const CONFIG_FILE: &str = "bot_config.json";
pub const BACKUP_DIR: &str = "backups";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding every persisted JSON file
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// HTTP port for the keep-alive and message ingress endpoints
    #[serde(default = "default_port")]
    pub port: u16,

    /// Id of the super administrator (always admin, cannot be removed)
    #[serde(default = "default_super_admin")]
    pub super_admin_id: String,

    /// Backups older than this are deleted by the retention sweep
    #[serde(default = "default_backup_retention_hours")]
    pub backup_retention_hours: i64,

    /// Period of the expired-session sweep
    #[serde(default = "default_sweep_interval_secs")]
    pub session_sweep_interval_secs: u64,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            port: default_port(),
            super_admin_id: default_super_admin(),
            backup_retention_hours: default_backup_retention_hours(),
            session_sweep_interval_secs: default_sweep_interval_secs(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_super_admin() -> String {
    "100069577772026".to_string()
}

fn default_backup_retention_hours() -> i64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Load the TOML file at `path`.
    ///
    /// A missing file is not an error: a warning is logged and defaults are used.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Platform defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("vvv"))
            .unwrap_or_else(|| PathBuf::from("./vvv_data"));
        let config_file = dirs::config_dir()
            .map(|d| d.join("vvv").join("vvv.toml"))
            .unwrap_or_else(|| PathBuf::from("vvv.toml"));
        Self {
            data_dir,
            config_file,
            log_level: default_log_level(),
        }
    }
}

/// Resolves the data folder following the priority order in the module docs
#[derive(Debug, Default)]
pub struct DataDirResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl DataDirResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_value = config.data_dir.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }
        if let Ok(path) = std::env::var(DATA_DIR_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(path) = &self.toml_value {
            return path.clone();
        }
        CompiledDefaults::for_current_platform().data_dir
    }
}

/// Creates the data folder layout and names the files inside it
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the data folder and its backup sub-folder (idempotent)
    pub fn ensure_exists(&self) -> Result<()> {
        std::fs::create_dir_all(self.backup_dir())?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn leaderboard_path(&self) -> PathBuf {
        self.root.join(LEADERBOARD_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }

    pub fn merge_memory_path(&self) -> PathBuf {
        self.root.join(MERGE_MEMORY_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR)
    }
}

/// Runtime configuration blob persisted as `bot_config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
    #[serde(default = "default_true")]
    pub auto_accept_friends: bool,
    #[serde(default = "default_true")]
    pub enable_logging: bool,
    /// Saved administrators, never including the super admin
    #[serde(default)]
    pub admins: BTreeSet<String>,
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_prefix(),
            auto_accept_friends: true,
            enable_logging: true,
            admins: BTreeSet::new(),
        }
    }
}

/// Admin list and command prefix, backed by a [`SnapshotStore`]
pub struct AdminRegistry {
    super_admin_id: String,
    config: BotConfig,
    store: Box<dyn SnapshotStore<BotConfig>>,
}

impl AdminRegistry {
    /// Load the blob from `store`, falling back to defaults when absent or unreadable
    pub fn load(super_admin_id: impl Into<String>, store: Box<dyn SnapshotStore<BotConfig>>) -> Self {
        let config = match store.load() {
            Ok(Some(config)) => config,
            Ok(None) => BotConfig::default(),
            Err(e) => {
                warn!("Failed to load bot config, using defaults: {}", e);
                BotConfig::default()
            }
        };
        let mut registry = Self {
            super_admin_id: super_admin_id.into(),
            config,
            store,
        };
        let super_admin = registry.super_admin_id.clone();
        registry.config.admins.remove(&super_admin);
        registry
    }

    /// Registry persisted to `bot_config.json` inside `data_dir`
    pub fn open(super_admin_id: impl Into<String>, data_dir: &DataDir) -> Self {
        Self::load(super_admin_id, Box::new(JsonFile::new(data_dir.config_path())))
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn prefix(&self) -> &str {
        &self.config.command_prefix
    }

    pub fn super_admin_id(&self) -> &str {
        &self.super_admin_id
    }

    pub fn is_super_admin(&self, user_id: &str) -> bool {
        user_id == self.super_admin_id
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.is_super_admin(user_id) || self.config.admins.contains(user_id)
    }

    /// Every admin id, super admin first
    pub fn admins(&self) -> Vec<String> {
        std::iter::once(self.super_admin_id.clone())
            .chain(self.config.admins.iter().cloned())
            .collect()
    }

    pub fn add_admin(&mut self, user_id: &str) -> Result<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("empty user id".to_string()));
        }
        if self.is_admin(user_id) {
            return Err(Error::InvalidInput(format!("{} is already an admin", user_id)));
        }
        self.config.admins.insert(user_id.to_string());
        info!("Admin added: {}", user_id);
        self.persist();
        Ok(())
    }

    pub fn remove_admin(&mut self, user_id: &str) -> Result<()> {
        let user_id = user_id.trim();
        if self.is_super_admin(user_id) {
            return Err(Error::InvalidInput("the super admin cannot be removed".to_string()));
        }
        if !self.config.admins.remove(user_id) {
            return Err(Error::NotFound(format!("{} is not an admin", user_id)));
        }
        info!("Admin removed: {}", user_id);
        self.persist();
        Ok(())
    }

    /// Change the command prefix (1 to 3 characters)
    pub fn set_prefix(&mut self, prefix: &str) -> Result<()> {
        let len = prefix.chars().count();
        if len == 0 || len > 3 || prefix.chars().any(char::is_whitespace) {
            return Err(Error::InvalidInput(
                "prefix must be 1 to 3 non-blank characters".to_string(),
            ));
        }
        self.config.command_prefix = prefix.to_string();
        self.persist();
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.store.save_all(&self.config) {
            tracing::error!("Failed to save bot config: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn registry() -> AdminRegistry {
        AdminRegistry::load("root", Box::new(MemoryStore::<BotConfig>::default()))
    }

    #[test]
    fn test_super_admin_always_admin() {
        let registry = registry();
        assert!(registry.is_admin("root"));
        assert!(!registry.is_admin("someone"));
        assert_eq!(registry.admins(), vec!["root".to_string()]);
    }

    #[test]
    fn test_add_and_remove_admin() {
        let mut registry = registry();
        registry.add_admin("42").unwrap();
        assert!(registry.is_admin("42"));
        assert!(registry.add_admin("42").is_err());

        registry.remove_admin("42").unwrap();
        assert!(!registry.is_admin("42"));
        assert!(matches!(registry.remove_admin("42"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_super_admin_cannot_be_removed() {
        let mut registry = registry();
        assert!(registry.remove_admin("root").is_err());
        assert!(registry.is_admin("root"));
    }

    #[test]
    fn test_set_prefix_bounds() {
        let mut registry = registry();
        assert!(registry.set_prefix("").is_err());
        assert!(registry.set_prefix("abcd").is_err());
        registry.set_prefix("?").unwrap();
        assert_eq!(registry.prefix(), "?");
    }

    #[test]
    fn test_bot_config_accepts_partial_json() {
        let config: BotConfig = serde_json::from_str(r##"{"commandPrefix": "#"}"##).unwrap();
        assert_eq!(config.command_prefix, "#");
        assert!(config.auto_accept_friends);
        assert!(config.admins.is_empty());
    }

    #[test]
    fn test_toml_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.backup_retention_hours, 24);
        assert_eq!(config.session_sweep_interval_secs, 60);
        assert_eq!(config.logging.level, "info");
    }
}

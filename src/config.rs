use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::git::{has_drive_letter, Platform, RunnerConfig, DEFAULT_COMMIT_MESSAGE};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// Platform selection for command construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformSetting {
    /// Use the platform vault-sync was built for
    #[default]
    Auto,
    Windows,
    Unix,
}

impl PlatformSetting {
    pub fn resolve(&self) -> Platform {
        match self {
            PlatformSetting::Auto => Platform::current(),
            PlatformSetting::Windows => Platform::Windows,
            PlatformSetting::Unix => Platform::Unix,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Repository root of the vault; relative paths resolve against cwd
    #[serde(default = "default_working_dir")]
    pub working_dir: String,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    #[serde(default)]
    pub platform: PlatformSetting,
    /// Report unrecognised git failures instead of treating them as up to date
    #[serde(default)]
    pub strict_classification: bool,
    /// Never run two mutating git commands at once in the same vault
    #[serde(default = "default_serialize_mutations")]
    pub serialize_mutations: bool,
}

fn default_working_dir() -> String {
    ".".to_string()
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

fn default_serialize_mutations() -> bool {
    true
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            commit_message: default_commit_message(),
            platform: PlatformSetting::default(),
            strict_classification: false,
            serialize_mutations: default_serialize_mutations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for vault-sync's own files (logs)
    #[serde(default = "default_state_dir")]
    pub state: String,
}

fn default_state_dir() -> String {
    ".vault-sync".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state: default_state_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to a file under the state directory instead of stderr
    #[serde(default)]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Send every outcome to the tracing log
    #[serde(default = "default_true")]
    pub log: bool,
    #[serde(default)]
    pub console: ConsoleReportingConfig,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            log: true,
            console: ConsoleReportingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleReportingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Outcomes to print (`success`, `nothing_changed`, ...); empty prints all
    #[serde(default)]
    pub events: Vec<String>,
}

impl Default for ConsoleReportingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            events: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Path to the project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".vault-sync/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so vault-sync works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // User config in ~/.config/vault-sync/ (optional global defaults)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("vault-sync").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Project config in .vault-sync/
        let project_config = Self::project_config_path();
        if project_config.exists() {
            builder = builder.add_source(config::File::from(project_config));
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. VAULT_SYNC_GIT__WORKING_DIR
        builder = builder.add_source(
            config::Environment::with_prefix("VAULT_SYNC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to .vault-sync/config.toml
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::project_config_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Absolute path of the vault.
    ///
    /// A drive-letter path counts as absolute whenever the resolved platform
    /// is Windows, even on a host whose own path rules disagree.
    pub fn working_dir_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.git.working_dir);
        let windows_absolute = self.git.platform.resolve() == Platform::Windows
            && has_drive_letter(&self.git.working_dir);
        if windows_absolute || path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// Settings for a `GitCommandRunner` over the configured vault
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            working_dir: self.working_dir_path().to_string_lossy().to_string(),
            platform: self.git.platform.resolve(),
            commit_message: self.git.commit_message.clone(),
            strict_classification: self.git.strict_classification,
            serialize_mutations: self.git.serialize_mutations,
        }
    }
}

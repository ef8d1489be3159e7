use anyhow::Context;
use homepage_builder::BuilderOptions;
use homepage_reminders::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "homepage.config.json";

/// Homepage server configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// JSON file holding the section records
    #[serde(default = "default_sections_path")]
    pub sections_path: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub builder: BuilderOptions,

    #[serde(default)]
    pub reminders: RemindersConfig,
}

fn default_sections_path() -> String {
    "data/sections.json".to_string()
}

fn default_port() -> u16 {
    3030
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemindersConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_appointments_path")]
    pub appointments_path: String,

    /// Durable record of reminders already delivered
    #[serde(default = "default_ledger_path")]
    pub ledger_path: String,

    #[serde(flatten)]
    pub scheduler: SchedulerConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_appointments_path() -> String {
    "data/appointments.json".to_string()
}

fn default_ledger_path() -> String {
    "data/reminders-ledger.json".to_string()
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            appointments_path: default_appointments_path(),
            ledger_path: default_ledger_path(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    /// Load config from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Relative paths in the config are resolved against its directory
    pub fn resolve(&self, config_path: &Path, relative: &str) -> PathBuf {
        let base = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        base.join(relative)
    }

    pub fn sections_file(&self, config_path: &Path) -> PathBuf {
        self.resolve(config_path, &self.sections_path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sections_path: default_sections_path(),
            port: default_port(),
            builder: BuilderOptions::default(),
            reminders: RemindersConfig::default(),
        }
    }
}

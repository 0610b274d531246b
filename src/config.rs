use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::input::ParseMode;
use crate::policy::{PolicyPreset, PolicyTable};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Full custom policy table in TOML; takes precedence over `preset`.
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub preset: Option<String>,
    pub policy_file: Option<String>,
    pub strict: Option<bool>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/livingfit/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(preset) = overrides.preset {
            self.policy.preset = preset;
            self.policy.file = None;
        }
        if let Some(file) = overrides.policy_file {
            self.policy.file = Some(file);
        }
        if let Some(strict) = overrides.strict {
            self.input.strict = strict;
        }
    }

    pub fn parse_mode(&self) -> ParseMode {
        ParseMode::from_strict_flag(self.input.strict)
    }

    /// Builds the active policy table and validates it.
    pub fn resolve_policy(&self) -> Result<PolicyTable> {
        let table = match &self.policy.file {
            Some(file) => load_policy_file(&expand_tilde(file))?,
            None => PolicyPreset::from_str(&self.policy.preset)?.table(),
        };
        table
            .validate()
            .with_context(|| format!("policy table '{}' is invalid", table.id))?;
        Ok(table)
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn default_template() -> String {
        let template = r#"[policy]
# baseline-2025 | stress-weighted | oct-2025
preset = "oct-2025"
# file = "~/.config/livingfit/policy.toml"

[input]
strict = false

[server]
host = "127.0.0.1"
port = 3002

[logging]
filter = "warn"
"#;
        template.to_string()
    }
}

pub fn load_policy_file(path: &Path) -> Result<PolicyTable> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading policy file: {}", path.display()))?;
    toml::from_str(&data)
        .with_context(|| format!("failed parsing policy file: {}", path.display()))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            file: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_preset() -> String {
    PolicyPreset::default().as_slug().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3002
}

fn default_log_filter() -> String {
    "warn".to_string()
}

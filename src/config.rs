use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::distributor::mouser::DEFAULT_BASE_URL;
use crate::distributor::DistributorKind;

/// Upper bound on in-flight distributor requests.
pub const MAX_CONCURRENCY: usize = 8;

/// Root configuration structure, deserialized from `.bom-risk/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API keys keyed by distributor name (`mouser`, `digikey`, ...).
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Distributor name → API key. Names are stored lower-cased.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(from = "HashMap<String, String>")]
pub struct Credentials(HashMap<String, String>);

impl From<HashMap<String, String>> for Credentials {
    fn from(raw: HashMap<String, String>) -> Self {
        let mut creds = Credentials::default();
        for (name, key) in raw {
            creds.insert(&name, &key);
        }
        creds
    }
}

impl Credentials {
    pub fn insert(&mut self, name: &str, key: &str) {
        self.0
            .insert(name.trim().to_lowercase(), key.trim().to_string());
    }

    /// The key for `kind`, if one is configured and non-empty.
    pub fn api_key(&self, kind: DistributorKind) -> Option<&str> {
        self.0
            .get(kind.key())
            .map(String::as_str)
            .filter(|key| !key.is_empty())
    }

    /// Names that do not correspond to any known distributor.
    pub fn unknown_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .0
            .keys()
            .map(String::as_str)
            .filter(|name| DistributorKind::from_key(name).is_none())
            .collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_mouser_base_url")]
    pub mouser_base_url: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_mouser_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            timeout_secs: default_timeout_secs(),
            mouser_base_url: default_mouser_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Rows processed at once. `1` keeps a single outstanding request.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Load configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<working_dir>/.bom-risk/config.toml`
/// 3. `~/.config/bom-risk/config.toml`
/// 4. Built-in [`Config::default`]
///
/// `BOM_RISK_<NAME>_API_KEY` environment variables are applied on top.
pub fn load_config(working_dir: &Path, config_override: Option<&Path>) -> Result<Config> {
    let mut config = read_config_file(working_dir, config_override)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

fn read_config_file(working_dir: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return parse_file(path);
    }

    let local_config = working_dir.join(".bom-risk").join("config.toml");
    if local_config.exists() {
        return parse_file(&local_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("bom-risk").join("config.toml");
        if home_config.exists() {
            return parse_file(&home_config);
        }
    }

    Ok(Config::default())
}

fn parse_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Overlay credentials from the environment and normalize pipeline limits.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    for kind in DistributorKind::ALL {
        let var = format!("BOM_RISK_{}_API_KEY", kind.key().to_uppercase());
        if let Some(key) = lookup(&var).filter(|k| !k.trim().is_empty()) {
            config.credentials.insert(kind.key(), &key);
        }
    }

    config.pipeline.concurrency = config.pipeline.concurrency.clamp(1, MAX_CONCURRENCY);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.client.timeout_secs, 10);
        assert_eq!(config.client.mouser_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.pipeline.concurrency, 1);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.credentials.api_key(DistributorKind::Mouser).is_none());
    }

    #[test]
    fn test_parse_credentials() {
        let config: Config = toml::from_str(
            r#"
[credentials]
Mouser = " abc "
digikey = ""
arrow = "x"

[pipeline]
concurrency = 4
"#,
        )
        .unwrap();
        assert_eq!(config.credentials.api_key(DistributorKind::Mouser), Some("abc"));
        assert_eq!(config.credentials.api_key(DistributorKind::DigiKey), None);
        assert_eq!(config.credentials.unknown_names(), vec!["arrow"]);
        assert_eq!(config.pipeline.concurrency, 4);
    }

    #[test]
    fn test_env_overrides_file_key() {
        let mut config: Config = toml::from_str("[credentials]\nmouser = \"file\"").unwrap();
        apply_env_overrides(&mut config, |name| {
            (name == "BOM_RISK_MOUSER_API_KEY").then(|| "env".to_string())
        });
        assert_eq!(config.credentials.api_key(DistributorKind::Mouser), Some("env"));
    }

    #[test]
    fn test_concurrency_is_clamped() {
        let mut config: Config = toml::from_str("[pipeline]\nconcurrency = 0").unwrap();
        apply_env_overrides(&mut config, |_| None);
        assert_eq!(config.pipeline.concurrency, 1);

        config.pipeline.concurrency = 100;
        apply_env_overrides(&mut config, |_| None);
        assert_eq!(config.pipeline.concurrency, MAX_CONCURRENCY);
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[client]\ntimeout_secs = 3").unwrap();
        let config = read_config_file(dir.path(), Some(&path)).unwrap();
        assert_eq!(config.client.timeout_secs, 3);
    }
}

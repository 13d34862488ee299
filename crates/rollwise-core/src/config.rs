//! Configuration resolution for Rollwise.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/rollwise/settings.json)
//! 3. Project config (.rollwise/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Rollwise configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub feature_flags: std::collections::HashMap<String, bool>,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_path: None,
            log_level: "info".to_string(),
            max_body_bytes: 64 * 1024, // 64 KB; decision payloads are small
        }
    }
}

/// Daily AI-generation quota configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Generations per calendar day for non-premium users.
    pub daily_limit: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { daily_limit: 3 }
    }
}

/// Alternative-generator provider configuration.
///
/// The API key is deliberately not part of the settings file; it is supplied
/// through the environment or CLI so it never lands on disk in plain JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Provider base URL.
    pub base_url: String,
    /// Model identifier passed to the provider.
    pub model: String,
    /// Outbound request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    // Load global config
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let global = load_config_file(&global_path)?;
            merge_config(&mut config, global);
        }
    }

    // Load project config
    if let Some(dir) = project_dir {
        let project_path = dir.join(".rollwise").join("settings.json");
        if project_path.exists() {
            let project = load_config_file(&project_path)?;
            merge_config(&mut config, project);
        }
    }

    // Apply environment overrides
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".rollwise").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/rollwise/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("rollwise").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// Get the default database path for the server.
pub fn database_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".rollwise").join("rollwise.db"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/rollwise/rollwise.db"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("rollwise").join("rollwise.db"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn merge_config(base: &mut Config, overlay: Config) {
    // Merge server config
    if overlay.server.database_path.is_some() {
        base.server.database_path = overlay.server.database_path;
    }
    base.server.port = overlay.server.port;
    base.server.log_level = overlay.server.log_level;
    base.server.max_body_bytes = overlay.server.max_body_bytes;

    // Merge quota config
    base.quota = overlay.quota;

    // Merge generator config
    base.generator = overlay.generator;

    // Merge feature flags
    base.feature_flags.extend(overlay.feature_flags);
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("ROLLWISE_PORT") {
        if let Ok(n) = val.parse() {
            config.server.port = n;
        }
    }
    if let Ok(val) = std::env::var("ROLLWISE_LOG_LEVEL") {
        config.server.log_level = val;
    }
    if let Ok(val) = std::env::var("ROLLWISE_DAILY_LIMIT") {
        if let Ok(n) = val.parse() {
            config.quota.daily_limit = n;
        }
    }
    if let Ok(val) = std::env::var("ROLLWISE_GENERATOR_URL") {
        config.generator.base_url = val;
    }
    if let Ok(val) = std::env::var("ROLLWISE_GENERATOR_MODEL") {
        config.generator.model = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_daily_limit_is_3() {
        let config = Config::default();
        assert_eq!(config.quota.daily_limit, 3);
    }

    #[test]
    fn default_generator_timeout() {
        let config = Config::default();
        assert_eq!(config.generator.timeout_secs, 15);
    }

    #[test]
    fn overlay_replaces_quota() {
        let mut base = Config::default();
        let overlay = Config {
            quota: QuotaConfig { daily_limit: 10 },
            ..Config::default()
        };
        merge_config(&mut base, overlay);
        assert_eq!(base.quota.daily_limit, 10);
    }
}

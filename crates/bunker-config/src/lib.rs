//! Shared configuration for bunker tools.
//!
//! TOML profiles layered with `BUNKER_` environment variables, and
//! translation to `bunker_core::InventoryConfig`. The CLI adds flag
//! overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use bunker_core::{InventoryConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named inventory servers.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Delay before redialing the change feed, in seconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            reconnect_delay_secs: default_reconnect_delay(),
            insecure: false,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_reconnect_delay() -> u64 {
    5
}

/// A named inventory server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// REST base URL (e.g., "http://localhost:8080/api").
    pub api_url: String,

    /// Change-feed URL. Derived from `api_url` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_secs: Option<u64>,
}

impl Profile {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ws_url: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            reconnect_delay_secs: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "bunker", "bunker").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("bunker");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file is not an error.
///
/// Environment overrides use `__` as the nesting separator, e.g.
/// `BUNKER_DEFAULTS__TIMEOUT=10` or `BUNKER_DEFAULT_PROFILE=lab`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BUNKER_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if anything goes wrong.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

/// Pick the named profile, else the config's default profile.
pub fn select_profile<'a>(
    cfg: &'a Config,
    name: Option<&'a str>,
) -> Result<(&'a str, &'a Profile), ConfigError> {
    let name = name
        .or(cfg.default_profile.as_deref())
        .unwrap_or("default");
    cfg.profiles
        .get(name)
        .map(|profile| (name, profile))
        .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|e: url::ParseError| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Build an `InventoryConfig` from a profile and the global defaults.
///
/// Profile fields win over `defaults`.
pub fn profile_to_inventory_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<InventoryConfig, ConfigError> {
    let api_url = parse_url("api_url", &profile.api_url)?;
    let mut config = InventoryConfig::new(api_url).map_err(|e| ConfigError::Validation {
        field: "api_url".into(),
        reason: e.to_string(),
    })?;

    if let Some(ref ws_url) = profile.ws_url {
        config.ws_url = parse_url("ws_url", ws_url)?;
    }

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.reconnect_delay = Duration::from_secs(
        profile
            .reconnect_delay_secs
            .unwrap_or(defaults.reconnect_delay_secs),
    );

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
output = "json"
timeout = 12

[profiles.lab]
api_url = "http://10.0.0.5:8080/api"
reconnect_delay_secs = 2

[profiles.remote]
api_url = "https://bunker.example/api"
ws_url = "wss://feed.bunker.example/ws/updates"
insecure = true
"#;

    fn sample_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults, Defaults::default());
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn file_overrides_defaults() {
        let (_dir, path) = sample_file();
        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.timeout, 12);
        // Untouched default keeps its value.
        assert_eq!(cfg.defaults.reconnect_delay_secs, 5);
        assert_eq!(cfg.profiles.len(), 2);
    }

    #[test]
    fn default_profile_resolves_with_derived_ws_url() {
        let (_dir, path) = sample_file();
        let cfg = load_config_from(&path).unwrap();

        let (name, profile) = select_profile(&cfg, None).unwrap();
        assert_eq!(name, "lab");

        let inventory = profile_to_inventory_config(profile, &cfg.defaults).unwrap();
        assert_eq!(inventory.api_url.as_str(), "http://10.0.0.5:8080/api");
        assert_eq!(inventory.ws_url.as_str(), "ws://10.0.0.5:8080/ws/updates");
        assert_eq!(inventory.timeout, Duration::from_secs(12));
        assert_eq!(inventory.reconnect_delay, Duration::from_secs(2));
        assert_eq!(inventory.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn explicit_ws_url_and_insecure_flag() {
        let (_dir, path) = sample_file();
        let cfg = load_config_from(&path).unwrap();

        let (_, profile) = select_profile(&cfg, Some("remote")).unwrap();
        let inventory = profile_to_inventory_config(profile, &cfg.defaults).unwrap();
        assert_eq!(
            inventory.ws_url.as_str(),
            "wss://feed.bunker.example/ws/updates"
        );
        assert_eq!(inventory.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let cfg = Config::default();
        let err = select_profile(&cfg, Some("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { name } if name == "nope"));
    }

    #[test]
    fn bad_url_is_validation_error() {
        let err = profile_to_inventory_config(&Profile::new("not a url"), &Defaults::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "api_url"));
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = Profile::new("http://localhost:8080/api");
        profile.timeout = Some(3);
        cfg.profiles.insert("default".into(), profile.clone());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles.get("default"), Some(&profile));
    }
}

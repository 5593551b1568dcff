//! Shared configuration for the showroom TUI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `showroom_core::BackendConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use showroom_core::{BackendConfig, Credentials, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

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
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_refresh")]
    pub refresh_interval: u64,

    #[serde(default = "default_feed")]
    pub feed: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            refresh_interval: default_refresh(),
            feed: default_feed(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_refresh() -> u64 {
    60
}
fn default_feed() -> bool {
    true
}

/// A named backend profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://showcase.example.com").
    pub backend: String,

    /// Sign in as this account during connect (optional; anonymous
    /// browsing works without it).
    pub email: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override refresh interval (seconds).
    pub refresh_interval: Option<u64>,

    /// Override live-feed toggle.
    pub feed: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "showroom", "showroom").map_or_else(
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
    p.push("showroom");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load a Config from an explicit file path + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SHOWROOM_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a profile's password from the credential chain:
/// env var → system keyring → plaintext TOML.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("showroom", &format!("{profile_name}/password")) {
        if let Ok(val) = entry.get_password() {
            return Some(SecretString::from(val));
        }
    }

    // 3. Plaintext TOML (discouraged, but supported)
    profile
        .password
        .as_ref()
        .map(|p| SecretString::from(p.clone()))
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new("showroom", &format!("{profile_name}/password")).map_err(
        |e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        },
    )?;
    entry
        .set_password(password)
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Translation to BackendConfig ────────────────────────────────────

/// Build a `BackendConfig` from a named profile, applying defaults.
pub fn profile_to_backend_config(
    config: &Config,
    profile_name: &str,
) -> Result<BackendConfig, ConfigError> {
    let profile = config
        .profiles
        .get(profile_name)
        .ok_or_else(|| ConfigError::UnknownProfile {
            profile: profile_name.into(),
        })?;

    let url: Url = profile
        .backend
        .parse()
        .map_err(|e| ConfigError::Validation {
            field: "backend".into(),
            reason: format!("{e}"),
        })?;

    let insecure = profile.insecure.unwrap_or(config.defaults.insecure);
    let tls = match (&profile.ca_cert, insecure) {
        (_, true) => TlsVerification::DangerAcceptInvalid,
        (Some(path), false) => TlsVerification::CustomCa(path.clone()),
        (None, false) => TlsVerification::System,
    };

    let credentials = match (&profile.email, resolve_password(profile, profile_name)) {
        (Some(email), Some(password)) => Some(Credentials {
            email: email.clone(),
            password,
        }),
        _ => None,
    };

    Ok(BackendConfig {
        url,
        credentials,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(config.defaults.timeout)),
        refresh_interval: Duration::from_secs(
            profile
                .refresh_interval
                .unwrap_or(config.defaults.refresh_interval),
        ),
        feed_enabled: profile.feed.unwrap_or(config.defaults.feed),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_profile_from_toml() {
        let file = write_config(
            r#"
default_profile = "prod"

[defaults]
timeout = 10

[profiles.prod]
backend = "https://showcase.example.com"
email = "admin@example.com"
password = "plaintext-pw"
"#,
        );

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("prod"));
        assert_eq!(config.defaults.timeout, 10);

        let backend = profile_to_backend_config(&config, "prod").unwrap();
        assert_eq!(backend.url.as_str(), "https://showcase.example.com/");
        assert_eq!(backend.timeout, Duration::from_secs(10));
        assert!(backend.credentials.is_some());
        assert!(backend.feed_enabled);
    }

    #[test]
    fn profile_overrides_defaults() {
        let file = write_config(
            r#"
[profiles.lab]
backend = "https://lab.local:8443"
insecure = true
timeout = 5
feed = false
"#,
        );

        let config = load_config_from(file.path()).unwrap();
        let backend = profile_to_backend_config(&config, "lab").unwrap();
        assert!(matches!(backend.tls, TlsVerification::DangerAcceptInvalid));
        assert_eq!(backend.timeout, Duration::from_secs(5));
        assert!(!backend.feed_enabled);
        assert!(backend.credentials.is_none());
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let config = Config::default();
        assert!(matches!(
            profile_to_backend_config(&config, "nope"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn bad_backend_url_is_an_error() {
        let file = write_config(
            r#"
[profiles.bad]
backend = "not a url"
"#,
        );
        let config = load_config_from(file.path()).unwrap();
        assert!(matches!(
            profile_to_backend_config(&config, "bad"),
            Err(ConfigError::Validation { .. })
        ));
    }
}

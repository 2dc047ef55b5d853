//! Shared configuration for aclflow tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `aclflow_core::BackendConfig`. The CLI layers its
//! global flags on top.

use std::collections::BTreeMap;
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

use aclflow_core::{BackendConfig, Credentials, TlsVerification};

/// Keyring service name; entries are `<profile>/password`.
pub const KEYRING_SERVICE: &str = "aclflow";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

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
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
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

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://acl.example.com").
    pub backend: String,

    /// Login email.
    pub email: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

impl Config {
    /// The profile to use: `requested`, else the configured default.
    pub fn profile(&self, requested: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }

    /// Set one profile key from its textual value (`config set`).
    pub fn set_profile_value(
        &mut self,
        profile_name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let profile = self.profiles.entry(profile_name.to_owned()).or_default();
        let invalid = |reason: String| ConfigError::Validation {
            field: key.to_owned(),
            reason,
        };
        match key {
            "backend" => {
                url::Url::parse(value).map_err(|e| invalid(e.to_string()))?;
                value.clone_into(&mut profile.backend);
            }
            "email" => profile.email = Some(value.to_owned()),
            "password" => profile.password = Some(value.to_owned()),
            "password_env" => profile.password_env = Some(value.to_owned()),
            "ca_cert" => profile.ca_cert = Some(PathBuf::from(value)),
            "insecure" => {
                let on = value
                    .parse()
                    .map_err(|_| invalid(format!("expected true/false, got '{value}'")))?;
                profile.insecure = Some(on);
            }
            "timeout" => {
                let secs = value
                    .parse()
                    .map_err(|_| invalid(format!("expected seconds, got '{value}'")))?;
                profile.timeout = Some(secs);
            }
            other => {
                return Err(ConfigError::Validation {
                    field: other.to_owned(),
                    reason: "unknown key (expected backend, email, password, password_env, ca_cert, insecure or timeout)".into(),
                });
            }
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "aclflow", "aclflow").map_or_else(
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
    p.push("aclflow");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, then `ACLFLOW_*` environment overrides
/// (`ACLFLOW_DEFAULT_PROFILE`, `ACLFLOW_DEFAULTS__OUTPUT`, ...).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ACLFLOW_").split("__"));

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
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Resolve the login password: profile's `password_env`, then
/// `ACLFLOW_PASSWORD`, then the keyring, then plaintext config.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(pw) = std::env::var("ACLFLOW_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Email + password for a profile, or `None` when no email is set.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<Credentials>, ConfigError> {
    let Some(email) = profile
        .email
        .clone()
        .or_else(|| std::env::var("ACLFLOW_EMAIL").ok())
    else {
        return Ok(None);
    };
    let password = resolve_password(profile, profile_name)?;
    Ok(Some(Credentials { email, password }))
}

/// Parse a backend URL with a field-specific error.
pub fn parse_backend_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "backend".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `BackendConfig` from a profile, no CLI flag overrides.
pub fn profile_to_backend_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<BackendConfig, ConfigError> {
    let mut config = profile_endpoint(profile, defaults)?;
    config.credentials = resolve_credentials(profile, profile_name)?;
    Ok(config)
}

/// URL, TLS and timeout of a profile, with no credentials attached.
pub fn profile_endpoint(profile: &Profile, defaults: &Defaults) -> Result<BackendConfig, ConfigError> {
    let url = parse_backend_url(&profile.backend)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(BackendConfig {
        url,
        credentials: None,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}

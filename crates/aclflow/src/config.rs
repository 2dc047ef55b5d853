//! Profile resolution for the CLI: config file + global flags into a
//! `BackendConfig`, and the connect step shared by every backend command.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use aclflow_api::{AclClient, MemorySession};
use aclflow_config::{Config, ConfigError, Profile};
use aclflow_core::{BackendConfig, Credentials};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// A backend config together with the profile it came from.
pub struct Resolved {
    pub profile_name: String,
    pub backend: BackendConfig,
}

/// Config file in effect: `--config`, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(aclflow_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(aclflow_config::load_config_from(&config_file(global))?)
}

pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Resolve the backend from the active profile with flag overrides. With no
/// matching profile, `--backend` alone is enough. `prompt` allows asking for
/// a missing password on an interactive terminal.
pub fn resolve_backend(global: &GlobalOpts, prompt: bool) -> Result<Resolved, CliError> {
    let cfg = load(global)?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(p) => p.clone(),
        None if global.backend.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(ConfigError::UnknownProfile { name: profile_name }.into());
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_file(global).display().to_string(),
            });
        }
    };

    if let Some(ref url) = global.backend {
        profile.backend.clone_from(url);
    }
    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(secs) = global.timeout {
        profile.timeout = Some(secs);
    }

    // Credentials are resolved separately so a missing password can fall
    // back to a prompt.
    let mut backend = aclflow_config::profile_endpoint(&profile, &cfg.defaults)?;
    backend.credentials = match aclflow_config::resolve_credentials(&profile, &profile_name) {
        Ok(creds) => creds,
        Err(ConfigError::NoCredentials { .. }) if prompt && std::io::stdin().is_terminal() => {
            let email = profile
                .email
                .clone()
                .or_else(|| std::env::var("ACLFLOW_EMAIL").ok())
                .unwrap_or_default();
            Some(Credentials {
                password: prompt_password(&email)?,
                email,
            })
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Resolved {
        profile_name,
        backend,
    })
}

pub fn prompt_password(email: &str) -> Result<SecretString, CliError> {
    let pw = rpassword::prompt_password(format!("Password for {email}: "))?;
    Ok(SecretString::from(pw))
}

/// Connect with a fresh in-memory session, logging in when credentials are
/// configured.
pub async fn connect(resolved: &Resolved) -> Result<Arc<AclClient>, CliError> {
    let client = resolved
        .backend
        .connect(Arc::new(MemorySession::new()))
        .await?;
    tracing::debug!(
        profile = %resolved.profile_name,
        url = %resolved.backend.url,
        authenticated = client.session().is_authenticated(),
        "connected"
    );
    Ok(Arc::new(client))
}

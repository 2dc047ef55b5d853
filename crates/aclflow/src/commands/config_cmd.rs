//! Config subcommand handlers. None of these contact the backend.

use dialoguer::{Confirm, Input};

use aclflow_config::{Config, ConfigError, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

fn save(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    Ok(aclflow_config::save_config_to(cfg, &config::config_file(global))?)
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn unknown_profile(cfg: &Config, name: String) -> CliError {
    let available: Vec<_> = cfg.profiles.keys().cloned().collect();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Copy of `cfg` safe to print.
fn redacted(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    for profile in shown.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("********".into());
        }
    }
    shown
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n({e})")),
                |c| c.default_profile.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load(global)?;
            let profile_name = config::active_profile_name(global, &cfg);
            cfg.set_profile_value(&profile_name, &key, &value)?;
            save(&cfg, global)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load(global)?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: aclflow config init");
            } else {
                for (name, profile) in &cfg.profiles {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}\t{}", profile.backend);
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load(global)?;
            if !cfg.profiles.contains_key(&name) {
                return Err(unknown_profile(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            save(&cfg, global)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load(global)?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(unknown_profile(&cfg, profile_name));
            }

            let secret = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            aclflow_config::store_password(&profile_name, &secret)?;
            if !global.quiet {
                eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            }
            Ok(())
        }
    }
}

// ── Init wizard ─────────────────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_file(global);
    eprintln!("aclflow configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    let mut cfg = config::load(global)?;

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let backend: String = Input::new()
        .with_prompt("Backend URL")
        .default("http://localhost:5000".into())
        .validate_with(|input: &String| {
            aclflow_config::parse_backend_url(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    let email: String = Input::new()
        .with_prompt("Login email")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile {
        backend,
        email: (!email.is_empty()).then_some(email),
        ..Profile::default()
    };

    if profile.email.is_some() {
        let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
        if !password.is_empty() {
            let use_keyring = Confirm::new()
                .with_prompt("Store the password in the system keyring?")
                .default(true)
                .interact()
                .map_err(prompt_err)?;
            if use_keyring {
                match aclflow_config::store_password(&profile_name, &password) {
                    Ok(()) => eprintln!("   ✓ Password stored in system keyring"),
                    Err(ConfigError::Keyring(e)) => {
                        eprintln!("   keyring unavailable ({e}); saving to the config file");
                        profile.password = Some(password);
                    }
                    Err(e) => return Err(e.into()),
                }
            } else {
                profile.password = Some(password);
            }
        }
    }

    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    save(&cfg, global)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: aclflow auth whoami");
    Ok(())
}

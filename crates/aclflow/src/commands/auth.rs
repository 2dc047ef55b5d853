//! Login, whoami, and account signup.

use std::io::IsTerminal;
use std::sync::Arc;

use dialoguer::Input;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use aclflow_api::{AclClient, MemorySession, SignupRequest, UserInfo};
use aclflow_core::Credentials;

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::config::{self, Resolved};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct WhoAmI {
    username: String,
    email: String,
    name: Option<String>,
    role: String,
    desk: &'static str,
}

/// Admins and reviewers land on the review desk, everyone else files requests.
fn desk_for(user: &UserInfo) -> &'static str {
    if user.has_any_role(&["admin", "reviewer"]) {
        "reviewer"
    } else {
        "requester"
    }
}

fn require_credentials(resolved: &Resolved) -> Result<&Credentials, CliError> {
    resolved
        .backend
        .credentials
        .as_ref()
        .ok_or_else(|| CliError::NoCredentials {
            profile: resolved.profile_name.clone(),
        })
}

fn ask(label: &str, given: Option<String>) -> Result<String, CliError> {
    if let Some(value) = given.filter(|v| !v.is_empty()) {
        return Ok(value);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: label.to_lowercase(),
            reason: "required (pass it as a flag when not running interactively)".into(),
        });
    }
    Input::new()
        .with_prompt(label)
        .interact_text()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

pub async fn handle(
    args: AuthArgs,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Login { save } => {
            let creds = require_credentials(resolved)?;
            let client = config::connect(resolved).await?;
            let user = client.session().user().unwrap_or_default();
            if save {
                aclflow_config::store_password(
                    &resolved.profile_name,
                    creds.password.expose_secret(),
                )?;
            }
            if !global.quiet {
                eprintln!("✓ Logged in as {} ({})", user.username, user.email);
                if save {
                    eprintln!("  Password stored in system keyring for '{}'", resolved.profile_name);
                }
            }
            Ok(())
        }

        AuthCommand::Whoami => {
            require_credentials(resolved)?;
            let client = config::connect(resolved).await?;
            let mut user = client.session().user().unwrap_or_default();
            user.role = Some(client.role().await?);
            let me = WhoAmI {
                desk: desk_for(&user),
                role: user.role.clone().unwrap_or_default(),
                username: user.username,
                email: user.email,
                name: user.name,
            };
            let out = output::render_single(
                &global.output,
                &me,
                |m| {
                    output::detail_lines(&[
                        ("Username", m.username.clone()),
                        ("Name", m.name.clone().unwrap_or_default()),
                        ("Email", m.email.clone()),
                        ("Role", m.role.clone()),
                        ("Desk", m.desk.to_owned()),
                    ])
                },
                |m| m.username.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuthCommand::Signup { username, fullname } => {
            let creds = resolved.backend.credentials.as_ref();
            let email = ask("Email", creds.map(|c| c.email.clone()))?;
            let username = ask("Username", username)?;
            let fullname = ask("Full name", fullname)?;
            let password: SecretString = match creds {
                Some(c) => c.password.clone(),
                None => config::prompt_password(&email)?,
            };

            let client = AclClient::new(
                resolved.backend.url.as_str(),
                &resolved.backend.transport(),
                Arc::new(MemorySession::new()),
            )?;
            let resp = client
                .signup(&SignupRequest {
                    username,
                    fullname,
                    email: email.clone(),
                    password: password.expose_secret().to_owned(),
                })
                .await?;

            let out = output::render_single(
                &global.output,
                &resp,
                |r| {
                    r.get("message")
                        .and_then(|m| m.as_str())
                        .map_or_else(|| format!("✓ Account created for {email}"), |m| format!("✓ {m}"))
                },
                |_| email.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

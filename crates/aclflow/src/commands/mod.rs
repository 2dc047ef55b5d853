//! Command dispatch: CLI args to core calls to formatted output.

pub mod auth;
pub mod check;
pub mod config_cmd;
pub mod help_info;
pub mod options;
pub mod report;
pub mod requests;
pub mod submit;
pub mod templates;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Resolved};
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Auth manages its own session; everything else connects first.
    let client = match cmd {
        Command::Auth(args) => return auth::handle(args, resolved, global).await,
        _ => config::connect(resolved).await?,
    };

    match cmd {
        Command::Options(args) => options::handle(&client, args, global).await,
        Command::Submit(args) => submit::handle(client, args, global).await,
        Command::Templates(args) => templates::handle(&client, args, global).await,
        Command::Requests(args) => requests::handle(client, args, global).await,
        Command::Report(args) => report::handle(&client, args, global).await,
        Command::HelpInfo => help_info::handle(&client, global).await,
        // Auth, Check, Config and Completions are handled earlier
        Command::Auth(_) | Command::Check(_) | Command::Config(_) | Command::Completions(_) => {
            unreachable!()
        }
    }
}

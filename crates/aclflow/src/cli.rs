//! Clap derive structures for the `aclflow` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// aclflow -- draft, validate, and track ACL change requests
#[derive(Debug, Parser)]
#[command(
    name = "aclflow",
    version,
    about = "Draft, validate, and track ACL change requests",
    long_about = "Command-line client for the ACL request workflow service.\n\n\
        Validates firewall rule requests offline, submits multi-row requests\n\
        with catalog auto-population, and drives the reviewer workflow.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "ACLFLOW_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'b', env = "ACLFLOW_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Login email (overrides profile)
    #[arg(long, short = 'e', env = "ACLFLOW_EMAIL", global = true)]
    pub email: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "ACLFLOW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ACLFLOW_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ACLFLOW_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ACLFLOW_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate values or a rows file offline
    Check(CheckArgs),

    /// Show the option catalog (system types, categories, known endpoints)
    #[command(alias = "opts")]
    Options(OptionsArgs),

    /// Submit the requests in a rows file
    Submit(SubmitArgs),

    /// Browse and use request templates
    #[command(alias = "tpl")]
    Templates(TemplatesArgs),

    /// Review stored requests and move them through the workflow
    #[command(alias = "req")]
    Requests(RequestsArgs),

    /// Download the spreadsheet of every visible request
    Report(ReportArgs),

    /// Show the backend's help content
    HelpInfo,

    /// Log in, sign up, or show the current user
    Auth(AuthArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CHECK
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(subcommand)]
    pub command: CheckCommand,
}

#[derive(Debug, Subcommand)]
pub enum CheckCommand {
    /// Validate an IP, CIDR block, or IP range
    Ip {
        /// Value to check (e.g. 10.0.0.1, 10.0.0.0/24, 10.0.0.1-10.0.0.9)
        value: String,
    },

    /// Validate a service specification
    Service {
        /// Value to check (e.g. https, tcp/443, 8000-8080, "http,ssh")
        value: String,
    },

    /// Validate a description
    Description {
        /// Value to check
        value: String,
    },

    /// Validate every row in a JSON or YAML rows file
    Rows {
        /// Rows file
        file: PathBuf,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OPTIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct OptionsArgs {
    /// Ask the backend to resync its rule database first
    #[arg(long)]
    pub sync: bool,

    /// Show the categories (or, with --category, the endpoints) of one system type
    #[arg(long, short = 't')]
    pub system_type: Option<String>,

    /// Show the known source and destination endpoints of one category
    #[arg(long, short = 'c', requires = "system_type")]
    pub category: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SUBMIT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// JSON or YAML rows file
    #[arg(required_unless_present = "template")]
    pub file: Option<PathBuf>,

    /// Start from the named template (file rows are appended)
    #[arg(long, short = 't')]
    pub template: Option<String>,

    /// Name recorded on the submission report
    #[arg(long)]
    pub requester: Option<String>,

    /// Directory to save the submission spreadsheet in
    #[arg(long, default_value = ".")]
    pub report_dir: PathBuf,

    /// Do not download the submission spreadsheet
    #[arg(long)]
    pub no_report: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TEMPLATES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub command: TemplatesCommand,
}

#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    /// List template rules, or whole templates with --grouped
    #[command(alias = "ls")]
    List {
        /// One line per template instead of per rule
        #[arg(long, short = 'g')]
        grouped: bool,

        #[arg(long)]
        system_type: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        requester: Option<String>,
    },

    /// Show one template rule
    Get {
        /// Template rule ID
        id: String,
    },

    /// Create a request from a template rule
    Use {
        /// Template rule ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REQUESTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RequestsArgs {
    #[command(subcommand)]
    pub command: RequestsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RequestsCommand {
    /// List stored requests
    #[command(alias = "ls")]
    List {
        /// Status or workflow stage ("all" for any)
        #[arg(long, short = 's')]
        status: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        system_type: Option<String>,

        /// Print dashboard counters instead of the list
        #[arg(long)]
        summary: bool,
    },

    /// Show one request with its comments
    Get {
        /// Request ID
        id: String,
    },

    /// Move a request to a workflow stage
    Stage {
        /// Request ID
        id: String,

        /// Target stage (e.g. under-review, security-approval, rejected)
        stage: String,

        /// Comment recorded with the change
        #[arg(long, short = 'm', default_value = "")]
        comment: String,
    },

    /// Add a reviewer comment
    Comment {
        /// Request ID
        id: String,

        /// Comment text
        text: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REPORT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Output path (defaults to the server-provided filename)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Check credentials against the backend
    Login {
        /// Store the password in the system keyring on success
        #[arg(long)]
        save: bool,
    },

    /// Show the logged-in user and role
    Whoami,

    /// Register a new account
    Signup {
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        fullname: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (backend, email, password_env, ca_cert, insecure, timeout)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

//! Clap derive structures for the `bunker` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use bunker_core::{RecordId, ResourceKind};
use clap::{Args, Parser, Subcommand, ValueEnum};

const KIND_HELP: &str = "Resource kind: weapons, ammunition-stocks, ammunition-types, food, \
    medications, fuel, fuel-types, batteries, generators, storage-locations";

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bunker -- inspect and watch the prepper-bunker inventory
#[derive(Debug, Parser)]
#[command(
    name = "bunker",
    version,
    about = "Inspect the prepper-bunker inventory from the command line",
    long_about = "Lists, queries and watches bunker inventory records.\n\n\
        `watch` keeps a live copy of the inventory in sync with the server's\n\
        change feed and prints every change as it lands.",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "BUNKER_PROFILE", global = true)]
    pub profile: Option<String>,

    /// REST base URL, e.g. http://localhost:8080/api (overrides profile)
    #[arg(long, short = 'u', env = "BUNKER_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Change-feed URL (default: derived from the API URL)
    #[arg(long, env = "BUNKER_WS_URL", global = true)]
    pub ws_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BUNKER_OUTPUT",
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
    #[arg(long, short = 'k', env = "BUNKER_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BUNKER_TIMEOUT", global = true)]
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
    /// Plain text, one id per line (scripting)
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
    /// List every record of a kind
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record
    Get {
        #[arg(help = KIND_HELP)]
        kind: ResourceKind,
        id: RecordId,
    },

    /// Create a record from a JSON payload
    Create {
        #[arg(help = KIND_HELP)]
        kind: ResourceKind,

        /// Record fields as inline JSON, or @path to read them from a file
        #[arg(long, short = 'd')]
        data: String,
    },

    /// Replace a record's fields with a JSON payload
    Update {
        #[arg(help = KIND_HELP)]
        kind: ResourceKind,
        id: RecordId,

        /// Record fields as inline JSON, or @path to read them from a file
        #[arg(long, short = 'd')]
        data: String,
    },

    /// Delete one record
    #[command(alias = "rm")]
    Delete {
        #[arg(help = KIND_HELP)]
        kind: ResourceKind,
        id: RecordId,
    },

    /// List records past their expiration date
    Expired { kind: PerishableKind },

    /// List records expiring soon
    Expiring { kind: PerishableKind },

    /// List records kept in one storage location
    ByLocation {
        #[arg(help = KIND_HELP)]
        kind: ResourceKind,
        location_id: RecordId,
    },

    /// Aggregate quantities
    Totals(TotalsArgs),

    /// Keep a live copy in sync and print every change until Ctrl-C
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── List ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(help = KIND_HELP)]
    pub kind: ResourceKind,

    /// Generators only: filter by status
    #[arg(long)]
    pub status: Option<String>,

    /// Fuel and generators only: filter by fuel type id
    #[arg(long)]
    pub fuel_type: Option<RecordId>,

    /// Batteries only: filter by battery type
    #[arg(long)]
    pub battery_type: Option<String>,

    /// Medications only: filter by purpose
    #[arg(long)]
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PerishableKind {
    Food,
    #[value(alias = "medication")]
    Medications,
}

// ── Totals ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TotalsArgs {
    #[command(subcommand)]
    pub command: TotalsCommand,
}

#[derive(Debug, Subcommand)]
pub enum TotalsCommand {
    /// Rounds on hand for one ammunition type
    Ammunition { ammunition_type_id: RecordId },

    /// Fuel on hand for one fuel type
    Fuel { fuel_type_id: RecordId },

    /// Batteries on hand of one type
    Battery { battery_type: String },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Kinds to watch (default: all)
    #[arg(help = KIND_HELP)]
    pub kinds: Vec<ResourceKind>,

    /// Also print every raw change event
    #[arg(long)]
    pub events: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Create or update a profile
    Init,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use { name: String },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

use crate::data_source::DataKind;
use crate::resource::ResourceKind;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tableau-provider")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Manage Tableau Server/Cloud content and permissions declaratively", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection settings. Each flag falls back to its environment variable,
/// then to the provider file.
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// URL of your Tableau server
    #[arg(long, env = "TABLEAU_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// REST API version of the server, e.g. 3.19
    #[arg(long, env = "TABLEAU_SERVER_VERSION", global = true)]
    pub server_version: Option<String>,

    /// Login username
    #[arg(long, env = "TABLEAU_USERNAME", global = true)]
    pub username: Option<String>,

    /// Login password
    #[arg(long, env = "TABLEAU_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Personal access token name
    #[arg(long, env = "TABLEAU_PERSONAL_ACCESS_TOKEN_NAME", global = true)]
    pub token_name: Option<String>,

    /// Personal access token secret
    #[arg(
        long,
        env = "TABLEAU_PERSONAL_ACCESS_TOKEN_SECRET",
        global = true,
        hide_env_values = true
    )]
    pub token_secret: Option<String>,

    /// Site content URL (leave empty for the default site)
    #[arg(long, env = "TABLEAU_SITE_NAME", global = true)]
    pub site: Option<String>,

    /// Provider config file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a resource from a JSON plan and write its state
    Create {
        /// Resource type
        #[arg(value_enum)]
        kind: ResourceKind,

        /// JSON plan file ("-" for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// State file to write
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Refresh a state file from the server
    Read {
        /// State file to refresh
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Apply a new JSON plan to an existing resource
    Update {
        /// JSON plan file ("-" for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// State file of the resource
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Delete a resource and its state file
    Delete {
        /// State file of the resource
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Adopt an existing object by ID
    Import {
        /// Resource type
        #[arg(value_enum)]
        kind: ResourceKind,

        /// Object ID (composite for memberships and permissions)
        id: String,

        /// State file to write
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Look objects up without managing them
    Data {
        /// Data source
        #[arg(value_enum)]
        kind: DataKind,

        /// Lookup argument, e.g. --arg id=abc (repeatable)
        #[arg(short, long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },

    /// List resource types and data sources
    Resources,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

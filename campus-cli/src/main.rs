//! Main entry point for the Campus Admin CLI.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::ClientConfig;
use shared::models::{CurrentUser, Session, UserId};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Campus Admin CLI
#[derive(Parser)]
#[command(name = "campus")]
#[command(about = "Command-line client for the Campus Admin API", long_about = None)]
struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (e.g., campus.yaml or campus.json). If not provided, defaults will be used."
    )]
    config: Option<PathBuf>,

    /// Identifier of the signed-in user
    #[arg(long, global = true, default_value_t = 0)]
    user_id: UserId,

    /// Bearer token sent with every request
    #[arg(long, global = true, env = "CAMPUS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the Campus Admin CLI
#[derive(Subcommand)]
enum Commands {
    /// List conversations of the signed-in user, newest first
    Conversations {
        /// Only show conversations whose counterpart name contains this text
        #[arg(long, short)]
        search: Option<String>,

        /// Show the full thread with this counterpart instead of the list
        #[arg(long)]
        select: Option<UserId>,
    },

    /// Fetch one page of a collection
    List {
        /// Collection path, e.g. `students` or `courses`
        resource: String,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Page size (defaults to the configured `per_page`)
        #[arg(long)]
        per_page: Option<u32>,

        /// Filter as `key=value`; an empty value unsets the key. Repeatable.
        #[arg(long = "filter", short, value_parser = commands::list::parse_filter)]
        filters: Vec<(String, String)>,
    },

    /// Fetch a single record
    Show {
        /// Collection path, e.g. `students`
        resource: String,

        /// Record identifier
        id: String,
    },

    /// Print the resolved configuration
    Config {
        /// Output format
        #[arg(long, short, default_value = "yaml", value_parser = ["yaml", "json"])]
        format: String,
    },
}

fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let config =
        ClientConfig::load_config(cli.config.clone()).context("failed to load configuration")?;
    init_tracing(&config);

    let session = Session::new(
        CurrentUser {
            id: cli.user_id,
            ..CurrentUser::default()
        },
        cli.token,
    );

    match cli.command {
        Commands::Conversations { search, select } => {
            commands::conversations::run(&config, &session, search.as_deref(), select).await?;
        }
        Commands::List {
            resource,
            page,
            per_page,
            filters,
        } => {
            let per_page = per_page.unwrap_or(config.per_page);
            commands::list::run(&config, &session, &resource, page, per_page, filters).await?;
        }
        Commands::Show { resource, id } => {
            commands::show::run(&config, &session, &resource, &id).await?;
        }
        Commands::Config { format } => {
            commands::config::print_config(&config, &format)?;
        }
    }

    Ok(())
}

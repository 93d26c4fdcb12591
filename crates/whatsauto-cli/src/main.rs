//! # whatsauto
//!
//! Guided sender for PDF invitations over WhatsApp.
//!
//! - **docs**: upload invitation PDFs and approve them per recipient class
//! - **contacts**: import recipients from `name,phone` files or a vCard
//!   export of the device address book
//! - **assign**: pick the document and variant for each contact
//! - **run**: walk the queue, opening one conversation at a time with a
//!   randomized pause between contacts

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use whatsauto_store::Database;

use crate::commands::Context;
use crate::config::CliConfig;

/// Guided WhatsApp invitation sender.
#[derive(Parser)]
#[command(name = "whatsauto", version, about)]
struct Cli {
    /// Output in JSON format (machine-readable).
    #[arg(long, global = true)]
    json: bool,

    /// Database file. Overrides WHATSAUTO_DB.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Default country code for numbers without a leading `+`.
    /// Overrides WHATSAUTO_COUNTRY_CODE.
    #[arg(long, global = true)]
    country_code: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage invitation PDFs.
    #[command(alias = "doc")]
    Docs {
        #[command(subcommand)]
        action: commands::docs::DocsAction,
    },
    /// Manage recipients.
    #[command(alias = "contact")]
    Contacts {
        #[command(subcommand)]
        action: commands::contacts::ContactsAction,
    },
    /// Assign documents to contacts.
    Assign {
        #[command(subcommand)]
        action: commands::assign::AssignAction,
    },
    /// Show the contacts still waiting for a send, in send order.
    Queue,
    /// Show send progress.
    Stats,
    /// Walk the queue interactively.
    Run,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("whatsauto_cli=info,whatsauto_send=info,whatsauto_store=info,warn")
        }))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{e:#}"), json);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = CliConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }
    if let Some(code) = cli.country_code {
        let code = whatsauto_shared::phone::validate_country_code(&code)
            .context("Invalid --country-code")?;
        config.country_code = code.to_string();
    }

    let db = match &config.db_path {
        Some(path) => Database::open_at(path),
        None => Database::new(),
    }
    .context("Local storage is unavailable")?;
    info!(path = ?db.path(), version = env!("CARGO_PKG_VERSION"), "database opened");

    let ctx = Context {
        db: &db,
        config: &config,
        json: cli.json,
    };

    match cli.command {
        Commands::Docs { action } => commands::docs::run(action, &ctx),
        Commands::Contacts { action } => commands::contacts::run(action, &ctx),
        Commands::Assign { action } => commands::assign::run(action, &ctx),
        Commands::Queue => commands::queue::show_queue(&ctx),
        Commands::Stats => commands::queue::show_stats(&ctx),
        Commands::Run => commands::run::run(&ctx).await,
    }
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use wadump::cli::{dump, sessions};
use wadump::export::{ExportOptions, OutputFormat};
use wadump::transcode::DisplayZone;
use wadump::{ChatStore, Config, SessionFilter};

#[derive(Parser)]
#[command(name = "wadump", version)]
#[command(about = "List and export chat sessions from a ChatStorage.sqlite backup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to ChatStorage.sqlite (defaults to ./ChatStorage.sqlite)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
}

#[derive(Args)]
struct FilterArgs {
    /// Only sessions whose name contains this text (case-insensitive)
    #[arg(long)]
    name: Option<String>,

    /// Only sessions whose contact address contains this text
    #[arg(long)]
    number: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List chat sessions
    Sessions {
        #[command(flatten)]
        filter: FilterArgs,

        /// Sort by name
        #[arg(short, long)]
        sort: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export direct chats to files
    Dump {
        /// Session IDs to export (all direct chats when omitted)
        session_ids: Vec<i64>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Append the contact number to file names
        #[arg(long)]
        with_number: bool,

        /// Render timestamps in UTC instead of local time
        #[arg(long)]
        utc: bool,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_env("WADUMP_LOG")
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|e| {
            eprintln!(
                "WARN: log level '{}' is not a valid filter ({}); falling back to 'warn'",
                config.logging.level, e
            );
            EnvFilter::new("warn")
        });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config);

    let db_path = cli.db.unwrap_or_else(|| config.database_path());
    if !db_path.exists() {
        anyhow::bail!(
            "Chat database not found at: {}\nUse --db to specify the path.",
            db_path.display()
        );
    }
    let store = ChatStore::open(&db_path)?;

    match cli.command {
        Commands::Sessions { filter, sort, json } => {
            let filter = SessionFilter {
                name: filter.name,
                number: filter.number,
                sort,
            };
            sessions::run(&store, &filter, json)?;
        }
        Commands::Dump {
            session_ids,
            filter,
            format,
            output,
            with_number,
            utc,
        } => {
            let cancel = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&cancel);
            ctrlc::set_handler(move || {
                eprintln!("\nInterrupt received, stopping after the current session...");
                flag.store(true, Ordering::SeqCst);
            })
            .context("Failed to install interrupt handler")?;

            let options = ExportOptions {
                target_dir: output.unwrap_or_else(|| config.output_dir()),
                format: format.unwrap_or(config.export.format),
                with_number: with_number || config.export.with_number,
                zone: if utc {
                    DisplayZone::Utc
                } else {
                    config.export.timezone
                },
            };
            let filter = SessionFilter {
                name: filter.name,
                number: filter.number,
                sort: false,
            };
            dump::run(&store, &session_ids, &filter, &options, &cancel)?;
        }
    }

    Ok(())
}

//! archivist - command-line client for the document archive
//!
//! Usage:
//!     archivist list --search invoice --department Finance --page 2
//!     archivist add --title "Lease 2024" --department Legal --shelf S-01
//!     archivist delete 12
//!     archivist receipt 12 --qr
//!     archivist scan --input codes.txt --raw

mod commands;
mod config;
mod line_camera;
mod render;

use clap::{Args, Parser, Subcommand};
use config::AppConfig;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "archivist", about = "Register, find and scan archived documents")]
struct Cli {
    /// YAML config file (defaults to ./archivist.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the archive service
    #[arg(long, global = true, env = "ARCHIVIST_API_URL")]
    api_url: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List documents, filtered and paginated locally
    List {
        /// Case-insensitive text matched against title, description and owner
        #[arg(long, short)]
        search: Option<String>,
        /// Exact department, case-insensitive
        #[arg(long, short)]
        department: Option<String>,
        #[arg(long, short, default_value_t = 1)]
        page: usize,
        /// Override the configured page size
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// List the departments present in the archive
    Departments,
    /// Show one document as stored on the server
    Show { id: i64 },
    /// Ask the server to search by title and department
    Search {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        department: Option<String>,
    },
    /// Register a new document
    Add {
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Change fields of a document; fields not given are kept
    Edit {
        id: i64,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a document after confirmation
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Download the PDF receipt of a document
    Receipt {
        id: i64,
        /// Directory to write into (defaults to the configured receipt_dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Also save the QR code image
        #[arg(long)]
        qr: bool,
    },
    /// Print the QR capsule text of a document
    Capsule { id: i64 },
    /// Decode capsule text given as argument or on stdin
    Decode { text: Option<String> },
    /// Scan capsules fed as lines (keyboard-wedge scanner or file)
    Scan {
        /// Read codes from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
        /// Also print the text read from the code, before decoding
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub owner_name: Option<String>,
    #[arg(long)]
    pub owner_contact: Option<String>,
    #[arg(long)]
    pub shelf: Option<String>,
    #[arg(long = "box")]
    pub box_number: Option<String>,
    #[arg(long)]
    pub folder: Option<String>,
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", path.display(), e))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(file).with_ansi(false))
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let config = AppConfig::discover(cli.config.as_deref())?.with_api_url(cli.api_url);
    tracing::debug!("Using config: {:?}", config);

    let app = commands::App::connect(config)?;
    match cli.command {
        Command::List {
            search,
            department,
            page,
            page_size,
        } => app.list(search, department, page, page_size).await,
        Command::Departments => app.departments().await,
        Command::Show { id } => app.show(id).await,
        Command::Search { title, department } => app.search(title, department).await,
        Command::Add { fields } => app.add(fields).await,
        Command::Edit { id, fields } => app.edit(id, fields).await,
        Command::Delete { id, yes } => app.delete(id, yes).await,
        Command::Receipt { id, out_dir, qr } => app.receipt(id, out_dir, qr).await,
        Command::Capsule { id } => app.capsule(id).await,
        Command::Decode { text } => commands::decode(text).await,
        Command::Scan { input, raw } => app.scan(input, raw).await,
    }
}

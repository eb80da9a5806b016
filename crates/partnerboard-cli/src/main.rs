//! `PartnerBoard` CLI — terminal front end for the landing page's admin panels.
//!
//! Opens the board from local storage, applies one command, prints the
//! notices the stores publish, and exits. Each invocation is a single
//! sequential session; the last writer wins if two run at once.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use partnerboard_core::board::Board;
use partnerboard_core::config::{BoardConfig, StorageKind};
use partnerboard_core::website::{NewWebsite, WebsitePatch};

// ── CLI structure ────────────────────────────────────────────────────

/// PartnerBoard — ad blocks and partner websites for the landing page.
#[derive(Parser)]
#[command(name = "partnerboard", version, about, long_about = None)]
struct Cli {
    /// Storage backend: `redb`, `rocksdb`, or `memory`.
    #[arg(long, global = true, env = "PARTNERBOARD_STORAGE", default_value = "redb")]
    storage: String,

    /// Database file (redb) or directory (rocksdb).
    #[arg(long, global = true, env = "PARTNERBOARD_STORAGE_PATH")]
    path: Option<PathBuf>,

    /// Print records as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the ad block snippets.
    #[command(subcommand)]
    Ads(AdsCommand),
    /// Manage the partner website cards.
    #[command(subcommand)]
    Sites(SitesCommand),
}

#[derive(Subcommand)]
enum AdsCommand {
    /// List all five slots with status and preview.
    List,
    /// Print the full code of one slot.
    Show { id: u32 },
    /// Set the code of a slot (from --code, --file, or stdin).
    Set {
        id: u32,
        /// Code to insert.
        #[arg(long, conflicts_with = "file")]
        code: Option<String>,
        /// Read the code from a file.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Remove the code from a slot.
    Clear { id: u32 },
}

#[derive(Subcommand)]
enum SitesCommand {
    /// List all partner websites.
    List,
    /// Print one partner website.
    Show { id: u32 },
    /// Add a partner website.
    Add(AddArgs),
    /// Change some fields of a partner website.
    Update {
        id: u32,
        #[command(flatten)]
        fields: UpdateArgs,
    },
    /// Remove a partner website.
    Remove { id: u32 },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    url: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    image: String,
}

#[derive(Args)]
struct UpdateArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    image: Option<String>,
}

impl From<UpdateArgs> for WebsitePatch {
    fn from(args: UpdateArgs) -> Self {
        Self {
            title: args.title,
            url: args.url,
            description: args.description,
            image: args.image,
        }
    }
}

// ── Entry point ──────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = BoardConfig::from_env();
    config.storage = StorageKind::parse(&cli.storage, cli.path.clone());
    init_logging(&config.log_level, cli.log_json);

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, config: &BoardConfig) -> Result<()> {
    let board = Board::open(config)
        .await
        .context("failed to open board storage")?;
    for (key, err) in board.load_errors() {
        output::print_load_error(key, err);
    }
    let mut events = board.subscribe();
    let json = cli.json;

    match cli.command {
        Command::Ads(cmd) => run_ads(&board, cmd, json).await?,
        Command::Sites(cmd) => run_sites(&board, cmd, json).await?,
    }

    while let Ok(event) = events.try_recv() {
        output::print_notice(&event, json);
    }
    Ok(())
}

async fn run_ads(board: &Board, cmd: AdsCommand, json: bool) -> Result<()> {
    let store = board.ad_blocks();
    match cmd {
        AdsCommand::List => output::print_ad_blocks(&store.list().await, json)?,
        AdsCommand::Show { id } => {
            let Some(block) = store.get(id).await else {
                bail!("ad block not found: {id}");
            };
            output::print_ad_block(&block, json)?;
        }
        AdsCommand::Set { id, code, file } => {
            let code = match (code, file) {
                (Some(code), _) => code,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => {
                    let mut buf = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut buf)
                        .await
                        .context("failed to read code from stdin")?;
                    buf
                }
            };
            let saved = store.update_code(id, code).await?;
            if json {
                output::print_json(&saved.value)?;
            }
        }
        AdsCommand::Clear { id } => {
            let saved = store.clear_code(id).await?;
            if json {
                output::print_json(&saved.value)?;
            }
        }
    }
    Ok(())
}

async fn run_sites(board: &Board, cmd: SitesCommand, json: bool) -> Result<()> {
    let store = board.websites();
    let saved = match cmd {
        SitesCommand::List => return output::print_websites(&store.list().await, json),
        SitesCommand::Show { id } => {
            let Some(site) = store.get(id).await else {
                bail!("website not found: {id}");
            };
            return output::print_website(&site, json);
        }
        SitesCommand::Add(args) => {
            store
                .create(NewWebsite {
                    title: args.title,
                    url: args.url,
                    description: args.description,
                    image: args.image,
                })
                .await?
        }
        SitesCommand::Update { id, fields } => {
            let patch = WebsitePatch::from(fields);
            if patch.is_empty() {
                bail!("nothing to update: pass at least one of --title, --url, --description, --image");
            }
            store.update(id, patch).await?
        }
        SitesCommand::Remove { id } => store.delete(id).await?,
    };

    if json {
        output::print_json(&saved.value)?;
    }
    Ok(())
}

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use receipt_cli::config::{self, Config};
use receipt_cli::review::{ReviewOutcome, review_expense};
use receipt_cli::session::{ImageSource, Session};
use receipt_cli::{export, logging, server};
use receipt_core::ExpenseStatus;
use receipt_core::time::today_in;
use receipt_ingest::parse_expense_from_text;
use receipt_remote::{Extractor, HttpExtractor};

#[derive(Parser, Debug)]
#[command(
    name = "receipts",
    version,
    about = "Receipt images to structured expenses, optionally synced to Notion"
)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Listen address (default from config, e.g. 127.0.0.1:3000)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Extract expenses from receipt images
    Process {
        /// Image files (jpg, png, webp)
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Push extracted expenses to Notion
        #[arg(long)]
        sync: bool,

        /// Review and edit each expense before syncing
        #[arg(long)]
        review: bool,

        /// Also write the results to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the expense list as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run the text parser over OCR output (file or stdin)
    Parse {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Manage ~/.receipts/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file
    Init,
    /// Show the effective configuration (secrets masked)
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Serve { addr } => {
            let mut cfg = config::load_config()?;
            if let Some(addr) = addr {
                cfg.server.addr = addr;
            }
            server::serve(&cfg).await?;
        }

        Command::Process {
            images,
            sync,
            review,
            csv,
            json,
        } => {
            let cfg = config::load_config()?;
            process(&cfg, images, sync, review, csv, json).await?;
        }

        Command::Parse { file } => {
            let cfg = config::load_config()?;
            let text = match &file {
                Some(p) => std::fs::read_to_string(p)
                    .with_context(|| format!("read {}", p.display()))?,
                None => {
                    let mut s = String::new();
                    io::stdin().read_to_string(&mut s).context("read stdin")?;
                    s
                }
            };
            if text.trim().is_empty() {
                bail!("no text to parse");
            }
            let today = today_in(cfg.timezone.as_deref())?;
            let record = parse_expense_from_text(&text, today);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Check => config::check_config()?,
        },
    }

    Ok(())
}

async fn process(
    cfg: &Config,
    images: Vec<PathBuf>,
    sync: bool,
    review: bool,
    csv: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let today = today_in(cfg.timezone.as_deref())?;
    let extractor: Arc<dyn Extractor> = Arc::new(HttpExtractor::new(cfg.extractor_config()));
    let session = Session::new(extractor, server::notion_sink(cfg), cfg.batch.size, today);

    let sources = images.into_iter().map(ImageSource::Path).collect();
    session.accept(sources).await;

    if review {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut out = io::stdout();
        for entry in session.store().snapshot().iter() {
            if entry.status != ExpenseStatus::Extracted {
                continue;
            }
            match review_expense(&entry.record, &mut input, &mut out)? {
                ReviewOutcome::Keep => {}
                ReviewOutcome::Edited(record) => session.edit(&entry.id, record)?,
                ReviewOutcome::Remove => {
                    session.remove(&entry.id);
                }
            }
        }
    }

    if sync {
        if session.sync_enabled() {
            let summary = session.sync_all().await?;
            eprintln!("Synced {} expense(s), {} failed", summary.synced, summary.failed);
        } else {
            eprintln!("Notion not configured; skipping sync (set NOTION_TOKEN and NOTION_DATABASE_ID)");
        }
    }

    let expenses = session.store().snapshot();

    if let Some(path) = csv {
        let n = export::write_csv(&path, &expenses)?;
        eprintln!("Wrote {} row(s) to {}", n, path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&*expenses)?);
        return Ok(());
    }

    for e in expenses.iter() {
        println!(
            "{:<14} | {:<28} | ₹{:>9.2} | {:<13} | {} | {}",
            e.status.label(session.sync_enabled()),
            truncate(&e.record.description, 28),
            e.record.amount,
            e.record.category.as_str(),
            e.record.iso_date(),
            e.source_file().unwrap_or("-"),
        );
        if let Some(err) = &e.error {
            println!("    {err}");
        }
    }

    let failed = session.store().count_by_status(ExpenseStatus::Error);
    println!("\n{} expense(s), {} with errors", expenses.len(), failed);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max - 1).collect();
        t.push('…');
        t
    }
}

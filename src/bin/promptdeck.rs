//! Command-line front-end for the prompt catalog.
//!
//! Usage:
//!   promptdeck search summar
//!   promptdeck select summarize-text | pbcopy
//!   promptdeck add --name "Email Reply" --text "Dear ..." --tags work,email
//!   promptdeck import ~/shared/team_prompts.json
//!
//! `select` writes the prompt text to stdout, which stands in for the
//! clipboard/paste step of the desktop launcher.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use promptdeck::{
    CatalogStore, LauncherConfig, LoadStatus, PromptId, WriterSink, resolve_config_path,
    split_list,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`tracing` directives).
const LOG_ENV: &str = "PROMPTDECK_LOG";

#[derive(Parser, Debug)]
#[command(name = "promptdeck")]
#[command(about = "Search, pick and curate a personal prompt library")]
struct Cli {
    /// Config file; defaults to $PROMPTDECK_CONFIG, then ./config.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank prompts against a query; no query lists the most used.
    Search {
        query: Vec<String>,
        /// Maximum number of results (defaults to `max_results`).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Record a use of the prompt and print its text.
    Select { id: String },
    /// Create a prompt in the user library.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        text: String,
        /// Comma- or space-separated tags.
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Replace name, text and tags of a prompt.
    Edit {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Register another library file and remember it in the config.
    Import { path: PathBuf },
    /// Show every source and how it loaded.
    Sources,
    /// Write the default config file if none exists.
    Init,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = resolve_config_path(cli.config.as_deref());
    match cli.command {
        Command::Init => init_config(&config_path),
        command => run_command(command, &config_path),
    }
}

fn run_command(command: Command, config_path: &Path) -> Result<()> {
    let mut config = LauncherConfig::load(config_path)?;
    let mut store = config.open_store();

    match command {
        Command::Search { query, limit } => {
            let limit = limit.unwrap_or(config.max_results);
            search(&store, &query.join(" "), limit);
        }
        Command::Select { id } => {
            let id = PromptId(id);
            let mut sink = WriterSink(io::stdout().lock());
            if store.select_into(&id, &mut sink)?.is_none() {
                bail!("unknown prompt '{id}'");
            }
        }
        Command::Add { name, text, tags } => {
            let outcome = store.add(&name, &text, split_list(&tags))?;
            println!("{}", outcome.value.id);
        }
        Command::Edit {
            id,
            name,
            text,
            tags,
        } => {
            let outcome = store.update(&PromptId(id), &name, &text, split_list(&tags))?;
            println!("{}", outcome.value.id);
        }
        Command::Import { path } => import(&mut config, config_path, &mut store, path)?,
        Command::Sources => print_sources(&store),
        Command::Init => init_config(config_path)?,
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("config already present at {}", path.display());
        return Ok(());
    }
    LauncherConfig::default().save(path)?;
    println!("wrote default config to {}", path.display());
    Ok(())
}

fn search(store: &CatalogStore, query: &str, limit: usize) {
    for ranked in store.rank(query, limit) {
        let record = ranked.record;
        match ranked.ranking {
            Some(ranking) => println!(
                "{}\t{}\t{}\t{}",
                record.id, record.name, ranking.score, ranking.final_score
            ),
            None => println!("{}\t{}\t{} use(s)", record.id, record.name, record.usage_count),
        }
    }
}

fn import(
    config: &mut LauncherConfig,
    config_path: &Path,
    store: &mut CatalogStore,
    path: PathBuf,
) -> Result<()> {
    let path = std::path::absolute(&path)
        .with_context(|| format!("resolving library path {}", path.display()))?;
    let status = store
        .add_source(path.clone())
        .iter()
        .find(|status| status.source.location == path)
        .map(|status| status.status.clone());
    match status {
        Some(status @ (LoadStatus::Loaded { .. } | LoadStatus::Empty)) => {
            println!("{}: {status}", path.display());
        }
        Some(status) => eprintln!("warning: {}: {status}", path.display()),
        None => {}
    }

    if config.add_library(path) {
        config.save(config_path)?;
    }
    Ok(())
}

fn print_sources(store: &CatalogStore) {
    let writable = store.writable_location();
    for status in store.statuses() {
        let marker = if Some(status.source.location.as_path()) == writable {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {}\t{:?}\t{}",
            status.source.location.display(),
            status.source.kind,
            status.status
        );
    }
}

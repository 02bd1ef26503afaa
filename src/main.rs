use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use email_triage_core::core::config::load_config_file;
use email_triage_core::{
    export_csv, filter_by_status, search, ConfigBuilder, ExportScope, MergedResult,
    ProgressObserver, ResultCache, StatusFilter, ValidationSession,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "email-triage", version, about = "Extract, classify and verify email addresses in bulk")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "EMAIL_TRIAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the verification API
    #[arg(long, global = true, env = "EMAIL_TRIAGE_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the verification API
    #[arg(long, global = true, env = "EMAIL_TRIAGE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Emails per verification request
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Maximum verification requests in flight
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Cache file location
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Do not read or write the cache file
    #[arg(long, global = true)]
    no_cache: bool,

    /// Answer candidates from fresh cache entries instead of re-verifying
    #[arg(long, global = true)]
    reuse_cache: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate every address found in the input text
    Validate(ValidateArgs),
    /// Classify addresses locally without contacting the server
    Classify {
        #[arg(required = true)]
        emails: Vec<String>,
    },
    /// Inspect or clear the verdict cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Input file; reads stdin when omitted or '-'
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Show only results with this status (all, valid, deliverable, invalid)
    #[arg(long, default_value = "all")]
    filter: StatusFilter,

    /// Show only emails containing this text
    #[arg(long)]
    search: Option<String>,

    /// Write results as CSV to this file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Rows to export (all, valid)
    #[arg(long, default_value = "all")]
    scope: ExportScope,

    /// Print results as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    Stats,
    Clear,
}

struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    fn new(hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl ProgressObserver for BarObserver {
    fn on_progress(&self, done: usize, total: usize, message: &str) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
        self.bar.set_message(message.to_string());
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn build_config(args: &GlobalArgs) -> Result<email_triage_core::Config> {
    let (file, loaded) = load_config_file(args.config.as_deref())?;
    let mut builder = ConfigBuilder::new().with_file(file, loaded);
    if let Some(url) = &args.api_url {
        builder = builder.api_base_url(url.clone());
    }
    if let Some(token) = &args.token {
        builder = builder.api_token(token.clone());
    }
    if let Some(size) = args.batch_size {
        builder = builder.batch_size(size);
    }
    if let Some(limit) = args.concurrency {
        builder = builder.max_concurrency(limit);
    }
    if let Some(secs) = args.timeout {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    if let Some(path) = &args.cache_file {
        builder = builder.cache_path(path.clone());
    }
    if args.no_cache {
        builder = builder.disable_cache();
    }
    if args.reuse_cache {
        builder = builder.reuse_cached_results(true);
    }
    Ok(builder.build()?)
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))
        }
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

fn print_table(results: &[MergedResult]) {
    let width = results
        .iter()
        .map(|r| r.email.len())
        .max()
        .unwrap_or(5)
        .max(5);
    println!("{:<width$}  {:<11}  {}", "Email", "Status", "Reason", width = width);
    println!("{}", "-".repeat(width + 40));
    for result in results {
        println!(
            "{:<width$}  {:<11}  {}",
            result.email,
            result.status().to_string(),
            result.reason,
            width = width
        );
    }
}

async fn run_validate(session: &mut ValidationSession, args: ValidateArgs) -> Result<()> {
    let text = read_input(args.input.as_ref())?;
    let count = session.count_candidates(&text);
    if count == 0 {
        eprintln!("Please enter some emails to validate");
        return Ok(());
    }
    eprintln!("{} emails ready", count);

    let observer = BarObserver::new(args.quiet);
    let report = session.run(&text, &observer).await;
    observer.bar.finish_and_clear();

    let mut shown = filter_by_status(&report.results, args.filter);
    if let Some(query) = &args.search {
        shown = search(&shown, query);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        print_table(&shown);
        let summary = report.summary;
        println!();
        println!(
            "Total: {}  Valid: {} ({}%)  Invalid: {} ({}%)  Deliverable: {}",
            summary.total,
            summary.valid_count,
            summary.valid_percent(),
            summary.invalid_count,
            summary.invalid_percent(),
            summary.deliverable_count
        );
    }

    if let Some(path) = &args.export {
        let csv = export_csv(&report.results, args.scope)?;
        std::fs::write(path, csv).with_context(|| format!("writing {}", path.display()))?;
        eprintln!("Exported to {}", path.display());
    }

    eprintln!("{}", report.notification());
    Ok(())
}

fn run_cache(cache: &mut ResultCache, action: CacheAction) -> Result<()> {
    match action {
        CacheAction::Stats => {
            let stats = cache.stats();
            println!("Location: {}", cache.location());
            println!("Entries:  {} ({} fresh)", stats.entries, stats.fresh);
            if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
                println!("Oldest:   {}", oldest.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("Newest:   {}", newest.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        CacheAction::Clear => {
            cache.clear()?;
            println!("Cache cleared!");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let config = build_config(&cli.global)?;
    if let Some(path) = &config.loaded_config_path {
        tracing::info!("Loaded configuration from {}", path);
    }

    match cli.command {
        Command::Validate(args) => {
            let mut session = ValidationSession::from_config(config)?;
            run_validate(&mut session, args).await
        }
        Command::Classify { emails } => {
            let classifier = email_triage_core::Classifier::new(&config);
            for email in emails {
                let verdict = classifier.classify(email.trim());
                println!(
                    "{}\t{}\t{}\t{}",
                    verdict.email,
                    if verdict.client_valid { "valid" } else { "invalid" },
                    verdict.risk,
                    verdict.reason
                );
            }
            Ok(())
        }
        Command::Cache { action } => {
            let mut cache = ResultCache::from_config(&config);
            run_cache(&mut cache, action)
        }
    }
}

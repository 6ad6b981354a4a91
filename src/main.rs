use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod classify;
mod dates;
mod matcher;
mod models;
mod pipeline;
mod report;
mod sources;
mod store;
mod table;
mod yahoo;

use matcher::{MatchStrategy, SymbolMatcher};
use pipeline::{DateWindow, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "corporate-actions")]
#[command(about = "Corporate actions tracker for a momentum portfolio", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Symbol list file (defaults to $CORP_ACTIONS_SYMBOLS_FILE or monthly_stocks.csv)
    #[arg(long, global = true)]
    symbols_file: Option<PathBuf>,

    /// Sets the level of tracing.
    #[arg(short, long, global = true, default_value = "WARN")]
    trace: TraceLevel,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
enum TraceLevel {
    Debug,
    Error,
    Info,
    Trace,
    Warn,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show or replace the saved portfolio symbols
    Symbols {
        #[command(subcommand)]
        action: SymbolsAction,
    },
    /// Fetch and list corporate actions for the portfolio
    Scan {
        #[command(flatten)]
        run: RunArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Fetch corporate actions and write them to a CSV file
    Export {
        #[command(flatten)]
        run: RunArgs,
        #[arg(long, default_value = "corporate_actions.csv")]
        out: PathBuf,
    },
    /// Print the action type a subject line classifies as
    Classify { subject: String },
}

#[derive(Subcommand, Debug)]
enum SymbolsAction {
    /// Print the saved symbols
    Show,
    /// Overwrite the saved symbols with a comma-separated list
    Set { list: String },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Comma-separated symbols to use instead of the saved list
    #[arg(long)]
    symbols: Option<String>,
    /// JSON file describing the sources to query
    #[arg(long)]
    sources: Option<PathBuf>,
    /// Keep actions on or after this date
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Keep actions on or before this date
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Only actions dated today (IST) or later
    #[arg(long)]
    future_only: bool,
    #[arg(long = "match", value_enum, default_value_t = MatchStrategy::Substring)]
    strategy: MatchStrategy,
    /// JSON object of symbol -> company names, used by the alias strategy
    #[arg(long)]
    aliases: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

fn init_tracing(trace_level: TraceLevel) -> anyhow::Result<()> {
    let level = match trace_level {
        TraceLevel::Debug => Level::DEBUG,
        TraceLevel::Error => Level::ERROR,
        TraceLevel::Info => Level::INFO,
        TraceLevel::Trace => Level::TRACE,
        TraceLevel::Warn => Level::WARN,
    };
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    subscriber::set_global_default(my_subscriber).context("failed to set tracing subscriber")?;
    Ok(())
}

fn load_aliases(path: &Path) -> anyhow::Result<HashMap<String, Vec<String>>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read alias file {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid alias file {}", path.display()))
}

async fn run_pipeline(
    run: RunArgs,
    symbols_file: &Path,
    today: NaiveDate,
) -> anyhow::Result<Option<(Vec<String>, models::RunReport)>> {
    let symbols = match run.symbols.as_deref() {
        Some(list) => store::parse_symbols(list),
        None => store::load_symbols(symbols_file)?,
    };
    if symbols.is_empty() {
        println!("Please enter stock symbols to track corporate actions.");
        return Ok(None);
    }
    if let (Some(from), Some(to)) = (run.from, run.to) {
        anyhow::ensure!(from <= to, "--from {from} is after --to {to}");
    }

    let mut matcher = SymbolMatcher::new(run.strategy);
    if let Some(path) = run.aliases.as_deref() {
        matcher = matcher.with_aliases(load_aliases(path)?);
    }
    anyhow::ensure!(
        run.aliases.is_some() || matcher.strategy() != MatchStrategy::Alias,
        "--match alias needs --aliases <FILE>"
    );

    let configs = sources::load_source_configs(run.sources.as_deref())?;
    let sources = sources::build_sources(configs)?;
    let window = DateWindow {
        start: run.from,
        end: run.to,
        future_only: run.future_only,
    };

    debug!("scanning {} symbols with {:?} matching", symbols.len(), run.strategy);
    let report = Pipeline::new(sources, matcher, window).run(&symbols, today).await;
    Ok(Some((symbols, report)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.trace)?;
    trace!("command line input recorded: {cli:?}");

    let symbols_file = store::symbols_path(cli.symbols_file);
    let today = dates::reporting_today(Utc::now());

    match cli.command {
        Commands::Symbols { action } => match action {
            SymbolsAction::Show => {
                let symbols = store::load_symbols(&symbols_file)?;
                if symbols.is_empty() {
                    println!("No symbols saved in {}.", symbols_file.display());
                } else {
                    println!("{}", symbols.join(","));
                }
            }
            SymbolsAction::Set { list } => {
                let symbols = store::parse_symbols(&list);
                if symbols.is_empty() {
                    println!("Please enter at least one stock symbol.");
                    return Ok(());
                }
                store::save_symbols(&symbols_file, &symbols)?;
                println!("Saved {} stocks to {}.", symbols.len(), symbols_file.display());
            }
        },
        Commands::Scan { run, format } => {
            let Some((symbols, report)) = run_pipeline(run, &symbols_file, today).await? else {
                return Ok(());
            };
            match format {
                OutputFormat::Table => print!("{}", report::build_table(&symbols, today, &report)),
                OutputFormat::Csv => report::write_csv(std::io::stdout().lock(), &report.actions)?,
                OutputFormat::Json => println!("{}", report::to_json(&report)?),
            }
        }
        Commands::Export { run, out } => {
            let Some((_, report)) = run_pipeline(run, &symbols_file, today).await? else {
                return Ok(());
            };
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report::write_csv(file, &report.actions)?;
            for notice in &report.notices {
                println!("- {}", notice.message);
            }
            println!("Exported {} actions to {}.", report.actions.len(), out.display());
        }
        Commands::Classify { subject } => {
            println!("{}", classify::classify(&subject));
        }
    }

    Ok(())
}

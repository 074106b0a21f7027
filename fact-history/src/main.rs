use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use libfactcast::config::Config;
use libfactcast::logging::LoggingConfig;
use libfactcast::{Fact, FactStore, FactcastError};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fact-history")]
#[command(version, about = "Inspect and maintain the local fact store")]
#[command(long_about = r#"Inspect and maintain the local fact store.

EXAMPLES:
    # Show every stored fact, oldest first (default)
    fact-history

    # Show the last 30 facts, the window the generator sees
    fact-history list --limit 30

    # Look up one fact by its timestamp key
    fact-history get "01/02/24 09:00:00"

    # Facts whose run stopped before the chat notification
    fact-history pending

    # JSON output for scripting
    fact-history list --format json | jq -r '.[] | .body'

    # Remove every stored fact
    fact-history clear

OUTPUT FORMATS:
    text  - "key | status | body", one fact per line (default)
    json  - JSON array (complete data structure)
    jsonl - JSON lines, one object per line (streaming-friendly)
    csv   - CSV with headers (spreadsheet-compatible)

EXIT CODES:
    0 - Success (including empty results)
    1 - Error (store unreadable, query failed, no fact under key)
    2 - Configuration error
"#)]
struct Args {
    /// Path to the config file (defaults to $FACTCAST_CONFIG or the XDG config dir)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored facts, oldest first
    List {
        /// Only the most recent N facts
        #[arg(short, long, value_name = "N")]
        limit: Option<usize>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the fact stored under a timestamp key
    Get {
        /// Key in DD/MM/YY HH:MM:SS form
        key: String,
    },
    /// Remove every stored fact
    Clear,
    /// List facts that were not both published and announced
    Pending {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Jsonl,
    Csv,
}

fn render(facts: &[Fact], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            for fact in facts {
                out.push_str(&format!("{} | {} | {}\n", fact.key, fact.status, fact.body));
            }
        }
        OutputFormat::Json => {
            out.push_str(&serde_json::to_string_pretty(facts)?);
            out.push('\n');
        }
        OutputFormat::Jsonl => {
            for fact in facts {
                out.push_str(&serde_json::to_string(fact)?);
                out.push('\n');
            }
        }
        OutputFormat::Csv => {
            out.push_str("key,created_at,status,body\n");
            for fact in facts {
                let body = fact.body.replace('"', "\"\""); // Escape quotes
                out.push_str(&format!(
                    "{},{},{},\"{}\"\n",
                    fact.key, fact.created_at, fact.status, body
                ));
            }
        }
    }
    Ok(out)
}

async fn execute(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };

    let store = FactStore::new(config.store_path());
    tracing::debug!("Using store at {}", store.path().display());

    match args.command.unwrap_or(Command::List {
        limit: None,
        format: OutputFormat::Text,
    }) {
        Command::List { limit, format } => {
            let facts = store.entries(limit).await.context("Failed to list facts")?;
            print!("{}", render(&facts, format)?);
        }
        Command::Get { key } => {
            let body = store.get(&key).await?;
            println!("{}", body);
        }
        Command::Clear => {
            let message = store.clear().await.context("Failed to clear store")?;
            println!("{}", message);
        }
        Command::Pending { format } => {
            let facts = store.pending().await.context("Failed to query pending facts")?;
            print!("{}", render(&facts, format)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    LoggingConfig::from_env(args.verbose).init();
    tracing::debug!("fact-history started with args: {:?}", args);

    if let Err(e) = execute(args).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<FactcastError>()
            .map(FactcastError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

//! fact-send - Run the daily fact routine
//!
//! Generates a fact, stores it, posts it and announces it. Runs once for an
//! external scheduler, or stays up and runs once per configured period.

use clap::Parser;
use libfactcast::config::Config;
use libfactcast::logging::LoggingConfig;
use libfactcast::schedule::{due_in, parse_period};
use libfactcast::transport::ReqwestTransport;
use libfactcast::{Credentials, DailyRoutine, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "fact-send")]
#[command(version)]
#[command(about = "Generate, store, post and announce a daily fact")]
#[command(long_about = "\
fact-send - Generate, store, post and announce a daily fact

DESCRIPTION:
    Each run asks the language model for a new fact (showing it the recent
    history so it does not repeat itself), appends the fact to the local
    store, posts it to X and sends a message to the configured Slack channel.

    With --once a single run is made and the process exits; use this from
    cron or a systemd timer. Without it fact-send stays up and runs once per
    [schedule] period, measured from the most recently stored fact.

USAGE:
    # One run, for an external scheduler
    fact-send --once

    # Daemon mode, every 12 hours
    fact-send --period 12h

CREDENTIALS (environment only):
    OPENAI_API_KEY, X_CONSUMER_KEY, X_CONSUMER_SECRET,
    X_ACCESS_TOKEN, X_ACCESS_TOKEN_SECRET, SLACK_BOT_TOKEN

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (a run in progress is finished)

EXIT CODES:
    0 - Success / clean shutdown
    1 - Routine failed (store, generation, posting or notification),
        or signal handlers could not be installed
    2 - Configuration or credential error
")]
struct Cli {
    /// Path to the config file (defaults to $FACTCAST_CONFIG or the XDG config dir)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Run the routine once and exit
    #[arg(long)]
    once: bool,

    /// Time between runs in daemon mode (overrides config), e.g. "1d"
    #[arg(long, value_name = "DURATION")]
    period: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let credentials = Credentials::from_env()?;

    let routine = DailyRoutine::from_config(&config, credentials, Arc::new(ReqwestTransport::new()));
    info!(store = %routine.store().path().display(), "fact-send starting");

    if cli.once {
        let report = routine.run().await?;
        println!("{}", report.key);
        return Ok(());
    }

    let period = match &cli.period {
        Some(period) => parse_period(period)?,
        None => config.schedule.period()?,
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    run_daemon_loop(&routine, period, shutdown).await?;

    info!("fact-send stopped");
    Ok(())
}

/// Set up signal handlers for graceful shutdown
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).map_err(libfactcast::FactcastError::Signal)?;

    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            info!("Received shutdown signal, stopping gracefully...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers(_shutdown: Arc<AtomicBool>) -> Result<()> {
    Ok(())
}

/// Run the routine whenever it is due until shutdown is requested
///
/// A failed run is logged and not retried; the next attempt waits a full
/// period, like a successful one.
async fn run_daemon_loop(
    routine: &DailyRoutine,
    period: Duration,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    let mut last_attempt = routine.store().latest().await?.map(|fact| fact.created_at);
    info!(period = %format_period(period), "Daemon loop started");

    loop {
        let wait = due_in(last_attempt, period, chrono::Utc::now());
        if wait > Duration::ZERO {
            info!("Next run in {}", format_period(wait));
        }

        // Sleep until due, checking for shutdown every second
        let mut waited = Duration::ZERO;
        while waited < wait {
            if shutdown.load(Ordering::Relaxed) {
                return Ok(());
            }
            sleep(Duration::from_secs(1)).await;
            waited += Duration::from_secs(1);
        }

        if shutdown.load(Ordering::Relaxed) {
            return Ok(());
        }

        last_attempt = Some(chrono::Utc::now().timestamp());
        match routine.run().await {
            Ok(report) => info!(key = %report.key, "Routine finished"),
            Err(e) => error!("Routine failed: {}", e),
        }
    }
}

fn format_period(period: Duration) -> String {
    let hours = period.as_secs() / 3600;
    let minutes = (period.as_secs() % 3600) / 60;
    format!("{}h{:02}m", hours, minutes)
}

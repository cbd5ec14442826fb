//! Blockbar - status bar content generator for i3bar and swaybar
//!
//! The binary:
//! - Runs every configured block on a global tick and streams snapshots to stdout
//! - Dispatches click events read from stdin to per-block handlers
//! - Logs to stderr, or to a file with `--log-file`

use anyhow::{Context, Result};
use blockbar::click::ClickDispatcher;
use blockbar::protocol::{Header, ProtocolWriter};
use blockbar::scheduler::{Scheduler, SchedulerConfig};
use blockbar::{get_config_path, Config};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;

/// Blockbar - feeds i3bar/swaybar with the output of your scripts
#[derive(Parser, Debug)]
#[command(name = "blockbar", version, about = "Status bar generator for i3bar/swaybar")]
struct Args {
    /// Configuration file
    config: Option<PathBuf>,

    /// Seconds between two updates of the bar
    #[arg(long, default_value = "1")]
    tick: u64,

    /// Seconds a block or click handler may run before it is killed
    #[arg(long, default_value = "10")]
    block_timeout: u64,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let level = if args.verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    // stdout belongs to the bar
    match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }

    builder.init();
    Ok(())
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    anyhow::ensure!(args.tick > 0, "--tick must be at least one second");
    anyhow::ensure!(args.block_timeout > 0, "--block-timeout must be at least one second");

    log::info!("Starting Blockbar v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.clone().unwrap_or_else(get_config_path);
    let config = Arc::new(
        Config::load(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?,
    );

    log::info!(
        "Loaded {} blocks from {} (click events: {})",
        config.blocks.len(),
        config_path.display(),
        config.click_events
    );

    let settings = SchedulerConfig {
        tick: Duration::from_secs(args.tick),
        block_timeout: Duration::from_secs(args.block_timeout),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let result = runtime.block_on(serve(config, settings));

    // Blocking stdin reads never finish on their own
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn serve(config: Arc<Config>, settings: SchedulerConfig) -> Result<()> {
    let writer = ProtocolWriter::start(std::io::stdout(), &Header::from_config(&config))
        .context("Failed to write the protocol header")?;

    // Own task, so a stalled stdout never holds up click handlers
    let clicks = config.click_events.then(|| {
        let dispatcher = ClickDispatcher::new(config.clone(), settings.block_timeout);
        tokio::spawn(async move { dispatcher.run(BufReader::new(tokio::io::stdin())).await })
    });
    let clicks_done = async move {
        match clicks {
            Some(handle) => handle.await,
            None => std::future::pending().await,
        }
    };

    let scheduler = Scheduler::new(config, settings);

    tokio::select! {
        result = scheduler.run(writer) => {
            result.context("Lost the connection to the bar")
        }
        joined = clicks_done => {
            joined
                .context("Click dispatcher crashed")?
                .context("Failed to read click events")?;
            log::info!("Click stream closed, shutting down");
            Ok(())
        }
    }
}

//! PLC Change Recorder CLI Application
//!
//! Command-line front end for the plc-log-recorder library. It adds:
//! - Configuration file loading (variables, thresholds, log location)
//! - A symbol table standing in for the controller's type metadata
//! - Replay of change notifications from a JSON-lines feed

use anyhow::{Context, Result};
use clap::Parser;
use plc_log_recorder::{ChangeRecorder, Dispatcher, RotatingLog};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod feed;

/// PLC Change Recorder - Log significant changes of controller variables
#[derive(Parser, Debug)]
#[command(name = "plc-log-cli")]
#[command(about = "Record PLC variable changes to a rotating log", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Notification feed to replay (JSON lines, `-` for stdin)
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    feed: String,

    /// Override the log directory from the configuration
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Override the number of lines per log file
    #[arg(long, value_name = "COUNT")]
    max_lines: Option<usize>,

    /// Number of worker threads handling notifications
    #[arg(short, long, value_name = "COUNT", default_value_t = 1)]
    workers: usize,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("PLC Change Recorder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using recorder library v{}", plc_log_recorder::VERSION);

    let mut app_config = config::load_config(&args.config)?;
    if let Some(dir) = &args.log_dir {
        app_config.logging.directory = dir.clone();
    }
    if let Some(max_lines) = args.max_lines {
        app_config.logging.max_lines = max_lines;
    }
    log::debug!("Configuration loaded: {:?}", app_config.logging);

    let sink = RotatingLog::open(&app_config.logging).with_context(|| {
        format!("Failed to open log directory {:?}", app_config.logging.directory)
    })?;

    let mut recorder = ChangeRecorder::with_log_reporter(sink);
    let summary = recorder.register_all(&app_config.variable_configs(), &app_config.symbol_table());
    if summary.registered.is_empty() {
        log::warn!("No variables registered; every notification will be ignored");
    }

    let dispatcher = Dispatcher::spawn(Arc::new(recorder), args.workers);

    let reader: Box<dyn BufRead> = if args.feed == "-" {
        log::info!("Reading notifications from stdin");
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&args.feed)
            .with_context(|| format!("Failed to open feed: {:?}", args.feed))?;
        Box::new(BufReader::new(file))
    };

    let mut malformed = 0usize;
    for notification in feed::read_feed(reader) {
        match notification {
            Ok(notification) => {
                if !dispatcher.submit(notification) {
                    log::error!("Dispatch worker stopped, ending replay");
                    break;
                }
            }
            Err(feed::FeedError::Io(e)) => {
                log::error!("Feed read failed: {}", e);
                break;
            }
            Err(e) => {
                malformed += 1;
                log::warn!("{}", e);
            }
        }
    }

    // Waits for queued notifications to be written
    let stats = dispatcher.shutdown();

    if !args.quiet {
        println!("═══════════════════════════════════════════════");
        println!("  PLC Change Recorder - Summary");
        println!("═══════════════════════════════════════════════");
        println!("  Variables tracked: {}", summary.registered.len());
        println!("  Variables skipped: {}", summary.skipped.len());
        println!("  Notifications:     {}", stats.total());
        println!("    logged:          {}", stats.logged);
        println!("    below threshold: {}", stats.suppressed);
        println!("    unregistered:    {}", stats.unregistered);
        println!("    empty:           {}", stats.empty);
        println!("    decode failed:   {}", stats.decode_failed);
        println!("    write failed:    {}", stats.sink_failed);
        println!("  Malformed lines:   {}", malformed);
        println!("  Log directory:     {:?}", app_config.logging.directory);
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

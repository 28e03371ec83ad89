//! # Tickboard Consumer
//!
//! Single reader of the shared board and owner of its lifetime: creates the
//! region and the three flow-control semaphores at startup, drains one event
//! per iteration, renders the dashboard, and destroys everything on
//! shutdown.
//!
//! # Usage
//!
//! ```bash
//! # FIFO capacity 10, default refresh
//! tick_consumer 10
//!
//! # Defaults from a config file, half-second refresh
//! tick_consumer --config board.toml --refresh-ms 500
//! ```

#![deny(warnings)]

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tick::config::{BoardConfig, ConfigLoader, LogLevel};
use tick::consts::{BOARD_SEM_PREFIX, BOARD_SHM_NAME};
use tick::series::Commodity;
use tick_shm::{BoardOwner, FifoEntry, IpcResult};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

mod display;
use display::DisplayState;

/// Default dashboard refresh interval when neither CLI nor config sets one.
const DEFAULT_REFRESH_MS: u64 = 1000;

/// Tickboard consumer - aggregates producer streams into a dashboard
#[derive(Parser, Debug)]
#[command(name = "tick_consumer")]
#[command(version)]
#[command(about = "Commodity dashboard consumer and board lifecycle owner")]
struct Args {
    /// Event FIFO capacity (1-40); may also come from the config file
    capacity: Option<u32>,

    /// Dashboard refresh interval in milliseconds
    #[arg(long)]
    refresh_ms: Option<u64>,

    /// Path to a TOML board configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tick_consumer: {e}");
            std::process::exit(1);
        }
    };

    setup_tracing(&args, config.as_ref());

    if let Err(e) = run(&args, config.as_ref()) {
        error!("consumer failed: {e}");
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<Option<BoardConfig>, Box<dyn std::error::Error>> {
    let Some(ref path) = args.config else {
        return Ok(None);
    };
    let config = BoardConfig::load(path)?;
    config.validate()?;
    Ok(Some(config))
}

fn run(args: &Args, config: Option<&BoardConfig>) -> Result<(), Box<dyn std::error::Error>> {
    // CLI wins over the config file.
    let capacity = args
        .capacity
        .or(config.and_then(|c| c.capacity))
        .ok_or("FIFO capacity required (CLI argument or config file)")?;
    let refresh = Duration::from_millis(
        args.refresh_ms
            .or(config.and_then(|c| c.refresh_ms))
            .unwrap_or(DEFAULT_REFRESH_MS),
    );

    let mut owner = BoardOwner::create(BOARD_SHM_NAME, BOARD_SEM_PREFIX, capacity)?;
    info!("board ready (capacity {capacity}); waiting for producers");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("received shutdown signal");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let mut display = DisplayState::new();
    let stdout = io::stdout();

    while running.load(Ordering::SeqCst) {
        // Render before blocking so the dashboard refreshes even when no
        // new events arrive: stale-but-stable values, never a frozen board.
        display.render(&mut stdout.lock())?;

        // Fixed acquisition order: filled before mutex. The wait is timed
        // only to drive the periodic re-render and keep the shutdown flag
        // observable; a timeout is a normal idle iteration.
        if !owner.sems().filled.wait_timeout(refresh)? {
            continue;
        }
        owner.sems().mutex.wait()?;

        let popped = pop_and_recompute(&mut owner);
        owner.sems().mutex.post()?;

        let update = match popped {
            Ok(update) => {
                owner.sems().available.post()?;
                update
            }
            Err(e) => return Err(e.into()),
        };

        // The ring buffer is authoritative for the displayed value. A popped
        // entry older than the ring-derived latest is ordinary backlog; an
        // entry found nowhere in the history means the dual write was torn
        // somewhere - a protocol bug worth shouting about, but not worth
        // showing the wrong number for.
        if !update.in_history {
            warn!(
                "{}: popped value {:.2} found nowhere in the series history (latest {:.2})",
                update.series, update.entry.value, update.latest
            );
        }

        display.apply(update.series, update.latest, update.average);
    }

    info!("shutting down; destroying board region and semaphores");
    owner.destroy();
    Ok(())
}

/// One dequeued event plus the display values re-derived from its series'
/// ring buffer under the same mutex hold.
struct Update {
    entry: FifoEntry,
    series: Commodity,
    latest: f64,
    average: Option<f64>,
    /// False only when the popped value appears nowhere in the ring.
    in_history: bool,
}

/// Pop one FIFO entry and re-derive the addressed series' display values
/// from its ring buffer. Caller holds the mutex.
fn pop_and_recompute(owner: &mut BoardOwner) -> IpcResult<Update> {
    let region = owner.region_mut();
    let entry = region.fifo.pop()?;

    // An out-of-range series id can only come from a corrupted region.
    let series = Commodity::from_u8(entry.series as u8)
        .ok_or(tick_shm::IpcError::UnknownSeries {
            series: entry.series,
        })?;

    let slot = &region.series[series.index()];
    Ok(Update {
        entry,
        series,
        latest: slot.latest(),
        average: slot.is_warm().then(|| slot.rolling_average()),
        in_history: slot.contains(entry.value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tick_shm::IpcError;

    fn board_name(case: &str) -> String {
        format!("tick_consumer_test_{}_{}", case, std::process::id())
    }

    fn sem_prefix(case: &str) -> String {
        format!("/tick_consumer_test_{}_{}", case, std::process::id())
    }

    #[test]
    fn backlogged_pop_is_ordinary_not_torn() {
        let mut owner =
            BoardOwner::create(&board_name("backlog"), &sem_prefix("backlog"), 3).unwrap();

        // Two samples queued before the first pop: the dequeued entry is
        // older than the ring-derived latest, but still present in the ring.
        let region = owner.region_mut();
        region.series[Commodity::Gold.index()].record(10.0);
        region.fifo.push(10.0, Commodity::Gold.index() as u32).unwrap();
        region.series[Commodity::Gold.index()].record(20.0);
        region.fifo.push(20.0, Commodity::Gold.index() as u32).unwrap();

        let first = pop_and_recompute(&mut owner).unwrap();
        assert_eq!(first.entry.value, 10.0);
        assert_eq!(first.latest, 20.0);
        assert!(first.in_history);

        let second = pop_and_recompute(&mut owner).unwrap();
        assert_eq!(second.entry.value, 20.0);
        assert!(second.in_history);
    }

    #[test]
    fn torn_write_is_flagged() {
        let mut owner = BoardOwner::create(&board_name("torn"), &sem_prefix("torn"), 3).unwrap();

        // FIFO entry without the matching ring write: the value appears
        // nowhere in the series history.
        owner
            .region_mut()
            .fifo
            .push(99.5, Commodity::Gold.index() as u32)
            .unwrap();

        let update = pop_and_recompute(&mut owner).unwrap();
        assert!(!update.in_history);
        assert_eq!(update.series, Commodity::Gold);
    }

    #[test]
    fn out_of_range_series_id_is_rejected() {
        let mut owner =
            BoardOwner::create(&board_name("bad_series"), &sem_prefix("bad_series"), 3).unwrap();

        owner.region_mut().fifo.push(1.0, 99).unwrap();
        assert!(matches!(
            pop_and_recompute(&mut owner),
            Err(IpcError::UnknownSeries { series: 99 })
        ));
    }
}

fn setup_tracing(args: &Args, config: Option<&BoardConfig>) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        match config.map_or(LogLevel::default(), |c| c.log_level) {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

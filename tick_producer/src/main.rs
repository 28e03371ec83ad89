//! # Tickboard Producer
//!
//! Generates a stream of Gaussian-distributed prices for one commodity
//! series and hands each sample to the consumer through the shared board.
//!
//! # Usage
//!
//! ```bash
//! # GOLD prices around 1800 +/- 15, one every 200 ms, FIFO capacity 10
//! tick_producer GOLD 1800 15 200 10
//!
//! # Verbose logging
//! tick_producer SILVER 23.5 0.8 500 10 -v
//! ```
//!
//! The consumer must be running first: producers only attach to the board,
//! they never create or destroy it.

#![deny(warnings)]

use clap::Parser;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tick::consts::{BOARD_SEM_PREFIX, BOARD_SHM_NAME};
use tick::series::Commodity;
use tick_shm::BoardClient;

mod source;
use source::PriceSource;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// How often a blocked slot acquisition rechecks the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Tickboard producer - streams prices for one commodity series
#[derive(Parser, Debug)]
#[command(name = "tick_producer")]
#[command(version)]
#[command(about = "Commodity price producer for the tickboard")]
struct Args {
    /// Commodity series name (case-insensitive, e.g. GOLD)
    commodity: String,

    /// Mean of the price distribution
    mean: f64,

    /// Standard deviation of the price distribution
    std_dev: f64,

    /// Sleep interval between samples, in milliseconds
    sleep_ms: u64,

    /// Event FIFO capacity; must match the consumer's value
    capacity: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    if let Err(e) = run(&args) {
        error!("producer failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let commodity = Commodity::from_name(&args.commodity)?;
    if !args.mean.is_finite() {
        return Err(format!("mean must be finite, got {}", args.mean).into());
    }
    let source = PriceSource::new(args.mean, args.std_dev)
        .map_err(|e| format!("bad distribution parameters: {e}"))?;

    let mut client = BoardClient::attach(BOARD_SHM_NAME, BOARD_SEM_PREFIX, args.capacity)?;

    info!(
        "producer for {commodity} started (mean {}, std dev {}, every {} ms)",
        args.mean, args.std_dev, args.sleep_ms
    );

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("received shutdown signal");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let series = commodity.index() as u32;
    let interval = Duration::from_millis(args.sleep_ms);

    while running.load(Ordering::SeqCst) {
        let price = source.next_price();
        info!("{commodity}: generating a new value {price:.2}");

        // Fixed acquisition order: available before mutex, never reversed.
        // The wait on available is timed only so the shutdown flag stays
        // observable while the FIFO is full; the handshake is unchanged.
        info!("{commodity}: trying to get mutex on shared buffer");
        let mut acquired = false;
        while running.load(Ordering::SeqCst) {
            if client.sems().available.wait_timeout(SHUTDOWN_POLL)? {
                acquired = true;
                break;
            }
        }
        if !acquired {
            break;
        }
        client.sems().mutex.wait()?;

        // Ring write and FIFO push form one atomic unit under the mutex.
        let region = client.region_mut();
        region.series[series as usize].record(price);
        if let Err(e) = region.fifo.push(price, series) {
            // Protocol violation: surface it and terminate, no retries.
            client.sems().mutex.post()?;
            return Err(e.into());
        }

        client.sems().mutex.post()?;
        client.sems().filled.post()?;
        info!("{commodity}: placing {price:.2} on shared buffer");

        info!("{commodity}: sleeping for {} ms", args.sleep_ms);
        std::thread::sleep(interval);
    }

    // Detach only; the consumer owns the board's lifetime.
    info!("{commodity}: detaching from board");
    Ok(())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
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

//! AX2550 Drive Tool
//!
//! Connects to a controller, sends one motion command and prints the
//! encoder counters.
//!
//! Usage:
//!   cargo run --example drive -- [OPTIONS] [PORT]
//!
//! Options:
//!   --port PORT       Serial port (default: /dev/ttyUSB0)
//!   --config FILE     JSON driver config ({"port_name": "..."})
//!   --speed N         Speed, -255..=255 (default: 0)
//!   --direction N     Direction, -255..=255 (default: 0)
//!
//! Set RUST_LOG=ax2550_core=debug to see every frame.

use anyhow::{bail, Context, Result};
use ax2550_core::{Ax2550, DriverConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = DriverConfig::new("/dev/ttyUSB0");
    let mut speed = 0.0;
    let mut direction = 0.0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                if i < args.len() {
                    config.port_name = args[i].clone();
                }
            }
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    let json = std::fs::read_to_string(&args[i])
                        .with_context(|| format!("reading {}", args[i]))?;
                    config = DriverConfig::from_json(&json)?;
                }
            }
            "--speed" | "-s" => {
                i += 1;
                if i < args.len() {
                    speed = args[i].parse().context("invalid --speed")?;
                }
            }
            "--direction" | "-d" => {
                i += 1;
                if i < args.len() {
                    direction = args[i].parse().context("invalid --direction")?;
                }
            }
            arg if !arg.starts_with('-') => config.port_name = arg.to_string(),
            other => bail!("unknown option: {}", other),
        }
        i += 1;
    }

    let watchdog_hits = Arc::new(AtomicUsize::new(0));
    let hits = watchdog_hits.clone();

    let mut driver = Ax2550::new(config);
    driver.set_watchdog_callback(move || {
        hits.fetch_add(1, Ordering::Relaxed);
        eprintln!("watchdog fired");
    });
    driver
        .connect(None)
        .with_context(|| format!("connecting to {}", driver.port()))?;

    driver.move_motors(speed, direction)?;
    println!("move: speed={} direction={}", speed, direction);

    let (abs1, abs2) = driver.query_encoders(false)?;
    let (rel1, rel2) = driver.query_encoders(true)?;
    println!("absolute: {} {}", abs1, abs2);
    println!("relative: {} {}", rel1, rel2);
    println!("watchdog events: {}", watchdog_hits.load(Ordering::Relaxed));

    driver.disconnect();
    Ok(())
}

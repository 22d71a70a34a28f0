//! Slider Box Reader Demo
//!
//! Prints the latest slider values ten times per second.
//!
//! Usage:
//!   cargo run --example basic -- [OPTIONS] [PORT]
//!
//! Options:
//!   --count N           Values per line (default: 5)
//!   --config FILE       Load reader settings from a JSON file
//!   --duration SECS     Stop after this many seconds (default: run forever)
//!   --normal-priority   Don't request a real-time polling thread
//!   --list              List serial ports and exit
//!
//! PORT defaults to "auto". Set RUST_LOG=debug to see port detection.

use anyhow::Context;
use slider_box::prelude::*;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Consecutive empty polls (at 10 Hz) before warning about a silent device
const STALE_WARN_POLLS: u64 = 10;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = ReaderConfig::default();
    let mut port: Option<String> = None;
    let mut count: Option<usize> = None;
    let mut duration: Option<Duration> = None;
    let mut normal_priority = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-n" => {
                i += 1;
                let value = args.get(i).context("--count needs a value")?;
                count = Some(value.parse().context("invalid --count")?);
            }
            "--config" | "-c" => {
                i += 1;
                let path = args.get(i).context("--config needs a file")?;
                config = ReaderConfig::from_json_file(path)?;
            }
            "--duration" | "-d" => {
                i += 1;
                let value = args.get(i).context("--duration needs a value")?;
                duration = Some(Duration::from_secs_f64(
                    value.parse().context("invalid --duration")?,
                ));
            }
            "--normal-priority" => normal_priority = true,
            "--list" | "-l" => {
                for info in list_ports() {
                    match (info.vid, info.pid) {
                        (Some(vid), Some(pid)) => println!(
                            "{}  {:04x}:{:04x}  {}",
                            info.name,
                            vid,
                            pid,
                            info.product.unwrap_or_default()
                        ),
                        _ => println!("{}", info.name),
                    }
                }
                return Ok(());
            }
            other if !other.starts_with('-') => port = Some(other.to_string()),
            other => anyhow::bail!("unknown option: {}", other),
        }
        i += 1;
    }

    // Command-line values win over the config file
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(count) = count {
        config.value_count = count;
    }
    if normal_priority {
        config.priority = WorkerPriority::Normal;
    }

    let reader = SerialReader::with_config(config)?;
    println!("Reading from {}", reader.port_name());

    let started = Instant::now();
    let mut values = Vec::with_capacity(reader.value_count());
    while duration.map_or(true, |d| started.elapsed() < d) {
        let missed = reader.fill(&mut values);
        let line: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        println!("{}", line.join(" "));
        if missed == STALE_WARN_POLLS {
            eprintln!("No new data from {} for {} polls", reader.port_name(), missed);
        }

        std::thread::sleep(Duration::from_millis(100));
    }

    let stats = reader.stats();
    reader.shutdown();
    println!(
        "{} lines, {} bytes, {} discarded, {} read errors",
        stats.lines_received, stats.bytes_read, stats.lines_discarded, stats.read_errors
    );
    Ok(())
}

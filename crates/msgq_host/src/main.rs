mod demo;
mod generator;
mod ledger;
mod stats;
mod stream;
mod throughput;
mod trace;

use anyhow::Result;
use clap::{Parser, Subcommand};
use msgq_common::limits::DEFAULT_MAX_CAPACITY;

#[derive(Parser)]
struct Cli {
    /// Log queue internals at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sender and receiver threads exchanging a few messages.
    Demo {
        #[arg(short, long, default_value_t = 4)]
        capacity: usize,
        #[arg(short, long)]
        script: Option<String>,
    },
    /// Timed run with rate-limited non-blocking producers.
    Stream {
        #[arg(short, long, default_value_t = 256)]
        capacity: usize,
        #[arg(long, default_value_t = DEFAULT_MAX_CAPACITY)]
        max_capacity: usize,
        #[arg(short, long, default_value_t = 2)]
        producers: usize,
        #[arg(short = 'n', long, default_value_t = 2)]
        consumers: usize,
        #[arg(short, long, default_value_t = 10_000)]
        rate: u64,
        #[arg(short, long, default_value_t = 10)]
        duration: u64,
    },
    /// Blocking throughput run with exactly-once verification.
    Bench {
        #[arg(short, long, default_value_t = 64)]
        capacity: usize,
        #[arg(long, default_value_t = DEFAULT_MAX_CAPACITY)]
        max_capacity: usize,
        #[arg(short, long, default_value_t = 1_000_000)]
        messages: usize,
        #[arg(short, long, default_value_t = 4)]
        producers: usize,
        #[arg(short = 'n', long, default_value_t = 4)]
        consumers: usize,
    },
    /// Write a message script for `demo --script`.
    Gen {
        #[arg(short, long, default_value = "demo.script")]
        out: String,
        #[arg(short = 'n', long, default_value_t = 16)]
        count: usize,
        #[arg(long, default_value_t = 0.25)]
        nowait_ratio: f64,
        #[arg(long, default_value_t = 12345)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    trace::init_tracing(cli.verbose);

    match cli.command {
        Commands::Demo { capacity, script } => {
            demo::run_demo(&demo::DemoConfig { capacity, script })?;
        }
        Commands::Stream {
            capacity,
            max_capacity,
            producers,
            consumers,
            rate,
            duration,
        } => {
            stream::run_stream(&stream::StreamConfig {
                capacity,
                max_capacity,
                producers,
                consumers,
                rate,
                duration_secs: duration,
            })?;
        }
        Commands::Bench {
            capacity,
            max_capacity,
            messages,
            producers,
            consumers,
        } => {
            throughput::run_benchmark(&throughput::BenchConfig {
                capacity,
                max_capacity,
                messages,
                producers,
                consumers,
            })?;
        }
        Commands::Gen {
            out,
            count,
            nowait_ratio,
            seed,
        } => {
            generator::generate_script(&out, count, nowait_ratio, seed)?;
        }
    }
    Ok(())
}

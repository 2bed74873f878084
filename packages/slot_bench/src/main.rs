#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the slot pool harnesses.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use argh::FromArgs;
use slot_bench::{
    CheckInput, CompareInput, DEFAULT_REPORT_PATH, StressInput, ThreadList, run_check,
    run_compare, run_stress,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Benchmarks and stress tests for slot_pool.
#[derive(FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Compare(CompareArgs),
    Stress(StressArgs),
    Check(CheckArgs),
}

/// Time heap allocations against pool allocations on increasing thread counts.
#[derive(FromArgs)]
#[argh(subcommand, name = "compare")]
struct CompareArgs {
    /// objects allocated per timed batch
    #[argh(option, default = "1000")]
    count: usize,

    /// timed batches per thread and phase
    #[argh(option, default = "100")]
    repeat: usize,

    /// comma-separated thread counts (default 1,2,4,8,16)
    #[argh(option, default = "ThreadList::default()")]
    threads: ThreadList,

    /// file to write the report table to (default profile_data.txt)
    #[argh(option, default = "PathBuf::from(DEFAULT_REPORT_PATH)")]
    output: PathBuf,
}

/// Churn per-thread pools and verify every slot until the time is up.
#[derive(FromArgs)]
#[argh(subcommand, name = "stress")]
struct StressArgs {
    /// number of worker threads
    #[argh(option, default = "4")]
    threads: usize,

    /// how many seconds to run
    #[argh(option, default = "5")]
    seconds: u64,

    /// slots each worker holds at once
    #[argh(option, default = "10000")]
    batch: usize,
}

/// Allocate and free one object repeatedly and print the pool counters.
#[derive(FromArgs)]
#[argh(subcommand, name = "check")]
struct CheckArgs {
    /// allocate and free cycles, also the prewarmed capacity
    #[argh(option, default = "100000")]
    count: usize,
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Args = argh::from_env();

    let result = match args.command {
        Command::Compare(args) => compare(args),
        Command::Stress(args) => stress(&args),
        Command::Check(args) => check(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "harness failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn compare(args: CompareArgs) -> slot_bench::Result<()> {
    let input = CompareInput {
        count: args.count,
        repeat: args.repeat,
        threads: args.threads,
        output: args.output,
    };

    let outcome = run_compare(&input)?;

    for phase in &outcome.phases {
        println!(
            "{} threads {}: {} ms",
            phase.threads,
            phase.allocator,
            phase.elapsed.as_millis()
        );
    }

    println!("Report written to {}", input.output.display());

    Ok(())
}

fn stress(args: &StressArgs) -> slot_bench::Result<()> {
    let input = StressInput {
        threads: args.threads,
        duration: Duration::from_secs(args.seconds),
        batch: args.batch,
    };

    let outcome = run_stress(&input)?;

    for (worker, summary) in outcome.workers.iter().enumerate() {
        println!(
            "worker {worker}: {} rounds, current count {}, max count {}",
            summary.rounds, summary.current_count, summary.max_count
        );
    }

    Ok(())
}

fn check(args: &CheckArgs) -> slot_bench::Result<()> {
    let outcome = run_check(&CheckInput { count: args.count })?;

    println!("current count: {}", outcome.current_count);
    println!("max count: {}", outcome.max_count);

    Ok(())
}

//! Many threads churning their own pools while a monitor reports progress.

use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use slot_pool::{DefaultGuard, LocalPool, RawSlot, Slot};
use tracing::{info, warn};

use crate::{Error, Result, StressInput, StressOutcome, WorkerSummary};

const MARKER: u32 = 0x5555;
const MONITOR_INTERVAL: Duration = Duration::from_secs(1);

type Cell = u32;
type CellPool = LocalPool<Cell, RawSlot>;

/// Progress of one worker, published for the monitor.
#[derive(Debug, Default)]
struct WorkerProgress {
    rounds: AtomicU64,
    current_count: AtomicUsize,
    max_count: AtomicUsize,
}

impl WorkerProgress {
    fn publish(&self, rounds: u64, pool: &CellPool) {
        self.rounds.store(rounds, Ordering::Relaxed);
        self.current_count
            .store(pool.current_count(), Ordering::Relaxed);
        self.max_count.store(pool.max_count(), Ordering::Relaxed);
    }

    fn summary(&self) -> WorkerSummary {
        WorkerSummary {
            rounds: self.rounds.load(Ordering::Relaxed),
            current_count: self.current_count.load(Ordering::Relaxed),
            max_count: self.max_count.load(Ordering::Relaxed),
        }
    }
}

/// Runs `input.threads` workers for `input.duration`.
///
/// Each worker owns a pool of raw `u32` cells. In every round it allocates `input.batch` slots,
/// zeroes each one and then walks every slot through a fixed sequence of writes, checking that
/// each write observes the value the previous one left behind. Afterwards all slots of the
/// round are freed. A slot handed out twice, or memory shared between two live slots, breaks
/// the sequence.
///
/// While the workers run, the current thread logs every worker's progress once per second.
///
/// # Errors
///
/// Returns the first mismatch any worker observed, or an error if a worker panicked or its pool
/// rejected a slot. Any failure stops all workers.
pub fn run_stress(input: &StressInput) -> Result<StressOutcome> {
    let deadline =
        Instant::now()
            .checked_add(input.duration)
            .ok_or_else(|| Error::InvalidArguments {
                message: format!("duration {:?} is too long", input.duration),
            })?;

    let stop = AtomicBool::new(false);
    let progress: Vec<WorkerProgress> = (0..input.threads)
        .map(|_| WorkerProgress::default())
        .collect();

    thread::scope(|s| {
        let workers: Vec<_> = progress
            .iter()
            .enumerate()
            .map(|(worker, progress)| {
                let stop = &stop;

                s.spawn(move || {
                    let result = stress_worker(worker, input.batch, stop, progress);

                    if let Err(e) = &result {
                        warn!(worker, error = %e, "stress worker failed, stopping all workers");
                        stop.store(true, Ordering::Relaxed);
                    }

                    result
                })
            })
            .collect();

        monitor(&stop, &progress, deadline);
        stop.store(true, Ordering::Relaxed);

        let mut first_error = None;

        for (worker, handle) in workers.into_iter().enumerate() {
            let result = handle
                .join()
                .map_err(|_panic| Error::WorkerPanicked { worker })
                .and_then(|result| result);

            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    })?;

    Ok(StressOutcome {
        workers: progress.iter().map(WorkerProgress::summary).collect(),
    })
}

#[cfg_attr(test, mutants::skip)] // Only affects logging cadence, which tests do not observe.
fn monitor(stop: &AtomicBool, progress: &[WorkerProgress], deadline: Instant) {
    while !stop.load(Ordering::Relaxed) {
        let remaining = deadline.saturating_duration_since(Instant::now());

        if remaining.is_zero() {
            break;
        }

        thread::sleep(remaining.min(MONITOR_INTERVAL));

        for (worker, progress) in progress.iter().enumerate() {
            let summary = progress.summary();

            info!(
                worker,
                rounds = summary.rounds,
                current = summary.current_count,
                max = summary.max_count,
                "stress progress"
            );
        }
    }
}

fn stress_worker(
    worker: usize,
    batch: usize,
    stop: &AtomicBool,
    progress: &WorkerProgress,
) -> Result<()> {
    let mut pool = CellPool::new();
    let mut rounds: u64 = 0;

    while !stop.load(Ordering::Relaxed) {
        stress_round(worker, &mut pool, batch)?;

        rounds = rounds
            .checked_add(1)
            .expect("round count overflows u64 - this indicates an unrealistic scenario");

        progress.publish(rounds, &pool);
    }

    Ok(())
}

fn stress_round(worker: usize, pool: &mut CellPool, batch: usize) -> Result<()> {
    let mut slots = Vec::with_capacity(batch);

    for _ in 0..batch {
        let slot = pool.alloc();
        let cell = pool.uninit_mut(slot).write(0);

        let previous = mem::replace(cell, MARKER);
        expect_value(worker, "mark", 0, previous)?;

        slots.push(slot);
    }

    for &slot in &slots {
        let cell = cell_mut(pool, slot);

        *cell = cell.wrapping_add(1);
        expect_value(worker, "increment", MARKER.wrapping_add(1), *cell)?;

        *cell = cell.wrapping_sub(1);
        expect_value(worker, "decrement", MARKER, *cell)?;

        let previous = mem::replace(cell, 0);
        expect_value(worker, "clear", MARKER, previous)?;
    }

    for slot in slots {
        pool.free(slot)?;
    }

    Ok(())
}

fn cell_mut(pool: &mut CellPool, slot: Slot<Cell, DefaultGuard>) -> &mut Cell {
    // SAFETY: Every slot is written with an initial value right after it is allocated and
    // stays allocated until the end of the round.
    unsafe { pool.uninit_mut(slot).assume_init_mut() }
}

fn expect_value(worker: usize, step: &'static str, expected: u32, actual: u32) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::StressFailure {
            worker,
            step,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn round_passes_and_returns_every_slot() {
        let mut pool = CellPool::new();

        stress_round(0, &mut pool, 50).unwrap();
        stress_round(0, &mut pool, 50).unwrap();

        assert_eq!(pool.allocated_count(), 0);
        assert_eq!(pool.current_count(), pool.max_count());
        assert!(pool.current_count() >= 50);

        pool.integrity_check();
    }

    #[test]
    fn mismatch_names_worker_and_step() {
        let error = expect_value(3, "increment", MARKER.wrapping_add(1), MARKER).unwrap_err();

        match error {
            Error::StressFailure {
                worker,
                step,
                expected,
                actual,
            } => {
                assert_eq!(worker, 3);
                assert_eq!(step, "increment");
                assert_eq!(expected, 0x5556);
                assert_eq!(actual, 0x5555);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn worker_stops_when_flagged() {
        let stop = AtomicBool::new(true);
        let progress = WorkerProgress::default();

        stress_worker(0, 10, &stop, &progress).unwrap();

        assert_eq!(progress.summary().rounds, 0);
    }

    #[test]
    fn short_run_reports_every_worker() {
        let input = StressInput {
            threads: 3,
            duration: Duration::from_millis(50),
            batch: 16,
        };

        let outcome = run_stress(&input).unwrap();

        assert_eq!(outcome.workers.len(), 3);

        for worker in &outcome.workers {
            assert!(worker.max_count >= worker.current_count);
        }
    }
}

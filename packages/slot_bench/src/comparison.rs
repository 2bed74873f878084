//! Heap allocator versus pool, measured in timed batches on a growing number of threads.

use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

use slot_pool::{LocalPool, Pool, RawSlot, Slot};
use slot_profile::{Profiler, ThreadRecorder};
use tracing::{debug, info};

use crate::{Allocator, CompareInput, CompareOutcome, Error, PhaseTiming, Result};

/// The object both allocators hand out. Large enough that a heap allocation is not trivial.
#[derive(Clone, Copy, Debug)]
struct Payload {
    #[cfg_attr(
        not(test),
        expect(
            dead_code,
            reason = "written to give every allocation real contents, never read back"
        )
    )]
    values: [usize; 8],
}

impl Payload {
    fn new(seed: usize) -> Self {
        Self {
            values: [seed, 0, 0, 0, 0, 0, 0, 0],
        }
    }
}

/// Runs every phase of the comparison and writes the resulting report to `input.output`.
///
/// For each thread count, a heap phase and then a pool phase run. In each phase every worker
/// allocates `input.repeat` batches of `input.count` objects, each batch timed under the label
/// `"{threads} threads {allocator} alloc {count}"`, and then frees the batches one by one under
/// `"{threads} threads {allocator} free {count}"`.
///
/// # Errors
///
/// Returns an error if the workload size overflows, if a worker panics, if the pool rejects a
/// slot or if the report cannot be written.
pub fn run_compare(input: &CompareInput) -> Result<CompareOutcome> {
    let outstanding = input
        .count
        .checked_mul(input.repeat)
        .ok_or_else(|| Error::InvalidArguments {
            message: format!(
                "{} batches of {} objects exceed the address space",
                input.repeat, input.count
            ),
        })?;

    let profiler = Profiler::new();
    let mut phases = Vec::with_capacity(input.threads.len().saturating_mul(2));

    for threads in input.threads.iter() {
        for allocator in [Allocator::Box, Allocator::Pool] {
            let elapsed = run_phase(&profiler, allocator, threads, input, outstanding)?;

            info!(
                threads,
                %allocator,
                elapsed_ms = elapsed.as_millis(),
                "comparison phase completed"
            );

            phases.push(PhaseTiming {
                threads,
                allocator,
                elapsed,
            });
        }
    }

    let report = profiler.report();

    report.write_to(&input.output).map_err(|source| Error::Io {
        path: input.output.clone(),
        source,
    })?;

    Ok(CompareOutcome { phases, report })
}

fn run_phase(
    profiler: &Profiler,
    allocator: Allocator,
    threads: usize,
    input: &CompareInput,
    outstanding: usize,
) -> Result<Duration> {
    let labels = BatchLabels::new(threads, allocator, input.count);
    let start = Instant::now();

    thread::scope(|s| {
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let labels = &labels;

                s.spawn(move || {
                    let recorder = profiler.recorder();

                    match allocator {
                        Allocator::Box => {
                            box_worker(&recorder, labels, input.count, input.repeat);
                            Ok(())
                        }
                        Allocator::Pool => {
                            pool_worker(&recorder, labels, input.count, input.repeat, outstanding)
                        }
                    }
                })
            })
            .collect();

        for (worker, handle) in workers.into_iter().enumerate() {
            handle
                .join()
                .map_err(|_panic| Error::WorkerPanicked { worker })??;
        }

        Ok::<(), Error>(())
    })?;

    Ok(start.elapsed())
}

#[derive(Debug)]
struct BatchLabels {
    alloc: String,
    free: String,
}

impl BatchLabels {
    fn new(threads: usize, allocator: Allocator, count: usize) -> Self {
        Self {
            alloc: format!("{threads} threads {allocator} alloc {count}"),
            free: format!("{threads} threads {allocator} free {count}"),
        }
    }
}

fn box_worker(recorder: &ThreadRecorder, labels: &BatchLabels, count: usize, repeat: usize) {
    let mut batches: Vec<Vec<Box<Payload>>> =
        (0..repeat).map(|_| Vec::with_capacity(count)).collect();

    for batch in &mut batches {
        let _span = recorder.span(&labels.alloc);

        for seed in 0..count {
            batch.push(black_box(Box::new(Payload::new(seed))));
        }
    }

    for batch in batches {
        let _span = recorder.span(&labels.free);

        drop(batch);
    }
}

fn pool_worker(
    recorder: &ThreadRecorder,
    labels: &BatchLabels,
    count: usize,
    repeat: usize,
    outstanding: usize,
) -> Result<()> {
    // Every batch stays allocated until the free rounds start, so the pool is prewarmed with
    // room for all of them and the timed rounds never grow it.
    let mut pool = Pool::<Payload, RawSlot>::builder()
        .initial_capacity(outstanding)
        .build_local();

    let mut batches: Vec<Vec<Slot<Payload, _>>> =
        (0..repeat).map(|_| Vec::with_capacity(count)).collect();

    warm_up(&mut pool)?;

    for batch in &mut batches {
        let _span = recorder.span(&labels.alloc);

        for seed in 0..count {
            let slot = pool.alloc();
            pool.uninit_mut(slot).write(Payload::new(seed));
            batch.push(black_box(slot));
        }
    }

    for batch in batches {
        let _span = recorder.span(&labels.free);

        for slot in batch {
            pool.free(slot)?;
        }
    }

    debug!(
        current = pool.current_count(),
        max = pool.max_count(),
        "pool worker finished"
    );

    Ok(())
}

/// Materializes the pool outside of any timed batch.
fn warm_up(pool: &mut LocalPool<Payload, RawSlot>) -> Result<()> {
    let slot = pool.alloc();
    pool.uninit_mut(slot).write(Payload::new(0));
    pool.free(slot)?;

    Ok(())
}

//! Recording timing samples on several threads and exporting the merged table.
//!
//! Run with: `cargo run --example slot_profile_threads`

use std::hint::black_box;
use std::thread;

use slot_profile::Profiler;

const THREAD_COUNTS: [usize; 3] = [1, 2, 4];
const ALLOCATIONS: usize = 10_000;

fn main() {
    let profiler = Profiler::new();

    for threads in THREAD_COUNTS {
        let label = format!("{threads} threads box alloc {ALLOCATIONS}");

        thread::scope(|s| {
            for _ in 0..threads {
                let profiler = &profiler;
                let label = label.as_str();

                s.spawn(move || {
                    let recorder = profiler.recorder();

                    for _ in 0..100 {
                        let _span = recorder.span(label);

                        for value in 0..ALLOCATIONS {
                            drop(black_box(Box::new(value)));
                        }
                    }
                });
            }
        });
    }

    profiler.report().print_to_stdout();
}

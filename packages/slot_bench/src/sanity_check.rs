use slot_pool::Pool;
use tracing::debug;

use crate::{CheckInput, CheckOutcome, Error, Result};

const DIRTY: u32 = 0xDEAD_BEEF;

/// A small object that is default-constructed by the pool on every allocation.
#[derive(Debug, Default)]
struct TestObject {
    value: u32,
}

/// Allocates, dirties and frees one object `input.count` times on a prewarmed pool.
///
/// Every allocation must come back freshly constructed even though the previous holder of the
/// same node left garbage in it. The pool is prewarmed with `input.count` nodes, so a correct
/// pool never grows beyond that.
///
/// # Errors
///
/// Returns an error if an allocated object is not in its default state, if the pool rejects a
/// slot or if the pool ends up tracking anything other than exactly `input.count` nodes.
pub fn run_check(input: &CheckInput) -> Result<CheckOutcome> {
    let mut pool = Pool::<TestObject>::with_capacity(input.count);

    for iteration in 0..input.count {
        let slot = pool.alloc();
        let object = pool.get_mut(slot);

        if object.value != 0 {
            return Err(Error::CheckFailure {
                iteration,
                value: object.value,
            });
        }

        object.value = DIRTY;
        pool.free(slot)?;
    }

    pool.integrity_check();

    debug!(
        current = pool.tracked_count(),
        max = pool.max_tracked_count(),
        "check completed"
    );

    let outcome = CheckOutcome {
        current_count: pool.tracked_count(),
        max_count: pool.max_tracked_count(),
    };

    verify_counts(input.count, &outcome)?;

    Ok(outcome)
}

fn verify_counts(expected: usize, outcome: &CheckOutcome) -> Result<()> {
    if outcome.current_count == expected && outcome.max_count == expected {
        Ok(())
    } else {
        Err(Error::CountMismatch {
            expected,
            current: outcome.current_count,
            max: outcome.max_count,
        })
    }
}

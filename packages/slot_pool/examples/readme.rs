//! Example that demonstrates the exact usage shown in the README.md file.
//!
//! This shows how to use `Pool` for object management.

use slot_pool::Pool;

fn main() {
    println!("=== Slot Pool README Example ===");

    let mut pool = Pool::<String>::with_capacity(4);

    // Allocating gives you a slot that you can later use to access the item.
    let alice = pool.alloc();
    let bob = pool.alloc();

    pool.get_mut(alice).push_str("Alice");
    pool.get_mut(bob).push_str("Bob");

    println!("Retrieved item: {}", pool.get(alice));

    // Freed slots go back on the free list and are handed out again first.
    pool.free(bob).expect("bob was allocated from this pool");
    let charlie = pool.alloc();
    assert_eq!(charlie, bob);

    pool.get_mut(charlie).push_str("Charlie");
    println!("Reused slot holds: {}", pool.get(charlie));

    println!(
        "Tracked: {}, allocated: {}, free: {}",
        pool.tracked_count(),
        pool.allocated_count(),
        pool.free_count()
    );

    pool.free(alice).expect("alice was allocated from this pool");
    pool.free(charlie).expect("charlie was allocated from this pool");

    println!("README example completed successfully!");
}

//! Basic usage of the `fixed_pool` crate:
//!
//! * Creating a typed pool and a type-erased pool.
//! * Inserting and retrieving items.
//! * Handling a full pool.
//! * Releasing slots and observing their reuse.

use fixed_pool::{Align8, Error, GenericPool, Pool};

fn main() {
    // A typed pool holds up to 4 strings without ever touching the allocator for its own storage.
    let mut names = Pool::<String, 4>::new();

    let alice = names.insert("Alice".to_string()).unwrap();
    let bob = names.insert("Bob".to_string()).unwrap();

    println!(
        "Pool holds {} of {} names, {} slots left",
        names.len(),
        names.capacity(),
        names.available()
    );

    if let Some(name) = names.get(alice) {
        println!("Looked up {alice}: {name}");
    }

    let removed = names.remove(bob).unwrap();
    println!("Removed {removed}; the next insert reuses {bob}");

    let carol = names.insert("Carol".to_string()).unwrap();
    assert_eq!(carol, bob);

    // A generic pool describes its slots by size and alignment, so it can hold mixed types.
    let mut slots = GenericPool::<8, Align8, 2>::new();

    let number = slots.insert(42_u64).unwrap();
    let pair = slots.insert((1_u16, 2_u16)).unwrap();

    match slots.insert(3_u8) {
        Err(Error::Full { capacity }) => println!("Generic pool is full at {capacity} slots"),
        other => println!("Unexpected result: {other:?}"),
    }

    // SAFETY: Each slot is read back as the type that was inserted into it.
    unsafe {
        println!("Slot {number} holds {:?}", slots.get::<u64>(number));
        println!("Slot {pair} holds {:?}", slots.remove::<(u16, u16)>(pair));
    }

    slots.release_all();
    println!("Generic pool reset, {} slots available", slots.available());
}

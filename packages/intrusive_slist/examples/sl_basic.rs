//! Basic usage of the `intrusive_slist` crate:
//!
//! * Threading nodes owned by an array onto two lists.
//! * Sorting a list in place and removing duplicates.
//! * Moving nodes from one list to another without copying them.

use intrusive_slist::{IntrusiveList, Link, Linked, Position};

#[derive(Debug)]
struct Reading {
    sensor: &'static str,
    celsius: i16,
    link: Link,
}

impl Reading {
    const fn new(sensor: &'static str, celsius: i16) -> Self {
        Self {
            sensor,
            celsius,
            link: Link::new(),
        }
    }
}

impl Linked for Reading {
    fn link(&self) -> &Link {
        &self.link
    }

    fn link_mut(&mut self) -> &mut Link {
        &mut self.link
    }
}

fn print(label: &str, list: &IntrusiveList<Reading>, readings: &[Reading]) {
    let rendered: Vec<_> = list
        .iter(readings)
        .map(|reading| format!("{}={}", reading.sensor, reading.celsius))
        .collect();

    println!("{label} ({} nodes): [{}]", list.len(), rendered.join(", "));
}

fn main() {
    // The array owns every node. The lists only link them together.
    let mut readings = [
        Reading::new("attic", 31),
        Reading::new("cellar", 12),
        Reading::new("kitchen", 22),
        Reading::new("attic", 31),
        Reading::new("garage", 8),
        Reading::new("cellar", 12),
    ];

    let count = readings.len();

    let mut all = IntrusiveList::new();
    all.insert_range_after(&mut readings, Position::BeforeBegin, 0..count);
    print("as recorded", &all, &readings);

    all.sort_by_key(&mut readings, |reading| reading.celsius);
    print("sorted by temperature", &all, &readings);

    let duplicates = all.unique_by(&mut readings, |current, kept| {
        current.sensor == kept.sensor && current.celsius == kept.celsius
    });
    print("without duplicates", &all, &readings);
    print("duplicates", &duplicates, &readings);

    // Nodes move between lists by relinking; the array is untouched.
    let mut cold = all.remove_if(&mut readings, |reading| reading.celsius < 15);
    print("warm", &all, &readings);
    print("cold", &cold, &readings);

    cold.reverse(&mut readings);
    all.splice_after(&mut readings, Position::BeforeBegin, &mut cold);
    print("coldest last, moved to the front", &all, &readings);
}

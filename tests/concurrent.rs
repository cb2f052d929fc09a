//! Multi-threaded behaviour of the synchronized filters.

use bloomsync::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: u64 = 8;
const PER_THREAD: u64 = 200;

fn concurrent_distinct_adds<F>(filter: F)
where
    F: SharedBloomFilter<u64> + 'static,
{
    let filter = Arc::new(filter);
    let barrier = Arc::new(Barrier::new(THREADS as usize));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let filter = Arc::clone(&filter);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    filter.add(&(t * PER_THREAD + i));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for v in 0..THREADS * PER_THREAD {
        assert!(filter.check(&v), "false negative for {}", v);
    }

    // No lost updates: same bits as a sequential build
    let mut reference = ExclusiveBloomFilter::from_params(filter.params().clone());
    for v in 0..THREADS * PER_THREAD {
        reference.add(&v);
    }
    assert_eq!(filter.state(), reference.state());
}

#[test]
fn lock_free_concurrent_adds() {
    concurrent_distinct_adds(LockFreeBloomFilter::new("c", 4096, 4).unwrap());
}

#[test]
fn sharded_concurrent_adds() {
    concurrent_distinct_adds(ShardedBloomFilter::new("c", 4096, 4, 64).unwrap());
}

#[test]
fn sharded_concurrent_adds_word_straddling_shards() {
    concurrent_distinct_adds(ShardedBloomFilter::new("c", 4096, 4, 100).unwrap());
}

#[test]
fn global_lock_concurrent_adds() {
    concurrent_distinct_adds(GlobalLockBloomFilter::new("c", 4096, 4).unwrap());
}

fn add_visible_to_other_threads<F>(filter: F)
where
    F: SharedBloomFilter<str> + 'static,
{
    let filter = Arc::new(filter);
    let writer = {
        let filter = Arc::clone(&filter);
        thread::spawn(move || filter.add("published"))
    };
    writer.join().unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let filter = Arc::clone(&filter);
            thread::spawn(move || filter.check("published"))
        })
        .collect();
    for r in readers {
        assert!(r.join().unwrap());
    }
}

#[test]
fn completed_add_visible_everywhere() {
    add_visible_to_other_threads(GlobalLockBloomFilter::new("v", 1024, 3).unwrap());
    add_visible_to_other_threads(LockFreeBloomFilter::new("v", 1024, 3).unwrap());
    add_visible_to_other_threads(ShardedBloomFilter::new("v", 1024, 3, 8).unwrap());
}

fn readers_during_writes_never_lose_completed_adds<F>(filter: F)
where
    F: SharedBloomFilter<u64> + 'static,
{
    let filter = Arc::new(filter);
    // Values below this are added before any reader starts
    let settled = 500u64;
    for v in 0..settled {
        filter.add(&v);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let writer = {
        let filter = Arc::clone(&filter);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut v = settled;
            while !stop.load(Ordering::Relaxed) && v < 20_000 {
                filter.add(&v);
                v += 1;
            }
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let filter = Arc::clone(&filter);
            thread::spawn(move || {
                for _ in 0..5 {
                    for v in 0..settled {
                        assert!(filter.check(&v));
                    }
                }
            })
        })
        .collect();
    for r in readers {
        r.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}

#[test]
fn reads_race_writes_safely() {
    readers_during_writes_never_lose_completed_adds(
        GlobalLockBloomFilter::new("r", 1 << 16, 4).unwrap(),
    );
    readers_during_writes_never_lose_completed_adds(
        LockFreeBloomFilter::new("r", 1 << 16, 4).unwrap(),
    );
    readers_during_writes_never_lose_completed_adds(
        ShardedBloomFilter::new("r", 1 << 16, 4, 32).unwrap(),
    );
}

fn union_and_reset_race_adds<F>(filter: F)
where
    F: SharedBloomFilter<u64> + 'static,
{
    let filter = Arc::new(filter);
    let donor = {
        let mut donor = ExclusiveBloomFilter::from_params(filter.params().clone());
        for v in 0..100u64 {
            donor.add(&v);
        }
        donor.state()
    };

    let adders: Vec<_> = (0..4u64)
        .map(|t| {
            let filter = Arc::clone(&filter);
            thread::spawn(move || {
                for i in 0..500u64 {
                    filter.add(&(10_000 + t * 500 + i));
                }
            })
        })
        .collect();
    for _ in 0..20 {
        assert!(filter.union(&donor));
        filter.reset();
    }
    for h in adders {
        h.join().unwrap();
    }

    // Quiescent again: a union after the race lands in full
    assert!(filter.union(&donor));
    assert!((0..100u64).all(|v| filter.check(&v)));
}

#[test]
fn union_and_reset_during_adds() {
    union_and_reset_race_adds(GlobalLockBloomFilter::new("u", 8192, 3).unwrap());
    union_and_reset_race_adds(LockFreeBloomFilter::new("u", 8192, 3).unwrap());
    union_and_reset_race_adds(ShardedBloomFilter::new("u", 8192, 3, 16).unwrap());
}

#[test]
fn concurrent_union_between_filters_does_not_deadlock() {
    let a = Arc::new(ShardedBloomFilter::new("a", 2048, 3, 8).unwrap());
    let b = Arc::new(ShardedBloomFilter::new("b", 2048, 3, 8).unwrap());
    a.add("left");
    b.add("right");

    let t1 = {
        let (a, b) = (Arc::clone(&a), Arc::clone(&b));
        thread::spawn(move || {
            for _ in 0..200 {
                a.union_with(&b);
            }
        })
    };
    let t2 = {
        let (a, b) = (Arc::clone(&a), Arc::clone(&b));
        thread::spawn(move || {
            for _ in 0..200 {
                b.union_with(&a);
            }
        })
    };
    t1.join().unwrap();
    t2.join().unwrap();

    assert!(a.check("left") && a.check("right"));
    assert!(b.check("left") && b.check("right"));
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_batch_helpers() {
    let filter = LockFreeBloomFilter::new("p", 1 << 15, 4).unwrap();
    let values: Vec<u64> = (0..5_000).collect();
    SharedBloomFilter::<u64>::par_add_batch(&filter, &values);
    let hits = SharedBloomFilter::<u64>::par_check_all(&filter, &values);
    assert!(hits.into_iter().all(|hit| hit));
}

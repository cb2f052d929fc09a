//! Behaviour every filter variant must share, run against each one through the
//! `BloomFilter` trait.

use bloomsync::core::params::{
    compute_optimal_parameters, estimate_false_positive_probability,
};
use bloomsync::prelude::*;

type Maker<F> = fn(FilterParams) -> F;

fn params(bits: usize, hashes: usize, seeds: Seeds) -> FilterParams {
    FilterParams::new("suite", bits, hashes, seeds).unwrap()
}

fn values(range: std::ops::Range<u32>) -> Vec<String> {
    range.map(|i| format!("value-{}", i)).collect()
}

fn or_words(a: &FilterState, b: &FilterState) -> Vec<u64> {
    a.words().iter().zip(b.words()).map(|(x, y)| x | y).collect()
}

fn no_false_negatives<F: BloomFilter<str>>(make: Maker<F>) {
    let mut filter = make(params(8192, 4, Seeds::DEFAULT));
    let added = values(0..600);
    for v in &added {
        filter.add(v);
    }
    for v in &added {
        assert!(filter.check(v), "false negative for {}", v);
    }
}

fn reset_clears_state<F: BloomFilter<str>>(make: Maker<F>) {
    let mut filter = make(params(1024, 3, Seeds::DEFAULT));
    assert!(filter.is_empty());
    filter.add("x");
    assert!(filter.check("x"));
    filter.reset();
    assert!(!filter.check("x"));
    assert!(filter.is_empty());
    assert_eq!(filter.state().words().iter().copied().max(), Some(0));
}

fn matches_exclusive_reference<F: BloomFilter<str>>(make: Maker<F>) {
    let p = params(3001, 5, Seeds::new(11, 13));
    let mut filter = make(p.clone());
    let mut reference = ExclusiveBloomFilter::from_params(p);
    for v in &values(0..250) {
        filter.add(v);
        reference.add(v.as_str());
    }
    assert_eq!(filter.state(), reference.state());
}

fn union_of_compatible_is_or<F: BloomFilter<str>>(make: Maker<F>) {
    let mut left = make(params(2048, 3, Seeds::DEFAULT));
    let mut right = make(params(2048, 3, Seeds::DEFAULT));
    left.add_batch(values(0..40).iter().map(String::as_str));
    right.add_batch(values(40..80).iter().map(String::as_str));

    let (before_left, before_right) = (left.state(), right.state());
    assert!(left.union(&right.state()));
    assert_eq!(left.state().words(), or_words(&before_left, &before_right).as_slice());
    assert_eq!(right.state(), before_right);
    assert!(left.check_all(values(0..80).iter().map(String::as_str)));
}

fn union_of_incompatible_changes_nothing<F: BloomFilter<str>>(make: Maker<F>) {
    let base = params(2048, 3, Seeds::DEFAULT);
    let others = [
        params(2049, 3, Seeds::DEFAULT),
        params(2048, 4, Seeds::DEFAULT),
        params(2048, 3, Seeds::new(1, 4241)),
    ];
    for other_params in others {
        let mut this = make(base.clone());
        let mut other = make(other_params);
        this.add("mine");
        other.add("theirs");
        let (before_this, before_other) = (this.state(), other.state());

        assert!(!this.union(&other.state()));
        assert!(this.try_union(&other.state()).is_err());
        assert_eq!(this.state(), before_this);
        assert_eq!(other.state(), before_other);
    }
}

fn union_from_state_round_trip<F: BloomFilter<str>>(make: Maker<F>) {
    let p = params(512, 2, Seeds::DEFAULT);
    let mut source = make(p.clone());
    source.add("carried");
    let mut target = make(p);
    assert!(target.union(&source.state()));
    assert_eq!(target.state(), source.state());
}

fn estimate_tracks_fill<F: BloomFilter<str>>(make: Maker<F>) {
    let mut filter = make(params(1024, 3, Seeds::DEFAULT));
    assert_eq!(filter.estimated_false_positive_rate(), 0.0);
    filter.add_batch(values(0..20).iter().map(String::as_str));
    let few = filter.estimated_false_positive_rate();
    filter.add_batch(values(20..200).iter().map(String::as_str));
    let many = filter.estimated_false_positive_rate();
    assert!(few > 0.0 && many > few);
}

fn false_positive_rate_near_target<F: BloomFilter<str>>(make: Maker<F>) {
    let (bits, hashes) = compute_optimal_parameters(1000, 0.01);
    let mut filter = make(params(bits, hashes, Seeds::DEFAULT));
    for v in &values(0..1000) {
        filter.add(v);
    }
    let probes = values(100_000..110_000);
    let hits = probes.iter().filter(|v| filter.check(v)).count();
    // 1% expected; 3% leaves ample room for sampling noise
    assert!(hits < 300, "{} false positives in 10000 probes", hits);
}

macro_rules! variant_suite {
    ($name:ident, $make:expr) => {
        mod $name {
            use super::*;

            #[test]
            fn no_false_negatives() {
                super::no_false_negatives($make);
            }

            #[test]
            fn reset_clears_state() {
                super::reset_clears_state($make);
            }

            #[test]
            fn matches_exclusive_reference() {
                super::matches_exclusive_reference($make);
            }

            #[test]
            fn union_of_compatible_is_or() {
                super::union_of_compatible_is_or($make);
            }

            #[test]
            fn union_of_incompatible_changes_nothing() {
                super::union_of_incompatible_changes_nothing($make);
            }

            #[test]
            fn union_from_state_round_trip() {
                super::union_from_state_round_trip($make);
            }

            #[test]
            fn estimate_tracks_fill() {
                super::estimate_tracks_fill($make);
            }

            #[test]
            fn false_positive_rate_near_target() {
                super::false_positive_rate_near_target($make);
            }
        }
    };
}

variant_suite!(exclusive, |p: FilterParams| ExclusiveBloomFilter::from_params(p));
variant_suite!(global_lock, |p: FilterParams| GlobalLockBloomFilter::from_params(p));
variant_suite!(lock_free, |p: FilterParams| LockFreeBloomFilter::from_params(p));
variant_suite!(sharded, |p: FilterParams| ShardedBloomFilter::from_params(p, 7).unwrap());
variant_suite!(sharded_single, |p: FilterParams| ShardedBloomFilter::from_params(p, 1).unwrap());

#[test]
fn reset_then_check_fresh_value() {
    let mut filter = ExclusiveBloomFilter::new("x", 1024, 3).unwrap();
    filter.add("x");
    assert!(filter.check("x"));
    filter.reset();
    assert!(!filter.check("x"));
}

#[test]
fn estimate_is_monotonic() {
    assert!(
        estimate_false_positive_probability(1024, 3, 100)
            > estimate_false_positive_probability(1024, 3, 10)
    );
}

#[test]
fn sizing_is_positive() {
    let (bits, hashes) = compute_optimal_parameters(1000, 0.01);
    assert!(bits > 0 && hashes > 0);
}

#[test]
fn mixed_value_types() {
    let mut filter = ExclusiveBloomFilter::new("mixed", 8192, 4).unwrap();
    filter.add(&-5i32);
    filter.add(&2.5f64);
    filter.add(&'λ');
    filter.add(&Some(true));
    filter.add(&Stringified(std::net::Ipv4Addr::LOCALHOST));

    assert!(filter.check(&-5i64)); // signed integers widen alike
    assert!(filter.check(&2.5f64));
    assert!(filter.check("λ"));
    assert!(filter.check(&Some(true)));
    assert!(filter.check("127.0.0.1"));
    assert!(!filter.check(&5i32));
}

#[cfg(feature = "serde")]
#[test]
fn structured_values() {
    use serde::Serialize;

    #[derive(Serialize)]
    struct Event {
        user: u32,
        kind: &'static str,
    }

    let filter = LockFreeBloomFilter::new("events", 4096, 3).unwrap();
    let login = Structured::new(&Event { user: 7, kind: "login" }).unwrap();
    filter.add(&login);

    let again = Structured::new(&Event { user: 7, kind: "login" }).unwrap();
    let other = Structured::new(&Event { user: 8, kind: "login" }).unwrap();
    assert!(filter.check(&again));
    assert!(!filter.check(&other));
}

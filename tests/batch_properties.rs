//! Property-based tests for accumulation and flushing

use std::thread;

use futures::executor::block_on;
use proptest::prelude::*;
use tidewater::prelude::*;
use tidewater::testing::RecordingDispatch;

fn batch() -> impl Strategy<Value = Batch<i32>> {
    prop::collection::vec(any::<i32>(), 0..32).prop_map(Batch::from)
}

proptest! {
    #[test]
    fn prop_single_flush_loses_nothing(events in prop::collection::vec(any::<u32>(), 0..200)) {
        let sink = RecordingDispatch::<Batch<u32>>::new();
        let deferred = Deferred::new(Accumulator::new(), sink.clone());

        for e in &events {
            deferred.record(*e);
        }
        block_on(deferred.flush()).unwrap();

        let dispatched: Vec<u32> = sink.calls().into_iter().flatten().collect();
        prop_assert_eq!(dispatched, events);
    }

    #[test]
    fn prop_second_drain_is_empty(
        first in prop::collection::vec(any::<i16>(), 0..50),
        second in prop::collection::vec(any::<i16>(), 0..50),
    ) {
        let acc = Accumulator::<Batch<i16>>::new();
        acc.append(Batch::from(first));
        acc.append(Batch::from(second));

        let _ = acc.drain();
        prop_assert!(acc.drain().is_empty());
        prop_assert!(acc.is_empty());
    }

    #[test]
    fn prop_concurrent_appends_all_survive(producers in 1usize..6, per_producer in 1usize..100) {
        let acc = Accumulator::<Batch<(usize, usize)>>::new();

        let handles: Vec<_> = (0..producers)
            .map(|p| {
                let acc = acc.clone();
                thread::spawn(move || {
                    for i in 0..per_producer {
                        acc.append(Batch::one((p, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut drained = acc.drain().into_vec();
        drained.sort_unstable();
        let mut expected: Vec<(usize, usize)> = (0..producers)
            .flat_map(|p| (0..per_producer).map(move |i| (p, i)))
            .collect();
        expected.sort_unstable();
        prop_assert_eq!(drained, expected);
    }

    #[test]
    fn prop_record_now_never_reaches_the_accumulator(
        now_events in prop::collection::vec(any::<u8>(), 0..30),
        deferred_events in prop::collection::vec(any::<u8>(), 0..30),
    ) {
        let sink = RecordingDispatch::<Batch<u8>>::new();
        let acc = Accumulator::new();
        let deferred = Deferred::new(acc.clone(), sink.clone());
        let now = Immediate::new(sink.clone());

        for e in &deferred_events {
            deferred.record(*e);
        }
        for e in &now_events {
            block_on(now.record_now(*e)).unwrap();
        }

        prop_assert_eq!(acc.drain().into_vec(), deferred_events);
    }

    #[test]
    fn prop_repeated_empty_flushes_never_dispatch(
        events in prop::collection::vec(any::<u8>(), 0..20),
        extra in 1usize..5,
    ) {
        let sink = RecordingDispatch::<Batch<u8>>::new();
        let deferred = Deferred::new(Accumulator::new(), sink.clone());

        for e in &events {
            deferred.record(*e);
        }
        block_on(deferred.flush()).unwrap();
        let after_first = sink.attempts();
        prop_assert_eq!(after_first, usize::from(!events.is_empty()));

        for _ in 0..extra {
            prop_assert!(block_on(deferred.flush()).is_ok());
        }
        prop_assert_eq!(sink.attempts(), after_first);
    }

    #[test]
    fn prop_batch_identity(b in batch()) {
        prop_assert_eq!(Batch::empty().combine(b.clone()), b.clone());
        prop_assert_eq!(b.clone().combine(Batch::empty()), b);
    }

    #[test]
    fn prop_batch_associativity(
        a in batch(),
        b in batch(),
        c in batch(),
    ) {
        let left = a.clone().combine(b.clone()).combine(c.clone());
        let right = a.combine(b.combine(c));
        prop_assert_eq!(left, right);
    }
}

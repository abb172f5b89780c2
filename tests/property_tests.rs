//! Property-based tests for store ordering and filtering.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use unistore::core::{Action, Reducer};
use unistore::middleware::Middleware;
use unistore::store::{Store, SubscribeOptions};

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Set(u8),
    Add(u8),
}

impl Action for Op {}

fn set_reducer() -> Reducer<u8, Op> {
    Reducer::new(|action: &Op, state: u8| match action {
        Op::Set(n) => *n,
        Op::Add(n) => state.wrapping_add(*n),
    })
}

fn dedup(values: &[u8]) -> Vec<u8> {
    let mut expected = values.to_vec();
    expected.dedup();
    expected
}

prop_compose! {
    fn arbitrary_op()(variant in 0..2u8, n in 0..4u8) -> Op {
        match variant {
            0 => Op::Set(n),
            _ => Op::Add(n),
        }
    }
}

proptest! {
    #[test]
    fn skip_repeats_matches_dedup(values in prop::collection::vec(0..4u8, 0..50)) {
        let store = Store::new(u8::MAX, set_reducer(), Vec::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = store.subscribe_with(
            SubscribeOptions::new().skip_repeats(),
            move |state| sink.lock().unwrap().push(state),
        );

        for value in &values {
            store.dispatch(Op::Set(*value));
        }

        prop_assert_eq!(&*seen.lock().unwrap(), &dedup(&values));
    }

    #[test]
    fn unfiltered_subscribers_see_every_state(ops in prop::collection::vec(arbitrary_op(), 0..50)) {
        let store = Store::new(0, set_reducer(), Vec::new());
        let stream = store.observe().receiver();

        let mut expected = Vec::new();
        let mut state = 0u8;
        for op in &ops {
            state = set_reducer().reduce(op, state);
            expected.push(state);
            store.dispatch(op.clone());
        }

        prop_assert_eq!(stream.try_iter().collect::<Vec<_>>(), expected);
        prop_assert_eq!(store.state(), state);
    }

    #[test]
    fn middleware_and_reducer_strictly_alternate(ops in prop::collection::vec(arbitrary_op(), 1..30)) {
        let log = Arc::new(Mutex::new(Vec::new()));

        let middleware_log = Arc::clone(&log);
        let tagging: Middleware<u8, Op> = Middleware::fall_through(move |_api| {
            move |_action: &Op| middleware_log.lock().unwrap().push('m')
        });
        let reducer_log = Arc::clone(&log);
        let reducer = set_reducer().then(Reducer::new(move |_action: &Op, state: u8| {
            reducer_log.lock().unwrap().push('r');
            state
        }));

        let store = Store::new(0, reducer, vec![tagging]);
        for op in &ops {
            store.dispatch(op.clone());
        }

        let expected: Vec<char> = ops.iter().flat_map(|_| ['m', 'r']).collect();
        prop_assert_eq!(&*log.lock().unwrap(), &expected);
    }

    #[test]
    fn combine_is_sequential_application(ops in prop::collection::vec(arbitrary_op(), 1..5), seed in 0..=255u8) {
        let reducers: Vec<Reducer<u8, Op>> = ops
            .iter()
            .cloned()
            .map(|fixed| Reducer::new(move |_action: &Op, state: u8| set_reducer().reduce(&fixed, state)))
            .collect();
        let combined = Reducer::combine(reducers.clone());

        let by_hand = reducers
            .iter()
            .fold(seed, |state, reducer| reducer.reduce(&Op::Add(0), state));

        prop_assert_eq!(combined.reduce(&Op::Add(0), seed), by_hand);
    }

    #[test]
    fn factories_run_once_regardless_of_dispatch_count(count in 0..40usize) {
        let runs = Arc::new(Mutex::new(0usize));
        let runs_clone = Arc::clone(&runs);
        let counting: Middleware<u8, Op> = Middleware::fall_through(move |_api| {
            *runs_clone.lock().unwrap() += 1;
            |_action: &Op| {}
        });

        let store = Store::new(0, set_reducer(), vec![counting]);
        for _ in 0..count {
            store.dispatch(Op::Add(1));
        }

        prop_assert_eq!(*runs.lock().unwrap(), 1);
        prop_assert_eq!(store.state() as usize, count);
    }
}

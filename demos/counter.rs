//! A counter store wired with logging, a re-dispatching middleware and
//! subscribers on two delivery targets.
//!
//! Run with `RUST_LOG=debug cargo run --example counter` to see the
//! store's own tracing output.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use unistore::action_enum;
use unistore::core::Reducer;
use unistore::middleware::{logging, Middleware, Next};
use unistore::store::{SerialQueue, Store, SubscribeOptions};

action_enum! {
    enum Counter {
        Increment,
        Add(i64),
        /// Adds the amount after a delay, from another thread.
        AddLater(i64),
        Reset,
    }
}

fn reducer() -> Reducer<i64, Counter> {
    Reducer::new(|action: &Counter, count: i64| match action {
        Counter::Increment => count + 1,
        Counter::Add(n) => count + n,
        Counter::AddLater(_) => count,
        Counter::Reset => 0,
    })
}

/// Turns `AddLater` into an `Add` dispatched from a timer thread.
fn delayed() -> Middleware<i64, Counter> {
    Middleware::full(|api| {
        move |next: Next<Counter>| {
            move |action: Counter| match action {
                Counter::AddLater(n) => {
                    let dispatcher = api.dispatcher();
                    thread::spawn(move || {
                        thread::sleep(Duration::from_millis(50));
                        dispatcher.dispatch(Counter::Add(n));
                    });
                }
                other => next.call(other),
            }
        }
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = Store::builder()
        .initial(0)
        .reducer(reducer())
        .middleware(logging())
        .middleware(delayed())
        .partial_eq()
        .build()?;

    let _printer = store.subscribe(|count| println!("count is now {count}"));

    let (tx, rx) = mpsc::channel();
    let _render = store.subscribe_with(
        SubscribeOptions::new()
            .on(SerialQueue::new("render")?)
            .with_skip_repeats(true)
            .starting_with_current(),
        move |count| {
            let _ = tx.send(count);
        },
    );

    store.dispatch(Counter::Increment);
    store.dispatch(Counter::Add(10));
    store.dispatch(Counter::AddLater(5));
    store.dispatch(Counter::Reset);
    store.dispatch(Counter::Reset);

    let mut rendered = Vec::new();
    while let Ok(count) = rx.recv_timeout(Duration::from_millis(500)) {
        rendered.push(count);
    }

    info!(final_count = store.state(), ?rendered, "Done");
    println!("rendered: {rendered:?}");
    Ok(())
}

//! Demonstration driver: a timed chain settled from a timer thread.
//!
//! Resolves 1 after a delay, increments it twice, faults, rethrows through
//! one catch, swallows in the next, then passes through a final then and a
//! finally hook. Run with `RUST_LOG=timed_chain=info` to adjust verbosity.
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use promise_chain::{Error, Handled, Promise};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("before chain");

    let (done_tx, done_rx) = mpsc::channel();

    let terminal = Promise::<Option<i32>, Error>::new(|resolve, _reject| {
        info!("call in executor");
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(3));
            resolve.resolve(Some(1));
        });
        Ok(())
    })
    .then(
        Some(Box::new(|v: Option<i32>| {
            info!(value = v, "call in then");
            Handled::Value(v.map(|n| n + 1))
        })),
        None,
    )
    .then(
        Some(Box::new(|v: Option<i32>| {
            info!(value = v, "call in then");
            Handled::Value(v.map(|n| n + 1))
        })),
        None,
    )
    .then(
        Some(Box::new(|v: Option<i32>| {
            info!(value = v, "error will raise here");
            Handled::Fault(Error::Faulted("first error".into()))
        })),
        None,
    )
    .catch(|err| {
        info!("call in 1st catch, passing the same error ahead");
        Handled::Fault(err)
    })
    .catch(|_err| {
        info!("call in 2nd catch, swallowing");
        Handled::Value(None)
    })
    .then(
        Some(Box::new(|v: Option<i32>| {
            info!(value = v, "call in then after catch");
            Handled::Value(v)
        })),
        None,
    )
    .finally(|| info!("call in finally"));

    terminal.then(
        Some(Box::new(move |v: Option<i32>| {
            let _ = done_tx.send(());
            Handled::Value(v)
        })),
        None,
    );

    info!(state = %terminal.state(), "after chain");

    let _ = done_rx.recv_timeout(Duration::from_secs(10));
    info!(state = %terminal.state(), "chain settled");
}

//! A chainable settlement primitive: the eventual result of an operation
//! that completes exactly once, successfully or not.
//!
//! The core type is [`Promise`]. An executor receives two capabilities,
//! [`Resolver`] and [`Rejector`], and whichever is invoked first settles the
//! promise; every later call is a no-op. Consumers chain [`Promise::then`],
//! [`Promise::catch`] and [`Promise::finally`], each returning a fresh child
//! promise, and a handler returning [`Handled::Chain`] splices another
//! promise's outcome into the chain. Async callers can `.await` a chain
//! through [`Waiter`].
//!
//! There is no scheduler in here: settlement arrives from whatever host
//! mechanism holds the capabilities, typically a timer or worker thread.
//!
//! # Examples
//!
//! ```
//! use promise_chain::{Handled, Promise};
//! use futures::executor::block_on;
//! use std::{thread, time::Duration};
//!
//! let total = Promise::<i32, String>::new(|resolve, _reject| {
//!     thread::spawn(move || {
//!         thread::sleep(Duration::from_millis(10));
//!         resolve.resolve(1);
//!     });
//!     Ok(())
//! })
//! .then(Some(Box::new(|v| Handled::Value(v + 1))), None)
//! .then(Some(Box::new(|v| Handled::Value(v + 1))), None);
//!
//! assert_eq!(block_on(total.waiter()), Ok(3));
//! ```
use thiserror::Error;

pub mod chain;
pub mod waiter;

pub use chain::{Handled, OnFulfilled, OnRejected, Promise, Rejector, Resolver, State};
pub use waiter::Waiter;

/// Conventional rejection reason for chains with no domain error of their
/// own. The core stays generic over the reason type; this is what the demo
/// driver and tests reject with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A handler faulted while processing the chain.
    #[error("chain faulted: {0}")]
    Faulted(String),
}

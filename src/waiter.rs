//! A `Future` view onto a chain's outcome.
//!
//! The primitive itself never blocks; waiting is expressed through handler
//! attachment. [`Waiter`] packages that into something an async caller can
//! `.await`: it attaches a handler pair that records the outcome and wakes
//! the registered waker.
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use crate::chain::{Handled, Promise};

struct Slot<T, E> {
    outcome: Option<Result<T, E>>,
    waker: Option<Waker>,
}

/// Resolves to `Ok(value)` or `Err(reason)` once the promise settles. Never
/// completes if the promise is abandoned unsettled.
///
/// # Examples
///
/// ```
/// use promise_chain::Promise;
/// use futures::executor::block_on;
/// use std::{thread, time::Duration};
///
/// let p = Promise::<String, ()>::new(|resolve, _reject| {
///     thread::spawn(move || {
///         thread::sleep(Duration::from_millis(10));
///         resolve.resolve("done".into());
///     });
///     Ok(())
/// });
/// assert_eq!(block_on(p.waiter()), Ok("done".to_string()));
/// ```
pub struct Waiter<T, E> {
    slot: Arc<Mutex<Slot<T, E>>>,
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Returns a [`Waiter`] for this promise's eventual outcome. Attaching
    /// the waiter does not consume the promise; further handlers may still
    /// be chained.
    pub fn waiter(&self) -> Waiter<T, E> {
        let slot = Arc::new(Mutex::new(Slot {
            outcome: None,
            waker: None,
        }));
        let on_value = slot.clone();
        let on_reason = slot.clone();
        self.then(
            Some(Box::new(move |value: T| {
                let mut slot = on_value.lock().unwrap();
                slot.outcome = Some(Ok(value.clone()));
                if let Some(waker) = slot.waker.take() {
                    waker.wake();
                }
                Handled::Value(value)
            })),
            Some(Box::new(move |reason: E| {
                let mut slot = on_reason.lock().unwrap();
                slot.outcome = Some(Err(reason.clone()));
                if let Some(waker) = slot.waker.take() {
                    waker.wake();
                }
                Handled::Fault(reason)
            })),
        );
        Waiter { slot }
    }
}

impl<T, E> Future for Waiter<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.lock().unwrap();
        match slot.outcome.take() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use std::thread;
    use std::time::Duration;

    use crate::chain::Promise;

    #[test]
    fn test_waiter_resolved_from_other_thread() {
        let p = Promise::<String, ()>::new(|resolve, _reject| {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                resolve.resolve(String::from("🍓"));
            });
            Ok(())
        });
        let task = thread::spawn(move || {
            block_on(async {
                assert_eq!(p.waiter().await, Ok(String::from("🍓")));
            })
        });
        task.join().expect("The waiter thread has panicked");
    }

    #[test]
    fn test_waiter_on_already_rejected() {
        let p = Promise::<(), String>::rejected(String::from("💥"));
        assert_eq!(block_on(p.waiter()), Err(String::from("💥")));
    }

    #[test]
    fn test_waiter_leaves_promise_chainable() {
        let p = Promise::<i32, ()>::fulfilled(1);
        let w = p.waiter();
        let next = p.then(
            Some(Box::new(|v| crate::chain::Handled::Value(v + 1))),
            None,
        );
        assert_eq!(block_on(w), Ok(1));
        assert_eq!(block_on(next.waiter()), Ok(2));
    }
}

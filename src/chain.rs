//! The settlement primitive: a chainable, exactly-once deferred outcome.
//!
//! A [`Promise`] starts pending and is settled at most once, either fulfilled
//! with a value or rejected with a reason. Handlers attached with
//! [`Promise::then`] run when the outcome arrives (immediately, if it already
//! has) and each attachment produces a fresh child promise, so chains of
//! arbitrary length compose. A handler that needs to defer its own answer
//! returns [`Handled::Chain`] and the child adopts that computation's
//! eventual outcome, however deeply nested.
use std::fmt;
use std::sync::{Arc, Mutex};

/// The three-state lifecycle of a promise.
///
/// Transitions only leave `Pending`; both terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Pending,
    Fulfilled,
    Rejected,
}

impl State {
    /// Conventional lowercase state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled => "fulfilled",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a handler hands back for its child promise.
///
/// This is the typed answer to "did the callback return a plain value, throw,
/// or return another promise": instead of probing the returned object for a
/// callable `then`, the handler says which it is.
pub enum Handled<T, E> {
    /// Settle the child fulfilled with this value.
    Value(T),
    /// Defer the child to this computation's eventual outcome (flattening).
    Chain(Promise<T, E>),
    /// Settle the child rejected with this reason (the typed `throw`).
    Fault(E),
}

/// Boxed success handler, invoked with a clone of the fulfilled value.
pub type OnFulfilled<T, E> = Box<dyn FnOnce(T) -> Handled<T, E> + Send>;
/// Boxed failure handler, invoked with a clone of the rejection reason.
pub type OnRejected<T, E> = Box<dyn FnOnce(E) -> Handled<T, E> + Send>;

type Effect = Box<dyn FnOnce() + Send>;

/// One queued attachment: the child promise plus the optional handler pair.
/// A reaction with neither handler is a pure forwarder.
struct Reaction<T, E> {
    child: Promise<T, E>,
    on_fulfilled: Option<OnFulfilled<T, E>>,
    on_rejected: Option<OnRejected<T, E>>,
}

struct Inner<T, E> {
    /// `None` while pending; settlement writes it exactly once.
    outcome: Option<Result<T, E>>,
    /// Handler triples in attachment order, drained once per propagation run.
    queue: Vec<Reaction<T, E>>,
    /// `finally` hooks, drained in the same run after the handler queue.
    finally_queue: Vec<(Promise<T, E>, Effect)>,
}

/// A shareable handle to one deferred computation.
///
/// Cloning the handle does not clone the computation; all clones observe the
/// same single settlement. The handle is safe to move into a timer thread and
/// settle from there.
///
/// # Examples
///
/// ```
/// use promise_chain::{Handled, Promise};
///
/// let p = Promise::<i32, String>::fulfilled(1)
///     .then(Some(Box::new(|v| Handled::Value(v + 1))), None);
/// assert_eq!(p.state().as_str(), "fulfilled");
/// ```
pub struct Promise<T, E> {
    inner: Arc<Mutex<Inner<T, E>>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.state())
            .finish()
    }
}

impl<T, E> Promise<T, E> {
    /// Creates a promise with no executor. This is the child constructor used
    /// by every attach operation.
    pub fn pending() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                outcome: None,
                queue: Vec::new(),
                finally_queue: Vec::new(),
            })),
        }
    }

    pub fn state(&self) -> State {
        match self.inner.lock().unwrap().outcome {
            None => State::Pending,
            Some(Ok(_)) => State::Fulfilled,
            Some(Err(_)) => State::Rejected,
        }
    }
}

/// The success capability handed to an executor. Clonable; calling
/// [`Resolver::resolve`] after the promise has settled is a no-op.
pub struct Resolver<T, E> {
    promise: Promise<T, E>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

/// The failure capability handed to an executor. Clonable; calling
/// [`Rejector::reject`] after the promise has settled is a no-op.
pub struct Rejector<T, E> {
    promise: Promise<T, E>,
}

impl<T, E> Clone for Rejector<T, E> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn resolve(&self, value: T) {
        self.promise.settle(Ok(value));
    }
}

impl<T, E> Rejector<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn reject(&self, reason: E) {
        self.promise.settle(Err(reason));
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates a promise and runs `executor` synchronously with the two
    /// settle capabilities. The executor may settle before returning, or hand
    /// the capabilities to a timer/thread and settle later. Returning `Err`
    /// rejects the promise with that reason.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_chain::Promise;
    /// use std::{thread, time::Duration};
    ///
    /// let p = Promise::<&str, ()>::new(|resolve, _reject| {
    ///     thread::spawn(move || {
    ///         thread::sleep(Duration::from_millis(10));
    ///         resolve.resolve("ready");
    ///     });
    ///     Ok(())
    /// });
    /// ```
    pub fn new<X>(executor: X) -> Self
    where
        X: FnOnce(Resolver<T, E>, Rejector<T, E>) -> Result<(), E>,
    {
        let promise = Self::pending();
        let resolver = Resolver {
            promise: promise.clone(),
        };
        let rejector = Rejector {
            promise: promise.clone(),
        };
        if let Err(reason) = executor(resolver, rejector) {
            promise.settle(Err(reason));
        }
        promise
    }

    /// A promise already fulfilled with `value`.
    pub fn fulfilled(value: T) -> Self {
        let promise = Self::pending();
        promise.settle(Ok(value));
        promise
    }

    /// A promise already rejected with `reason`.
    pub fn rejected(reason: E) -> Self {
        let promise = Self::pending();
        promise.settle(Err(reason));
        promise
    }

    /// Attaches a handler pair and returns the child promise.
    ///
    /// A missing `on_fulfilled` passes a fulfilled value through to the child
    /// unchanged; a missing `on_rejected` passes a rejection through. That is
    /// how a value flows past a failure-only attachment and a rejection flows
    /// past a success-only one.
    ///
    /// If this promise is already settled the new triple is processed before
    /// `then` returns; otherwise it waits for settlement. Either way handlers
    /// run in attachment order.
    pub fn then(
        &self,
        on_fulfilled: Option<OnFulfilled<T, E>>,
        on_rejected: Option<OnRejected<T, E>>,
    ) -> Promise<T, E> {
        let child = Promise::pending();
        self.attach(Reaction {
            child: child.clone(),
            on_fulfilled,
            on_rejected,
        });
        child
    }

    /// `then(None, Some(on_rejected))`.
    pub fn catch<R>(&self, on_rejected: R) -> Promise<T, E>
    where
        R: FnOnce(E) -> Handled<T, E> + Send + 'static,
    {
        self.then(None, Some(Box::new(on_rejected)))
    }

    /// Runs `effect` exactly once when the outcome is known and returns a
    /// promise settling to the same outcome. The effect takes no arguments
    /// and cannot alter what is forwarded.
    ///
    /// If this promise is already settled, `effect` runs synchronously and
    /// the returned promise is a settled copy of the outcome, not this
    /// instance.
    pub fn finally<F>(&self, effect: F) -> Promise<T, E>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        match inner.outcome.clone() {
            None => {
                let child = Promise::pending();
                inner
                    .finally_queue
                    .push((child.clone(), Box::new(effect)));
                child
            }
            Some(outcome) => {
                drop(inner);
                effect();
                match outcome {
                    Ok(value) => Promise::fulfilled(value),
                    Err(reason) => Promise::rejected(reason),
                }
            }
        }
    }

    /// Settles this promise. Only the first call has effect; the idempotence
    /// guard here is the invariant everything else leans on, including an
    /// executor that invokes both capabilities or one of them twice.
    fn settle(&self, outcome: Result<T, E>) {
        let drained = {
            let mut inner = self.inner.lock().unwrap();
            if inner.outcome.is_some() {
                return;
            }
            inner.outcome = Some(outcome.clone());
            (
                std::mem::take(&mut inner.queue),
                std::mem::take(&mut inner.finally_queue),
            )
        };
        Self::propagate(drained, &outcome);
    }

    /// Enqueues a reaction, then drains and runs the queue if this promise is
    /// already settled. Draining happens outside the lock so a handler may
    /// attach to this same promise without deadlocking.
    fn attach(&self, reaction: Reaction<T, E>) {
        let drained = {
            let mut inner = self.inner.lock().unwrap();
            inner.queue.push(reaction);
            match inner.outcome.clone() {
                None => return,
                Some(outcome) => (
                    outcome,
                    std::mem::take(&mut inner.queue),
                    std::mem::take(&mut inner.finally_queue),
                ),
            }
        };
        let (outcome, queue, finals) = drained;
        Self::propagate((queue, finals), &outcome);
    }

    /// One propagation run: every drained triple in attachment order, then
    /// the drained finally hooks. Each triple gets its own clone of the
    /// payload, so handlers cannot observe each other's mutations.
    fn propagate(
        (queue, finals): (Vec<Reaction<T, E>>, Vec<(Promise<T, E>, Effect)>),
        outcome: &Result<T, E>,
    ) {
        for reaction in queue {
            match outcome {
                Ok(value) => match reaction.on_fulfilled {
                    Some(handler) => Self::complete(reaction.child, handler(value.clone())),
                    None => reaction.child.settle(Ok(value.clone())),
                },
                Err(reason) => match reaction.on_rejected {
                    Some(handler) => Self::complete(reaction.child, handler(reason.clone())),
                    None => reaction.child.settle(Err(reason.clone())),
                },
            }
        }
        for (child, effect) in finals {
            effect();
            child.settle(outcome.clone());
        }
    }

    /// Settles `child` from a handler's answer. `Chain` pushes a forwarder
    /// triple onto the returned promise, so nested chains flatten to any
    /// depth through the ordinary propagation path.
    fn complete(child: Promise<T, E>, handled: Handled<T, E>) {
        match handled {
            Handled::Value(value) => child.settle(Ok(value)),
            Handled::Fault(reason) => child.settle(Err(reason)),
            Handled::Chain(upstream) => upstream.attach(Reaction {
                child,
                on_fulfilled: None,
                on_rejected: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_is_idempotent() {
        let p = Promise::<i32, &str>::new(|resolve, reject| {
            resolve.resolve(1);
            reject.reject("too late");
            resolve.resolve(2);
            Ok(())
        });
        assert_eq!(p.state(), State::Fulfilled);
        let seen = Arc::new(Mutex::new(None));
        let out = seen.clone();
        p.then(
            Some(Box::new(move |v| {
                *out.lock().unwrap() = Some(v);
                Handled::Value(v)
            })),
            None,
        );
        assert_eq!(*seen.lock().unwrap(), Some(1));
    }

    #[test]
    fn test_executor_error_rejects() {
        let p = Promise::<i32, &str>::new(|_resolve, _reject| Err("boom"));
        assert_eq!(p.state(), State::Rejected);
    }

    #[test]
    fn test_value_passes_failure_only_attachment() {
        let p = Promise::<i32, &str>::fulfilled(7).catch(|_| Handled::Value(0));
        assert_eq!(p.state(), State::Fulfilled);
        let seen = Arc::new(Mutex::new(None));
        let out = seen.clone();
        p.then(
            Some(Box::new(move |v| {
                *out.lock().unwrap() = Some(v);
                Handled::Value(v)
            })),
            None,
        );
        assert_eq!(*seen.lock().unwrap(), Some(7));
    }

    #[test]
    fn test_rejection_passes_success_only_attachment() {
        let p = Promise::<i32, &str>::rejected("nope")
            .then(Some(Box::new(|v| Handled::Value(v + 1))), None);
        assert_eq!(p.state(), State::Rejected);
        let seen = Arc::new(Mutex::new(None));
        let out = seen.clone();
        p.catch(move |e| {
            *out.lock().unwrap() = Some(e);
            Handled::Fault(e)
        });
        assert_eq!(*seen.lock().unwrap(), Some("nope"));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(State::Pending.as_str(), "pending");
        assert_eq!(State::Fulfilled.as_str(), "fulfilled");
        assert_eq!(State::Rejected.as_str(), "rejected");
        assert!(!State::Pending.is_settled());
        assert!(State::Fulfilled.is_settled());
        assert!(State::Rejected.is_settled());
    }
}

//! Middleware system
//!
//! Middleware sits between `dispatch` and the root reducer, allowing side
//! effects, logging, and alternative dispatch forms (thunks) to be layered on
//! in a composable way.
//!
//! ## Design
//!
//! ```text
//! dispatch → m0 → m1 → … → mn → base dispatcher → reducer → State
//! ```
//!
//! Middleware is an ordered list, composed once when the store is built. The
//! first middleware is outermost: it sees the dispatched value first and the
//! result last. Each middleware can:
//! - Inspect the dispatched value and the store
//! - Forward it (possibly transformed) with [`Next::dispatch`]
//! - Short-circuit by not forwarding and returning its own [`Outcome`]
//! - Inspect or replace the result on the way back out

use crate::action::Action;
use crate::error::StoreError;
use crate::store::Store;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub mod logger;
pub mod thunk;

pub use logger::{LoggerMiddleware, OutputFunction};
pub use thunk::ThunkMiddleware;

/// Deferred unit of work dispatched in place of an action
///
/// Only [`ThunkMiddleware`] knows how to run one; see [`Store::dispatch_thunk`].
pub type Thunk<S, A> = Box<dyn FnOnce(&Store<S, A>) -> Box<dyn Any + Send> + Send>;

/// A value travelling down the middleware chain
pub enum Dispatched<S, A> {
    Action(A),
    Thunk(Thunk<S, A>),
}

/// The value travelling back up the middleware chain
pub enum Outcome<A> {
    /// The action that reached the reducer (or a middleware's substitute)
    Action(A),
    /// Whatever a middleware produced instead, e.g. a thunk's return value
    Value(Box<dyn Any + Send>),
}

impl<S, A: fmt::Debug> fmt::Debug for Dispatched<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatched::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Dispatched::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Outcome<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Outcome::Value(_) => f.write_str("Value(..)"),
        }
    }
}

/// Middleware trait - wraps the dispatch of every action
///
/// # Parameters
/// - `dispatched`: the action or thunk being dispatched
/// - `store`: the store, for `get_state` and fresh dispatches from the top
/// - `next`: the rest of the chain; call `next.dispatch(..)` to forward
///
/// # Example
///
/// ```
/// use tick_store::{Action, Dispatched, Middleware, Next, Outcome, Store, StoreError};
///
/// /// Drops every action tagged "ignored" before it reaches the reducer
/// struct IgnoreMiddleware;
///
/// impl<S: Send + Sync + 'static, A: Action> Middleware<S, A> for IgnoreMiddleware {
///     fn handle(
///         &self,
///         dispatched: Dispatched<S, A>,
///         _store: &Store<S, A>,
///         next: Next<'_, S, A>,
///     ) -> Result<Outcome<A>, StoreError> {
///         match dispatched {
///             Dispatched::Action(action) if action.action_type() == "ignored" => {
///                 Ok(Outcome::Action(action))
///             }
///             other => next.dispatch(other),
///         }
///     }
/// }
/// ```
pub trait Middleware<S, A>: Send + Sync {
    fn handle(
        &self,
        dispatched: Dispatched<S, A>,
        store: &Store<S, A>,
        next: Next<'_, S, A>,
    ) -> Result<Outcome<A>, StoreError>;
}

impl<S, A, M> Middleware<S, A> for Arc<M>
where
    M: Middleware<S, A> + ?Sized,
{
    fn handle(
        &self,
        dispatched: Dispatched<S, A>,
        store: &Store<S, A>,
        next: Next<'_, S, A>,
    ) -> Result<Outcome<A>, StoreError> {
        (**self).handle(dispatched, store, next)
    }
}

impl<S, A, M> Middleware<S, A> for Box<M>
where
    M: Middleware<S, A> + ?Sized,
{
    fn handle(
        &self,
        dispatched: Dispatched<S, A>,
        store: &Store<S, A>,
        next: Next<'_, S, A>,
    ) -> Result<Outcome<A>, StoreError> {
        (**self).handle(dispatched, store, next)
    }
}

/// The next-inner stage of the chain, ending at the base dispatcher
pub struct Next<'a, S, A> {
    chain: &'a [Box<dyn Middleware<S, A>>],
    store: &'a Store<S, A>,
}

impl<S, A> Clone for Next<'_, S, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, A> Copy for Next<'_, S, A> {}

impl<'a, S, A> Next<'a, S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub(crate) fn new(chain: &'a [Box<dyn Middleware<S, A>>], store: &'a Store<S, A>) -> Self {
        Self { chain, store }
    }

    /// Forward `dispatched` to the next stage
    pub fn dispatch(self, dispatched: Dispatched<S, A>) -> Result<Outcome<A>, StoreError> {
        match self.chain.split_first() {
            Some((middleware, rest)) => middleware.handle(
                dispatched,
                self.store,
                Next {
                    chain: rest,
                    store: self.store,
                },
            ),
            None => self.store.base_dispatch(dispatched),
        }
    }

    /// Forward a plain action to the next stage
    pub fn dispatch_action(self, action: A) -> Result<Outcome<A>, StoreError> {
        self.dispatch(Dispatched::Action(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AnyAction;
    use crate::reducer::create_reducer;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    struct Tracing {
        name: &'static str,
        trace: Trace,
    }

    impl Middleware<i64, AnyAction> for Tracing {
        fn handle(
            &self,
            dispatched: Dispatched<i64, AnyAction>,
            _store: &Store<i64, AnyAction>,
            next: Next<'_, i64, AnyAction>,
        ) -> Result<Outcome<AnyAction>, StoreError> {
            self.trace.lock().unwrap().push(format!("{} enter", self.name));
            let outcome = next.dispatch(dispatched);
            self.trace.lock().unwrap().push(format!("{} exit", self.name));
            outcome
        }
    }

    /// Swallows `blocked` actions and renames `alias` to `inc`
    struct Gate;

    impl Middleware<i64, AnyAction> for Gate {
        fn handle(
            &self,
            dispatched: Dispatched<i64, AnyAction>,
            _store: &Store<i64, AnyAction>,
            next: Next<'_, i64, AnyAction>,
        ) -> Result<Outcome<AnyAction>, StoreError> {
            match dispatched {
                Dispatched::Action(action) if action.action_type() == "blocked" => {
                    Ok(Outcome::Action(action))
                }
                Dispatched::Action(action) if action.action_type() == "alias" => {
                    next.dispatch_action(AnyAction::new("inc"))
                }
                other => next.dispatch(other),
            }
        }
    }

    fn counter_store(middleware: Vec<Box<dyn Middleware<i64, AnyAction>>>) -> Store<i64, AnyAction> {
        let mut builder = Store::builder(create_reducer(0i64).on("inc", |n: &i64, _: &AnyAction| Ok(n + 1)));
        for m in middleware {
            builder = builder.middleware(m);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_first_middleware_is_outermost() {
        let trace = Trace::default();
        let store = counter_store(vec![
            Box::new(Tracing {
                name: "m0",
                trace: Arc::clone(&trace),
            }),
            Box::new(Tracing {
                name: "m1",
                trace: Arc::clone(&trace),
            }),
        ]);

        store.dispatch(AnyAction::new("inc")).unwrap();

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["m0 enter", "m1 enter", "m1 exit", "m0 exit"]
        );
        assert_eq!(*store.get_state(), 1);
    }

    #[test]
    fn test_middleware_can_short_circuit() {
        let trace = Trace::default();
        let store = counter_store(vec![
            Box::new(Gate),
            Box::new(Tracing {
                name: "inner",
                trace: Arc::clone(&trace),
            }),
        ]);

        let returned = store.dispatch(AnyAction::new("blocked")).unwrap();

        assert_eq!(returned, AnyAction::new("blocked"));
        assert!(trace.lock().unwrap().is_empty());
        assert_eq!(*store.get_state(), 0);
        assert!(!store.has_pending_changes());
    }

    #[test]
    fn test_middleware_can_transform_actions() {
        let store = counter_store(vec![Box::new(Gate)]);

        let returned = store.dispatch(AnyAction::new("alias")).unwrap();

        assert_eq!(returned.action_type(), "inc");
        assert_eq!(*store.get_state(), 1);
    }

    #[test]
    fn test_shared_middleware_handle() {
        let trace = Trace::default();
        let shared = Arc::new(Tracing {
            name: "shared",
            trace: Arc::clone(&trace),
        });
        let store = counter_store(vec![Box::new(Arc::clone(&shared))]);

        store.dispatch(AnyAction::new("inc")).unwrap();
        assert_eq!(trace.lock().unwrap().len(), 2);
    }
}

//! Reducers - pure functions that produce the next state from the current state + action
//!
//! State snapshots travel as `Arc<S>`. A reducer that leaves its state alone hands
//! back the incoming `Arc`, which is how the store and [`combine_reducers`](crate::combine_reducers)
//! tell "unchanged" apart from "changed" without comparing values.

use crate::action::Action;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A reducer over state `S` and actions `A`
///
/// `state` is `None` when the reducer has not produced a value yet (store
/// bootstrap); the reducer must answer with its default in that case.
///
/// Any `Fn(Option<&Arc<S>>, &A) -> anyhow::Result<Arc<S>>` is a reducer.
pub trait Reducer<S, A>: Send + Sync {
    fn reduce(&self, state: Option<&Arc<S>>, action: &A) -> anyhow::Result<Arc<S>>;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(Option<&Arc<S>>, &A) -> anyhow::Result<Arc<S>> + Send + Sync,
{
    fn reduce(&self, state: Option<&Arc<S>>, action: &A) -> anyhow::Result<Arc<S>> {
        self(state, action)
    }
}

/// Handler for a single action type, see [`create_reducer`]
pub type Handler<S, A> = Box<dyn Fn(&S, &A) -> anyhow::Result<S> + Send + Sync>;

/// Reducer built from an initial value and a table of per-action-type handlers
pub struct HandlerReducer<S, A> {
    initial: Arc<S>,
    handlers: HashMap<String, Handler<S, A>>,
}

/// Create a reducer that starts at `initial` and dispatches on the action type tag
///
/// Actions without a registered handler leave the state untouched.
///
/// ```
/// use tick_store::{create_reducer, AnyAction, Reducer};
///
/// let counter = create_reducer(0i64)
///     .on("increment", |count: &i64, _: &AnyAction| Ok(count + 1))
///     .on("reset", |_: &i64, _: &AnyAction| Ok(0));
///
/// let state = counter.reduce(None, &AnyAction::new("increment")).unwrap();
/// assert_eq!(*state, 1);
/// ```
pub fn create_reducer<S, A>(initial: S) -> HandlerReducer<S, A> {
    HandlerReducer {
        initial: Arc::new(initial),
        handlers: HashMap::new(),
    }
}

impl<S, A> HandlerReducer<S, A> {
    /// Register `handler` for actions tagged `action_type`
    ///
    /// Registering the same tag twice replaces the earlier handler.
    pub fn on<F>(mut self, action_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&S, &A) -> anyhow::Result<S> + Send + Sync + 'static,
    {
        self.handlers.insert(action_type.into(), Box::new(handler));
        self
    }

    pub fn handles(&self, action_type: &str) -> bool {
        self.handlers.contains_key(action_type)
    }
}

impl<S, A> Reducer<S, A> for HandlerReducer<S, A>
where
    S: Send + Sync,
    A: Action,
{
    fn reduce(&self, state: Option<&Arc<S>>, action: &A) -> anyhow::Result<Arc<S>> {
        let current = state.cloned().unwrap_or_else(|| Arc::clone(&self.initial));

        match self.handlers.get(action.action_type()) {
            Some(handler) => Ok(Arc::new(handler(&current, action)?)),
            None => Ok(current),
        }
    }
}

impl<S: fmt::Debug, A> fmt::Debug for HandlerReducer<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handled: Vec<_> = self.handlers.keys().collect();
        handled.sort();
        f.debug_struct("HandlerReducer")
            .field("initial", &self.initial)
            .field("handles", &handled)
            .finish()
    }
}

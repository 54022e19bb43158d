//! Store - holds the state and runs the dispatch loop
//!
//! ```text
//! dispatch(action) → middleware chain → base dispatcher → reducer → state
//!                                                                    │
//! host tick → flush() ── state changed since last flush? ── changed.fire(new, old)
//! ```
//!
//! Dispatch never notifies subscribers directly. The host calls [`Store::flush`]
//! once per tick, so any number of dispatches in one tick produce at most one
//! notification.

use crate::action::Action;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::error_reporter::{ErrorReporter, ErrorResult};
use crate::middleware::{Dispatched, Middleware, Next, Outcome, Thunk};
use crate::reducer::Reducer;
use crate::signal::Signal;
use crate::state::{ContractViolation, DeepMerge};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct StoreInner<S, A> {
    config: StoreConfig,
    reducer: Box<dyn Reducer<S, A>>,
    middleware: Vec<Box<dyn Middleware<S, A>>>,
    error_reporter: Option<Box<dyn ErrorReporter<S, A>>>,

    state: Mutex<Arc<S>>,
    flushed_state: Mutex<Arc<S>>,
    dirty: AtomicBool,
    destructed: AtomicBool,

    /// Serializes reducer application across threads
    reduce_lock: Mutex<()>,
    /// Thread currently running the root reducer
    reducing: Mutex<Option<ThreadId>>,

    action_log: Mutex<VecDeque<A>>,
    /// Last action that replaced the state, independent of the action log
    last_change: Mutex<Option<A>>,
    changed: Signal<S>,
}

/// Marks the current thread as running the reducer until dropped
struct ReducingGuard<'a> {
    owner: &'a Mutex<Option<ThreadId>>,
}

impl<'a> ReducingGuard<'a> {
    fn enter(owner: &'a Mutex<Option<ThreadId>>, thread: ThreadId) -> Self {
        *lock(owner) = Some(thread);
        Self { owner }
    }
}

impl Drop for ReducingGuard<'_> {
    fn drop(&mut self) {
        *lock(self.owner) = None;
    }
}

/// Store - holds application state and manages the dispatch loop
///
/// Cloning a `Store` clones a handle; all clones share one state.
///
/// ```
/// use tick_store::{combine_reducers, create_reducer, AnyAction, Store};
///
/// let store = Store::new(
///     combine_reducers().slice("counter", create_reducer(0i64).on("inc", |n: &i64, _: &AnyAction| Ok(n + 1))),
/// )
/// .unwrap();
///
/// store.dispatch(AnyAction::new("inc")).unwrap();
/// assert_eq!(store.get_state().get::<i64>("counter"), Some(&1));
/// ```
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

type Overlay<S> = Box<dyn FnOnce(&S) -> Result<S, ContractViolation>>;

/// Builder for [`Store`], see [`Store::builder`]
pub struct StoreBuilder<S, A> {
    reducer: Box<dyn Reducer<S, A>>,
    overlay: Option<Overlay<S>>,
    middleware: Vec<Box<dyn Middleware<S, A>>>,
    error_reporter: Option<Box<dyn ErrorReporter<S, A>>>,
    config: StoreConfig,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub fn new<R>(reducer: R) -> Self
    where
        R: Reducer<S, A> + 'static,
    {
        Self {
            reducer: Box::new(reducer),
            overlay: None,
            middleware: Vec::new(),
            error_reporter: None,
            config: StoreConfig::default(),
        }
    }

    /// Append a middleware; the first one added is outermost
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<S, A> + 'static,
    {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn error_reporter<R>(mut self, reporter: R) -> Self
    where
        R: ErrorReporter<S, A> + 'static,
    {
        self.error_reporter = Some(Box::new(reporter));
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Compute the initial state and create the store
    ///
    /// The reducer is called once with no state and [`Action::bootstrap`],
    /// bypassing middleware. Any preloaded state is merged over the result.
    pub fn build(self) -> Result<Store<S, A>, StoreError> {
        let bootstrap = A::bootstrap();
        let defaults = self
            .reducer
            .reduce(None, &bootstrap)
            .map_err(|error| StoreError::Bootstrap { error })?;

        let initial = match self.overlay {
            Some(overlay) => Arc::new(overlay(&defaults)?),
            None => defaults,
        };

        log::debug!(
            "{}: created with {} middleware, error reporter: {}",
            self.config.name,
            self.middleware.len(),
            self.error_reporter.is_some()
        );

        Ok(Store {
            inner: Arc::new(StoreInner {
                action_log: Mutex::new(VecDeque::with_capacity(self.config.action_log_length)),
                config: self.config,
                reducer: self.reducer,
                middleware: self.middleware,
                error_reporter: self.error_reporter,
                flushed_state: Mutex::new(Arc::clone(&initial)),
                state: Mutex::new(initial),
                dirty: AtomicBool::new(false),
                destructed: AtomicBool::new(false),
                reduce_lock: Mutex::new(()),
                reducing: Mutex::new(None),
                last_change: Mutex::new(None),
                changed: Signal::new(),
            }),
        })
    }
}

impl<S, A> StoreBuilder<S, A>
where
    S: DeepMerge + Send + Sync + 'static,
    S::Partial: 'static,
    A: Action,
{
    /// Overlay `partial` onto the reducer's bootstrap defaults
    pub fn preloaded_state(mut self, partial: S::Partial) -> Self {
        self.overlay = Some(Box::new(move |defaults: &S| defaults.deep_merge(partial)));
        self
    }
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a store with no middleware, no reporter and default config
    pub fn new<R>(reducer: R) -> Result<Self, StoreError>
    where
        R: Reducer<S, A> + 'static,
    {
        StoreBuilder::new(reducer).build()
    }

    pub fn builder<R>(reducer: R) -> StoreBuilder<S, A>
    where
        R: Reducer<S, A> + 'static,
    {
        StoreBuilder::new(reducer)
    }

    /// Current state snapshot; never mutated after it is handed out
    pub fn get_state(&self) -> Arc<S> {
        Arc::clone(&lock(&self.inner.state))
    }

    /// Signal fired by [`flush`](Self::flush) with `(new_state, old_state)`
    pub fn changed(&self) -> &Signal<S> {
        &self.inner.changed
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Run `action` through the middleware chain and the reducer
    ///
    /// Returns the action that came back out of the chain.
    pub fn dispatch(&self, action: A) -> Result<A, StoreError> {
        match self.dispatch_value(Dispatched::Action(action))? {
            Outcome::Action(action) => Ok(action),
            Outcome::Value(_) => Err(StoreError::OutcomeMismatch { expected: "an action" }),
        }
    }

    /// Dispatch a function of the store; needs [`ThunkMiddleware`](crate::ThunkMiddleware)
    ///
    /// Returns whatever `thunk` returned. A thunk returning a future hands
    /// that future back for the caller to await.
    pub fn dispatch_thunk<R, F>(&self, thunk: F) -> Result<R, StoreError>
    where
        R: Send + 'static,
        F: FnOnce(&Store<S, A>) -> R + Send + 'static,
    {
        let thunk: Thunk<S, A> =
            Box::new(move |store: &Store<S, A>| -> Box<dyn Any + Send> { Box::new(thunk(store)) });

        match self.dispatch_value(Dispatched::Thunk(thunk))? {
            Outcome::Value(value) => value.downcast::<R>().map(|value| *value).map_err(|_| {
                StoreError::OutcomeMismatch {
                    expected: std::any::type_name::<R>(),
                }
            }),
            Outcome::Action(_) => Err(StoreError::OutcomeMismatch {
                expected: std::any::type_name::<R>(),
            }),
        }
    }

    /// Send any dispatchable value down the full chain
    pub fn dispatch_value(&self, dispatched: Dispatched<S, A>) -> Result<Outcome<A>, StoreError> {
        self.ensure_active()?;
        self.ensure_not_reducing()?;
        Next::new(&self.inner.middleware, self).dispatch(dispatched)
    }

    /// Innermost stage of the chain: apply the root reducer
    pub(crate) fn base_dispatch(&self, dispatched: Dispatched<S, A>) -> Result<Outcome<A>, StoreError> {
        let action = match dispatched {
            Dispatched::Action(action) => action,
            Dispatched::Thunk(_) => return Err(StoreError::UnhandledThunk),
        };

        if action.action_type().is_empty() {
            return Err(StoreError::MissingActionType);
        }
        self.ensure_active()?;
        self.ensure_not_reducing()?;

        let (prev_state, result) = {
            let _serial = lock(&self.inner.reduce_lock);
            let prev_state = self.get_state();

            let result = {
                let _reducing = ReducingGuard::enter(&self.inner.reducing, thread::current().id());
                self.inner.reducer.reduce(Some(&prev_state), &action)
            };

            if let Ok(next_state) = &result {
                if !Arc::ptr_eq(next_state, &prev_state) {
                    *lock(&self.inner.state) = Arc::clone(next_state);
                    *lock(&self.inner.last_change) = Some(action.clone());
                    self.inner.dirty.store(true, Ordering::Release);
                }
                self.record_action(&action);
            }
            (prev_state, result)
        };

        match result {
            Ok(_) => {
                log::trace!("{}: reduced {}", self.inner.config.name, action.action_type());
                Ok(Outcome::Action(action))
            }
            Err(error) => {
                if let Some(reporter) = &self.inner.error_reporter {
                    reporter.report_reducer_error(&prev_state, &action, &ErrorResult::new(&error));
                }
                Err(StoreError::Reducer {
                    action_type: action.action_type().to_string(),
                    error,
                })
            }
        }
    }

    /// Publish the state to change subscribers if it changed since the last flush
    ///
    /// Every connected handler runs once, even if an earlier one fails. With
    /// an error reporter, failures are reported and swallowed; without one,
    /// the first failure is returned after all handlers ran.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.ensure_active()?;

        if !self.inner.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let current = self.get_state();
        let previous = std::mem::replace(&mut *lock(&self.inner.flushed_state), Arc::clone(&current));
        if Arc::ptr_eq(&current, &previous) {
            return Ok(());
        }

        log::debug!(
            "{}: publishing change to {} subscriber(s)",
            self.inner.config.name,
            self.inner.changed.listener_count()
        );
        let failures = self.inner.changed.fire(&current, &previous);

        match &self.inner.error_reporter {
            Some(reporter) => {
                if failures.is_empty() {
                    return Ok(());
                }
                let recent_actions = self.recent_actions();
                let last_change = lock(&self.inner.last_change).clone();
                match last_change {
                    Some(action) => {
                        for error in &failures {
                            reporter.report_update_error(
                                &previous,
                                &action,
                                &current,
                                &recent_actions,
                                &ErrorResult::new(error),
                            );
                        }
                    }
                    // The dirty flag is only ever set together with `last_change`
                    None => log::warn!(
                        "{}: {} subscriber failure(s) without a triggering action",
                        self.inner.config.name,
                        failures.len()
                    ),
                }
                Ok(())
            }
            None => {
                let failed = failures.len();
                match failures.into_iter().next() {
                    Some(error) => Err(StoreError::Subscriber { failed, error }),
                    None => Ok(()),
                }
            }
        }
    }

    /// Disconnect every subscriber and reject further dispatch and flush calls
    pub fn destruct(&self) {
        if self.inner.destructed.swap(true, Ordering::AcqRel) {
            log::warn!("{}: destruct called on an already destructed store", self.inner.config.name);
            return;
        }
        self.inner.changed.disconnect_all();
        log::debug!("{}: destructed", self.inner.config.name);
    }

    pub fn is_destructed(&self) -> bool {
        self.inner.destructed.load(Ordering::Acquire)
    }

    /// Whether the next [`flush`](Self::flush) would notify subscribers
    pub fn has_pending_changes(&self) -> bool {
        self.inner.dirty.load(Ordering::Acquire)
            && !Arc::ptr_eq(&self.get_state(), &lock(&self.inner.flushed_state))
    }

    /// The most recently reduced actions, oldest first
    pub fn recent_actions(&self) -> Vec<A> {
        lock(&self.inner.action_log).iter().cloned().collect()
    }

    fn record_action(&self, action: &A) {
        let limit = self.inner.config.action_log_length;
        if limit == 0 {
            return;
        }
        let mut log = lock(&self.inner.action_log);
        log.push_back(action.clone());
        while log.len() > limit {
            log.pop_front();
        }
    }

    fn ensure_active(&self) -> Result<(), StoreError> {
        if self.is_destructed() {
            return Err(StoreError::Destructed);
        }
        Ok(())
    }

    fn ensure_not_reducing(&self) -> Result<(), StoreError> {
        if *lock(&self.inner.reducing) == Some(thread::current().id()) {
            return Err(StoreError::DispatchInReducer);
        }
        Ok(())
    }
}

impl<S: Debug, A> Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.config.name)
            .field("state", &*lock(&self.inner.state))
            .field("middleware", &self.inner.middleware.len())
            .field("destructed", &self.inner.destructed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

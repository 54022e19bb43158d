//! Redux-style state container for frame-driven hosts
//!
//! This crate provides:
//! - A [`Store`] holding immutable `Arc` state snapshots, changed only by dispatch
//! - Reducer helpers: [`create_reducer`], [`combine_reducers`], [`make_action_creator`]
//! - An ordered [`Middleware`] chain with [`LoggerMiddleware`] and [`ThunkMiddleware`]
//! - A [`Signal`] of state changes, published once per host tick by [`Store::flush`]
//! - An optional [`ErrorReporter`] for reducer and subscriber failures
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tick_store::{combine_reducers, create_reducer, AnyAction, CombinedState, Store};
//!
//! let store = Store::new(
//!     combine_reducers().slice("counter", create_reducer(0i64).on("inc", |n: &i64, _: &AnyAction| Ok(n + 1))),
//! )?;
//!
//! store.changed().connect(|new: &Arc<CombinedState>, old: &Arc<CombinedState>| {
//!     println!("counter {:?} -> {:?}", old.get::<i64>("counter"), new.get::<i64>("counter"));
//!     Ok(())
//! });
//!
//! store.dispatch(AnyAction::new("inc"))?;
//! store.dispatch(AnyAction::new("inc"))?;
//!
//! // Once per frame
//! store.flush()?;
//! assert_eq!(store.get_state().get::<i64>("counter"), Some(&2));
//! # Ok::<(), tick_store::StoreError>(())
//! ```

pub mod action;
pub mod action_creator;
pub mod combine;
pub mod config;
pub mod error;
pub mod error_reporter;
pub mod middleware;
pub mod reducer;
pub mod signal;
pub mod state;
pub mod store;

pub use action::{Action, AnyAction, INIT_ACTION_TYPE};
pub use action_creator::{ActionCreator, ActionError, make_action_creator};
pub use combine::{CombinedReducer, combine_reducers};
pub use config::StoreConfig;
pub use error::StoreError;
pub use error_reporter::{ErrorReporter, ErrorResult, LogErrorReporter};
pub use middleware::{
    Dispatched, LoggerMiddleware, Middleware, Next, Outcome, OutputFunction, Thunk, ThunkMiddleware,
};
pub use reducer::{Handler, HandlerReducer, Reducer, create_reducer};
pub use signal::{ChangeHandler, Connection, Signal, SignalError};
pub use state::{CombinedState, ContractViolation, DeepMerge, SliceValue};
pub use store::{Store, StoreBuilder};

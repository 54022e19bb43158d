//! Root reducer composition
//!
//! A [`CombinedReducer`] owns one reducer per named slice and produces a
//! [`CombinedState`] in which every slice is the output of its own reducer:
//!
//! ```text
//! next["counter"] = counter(prev["counter"], action)
//! next["todos"]   = todos(prev["todos"], action)
//! ```
//!
//! If no slice reducer produced a new reference, the previous composite is
//! returned as-is, so the store sees no change.

use crate::action::Action;
use crate::reducer::Reducer;
use crate::state::{CombinedState, ContractViolation, SliceValue, downcast_slice};
use anyhow::Context;
use std::any::Any;
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::Arc;

/// A slice reducer with its state type erased
trait SliceReducer<A>: Send + Sync {
    /// Returns the next slice value and whether it differs from `previous`
    fn reduce_slice(
        &self,
        key: &str,
        previous: Option<&Arc<dyn SliceValue>>,
        action: &A,
    ) -> anyhow::Result<(Arc<dyn SliceValue>, bool)>;
}

struct TypedSlice<T, R> {
    reducer: R,
    _slice: PhantomData<fn() -> T>,
}

impl<T, A, R> SliceReducer<A> for TypedSlice<T, R>
where
    T: Any + Debug + PartialEq + Send + Sync,
    R: Reducer<T, A>,
{
    fn reduce_slice(
        &self,
        key: &str,
        previous: Option<&Arc<dyn SliceValue>>,
        action: &A,
    ) -> anyhow::Result<(Arc<dyn SliceValue>, bool)> {
        let previous = previous
            .map(|slice| downcast_slice::<T>(key, slice))
            .transpose()?;

        let next = self.reducer.reduce(previous.as_ref(), action)?;
        let changed = previous
            .as_ref()
            .is_none_or(|previous| !Arc::ptr_eq(previous, &next));

        let next: Arc<dyn SliceValue> = next;
        Ok((next, changed))
    }
}

/// Reducer over a [`CombinedState`], built with [`combine_reducers`]
pub struct CombinedReducer<A> {
    slices: Vec<(String, Box<dyn SliceReducer<A>>)>,
}

/// Start an empty combined reducer; add slices with [`CombinedReducer::slice`]
///
/// ```
/// use tick_store::{combine_reducers, create_reducer, Action, AnyAction, Reducer};
///
/// let root = combine_reducers()
///     .slice("counter", create_reducer(0i64).on("inc", |n: &i64, _: &AnyAction| Ok(n + 1)))
///     .slice("label", create_reducer(String::from("untitled")));
///
/// let state = root.reduce(None, &AnyAction::bootstrap()).unwrap();
/// let state = root.reduce(Some(&state), &AnyAction::new("inc")).unwrap();
/// assert_eq!(state.get::<i64>("counter"), Some(&1));
/// ```
pub fn combine_reducers<A>() -> CombinedReducer<A> {
    CombinedReducer { slices: Vec::new() }
}

impl<A: 'static> CombinedReducer<A> {
    /// Hand ownership of the slice `key` to `reducer`
    ///
    /// Slices are reduced in the order they were added. Adding a key twice
    /// replaces the earlier reducer.
    pub fn slice<T, R>(mut self, key: impl Into<String>, reducer: R) -> Self
    where
        T: Any + Debug + PartialEq + Send + Sync,
        R: Reducer<T, A> + 'static,
    {
        let key = key.into();
        let slice: Box<dyn SliceReducer<A>> = Box::new(TypedSlice {
            reducer,
            _slice: PhantomData,
        });

        match self.slices.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => {
                log::warn!("combine_reducers: slice `{}` registered twice, keeping the last reducer", key);
                entry.1 = slice;
            }
            None => self.slices.push((key, slice)),
        }
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.iter().map(|(key, _)| key.as_str())
    }
}

impl<A: Action> Reducer<CombinedState, A> for CombinedReducer<A> {
    fn reduce(
        &self,
        state: Option<&Arc<CombinedState>>,
        action: &A,
    ) -> anyhow::Result<Arc<CombinedState>> {
        let mut next = CombinedState::new();
        let mut changed = state.is_none();

        for (key, reducer) in &self.slices {
            let previous = match state {
                Some(state) => Some(state.raw_slice(key).ok_or_else(|| {
                    ContractViolation::MissingSlice { key: key.clone() }
                })?),
                None => None,
            };

            let (value, slice_changed) = reducer
                .reduce_slice(key, previous, action)
                .with_context(|| format!("slice `{}` reducer failed", key))?;

            changed |= slice_changed;
            next.insert_slice(key.clone(), value);
        }

        match state {
            Some(state) if !changed => Ok(Arc::clone(state)),
            _ => Ok(Arc::new(next)),
        }
    }
}

impl<A> Debug for CombinedReducer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("slices", &self.slices.iter().map(|(key, _)| key).collect::<Vec<_>>())
            .finish()
    }
}

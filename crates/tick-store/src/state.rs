//! Composite state for [`combine_reducers`](crate::combine_reducers)
//!
//! A [`CombinedState`] maps slice keys to immutable, type-erased slice values.
//! Each slice is owned by exactly one reducer; the composite is only ever
//! replaced, never edited, by the dispatch pipeline.

use serde_json::Value;
use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;
use thiserror::Error;

/// Reducer configuration defects detected while combining or preloading state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("slice `{key}` is missing from the combined state")]
    MissingSlice { key: String },

    #[error("preloaded state contains slice `{key}` that no reducer owns")]
    UnexpectedSlice { key: String },

    #[error("slice `{key}` holds {found}, but its reducer owns {expected}")]
    SliceTypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A value that can be stored as a slice of a [`CombinedState`]
///
/// Implemented for every `Any + Debug + PartialEq + Send + Sync` type.
pub trait SliceValue: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn slice_type_id(&self) -> TypeId;

    fn slice_type_name(&self) -> &'static str;

    fn dyn_eq(&self, other: &dyn SliceValue) -> bool;
}

impl<T> SliceValue for T
where
    T: Any + Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn slice_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn slice_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn dyn_eq(&self, other: &dyn SliceValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// Downcast a stored slice back to its concrete type
pub(crate) fn downcast_slice<T>(
    key: &str,
    slice: &Arc<dyn SliceValue>,
) -> Result<Arc<T>, ContractViolation>
where
    T: Any + Send + Sync,
{
    let found = slice.slice_type_name();
    Arc::clone(slice)
        .into_any_arc()
        .downcast::<T>()
        .map_err(|_| ContractViolation::SliceTypeMismatch {
            key: key.to_string(),
            expected: type_name::<T>(),
            found,
        })
}

/// State object produced by a combined reducer
#[derive(Clone, Default)]
pub struct CombinedState {
    slices: BTreeMap<String, Arc<dyn SliceValue>>,
}

impl CombinedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for preloaded state and assertions
    pub fn with<T: SliceValue>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<T: SliceValue>(&mut self, key: impl Into<String>, value: T) {
        self.slices.insert(key.into(), Arc::new(value));
    }

    pub(crate) fn insert_slice(&mut self, key: impl Into<String>, value: Arc<dyn SliceValue>) {
        self.slices.insert(key.into(), value);
    }

    pub(crate) fn raw_slice(&self, key: &str) -> Option<&Arc<dyn SliceValue>> {
        self.slices.get(key)
    }

    /// Borrow a slice as `T`; `None` if absent or of another type
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.slices
            .get(key)
            .and_then(|slice| slice.as_ref().as_any().downcast_ref::<T>())
    }

    /// Shared handle to a slice as `T`; `None` if absent or of another type
    pub fn slice<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.slices
            .get(key)
            .and_then(|slice| downcast_slice::<T>(key, slice).ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slices.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl Debug for CombinedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.slices.iter()).finish()
    }
}

impl PartialEq for CombinedState {
    fn eq(&self, other: &Self) -> bool {
        self.slices.len() == other.slices.len()
            && self.slices.iter().all(|(key, slice)| {
                other
                    .slices
                    .get(key)
                    .is_some_and(|theirs| slice.as_ref().dyn_eq(theirs.as_ref()))
            })
    }
}

/// Overlay of a partial value onto bootstrap defaults
///
/// Used by [`StoreBuilder::preloaded_state`](crate::StoreBuilder::preloaded_state).
pub trait DeepMerge: Sized {
    type Partial;

    fn deep_merge(&self, partial: Self::Partial) -> Result<Self, ContractViolation>;
}

impl DeepMerge for CombinedState {
    type Partial = CombinedState;

    /// Keys in `partial` replace the default slice; nested combined slices merge recursively.
    fn deep_merge(&self, partial: CombinedState) -> Result<Self, ContractViolation> {
        let mut merged = self.clone();

        for (key, overlay) in partial.slices {
            let Some(base) = self.slices.get(&key) else {
                return Err(ContractViolation::UnexpectedSlice { key });
            };

            if base.slice_type_id() != overlay.slice_type_id() {
                return Err(ContractViolation::SliceTypeMismatch {
                    expected: base.slice_type_name(),
                    found: overlay.slice_type_name(),
                    key,
                });
            }

            let nested = base.as_ref().as_any().downcast_ref::<CombinedState>().zip(
                overlay.as_ref().as_any().downcast_ref::<CombinedState>(),
            );
            let value: Arc<dyn SliceValue> = match nested {
                Some((base, partial)) => Arc::new(base.deep_merge(partial.clone())?),
                None => Arc::clone(&overlay),
            };
            merged.slices.insert(key, value);
        }

        Ok(merged)
    }
}

impl DeepMerge for Value {
    type Partial = Value;

    /// Objects merge key by key, `null` keeps the default, anything else replaces it.
    fn deep_merge(&self, partial: Value) -> Result<Self, ContractViolation> {
        match (self, partial) {
            (Value::Object(base), Value::Object(overlay)) => {
                let mut merged = base.clone();
                for (key, value) in overlay {
                    let value = match base.get(&key) {
                        Some(existing) => existing.deep_merge(value)?,
                        None => value,
                    };
                    merged.insert(key, value);
                }
                Ok(Value::Object(merged))
            }
            (_, Value::Null) => Ok(self.clone()),
            (_, other) => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Settings {
        volume: u8,
    }

    #[test]
    fn test_typed_access() {
        let state = CombinedState::new()
            .with("counter", 2i64)
            .with("settings", Settings { volume: 3 });

        assert_eq!(state.get::<i64>("counter"), Some(&2));
        assert_eq!(state.get::<Settings>("settings").map(|s| s.volume), Some(3));
        assert_eq!(state.get::<String>("counter"), None);
        assert_eq!(state.get::<i64>("missing"), None);
        assert_eq!(state.slice::<i64>("counter").as_deref(), Some(&2));
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["counter", "settings"]);
        assert_eq!(state.len(), 2);
        assert!(!state.is_empty());
        assert!(state.contains_key("settings"));
    }

    #[test]
    fn test_structural_equality() {
        let a = CombinedState::new().with("counter", 2i64);
        let b = CombinedState::new().with("counter", 2i64);
        let c = CombinedState::new().with("counter", 3i64);
        let d = CombinedState::new().with("counter", 2i32);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_ne!(a, CombinedState::new());
    }

    #[test]
    fn test_debug_lists_slices() {
        let state = CombinedState::new().with("counter", 2i64);
        assert_eq!(format!("{:?}", state), r#"{"counter": 2}"#);
    }

    #[test]
    fn test_merge_replaces_known_slices() {
        let defaults = CombinedState::new()
            .with("counter", 0i64)
            .with("settings", Settings { volume: 5 });
        let merged = defaults
            .deep_merge(CombinedState::new().with("counter", 10i64))
            .unwrap();

        assert_eq!(merged.get::<i64>("counter"), Some(&10));
        assert_eq!(merged.get::<Settings>("settings"), Some(&Settings { volume: 5 }));
    }

    #[test]
    fn test_merge_recurses_into_nested_state() {
        let defaults = CombinedState::new().with(
            "ui",
            CombinedState::new().with("theme", "dark".to_string()).with("zoom", 1u32),
        );
        let partial = CombinedState::new().with("ui", CombinedState::new().with("zoom", 2u32));

        let merged = defaults.deep_merge(partial).unwrap();
        let ui = merged.get::<CombinedState>("ui").unwrap();
        assert_eq!(ui.get::<String>("theme").map(String::as_str), Some("dark"));
        assert_eq!(ui.get::<u32>("zoom"), Some(&2));
    }

    #[test]
    fn test_merge_rejects_unknown_slice() {
        let defaults = CombinedState::new().with("counter", 0i64);
        let err = defaults
            .deep_merge(CombinedState::new().with("typo", 1i64))
            .unwrap_err();
        assert_eq!(
            err,
            ContractViolation::UnexpectedSlice {
                key: "typo".to_string()
            }
        );
    }

    #[test]
    fn test_merge_rejects_type_change() {
        let defaults = CombinedState::new().with("counter", 0i64);
        let err = defaults
            .deep_merge(CombinedState::new().with("counter", "ten".to_string()))
            .unwrap_err();
        assert!(matches!(err, ContractViolation::SliceTypeMismatch { ref key, .. } if key == "counter"));
    }

    #[test]
    fn test_json_merge() {
        let defaults = json!({"player": {"hp": 100, "name": "anon"}, "level": 1});
        let merged = defaults
            .deep_merge(json!({"player": {"name": "ada"}, "level": null}))
            .unwrap();
        assert_eq!(merged, json!({"player": {"hp": 100, "name": "ada"}, "level": 1}));
    }
}

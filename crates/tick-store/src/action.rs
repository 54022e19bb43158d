//! Actions - tagged, immutable descriptions of an intended state transition
//!
//! Every action carries a `type` tag. Reducers and middleware match on the tag;
//! everything else about the action is payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Type tag of the action the store reduces once at construction
pub const INIT_ACTION_TYPE: &str = "@@INIT";

/// An action that can be dispatched to a [`Store`](crate::Store)
///
/// Implemented by [`AnyAction`] for open, record-style actions and by
/// application enums for closed action sets.
pub trait Action: Clone + Debug + Send + Sync + 'static {
    /// The discriminant tag reducers match on
    fn action_type(&self) -> &str;

    /// The action the store reduces with no state to obtain defaults
    fn bootstrap() -> Self;
}

/// Record-style action: a `type` tag plus arbitrary extra fields
///
/// Serializes as `{"type": "...", ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyAction {
    #[serde(rename = "type")]
    action_type: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl AnyAction {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            fields: Map::new(),
        }
    }

    pub(crate) fn from_parts(action_type: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            action_type: action_type.into(),
            fields,
        }
    }

    /// Add a field to the action
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Deserialize the extra fields into a typed payload
    pub fn payload<P: DeserializeOwned>(&self) -> Result<P, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

impl Action for AnyAction {
    fn action_type(&self) -> &str {
        &self.action_type
    }

    fn bootstrap() -> Self {
        Self::new(INIT_ACTION_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_any_action_fields() {
        let action = AnyAction::new("add").with("amount", 5).with("label", "five");

        assert_eq!(action.action_type(), "add");
        assert_eq!(action.field("amount"), Some(&json!(5)));
        assert_eq!(action.field("label"), Some(&json!("five")));
        assert_eq!(action.field("missing"), None);
        assert_eq!(action.fields().len(), 2);
    }

    #[test]
    fn test_any_action_serializes_flat() {
        let action = AnyAction::new("add").with("amount", 2);
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value, json!({"type": "add", "amount": 2}));

        let parsed: AnyAction = serde_json::from_value(json!({"type": "rename", "name": "x"})).unwrap();
        assert_eq!(parsed, AnyAction::new("rename").with("name", "x"));
    }

    #[test]
    fn test_any_action_without_type_is_rejected() {
        let parsed = serde_json::from_value::<AnyAction>(json!({"amount": 2}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_payload_extraction() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Add {
            amount: i64,
        }

        let action = AnyAction::new("add").with("amount", 7);
        assert_eq!(action.payload::<Add>().unwrap(), Add { amount: 7 });

        let wrong = AnyAction::new("add").with("amount", "seven");
        assert!(wrong.payload::<Add>().is_err());
    }

    #[test]
    fn test_bootstrap_action() {
        assert_eq!(AnyAction::bootstrap().action_type(), INIT_ACTION_TYPE);
    }
}

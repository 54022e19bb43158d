//! Action creators bind a literal type tag to a payload-building function
//!
//! The tag lives on the creator, so reducers can match either by calling the
//! creator or by comparing `action.action_type()` against `creator.name()`
//! without the two drifting apart.

use crate::action::{Action, AnyAction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Errors raised while building or reading actions from a creator
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("payload for `{action_type}` must serialize to a map, got {found}")]
    PayloadNotObject {
        action_type: &'static str,
        found: &'static str,
    },

    #[error("payload for `{action_type}` may not carry its own `type` field")]
    ReservedField { action_type: &'static str },

    #[error("failed to convert action payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

type Generator<Args, P> = Box<dyn Fn(Args) -> P + Send + Sync>;

/// Builds [`AnyAction`]s tagged with a fixed name
///
/// Multiple arguments are passed as a tuple.
pub struct ActionCreator<Args, P> {
    name: &'static str,
    generator: Generator<Args, P>,
}

/// Create an action creator for `name`
///
/// ```
/// use serde::Serialize;
/// use tick_store::{make_action_creator, Action};
///
/// #[derive(Serialize)]
/// struct SetFoo {
///     value: String,
/// }
///
/// let set_foo = make_action_creator("SetFoo", |value: String| SetFoo { value });
/// let action = set_foo.create("bar".to_string()).unwrap();
/// assert_eq!(action.action_type(), set_foo.name());
/// ```
pub fn make_action_creator<Args, P, F>(name: &'static str, generator: F) -> ActionCreator<Args, P>
where
    F: Fn(Args) -> P + Send + Sync + 'static,
{
    ActionCreator {
        name,
        generator: Box::new(generator),
    }
}

impl<Args, P> ActionCreator<Args, P> {
    /// The type tag every action from this creator carries
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `action` was tagged by this creator
    pub fn matches(&self, action: &AnyAction) -> bool {
        action.action_type() == self.name
    }
}

impl<Args, P: Serialize> ActionCreator<Args, P> {
    /// Build an action from `args`
    pub fn create(&self, args: Args) -> Result<AnyAction, ActionError> {
        let payload = (self.generator)(args);
        let fields = match serde_json::to_value(payload)? {
            Value::Object(fields) => fields,
            Value::Null => Default::default(),
            other => {
                return Err(ActionError::PayloadNotObject {
                    action_type: self.name,
                    found: json_kind(&other),
                });
            }
        };

        if fields.contains_key("type") {
            return Err(ActionError::ReservedField {
                action_type: self.name,
            });
        }

        Ok(AnyAction::from_parts(self.name, fields))
    }
}

impl<Args, P: DeserializeOwned> ActionCreator<Args, P> {
    /// Read the typed payload back out of an action tagged by this creator
    ///
    /// Returns `Ok(None)` for actions with a different tag.
    pub fn payload(&self, action: &AnyAction) -> Result<Option<P>, ActionError> {
        if !self.matches(action) {
            return Ok(None);
        }
        Ok(Some(action.payload()?))
    }
}

impl<Args, P> fmt::Debug for ActionCreator<Args, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}

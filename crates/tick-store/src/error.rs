use crate::state::ContractViolation;
use thiserror::Error;

/// Errors surfaced by [`Store`](crate::Store) operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The root reducer failed; the state is left at its pre-dispatch value
    #[error("reducer failed while handling `{action_type}`: {error:#}")]
    Reducer {
        action_type: String,
        error: anyhow::Error,
    },

    #[error("reducer failed while computing the store's initial state: {error:#}")]
    Bootstrap { error: anyhow::Error },

    #[error(transparent)]
    Contract(#[from] ContractViolation),

    /// Change subscribers failed during flush and no error reporter was installed
    #[error("{failed} change subscriber(s) failed during flush: {error:#}")]
    Subscriber { failed: usize, error: anyhow::Error },

    #[error("reducers may not dispatch actions")]
    DispatchInReducer,

    #[error("the store has been destructed")]
    Destructed,

    #[error("dispatched a thunk that no middleware handled; install ThunkMiddleware")]
    UnhandledThunk,

    #[error("actions must carry a non-empty type tag")]
    MissingActionType,

    #[error("dispatch resolved to an unexpected value, expected {expected}")]
    OutcomeMismatch { expected: &'static str },
}

impl StoreError {
    /// The user error behind a reducer, bootstrap or subscriber failure
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            StoreError::Reducer { error, .. }
            | StoreError::Bootstrap { error }
            | StoreError::Subscriber { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The contract violation behind this error, if any
    ///
    /// Violations raised by a combined reducer during dispatch arrive wrapped
    /// as reducer errors; this looks through that wrapping.
    pub fn contract_violation(&self) -> Option<&ContractViolation> {
        match self {
            StoreError::Contract(violation) => Some(violation),
            _ => self.cause().and_then(|error| error.downcast_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reducer_error_message_includes_chain() {
        let error = anyhow::anyhow!("negative balance").context("slice `bank` reducer failed");
        let err = StoreError::Reducer {
            action_type: "withdraw".to_string(),
            error,
        };

        assert_eq!(
            err.to_string(),
            "reducer failed while handling `withdraw`: slice `bank` reducer failed: negative balance"
        );
        assert!(err.cause().is_some());
    }

    #[test]
    fn test_contract_violation_is_found_through_wrapping() {
        let violation = ContractViolation::MissingSlice {
            key: "todos".to_string(),
        };
        let wrapped = StoreError::Reducer {
            action_type: "add".to_string(),
            error: anyhow::Error::new(violation.clone()).context("slice `todos` reducer failed"),
        };

        assert_eq!(wrapped.contract_violation(), Some(&violation));
        assert_eq!(
            StoreError::Contract(violation.clone()).contract_violation(),
            Some(&violation)
        );
        assert_eq!(StoreError::Destructed.contract_violation(), None);
    }
}

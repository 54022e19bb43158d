//! LoggerMiddleware - describes every reduced action and the resulting state

use super::{Dispatched, Middleware, Next, Outcome};
use crate::action::Action;
use crate::error::StoreError;
use crate::store::Store;
use std::fmt::{self, Debug};
use std::sync::{Arc, PoisonError, RwLock};

/// Sink for the logger's output lines
pub type OutputFunction = Arc<dyn Fn(&str) + Send + Sync>;

/// LoggerMiddleware - logs each action after it went through the rest of the chain
///
/// Purely observational: the action and the result are passed through untouched.
/// Lines go to the `log` facade unless another output function is installed.
pub struct LoggerMiddleware {
    output: RwLock<OutputFunction>,
}

impl LoggerMiddleware {
    pub fn new() -> Self {
        Self::with_output(|line: &str| log::info!("{}", line))
    }

    pub fn with_output<F>(output: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            output: RwLock::new(Arc::new(output)),
        }
    }

    /// Replace the output function; affects every following dispatch
    pub fn set_output_function<F>(&self, output: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.output.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(output);
    }

    fn output_function(&self) -> OutputFunction {
        Arc::clone(&self.output.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Default for LoggerMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for LoggerMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerMiddleware").finish_non_exhaustive()
    }
}

impl<S, A> Middleware<S, A> for LoggerMiddleware
where
    S: Debug + Send + Sync + 'static,
    A: Action,
{
    fn handle(
        &self,
        dispatched: Dispatched<S, A>,
        store: &Store<S, A>,
        next: Next<'_, S, A>,
    ) -> Result<Outcome<A>, StoreError> {
        let action = match dispatched {
            Dispatched::Action(action) => action,
            thunk => return next.dispatch(thunk),
        };

        let outcome = next.dispatch_action(action.clone())?;

        let line = format!(
            "Action dispatched: {:?}\nState changed to: {:#?}",
            action,
            store.get_state()
        );
        (self.output_function())(&line);

        Ok(outcome)
    }
}

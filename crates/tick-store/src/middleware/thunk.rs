//! ThunkMiddleware - lets callers dispatch functions of the store

use super::{Dispatched, Middleware, Next, Outcome};
use crate::action::Action;
use crate::error::StoreError;
use crate::store::Store;

/// ThunkMiddleware - runs dispatched thunks with the store
///
/// A thunk receives the store itself, so it can read state and dispatch
/// further actions; its return value becomes the result of
/// [`Store::dispatch_thunk`]. Plain actions are forwarded untouched.
///
/// A thunk that returns a future hands the pending work back to the caller.
/// Dispatches made when that future resumes are ordinary dispatches through
/// the full chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThunkMiddleware;

impl ThunkMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl<S, A> Middleware<S, A> for ThunkMiddleware
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn handle(
        &self,
        dispatched: Dispatched<S, A>,
        store: &Store<S, A>,
        next: Next<'_, S, A>,
    ) -> Result<Outcome<A>, StoreError> {
        match dispatched {
            Dispatched::Thunk(thunk) => {
                log::trace!("ThunkMiddleware: running thunk");
                Ok(Outcome::Value(thunk(store)))
            }
            action => next.dispatch(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AnyAction;
    use crate::reducer::create_reducer;
    use std::sync::Arc;
    use std::time::Duration;

    fn counter_store() -> Store<i64, AnyAction> {
        Store::builder(
            create_reducer(0i64)
                .on("inc", |n: &i64, _: &AnyAction| Ok(n + 1))
                .on("set", |_: &i64, action: &AnyAction| {
                    Ok(action.field("value").and_then(|v| v.as_i64()).unwrap_or_default())
                }),
        )
        .middleware(ThunkMiddleware)
        .build()
        .unwrap()
    }

    #[test]
    fn test_thunk_receives_store_and_returns_value() {
        let store = counter_store();

        let seen = store
            .dispatch_thunk(|store: &Store<i64, AnyAction>| {
                store.dispatch(AnyAction::new("inc")).unwrap();
                store.dispatch(AnyAction::new("inc")).unwrap();
                format!("count is {}", store.get_state())
            })
            .unwrap();

        assert_eq!(seen, "count is 2");
        assert_eq!(*store.get_state(), 2);
    }

    #[test]
    fn test_plain_actions_are_forwarded_unchanged() {
        let store = counter_store();
        let action = AnyAction::new("set").with("value", 9);

        let returned = store.dispatch(action.clone()).unwrap();

        assert_eq!(returned, action);
        assert_eq!(*store.get_state(), 9);
    }

    #[test]
    fn test_thunk_result_can_carry_errors() {
        let store = counter_store();

        let result = store
            .dispatch_thunk(|store: &Store<i64, AnyAction>| store.dispatch(AnyAction::new("")))
            .unwrap();

        assert!(matches!(result, Err(StoreError::MissingActionType)));
    }

    #[test]
    fn test_thunk_without_middleware_is_rejected() {
        let store: Store<i64, AnyAction> = Store::new(create_reducer(0i64)).unwrap();

        let err = store.dispatch_thunk(|_| ()).unwrap_err();
        assert!(matches!(err, StoreError::UnhandledThunk));
    }

    #[tokio::test]
    async fn test_async_thunk_dispatches_after_resuming() {
        let store = counter_store();

        let pending = store
            .dispatch_thunk(|store: &Store<i64, AnyAction>| {
                let store = store.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    store.dispatch(AnyAction::new("set").with("value", 40))?;
                    store.dispatch(AnyAction::new("inc"))?;
                    Ok::<_, StoreError>(store.get_state())
                }
            })
            .unwrap();

        // Nothing ran past the first await yet
        assert_eq!(*store.get_state(), 0);

        let state: Arc<i64> = pending.await.unwrap();
        assert_eq!(*state, 41);
        assert_eq!(*store.get_state(), 41);
    }
}

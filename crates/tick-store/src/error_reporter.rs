//! Optional hook for reducer and change-subscriber failures
//!
//! A reporter sees every failure with enough context to log or ship it
//! somewhere. Reducer failures still propagate to the `dispatch` caller after
//! being reported; subscriber failures are swallowed once reported.

use std::fmt::Debug;
use std::sync::Arc;

/// A failure handed to an [`ErrorReporter`]
#[derive(Debug)]
pub struct ErrorResult<'a> {
    /// Human readable description including the error's cause chain
    pub message: String,
    /// The error as the failing code returned it
    pub thrown_value: &'a anyhow::Error,
}

impl<'a> ErrorResult<'a> {
    pub fn new(thrown_value: &'a anyhow::Error) -> Self {
        Self {
            message: format!("{:#}", thrown_value),
            thrown_value,
        }
    }
}

pub trait ErrorReporter<S, A>: Send + Sync {
    /// The root reducer failed while reducing `action` on `prev_state`
    fn report_reducer_error(&self, prev_state: &S, action: &A, error: &ErrorResult<'_>);

    /// A change subscriber failed while the store published `prev_state -> current_state`
    ///
    /// `action` is the last action that replaced the state before the flush.
    /// `recent_actions` lists the last reduced actions, oldest first, and may
    /// be empty when the action log is disabled.
    fn report_update_error(
        &self,
        prev_state: &S,
        action: &A,
        current_state: &S,
        recent_actions: &[A],
        error: &ErrorResult<'_>,
    );
}

impl<S, A, R> ErrorReporter<S, A> for Arc<R>
where
    R: ErrorReporter<S, A> + ?Sized,
{
    fn report_reducer_error(&self, prev_state: &S, action: &A, error: &ErrorResult<'_>) {
        (**self).report_reducer_error(prev_state, action, error)
    }

    fn report_update_error(
        &self,
        prev_state: &S,
        action: &A,
        current_state: &S,
        recent_actions: &[A],
        error: &ErrorResult<'_>,
    ) {
        (**self).report_update_error(prev_state, action, current_state, recent_actions, error)
    }
}

/// Reporter that writes both failure kinds to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorReporter;

impl<S, A> ErrorReporter<S, A> for LogErrorReporter
where
    S: Debug,
    A: Debug,
{
    fn report_reducer_error(&self, prev_state: &S, action: &A, error: &ErrorResult<'_>) {
        log::error!(
            "Reducer failed: {}\nAction: {:?}\nPrevious state: {:#?}",
            error.message,
            action,
            prev_state
        );
    }

    fn report_update_error(
        &self,
        prev_state: &S,
        action: &A,
        current_state: &S,
        recent_actions: &[A],
        error: &ErrorResult<'_>,
    ) {
        log::error!(
            "Change subscriber failed: {}\nAction: {:?}\nRecent actions: {:?}\nPrevious state: {:#?}\nCurrent state: {:#?}",
            error.message,
            action,
            recent_actions,
            prev_state,
            current_state
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl ErrorReporter<i32, &'static str> for Recorder {
        fn report_reducer_error(&self, prev_state: &i32, action: &&'static str, error: &ErrorResult<'_>) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("reducer {} {} {}", prev_state, action, error.message));
        }

        fn report_update_error(
            &self,
            prev_state: &i32,
            action: &&'static str,
            current_state: &i32,
            recent_actions: &[&'static str],
            error: &ErrorResult<'_>,
        ) {
            self.seen.lock().unwrap().push(format!(
                "update {} {}->{} {:?} {}",
                action, prev_state, current_state, recent_actions, error.message
            ));
        }
    }

    #[test]
    fn test_error_result_message_carries_chain() {
        let error = anyhow!("disk full").context("saving");
        let result = ErrorResult::new(&error);
        assert_eq!(result.message, "saving: disk full");
        assert_eq!(result.thrown_value.root_cause().to_string(), "disk full");
    }

    #[test]
    fn test_shared_reporter_forwards() {
        let recorder = Arc::new(Recorder::default());
        let shared: Box<dyn ErrorReporter<i32, &'static str>> = Box::new(Arc::clone(&recorder));
        let error = anyhow!("boom");

        shared.report_reducer_error(&1, &"inc", &ErrorResult::new(&error));
        shared.report_update_error(&1, &"inc", &2, &["inc"], &ErrorResult::new(&error));

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["reducer 1 inc boom", r#"update inc 1->2 ["inc"] boom"#]
        );
    }

    #[test]
    fn test_log_reporter_accepts_any_debug_state() {
        let error = anyhow!("boom");
        let reporter = LogErrorReporter;
        ErrorReporter::<Vec<u8>, String>::report_reducer_error(
            &reporter,
            &vec![1],
            &"noop".to_string(),
            &ErrorResult::new(&error),
        );
    }
}

//! Change signal fired by [`Store::flush`](crate::Store::flush)
//!
//! Handlers receive `(new_state, old_state)` in the order they connected.
//! A handler that fails does not stop the others; failures are collected and
//! handed back to the caller of [`Signal::fire`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("connection {0} was already disconnected")]
    AlreadyDisconnected(u64),
}

/// Callback type for change handlers: `(new_state, old_state)`
pub type ChangeHandler<S> = Arc<dyn Fn(&Arc<S>, &Arc<S>) -> anyhow::Result<()> + Send + Sync>;

struct Listener<S> {
    id: u64,
    handler: ChangeHandler<S>,
    connected: Arc<AtomicBool>,
}

impl<S> Clone for Listener<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Arc::clone(&self.handler),
            connected: Arc::clone(&self.connected),
        }
    }
}

/// Ordered list of change handlers
pub struct Signal<S> {
    listeners: Mutex<Vec<Listener<S>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl<S> Signal<S> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Register `handler`; it stays connected until its [`Connection`] is
    /// disconnected or the signal is closed
    pub fn connect<F>(&self, handler: F) -> Connection
    where
        F: Fn(&Arc<S>, &Arc<S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Checked under the lock so `disconnect_all` cannot miss this listener
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if self.closed.load(Ordering::Acquire) {
            drop(listeners);
            log::warn!("Signal: connect after close, handler {} will never fire", id);
            return Connection::new(id, Arc::new(AtomicBool::new(false)));
        }

        let connected = Arc::new(AtomicBool::new(true));
        listeners.push(Listener {
            id,
            handler: Arc::new(handler),
            connected: Arc::clone(&connected),
        });

        Connection::new(id, connected)
    }

    /// Invoke every connected handler once with `(new_state, old_state)`
    ///
    /// Handlers may connect or disconnect while the signal fires; a handler
    /// disconnected mid-fire is skipped, one connected mid-fire waits for the
    /// next fire. Returns the errors of failing handlers in call order.
    pub fn fire(&self, new_state: &Arc<S>, old_state: &Arc<S>) -> Vec<anyhow::Error> {
        let snapshot: Vec<Listener<S>> = {
            let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.retain(|listener| listener.connected.load(Ordering::Acquire));
            listeners.clone()
        };

        let mut failures = Vec::new();
        for listener in snapshot {
            if !listener.connected.load(Ordering::Acquire) {
                continue;
            }
            if let Err(e) = (listener.handler)(new_state, old_state) {
                log::debug!("Signal: handler {} failed: {:#}", listener.id, e);
                failures.push(e);
            }
        }
        failures
    }

    /// Disconnect every handler and refuse new ones
    pub fn disconnect_all(&self) {
        self.closed.store(true, Ordering::Release);
        let drained: Vec<_> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        for listener in drained {
            listener.connected.store(false, Ordering::Release);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of handlers still connected
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|listener| listener.connected.load(Ordering::Acquire))
            .count()
    }
}

impl<S> Default for Signal<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Signal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listener_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Handle returned by [`Signal::connect`]
///
/// Dropping the handle does not disconnect the handler.
#[derive(Debug)]
pub struct Connection {
    id: u64,
    connected: Arc<AtomicBool>,
    released: AtomicBool,
}

impl Connection {
    fn new(id: u64, connected: Arc<AtomicBool>) -> Self {
        Self {
            id,
            connected,
            released: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop the handler from receiving further notifications
    ///
    /// Disconnecting the same handle twice is an error. Disconnecting after the
    /// signal was closed is not.
    pub fn disconnect(&self) -> Result<(), SignalError> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Err(SignalError::AlreadyDisconnected(self.id));
        }
        self.connected.store(false, Ordering::Release);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

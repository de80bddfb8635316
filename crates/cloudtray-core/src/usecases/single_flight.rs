//! Collapses concurrent invocations of one async operation
//!
//! The first caller starts the operation; callers arriving while it is still
//! pending await the same result instead of starting a second one. Once it
//! completes the slot is cleared, so the next call starts fresh.

use std::sync::{Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};

/// A single pending operation shared by every concurrent caller
pub struct SingleFlight<T: Clone> {
    pending: Mutex<Option<Shared<BoxFuture<'static, T>>>>,
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }
}

impl<T: Clone> std::fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the pending operation, or starts one with `start`
    ///
    /// `start` is only called when nothing is pending.
    pub async fn run<F>(&self, start: F) -> T
    where
        F: FnOnce() -> BoxFuture<'static, T>,
    {
        let shared = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            match pending.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let fresh = start().shared();
                    *pending = Some(fresh.clone());
                    fresh
                }
            }
        };

        let output = shared.clone().await;

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&shared))
        {
            *pending = None;
        }
        output
    }
}

impl<T: Clone> SingleFlight<T> {
    pub fn is_in_flight(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

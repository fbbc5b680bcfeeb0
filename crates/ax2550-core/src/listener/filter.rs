//! Token filters
//!
//! A filter pairs a [`TokenMatcher`] with a delivery strategy: buffered
//! filters queue tokens for a later bounded wait, callback filters run a
//! closure on the reader thread. The listener only keeps weak references,
//! so a filter stops receiving tokens once its handle is dropped.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::TokenMatcher;

/// Receiver side of a filter as seen by the listener
pub(crate) trait TokenSink: Send + Sync {
    /// Deliver the token if it matches. Returns whether it matched.
    fn offer(&self, token: &str) -> bool;
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct BufferedShared {
    matcher: TokenMatcher,
    queue: Mutex<VecDeque<String>>,
    ready: Condvar,
}

impl TokenSink for BufferedShared {
    fn offer(&self, token: &str) -> bool {
        if !self.matcher.matches(token) {
            return false;
        }
        lock(&self.queue).push_back(token.to_string());
        self.ready.notify_all();
        true
    }
}

/// Queue of matching tokens supporting bounded waits
#[derive(Clone)]
pub struct BufferedFilter {
    shared: Arc<BufferedShared>,
}

impl BufferedFilter {
    pub(crate) fn new(matcher: TokenMatcher) -> Self {
        Self {
            shared: Arc::new(BufferedShared {
                matcher,
                queue: Mutex::new(VecDeque::new()),
                ready: Condvar::new(),
            }),
        }
    }

    pub(crate) fn sink(&self) -> Arc<dyn TokenSink> {
        self.shared.clone()
    }

    pub fn matcher(&self) -> &TokenMatcher {
        &self.shared.matcher
    }

    /// Pop the oldest buffered token, waiting up to `timeout` for one to arrive
    pub fn wait(&self, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        let mut queue = lock(&self.shared.queue);
        loop {
            if let Some(token) = queue.pop_front() {
                return Some(token);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .shared
                .ready
                .wait_timeout(queue, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            queue = guard;
        }
    }

    /// Discard buffered tokens
    pub fn clear(&self) {
        lock(&self.shared.queue).clear();
    }

    /// Number of buffered tokens
    pub fn count(&self) -> usize {
        lock(&self.shared.queue).len()
    }
}

pub(crate) struct CallbackShared {
    matcher: TokenMatcher,
    callback: Box<dyn Fn(&str) + Send + Sync>,
}

impl TokenSink for CallbackShared {
    fn offer(&self, token: &str) -> bool {
        if !self.matcher.matches(token) {
            return false;
        }
        (self.callback)(token);
        true
    }
}

/// Keeps a callback subscription alive
pub struct CallbackFilter {
    shared: Arc<CallbackShared>,
}

impl CallbackFilter {
    pub(crate) fn new<F>(matcher: TokenMatcher, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(CallbackShared {
                matcher,
                callback: Box::new(callback),
            }),
        }
    }

    pub(crate) fn sink(&self) -> Arc<dyn TokenSink> {
        self.shared.clone()
    }

    pub fn matcher(&self) -> &TokenMatcher {
        &self.shared.matcher
    }
}

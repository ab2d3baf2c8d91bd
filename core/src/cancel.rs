//! Cooperative cancellation handles.
//!
//! # Design
//! A [`CancelToken`] is a cheaply clonable handle to shared state that moves
//! from pending to cancelled exactly once. Listeners registered with
//! [`CancelToken::listen`] run synchronously, in registration order, on the
//! thread that performs the transition; the listener list is taken out of the
//! token before they run, so a token that is reused across many requests
//! never accumulates fired listeners.
//!
//! [`CancelToken::race`] builds a derived token from any number of sources.
//! Sources hold only a weak link to the derived token, and the derived token
//! holds only weak links back through its [`Subscription`]s, so neither keeps
//! the other alive.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::oneshot;

/// Message of the reason used when [`CancelToken::cancel`] is called without one.
pub const DEFAULT_CANCEL_MESSAGE: &str = "canceled";

/// Why a token was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason {
    message: Arc<str>,
}

impl CancelReason {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Arc::from(message.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Default for CancelReason {
    fn default() -> Self {
        Self::new(DEFAULT_CANCEL_MESSAGE)
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CancelReason {}

impl From<&str> for CancelReason {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CancelReason {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

type Listener = Box<dyn FnOnce(&CancelReason) + Send>;

#[derive(Default)]
struct State {
    reason: Option<CancelReason>,
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
    /// Subscriptions a raced token holds on its sources.
    links: Vec<Subscription>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    state: Mutex<State>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        // Listeners never run under the lock, so a poisoned guard still holds
        // consistent state.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A shareable cancellation handle.
///
/// Clones refer to the same token. Cancelling any clone cancels all of them.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// The stored reason, once cancelled.
    pub fn reason(&self) -> Option<CancelReason> {
        self.inner.lock().reason.clone()
    }

    /// Cancel with the default reason. See [`cancel_with`](Self::cancel_with).
    pub fn cancel(&self) -> bool {
        self.cancel_with(CancelReason::default())
    }

    /// Cancel with `reason` and run every registered listener once.
    ///
    /// Returns `false` if the token was already cancelled; in that case
    /// nothing happens and the original reason is kept.
    pub fn cancel_with(&self, reason: impl Into<CancelReason>) -> bool {
        let reason = reason.into();
        let mut state = self.inner.lock();
        if state.reason.is_some() {
            return false;
        }
        state.reason = Some(reason.clone());
        self.inner.cancelled.store(true, Ordering::Release);
        let listeners = std::mem::take(&mut state.listeners);
        let links = std::mem::take(&mut state.links);
        drop(state);
        tracing::trace!(reason = %reason, listeners = listeners.len(), "cancel token fired");
        drop(links);
        for (_, listener) in listeners {
            listener(&reason);
        }
        true
    }

    /// Register `listener` to run once when the token is cancelled.
    ///
    /// If the token is already cancelled the listener runs immediately, before
    /// this call returns. Dropping the returned [`Subscription`] deregisters
    /// the listener.
    pub fn listen<F>(&self, listener: F) -> Subscription
    where
        F: FnOnce(&CancelReason) + Send + 'static,
    {
        let mut state = self.inner.lock();
        let fired = state.reason.clone();
        if let Some(reason) = fired {
            drop(state);
            listener(&reason);
            return Subscription::inert();
        }
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push((id, Box::new(listener)));
        Subscription {
            token: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Resolve with the reason once the token is cancelled.
    ///
    /// The listener backing the future is deregistered when the future is
    /// dropped.
    pub fn cancelled(&self) -> impl Future<Output = CancelReason> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let subscription = self.listen(move |reason| {
            let _ = tx.send(reason.clone());
        });
        let token = self.clone();
        async move {
            let _subscription = subscription;
            match rx.await {
                Ok(reason) => reason,
                // The sender only goes away unfired if the listener was
                // removed; the token itself is kept alive by `token`.
                Err(_) => match token.reason() {
                    Some(reason) => reason,
                    None => std::future::pending().await,
                },
            }
        }
    }

    /// A token cancelled by whichever of `tokens` cancels first, with that
    /// source's reason.
    pub fn race<'a, I>(tokens: I) -> CancelToken
    where
        I: IntoIterator<Item = &'a CancelToken>,
    {
        let raced = CancelToken::new();
        for source in tokens {
            if raced.is_cancelled() {
                break;
            }
            let target = Arc::downgrade(&raced.inner);
            let link = source.listen(move |reason| {
                if let Some(inner) = target.upgrade() {
                    CancelToken { inner }.cancel_with(reason.clone());
                }
            });
            raced.adopt(link);
        }
        raced
    }

    fn adopt(&self, link: Subscription) {
        let mut state = self.inner.lock();
        if state.reason.is_none() {
            state.links.push(link);
            return;
        }
        drop(state);
        drop(link);
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &self.reason())
            .finish()
    }
}

/// Handle to a listener registered with [`CancelToken::listen`].
///
/// Deregisters the listener when dropped.
#[must_use = "dropping a Subscription deregisters its listener"]
pub struct Subscription {
    token: Weak<Inner>,
    id: Option<u64>,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            token: Weak::new(),
            id: None,
        }
    }

    /// Deregister the listener now. A no-op if it already ran.
    pub fn unlisten(mut self) {
        self.remove();
    }

    /// Keep the listener registered for the token's whole lifetime.
    pub fn forget(mut self) {
        self.id = None;
    }

    fn remove(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        let Some(inner) = self.token.upgrade() else {
            return;
        };
        let mut state = inner.lock();
        let index = state
            .listeners
            .iter()
            .position(|(listener_id, _)| *listener_id == id);
        let removed = index.map(|index| state.listeners.remove(index));
        drop(state);
        // Released outside the lock: a listener may own another subscription.
        drop(removed);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

//! Ordered multicast subscriber lists.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::dispatch::EventDispatcher;

/// Token returned by [`SubscriberSet::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Callback<A> = Arc<dyn Fn(&A) + Send + Sync + 'static>;

/// An ordered set of event callbacks.
///
/// Subscribers are invoked in subscription order. Emission goes through
/// an [`EventDispatcher`], so delivery context is a property of the
/// manager, not of each subscriber.
///
/// ## Thread safety
///
/// The list is mutex-guarded; subscribe/unsubscribe may race with
/// emission from a backend thread. `emit` snapshots the current list,
/// so a subscriber added during an in-flight emission sees only later
/// events.
pub struct SubscriberSet<A> {
    inner: Mutex<Vec<(SubscriberId, Callback<A>)>>,
    next_id: AtomicU64,
}

impl<A> SubscriberSet<A> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&A) + Send + Sync + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove one subscriber. Returns false if the id was not present.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subs = self.lock();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriberId, Callback<A>)>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Send + 'static> SubscriberSet<A> {
    /// Deliver `event` to every current subscriber, in order, on the
    /// dispatcher's context. One dispatch per emission: a queued
    /// dispatcher delivers the whole fan-out as a single unit, so
    /// events queued later cannot interleave with this one.
    pub fn emit(&self, event: A, dispatcher: &dyn EventDispatcher) {
        let snapshot: Vec<Callback<A>> =
            self.lock().iter().map(|(_, cb)| cb.clone()).collect();
        if snapshot.is_empty() {
            return;
        }
        dispatcher.dispatch(Box::new(move || {
            for callback in &snapshot {
                callback(&event);
            }
        }));
    }
}

impl<A> Default for SubscriberSet<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> core::fmt::Debug for SubscriberSet<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("subscribers", &self.len())
            .finish()
    }
}

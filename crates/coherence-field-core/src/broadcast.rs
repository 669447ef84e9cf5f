//! Field state broadcasting.
//!
//! The broadcaster hands every published [`FieldState`] to a set of
//! registered listeners and keeps the most recent state for pull-style
//! consumers. Delivery is synchronous inside the publishing tick. The
//! subscriber list is snapshotted before delivery, so listeners may
//! subscribe or unsubscribe from inside a callback without invalidating
//! the iteration; a panicking listener is isolated, counted, and logged,
//! and the remaining listeners still receive the state.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::field::FieldState;

/// Receives every published field state.
pub trait FieldStateListener: Send + Sync {
    /// Called once per publish with the freshly built snapshot.
    fn on_state(&self, state: &FieldState);
}

/// Adapter turning a closure into a [`FieldStateListener`].
pub struct FnListener<F>(F);

impl<F> FnListener<F>
where
    F: Fn(&FieldState) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> FieldStateListener for FnListener<F>
where
    F: Fn(&FieldState) + Send + Sync,
{
    fn on_state(&self, state: &FieldState) {
        (self.0)(state);
    }
}

/// Handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    listener: Arc<dyn FieldStateListener>,
}

struct BroadcasterInner {
    subscribers: RwLock<Vec<Subscriber>>,
    latest: RwLock<Option<FieldState>>,
    fault_count: AtomicU64,
}

/// Cloneable publish/subscribe hub for field states.
///
/// Clones share the same subscriber list and latest state.
#[derive(Clone)]
pub struct FieldStateBroadcaster {
    inner: Arc<BroadcasterInner>,
}

impl std::fmt::Debug for FieldStateBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldStateBroadcaster").finish_non_exhaustive()
    }
}

impl FieldStateBroadcaster {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BroadcasterInner {
                subscribers: RwLock::new(Vec::new()),
                latest: RwLock::new(None),
                fault_count: AtomicU64::new(0),
            }),
        }
    }

    /// Record `state` as the latest and deliver it to every subscriber
    /// registered at the start of the publish.
    pub fn publish(&self, state: &FieldState) {
        *self.inner.latest.write() = Some(state.clone());

        // Snapshot, then drop the guard so callbacks can (un)subscribe.
        let subscribers: Vec<Subscriber> = self.inner.subscribers.read().clone();
        for subscriber in subscribers {
            let delivery = catch_unwind(AssertUnwindSafe(|| {
                subscriber.listener.on_state(state);
            }));
            if delivery.is_err() {
                self.inner.fault_count.fetch_add(1, Ordering::Relaxed);
                warn!(subscription = %subscriber.id, "subscriber panicked during delivery, isolating");
            }
        }
    }

    /// Register a listener. Takes effect from the next publish.
    pub fn subscribe(&self, listener: Arc<dyn FieldStateListener>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.inner.subscribers.write().push(Subscriber { id, listener });
        id
    }

    /// Register a closure as a listener.
    pub fn subscribe_fn<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&FieldState) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnListener::new(f)))
    }

    /// Remove a subscription. Returns false when the id is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() < before
    }

    /// Most recently published state, or `None` before the first publish.
    pub fn latest(&self) -> Option<FieldState> {
        self.inner.latest.read().clone()
    }

    /// Forget the latest state. Subscriptions survive.
    pub fn clear_latest(&self) {
        *self.inner.latest.write() = None;
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Number of listener panics isolated so far.
    pub fn fault_count(&self) -> u64 {
        self.inner.fault_count.load(Ordering::Relaxed)
    }
}

impl Default for FieldStateBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener decorator that forwards a state only when the coherence has
/// moved at least `min_delta` since the last forwarded state.
///
/// The first state always passes. Suppressed states do not advance the
/// reference point, so a slow drift still gets through once it adds up.
pub struct DeltaFilter<L> {
    inner: L,
    min_delta: f32,
    last_forwarded: Mutex<Option<f32>>,
}

impl<L: FieldStateListener> DeltaFilter<L> {
    pub fn new(inner: L, min_delta: f32) -> Self {
        Self {
            inner,
            min_delta: min_delta.max(0.0),
            last_forwarded: Mutex::new(None),
        }
    }
}

impl<L: FieldStateListener> FieldStateListener for DeltaFilter<L> {
    fn on_state(&self, state: &FieldState) {
        let mut last = self.last_forwarded.lock();
        let passes = match *last {
            None => true,
            Some(previous) => (state.coherence - previous).abs() >= self.min_delta,
        };
        if passes {
            *last = Some(state.coherence);
            self.inner.on_state(state);
        }
    }
}

#![forbid(unsafe_code)]

//! Listener registries and RAII subscriptions.
//!
//! [`Listeners<E>`] is the publish/subscribe primitive the rest of the crate
//! is built on: an ordered registry of callbacks invoked synchronously, in
//! registration order, every time an event is emitted. [`ChangeNotifier`]
//! carries property names through one, [`ObservableVec`] carries
//! [`ListChange`] values through another.
//!
//! # Architecture
//!
//! The registry lives behind `Rc<RefCell<..>>` for single-threaded shared
//! ownership: cloning a `Listeners` yields a handle to the same registry, so
//! an event source can hand a lightweight emit handle to a forwarding closure
//! without self-referential borrows.
//!
//! # Invariants
//!
//! 1. Callbacks run synchronously, in registration order, to completion.
//! 2. Emitting with zero listeners is a no-op, never an error.
//! 3. Dispatch iterates a snapshot of the registry: a callback may
//!    subscribe or unsubscribe (including itself) mid-dispatch without
//!    corrupting delivery to the remaining listeners. A callback removed
//!    mid-dispatch may still observe the in-flight event.
//! 4. Dropping a [`Subscription`] removes its callback before the next
//!    emission cycle.
//! 5. Re-entrant emission (a callback that triggers another emit on the same
//!    registry) is an ordinary nested call, not a suspension.
//!
//! [`ChangeNotifier`]: crate::notify::ChangeNotifier
//! [`ObservableVec`]: crate::collection::ObservableVec
//! [`ListChange`]: crate::collection::ListChange

use std::cell::RefCell;
use std::rc::Rc;

type Callback<E: ?Sized> = Rc<dyn Fn(&E)>;

struct Registry<E: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Callback<E>)>,
}

impl<E: ?Sized> Registry<E> {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

/// An ordered registry of event callbacks with synchronous dispatch.
///
/// Cloning yields another handle to the same registry.
pub struct Listeners<E: ?Sized> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E: ?Sized> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<E: ?Sized + 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized + 'static> std::fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}

impl<E: ?Sized + 'static> Listeners<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry::new())),
        }
    }

    /// Register a callback. Dropping the returned [`Subscription`] removes it.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Rc::new(callback)));
            id
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(id, "listener subscribed");
        let weak = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.borrow_mut().entries.retain(|(eid, _)| *eid != id);
                #[cfg(feature = "tracing")]
                tracing::trace!(id, "listener unsubscribed");
            }
        })
    }

    /// Invoke every registered callback with `event`, in registration order.
    ///
    /// Iterates a snapshot of the registry, so callbacks may mutate the
    /// subscription set mid-dispatch.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Callback<E>> = self
            .registry
            .borrow()
            .entries
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    /// Whether no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.borrow().entries.is_empty()
    }
}

/// RAII guard for a registered callback.
///
/// Dropping the guard removes the callback from its registry. Use
/// [`detach`](Self::detach) to keep the callback registered for the
/// registry's remaining lifetime.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Consume the guard without removing the callback.
    ///
    /// The callback stays registered until the registry itself is dropped.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Collects subscriptions for a logical scope (a view, a widget, a test).
///
/// When the set is dropped, every held subscription is released and none of
/// its callbacks fire again. `clear()` releases immediately and leaves the
/// set reusable.
#[derive(Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription to the set.
    pub fn hold(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the set holds no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release all held subscriptions immediately.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl std::fmt::Debug for SubscriptionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionSet")
            .field("count", &self.subscriptions.len())
            .finish()
    }
}

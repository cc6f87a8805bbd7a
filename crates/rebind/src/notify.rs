#![forbid(unsafe_code)]

//! Property-change notification for entities.
//!
//! [`ChangeNotifier`] gives any entity a `PropertyChanged(name)` event stream
//! plus the store-and-notify primitives that drive it. Embed one in an entity
//! struct, route every field write through [`set_and_notify`], and consumers
//! can [`subscribe`] to hear about the fields that actually changed.
//!
//! ```
//! use std::cell::RefCell;
//! use rebind::notify::{ChangeNotifier, Notify};
//!
//! struct Contact {
//!     notifier: ChangeNotifier,
//!     name: RefCell<String>,
//! }
//!
//! impl Contact {
//!     fn set_name(&self, value: impl Into<String>) -> bool {
//!         self.notifier.set_and_notify(&self.name, value.into(), "name")
//!     }
//! }
//!
//! impl Notify for Contact {
//!     fn notifier(&self) -> &ChangeNotifier {
//!         &self.notifier
//!     }
//! }
//!
//! let contact = Contact {
//!     notifier: ChangeNotifier::new(),
//!     name: RefCell::new(String::new()),
//! };
//! let _sub = contact.notifier().subscribe(|name| println!("changed: {name}"));
//! assert!(contact.set_name("Ada"));
//! assert!(!contact.set_name("Ada"), "same value, no event");
//! ```
//!
//! # Invariants
//!
//! 1. A notification fires if and only if the stored value is not equal to
//!    the previous value under the active equality policy. [`notify`] is the
//!    unconditional escape hatch.
//! 2. Equality is value equality (`PartialEq`). Handle types without
//!    meaningful value equality use [`set_and_notify_with`] and an identity
//!    predicate.
//! 3. An empty `Option` slot is always different from any concrete value:
//!    the first assignment fires even when the value equals the type's
//!    default.
//! 4. The slot borrow is released before dispatch, so a listener may re-read
//!    or re-set the slot. Nested notification is an ordinary nested call.
//!
//! [`set_and_notify`]: ChangeNotifier::set_and_notify
//! [`set_and_notify_with`]: ChangeNotifier::set_and_notify_with
//! [`subscribe`]: ChangeNotifier::subscribe
//! [`notify`]: ChangeNotifier::notify

use std::cell::RefCell;

use crate::event::{Listeners, Subscription};

/// A `PropertyChanged(name)` event stream with change-detecting setters.
///
/// Cloning yields another handle to the same listener registry, which is how
/// forwarding closures (see [`Container`](crate::container::Container)) emit
/// on an entity's behalf without borrowing the entity.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    listeners: Listeners<str>,
}

impl ChangeNotifier {
    /// Create a notifier with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Listeners::new(),
        }
    }

    /// Register a property-change listener.
    ///
    /// The callback receives the name of the logically-changed property.
    pub fn subscribe(&self, callback: impl Fn(&str) + 'static) -> Subscription {
        self.listeners.subscribe(callback)
    }

    /// Whether any listener is currently registered.
    #[must_use]
    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Raise `PropertyChanged` unconditionally.
    ///
    /// With no listeners attached this is a no-op, never an error.
    pub fn notify(&self, property: &str) {
        #[cfg(feature = "tracing")]
        tracing::trace!(property, "property changed");
        self.listeners.emit(property);
    }

    /// Store `value` in `slot` and raise `PropertyChanged(property)` if the
    /// new value differs from the stored one under `PartialEq`.
    ///
    /// Returns whether the value changed.
    pub fn set_and_notify<T: PartialEq>(
        &self,
        slot: &RefCell<T>,
        value: T,
        property: &str,
    ) -> bool {
        self.set_and_notify_with(slot, value, property, |current, new| current != new)
    }

    /// [`set_and_notify`](Self::set_and_notify) with a caller-supplied
    /// equality policy.
    ///
    /// `differs` receives `(current, new)` and returns whether they differ.
    /// Use this for handle types where identity, not structure, is the
    /// meaningful comparison:
    ///
    /// ```
    /// # use std::cell::RefCell;
    /// # use std::rc::Rc;
    /// # use rebind::notify::ChangeNotifier;
    /// let notifier = ChangeNotifier::new();
    /// let slot = RefCell::new(Rc::new(5));
    /// let same = Rc::clone(&*slot.borrow());
    /// let changed =
    ///     notifier.set_and_notify_with(&slot, same, "value", |a, b| !Rc::ptr_eq(a, b));
    /// assert!(!changed);
    /// ```
    pub fn set_and_notify_with<T>(
        &self,
        slot: &RefCell<T>,
        value: T,
        property: &str,
        differs: impl FnOnce(&T, &T) -> bool,
    ) -> bool {
        let changed = {
            let mut current = slot.borrow_mut();
            if !differs(&current, &value) {
                false
            } else {
                *current = value;
                true
            }
            // Borrow ends here; listeners may touch the slot.
        };
        if changed {
            self.notify(property);
        }
        changed
    }

    /// Store `value` in an optional `slot`, treating an empty slot as always
    /// different from any concrete value.
    ///
    /// Guarantees the event fires on the first assignment even when `value`
    /// equals the type's default. Returns whether the slot changed (always
    /// `true` when the slot was empty).
    pub fn set_opt_and_notify<T: PartialEq>(
        &self,
        slot: &RefCell<Option<T>>,
        value: T,
        property: &str,
    ) -> bool {
        let changed = {
            let mut current = slot.borrow_mut();
            match current.as_ref() {
                Some(existing) if *existing == value => false,
                _ => {
                    *current = Some(value);
                    true
                }
            }
        };
        if changed {
            self.notify(property);
        }
        changed
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Capability bound for entities that expose a [`ChangeNotifier`].
///
/// This is the contract a [`Container`](crate::container::Container) requires
/// of its contained object in order to forward its change events.
pub trait Notify {
    /// The entity's property-change event stream.
    fn notifier(&self) -> &ChangeNotifier;
}

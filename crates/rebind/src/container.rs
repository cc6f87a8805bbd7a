#![forbid(unsafe_code)]

//! Composite entities: wrap a notifying object and present its properties
//! as your own.
//!
//! A [`Container`] holds another change-notifying object and does three
//! things on its behalf:
//!
//! 1. **Event forwarding** — every `PropertyChanged` the contained object
//!    raises is re-raised by the container under the same property name.
//! 2. **Schema merging** — the container's schema is its own properties
//!    plus one [`ProxiedProperty`] wrapper per contained property, so an
//!    enumerating consumer sees one flat property surface.
//! 3. **Ownership attribution** — given any descriptor from the merged
//!    schema, [`property_owner`](Container::property_owner) answers which
//!    concrete object actually stores the value.
//!
//! # Invariants
//!
//! 1. While the container exists it holds exactly one contained object and
//!    at most one live forwarding subscription. An inner swap drops the old
//!    subscription before attaching the new one — no double-forwarding, no
//!    forwarding from a stale object.
//! 2. Mutating a property on the contained object raises exactly one
//!    `PropertyChanged` on the container.
//! 3. The merged schema performs no name de-duplication: a container
//!    property and a contained property with the same name both appear,
//!    each resolvable to its own owner.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use rebind::container::Container;
//! use rebind::notify::Notify;
//! # use std::any::Any;
//! # use std::cell::RefCell;
//! # use rebind::notify::ChangeNotifier;
//! # use rebind::schema::{Introspect, NativeProperty, PropertyAttrs, Schema, SchemaBuilder};
//! # struct Contact { notifier: ChangeNotifier, name: RefCell<String> }
//! # impl Contact {
//! #     fn new() -> Rc<Self> {
//! #         Rc::new(Self { notifier: ChangeNotifier::new(), name: RefCell::new(String::new()) })
//! #     }
//! #     fn set_name(&self, v: &str) { self.notifier.set_and_notify(&self.name, v.to_string(), "name"); }
//! # }
//! # impl Notify for Contact { fn notifier(&self) -> &ChangeNotifier { &self.notifier } }
//! # impl Introspect for Contact {
//! #     fn native_schema(&self, filter: Option<PropertyAttrs>) -> Schema {
//! #         SchemaBuilder::new(filter)
//! #             .push(NativeProperty::read_write(
//! #                 "name",
//! #                 |c: &Contact| c.name.borrow().clone(),
//! #                 |c: &Contact, v: String| { c.notifier.set_and_notify(&c.name, v, "name"); },
//! #             ).shared())
//! #             .finish()
//! #     }
//! #     fn as_any(&self) -> &dyn Any { self }
//! # }
//! let contact = Contact::new();
//! let container = Container::new(Rc::clone(&contact));
//!
//! let _sub = container.notifier().subscribe(|name| println!("forwarded: {name}"));
//! contact.set_name("Ada"); // prints "forwarded: name"
//!
//! let schema = container.merged_schema(None);
//! assert!(schema.contains("name"));
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::event::Subscription;
use crate::notify::{ChangeNotifier, Notify};
use crate::schema::{
    Introspect, NativeProperty, PropertyAttrs, PropertyDescriptor, ProxiedProperty, Schema,
    SchemaBuilder,
};

/// The concrete object a descriptor's operations act on.
///
/// Answer to [`Container::property_owner`]: a binding consumer holding a
/// descriptor from a merged schema uses this to pick its get/set target
/// without reasoning about wrapping.
#[derive(Debug)]
pub enum PropertyOwner<T> {
    /// The property lives on the contained object.
    Contained(Rc<T>),
    /// The property is the container's own.
    Host,
}

/// Wraps a change-notifying object, forwarding its events and merging its
/// property schema into the container's.
///
/// The contained object is held as `Rc<T>` — binding consumers routinely
/// share it — and is replaceable via [`set_inner`](Self::set_inner). A
/// container never holds "nothing": construction requires an object and
/// every swap installs one.
pub struct Container<T: Introspect + 'static> {
    notifier: ChangeNotifier,
    slot: Rc<RefCell<Rc<T>>>,
    forward: RefCell<Option<Subscription>>,
}

impl<T: Introspect + 'static> Container<T> {
    /// Wrap `inner`, subscribing to its change events.
    #[must_use]
    pub fn new(inner: Rc<T>) -> Self {
        let container = Self {
            notifier: ChangeNotifier::new(),
            slot: Rc::new(RefCell::new(inner)),
            forward: RefCell::new(None),
        };
        container.attach_forwarding();
        container
    }

    /// The contained object, by handle clone (no copy of `T`).
    ///
    /// This is the explicit unwrap accessor: anywhere an `Rc<T>` is wanted,
    /// `container.inner()` yields the contained one.
    #[must_use]
    pub fn inner(&self) -> Rc<T> {
        Rc::clone(&self.slot.borrow())
    }

    /// Replace the contained object.
    ///
    /// Drops the forwarding subscription to the old object first, assigns
    /// the handle through change detection (identity equality — a distinct
    /// allocation counts as a change and raises `PropertyChanged("inner")`),
    /// then subscribes to the new object. Returns whether the handle
    /// changed.
    pub fn set_inner(&self, inner: Rc<T>) -> bool {
        self.forward.borrow_mut().take();
        #[cfg(feature = "tracing")]
        tracing::trace!("container inner swap");
        let changed =
            self.notifier
                .set_and_notify_with(&self.slot, inner, "inner", |current, new| {
                    !Rc::ptr_eq(current, new)
                });
        self.attach_forwarding();
        changed
    }

    /// Own schema ∪ proxied wrappers over the contained object's schema.
    ///
    /// `filter` is forwarded unchanged to both queries. Wrapper descriptors
    /// copy name, type, and attrs from the contained object's descriptors
    /// and redirect all access operations to the contained object. Same-name
    /// entries are kept as distinct descriptors; ownership stays resolvable
    /// per descriptor via [`property_owner`](Self::property_owner).
    #[must_use]
    pub fn merged_schema(&self, filter: Option<PropertyAttrs>) -> Schema {
        let mut builder = SchemaBuilder::new(None).merge(self.native_schema(filter));
        for descriptor in &self.inner().schema(filter) {
            builder = builder.push(Rc::new(ProxiedProperty::new(
                Rc::clone(descriptor),
                Rc::downgrade(&self.slot),
            )));
        }
        builder.finish()
    }

    /// Which object a descriptor's operations act on: the contained object
    /// for generated wrapper descriptors, the container itself otherwise.
    #[must_use]
    pub fn property_owner(&self, descriptor: &dyn PropertyDescriptor) -> PropertyOwner<T> {
        if descriptor.as_any().is::<ProxiedProperty<T>>() {
            PropertyOwner::Contained(self.inner())
        } else {
            PropertyOwner::Host
        }
    }

    fn attach_forwarding(&self) {
        let forward = self.notifier.clone();
        let subscription = self
            .slot
            .borrow()
            .notifier()
            .subscribe(move |name| forward.notify(name));
        *self.forward.borrow_mut() = Some(subscription);
    }
}

impl<T: Introspect + 'static> Notify for Container<T> {
    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}

impl<T: Introspect + 'static> Introspect for Container<T> {
    /// The container's own single property: `"inner"`, the contained
    /// object's handle. Hidden from browsable enumeration and never
    /// serialized — consumers bind against the merged view, not the handle.
    fn native_schema(&self, filter: Option<PropertyAttrs>) -> Schema {
        SchemaBuilder::new(filter)
            .push(
                NativeProperty::read_write(
                    "inner",
                    |container: &Self| container.inner(),
                    |container: &Self, value: Rc<T>| {
                        container.set_inner(value);
                    },
                )
                .hidden()
                .no_serialize()
                .shared(),
            )
            .finish()
    }

    fn schema(&self, filter: Option<PropertyAttrs>) -> Schema {
        self.merged_schema(filter)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Introspect + 'static> std::fmt::Debug for Container<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("inner_type", &std::any::type_name::<T>())
            .finish()
    }
}

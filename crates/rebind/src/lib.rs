#![forbid(unsafe_code)]

//! Property-change notification, composite property schemas, and
//! freeze-batched observable collections.
//!
//! This crate is the binding-layer core that sits between plain data types
//! and whatever consumes their changes — a UI binder, a view model, a sync
//! layer. It provides three building blocks:
//!
//! - [`ChangeNotifier`]: gives any entity a `PropertyChanged(name)` event
//!   stream and store-and-notify setters that fire only on real changes.
//! - [`Container`]: wraps another notifying object, forwards its change
//!   events, and presents a merged property schema — the container's own
//!   properties plus proxied wrappers over the contained object's — with
//!   per-descriptor ownership resolution.
//! - [`ObservableVec`]: an ordered sequence announcing every structural
//!   mutation, with a nestable notification freeze that coalesces bulk
//!   mutations into a single trailing [`ListChange::Reset`].
//!
//! Because Rust has no runtime reflection, the property-metadata capability
//! is an explicit contract: entities implement [`Introspect`] to publish a
//! [`Schema`] of [`PropertyDescriptor`]s built from typed closures (see
//! [`NativeProperty`]).
//!
//! # Architecture
//!
//! Everything is single-threaded and synchronous: `Rc<RefCell<..>>`/`Cell`
//! for shared ownership, callbacks invoked inline in registration order, no
//! suspension points. Listener registries dispatch over a snapshot, so
//! subscribing or unsubscribing from inside a callback is safe. Types are
//! intentionally `!Send`/`!Sync`.
//!
//! # Feature Flags
//!
//! - `tracing`: emit trace events from notification internals (inner swaps,
//!   coalesced flushes, subscription churn).

pub mod collection;
pub mod container;
pub mod event;
pub mod notify;
pub mod schema;

pub use collection::{FreezeGuard, ListChange, ObservableVec, UnfreezeError};
pub use container::{Container, PropertyOwner};
pub use event::{Listeners, Subscription, SubscriptionSet};
pub use notify::{ChangeNotifier, Notify};
pub use schema::{
    Introspect, NativeProperty, PropertyAttrs, PropertyDescriptor, PropertyError,
    ProxiedProperty, Schema, SchemaBuilder, Value,
};

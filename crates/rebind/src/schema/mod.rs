#![forbid(unsafe_code)]

//! Property metadata: descriptors, attribute flags, and schemas.
//!
//! Rust has no runtime reflection, so the "ask any object for its named,
//! typed, attributed properties" capability is an explicit contract here:
//!
//! - [`PropertyDescriptor`]: one named, typed property with type-erased
//!   get/set/reset/should-serialize operations. Two variants exist —
//!   [`NativeProperty`] (typed closures over a concrete owner) and
//!   [`ProxiedProperty`] (redirects through a container to its contained
//!   object).
//! - [`PropertyAttrs`]: bitflag attributes standing in for attribute
//!   collections (browsability, read-only, serialization opt-out).
//! - [`Schema`] / [`SchemaBuilder`]: ordered descriptor collections and the
//!   filtering union used to compose them.
//! - [`Introspect`]: the trait an entity implements to publish its schema.
//!
//! # Invariants
//!
//! 1. A schema preserves descriptor insertion order.
//! 2. [`SchemaBuilder`] admits a descriptor iff its attrs contain every bit
//!    of the builder's filter (no filter admits everything).
//! 3. [`Introspect::native_schema`] never consults merge logic; it is the
//!    recursion-safe query a composite entity uses on itself.
//! 4. A merged schema may carry two descriptors with the same name (one
//!    native, one proxied); [`Schema::get`] returns the first match.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Wrong target | descriptor applied to a foreign object | [`PropertyError::WrongTarget`] |
//! | Value type mismatch | `set` with the wrong payload type | [`PropertyError::TypeMismatch`] |
//! | Write to read-only | no setter on the descriptor | [`PropertyError::ReadOnly`] |
//! | Reset unsupported | no reset closure on the descriptor | [`PropertyError::NoReset`] |
//! | Stale proxy | proxied descriptor outlived its container | [`PropertyError::Detached`] |

mod descriptor;

pub use descriptor::{NativeProperty, PropertyDescriptor, ProxiedProperty};

use std::any::Any;
use std::rc::Rc;

use crate::notify::Notify;

/// Type-erased property value, as produced and consumed by descriptors.
pub type Value = Box<dyn Any>;

bitflags::bitflags! {
    /// Attribute flags attached to a property descriptor.
    ///
    /// These stand in for the attribute collections a reflective host would
    /// carry: visibility to enumerating consumers, mutability, and whether
    /// the property participates in serialization.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PropertyAttrs: u8 {
        /// Visible to enumerating consumers (property grids, binders).
        const BROWSABLE = 1 << 0;
        /// The property rejects writes.
        const READ_ONLY = 1 << 1;
        /// The property never reports itself as worth serializing.
        const NO_SERIALIZE = 1 << 2;
    }
}

impl Default for PropertyAttrs {
    fn default() -> Self {
        Self::BROWSABLE
    }
}

impl PropertyAttrs {
    /// Whether these attrs pass `filter`: no filter admits everything,
    /// otherwise every filter bit must be present.
    #[must_use]
    pub fn admitted_by(self, filter: Option<PropertyAttrs>) -> bool {
        filter.is_none_or(|required| self.contains(required))
    }
}

/// Errors from descriptor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// The target object is not the type this descriptor was declared for.
    WrongTarget {
        /// Name of the property whose access failed.
        property: String,
    },
    /// The supplied value is not of the property's declared type.
    TypeMismatch {
        /// Name of the property whose access failed.
        property: String,
        /// The declared value type.
        expected: &'static str,
    },
    /// The property has no setter.
    ReadOnly {
        /// Name of the property whose access failed.
        property: String,
    },
    /// The property does not support resetting to a default.
    NoReset {
        /// Name of the property whose access failed.
        property: String,
    },
    /// A proxied descriptor outlived the container it was generated from.
    Detached {
        /// Name of the property whose access failed.
        property: String,
    },
}

impl std::fmt::Display for PropertyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongTarget { property } => {
                write!(f, "property '{property}' applied to a foreign target")
            }
            Self::TypeMismatch { property, expected } => {
                write!(f, "property '{property}' expects a value of type {expected}")
            }
            Self::ReadOnly { property } => write!(f, "property '{property}' is read-only"),
            Self::NoReset { property } => {
                write!(f, "property '{property}' does not support reset")
            }
            Self::Detached { property } => write!(
                f,
                "property '{property}' is detached from its originating container"
            ),
        }
    }
}

impl std::error::Error for PropertyError {}

/// An ordered collection of property descriptors.
///
/// Produced by [`SchemaBuilder`] and by [`Introspect`] queries. Names are
/// unique within one entity's native schema, but a merged schema keeps
/// same-name native and proxied entries as distinct descriptors.
#[derive(Clone, Default)]
pub struct Schema {
    entries: Vec<Rc<dyn PropertyDescriptor>>,
}

impl Schema {
    /// The empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the schema has no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First descriptor with the given name, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<dyn PropertyDescriptor>> {
        self.entries.iter().find(|pd| pd.name() == name)
    }

    /// Whether any descriptor has the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Descriptor names in schema order (duplicates preserved).
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|pd| pd.name()).collect()
    }

    /// Iterate descriptors in schema order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rc<dyn PropertyDescriptor>> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Rc<dyn PropertyDescriptor>;
    type IntoIter = std::slice::Iter<'a, Rc<dyn PropertyDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Composes descriptor collections under an attribute filter.
///
/// The filter is applied at insertion: descriptors whose attrs do not pass
/// are dropped silently. This is the union operation a composite entity uses
/// to merge its own schema with wrappers over a contained object's schema.
#[must_use]
pub struct SchemaBuilder {
    filter: Option<PropertyAttrs>,
    entries: Vec<Rc<dyn PropertyDescriptor>>,
}

impl SchemaBuilder {
    /// Start a schema under an optional attribute filter.
    pub fn new(filter: Option<PropertyAttrs>) -> Self {
        Self {
            filter,
            entries: Vec::new(),
        }
    }

    /// Add one descriptor, subject to the filter.
    pub fn push(mut self, descriptor: Rc<dyn PropertyDescriptor>) -> Self {
        if descriptor.attrs().admitted_by(self.filter) {
            self.entries.push(descriptor);
        }
        self
    }

    /// Union a pre-built schema, re-filtering each entry.
    pub fn merge(mut self, schema: Schema) -> Self {
        for descriptor in schema.entries {
            if descriptor.attrs().admitted_by(self.filter) {
                self.entries.push(descriptor);
            }
        }
        self
    }

    /// Finish the schema.
    pub fn finish(self) -> Schema {
        Schema {
            entries: self.entries,
        }
    }
}

/// The metadata capability: an entity that can enumerate its properties.
///
/// `native_schema` answers with the entity's own declared properties only —
/// it must never invoke schema-composition logic, so a composite entity can
/// query itself without recursing. `schema` is the full, possibly merged
/// view consumers see; the default forwards to `native_schema`.
pub trait Introspect: Notify {
    /// The entity's own declared properties, in declaration order.
    fn native_schema(&self, filter: Option<PropertyAttrs>) -> Schema;

    /// The schema presented to enumerating consumers.
    fn schema(&self, filter: Option<PropertyAttrs>) -> Schema {
        self.native_schema(filter)
    }

    /// The entity as `Any`, for descriptor target resolution.
    fn as_any(&self) -> &dyn Any;
}

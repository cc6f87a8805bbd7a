#![forbid(unsafe_code)]

//! The two property-descriptor variants.
//!
//! [`NativeProperty`] describes a property an entity declares itself: typed
//! getter/setter closures over a concrete owner type, invoked through a
//! type-erased `&dyn Any` target so one descriptor serves every instance of
//! the owner.
//!
//! [`ProxiedProperty`] is the wrapper a [`Container`] generates for each
//! property of its contained object: name, type, and attrs are delegated
//! verbatim to the source descriptor, while get/set/reset/should-serialize
//! are redirected to whatever object the container holds *at access time*.
//! The proxy holds the container's inner slot weakly; once the container is
//! gone the proxy reports [`PropertyError::Detached`].
//!
//! [`Container`]: crate::container::Container

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::{Introspect, PropertyAttrs, PropertyError, Value};

/// One named, typed property with type-erased access operations.
///
/// Used as `Rc<dyn PropertyDescriptor>` throughout; the typed entry points
/// are [`get_as`](PropertyDescriptor::get_as) and
/// [`set_to`](PropertyDescriptor::set_to) on the trait object.
pub trait PropertyDescriptor {
    /// Property name.
    fn name(&self) -> &str;

    /// `TypeId` of the property's value type.
    fn value_type(&self) -> TypeId;

    /// Human-readable name of the value type.
    fn type_name(&self) -> &'static str;

    /// Attribute flags.
    fn attrs(&self) -> PropertyAttrs;

    /// Whether the property rejects writes.
    fn is_read_only(&self) -> bool {
        self.attrs().contains(PropertyAttrs::READ_ONLY)
    }

    /// Read the property from `target`.
    fn get(&self, target: &dyn Any) -> Result<Value, PropertyError>;

    /// Write `value` to the property on `target`.
    fn set(&self, target: &dyn Any, value: Value) -> Result<(), PropertyError>;

    /// Restore the property on `target` to its declared default.
    fn reset(&self, target: &dyn Any) -> Result<(), PropertyError>;

    /// Whether the property's current value on `target` is worth persisting.
    ///
    /// Returns `false` for unreachable targets rather than failing: the
    /// question is advisory.
    fn should_serialize(&self, target: &dyn Any) -> bool;

    /// The descriptor as `Any`, for variant inspection (ownership
    /// resolution downcasts on this).
    fn as_any(&self) -> &dyn Any;
}

impl dyn PropertyDescriptor {
    /// Typed read: [`get`](PropertyDescriptor::get) plus a downcast to `V`.
    pub fn get_as<V: 'static>(&self, target: &dyn Any) -> Result<V, PropertyError> {
        self.get(target)?
            .downcast::<V>()
            .map(|boxed| *boxed)
            .map_err(|_| PropertyError::TypeMismatch {
                property: self.name().to_string(),
                expected: self.type_name(),
            })
    }

    /// Typed write: boxes `value` and calls [`set`](PropertyDescriptor::set).
    pub fn set_to<V: 'static>(&self, target: &dyn Any, value: V) -> Result<(), PropertyError> {
        self.set(target, Box::new(value))
    }
}

impl std::fmt::Debug for dyn PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name())
            .field("type", &self.type_name())
            .field("attrs", &self.attrs())
            .finish()
    }
}

/// A property declared natively by an entity of type `O`.
///
/// Built from typed closures; the owner arrives as `&dyn Any` and is
/// downcast, so the descriptor itself is reusable across instances of `O`.
/// Setters take `&O` — owners use interior mutability (the same shape their
/// notifying setters already have).
///
/// ```
/// # use std::cell::RefCell;
/// # use rebind::notify::ChangeNotifier;
/// # use rebind::schema::{NativeProperty, PropertyDescriptor};
/// struct Contact {
///     notifier: ChangeNotifier,
///     name: RefCell<String>,
/// }
///
/// let pd = NativeProperty::read_write(
///     "name",
///     |c: &Contact| c.name.borrow().clone(),
///     |c: &Contact, v: String| {
///         c.notifier.set_and_notify(&c.name, v, "name");
///     },
/// )
/// .shared();
/// assert_eq!(pd.name(), "name");
/// ```
pub struct NativeProperty<O, V> {
    name: &'static str,
    attrs: PropertyAttrs,
    get: Rc<dyn Fn(&O) -> V>,
    set: Option<Rc<dyn Fn(&O, V)>>,
    reset: Option<Rc<dyn Fn(&O)>>,
    serialize_when: Option<Rc<dyn Fn(&O) -> bool>>,
}

impl<O: 'static, V: 'static> NativeProperty<O, V> {
    /// A readable, writable property. Attrs default to `BROWSABLE`.
    pub fn read_write(
        name: &'static str,
        get: impl Fn(&O) -> V + 'static,
        set: impl Fn(&O, V) + 'static,
    ) -> Self {
        Self {
            name,
            attrs: PropertyAttrs::BROWSABLE,
            get: Rc::new(get),
            set: Some(Rc::new(set)),
            reset: None,
            serialize_when: None,
        }
    }

    /// A read-only property. Attrs default to `BROWSABLE | READ_ONLY`.
    pub fn read_only(name: &'static str, get: impl Fn(&O) -> V + 'static) -> Self {
        Self {
            name,
            attrs: PropertyAttrs::BROWSABLE | PropertyAttrs::READ_ONLY,
            get: Rc::new(get),
            set: None,
            reset: None,
            serialize_when: None,
        }
    }

    /// Hide the property from filtered (browsable-only) enumeration.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.attrs.remove(PropertyAttrs::BROWSABLE);
        self
    }

    /// Mark the property as never worth serializing.
    #[must_use]
    pub fn no_serialize(mut self) -> Self {
        self.attrs.insert(PropertyAttrs::NO_SERIALIZE);
        self
    }

    /// Attach a reset operation restoring the declared default.
    #[must_use]
    pub fn with_reset(mut self, reset: impl Fn(&O) + 'static) -> Self {
        self.reset = Some(Rc::new(reset));
        self
    }

    /// Attach a should-serialize predicate (default: always serialize).
    #[must_use]
    pub fn serialize_when(mut self, predicate: impl Fn(&O) -> bool + 'static) -> Self {
        self.serialize_when = Some(Rc::new(predicate));
        self
    }

    /// Finish as a shareable trait object.
    #[must_use]
    pub fn shared(self) -> Rc<dyn PropertyDescriptor> {
        Rc::new(self)
    }

    fn owner<'a>(&self, target: &'a dyn Any) -> Result<&'a O, PropertyError> {
        target
            .downcast_ref::<O>()
            .ok_or_else(|| PropertyError::WrongTarget {
                property: self.name.to_string(),
            })
    }
}

impl<O: 'static, V: 'static> PropertyDescriptor for NativeProperty<O, V> {
    fn name(&self) -> &str {
        self.name
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<V>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<V>()
    }

    fn attrs(&self) -> PropertyAttrs {
        self.attrs
    }

    fn get(&self, target: &dyn Any) -> Result<Value, PropertyError> {
        let owner = self.owner(target)?;
        Ok(Box::new((self.get)(owner)))
    }

    fn set(&self, target: &dyn Any, value: Value) -> Result<(), PropertyError> {
        let owner = self.owner(target)?;
        let Some(set) = &self.set else {
            return Err(PropertyError::ReadOnly {
                property: self.name.to_string(),
            });
        };
        let value = value
            .downcast::<V>()
            .map_err(|_| PropertyError::TypeMismatch {
                property: self.name.to_string(),
                expected: self.type_name(),
            })?;
        set(owner, *value);
        Ok(())
    }

    fn reset(&self, target: &dyn Any) -> Result<(), PropertyError> {
        let owner = self.owner(target)?;
        let Some(reset) = &self.reset else {
            return Err(PropertyError::NoReset {
                property: self.name.to_string(),
            });
        };
        reset(owner);
        Ok(())
    }

    fn should_serialize(&self, target: &dyn Any) -> bool {
        if self.attrs.contains(PropertyAttrs::NO_SERIALIZE) {
            return false;
        }
        match self.owner(target) {
            Ok(owner) => self
                .serialize_when
                .as_ref()
                .is_none_or(|predicate| predicate(owner)),
            Err(_) => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A wrapper descriptor redirecting access to a container's contained object.
///
/// Generated by [`Container::merged_schema`]; not normally constructed by
/// hand. Name, value type, attrs, and read-only status come verbatim from
/// the source descriptor. Access operations resolve the *current* contained
/// object through the container's inner slot — a proxy created before an
/// inner swap reads the post-swap object. The `target` argument is not
/// consulted.
///
/// [`Container::merged_schema`]: crate::container::Container::merged_schema
pub struct ProxiedProperty<T> {
    source: Rc<dyn PropertyDescriptor>,
    slot: Weak<RefCell<Rc<T>>>,
}

impl<T: Introspect + 'static> ProxiedProperty<T> {
    /// Wrap `source`, redirecting its operations through `slot`.
    #[must_use]
    pub fn new(source: Rc<dyn PropertyDescriptor>, slot: Weak<RefCell<Rc<T>>>) -> Self {
        Self { source, slot }
    }

    fn contained(&self) -> Result<Rc<T>, PropertyError> {
        self.slot
            .upgrade()
            .map(|slot| Rc::clone(&slot.borrow()))
            .ok_or_else(|| PropertyError::Detached {
                property: self.source.name().to_string(),
            })
    }
}

impl<T: Introspect + 'static> PropertyDescriptor for ProxiedProperty<T> {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn value_type(&self) -> TypeId {
        self.source.value_type()
    }

    fn type_name(&self) -> &'static str {
        self.source.type_name()
    }

    fn attrs(&self) -> PropertyAttrs {
        self.source.attrs()
    }

    fn get(&self, _target: &dyn Any) -> Result<Value, PropertyError> {
        let inner = self.contained()?;
        self.source.get(inner.as_any())
    }

    fn set(&self, _target: &dyn Any, value: Value) -> Result<(), PropertyError> {
        let inner = self.contained()?;
        self.source.set(inner.as_any(), value)
    }

    fn reset(&self, _target: &dyn Any) -> Result<(), PropertyError> {
        let inner = self.contained()?;
        self.source.reset(inner.as_any())
    }

    fn should_serialize(&self, _target: &dyn Any) -> bool {
        match self.contained() {
            Ok(inner) => self.source.should_serialize(inner.as_any()),
            Err(_) => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ChangeNotifier, Notify};
    use crate::schema::{Schema, SchemaBuilder};

    struct Record {
        notifier: ChangeNotifier,
        id: RefCell<i64>,
        name: RefCell<String>,
    }

    impl Record {
        fn new(id: i64, name: &str) -> Rc<Self> {
            Rc::new(Self {
                notifier: ChangeNotifier::new(),
                id: RefCell::new(id),
                name: RefCell::new(name.to_string()),
            })
        }

        fn set_name(&self, value: String) -> bool {
            self.notifier.set_and_notify(&self.name, value, "name")
        }
    }

    impl Notify for Record {
        fn notifier(&self) -> &ChangeNotifier {
            &self.notifier
        }
    }

    impl Introspect for Record {
        fn native_schema(&self, filter: Option<PropertyAttrs>) -> Schema {
            SchemaBuilder::new(filter)
                .push(
                    NativeProperty::read_only("id", |r: &Record| *r.id.borrow())
                        .shared(),
                )
                .push(
                    NativeProperty::read_write(
                        "name",
                        |r: &Record| r.name.borrow().clone(),
                        |r: &Record, v: String| {
                            r.set_name(v);
                        },
                    )
                    .with_reset(|r: &Record| {
                        r.set_name(String::new());
                    })
                    .serialize_when(|r: &Record| !r.name.borrow().is_empty())
                    .shared(),
                )
                .finish()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn name_descriptor(record: &Record) -> Rc<dyn PropertyDescriptor> {
        Rc::clone(record.native_schema(None).get("name").unwrap())
    }

    #[test]
    fn native_get_and_set_round_trip() {
        let record = Record::new(1, "a");
        let pd = name_descriptor(&record);

        assert_eq!(pd.get_as::<String>(record.as_any()).unwrap(), "a");
        pd.set_to(record.as_any(), "b".to_string()).unwrap();
        assert_eq!(*record.name.borrow(), "b");
    }

    #[test]
    fn native_setter_goes_through_change_notification() {
        let record = Record::new(1, "a");
        let pd = name_descriptor(&record);

        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        let _sub = record
            .notifier()
            .subscribe(move |name| sink.borrow_mut().push(name.to_string()));

        pd.set_to(record.as_any(), "b".to_string()).unwrap();
        assert_eq!(*fired.borrow(), vec!["name".to_string()]);
    }

    #[test]
    fn native_metadata_is_declared() {
        let record = Record::new(1, "a");
        let schema = record.native_schema(None);

        let id = schema.get("id").unwrap();
        assert!(id.is_read_only());
        assert_eq!(id.value_type(), TypeId::of::<i64>());

        let name = schema.get("name").unwrap();
        assert!(!name.is_read_only());
        assert_eq!(name.value_type(), TypeId::of::<String>());
        assert!(name.type_name().contains("String"));
    }

    #[test]
    fn set_on_read_only_is_rejected() {
        let record = Record::new(1, "a");
        let schema = record.native_schema(None);
        let id = Rc::clone(schema.get("id").unwrap());

        let err = id.set_to(record.as_any(), 2_i64).unwrap_err();
        assert_eq!(
            err,
            PropertyError::ReadOnly {
                property: "id".into()
            }
        );
        assert_eq!(*record.id.borrow(), 1);
    }

    #[test]
    fn set_with_wrong_value_type_is_rejected() {
        let record = Record::new(1, "a");
        let pd = name_descriptor(&record);

        let err = pd.set_to(record.as_any(), 42_u32).unwrap_err();
        assert!(matches!(err, PropertyError::TypeMismatch { .. }));
        assert_eq!(*record.name.borrow(), "a", "failed set must not write");
    }

    #[test]
    fn foreign_target_is_rejected() {
        let record = Record::new(1, "a");
        let pd = name_descriptor(&record);

        let not_a_record = 5_u8;
        let err = pd.get(&not_a_record).unwrap_err();
        assert_eq!(
            err,
            PropertyError::WrongTarget {
                property: "name".into()
            }
        );
    }

    #[test]
    fn reset_restores_default_and_missing_reset_errors() {
        let record = Record::new(1, "a");
        let schema = record.native_schema(None);

        let name = Rc::clone(schema.get("name").unwrap());
        name.reset(record.as_any()).unwrap();
        assert_eq!(*record.name.borrow(), "");

        let id = Rc::clone(schema.get("id").unwrap());
        let err = id.reset(record.as_any()).unwrap_err();
        assert_eq!(
            err,
            PropertyError::NoReset {
                property: "id".into()
            }
        );
    }

    #[test]
    fn should_serialize_follows_predicate_and_attrs() {
        let record = Record::new(1, "a");
        let schema = record.native_schema(None);

        let name = schema.get("name").unwrap();
        assert!(name.should_serialize(record.as_any()));
        record.set_name(String::new());
        assert!(!name.should_serialize(record.as_any()));

        // No predicate: defaults to true.
        let id = schema.get("id").unwrap();
        assert!(id.should_serialize(record.as_any()));

        let hidden = NativeProperty::read_only("id", |r: &Record| *r.id.borrow())
            .no_serialize()
            .shared();
        assert!(!hidden.should_serialize(record.as_any()));
    }

    #[test]
    fn builder_filters_on_push_and_merge() {
        let record = Record::new(1, "a");
        let full = record.native_schema(None);
        assert_eq!(full.names(), vec!["id", "name"]);

        // READ_ONLY filter admits only "id".
        let filtered = record.native_schema(Some(PropertyAttrs::READ_ONLY));
        assert_eq!(filtered.names(), vec!["id"]);

        let merged = SchemaBuilder::new(Some(PropertyAttrs::READ_ONLY))
            .merge(full)
            .finish();
        assert_eq!(merged.names(), vec!["id"]);
    }

    #[test]
    fn proxy_redirects_to_current_slot_occupant() {
        let first = Record::new(1, "first");
        let slot = Rc::new(RefCell::new(Rc::clone(&first)));
        let proxy: Rc<dyn PropertyDescriptor> = Rc::new(ProxiedProperty::new(
            name_descriptor(&first),
            Rc::downgrade(&slot),
        ));

        // Target argument is not consulted; pass an unrelated value.
        let target = ();
        assert_eq!(proxy.get_as::<String>(&target).unwrap(), "first");

        proxy.set_to(&target, "renamed".to_string()).unwrap();
        assert_eq!(*first.name.borrow(), "renamed");

        // Swap the slot occupant: the proxy follows.
        *slot.borrow_mut() = Record::new(2, "second");
        assert_eq!(proxy.get_as::<String>(&target).unwrap(), "second");
        assert_eq!(*first.name.borrow(), "renamed", "old object untouched");
    }

    #[test]
    fn proxy_preserves_source_metadata() {
        let record = Record::new(1, "a");
        let slot = Rc::new(RefCell::new(Rc::clone(&record)));
        let source = name_descriptor(&record);
        let proxy = ProxiedProperty::new(Rc::clone(&source), Rc::downgrade(&slot));

        assert_eq!(proxy.name(), source.name());
        assert_eq!(proxy.value_type(), source.value_type());
        assert_eq!(proxy.type_name(), source.type_name());
        assert_eq!(proxy.attrs(), source.attrs());
        assert_eq!(proxy.is_read_only(), source.is_read_only());
    }

    #[test]
    fn detached_proxy_reports_error() {
        let record = Record::new(1, "a");
        let proxy = {
            let slot = Rc::new(RefCell::new(Rc::clone(&record)));
            ProxiedProperty::new(name_descriptor(&record), Rc::downgrade(&slot))
            // Slot dropped here.
        };

        let err = proxy.get(&()).unwrap_err();
        assert_eq!(
            err,
            PropertyError::Detached {
                property: "name".into()
            }
        );
        assert!(!proxy.should_serialize(&()));
    }
}

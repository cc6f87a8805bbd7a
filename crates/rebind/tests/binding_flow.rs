//! Cross-module flows: a notifying entity wrapped in a container, consumed
//! through the merged schema, and a bulk-loaded observable sequence.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;
use rebind::{
    ChangeNotifier, Container, Introspect, ListChange, NativeProperty, Notify, ObservableVec,
    PropertyAttrs, PropertyOwner, Schema, SchemaBuilder, UnfreezeError,
};

// ── Fixture: a plain notifying entity ───────────────────────────────

struct Record {
    notifier: ChangeNotifier,
    id: RefCell<i64>,
    name: RefCell<String>,
}

impl Record {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            notifier: ChangeNotifier::new(),
            id: RefCell::new(0),
            name: RefCell::new(String::new()),
        })
    }

    fn set_id(&self, value: i64) -> bool {
        self.notifier.set_and_notify(&self.id, value, "id")
    }

    fn set_name(&self, value: impl Into<String>) -> bool {
        self.notifier.set_and_notify(&self.name, value.into(), "name")
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
                NativeProperty::read_write(
                    "id",
                    |r: &Record| *r.id.borrow(),
                    |r: &Record, v: i64| {
                        r.set_id(v);
                    },
                )
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
                .shared(),
            )
            .finish()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ── Fixture: a wrapper entity adding its own property ───────────────
//
// The composition analog of subclassing a container: shares the container's
// notifier so both native and forwarded changes arrive on one stream, and
// unions its own schema with the container's merged one.

struct Tagged {
    base: Container<Record>,
    pinned: RefCell<bool>,
}

impl Tagged {
    fn new(record: Rc<Record>) -> Self {
        Self {
            base: Container::new(record),
            pinned: RefCell::new(false),
        }
    }

    fn set_pinned(&self, value: bool) -> bool {
        self.base
            .notifier()
            .set_and_notify(&self.pinned, value, "pinned")
    }
}

impl Notify for Tagged {
    fn notifier(&self) -> &ChangeNotifier {
        self.base.notifier()
    }
}

impl Introspect for Tagged {
    fn native_schema(&self, filter: Option<PropertyAttrs>) -> Schema {
        SchemaBuilder::new(filter)
            .push(
                NativeProperty::read_write(
                    "pinned",
                    |t: &Tagged| *t.pinned.borrow(),
                    |t: &Tagged, v: bool| {
                        t.set_pinned(v);
                    },
                )
                .shared(),
            )
            .finish()
    }

    fn schema(&self, filter: Option<PropertyAttrs>) -> Schema {
        SchemaBuilder::new(None)
            .merge(self.native_schema(filter))
            .merge(self.base.merged_schema(filter))
            .finish()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn record_names(notifier: &ChangeNotifier) -> (Rc<RefCell<Vec<String>>>, rebind::Subscription) {
    let names = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&names);
    let sub = notifier.subscribe(move |name| sink.borrow_mut().push(name.to_string()));
    (names, sub)
}

// ── Container flows ─────────────────────────────────────────────────

#[test]
fn no_extra_browsable_properties_added_by_wrapping() {
    let record = Record::new();
    let container = Container::new(Rc::clone(&record));

    let filter = Some(PropertyAttrs::BROWSABLE);
    let record_props = record.schema(filter);
    let container_props = container.schema(filter);

    assert_eq!(container_props.len(), record_props.len());
    for descriptor in &record_props {
        let wrapped = container_props
            .get(descriptor.name())
            .unwrap_or_else(|| panic!("missing wrapper for '{}'", descriptor.name()));
        assert_eq!(wrapped.value_type(), descriptor.value_type());
        assert_eq!(wrapped.attrs(), descriptor.attrs());
    }
}

#[test]
fn contained_property_change_is_raised_on_container() {
    let record = Record::new();
    let container = Container::new(Rc::clone(&record));
    let (names, _sub) = record_names(container.notifier());

    record.set_name("raised on container");

    assert_eq!(*names.borrow(), vec!["name".to_string()]);
}

#[test]
fn unwrap_accessor_returns_the_constructed_object() {
    let record = Record::new();
    let container = Container::new(Rc::clone(&record));

    let unwrapped: Rc<Record> = container.inner();
    assert!(Rc::ptr_eq(&record, &unwrapped));
}

#[test]
fn property_owner_attribution_table() {
    let record = Record::new();
    let container = Container::new(Rc::clone(&record));
    let schema = container.merged_schema(None);

    for contained_property in ["id", "name"] {
        let descriptor = schema.get(contained_property).unwrap();
        match container.property_owner(descriptor.as_ref()) {
            PropertyOwner::Contained(owner) => assert!(
                Rc::ptr_eq(&owner, &record),
                "'{contained_property}' attributed to the wrong object"
            ),
            PropertyOwner::Host => {
                panic!("'{contained_property}' attributed to the container")
            }
        }
    }

    let own = schema.get("inner").unwrap();
    assert!(matches!(
        container.property_owner(own.as_ref()),
        PropertyOwner::Host
    ));
}

#[test]
fn wrapper_entity_unions_both_schemas_on_one_event_stream() {
    let record = Record::new();
    let tagged = Tagged::new(Rc::clone(&record));
    let (names, _sub) = record_names(tagged.notifier());

    let schema = tagged.schema(Some(PropertyAttrs::BROWSABLE));
    assert_eq!(schema.names(), vec!["pinned", "id", "name"]);

    tagged.set_pinned(true);
    record.set_name("both streams");
    assert_eq!(
        *names.borrow(),
        vec!["pinned".to_string(), "name".to_string()]
    );

    // Own property is the host's; wrapped ones belong to the record.
    let pinned = schema.get("pinned").unwrap();
    assert!(matches!(
        tagged.base.property_owner(pinned.as_ref()),
        PropertyOwner::Host
    ));
    let name = schema.get("name").unwrap();
    assert!(matches!(
        tagged.base.property_owner(name.as_ref()),
        PropertyOwner::Contained(_)
    ));

    // Typed access through the wrapper's merged view.
    let pinned_value = pinned.get_as::<bool>(tagged.as_any()).unwrap();
    assert!(pinned_value);
    name.set_to(tagged.as_any(), "via wrapper".to_string())
        .unwrap();
    assert_eq!(*record.name.borrow(), "via wrapper");
}

#[test]
fn swap_then_mutate_old_object_stays_silent() {
    let first = Record::new();
    let second = Record::new();
    let container = Container::new(Rc::clone(&first));
    let (names, _sub) = record_names(container.notifier());

    container.set_inner(Rc::clone(&second));
    first.set_name("from the detached object");
    second.set_id(7);

    assert_eq!(*names.borrow(), vec!["inner".to_string(), "id".to_string()]);
}

// ── Observable sequence flows ───────────────────────────────────────

#[test]
fn frozen_bulk_load_yields_one_reset_and_all_data() {
    let list: ObservableVec<String> = ObservableVec::new();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let _sub = list.subscribe(move |change| sink.borrow_mut().push(*change));

    list.freeze();
    for i in 0..50 {
        list.push(format!("row {i}"));
    }
    list.unfreeze().unwrap();

    assert_eq!(*events.borrow(), vec![ListChange::Reset]);
    assert!(!list.changed_while_frozen());
    assert_eq!(list.len(), 50);
    assert_eq!(list.get(49).as_deref(), Some("row 49"));
}

#[test]
fn manual_flush_policy_reports_instead_of_emitting() {
    let list = ObservableVec::with_auto_flush(false);
    let events = Rc::new(Cell::new(0));
    let sink = Rc::clone(&events);
    let _sub = list.subscribe(move |_| sink.set(sink.get() + 1));

    list.freeze();
    list.push(1);
    list.unfreeze().unwrap();

    assert_eq!(events.get(), 0);
    assert!(list.changed_while_frozen());
}

#[test]
fn container_rows_loaded_into_a_frozen_list() {
    // The end-to-end shape this crate exists for: entities wrapped in
    // containers, bulk-loaded into an observable list behind one freeze.
    let list: ObservableVec<Rc<Container<Record>>> = ObservableVec::new();
    let events = Rc::new(Cell::new(0));
    let sink = Rc::clone(&events);
    let _sub = list.subscribe(move |_| sink.set(sink.get() + 1));

    {
        let _scope = list.frozen();
        for i in 0..10 {
            let record = Record::new();
            record.set_id(i);
            list.push(Rc::new(Container::new(record)));
        }
    }

    assert_eq!(events.get(), 1);
    assert_eq!(list.len(), 10);

    let row = list.get(3).unwrap();
    let schema = row.merged_schema(None);
    assert_eq!(
        schema
            .get("id")
            .unwrap()
            .get_as::<i64>(row.as_any())
            .unwrap(),
        3
    );
}

proptest! {
    #[test]
    fn unfreeze_imbalance_errors_on_exactly_the_extra_call(freezes in 5usize..=30) {
        let list: ObservableVec<u8> = ObservableVec::new();
        for _ in 0..freezes {
            list.freeze();
        }
        for call in 1..=freezes {
            prop_assert!(
                list.unfreeze().is_ok(),
                "premature imbalance at balanced call {call}"
            );
        }
        prop_assert_eq!(list.unfreeze(), Err(UnfreezeError));
        prop_assert_eq!(list.freeze_depth(), 0);
    }

    #[test]
    fn set_and_notify_fires_iff_value_differs(first in any::<i64>(), second in any::<i64>()) {
        let notifier = ChangeNotifier::new();
        let fired = Rc::new(Cell::new(0));
        let sink = Rc::clone(&fired);
        let _sub = notifier.subscribe(move |_| sink.set(sink.get() + 1));

        let slot = RefCell::new(first);
        let changed = notifier.set_and_notify(&slot, second, "value");

        prop_assert_eq!(changed, first != second);
        prop_assert_eq!(fired.get(), usize::from(first != second));
        prop_assert_eq!(*slot.borrow(), second);
    }
}

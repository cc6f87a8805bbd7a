//! End-to-end tour: a notifying entity, a container presenting a merged
//! schema, and a frozen bulk load into an observable list.
//!
//! Run with `cargo run --example contact_card`.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use rebind::{
    ChangeNotifier, Container, Introspect, NativeProperty, Notify, ObservableVec, PropertyAttrs,
    PropertyOwner, Schema, SchemaBuilder,
};

struct Contact {
    notifier: ChangeNotifier,
    name: RefCell<String>,
    email: RefCell<String>,
}

impl Contact {
    fn new(name: &str, email: &str) -> Rc<Self> {
        Rc::new(Self {
            notifier: ChangeNotifier::new(),
            name: RefCell::new(name.to_string()),
            email: RefCell::new(email.to_string()),
        })
    }

    fn set_name(&self, value: impl Into<String>) -> bool {
        self.notifier.set_and_notify(&self.name, value.into(), "name")
    }
}

impl Notify for Contact {
    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}

impl Introspect for Contact {
    fn native_schema(&self, filter: Option<PropertyAttrs>) -> Schema {
        SchemaBuilder::new(filter)
            .push(
                NativeProperty::read_write(
                    "name",
                    |c: &Contact| c.name.borrow().clone(),
                    |c: &Contact, v: String| {
                        c.set_name(v);
                    },
                )
                .shared(),
            )
            .push(
                NativeProperty::read_write(
                    "email",
                    |c: &Contact| c.email.borrow().clone(),
                    |c: &Contact, v: String| {
                        c.notifier.set_and_notify(&c.email, v, "email");
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

fn main() {
    // A container forwards the contact's change events and presents the
    // contact's properties as its own.
    let contact = Contact::new("Ada", "ada@example.net");
    let card = Container::new(Rc::clone(&contact));

    let _sub = card
        .notifier()
        .subscribe(|name| println!("  card saw change: {name}"));

    println!("mutating the contact directly:");
    contact.set_name("Ada Lovelace");

    println!("\nmerged schema (browsable view):");
    let schema = card.merged_schema(Some(PropertyAttrs::BROWSABLE));
    for descriptor in &schema {
        let owner = match card.property_owner(descriptor.as_ref()) {
            PropertyOwner::Contained(_) => "contact",
            PropertyOwner::Host => "card",
        };
        let value = descriptor
            .get_as::<String>(card.as_any())
            .unwrap_or_else(|_| "<unreadable>".into());
        println!("  {} = {value:?} (owner: {owner})", descriptor.name());
    }

    // Bulk-load a roster behind one freeze: listeners see a single Reset.
    let roster: ObservableVec<Rc<Container<Contact>>> = ObservableVec::new();
    let _roster_sub = roster.subscribe(|change| println!("  roster event: {change:?}"));

    println!("\nloading the roster frozen:");
    {
        let _scope = roster.frozen();
        for (name, email) in [
            ("Grace", "grace@example.net"),
            ("Edsger", "edsger@example.net"),
            ("Barbara", "barbara@example.net"),
        ] {
            roster.push(Rc::new(Container::new(Contact::new(name, email))));
        }
    }
    println!("roster holds {} cards", roster.len());
}

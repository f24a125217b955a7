//! Integration Tests for Reactive Objects
//!
//! These tests drive an invoice view model through wrappers, effects,
//! observable sequences and command dispatch together.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde_json::json;

use trellis_core::object::{
    is_wrapper, same_object, snapshot, to_number, unwrap_model, wrap, wrap_model, Change, Method,
    Model, ReactiveBase, Value,
};
use trellis_core::reactive::Effect;
use trellis_core::{Error, ObservableVec, Result};

/// One line of an invoice.
struct Entry {
    base: ReactiveBase,
    description: Mutex<String>,
    quantity: Mutex<f64>,
    price: Mutex<f64>,
}

impl Entry {
    fn new(description: &str, quantity: f64, price: f64) -> Arc<dyn Model> {
        Arc::new(Self {
            base: ReactiveBase::default(),
            description: Mutex::new(description.to_owned()),
            quantity: Mutex::new(quantity),
            price: Mutex::new(price),
        })
    }
}

impl Model for Entry {
    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "description" => Some(Value::from(self.description.lock().clone())),
            "quantity" => Some(Value::from(*self.quantity.lock())),
            "price" => Some(Value::from(*self.price.lock())),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        match key {
            "description" => {
                let text = value
                    .as_str()
                    .ok_or_else(|| Error::type_mismatch(key, "text"))?;
                *self.description.lock() = text.to_owned();
            }
            "quantity" => *self.quantity.lock() = to_number(&value),
            "price" => *self.price.lock() = to_number(&value),
            other => return Err(Error::unknown_property(other)),
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        vec!["description".into(), "quantity".into(), "price".into()]
    }

    fn reactive_base(&self) -> Option<&ReactiveBase> {
        Some(&self.base)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The view model under test.
struct Invoice {
    base: ReactiveBase,
    id: u32,
    customer: Mutex<String>,
    entries: ObservableVec<Arc<dyn Model>>,
    saved: Mutex<Vec<(String, Vec<Value>)>>,
}

impl Invoice {
    fn new() -> Arc<Self> {
        let base = ReactiveBase::default();
        let entries = ObservableVec::with_owner(base.notifier(), "entries");
        Arc::new(Self {
            base,
            id: 1000,
            customer: Mutex::new(String::new()),
            entries,
            saved: Mutex::new(Vec::new()),
        })
    }

    fn add_entry(&self, description: &str, quantity: f64, price: f64) -> usize {
        self.entries.push(Entry::new(description, quantity, price))
    }

    fn total(&self) -> f64 {
        self.entries
            .read()
            .iter()
            .map(|entry| {
                let quantity = entry.get("quantity").unwrap_or_default();
                let price = entry.get("price").unwrap_or_default();
                to_number(&quantity) * to_number(&price)
            })
            .sum()
    }

    fn add_entry_method() -> &'static Method {
        static METHOD: OnceLock<Method> = OnceLock::new();
        METHOD.get_or_init(|| {
            Method::typed::<Invoice, _>("add_entry", |this, args| {
                let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
                let description = arg(0).as_str().unwrap_or("item").to_owned();
                let len = this.add_entry(&description, to_number(&arg(1)), to_number(&arg(2)));
                Ok(Value::from(len))
            })
        })
    }

    fn total_method() -> &'static Method {
        static METHOD: OnceLock<Method> = OnceLock::new();
        METHOD.get_or_init(|| {
            Method::typed::<Invoice, _>("total", |this, _| Ok(Value::from(this.total())))
        })
    }
}

impl Model for Invoice {
    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::from(self.id)),
            "customer" => Some(Value::from(self.customer.lock().clone())),
            "entries" => Some(Value::list(self.entries.to_vec())),
            "add_entry" => Some(Value::Method(Self::add_entry_method().clone())),
            "total" => Some(Value::Method(Self::total_method().clone())),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        match key {
            "id" => Err(Error::read_only(key)),
            "customer" => {
                let text = value
                    .as_str()
                    .ok_or_else(|| Error::type_mismatch(key, "text"))?;
                *self.customer.lock() = text.to_owned();
                Ok(())
            }
            other => Err(Error::unknown_property(other)),
        }
    }

    fn keys(&self) -> Vec<String> {
        vec!["id".into(), "customer".into(), "entries".into()]
    }

    fn reactive_base(&self) -> Option<&ReactiveBase> {
        Some(&self.base)
    }

    fn on_command(&self, command: &str, args: &[Value]) -> Result<Value> {
        self.saved.lock().push((command.to_owned(), args.to_vec()));
        Ok(Value::from(args.len()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Install a handler that records every change raised on `invoice`.
fn record_changes(invoice: &Invoice) -> Arc<Mutex<Vec<Change>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    invoice
        .base
        .set_notify_handler(Some(Arc::new(move |change: &Change| {
            sink.lock().push(change.clone())
        })));
    seen
}

fn wrapped(invoice: &Arc<Invoice>) -> Arc<dyn Model> {
    let target: Arc<dyn Model> = invoice.clone();
    wrap_model(target)
}

/// Count how many times an effect reading `key` through `model` runs.
fn watch(model: &Arc<dyn Model>, key: &'static str) -> (Effect, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let (m, r) = (model.clone(), runs.clone());
    let effect = Effect::new(move || {
        m.get(key);
        r.fetch_add(1, Ordering::SeqCst);
    });
    (effect, runs)
}

#[test]
fn wrapping_returns_one_stable_wrapper() {
    let invoice = Invoice::new();
    let target: Arc<dyn Model> = invoice.clone();

    let first = wrap(&Value::Object(target.clone()));
    let second = wrap(&Value::Object(target.clone()));

    assert_eq!(first, second);
    assert_eq!(wrap(&first), first);

    let wrapper = first.as_object().unwrap();
    assert!(is_wrapper(wrapper.as_ref()));
    assert!(!is_wrapper(target.as_ref()));
    assert!(same_object(&unwrap_model(wrapper), &target));
}

#[test]
fn writes_notify_only_when_the_value_changes() {
    let invoice = Invoice::new();
    let seen = record_changes(&invoice);
    let model = wrapped(&invoice);

    model.set("customer", Value::from("Acme")).unwrap();
    model.set("customer", Value::from("Acme")).unwrap();

    assert_eq!(*seen.lock(), vec![Change::property("customer")]);
    assert_eq!(invoice.base.metadata().property_version("customer"), 1);
}

#[test]
fn refused_writes_surface_errors_without_notifying() {
    let invoice = Invoice::new();
    let seen = record_changes(&invoice);
    let model = wrapped(&invoice);

    assert_eq!(model.set("id", Value::from(1)), Err(Error::read_only("id")));
    assert_eq!(
        model.set("customer", Value::from(5)),
        Err(Error::type_mismatch("customer", "text"))
    );
    assert_eq!(
        model.set("discount", Value::from(5)),
        Err(Error::unknown_property("discount"))
    );

    assert!(seen.lock().is_empty());
    assert_eq!(model.get("id"), Some(Value::from(1000)));
}

#[test]
fn methods_read_through_the_wrapper_are_bound_and_stable() {
    let invoice = Invoice::new();
    let model = wrapped(&invoice);

    let add = model.get("add_entry").unwrap();
    assert_eq!(model.get("add_entry").unwrap(), add);

    let add = add.as_method().unwrap().clone();
    assert!(add.is_bound());
    assert_eq!(add.call(&["Hours".into(), 2.into(), "10.5".into()]), Ok(Value::from(1)));
    assert_eq!(add.call(&["Travel".into(), 1.into(), 4.into()]), Ok(Value::from(2)));

    let total = model.get("total").unwrap();
    assert_eq!(total.as_method().unwrap().call(&[]), Ok(Value::from(25.0)));
}

#[test]
fn bound_methods_do_not_keep_the_invoice_alive() {
    let invoice = Invoice::new();
    let model = wrapped(&invoice);
    let total = model.get("total").unwrap().as_method().unwrap().clone();

    drop(model);
    drop(invoice);

    assert_eq!(
        total.call(&[]),
        Err(Error::ReceiverDropped {
            method: "total".into()
        })
    );
}

#[test]
fn entry_mutations_report_the_owning_property() {
    let invoice = Invoice::new();
    let seen = record_changes(&invoice);

    invoice.add_entry("Hours", 1.0, 80.0);
    invoice.add_entry("Parts", 3.0, 12.0);
    invoice.entries.pop();

    assert_eq!(
        *seen.lock(),
        vec![Change::property("entries"); 3]
    );
    assert_eq!(invoice.base.metadata().property_version("entries"), 3);
    assert_eq!(invoice.total(), 80.0);
}

#[test]
fn effects_reading_entries_rerun_as_entries_are_added() {
    let invoice = Invoice::new();
    let model = wrapped(&invoice);
    let counts = Arc::new(Mutex::new(Vec::new()));

    let (m, sink) = (model.clone(), counts.clone());
    let _effect = Effect::new(move || {
        let entries = m.get("entries").unwrap_or_default();
        sink.lock().push(entries.as_list().map_or(0, <[Value]>::len));
    });

    invoice.add_entry("Hours", 1.0, 80.0);
    model.do_command("add_entry", &["Parts".into(), 3.into(), 12.into()]).unwrap();

    assert_eq!(*counts.lock(), vec![0, 1, 2]);
}

#[test]
fn handlers_can_reread_entries_while_they_change() {
    let invoice = Invoice::new();
    let model = wrapped(&invoice);
    let totals = Arc::new(Mutex::new(Vec::new()));

    let (m, sink) = (model.clone(), totals.clone());
    invoice
        .base
        .set_notify_handler(Some(Arc::new(move |change: &Change| {
            if change.affects("entries") {
                let total = m.do_command("total", &[]).unwrap_or_default();
                sink.lock().push(total);
            }
        })));

    invoice.add_entry("Hours", 2.0, 10.0);
    invoice.add_entry("Parts", 1.0, 5.0);
    invoice.entries.clear();

    assert_eq!(
        *totals.lock(),
        vec![Value::from(20), Value::from(25), Value::from(0)]
    );
}

#[test]
fn effects_rerun_when_a_wrapped_property_changes() {
    let invoice = Invoice::new();
    let model = wrapped(&invoice);
    let (effect, runs) = watch(&model, "customer");
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    model.set("customer", Value::from("Acme")).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    // Unchanged writes and unrelated properties leave the effect alone.
    model.set("customer", Value::from("Acme")).unwrap();
    invoice.add_entry("Hours", 1.0, 1.0);
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    effect.dispose();
    model.set("customer", Value::from("Other")).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn a_full_refresh_reruns_every_reader() {
    let invoice = Invoice::new();
    let model = wrapped(&invoice);
    let (_customer, customer_runs) = watch(&model, "customer");
    let (_id, id_runs) = watch(&model, "id");

    invoice.base.notify(None::<&str>);

    assert_eq!(customer_runs.load(Ordering::SeqCst), 2);
    assert_eq!(id_runs.load(Ordering::SeqCst), 2);
}

#[test]
fn handler_observes_fresh_state_after_a_write() {
    let invoice = Invoice::new();
    let model = wrapped(&invoice);
    let observed = Arc::new(Mutex::new(Vec::new()));

    let (m, sink) = (model.clone(), observed.clone());
    invoice
        .base
        .set_notify_handler(Some(Arc::new(move |change: &Change| {
            if change.affects("customer") {
                sink.lock().push(m.get("customer").unwrap_or_default());
            }
        })));

    model.set("customer", Value::from("Acme")).unwrap();

    assert_eq!(*observed.lock(), vec![Value::from("Acme")]);
}

#[test]
fn commands_dispatch_to_members_or_the_fallback() {
    let invoice = Invoice::new();
    let model = wrapped(&invoice);

    assert_eq!(
        model.do_command("add_entry", &["Hours".into(), 2.into(), 3.into()]),
        Ok(Value::from(1))
    );
    assert_eq!(invoice.total(), 6.0);

    assert_eq!(
        model.do_command("save", &[1.into(), 2.into()]),
        Ok(Value::from(2))
    );
    assert_eq!(
        *invoice.saved.lock(),
        vec![("save".to_owned(), vec![Value::from(1), Value::from(2)])]
    );

    let total = Invoice::total_method().clone();
    assert_eq!(model.do_command(total, &[]), Ok(Value::from(6.0)));

    assert_eq!(model.do_command(Value::Null, &[]), Ok(Value::Null));
    assert_eq!(model.do_command("do_command", &[]), Ok(Value::Null));
    assert_eq!(invoice.saved.lock().len(), 1);
}

#[test]
fn snapshot_serializes_the_invoice_tree() {
    let invoice = Invoice::new();
    let model = wrapped(&invoice);
    model.set("customer", Value::from("Acme")).unwrap();
    invoice.add_entry("Hours", 2.0, 10.0);

    assert_eq!(
        snapshot(model.as_ref()),
        json!({
            "id": 1000.0,
            "customer": "Acme",
            "entries": [
                { "description": "Hours", "quantity": 2.0, "price": 10.0 }
            ]
        })
    );
}

#[test]
fn entries_are_reactive_models_in_their_own_right() {
    let entry = wrap_model(Entry::new("Hours", 1.0, 10.0));
    let (_effect, runs) = watch(&entry, "quantity");

    entry.set("quantity", Value::from(" 0x10 ")).unwrap();
    assert_eq!(entry.get("quantity"), Some(Value::from(16)));
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    entry.set("quantity", Value::from("nonsense")).unwrap();
    assert_eq!(entry.get("quantity"), Some(Value::from(0)));
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

//! The capability every reactive-capable object implements.
//!
//! Instead of intercepting arbitrary objects, the runtime drives models
//! explicitly through `get`, `set` and `keys`. Implementations use interior
//! mutability, since models are shared behind `Arc` and written through
//! `&self`.

use std::any::Any;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use super::base::ReactiveBase;
use super::value::Value;
use crate::error::Result;

/// Probe answered by every wrapper with `Bool(true)`.
pub const IS_WRAPPER_KEY: &str = "__is_wrapper";

/// Probe answered by every wrapper with its underlying target.
pub const TARGET_KEY: &str = "__target";

/// Method values under this key are never bound by the wrapper.
pub const CONSTRUCTOR_KEY: &str = "constructor";

/// Prefix of keys that are never tracked or notified.
pub const RESERVED_PREFIX: &str = "__";

/// A property bag the runtime can read, write and enumerate.
pub trait Model: Send + Sync + 'static {
    /// Resolve a property. Methods are returned as [`Value::Method`].
    ///
    /// A member must return the same `Method` on every read (keep it in a
    /// field or a `OnceLock`). Wrappers cache one bound copy per method
    /// identity, so a fresh `Method` per read breaks bound-method identity
    /// and grows the cache on every access.
    fn get(&self, key: &str) -> Option<Value>;

    /// Write a property, or explain why the write is refused.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Enumerable property names.
    fn keys(&self) -> Vec<String>;

    /// The embedded notification state, for models built on [`ReactiveBase`].
    fn reactive_base(&self) -> Option<&ReactiveBase> {
        None
    }

    /// Fallback for named commands with no matching method. Does nothing by
    /// default.
    fn on_command(&self, command: &str, args: &[Value]) -> Result<Value> {
        let _ = (command, args);
        Ok(Value::Null)
    }

    fn as_any(&self) -> &dyn Any;
}

/// Whether reads of `key` are tracked and writes notified.
pub fn is_trackable(key: &str) -> bool {
    !key.starts_with(RESERVED_PREFIX)
}

/// Reference identity of two models.
pub fn same_object(a: &Arc<dyn Model>, b: &Arc<dyn Model>) -> bool {
    object_address(a) == object_address(b)
}

/// The allocation address of a model, ignoring vtable metadata.
pub(crate) fn object_address(object: &Arc<dyn Model>) -> usize {
    Arc::as_ptr(object) as *const () as usize
}

/// Serialize every trackable key of a model to a JSON object.
///
/// Methods are skipped, nested objects are snapshotted recursively and an
/// object already being serialized higher up the tree becomes `null`.
pub fn snapshot(model: &dyn Model) -> JsonValue {
    let mut visiting = Vec::new();
    snapshot_into(model, &mut visiting)
}

fn snapshot_into(model: &dyn Model, visiting: &mut Vec<*const ()>) -> JsonValue {
    // Wrappers forward `as_any` to their target, so both share one address.
    let address = model.as_any() as *const dyn Any as *const ();
    if visiting.contains(&address) {
        return JsonValue::Null;
    }
    visiting.push(address);

    let mut fields = Map::new();
    for key in model.keys() {
        if !is_trackable(&key) {
            continue;
        }
        let json = match model.get(&key) {
            None | Some(Value::Method(_)) => continue,
            Some(Value::Object(object)) => snapshot_into(object.as_ref(), visiting),
            Some(Value::List(items)) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(object) => snapshot_into(object.as_ref(), visiting),
                        other => other.to_json(),
                    })
                    .collect(),
            ),
            Some(other) => other.to_json(),
        };
        fields.insert(key, json);
    }

    visiting.pop();
    JsonValue::Object(fields)
}

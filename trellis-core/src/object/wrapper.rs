//! Interception Wrapper
//!
//! A [`Wrapper`] is a transparent stand-in for a model. It implements
//! [`Model`] itself and forwards to its target, adding three behaviours:
//!
//! 1. Reads of trackable keys touch the object's global cell and the
//!    property's cell, so a running [`Effect`](crate::reactive::Effect)
//!    depends on them.
//!
//! 2. Method values come back bound to the target, one memoized copy per
//!    method, so repeated reads return the identical method.
//!
//! 3. Writes that change a trackable property notify: through the target's
//!    [`ReactiveBase`](super::ReactiveBase) when it has one, otherwise by
//!    bumping the metadata cells directly.
//!
//! Wrapping is idempotent: an object has at most one live wrapper, and
//! wrapping a wrapper returns it unchanged.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::change::Change;
use super::metadata::{MetadataStore, ReactiveMetadata};
use super::model::{
    is_trackable, object_address, Model, CONSTRUCTOR_KEY, IS_WRAPPER_KEY, TARGET_KEY,
};
use super::value::Value;
use super::ReactiveBase;
use crate::error::Result;

/// A tracking, notifying view over a target model.
pub struct Wrapper {
    target: Arc<dyn Model>,
    metadata: Arc<ReactiveMetadata>,
}

impl Wrapper {
    /// The wrapped model.
    pub fn target(&self) -> &Arc<dyn Model> {
        &self.target
    }

    /// The target's reactive bookkeeping.
    pub fn metadata(&self) -> &Arc<ReactiveMetadata> {
        &self.metadata
    }
}

impl Model for Wrapper {
    fn get(&self, key: &str) -> Option<Value> {
        match key {
            IS_WRAPPER_KEY => return Some(Value::Bool(true)),
            TARGET_KEY => return Some(Value::Object(self.target.clone())),
            _ => {}
        }

        if is_trackable(key) {
            self.metadata.touch(key);
        }

        match self.target.get(key)? {
            Value::Method(method) if key != CONSTRUCTOR_KEY => {
                Some(Value::Method(self.metadata.bind(&method, &self.target)))
            }
            value => Some(value),
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let old = self.target.get(key);
        self.target.set(key, value.clone())?;

        if !is_trackable(key) || old.is_some_and(|old| old.same(&value)) {
            return Ok(());
        }

        let change = Change::property(key);
        match self.target.reactive_base() {
            Some(base) => base.notify(change),
            None => self.metadata.invalidate(&change),
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.target.keys()
    }

    fn reactive_base(&self) -> Option<&ReactiveBase> {
        self.target.reactive_base()
    }

    fn on_command(&self, command: &str, args: &[Value]) -> Result<Value> {
        self.target.on_command(command, args)
    }

    fn as_any(&self) -> &dyn Any {
        self.target.as_any()
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("target", &object_address(&self.target))
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Wrap an object value; every other value is returned unchanged.
pub fn wrap(value: &Value) -> Value {
    match value {
        Value::Object(target) => Value::Object(wrap_model(target.clone())),
        other => other.clone(),
    }
}

/// Wrap a model using the process-wide [`MetadataStore`].
pub fn wrap_model(target: Arc<dyn Model>) -> Arc<dyn Model> {
    wrap_in(MetadataStore::global(), target)
}

/// Wrap a model, associating foreign models through `store`.
pub fn wrap_in(store: &MetadataStore, target: Arc<dyn Model>) -> Arc<dyn Model> {
    if is_wrapper(target.as_ref()) {
        return target;
    }

    let metadata = store.ensure(&target);
    metadata.wrapper_or_insert_with(|| {
        tracing::debug!(target = object_address(&target), "creating wrapper");
        Arc::new(Wrapper {
            target: target.clone(),
            metadata: metadata.clone(),
        })
    })
}

/// Whether `model` answers the wrapper probe.
pub fn is_wrapper(model: &dyn Model) -> bool {
    matches!(model.get(IS_WRAPPER_KEY), Some(Value::Bool(true)))
}

/// The wrapped target of a wrapper value; every other value is returned
/// unchanged.
pub fn unwrap(value: &Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(unwrap_model(object)),
        other => other.clone(),
    }
}

/// The wrapped target of a wrapper, or the model itself.
pub fn unwrap_model(model: &Arc<dyn Model>) -> Arc<dyn Model> {
    match model.get(TARGET_KEY) {
        Some(Value::Object(target)) if is_wrapper(model.as_ref()) => target,
        _ => model.clone(),
    }
}

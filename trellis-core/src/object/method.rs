//! Callable members of a model.
//!
//! A [`Method`] is either unbound (called with an explicit receiver) or bound
//! to a receiver it holds weakly. Binding creates a new method identity that
//! shares the underlying function; the wrapper memoizes one bound copy per
//! method per object so repeated reads return the identical method.

use std::any::type_name;
use std::fmt;
use std::sync::{Arc, Weak};

use super::model::Model;
use super::value::Value;
use crate::error::{Error, Result};

type MethodFn = dyn Fn(&dyn Model, &[Value]) -> Result<Value> + Send + Sync;

/// A named callable with optional receiver binding.
#[derive(Clone)]
pub struct Method {
    inner: Arc<MethodInner>,
}

struct MethodInner {
    name: Arc<str>,
    func: Arc<MethodFn>,
    receiver: Option<Weak<dyn Model>>,
}

impl Method {
    /// Create an unbound method over any model.
    pub fn new<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&dyn Model, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(MethodInner {
                name: name.into(),
                func: Arc::new(func),
                receiver: None,
            }),
        }
    }

    /// Create an unbound method whose receiver must be a `T`.
    ///
    /// Receivers are downcast through [`Model::as_any`], which wrappers
    /// forward to their target, so a method called through a wrapper still
    /// sees the concrete type.
    pub fn typed<T, F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        T: Model,
        F: Fn(&T, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let name: Arc<str> = name.into();
        let method_name = name.clone();
        Self::new(name, move |receiver: &dyn Model, args: &[Value]| {
            let this = receiver.as_any().downcast_ref::<T>().ok_or_else(|| {
                Error::ReceiverMismatch {
                    method: method_name.to_string(),
                    expected: type_name::<T>(),
                }
            })?;
            func(this, args)
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_bound(&self) -> bool {
        self.inner.receiver.is_some()
    }

    /// Reference identity.
    pub fn same(&self, other: &Method) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Produce a new method with the receiver fixed to `receiver`.
    ///
    /// The receiver is held weakly, so a bound method cached on an object
    /// never keeps that object alive.
    pub fn bind(&self, receiver: &Arc<dyn Model>) -> Method {
        Self {
            inner: Arc::new(MethodInner {
                name: self.inner.name.clone(),
                func: self.inner.func.clone(),
                receiver: Some(Arc::downgrade(receiver)),
            }),
        }
    }

    /// Call a bound method.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match &self.inner.receiver {
            Some(receiver) => {
                let receiver = receiver.upgrade().ok_or_else(|| Error::ReceiverDropped {
                    method: self.name().to_owned(),
                })?;
                (self.inner.func)(receiver.as_ref(), args)
            }
            None => Err(Error::Unbound {
                method: self.name().to_owned(),
            }),
        }
    }

    /// Call with an explicit receiver. A bound method ignores `receiver`.
    pub fn call_with(&self, receiver: &dyn Model, args: &[Value]) -> Result<Value> {
        if self.is_bound() {
            return self.call(args);
        }
        (self.inner.func)(receiver, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name())
            .field("bound", &self.is_bound())
            .finish()
    }
}

//! Command dispatch.
//!
//! A [`Command`] either names a member of the model or carries a method to
//! invoke directly. Named commands resolve to a method returned by
//! [`Model::get`]; a name with no matching method falls through to
//! [`Model::on_command`]. Anything else is a harmless no-op, so the set of
//! commands a view sends can evolve independently of the model.

use super::method::Method;
use super::model::Model;
use super::value::Value;
use crate::error::Result;

/// Name of the dispatcher itself. Dispatching it is a no-op.
pub const DO_COMMAND: &str = "do_command";

/// A dispatchable command.
#[derive(Debug, Clone, Default)]
pub enum Command {
    /// No command.
    #[default]
    Empty,
    /// Invoke this method with the model as receiver.
    Invoke(Method),
    /// Invoke the member with this name, or the fallback.
    Named(String),
    /// A value that cannot be dispatched.
    Unsupported,
}

impl From<&str> for Command {
    fn from(name: &str) -> Self {
        Command::Named(name.to_owned())
    }
}

impl From<String> for Command {
    fn from(name: String) -> Self {
        Command::Named(name)
    }
}

impl From<Method> for Command {
    fn from(method: Method) -> Self {
        Command::Invoke(method)
    }
}

impl<T: Into<Command>> From<Option<T>> for Command {
    fn from(command: Option<T>) -> Self {
        command.map(Into::into).unwrap_or_default()
    }
}

impl From<Value> for Command {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Command::Empty,
            Value::Method(method) => Command::Invoke(method),
            Value::Text(name) => Command::Named(name),
            _ => Command::Unsupported,
        }
    }
}

/// Dispatch `command` against `model`.
pub fn do_command(model: &dyn Model, command: Command, args: &[Value]) -> Result<Value> {
    match command {
        Command::Empty | Command::Unsupported => Ok(Value::Null),
        Command::Invoke(method) => method.call_with(model, args),
        Command::Named(name) if name == DO_COMMAND => Ok(Value::Null),
        Command::Named(name) => match model.get(&name) {
            Some(Value::Method(method)) => method.call_with(model, args),
            _ => {
                tracing::debug!(command = %name, "no member for command, using fallback");
                model.on_command(&name, args)
            }
        },
    }
}

impl dyn Model {
    /// Dispatch a command against this model. See [`do_command`].
    pub fn do_command(&self, command: impl Into<Command>, args: &[Value]) -> Result<Value> {
        do_command(self, command.into(), args)
    }
}

//! Dynamic values flowing through [`Model`] reads and writes.
//!
//! Identity follows strict equality: scalars compare by value (so `NaN` is
//! never identical to itself), while methods, lists and objects compare by
//! reference.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::method::Method;
use super::model::{self, Model};

/// A property value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value. Also the "refresh everything" marker when
    /// converted into a [`Change`](super::Change).
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// A shared, immutable snapshot of a sequence.
    List(Arc<Vec<Value>>),
    Method(Method),
    Object(Arc<dyn Model>),
}

impl Value {
    /// Strict identity.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Method(a), Value::Method(b)) => a.same(b),
            (Value::Object(a), Value::Object(b)) => model::same_object(a, b),
            _ => false,
        }
    }

    /// Build a list value from anything convertible into values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for values the wrapper can intercept.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Value::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn Model>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Convert to JSON. Methods become `null`; objects are snapshotted.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null | Value::Method(_) => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Text(text) => JsonValue::String(text.clone()),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(object) => model::snapshot(object.as_ref()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Method(method) => f.debug_tuple("Method").field(method).finish(),
            Value::Object(object) => f
                .debug_tuple("Object")
                .field(&model::object_address(object))
                .finish(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(value as f64)
                }
            }
        )*
    };
}

number_from!(f32, i32, i64, u32, u64, usize);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Method> for Value {
    fn from(value: Method) -> Self {
        Value::Method(value)
    }
}

impl From<Arc<dyn Model>> for Value {
    fn from(value: Arc<dyn Model>) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Coerce a value to a finite number, degrading to `0.0`.
///
/// Text is trimmed; empty text is `0`; `0x`, `0o` and `0b` prefixes select a
/// radix; booleans are `0`/`1`. Anything that does not produce a finite number
/// (`NaN`, infinities, non-numeric text, methods, objects) yields `0.0`.
pub fn to_number(value: &Value) -> f64 {
    let number = match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => *n,
        Value::Text(text) => parse_numeric_text(text),
        Value::List(items) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(single),
            _ => f64::NAN,
        },
        Value::Method(_) | Value::Object(_) => f64::NAN,
    };

    if number.is_finite() {
        number
    } else {
        0.0
    }
}

fn parse_numeric_text(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    const PREFIXES: [(&str, u32); 6] = [
        ("0x", 16),
        ("0X", 16),
        ("0o", 8),
        ("0O", 8),
        ("0b", 2),
        ("0B", 2),
    ];
    for (prefix, radix) in PREFIXES {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            // Accumulated in f64 so literals wider than 64 bits stay finite.
            return digits
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0.0, |acc, digit| acc * f64::from(radix) + f64::from(digit));
        }
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_number_parses_decimal_text() {
        assert_eq!(to_number(&Value::from("12.5")), 12.5);
        assert_eq!(to_number(&Value::from("  7 ")), 7.0);
        assert_eq!(to_number(&Value::from("1e3")), 1000.0);
        assert_eq!(to_number(&Value::from("-4")), -4.0);
    }

    #[test]
    fn to_number_degrades_to_zero() {
        assert_eq!(to_number(&Value::from("abc")), 0.0);
        assert_eq!(to_number(&Value::Null), 0.0);
        assert_eq!(to_number(&Value::from("")), 0.0);
        assert_eq!(to_number(&Value::from(f64::NAN)), 0.0);
        assert_eq!(to_number(&Value::from(f64::INFINITY)), 0.0);
        assert_eq!(to_number(&Value::from("Infinity")), 0.0);
        assert_eq!(to_number(&Value::from("0x")), 0.0);
        assert_eq!(to_number(&Value::list([1, 2])), 0.0);
    }

    #[test]
    fn to_number_handles_radix_prefixes_and_booleans() {
        assert_eq!(to_number(&Value::from("0x1F")), 31.0);
        assert_eq!(to_number(&Value::from("0b101")), 5.0);
        assert_eq!(to_number(&Value::from("0o17")), 15.0);
        assert_eq!(to_number(&Value::from(true)), 1.0);
        assert_eq!(to_number(&Value::from(false)), 0.0);
        assert_eq!(to_number(&Value::list(["8"])), 8.0);
    }

    #[test]
    fn wide_radix_literals_stay_finite() {
        let hex = format!("0x1{}", "0".repeat(20));
        assert_eq!(to_number(&Value::from(hex)), 2f64.powi(80));

        let binary = format!("0b1{}", "0".repeat(70));
        assert_eq!(to_number(&Value::from(binary)), 2f64.powi(70));
    }

    #[test]
    fn identity_is_strict() {
        assert!(Value::from(3).same(&Value::from(3.0)));
        assert!(Value::from("a").same(&Value::from("a")));
        assert!(!Value::from(f64::NAN).same(&Value::from(f64::NAN)));
        assert!(!Value::from(0).same(&Value::from(false)));
        assert!(!Value::Null.same(&Value::from("")));

        let list = Value::list([1, 2]);
        assert!(list.same(&list.clone()));
        assert!(!list.same(&Value::list([1, 2])));
    }

    #[test]
    fn json_conversion_of_scalars_and_lists() {
        let value = Value::list([Value::from(1.5), Value::from("x"), Value::Null]);
        assert_eq!(value.to_json(), serde_json::json!([1.5, "x", null]));
        assert_eq!(Value::from(f64::NAN).to_json(), JsonValue::Null);
        assert_eq!(Value::from(None::<bool>), Value::Null);
    }
}

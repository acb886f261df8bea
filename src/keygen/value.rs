//! Key Argument Values
//!
//! The closed set of argument kinds the canonicalizer understands, and the
//! `ToValue` hook through which callers describe their own types.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone};

// == Value ==
/// An argument to a cached operation, before canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Nil,
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    /// Instant as epoch seconds (sub-second precision is already dropped)
    Time(i64),
    /// Ordered elements
    Seq(Vec<Value>),
    /// Key/value entries of a mapping, in any order
    Map(Vec<(Value, Value)>),
    /// Record fields in declaration order
    Record(Vec<Value>),
    /// Best-effort textual rendering of a kind with no structural reduction
    Opaque(String),
}

impl Value {
    /// Wraps any debuggable value as an opaque rendering.
    pub fn opaque<T: Debug + ?Sized>(value: &T) -> Self {
        Value::Opaque(format!("{:?}", value))
    }

    /// Builds a mapping from any iterator of entries.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: ToValue,
        V: ToValue,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }
}

// == ToValue ==
/// Conversion of a typed value into an argument `Value`.
///
/// Records implement this by listing their fields, usually through
/// [`record_value!`](crate::record_value).
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

macro_rules! signed_to_value {
    ($($ty:ty),*) => {
        $(impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        })*
    };
}

macro_rules! unsigned_to_value {
    ($($ty:ty),*) => {
        $(impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::UInt(u64::from(*self))
            }
        })*
    };
}

signed_to_value!(i8, i16, i32, i64);
unsigned_to_value!(u8, u16, u32, u64);

impl ToValue for isize {
    fn to_value(&self) -> Value {
        Value::Int(*self as i64)
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        Value::UInt(*self as u64)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Nil,
        }
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<K: ToValue, V: ToValue, S> ToValue for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        Value::map(self.iter())
    }
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::map(self.iter())
    }
}

impl<Tz: TimeZone> ToValue for DateTime<Tz> {
    fn to_value(&self) -> Value {
        Value::Time(self.timestamp())
    }
}

impl ToValue for SystemTime {
    fn to_value(&self) -> Value {
        let secs = match self.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_secs() as i64,
            // Round towards negative infinity like `DateTime::timestamp`
            Err(before) => {
                let before = before.duration();
                let secs = -(before.as_secs() as i64);
                if before.subsec_nanos() > 0 {
                    secs - 1
                } else {
                    secs
                }
            }
        };
        Value::Time(secs)
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        match self {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => items.to_value(),
            serde_json::Value::Object(fields) => Value::map(fields.iter()),
        }
    }
}

macro_rules! tuple_to_value {
    ($($name:ident),+) => {
        impl<$($name: ToValue),+> ToValue for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_value(&self) -> Value {
                let ($($name,)+) = self;
                Value::Seq(vec![$($name.to_value()),+])
            }
        }
    };
}

tuple_to_value!(A);
tuple_to_value!(A, B);
tuple_to_value!(A, B, C);
tuple_to_value!(A, B, C, D);

/// Implements [`ToValue`] for a struct as a record over the listed fields.
///
/// Fields reduce in the order they are listed here, which should match the
/// declaration order.
///
/// ```
/// use memo_cache::record_value;
///
/// struct Query {
///     table: String,
///     limit: u32,
/// }
///
/// record_value!(Query { table, limit });
/// ```
#[macro_export]
macro_rules! record_value {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::keygen::ToValue for $ty {
            fn to_value(&self) -> $crate::keygen::Value {
                $crate::keygen::Value::Record(vec![
                    $($crate::keygen::ToValue::to_value(&self.$field)),*
                ])
            }
        }
    };
}

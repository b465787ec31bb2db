//! Value types stored in documents.
//!
//! [`ScalarValue`] is the closed set of primitive values a slot can hold. [`ObjType`] names the
//! three container kinds. [`Value`] is what reads return: either a scalar or a reference to a
//! nested object. [`ValueTree`] describes a whole nested structure to be written in one call.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CRDTError, op::ObjId};

/// A primitive value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int(i64),
    Uint(u64),
    F64(f64),
    Str(String),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Milliseconds since the Unix epoch
    Timestamp(i64),
    /// A counter. When read, holds the current total rather than the initial value.
    Counter(i64),
}

impl ScalarValue {
    /// Create a counter with the given initial value.
    pub fn counter(n: i64) -> Self {
        ScalarValue::Counter(n)
    }

    /// Create a timestamp value.
    pub fn timestamp(millis: i64) -> Self {
        ScalarValue::Timestamp(millis)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Null => "null",
            ScalarValue::Boolean(_) => "boolean",
            ScalarValue::Int(_) => "int",
            ScalarValue::Uint(_) => "uint",
            ScalarValue::F64(_) => "f64",
            ScalarValue::Str(_) => "str",
            ScalarValue::Bytes(_) => "bytes",
            ScalarValue::Timestamp(_) => "timestamp",
            ScalarValue::Counter(_) => "counter",
        }
    }

    pub fn is_counter(&self) -> bool {
        matches!(self, ScalarValue::Counter(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(n) | ScalarValue::Counter(n) | ScalarValue::Timestamp(n) => Some(*n),
            ScalarValue::Uint(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Reject values that cannot be encoded canonically.
    pub(crate) fn validate(&self) -> Result<(), CRDTError> {
        match self {
            ScalarValue::F64(f) if !f.is_finite() => Err(CRDTError::InvalidValue {
                reason: format!("non-finite float {f}"),
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            ScalarValue::Null => Json::Null,
            ScalarValue::Boolean(b) => Json::Bool(*b),
            ScalarValue::Int(n) | ScalarValue::Timestamp(n) | ScalarValue::Counter(n) => {
                Json::from(*n)
            }
            ScalarValue::Uint(n) => Json::from(*n),
            ScalarValue::F64(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            ScalarValue::Str(s) => Json::String(s.clone()),
            ScalarValue::Bytes(b) => Json::from(b.clone()),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Boolean(b) => write!(f, "{b}"),
            ScalarValue::Int(n) => write!(f, "{n}"),
            ScalarValue::Uint(n) => write!(f, "{n}"),
            ScalarValue::F64(n) => write!(f, "{n}"),
            ScalarValue::Str(s) => write!(f, "\"{s}\""),
            ScalarValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            ScalarValue::Timestamp(t) => write!(f, "Timestamp({t})"),
            ScalarValue::Counter(c) => write!(f, "Counter({c})"),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Str(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::Str(s)
    }
}

impl From<char> for ScalarValue {
    fn from(c: char) -> Self {
        ScalarValue::Str(c.to_string())
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Boolean(b)
    }
}

impl From<i32> for ScalarValue {
    fn from(n: i32) -> Self {
        ScalarValue::Int(n as i64)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        ScalarValue::Int(n)
    }
}

impl From<u64> for ScalarValue {
    fn from(n: u64) -> Self {
        ScalarValue::Uint(n)
    }
}

impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        ScalarValue::F64(n)
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(b: Vec<u8>) -> Self {
        ScalarValue::Bytes(b)
    }
}

impl From<&[u8]> for ScalarValue {
    fn from(b: &[u8]) -> Self {
        ScalarValue::Bytes(b.to_vec())
    }
}

impl From<()> for ScalarValue {
    fn from(_: ()) -> Self {
        ScalarValue::Null
    }
}

/// The kind of a container object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjType {
    Map,
    List,
    Text,
}

impl ObjType {
    pub fn is_sequence(&self) -> bool {
        matches!(self, ObjType::List | ObjType::Text)
    }
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjType::Map => write!(f, "map"),
            ObjType::List => write!(f, "list"),
            ObjType::Text => write!(f, "text"),
        }
    }
}

/// A value read from a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(ScalarValue),
    /// A nested object, with the id to address it by
    Object(ObjType, ObjId),
}

impl Value {
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(..))
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Object(..) => None,
        }
    }

    pub fn obj_id(&self) -> Option<&ObjId> {
        match self {
            Value::Object(_, id) => Some(id),
            Value::Scalar(_) => None,
        }
    }

    pub fn obj_type(&self) -> Option<ObjType> {
        match self {
            Value::Object(t, _) => Some(*t),
            Value::Scalar(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(ScalarValue::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(ScalarValue::as_i64)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(s) => s.type_name(),
            Value::Object(ObjType::Map, _) => "map",
            Value::Object(ObjType::List, _) => "list",
            Value::Object(ObjType::Text, _) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{s}"),
            Value::Object(t, id) => write!(f, "{t}({id})"),
        }
    }
}

macro_rules! impl_from_scalar {
    ($target:ident; $($source:ty),* $(,)?) => {
        $(
            impl From<$source> for $target {
                fn from(v: $source) -> Self {
                    $target::Scalar(ScalarValue::from(v))
                }
            }
        )*
    };
}

impl From<ScalarValue> for Value {
    fn from(v: ScalarValue) -> Self {
        Value::Scalar(v)
    }
}

impl_from_scalar!(Value; &str, String, char, bool, i32, i64, u64, f64, Vec<u8>, &[u8], ());

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Value::Scalar(ScalarValue::Int(n) | ScalarValue::Counter(n)) if n == other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        matches!(self, Value::Scalar(ScalarValue::Boolean(b)) if b == other)
    }
}

/// A nested value to be written in one call.
///
/// Writing a tree is sequential application of make-object and put/insert operations; the
/// store does not treat it specially.
///
/// ```
/// use quilt::{Document, ROOT, ValueTree};
///
/// let mut doc = Document::new();
/// let tree = ValueTree::map([
///     ("title", ValueTree::text("Notes")),
///     ("tags", ValueTree::list(["a".into(), "b".into()])),
/// ]);
/// doc.put_tree(&ROOT, "doc", tree).unwrap();
/// assert_eq!(
///     doc.to_json(&ROOT),
///     serde_json::json!({"doc": {"title": "Notes", "tags": ["a", "b"]}})
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTree {
    Scalar(ScalarValue),
    Map(Vec<(String, ValueTree)>),
    List(Vec<ValueTree>),
    Text(String),
}

impl ValueTree {
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, ValueTree)>) -> Self {
        ValueTree::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn list(items: impl IntoIterator<Item = ValueTree>) -> Self {
        ValueTree::List(items.into_iter().collect())
    }

    pub fn text(s: impl Into<String>) -> Self {
        ValueTree::Text(s.into())
    }
}

impl From<ScalarValue> for ValueTree {
    fn from(v: ScalarValue) -> Self {
        ValueTree::Scalar(v)
    }
}

impl_from_scalar!(ValueTree; &str, String, char, bool, i32, i64, u64, f64, Vec<u8>, &[u8], ());

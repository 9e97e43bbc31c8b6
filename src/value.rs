// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::datetime::{Time, Timestamp};
use crate::encoding;
use crate::error::{Error, Result};
use crate::number::{format_decimal, Integer};
use crate::options::CaseSensitivity;
use crate::Rc;

use core::fmt;
use std::ops;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// The kind of a runtime value.
///
/// The declaration order is the order in which kinds are listed in messages; it
/// is not the comparison order of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    Missing,
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    Date,
    Time,
    Timestamp,
    String,
    Symbol,
    Clob,
    Blob,
    List,
    Sexp,
    Struct,
    Bag,
}

impl Kind {
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Missing => "MISSING",
            Kind::Null => "NULL",
            Kind::Bool => "BOOL",
            Kind::Int => "INT",
            Kind::Float => "FLOAT",
            Kind::Decimal => "DECIMAL",
            Kind::Date => "DATE",
            Kind::Time => "TIME",
            Kind::Timestamp => "TIMESTAMP",
            Kind::String => "STRING",
            Kind::Symbol => "SYMBOL",
            Kind::Clob => "CLOB",
            Kind::Blob => "BLOB",
            Kind::List => "LIST",
            Kind::Sexp => "SEXP",
            Kind::Struct => "STRUCT",
            Kind::Bag => "BAG",
        }
    }

    pub const fn is_unknown(self) -> bool {
        matches!(self, Kind::Missing | Kind::Null)
    }

    pub const fn is_number(self) -> bool {
        matches!(self, Kind::Int | Kind::Float | Kind::Decimal)
    }

    pub const fn is_text(self) -> bool {
        matches!(self, Kind::String | Kind::Symbol)
    }

    pub const fn is_lob(self) -> bool {
        matches!(self, Kind::Clob | Kind::Blob)
    }

    /// LIST, SEXP and BAG.
    pub const fn is_collection(self) -> bool {
        matches!(self, Kind::List | Kind::Sexp | Kind::Bag)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StructOrdering {
    Unordered,
    Ordered,
}

/// Name/value pairs of a struct. Names may repeat.
#[derive(Clone)]
pub struct StructValue {
    fields: Vec<(Rc<str>, Value)>,
    ordering: StructOrdering,
}

impl StructValue {
    pub fn new(fields: Vec<(Rc<str>, Value)>, ordering: StructOrdering) -> Self {
        Self { fields, ordering }
    }

    pub fn fields(&self) -> &[(Rc<str>, Value)] {
        &self.fields
    }

    pub fn ordering(&self) -> StructOrdering {
        self.ordering
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First field with the given name.
    pub fn get(&self, name: &str, case: CaseSensitivity) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| case.names_match(n, name))
            .map(|(_, v)| v)
    }
}

// Values are immutable and share their contents through Rc.
#[derive(Clone)]
pub enum Value {
    /// Absent value.
    Missing,

    /// Null, optionally typed.
    Null(Option<Kind>),

    Bool(bool),
    Int(Integer),
    Float(f64),
    Decimal(Rc<BigDecimal>),
    Date(NaiveDate),
    Time(Time),
    Timestamp(Timestamp),
    String(Rc<str>),
    Symbol(Rc<str>),
    Clob(Rc<[u8]>),
    Blob(Rc<[u8]>),
    List(Rc<Vec<Value>>),
    Sexp(Rc<Vec<Value>>),
    Struct(Rc<StructValue>),
    Bag(Rc<Vec<Value>>),
}

impl Value {
    pub const NULL: Value = Value::Null(None);

    pub fn kind(&self) -> Kind {
        match self {
            Value::Missing => Kind::Missing,
            Value::Null(_) => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Decimal(_) => Kind::Decimal,
            Value::Date(_) => Kind::Date,
            Value::Time(_) => Kind::Time,
            Value::Timestamp(_) => Kind::Timestamp,
            Value::String(_) => Kind::String,
            Value::Symbol(_) => Kind::Symbol,
            Value::Clob(_) => Kind::Clob,
            Value::Blob(_) => Kind::Blob,
            Value::List(_) => Kind::List,
            Value::Sexp(_) => Kind::Sexp,
            Value::Struct(_) => Kind::Struct,
            Value::Bag(_) => Kind::Bag,
        }
    }

    /// NULL or MISSING.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Missing | Value::Null(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(items))
    }

    pub fn sexp(items: Vec<Value>) -> Value {
        Value::Sexp(Rc::new(items))
    }

    pub fn bag(items: Vec<Value>) -> Value {
        Value::Bag(Rc::new(items))
    }

    pub fn string(s: &str) -> Value {
        Value::String(s.into())
    }

    pub fn symbol(s: &str) -> Value {
        Value::Symbol(s.into())
    }

    pub fn clob(bytes: &[u8]) -> Value {
        Value::Clob(bytes.into())
    }

    pub fn blob(bytes: &[u8]) -> Value {
        Value::Blob(bytes.into())
    }

    pub fn decimal(d: BigDecimal) -> Value {
        Value::Decimal(Rc::new(d))
    }

    pub fn from_struct(fields: Vec<(Rc<str>, Value)>, ordering: StructOrdering) -> Value {
        Value::Struct(Rc::new(StructValue::new(fields, ordering)))
    }

    /// Unordered struct from name/value pairs.
    pub fn struct_from<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
        Value::from_struct(
            fields.into_iter().map(|(n, v)| (n.into(), v)).collect(),
            StructOrdering::Unordered,
        )
    }

    pub fn ordered_struct_from<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
        Value::from_struct(
            fields.into_iter().map(|(n, v)| (n.into(), v)).collect(),
            StructOrdering::Ordered,
        )
    }

    /// `NULL` declared as the given kind. Unknown kinds give the untyped `NULL`.
    pub fn typed_null(kind: Kind) -> Value {
        if kind.is_unknown() {
            Value::NULL
        } else {
            Value::Null(Some(kind))
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&Integer> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(Integer::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }

    /// Contents of a STRING or SYMBOL.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Contents of a CLOB or BLOB.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Clob(b) | Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Elements of a LIST, SEXP or BAG.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Sexp(items) | Value::Bag(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Field access. Anything that is not a struct with such a field yields `MISSING`.
    pub fn field(&self, name: &str, case: CaseSensitivity) -> Value {
        self.as_struct()
            .and_then(|s| s.get(name, case))
            .cloned()
            .unwrap_or(Value::Missing)
    }

    /// Positional access into a LIST or SEXP. Anything else yields `MISSING`.
    pub fn index(&self, index: usize) -> Value {
        self[index].clone()
    }

    /// Serialize to text. Unknowns, typed nulls and every kind round-trip.
    pub fn to_text(&self) -> String {
        encoding::to_text(self)
    }

    pub fn from_text(text: &str) -> Result<Value> {
        encoding::from_text(text)
    }

    /// Down-convert to JSON. Kinds JSON lacks become strings or arrays.
    pub fn to_json_str(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::internal(format!("{e}")))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Value::Struct(Rc::new(self.clone())).to_text())
    }
}

impl FromStr for Value {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Value::from_text(s)
    }
}

/// Strict equivalence: kinds, typed-null kinds and struct orderings must match.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl Eq for Value {}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Missing | Value::Null(_) => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => i.serialize(serializer),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(f) => serializer.serialize_str(&crate::number::format_float(*f)),
            Value::Decimal(d) => {
                let text = format_decimal(d);
                match serde_json::Number::from_str(&text) {
                    Ok(n) => n.serialize(serializer),
                    Err(_) => serializer.serialize_str(&text),
                }
            }
            Value::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => serializer.serialize_str(&t.to_string()),
            Value::Timestamp(ts) => serializer.serialize_str(&ts.to_string()),
            Value::String(s) | Value::Symbol(s) => serializer.serialize_str(s),
            Value::Clob(b) | Value::Blob(b) => {
                serializer.serialize_str(&data_encoding::BASE64.encode(b))
            }
            Value::List(items) | Value::Sexp(items) | Value::Bag(items) => {
                items.serialize(serializer)
            }
            Value::Struct(s) => {
                let fields = s.fields().iter().filter(|(_, v)| !v.is_missing());
                let mut map = serializer.serialize_map(None)?;
                for (name, value) in fields {
                    map.serialize_entry(name.as_ref(), value)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(Integer::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(Integer::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Int(Integer::from(n))
    }
}

impl From<Integer> for Value {
    fn from(n: Integer) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<Time> for Value {
    fn from(t: Time) -> Self {
        Value::Time(t)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl ops::Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        match self {
            Value::List(items) | Value::Sexp(items) if index < items.len() => &items[index],
            _ => &Value::Missing,
        }
    }
}

impl ops::Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Self::Output {
        match self
            .as_struct()
            .and_then(|s| s.get(key, CaseSensitivity::Sensitive))
        {
            Some(v) => v,
            None => &Value::Missing,
        }
    }
}

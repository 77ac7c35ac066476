//! Decoded value model
//!
//! [`Value`] is what every decoder produces. Scalars are held in their
//! natural Rust types; the richer driver-level types (UUIDs, datetimes,
//! decimals, arbitrary-precision integers) use the `uuid`, `chrono` and
//! `num-bigint` representations.

use chrono::{DateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

/// Decoded CQL value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer (`int`)
    Int32(i32),
    /// 64-bit signed integer (`bigint`, `counter`)
    Int64(i64),
    /// 32-bit floating point (`float`)
    Float32(f32),
    /// 64-bit floating point (`double`)
    Float64(f64),
    /// Raw bytes (`blob`, `ascii`)
    Bytes(Vec<u8>),
    /// UTF-8 text (`text`, `varchar`)
    Text(String),
    /// Random or name-based UUID (`uuid`)
    Uuid(Uuid),
    /// Time-ordered UUID (`timeuuid`)
    TimeUuid(Uuid),
    /// IPv4 or IPv6 address (`inet`)
    Inet(IpAddr),
    /// UTC point in time (`timestamp`)
    Timestamp(DateTime<Utc>),
    /// Arbitrary-precision decimal (`decimal`)
    Decimal(Decimal),
    /// Arbitrary-precision integer (`varint`)
    Varint(BigInt),
    /// Ordered sequence (`list`)
    List(Vec<Value>),
    /// Set items in the order produced by the sorted-set constructor
    Set(Vec<Value>),
    /// Key/value pairs in the order produced by the ordered-map constructor
    Map(Vec<(Value, Value)>),
    /// Fixed-arity heterogeneous sequence (`tuple`, positional user types)
    Tuple(Vec<Value>),
    /// User defined type with named fields
    Udt(UdtValue),
}

impl Value {
    /// Short name of the variant, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int32(_) => "int",
            Value::Int64(_) => "bigint",
            Value::Float32(_) => "float",
            Value::Float64(_) => "double",
            Value::Bytes(_) => "blob",
            Value::Text(_) => "text",
            Value::Uuid(_) => "uuid",
            Value::TimeUuid(_) => "timeuuid",
            Value::Inet(_) => "inet",
            Value::Timestamp(_) => "timestamp",
            Value::Decimal(_) => "decimal",
            Value::Varint(_) => "varint",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Tuple(_) => "tuple",
            Value::Udt(_) => "udt",
        }
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to convert this value to a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to convert this value to a 32-bit integer
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to convert this value to a 64-bit integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            Value::Int32(i) => Some(i64::from(*i)),
            _ => None,
        }
    }

    /// Try to convert this value to a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            Value::Float32(f) => Some(f64::from(*f)),
            Value::Int32(i) => Some(f64::from(*i)),
            _ => None,
        }
    }

    /// Try to convert this value to a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert this value to bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to view this value as a UUID of either flavour
    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Value::Uuid(u) | Value::TimeUuid(u) => Some(u),
            _ => None,
        }
    }

    /// Try to view this value as a sequence (list, set or tuple)
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Render this value as JSON
    ///
    /// Arbitrary-precision numbers are rendered as strings so no precision is
    /// lost; bytes are rendered as `0x`-prefixed hex; maps become arrays of
    /// `[key, value]` pairs since CQL map keys need not be strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Int32(i) => Json::from(*i),
            Value::Int64(i) => Json::from(*i),
            Value::Float32(f) => serde_json::Number::from_f64(f64::from(*f))
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Float64(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Bytes(b) => Json::String(format!("0x{}", hex::encode(b))),
            Value::Text(s) => Json::String(s.clone()),
            Value::Uuid(u) | Value::TimeUuid(u) => Json::String(u.to_string()),
            Value::Inet(addr) => Json::String(addr.to_string()),
            Value::Timestamp(ts) => {
                Json::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Decimal(d) => Json::String(d.to_string()),
            Value::Varint(v) => Json::String(v.to_string()),
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(pairs) => Json::Array(
                pairs
                    .iter()
                    .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
            Value::Udt(udt) => Json::Object(
                udt.fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

fn write_joined<'a, I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = &'a Value>,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float32(fl) => write!(f, "{}", fl),
            Value::Float64(fl) => write!(f, "{}", fl),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Uuid(u) | Value::TimeUuid(u) => write!(f, "{}", u),
            Value::Inet(addr) => write!(f, "{}", addr),
            Value::Timestamp(ts) => {
                write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Varint(v) => write!(f, "{}", v),
            Value::List(items) => {
                write!(f, "[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "{{")?;
                write_joined(f, items)?;
                write!(f, "}}")
            }
            Value::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_joined(f, items)?;
                write!(f, ")")
            }
            Value::Udt(udt) => write!(f, "{}", udt),
        }
    }
}

/// User defined type value with fields in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct UdtValue {
    /// Type name, when the descriptor carried one
    pub type_name: Option<String>,
    /// Field name and value pairs in declaration order
    pub fields: Vec<(String, Value)>,
}

impl UdtValue {
    pub fn new(type_name: Option<String>, fields: Vec<(String, Value)>) -> Self {
        Self { type_name, fields }
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Display for UdtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.type_name {
            write!(f, "{}", name)?;
        }
        write!(f, "{{")?;
        for (i, (field_name, field_value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field_name, field_value)?;
        }
        write!(f, "}}")
    }
}

/// Arbitrary-precision decimal: `unscaled × 10^-scale`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: BigInt,
    scale: i32,
}

impl Decimal {
    pub fn new(unscaled: BigInt, scale: i32) -> Self {
        Self { unscaled, scale }
    }

    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Lossy conversion to a float
    pub fn to_f64(&self) -> Option<f64> {
        self.to_string().parse().ok()
    }
}

impl fmt::Display for Decimal {
    /// Canonical decimal rendering: plain notation while the exponent stays
    /// small, scientific (`6.4206E+104`) otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.unscaled.is_negative() { "-" } else { "" };
        let coefficient = self.unscaled.abs().to_string();
        let digits = coefficient.len() as i64;
        let scale = i64::from(self.scale);
        let adjusted = digits - 1 - scale;

        if scale == 0 {
            return write!(f, "{}{}", sign, coefficient);
        }

        if scale > 0 && adjusted >= -6 {
            if digits > scale {
                let (integral, fractional) = coefficient.split_at((digits - scale) as usize);
                return write!(f, "{}{}.{}", sign, integral, fractional);
            }
            let zeros = "0".repeat((scale - digits) as usize);
            return write!(f, "{}0.{}{}", sign, zeros, coefficient);
        }

        let (lead, rest) = coefficient.split_at(1);
        write!(f, "{}{}", sign, lead)?;
        if !rest.is_empty() {
            write!(f, ".{}", rest)?;
        }
        if adjusted >= 0 {
            write!(f, "E+{}", adjusted)
        } else {
            write!(f, "E{}", adjusted)
        }
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Self::new(BigInt::zero(), 0)
    }
}

/// UUID flavour; both share the same 16-byte wire shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UuidKind {
    /// `uuid`
    Random,
    /// `timeuuid`
    TimeBased,
}

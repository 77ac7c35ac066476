//! Value constructors
//!
//! Decoders hand the richer values (UUIDs, datetimes, decimals, maps, sets,
//! user types) to constructor callbacks instead of building them directly,
//! so a driver layer can substitute its own representations. The
//! [`ValueConstructors`] set is assembled once and shared by every decoder
//! tree a [`TypeFactory`](crate::factory::TypeFactory) builds.

use crate::error::{Error, Result};
use crate::types::{Decimal, UdtValue, UuidKind, Value};
use chrono::DateTime;
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Builds a UUID value from the raw item bytes
pub type UuidConstructor = Arc<dyn Fn(&[u8; 16], UuidKind) -> Result<Value> + Send + Sync>;
/// Builds a datetime from seconds since the Unix epoch
pub type DatetimeConstructor = Arc<dyn Fn(f64) -> Result<Value> + Send + Sync>;
/// Builds a decimal from an unscaled integer and a scale
pub type DecimalConstructor = Arc<dyn Fn(BigInt, i32) -> Result<Value> + Send + Sync>;
/// Builds a map from key/value pairs in wire order
pub type OrderedMapConstructor = Arc<dyn Fn(Vec<(Value, Value)>) -> Result<Value> + Send + Sync>;
/// Builds a set from items in wire order
pub type SortedSetConstructor = Arc<dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync>;
/// Builds a user type value from named fields in declaration order
pub type MappedConstructor = Arc<dyn Fn(Vec<(String, Value)>) -> Result<Value> + Send + Sync>;
/// Builds a user type value from positional fields in declaration order
pub type TupleConstructor = Arc<dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync>;

/// Complete set of constructors required by the type factory
#[derive(Clone)]
pub struct ValueConstructors {
    pub(crate) uuid: UuidConstructor,
    pub(crate) datetime: DatetimeConstructor,
    pub(crate) decimal: DecimalConstructor,
    pub(crate) ordered_map: OrderedMapConstructor,
    pub(crate) sorted_set: SortedSetConstructor,
}

impl ValueConstructors {
    /// Constructors producing the crate's own [`Value`] representations
    pub fn native() -> Self {
        Self {
            uuid: Arc::new(native_uuid),
            datetime: Arc::new(native_datetime),
            decimal: Arc::new(native_decimal),
            ordered_map: Arc::new(native_ordered_map),
            sorted_set: Arc::new(native_sorted_set),
        }
    }

    /// Start assembling a custom constructor set
    pub fn builder() -> ValueConstructorsBuilder {
        ValueConstructorsBuilder::default()
    }

    /// Start from the native set and override individual constructors
    pub fn native_builder() -> ValueConstructorsBuilder {
        let native = Self::native();
        ValueConstructorsBuilder {
            uuid: Some(native.uuid),
            datetime: Some(native.datetime),
            decimal: Some(native.decimal),
            ordered_map: Some(native.ordered_map),
            sorted_set: Some(native.sorted_set),
        }
    }
}

impl Default for ValueConstructors {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Debug for ValueConstructors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueConstructors").finish_non_exhaustive()
    }
}

/// Collects constructors; [`build`](Self::build) fails if any is missing
#[derive(Default)]
pub struct ValueConstructorsBuilder {
    uuid: Option<UuidConstructor>,
    datetime: Option<DatetimeConstructor>,
    decimal: Option<DecimalConstructor>,
    ordered_map: Option<OrderedMapConstructor>,
    sorted_set: Option<SortedSetConstructor>,
}

impl ValueConstructorsBuilder {
    pub fn uuid<F>(mut self, f: F) -> Self
    where
        F: Fn(&[u8; 16], UuidKind) -> Result<Value> + Send + Sync + 'static,
    {
        self.uuid = Some(Arc::new(f));
        self
    }

    pub fn datetime<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) -> Result<Value> + Send + Sync + 'static,
    {
        self.datetime = Some(Arc::new(f));
        self
    }

    pub fn decimal<F>(mut self, f: F) -> Self
    where
        F: Fn(BigInt, i32) -> Result<Value> + Send + Sync + 'static,
    {
        self.decimal = Some(Arc::new(f));
        self
    }

    pub fn ordered_map<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<(Value, Value)>) -> Result<Value> + Send + Sync + 'static,
    {
        self.ordered_map = Some(Arc::new(f));
        self
    }

    pub fn sorted_set<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        self.sorted_set = Some(Arc::new(f));
        self
    }

    /// Finish the set
    ///
    /// # Errors
    ///
    /// Returns [`Error::SetupFailure`] naming the first missing constructor.
    pub fn build(self) -> Result<ValueConstructors> {
        Ok(ValueConstructors {
            uuid: self.uuid.ok_or_else(|| missing("UUID"))?,
            datetime: self.datetime.ok_or_else(|| missing("datetime"))?,
            decimal: self.decimal.ok_or_else(|| missing("decimal"))?,
            ordered_map: self.ordered_map.ok_or_else(|| missing("ordered map"))?,
            sorted_set: self.sorted_set.ok_or_else(|| missing("sorted set"))?,
        })
    }
}

fn missing(what: &str) -> Error {
    Error::setup(format!("no {} constructor available", what))
}

fn native_uuid(bytes: &[u8; 16], kind: UuidKind) -> Result<Value> {
    let uuid = Uuid::from_bytes(*bytes);
    Ok(match kind {
        UuidKind::Random => Value::Uuid(uuid),
        UuidKind::TimeBased => Value::TimeUuid(uuid),
    })
}

fn native_datetime(epoch_seconds: f64) -> Result<Value> {
    if !epoch_seconds.is_finite() {
        return Err(Error::construction(format!(
            "timestamp {} is not finite",
            epoch_seconds
        )));
    }

    let millis = (epoch_seconds * 1000.0).round();
    if millis < i64::MIN as f64 || millis > i64::MAX as f64 {
        return Err(Error::construction(format!(
            "timestamp {} is out of range",
            epoch_seconds
        )));
    }

    DateTime::from_timestamp_millis(millis as i64)
        .map(Value::Timestamp)
        .ok_or_else(|| {
            Error::construction(format!("timestamp {} is out of range", epoch_seconds))
        })
}

fn native_decimal(unscaled: BigInt, scale: i32) -> Result<Value> {
    Ok(Value::Decimal(Decimal::new(unscaled, scale)))
}

fn native_ordered_map(pairs: Vec<(Value, Value)>) -> Result<Value> {
    Ok(Value::Map(pairs))
}

fn native_sorted_set(mut items: Vec<Value>) -> Result<Value> {
    items.sort_by(compare_values);
    items.dedup_by(|a, b| compare_values(a, b) == Ordering::Equal);
    Ok(Value::Set(items))
}

/// Mapped constructor producing [`Value::Udt`]
pub fn udt_mapped(type_name: Option<String>) -> MappedConstructor {
    Arc::new(move |fields| Ok(Value::Udt(UdtValue::new(type_name.clone(), fields))))
}

/// Tuple constructor producing [`Value::Tuple`]
pub fn udt_positional() -> TupleConstructor {
    Arc::new(|items| Ok(Value::Tuple(items)))
}

/// Total order used by the native sorted-set constructor
///
/// Values of the same kind compare naturally (floats by IEEE total order);
/// values of different kinds fall back to a fixed kind rank.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Int32(x), Value::Int32(y)) => x.cmp(y),
        (Value::Int64(x), Value::Int64(y)) => x.cmp(y),
        (Value::Float32(x), Value::Float32(y)) => x.total_cmp(y),
        (Value::Float64(x), Value::Float64(y)) => x.total_cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Uuid(x), Value::Uuid(y)) | (Value::TimeUuid(x), Value::TimeUuid(y)) => x.cmp(y),
        (Value::Inet(x), Value::Inet(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Varint(x), Value::Varint(y)) => x.cmp(y),
        (Value::Decimal(x), Value::Decimal(y)) => compare_decimals(x, y),
        (Value::List(x), Value::List(y))
        | (Value::Set(x), Value::Set(y))
        | (Value::Tuple(x), Value::Tuple(y)) => compare_sequences(x.iter(), y.iter()),
        (Value::Map(x), Value::Map(y)) => {
            for ((xk, xv), (yk, yv)) in x.iter().zip(y.iter()) {
                let ord = compare_values(xk, yk).then_with(|| compare_values(xv, yv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Udt(x), Value::Udt(y)) => compare_sequences(
            x.fields.iter().map(|(_, v)| v),
            y.fields.iter().map(|(_, v)| v),
        ),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn compare_sequences<'a>(
    mut x: impl Iterator<Item = &'a Value>,
    mut y: impl Iterator<Item = &'a Value>,
) -> Ordering {
    loop {
        match (x.next(), y.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ord = compare_values(a, b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Scale gap beyond which decimals are compared approximately
const MAX_EXACT_RESCALE: i64 = 4096;

/// Compare `a × 10^-sa` with `b × 10^-sb` exactly by bringing both to the
/// larger scale.
fn compare_decimals(a: &Decimal, b: &Decimal) -> Ordering {
    let (sa, sb) = (i64::from(a.scale()), i64::from(b.scale()));
    if (sa - sb).abs() > MAX_EXACT_RESCALE {
        let approx = |d: &Decimal| d.to_f64().unwrap_or(f64::NAN);
        return approx(a).total_cmp(&approx(b));
    }

    let rescale = |value: &BigInt, by: i64| -> BigInt {
        if by == 0 {
            value.clone()
        } else {
            value * num_traits::pow(BigInt::from(10), by as usize)
        }
    };

    if sa >= sb {
        a.unscaled().cmp(&rescale(b.unscaled(), sa - sb))
    } else {
        rescale(a.unscaled(), sb - sa).cmp(b.unscaled())
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Boolean(_) => 1,
        Value::Int32(_) => 2,
        Value::Int64(_) => 3,
        Value::Varint(_) => 4,
        Value::Decimal(_) => 5,
        Value::Float32(_) => 6,
        Value::Float64(_) => 7,
        Value::Timestamp(_) => 8,
        Value::Uuid(_) => 9,
        Value::TimeUuid(_) => 10,
        Value::Inet(_) => 11,
        Value::Text(_) => 12,
        Value::Bytes(_) => 13,
        Value::List(_) => 14,
        Value::Set(_) => 15,
        Value::Map(_) => 16,
        Value::Tuple(_) => 17,
        Value::Udt(_) => 18,
    }
}

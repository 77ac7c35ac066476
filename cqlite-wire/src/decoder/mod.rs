//! Type-directed decoder tree
//!
//! One [`Decoder`] variant per CQL type kind. Leaf variants read a scalar
//! from the buffer; composite variants own their child decoders and frame
//! each child item with a length prefix. A tree is built once per result
//! shape by the [`TypeFactory`](crate::factory::TypeFactory) and is only
//! read afterwards, so it can be shared across threads.

mod composite;
mod primitive;

pub use composite::{UserTypeConstructor, UserTypeDecoder};
pub use primitive::varint_from_bytes;

pub(crate) use composite::read_item;

use crate::buffer::Buffer;
use crate::constructors::{
    DatetimeConstructor, DecimalConstructor, OrderedMapConstructor, SortedSetConstructor,
    UuidConstructor,
};
use crate::error::Result;
use crate::type_names::TypeKind;
use crate::types::{UuidKind, Value};
use std::fmt;

/// Decoder for one CQL type
pub enum Decoder {
    Boolean,
    Int32,
    /// `bigint` and `counter`
    Int64,
    Float32,
    Float64,
    /// `blob` and `ascii`
    Bytes,
    /// `text` and `varchar`
    Text,
    Inet,
    Varint,
    Uuid {
        kind: UuidKind,
        constructor: UuidConstructor,
    },
    Timestamp(DatetimeConstructor),
    Decimal(DecimalConstructor),
    List(Box<Decoder>),
    Set {
        item: Box<Decoder>,
        constructor: SortedSetConstructor,
    },
    Map {
        key: Box<Decoder>,
        value: Box<Decoder>,
        constructor: OrderedMapConstructor,
    },
    Tuple(Vec<Decoder>),
    UserType(UserTypeDecoder),
    Frozen(Box<Decoder>),
    Reversed(Box<Decoder>),
}

impl Decoder {
    /// Decode one value from `buffer`
    ///
    /// Residual-length types consume everything left in `buffer`, so callers
    /// hand in a buffer scoped to exactly one item.
    pub fn decode(&self, buffer: &mut Buffer<'_>, protocol_version: u8) -> Result<Value> {
        match self {
            Decoder::Boolean => primitive::decode_boolean(buffer),
            Decoder::Int32 => primitive::decode_int32(buffer),
            Decoder::Int64 => primitive::decode_int64(buffer),
            Decoder::Float32 => primitive::decode_float32(buffer),
            Decoder::Float64 => primitive::decode_float64(buffer),
            Decoder::Bytes => Ok(primitive::decode_bytes(buffer)),
            Decoder::Text => primitive::decode_text(buffer),
            Decoder::Inet => primitive::decode_inet(buffer),
            Decoder::Varint => Ok(primitive::decode_varint(buffer)),
            Decoder::Uuid { kind, constructor } => {
                primitive::decode_uuid(buffer, *kind, constructor)
            }
            Decoder::Timestamp(constructor) => primitive::decode_timestamp(buffer, constructor),
            Decoder::Decimal(constructor) => primitive::decode_decimal(buffer, constructor),
            Decoder::List(item) => composite::decode_list(item, buffer, protocol_version),
            Decoder::Set { item, constructor } => {
                composite::decode_set(item, constructor, buffer, protocol_version)
            }
            Decoder::Map {
                key,
                value,
                constructor,
            } => composite::decode_map(key, value, constructor, buffer, protocol_version),
            Decoder::Tuple(items) => composite::decode_tuple(items, buffer, protocol_version),
            Decoder::UserType(user_type) => user_type.decode(buffer, protocol_version),
            Decoder::Frozen(inner) | Decoder::Reversed(inner) => {
                inner.decode(buffer, protocol_version)
            }
        }
    }

    /// Value of an absent (`-1` length) item
    pub fn empty(&self) -> Value {
        Value::Null
    }

    /// Type kind this decoder was built for
    pub fn kind(&self) -> TypeKind {
        match self {
            Decoder::Boolean => TypeKind::Boolean,
            Decoder::Int32 => TypeKind::Int,
            Decoder::Int64 => TypeKind::BigInt,
            Decoder::Float32 => TypeKind::Float,
            Decoder::Float64 => TypeKind::Double,
            Decoder::Bytes => TypeKind::Blob,
            Decoder::Text => TypeKind::Text,
            Decoder::Inet => TypeKind::Inet,
            Decoder::Varint => TypeKind::Varint,
            Decoder::Uuid {
                kind: UuidKind::Random,
                ..
            } => TypeKind::Uuid,
            Decoder::Uuid {
                kind: UuidKind::TimeBased,
                ..
            } => TypeKind::TimeUuid,
            Decoder::Timestamp(_) => TypeKind::Timestamp,
            Decoder::Decimal(_) => TypeKind::Decimal,
            Decoder::List(_) => TypeKind::List,
            Decoder::Set { .. } => TypeKind::Set,
            Decoder::Map { .. } => TypeKind::Map,
            Decoder::Tuple(_) => TypeKind::Tuple,
            Decoder::UserType(_) => TypeKind::UserType,
            Decoder::Frozen(_) => TypeKind::Frozen,
            Decoder::Reversed(_) => TypeKind::Reversed,
        }
    }

    /// Number of decoders in this tree, root included
    pub fn node_count(&self) -> usize {
        1 + match self {
            Decoder::List(inner)
            | Decoder::Set { item: inner, .. }
            | Decoder::Frozen(inner)
            | Decoder::Reversed(inner) => inner.node_count(),
            Decoder::Map { key, value, .. } => key.node_count() + value.node_count(),
            Decoder::Tuple(items) => items.iter().map(Decoder::node_count).sum(),
            Decoder::UserType(user_type) => user_type
                .fields()
                .iter()
                .map(|(_, decoder)| decoder.node_count())
                .sum(),
            _ => 0,
        }
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoder::Uuid { kind, .. } => f.debug_tuple("Uuid").field(kind).finish(),
            Decoder::List(item) => f.debug_tuple("List").field(item).finish(),
            Decoder::Set { item, .. } => f.debug_tuple("Set").field(item).finish(),
            Decoder::Map { key, value, .. } => {
                f.debug_tuple("Map").field(key).field(value).finish()
            }
            Decoder::Tuple(items) => f.debug_tuple("Tuple").field(items).finish(),
            Decoder::UserType(user_type) => fmt::Debug::fmt(user_type, f),
            Decoder::Frozen(inner) => f.debug_tuple("Frozen").field(inner).finish(),
            Decoder::Reversed(inner) => f.debug_tuple("Reversed").field(inner).finish(),
            Decoder::Timestamp(_) => f.write_str("Timestamp"),
            Decoder::Decimal(_) => f.write_str("Decimal"),
            Decoder::Boolean => f.write_str("Boolean"),
            Decoder::Int32 => f.write_str("Int32"),
            Decoder::Int64 => f.write_str("Int64"),
            Decoder::Float32 => f.write_str("Float32"),
            Decoder::Float64 => f.write_str("Float64"),
            Decoder::Bytes => f.write_str("Bytes"),
            Decoder::Text => f.write_str("Text"),
            Decoder::Inet => f.write_str("Inet"),
            Decoder::Varint => f.write_str("Varint"),
        }
    }
}

//! CQLite Wire
//!
//! Decoder for values encoded in the Cassandra native (CQL) binary protocol.
//! Given the bytes of a value or of a whole result set and a description of
//! the CQL types involved, it produces the same values a conforming CQL
//! client exposes: every primitive scalar, nested collections, tuples and
//! user defined types, under both the pre-v3 (2-byte) and v3+ (4-byte)
//! framing.
//!
//! ```
//! use cqlite_wire::{deserialize_one, TypeDescriptor, Value};
//!
//! let list_of_int = TypeDescriptor::parse("list<int>").unwrap();
//! let raw = [0, 0, 0, 1, 0, 0, 0, 4, 0, 0, 0, 42];
//! let value = deserialize_one(&raw, &list_of_int, 3).unwrap();
//! assert_eq!(value, Value::List(vec![Value::Int32(42)]));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod config;
pub mod constructors;
pub mod decoder;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod row_reader;
pub mod type_names;
pub mod types;

pub use crate::{
    buffer::Buffer,
    config::DecodeConfig,
    constructors::ValueConstructors,
    decoder::Decoder,
    descriptor::{parse_type_expr, TypeDescriptor, UserTypeSpec},
    error::{Error, ErrorCategory, Result},
    factory::TypeFactory,
    row_reader::{ResultRowReader, Row},
    type_names::TypeKind,
    types::{Decimal, UdtValue, UuidKind, Value},
};

use once_cell::sync::Lazy;

/// Protocol version assumed when the caller does not name one
pub const DEFAULT_PROTOCOL_VERSION: u8 = 3;

static NATIVE_FACTORY: Lazy<TypeFactory> = Lazy::new(TypeFactory::native);

/// Decode one value with the native constructors
pub fn deserialize_one(
    raw: &[u8],
    descriptor: &TypeDescriptor,
    protocol_version: u8,
) -> Result<Value> {
    NATIVE_FACTORY.deserialize_one(raw, descriptor, protocol_version)
}

/// Decode `row_count` result rows with the native constructors
pub fn deserialize_rows(
    raw: &[u8],
    row_count: usize,
    columns: &[TypeDescriptor],
    protocol_version: u8,
) -> Result<Vec<Row>> {
    NATIVE_FACTORY.deserialize_rows(raw, row_count, columns, protocol_version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_one() {
        let descriptor = TypeDescriptor::new("int");
        assert_eq!(
            deserialize_one(&[0, 0, 0, 42], &descriptor, DEFAULT_PROTOCOL_VERSION).unwrap(),
            Value::Int32(42)
        );
    }

    #[test]
    fn test_deserialize_rows_unknown_column() {
        let columns = [TypeDescriptor::new("int"), TypeDescriptor::new("duration")];
        let err = deserialize_rows(&[], 0, &columns, DEFAULT_PROTOCOL_VERSION).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(ref name) if name == "duration"));
    }
}

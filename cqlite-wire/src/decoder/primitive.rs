//! Leaf decoders
//!
//! Fixed-width types read exactly their width; residual-length types take
//! everything left in the item buffer.

use crate::buffer::Buffer;
use crate::constructors::{DatetimeConstructor, DecimalConstructor, UuidConstructor};
use crate::error::{Error, Result};
use crate::types::{UuidKind, Value};
use num_bigint::BigInt;
use std::net::IpAddr;

pub(super) fn decode_boolean(buffer: &mut Buffer<'_>) -> Result<Value> {
    Ok(Value::Boolean(buffer.read_u8()? != 0))
}

pub(super) fn decode_int32(buffer: &mut Buffer<'_>) -> Result<Value> {
    buffer.read_i32().map(Value::Int32)
}

pub(super) fn decode_int64(buffer: &mut Buffer<'_>) -> Result<Value> {
    buffer.read_i64().map(Value::Int64)
}

pub(super) fn decode_float32(buffer: &mut Buffer<'_>) -> Result<Value> {
    buffer
        .read_array()
        .map(|bytes| Value::Float32(f32::from_be_bytes(bytes)))
}

pub(super) fn decode_float64(buffer: &mut Buffer<'_>) -> Result<Value> {
    buffer
        .read_array()
        .map(|bytes| Value::Float64(f64::from_be_bytes(bytes)))
}

pub(super) fn decode_bytes(buffer: &mut Buffer<'_>) -> Value {
    Value::Bytes(buffer.take_rest().to_vec())
}

pub(super) fn decode_text(buffer: &mut Buffer<'_>) -> Result<Value> {
    let text = std::str::from_utf8(buffer.take_rest())?;
    Ok(Value::Text(text.to_owned()))
}

pub(super) fn decode_inet(buffer: &mut Buffer<'_>) -> Result<Value> {
    let raw = buffer.take_rest();
    let address = match raw.len() {
        4 => {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(raw);
            IpAddr::from(octets)
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(raw);
            IpAddr::from(octets)
        }
        n => return Err(Error::MalformedAddress(n)),
    };
    Ok(Value::Inet(address))
}

/// Big-endian two's-complement integer of any width; empty input is zero
pub fn varint_from_bytes(bytes: &[u8]) -> BigInt {
    BigInt::from_signed_bytes_be(bytes)
}

pub(super) fn decode_varint(buffer: &mut Buffer<'_>) -> Value {
    Value::Varint(varint_from_bytes(buffer.take_rest()))
}

pub(super) fn decode_uuid(
    buffer: &mut Buffer<'_>,
    kind: UuidKind,
    constructor: &UuidConstructor,
) -> Result<Value> {
    let raw = buffer.take_rest();
    let bytes: &[u8; 16] = raw.try_into().map_err(|_| {
        Error::construction(format!("UUID must be 16 bytes, got {}", raw.len()))
    })?;
    constructor(bytes, kind)
}

/// Milliseconds since the epoch, handed on as fractional seconds
pub(super) fn decode_timestamp(
    buffer: &mut Buffer<'_>,
    constructor: &DatetimeConstructor,
) -> Result<Value> {
    let millis = buffer.read_i64()?;
    constructor(millis as f64 / 1000.0)
}

/// 4-byte scale followed by the unscaled value as a varint
pub(super) fn decode_decimal(
    buffer: &mut Buffer<'_>,
    constructor: &DecimalConstructor,
) -> Result<Value> {
    let scale = buffer.read_i32()?;
    let unscaled = varint_from_bytes(buffer.take_rest());
    constructor(unscaled, scale)
}

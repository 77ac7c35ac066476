//! Composite decoders
//!
//! Collections frame their count and item lengths with 2 bytes before
//! protocol version 3 and 4 bytes from version 3 on. Tuples and user types
//! always use 4-byte item lengths and decode their children as version 3 or
//! later.

use super::Decoder;
use crate::buffer::{Buffer, LONG_LENGTH_PROTOCOL_VERSION};
use crate::constructors::{
    MappedConstructor, OrderedMapConstructor, SortedSetConstructor, TupleConstructor,
};
use crate::error::{Error, Result};
use crate::types::Value;
use std::fmt;

/// Read one length-prefixed item
///
/// Returns `None` for the absent marker (`-1`), otherwise a buffer scoped to
/// exactly the item's bytes.
pub(crate) fn read_item<'a>(
    buffer: &mut Buffer<'a>,
    protocol_version: u8,
    context: &str,
) -> Result<Option<Buffer<'a>>> {
    match buffer.read_length(protocol_version)? {
        -1 => Ok(None),
        length if length < 0 => Err(Error::invalid_length(format!(
            "negative item size {} in {}",
            length, context
        ))),
        length => buffer.sub_buffer(length as usize).map(Some),
    }
}

fn decode_item(
    decoder: &Decoder,
    buffer: &mut Buffer<'_>,
    protocol_version: u8,
    context: &str,
) -> Result<Value> {
    match read_item(buffer, protocol_version, context)? {
        Some(mut item) => decoder.decode(&mut item, protocol_version),
        None => Ok(decoder.empty()),
    }
}

fn read_count(buffer: &mut Buffer<'_>, protocol_version: u8, context: &str) -> Result<usize> {
    let count = buffer.read_length(protocol_version)?;
    usize::try_from(count)
        .map_err(|_| Error::invalid_length(format!("negative item count {} in {}", count, context)))
}

fn decode_items(
    item: &Decoder,
    buffer: &mut Buffer<'_>,
    protocol_version: u8,
    context: &str,
) -> Result<Vec<Value>> {
    let count = read_count(buffer, protocol_version, context)?;
    // every item costs at least its length prefix
    let mut items = Vec::with_capacity(count.min(buffer.residual()));
    for _ in 0..count {
        items.push(decode_item(item, buffer, protocol_version, context)?);
    }
    Ok(items)
}

pub(super) fn decode_list(
    item: &Decoder,
    buffer: &mut Buffer<'_>,
    protocol_version: u8,
) -> Result<Value> {
    decode_items(item, buffer, protocol_version, "list").map(Value::List)
}

pub(super) fn decode_set(
    item: &Decoder,
    constructor: &SortedSetConstructor,
    buffer: &mut Buffer<'_>,
    protocol_version: u8,
) -> Result<Value> {
    let items = decode_items(item, buffer, protocol_version, "set")?;
    constructor(items)
}

pub(super) fn decode_map(
    key: &Decoder,
    value: &Decoder,
    constructor: &OrderedMapConstructor,
    buffer: &mut Buffer<'_>,
    protocol_version: u8,
) -> Result<Value> {
    let count = read_count(buffer, protocol_version, "map")?;
    let mut pairs = Vec::with_capacity(count.min(buffer.residual()));
    for _ in 0..count {
        let k = decode_item(key, buffer, protocol_version, "map key")?;
        let v = decode_item(value, buffer, protocol_version, "map value")?;
        pairs.push((k, v));
    }
    constructor(pairs)
}

/// Decode a fixed number of 4-byte-prefixed items, padding with `Null` once
/// the buffer runs out
fn decode_fixed_arity<'d>(
    decoders: impl ExactSizeIterator<Item = &'d Decoder>,
    buffer: &mut Buffer<'_>,
    protocol_version: u8,
    context: &str,
) -> Result<Vec<Value>> {
    let protocol_version = protocol_version.max(LONG_LENGTH_PROTOCOL_VERSION);
    let arity = decoders.len();
    let mut values = Vec::with_capacity(arity);

    for decoder in decoders {
        if buffer.is_exhausted() {
            break;
        }
        values.push(decode_item(decoder, buffer, protocol_version, context)?);
    }

    values.resize(arity, Value::Null);
    Ok(values)
}

pub(super) fn decode_tuple(
    items: &[Decoder],
    buffer: &mut Buffer<'_>,
    protocol_version: u8,
) -> Result<Value> {
    decode_fixed_arity(items.iter(), buffer, protocol_version, "tuple").map(Value::Tuple)
}

/// How a user type assembles its decoded fields
#[derive(Clone)]
pub enum UserTypeConstructor {
    /// Ordered field name → value pairs
    Mapped(MappedConstructor),
    /// Field values in declaration order
    Positional(TupleConstructor),
}

/// Decoder for a user defined type: named fields in declaration order
pub struct UserTypeDecoder {
    type_name: Option<String>,
    fields: Vec<(String, Decoder)>,
    constructor: UserTypeConstructor,
}

impl UserTypeDecoder {
    pub fn new(
        type_name: Option<String>,
        fields: Vec<(String, Decoder)>,
        constructor: UserTypeConstructor,
    ) -> Self {
        Self {
            type_name,
            fields,
            constructor,
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn fields(&self) -> &[(String, Decoder)] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub(super) fn decode(&self, buffer: &mut Buffer<'_>, protocol_version: u8) -> Result<Value> {
        let values = decode_fixed_arity(
            self.fields.iter().map(|(_, decoder)| decoder),
            buffer,
            protocol_version,
            "user type",
        )?;

        match &self.constructor {
            UserTypeConstructor::Mapped(constructor) => constructor(
                self.fields
                    .iter()
                    .map(|(name, _)| name.clone())
                    .zip(values)
                    .collect(),
            ),
            UserTypeConstructor::Positional(constructor) => constructor(values),
        }
    }
}

impl fmt::Debug for UserTypeDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let constructor = match self.constructor {
            UserTypeConstructor::Mapped(_) => "mapped",
            UserTypeConstructor::Positional(_) => "positional",
        };
        f.debug_struct("UserType")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("constructor", &constructor)
            .finish()
    }
}

//! Result set row reader
//!
//! Every cell of a result row is framed with a 4-byte signed length,
//! regardless of protocol version: `-1` for an absent value, otherwise
//! exactly that many bytes, which are handed to the column's decoder.

use crate::buffer::{Buffer, LONG_LENGTH_PROTOCOL_VERSION};
use crate::decoder::{read_item, Decoder};
use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::factory::TypeFactory;
use crate::types::Value;
use log::trace;
use std::iter::FusedIterator;

/// One decoded result row, one value per column
pub type Row = Vec<Value>;

/// Decodes whole rows with one decoder per column
#[derive(Debug)]
pub struct ResultRowReader {
    decoders: Vec<Decoder>,
}

impl ResultRowReader {
    pub fn new(decoders: Vec<Decoder>) -> Self {
        Self { decoders }
    }

    /// Resolve the column types through `factory`
    pub fn from_descriptors(factory: &TypeFactory, columns: &[TypeDescriptor]) -> Result<Self> {
        factory.vectorize_many(columns).map(Self::new)
    }

    pub fn column_count(&self) -> usize {
        self.decoders.len()
    }

    pub fn decoders(&self) -> &[Decoder] {
        &self.decoders
    }

    /// Decode a single row
    pub fn read_row(&self, buffer: &mut Buffer<'_>, protocol_version: u8) -> Result<Row> {
        let row = self
            .decoders
            .iter()
            .map(|decoder| {
                match read_item(buffer, LONG_LENGTH_PROTOCOL_VERSION, "result row")? {
                    Some(mut cell) => decoder.decode(&mut cell, protocol_version),
                    None => Ok(decoder.empty()),
                }
            })
            .collect::<Result<Row>>()?;

        trace!(
            "Decoded row of {} columns, {} bytes remaining",
            row.len(),
            buffer.residual()
        );
        Ok(row)
    }

    /// Decode `row_count` rows; any error aborts the whole read
    pub fn read_all(
        &self,
        buffer: &mut Buffer<'_>,
        row_count: usize,
        protocol_version: u8,
    ) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(row_count.min(buffer.residual()));
        for _ in 0..row_count {
            rows.push(self.read_row(buffer, protocol_version)?);
        }
        Ok(rows)
    }

    /// Lazily decode up to `row_count` rows
    ///
    /// The iterator yields the first error it meets and then stops.
    pub fn rows<'r, 'a>(
        &'r self,
        buffer: Buffer<'a>,
        row_count: usize,
        protocol_version: u8,
    ) -> Rows<'r, 'a> {
        Rows {
            reader: self,
            buffer,
            remaining: row_count,
            protocol_version,
        }
    }
}

/// Iterator returned by [`ResultRowReader::rows`]
#[derive(Debug)]
pub struct Rows<'r, 'a> {
    reader: &'r ResultRowReader,
    buffer: Buffer<'a>,
    remaining: usize,
    protocol_version: u8,
}

impl Rows<'_, '_> {
    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.buffer.position()
    }
}

impl Iterator for Rows<'_, '_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let row = self.reader.read_row(&mut self.buffer, self.protocol_version);
        self.remaining = if row.is_ok() { self.remaining - 1 } else { 0 };
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl FusedIterator for Rows<'_, '_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn reader(columns: &[&str]) -> ResultRowReader {
        let descriptors: Vec<_> = columns
            .iter()
            .map(|c| TypeDescriptor::parse(c).unwrap())
            .collect();
        ResultRowReader::from_descriptors(&TypeFactory::native(), &descriptors).unwrap()
    }

    fn bytes(hex_str: &str) -> Vec<u8> {
        hex::decode(hex_str.replace(' ', "")).unwrap()
    }

    #[test]
    fn test_read_all() {
        let reader = reader(&["int", "list<int>"]);
        let data = bytes(
            "00000004 0000002a  00000010 00000002 00000004 00000001 ffffffff \
             ffffffff           00000004 00000000",
        );

        let rows = reader.read_all(&mut Buffer::new(&data), 2, 3).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![
                    Value::Int32(42),
                    Value::List(vec![Value::Int32(1), Value::Null])
                ],
                vec![Value::Null, Value::List(vec![])],
            ]
        );
    }

    #[test]
    fn test_cell_prefix_is_four_bytes_in_v2() {
        let reader = reader(&["set<int>"]);
        // 2-byte collection framing inside a 4-byte cell length
        let data = bytes("00000008 0001 0004 00000005");
        let rows = reader.read_all(&mut Buffer::new(&data), 1, 2).unwrap();
        assert_eq!(rows, vec![vec![Value::Set(vec![Value::Int32(5)])]]);
    }

    #[test]
    fn test_zero_rows() {
        let reader = reader(&["int"]);
        assert!(reader.read_all(&mut Buffer::new(&[]), 0, 3).unwrap().is_empty());
        assert_eq!(reader.column_count(), 1);
    }

    #[test]
    fn test_read_all_errors() {
        let reader = reader(&["int"]);

        let data = bytes("fffffffe");
        assert!(matches!(
            reader.read_all(&mut Buffer::new(&data), 1, 3),
            Err(Error::InvalidLength(_))
        ));

        let data = bytes("00000004 00000001");
        assert!(matches!(
            reader.read_all(&mut Buffer::new(&data), 2, 3),
            Err(Error::EndOfBuffer { .. })
        ));

        let data = bytes("00000008 0000");
        assert!(matches!(
            reader.read_all(&mut Buffer::new(&data), 1, 3),
            Err(Error::EndOfBuffer { .. })
        ));
    }

    #[test]
    fn test_rows_iterator_stops_after_error() {
        let reader = reader(&["int"]);
        let data = bytes("00000004 00000007 00000004 0000");

        let mut rows = reader.rows(Buffer::new(&data), 3, 3);
        assert_eq!(rows.next().unwrap().unwrap(), vec![Value::Int32(7)]);
        assert_eq!(rows.position(), 8);
        assert!(rows.next().unwrap().is_err());
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_rows_iterator_collects() {
        let reader = reader(&["boolean", "text"]);
        let data = bytes("00000001 01 00000002 6869 00000001 00 ffffffff");
        let rows: Result<Vec<Row>> = reader.rows(Buffer::new(&data), 2, 4).collect();
        assert_eq!(
            rows.unwrap(),
            vec![
                vec![Value::Boolean(true), Value::Text("hi".into())],
                vec![Value::Boolean(false), Value::Null],
            ]
        );
    }
}

//! Bounds-checked read cursor over a borrowed byte range
//!
//! Every read in the decoder goes through [`Buffer::consume`], which either
//! returns the requested slice and advances, or fails without moving the
//! cursor. Length-prefixed items are decoded through a [`Buffer::sub_buffer`]
//! so a corrupt inner length can never read past its own slice.

use crate::error::{Error, Result};

/// Protocol version from which collection counts and item lengths are 4 bytes
pub const LONG_LENGTH_PROTOCOL_VERSION: u8 = 3;

/// Forward-only cursor over a borrowed byte range
#[derive(Debug, Clone)]
pub struct Buffer<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> Buffer<'a> {
    /// Create a cursor positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    /// Take the next `n` bytes
    ///
    /// Fails with [`Error::EndOfBuffer`] and leaves the cursor where it was
    /// if fewer than `n` bytes remain.
    pub fn consume(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.residual();
        if available < n {
            return Err(Error::end_of_buffer(n, available));
        }

        let start = self.cursor;
        self.cursor += n;
        Ok(&self.data[start..self.cursor])
    }

    /// Number of unread bytes
    pub fn residual(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// Number of bytes already consumed
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.residual() == 0
    }

    /// Take everything that is left
    pub fn take_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.cursor..];
        self.cursor = self.data.len();
        rest
    }

    /// Carve the next `n` bytes off into an independent cursor
    pub fn sub_buffer(&mut self, n: usize) -> Result<Buffer<'a>> {
        self.consume(n).map(Buffer::new)
    }

    /// Consume exactly `N` bytes into an array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.consume(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_array().map(i16::from_be_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_be_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_array().map(i64::from_be_bytes)
    }

    /// Read a collection count or item length prefix
    ///
    /// Protocol versions 3 and later use a 4-byte signed prefix, earlier
    /// versions a 2-byte signed prefix.
    pub fn read_length(&mut self, protocol_version: u8) -> Result<i32> {
        if protocol_version >= LONG_LENGTH_PROTOCOL_VERSION {
            self.read_i32()
        } else {
            self.read_i16().map(i32::from)
        }
    }
}

/// Width in bytes of a count/length prefix for the given protocol version
pub fn length_prefix_size(protocol_version: u8) -> usize {
    if protocol_version >= LONG_LENGTH_PROTOCOL_VERSION {
        4
    } else {
        2
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte cursors for the tagged value encoding.
//!
//! The writer appends to a growable buffer and cannot fail; the reader is
//! bounds-checked and reports the offset of the first byte it could not read.

use crate::error::{Error, Result};

macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    };
}

macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Append-only writer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buffer: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    impl_write_le!(write_i8, i8);
    impl_write_le!(write_u16_le, u16);
    impl_write_le!(write_i16_le, i16);
    impl_write_le!(write_u32_le, u32);
    impl_write_le!(write_i32_le, i32);
    impl_write_le!(write_u64_le, u64);
    impl_write_le!(write_i64_le, i64);

    pub fn write_f32_le(&mut self, value: f32) {
        self.write_u32_le(value.to_bits());
    }

    pub fn write_f64_le(&mut self, value: f64) {
        self.write_u64_le(value.to_bits());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// `u32` length prefix followed by the bytes.
    pub fn write_sized(&mut self, data: &[u8]) -> Result<()> {
        let len = u32::try_from(data.len()).map_err(|_| {
            Error::not_serializable(format!("{} bytes exceed the u32 length prefix", data.len()))
        })?;
        self.write_u32_le(len);
        self.write_bytes(data);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

/// Bounds-checked reader over a borrowed buffer.
pub struct WireReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_i8, i8, 1);
    impl_read_le!(read_u16_le, u16, 2);
    impl_read_le!(read_i16_le, i16, 2);
    impl_read_le!(read_u32_le, u32, 4);
    impl_read_le!(read_i32_le, i32, 4);
    impl_read_le!(read_u64_le, u64, 8);
    impl_read_le!(read_i64_le, i64, 8);

    pub fn read_f32_le(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32_le()?))
    }

    pub fn read_f64_le(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64_le()?))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::decode(self.offset, "unexpected end of buffer"));
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// Reads a `u32` length prefix and that many bytes.
    pub fn read_sized(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32_le()? as usize;
        self.read_bytes(len)
    }

    /// Reads a `u32` element count, rejecting counts the remaining bytes
    /// could not possibly hold (every element takes at least one byte).
    pub fn read_count(&mut self) -> Result<usize> {
        let at = self.offset;
        let count = self.read_u32_le()? as usize;
        if count > self.remaining() {
            return Err(Error::decode(
                at,
                format!("count {} exceeds the {} remaining bytes", count, self.remaining()),
            ));
        }
        Ok(count)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_are_little_endian() {
        let mut writer = WireWriter::new();
        writer.write_u16_le(0xABCD);
        writer.write_i32_le(-2);
        writer.write_f64_le(std::f64::consts::PI);
        let bytes = writer.into_inner();
        assert_eq!(&bytes[..2], &[0xCD, 0xAB]);

        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_u16_le().unwrap(), 0xABCD);
        assert_eq!(reader.read_i32_le().unwrap(), -2);
        assert_eq!(reader.read_f64_le().unwrap(), std::f64::consts::PI);
        assert!(reader.is_eof());
    }

    #[test]
    fn test_read_overflow_reports_offset() {
        let buffer = [0u8; 3];
        let mut reader = WireReader::new(&buffer);
        assert_eq!(reader.read_u8().unwrap(), 0);
        match reader.read_u32_le().unwrap_err() {
            Error::Decode { offset, reason } => {
                assert_eq!(offset, 1);
                assert_eq!(reason, "unexpected end of buffer");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_oversized_count_rejected() {
        let mut writer = WireWriter::new();
        writer.write_u32_le(u32::MAX);
        writer.write_u8(0);
        let bytes = writer.into_inner();
        let mut reader = WireReader::new(&bytes);
        assert!(reader.read_count().is_err());
    }

    #[test]
    fn test_sized_roundtrip() {
        let mut writer = WireWriter::new();
        writer.write_sized(b"abc").unwrap();
        let bytes = writer.into_inner();
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_sized().unwrap(), b"abc");
    }
}

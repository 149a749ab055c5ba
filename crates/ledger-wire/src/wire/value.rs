// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Self-describing tagged value encoding.
//!
//! Every value starts with a one-byte constructor tag. Multi-byte scalars are
//! little-endian; strings, symbols and binaries carry a `u32` byte length;
//! lists and maps carry a `u32` element count. A described value is the
//! `DESCRIBED` tag, a descriptor (symbol or `ulong` code) and one body value.

use super::cursor::{WireReader, WireWriter};
use crate::error::{Error, Result};
use std::fmt;

pub mod tag {
    pub const DESCRIBED: u8 = 0x00;
    pub const NULL: u8 = 0x40;
    pub const TRUE: u8 = 0x41;
    pub const FALSE: u8 = 0x42;
    pub const UBYTE: u8 = 0x50;
    pub const BYTE: u8 = 0x51;
    pub const USHORT: u8 = 0x60;
    pub const SHORT: u8 = 0x61;
    pub const UINT: u8 = 0x70;
    pub const INT: u8 = 0x71;
    pub const FLOAT: u8 = 0x72;
    pub const CHAR: u8 = 0x73;
    pub const ULONG: u8 = 0x80;
    pub const LONG: u8 = 0x81;
    pub const DOUBLE: u8 = 0x82;
    pub const BINARY: u8 = 0xb0;
    pub const STRING: u8 = 0xb1;
    pub const SYMBOL: u8 = 0xb3;
    pub const LIST: u8 = 0xd0;
    pub const MAP: u8 = 0xd1;
    /// Back-reference to a previously completed composite, by index.
    pub const REFERENCE: u8 = 0xf0;
}

/// Descriptor of a described value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WireDescriptor {
    Symbol(String),
    Code(u64),
}

impl fmt::Display for WireDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireDescriptor::Symbol(s) => f.write_str(s),
            WireDescriptor::Code(code) => write!(f, "{:#x}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Bool(bool),
    UByte(u8),
    Byte(i8),
    UShort(u16),
    Short(i16),
    UInt(u32),
    Int(i32),
    ULong(u64),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
    Symbol(String),
    Binary(Vec<u8>),
    List(Vec<WireValue>),
    Map(Vec<(WireValue, WireValue)>),
    Described {
        descriptor: WireDescriptor,
        body: Box<WireValue>,
    },
    Reference(u32),
}

impl WireValue {
    pub fn described(descriptor: WireDescriptor, body: WireValue) -> Self {
        WireValue::Described {
            descriptor,
            body: Box::new(body),
        }
    }

    /// Described list under a numeric descriptor, the shape of every
    /// envelope structure.
    pub fn described_list(code: u64, items: Vec<WireValue>) -> Self {
        Self::described(WireDescriptor::Code(code), WireValue::List(items))
    }

    pub fn string(s: impl Into<String>) -> Self {
        WireValue::String(s.into())
    }

    pub fn symbol(s: impl Into<String>) -> Self {
        WireValue::Symbol(s.into())
    }

    pub fn optional_string(s: Option<&str>) -> Self {
        s.map_or(WireValue::Null, |s| WireValue::String(s.to_string()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) | WireValue::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            WireValue::UByte(v) => Some(u64::from(*v)),
            WireValue::UShort(v) => Some(u64::from(*v)),
            WireValue::UInt(v) => Some(u64::from(*v)),
            WireValue::ULong(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    /// Body of a described value carrying the given numeric descriptor.
    pub fn described_body(&self, code: u64) -> Option<&WireValue> {
        match self {
            WireValue::Described {
                descriptor: WireDescriptor::Code(c),
                body,
            } if *c == code => Some(body),
            _ => None,
        }
    }

    /// Short label for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Bool(_) => "boolean",
            WireValue::UByte(_) => "ubyte",
            WireValue::Byte(_) => "byte",
            WireValue::UShort(_) => "ushort",
            WireValue::Short(_) => "short",
            WireValue::UInt(_) => "uint",
            WireValue::Int(_) => "int",
            WireValue::ULong(_) => "ulong",
            WireValue::Long(_) => "long",
            WireValue::Float(_) => "float",
            WireValue::Double(_) => "double",
            WireValue::Char(_) => "char",
            WireValue::String(_) => "string",
            WireValue::Symbol(_) => "symbol",
            WireValue::Binary(_) => "binary",
            WireValue::List(_) => "list",
            WireValue::Map(_) => "map",
            WireValue::Described { .. } => "described",
            WireValue::Reference(_) => "reference",
        }
    }

    pub fn encode(&self, out: &mut WireWriter) -> Result<()> {
        match self {
            WireValue::Null => out.write_u8(tag::NULL),
            WireValue::Bool(true) => out.write_u8(tag::TRUE),
            WireValue::Bool(false) => out.write_u8(tag::FALSE),
            WireValue::UByte(v) => {
                out.write_u8(tag::UBYTE);
                out.write_u8(*v);
            }
            WireValue::Byte(v) => {
                out.write_u8(tag::BYTE);
                out.write_i8(*v);
            }
            WireValue::UShort(v) => {
                out.write_u8(tag::USHORT);
                out.write_u16_le(*v);
            }
            WireValue::Short(v) => {
                out.write_u8(tag::SHORT);
                out.write_i16_le(*v);
            }
            WireValue::UInt(v) => {
                out.write_u8(tag::UINT);
                out.write_u32_le(*v);
            }
            WireValue::Int(v) => {
                out.write_u8(tag::INT);
                out.write_i32_le(*v);
            }
            WireValue::ULong(v) => {
                out.write_u8(tag::ULONG);
                out.write_u64_le(*v);
            }
            WireValue::Long(v) => {
                out.write_u8(tag::LONG);
                out.write_i64_le(*v);
            }
            WireValue::Float(v) => {
                out.write_u8(tag::FLOAT);
                out.write_f32_le(*v);
            }
            WireValue::Double(v) => {
                out.write_u8(tag::DOUBLE);
                out.write_f64_le(*v);
            }
            WireValue::Char(c) => {
                out.write_u8(tag::CHAR);
                out.write_u32_le(u32::from(*c));
            }
            WireValue::String(s) => {
                out.write_u8(tag::STRING);
                out.write_sized(s.as_bytes())?;
            }
            WireValue::Symbol(s) => {
                out.write_u8(tag::SYMBOL);
                out.write_sized(s.as_bytes())?;
            }
            WireValue::Binary(b) => {
                out.write_u8(tag::BINARY);
                out.write_sized(b)?;
            }
            WireValue::List(items) => {
                out.write_u8(tag::LIST);
                out.write_u32_le(count(items.len())?);
                for item in items {
                    item.encode(out)?;
                }
            }
            WireValue::Map(entries) => {
                out.write_u8(tag::MAP);
                out.write_u32_le(count(entries.len())?);
                for (key, value) in entries {
                    key.encode(out)?;
                    value.encode(out)?;
                }
            }
            WireValue::Described { descriptor, body } => {
                out.write_u8(tag::DESCRIBED);
                match descriptor {
                    WireDescriptor::Symbol(s) => {
                        out.write_u8(tag::SYMBOL);
                        out.write_sized(s.as_bytes())?;
                    }
                    WireDescriptor::Code(code) => {
                        out.write_u8(tag::ULONG);
                        out.write_u64_le(*code);
                    }
                }
                body.encode(out)?;
            }
            WireValue::Reference(index) => {
                out.write_u8(tag::REFERENCE);
                out.write_u32_le(*index);
            }
        }
        Ok(())
    }

    /// Decode one value, refusing to nest deeper than `max_depth`.
    pub fn decode(input: &mut WireReader<'_>, max_depth: usize) -> Result<WireValue> {
        decode_at(input, 0, max_depth)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = WireWriter::new();
        self.encode(&mut writer)?;
        Ok(writer.into_inner())
    }
}

fn count(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| Error::not_serializable(format!("{} elements exceed the u32 count", len)))
}

fn utf8(input: &WireReader<'_>, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::decode(input.offset(), format!("invalid UTF-8: {}", e)))
}

fn decode_at(input: &mut WireReader<'_>, depth: usize, max_depth: usize) -> Result<WireValue> {
    if depth > max_depth {
        return Err(Error::decode(
            input.offset(),
            format!("nesting deeper than {}", max_depth),
        ));
    }
    let at = input.offset();
    let value = match input.read_u8()? {
        tag::NULL => WireValue::Null,
        tag::TRUE => WireValue::Bool(true),
        tag::FALSE => WireValue::Bool(false),
        tag::UBYTE => WireValue::UByte(input.read_u8()?),
        tag::BYTE => WireValue::Byte(input.read_i8()?),
        tag::USHORT => WireValue::UShort(input.read_u16_le()?),
        tag::SHORT => WireValue::Short(input.read_i16_le()?),
        tag::UINT => WireValue::UInt(input.read_u32_le()?),
        tag::INT => WireValue::Int(input.read_i32_le()?),
        tag::ULONG => WireValue::ULong(input.read_u64_le()?),
        tag::LONG => WireValue::Long(input.read_i64_le()?),
        tag::FLOAT => WireValue::Float(input.read_f32_le()?),
        tag::DOUBLE => WireValue::Double(input.read_f64_le()?),
        tag::CHAR => {
            let raw = input.read_u32_le()?;
            WireValue::Char(
                char::from_u32(raw)
                    .ok_or_else(|| Error::decode(at, format!("invalid char {:#x}", raw)))?,
            )
        }
        tag::STRING => {
            let bytes = input.read_sized()?;
            WireValue::String(utf8(input, bytes)?)
        }
        tag::SYMBOL => {
            let bytes = input.read_sized()?;
            WireValue::Symbol(utf8(input, bytes)?)
        }
        tag::BINARY => WireValue::Binary(input.read_sized()?.to_vec()),
        tag::LIST => {
            let n = input.read_count()?;
            let mut items = Vec::with_capacity(n);
            for _ in 0..n {
                items.push(decode_at(input, depth + 1, max_depth)?);
            }
            WireValue::List(items)
        }
        tag::MAP => {
            let n = input.read_count()?;
            let mut entries = Vec::with_capacity(n);
            for _ in 0..n {
                let key = decode_at(input, depth + 1, max_depth)?;
                let value = decode_at(input, depth + 1, max_depth)?;
                entries.push((key, value));
            }
            WireValue::Map(entries)
        }
        tag::DESCRIBED => {
            let descriptor = match decode_at(input, depth + 1, max_depth)? {
                WireValue::Symbol(s) => WireDescriptor::Symbol(s),
                WireValue::ULong(code) => WireDescriptor::Code(code),
                other => {
                    return Err(Error::decode(
                        at,
                        format!("descriptor must be a symbol or ulong, found {}", other.kind_name()),
                    ))
                }
            };
            let body = decode_at(input, depth + 1, max_depth)?;
            WireValue::described(descriptor, body)
        }
        tag::REFERENCE => WireValue::Reference(input.read_u32_le()?),
        other => return Err(Error::decode(at, format!("unknown constructor {:#04x}", other))),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: &WireValue) -> WireValue {
        let bytes = value.to_bytes().unwrap();
        let mut reader = WireReader::new(&bytes);
        let decoded = WireValue::decode(&mut reader, 64).unwrap();
        assert!(reader.is_eof());
        decoded
    }

    #[test]
    fn test_described_nested_structure() {
        let value = WireValue::described_list(
            7,
            vec![
                WireValue::string("name"),
                WireValue::Null,
                WireValue::Map(vec![(WireValue::symbol("k"), WireValue::Char('é'))]),
                WireValue::described(
                    WireDescriptor::Symbol("net.ledger:abc".into()),
                    WireValue::List(vec![WireValue::Long(-5), WireValue::Reference(0)]),
                ),
            ],
        );
        assert_eq!(roundtrip(&value), value);
        assert!(value.described_body(7).is_some());
        assert!(value.described_body(8).is_none());
    }

    #[test]
    fn test_unknown_constructor_rejected() {
        let mut reader = WireReader::new(&[0x99]);
        match WireValue::decode(&mut reader, 8).unwrap_err() {
            Error::Decode { offset, .. } => assert_eq!(offset, 0),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_depth_guard() {
        let mut value = WireValue::Null;
        for _ in 0..10 {
            value = WireValue::List(vec![value]);
        }
        let bytes = value.to_bytes().unwrap();
        assert!(WireValue::decode(&mut WireReader::new(&bytes), 4).is_err());
        assert!(WireValue::decode(&mut WireReader::new(&bytes), 16).is_ok());
    }

    #[test]
    fn test_bad_descriptor_kind() {
        let bytes = [tag::DESCRIBED, tag::INT, 0, 0, 0, 0, tag::NULL];
        assert!(WireValue::decode(&mut WireReader::new(&bytes), 8).is_err());
    }
}

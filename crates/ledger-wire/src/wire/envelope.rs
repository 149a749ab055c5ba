// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Framing: header, section markers, optional compression, envelope.
//!
//! ```text
//! +-------+-------+-------+---------------------------------------------+
//! | magic | major | minor | section                                     |
//! | 5 B   | 1 B   | 2 B BE| 0x00 envelope                               |
//! |       |       |       | 0x01 <encoding> compress(0x00 envelope)     |
//! +-------+-------+-------+---------------------------------------------+
//! ```

use super::cursor::{WireReader, WireWriter};
use super::encoding::Encoding;
use super::value::WireValue;
use crate::config::{
    descriptors, DEFAULT_MAX_INFLATED_SIZE, HEADER_LEN, MAGIC, MAJOR_VERSION, MINOR_VERSION,
    SECTION_DATA_AND_STOP, SECTION_ENCODING,
};
use crate::error::{Error, Result};
use crate::policy::EncodingWhitelist;
use crate::schema::{Schema, TransformsSchema};

/// Top-level wire container.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub obj: WireValue,
    pub schema: Schema,
    pub transforms: TransformsSchema,
}

impl Envelope {
    pub fn to_wire(&self) -> WireValue {
        WireValue::described_list(
            descriptors::ENVELOPE,
            vec![self.obj.clone(), self.schema.to_wire(), self.transforms.to_wire()],
        )
    }

    pub fn from_wire(value: WireValue) -> Result<Self> {
        let WireValue::Described { descriptor, body } = value else {
            return Err(Error::not_serializable("payload is not an envelope"));
        };
        if descriptor != super::value::WireDescriptor::Code(descriptors::ENVELOPE) {
            return Err(Error::not_serializable(format!(
                "unexpected envelope descriptor {}",
                descriptor
            )));
        }
        let WireValue::List(items) = *body else {
            return Err(Error::not_serializable("envelope body is not a list"));
        };
        let mut items = items.into_iter();
        let obj = items
            .next()
            .ok_or_else(|| Error::not_serializable("envelope has no object"))?;
        let schema = Schema::from_wire(
            &items
                .next()
                .ok_or_else(|| Error::not_serializable("envelope has no schema"))?,
        )?;
        // Envelopes written without a transforms section are still valid.
        let transforms = match items.next() {
            Some(value) if !value.is_null() => TransformsSchema::from_wire(&value)?,
            _ => TransformsSchema::default(),
        };
        Ok(Self {
            obj,
            schema,
            transforms,
        })
    }

    /// Frame the envelope, compressing everything after the header when an
    /// encoding is given.
    pub fn write(&self, encoding: Option<Encoding>) -> Result<Vec<u8>> {
        let mut inner = WireWriter::new();
        inner.write_u8(SECTION_DATA_AND_STOP);
        self.to_wire().encode(&mut inner)?;
        let inner = inner.into_inner();

        let mut out = WireWriter::with_capacity(HEADER_LEN + 2 + inner.len());
        out.write_bytes(&MAGIC);
        out.write_u8(MAJOR_VERSION);
        out.write_bytes(&MINOR_VERSION.to_be_bytes());
        match encoding {
            None => out.write_bytes(&inner),
            Some(encoding) => {
                out.write_u8(SECTION_ENCODING);
                out.write_u8(encoding.as_byte());
                out.write_bytes(&encoding.compress(&inner)?);
            }
        }
        log::trace!(
            "[ENVELOPE] [OK] wrote {} types, encoding={:?}, {} bytes",
            self.schema.types.len(),
            encoding,
            out.len()
        );
        Ok(out.into_inner())
    }

    /// Parse a framed payload. Compressed payloads are only opened when the
    /// policy accepts their encoding.
    pub fn read(
        bytes: &[u8],
        encodings: &dyn EncodingWhitelist,
        max_depth: usize,
    ) -> Result<(Self, Option<Encoding>)> {
        Self::read_bounded(bytes, encodings, max_depth, DEFAULT_MAX_INFLATED_SIZE)
    }

    /// [`read`](Self::read) with an explicit bound on the decompressed size.
    pub fn read_bounded(
        bytes: &[u8],
        encodings: &dyn EncodingWhitelist,
        max_depth: usize,
        max_inflated: usize,
    ) -> Result<(Self, Option<Encoding>)> {
        let (major, minor) = read_header(bytes)?;
        log::trace!("[ENVELOPE] header v{}.{}", major, minor);

        let mut reader = WireReader::new(&bytes[HEADER_LEN..]);
        match reader.read_u8()? {
            SECTION_DATA_AND_STOP => {
                let envelope = decode_body(&mut reader, HEADER_LEN + 1, max_depth)?;
                Ok((envelope, None))
            }
            SECTION_ENCODING => {
                let at = HEADER_LEN + reader.offset();
                let byte = reader.read_u8()?;
                let encoding = Encoding::from_byte(byte)
                    .ok_or_else(|| Error::decode(at, format!("unknown encoding {:#04x}", byte)))?;
                if !encodings.accepts(encoding) {
                    log::warn!("[ENVELOPE] refusing {} payload by policy", encoding);
                    return Err(Error::EncodingNotPermitted(encoding));
                }
                let inflated =
                    encoding.decompress(reader.read_bytes(reader.remaining())?, max_inflated)?;
                let mut inner = WireReader::new(&inflated);
                match inner.read_u8()? {
                    SECTION_DATA_AND_STOP => {}
                    SECTION_ENCODING => {
                        return Err(Error::decode(0, "nested encoding section"));
                    }
                    other => {
                        return Err(Error::decode(0, format!("unknown section {:#04x}", other)));
                    }
                }
                let envelope = decode_body(&mut inner, 1, max_depth)?;
                Ok((envelope, Some(encoding)))
            }
            other => Err(Error::decode(
                HEADER_LEN,
                format!("unknown section {:#04x}", other),
            )),
        }
    }
}

/// Validate magic and major version; returns (major, minor).
pub fn read_header(bytes: &[u8]) -> Result<(u8, u16)> {
    if bytes.len() < HEADER_LEN + 1 {
        return Err(Error::decode(bytes.len(), "payload shorter than the header"));
    }
    if bytes[..MAGIC.len()] != MAGIC {
        return Err(Error::decode(0, "bad magic"));
    }
    let major = bytes[MAGIC.len()];
    let minor = u16::from_be_bytes([bytes[MAGIC.len() + 1], bytes[MAGIC.len() + 2]]);
    if major != MAJOR_VERSION {
        return Err(Error::UnknownFormatVersion { major, minor });
    }
    Ok((major, minor))
}

fn decode_body(reader: &mut WireReader<'_>, base: usize, max_depth: usize) -> Result<Envelope> {
    let value = WireValue::decode(reader, max_depth).map_err(|e| match e {
        Error::Decode { offset, reason } => Error::decode(base + offset - 1, reason),
        other => other,
    })?;
    if !reader.is_eof() {
        return Err(Error::decode(
            base - 1 + reader.offset(),
            format!("{} trailing bytes", reader.remaining()),
        ));
    }
    Envelope::from_wire(value)
}

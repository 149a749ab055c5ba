// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Envelope compression encodings.
//!
//! - **Deflate** / **Gzip** (always available via flate2): better ratio.
//! - **LZ4** (feature `lz4`): fast block compression.
//!
//! Whether a receiver *accepts* an encoding is a policy decision made by
//! [`EncodingWhitelist`](crate::policy::EncodingWhitelist), not here.

use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;
use std::fmt;
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Encoding {
    Deflate = 0,
    Gzip = 1,
    Lz4 = 2,
}

impl Encoding {
    pub const ALL: [Encoding; 3] = [Encoding::Deflate, Encoding::Gzip, Encoding::Lz4];

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| *e as u8 == byte)
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// True when this build can produce and consume the encoding.
    pub const fn is_available(self) -> bool {
        match self {
            Encoding::Deflate | Encoding::Gzip => true,
            Encoding::Lz4 => cfg!(feature = "lz4"),
        }
    }

    pub fn compress(self, payload: &[u8]) -> Result<Vec<u8>> {
        let fail = |e: std::io::Error| Error::Compression {
            encoding: self,
            reason: e.to_string(),
        };
        match self {
            Encoding::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(payload).map_err(fail)?;
                encoder.finish().map_err(fail)
            }
            Encoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(payload).map_err(fail)?;
                encoder.finish().map_err(fail)
            }
            #[cfg(feature = "lz4")]
            Encoding::Lz4 => Ok(lz4_flex::compress_prepend_size(payload)),
            #[cfg(not(feature = "lz4"))]
            Encoding::Lz4 => Err(self.unavailable()),
        }
    }

    /// Inflate `compressed`, failing once the output would exceed `limit`
    /// bytes.
    pub fn decompress(self, compressed: &[u8], limit: usize) -> Result<Vec<u8>> {
        let fail = |e: std::io::Error| Error::Compression {
            encoding: self,
            reason: e.to_string(),
        };
        let too_large = || Error::Compression {
            encoding: self,
            reason: format!("inflates beyond {} bytes", limit),
        };
        let cap = (limit as u64).saturating_add(1);
        let mut out = Vec::new();
        match self {
            Encoding::Deflate => {
                DeflateDecoder::new(compressed)
                    .take(cap)
                    .read_to_end(&mut out)
                    .map_err(fail)?;
            }
            Encoding::Gzip => {
                GzDecoder::new(compressed)
                    .take(cap)
                    .read_to_end(&mut out)
                    .map_err(fail)?;
            }
            #[cfg(feature = "lz4")]
            Encoding::Lz4 => {
                let declared = compressed
                    .get(..4)
                    .and_then(|prefix| prefix.try_into().ok())
                    .map(|prefix: [u8; 4]| u32::from_le_bytes(prefix) as usize)
                    .ok_or_else(|| Error::Compression {
                        encoding: self,
                        reason: "missing size prefix".into(),
                    })?;
                if declared > limit {
                    return Err(too_large());
                }
                out = lz4_flex::decompress_size_prepended(compressed).map_err(|e| {
                    Error::Compression {
                        encoding: self,
                        reason: e.to_string(),
                    }
                })?;
            }
            #[cfg(not(feature = "lz4"))]
            Encoding::Lz4 => return Err(self.unavailable()),
        }
        if out.len() > limit {
            return Err(too_large());
        }
        Ok(out)
    }

    #[cfg(not(feature = "lz4"))]
    fn unavailable(self) -> Error {
        Error::Compression {
            encoding: self,
            reason: "support not compiled in (enable the `lz4` feature)".into(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Deflate => "DEFLATE",
            Encoding::Gzip => "GZIP",
            Encoding::Lz4 => "LZ4",
        })
    }
}

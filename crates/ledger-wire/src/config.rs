// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec configuration - single source of truth for wire constants.
//!
//! - **Level 1 (Static)**: format constants (magic, versions, section bytes,
//!   descriptor codes). Never hardcode these elsewhere.
//! - **Level 2 (Dynamic)**: [`CodecConfig`], the tunables of one
//!   [`SerializationScheme`](crate::SerializationScheme), with defaults that
//!   can be overridden from the environment.

// =======================================================================
// Wire header
// =======================================================================

/// Format magic, first five bytes of every payload.
pub const MAGIC: [u8; 5] = *b"lwire";

/// Major version. A receiver rejects any other major outright.
pub const MAJOR_VERSION: u8 = 1;

/// Minor version, written big-endian after the major byte.
pub const MINOR_VERSION: u16 = 0;

/// Magic + major + minor.
pub const HEADER_LEN: usize = 8;

/// Section marker: the encoded envelope follows, no further sections.
pub const SECTION_DATA_AND_STOP: u8 = 0x00;

/// Section marker: one encoding byte follows, then the compressed stream.
pub const SECTION_ENCODING: u8 = 0x01;

// =======================================================================
// Descriptors
// =======================================================================

/// Prefix of every fingerprint-bearing descriptor symbol.
pub const DESCRIPTOR_DOMAIN: &str = "net.ledger";

/// High 32 bits shared by the numeric descriptors of the envelope types.
pub const DESCRIPTOR_TOP_32BITS: u64 = 0x4c57_0000_0000;

/// Numeric descriptors of the self-describing envelope structures.
pub mod descriptors {
    use super::DESCRIPTOR_TOP_32BITS;

    pub const ENVELOPE: u64 = DESCRIPTOR_TOP_32BITS | 1;
    pub const SCHEMA: u64 = DESCRIPTOR_TOP_32BITS | 2;
    pub const OBJECT_DESCRIPTOR: u64 = DESCRIPTOR_TOP_32BITS | 3;
    pub const FIELD: u64 = DESCRIPTOR_TOP_32BITS | 4;
    pub const COMPOSITE_TYPE: u64 = DESCRIPTOR_TOP_32BITS | 5;
    pub const RESTRICTED_TYPE: u64 = DESCRIPTOR_TOP_32BITS | 6;
    pub const CHOICE: u64 = DESCRIPTOR_TOP_32BITS | 7;
    pub const TRANSFORMS_SCHEMA: u64 = DESCRIPTOR_TOP_32BITS | 9;
    pub const TRANSFORM_ELEMENT: u64 = DESCRIPTOR_TOP_32BITS | 10;
}

// =======================================================================
// Defaults
// =======================================================================

/// Default bound of the (whitelist, registry) -> factory cache.
pub const DEFAULT_FACTORY_CACHE_CAPACITY: usize = 128;

/// Default limit on object graph nesting, protects the decoder stack.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default limit on the size of a decompressed envelope (64 MiB).
pub const DEFAULT_MAX_INFLATED_SIZE: usize = 64 * 1024 * 1024;

/// Tunables for one serialization scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum number of cached serializer factories.
    pub factory_cache_capacity: usize,

    /// Evolution mode used by contexts created from this config.
    pub strict_evolution: bool,

    /// Whether unknown remote types may be synthesized.
    pub carpenter_enabled: bool,

    /// Maximum nesting depth accepted on read and write.
    pub max_depth: usize,

    /// Maximum size a compressed envelope may inflate to.
    pub max_inflated_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            factory_cache_capacity: DEFAULT_FACTORY_CACHE_CAPACITY,
            strict_evolution: true,
            carpenter_enabled: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_inflated_size: DEFAULT_MAX_INFLATED_SIZE,
        }
    }
}

impl CodecConfig {
    /// Defaults overridden by `LEDGER_WIRE_FACTORY_CACHE`,
    /// `LEDGER_WIRE_STRICT` and `LEDGER_WIRE_CARPENTER`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            factory_cache_capacity: std::env::var("LEDGER_WIRE_FACTORY_CACHE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.factory_cache_capacity),
            strict_evolution: env_flag("LEDGER_WIRE_STRICT").unwrap_or(defaults.strict_evolution),
            carpenter_enabled: env_flag("LEDGER_WIRE_CARPENTER")
                .unwrap_or(defaults.carpenter_enabled),
            max_depth: defaults.max_depth,
            max_inflated_size: defaults.max_inflated_size,
        }
    }

    /// Set the factory cache bound (zero is clamped to one).
    pub fn with_factory_cache_capacity(mut self, capacity: usize) -> Self {
        self.factory_cache_capacity = capacity.max(1);
        self
    }

    pub fn with_strict_evolution(mut self, strict: bool) -> Self {
        self.strict_evolution = strict;
        self
    }

    pub fn with_carpenter(mut self, enabled: bool) -> Self {
        self.carpenter_enabled = enabled;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_inflated_size(mut self, bytes: usize) -> Self {
        self.max_inflated_size = bytes;
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            log::warn!("[CONFIG] ignoring {}={:?}: not a boolean", name, other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        assert_eq!(MAGIC.len() + 1 + 2, HEADER_LEN);
    }

    #[test]
    fn test_descriptor_codes_are_distinct() {
        let codes = [
            descriptors::ENVELOPE,
            descriptors::SCHEMA,
            descriptors::OBJECT_DESCRIPTOR,
            descriptors::FIELD,
            descriptors::COMPOSITE_TYPE,
            descriptors::RESTRICTED_TYPE,
            descriptors::CHOICE,
            descriptors::TRANSFORMS_SCHEMA,
            descriptors::TRANSFORM_ELEMENT,
        ];
        let unique: std::collections::BTreeSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_defaults_are_strict() {
        let config = CodecConfig::default();
        assert!(config.strict_evolution);
        assert_eq!(config.factory_cache_capacity, DEFAULT_FACTORY_CACHE_CAPACITY);
    }

    #[test]
    fn test_builder_clamps_capacity() {
        let config = CodecConfig::default().with_factory_cache_capacity(0);
        assert_eq!(config.factory_cache_capacity, 1);
    }
}

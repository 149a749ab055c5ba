// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural fingerprints.
//!
//! A fingerprint is an MD5 digest of a token stream walked over a type's
//! structure, truncated to 14 bytes and rendered as lowercase hex. The local
//! walk (over [`LocalTypeInformation`]) and the remote walk (over a
//! [`RemoteTypeCatalogue`]) emit identical token streams for wire-identical
//! types, so a receiver can tell from fingerprints alone whether evolution
//! is needed.
//!
//! Token grammar:
//!
//! | Type          | Tokens                                                        |
//! |---------------|---------------------------------------------------------------|
//! | `*`           | `Any type = true`                                             |
//! | `?`           | `?`                                                           |
//! | primitive     | its name                                                      |
//! | custom        | the custom serializer's descriptor (walk stops)               |
//! | composite     | name, then per property: type, name, `Nullable = ..`; then per interface: name, `Interface = true` |
//! | seen again    | name, `Already seen = true`                                   |
//! | enum          | constants in order, name, `Enum = true`                       |
//! | interface     | name, `Interface = true`, super-interface names               |
//! | collection    | base name, argument types                                     |
//! | array         | component type, `Array = true` (`T[p]` for unboxed)          |

mod local;
mod remote;
mod sequential;

pub use sequential::SequentialFingerprinter;

use crate::config::DESCRIPTOR_DOMAIN;
use crate::model::{
    LocalTypeInformation, LocalTypeModel, RemoteTypeCatalogue, RemoteTypeInformation,
    TypeIdentifier,
};
use md5::{Digest, Md5};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Digest bytes kept in a fingerprint.
pub const FINGERPRINT_BYTES: usize = 14;

const TOKEN_SEPARATOR: u8 = 0x1f;

pub(crate) const ANY_TYPE: &str = "Any type = true";
pub(crate) const UNKNOWN: &str = "?";
pub(crate) const ALREADY_SEEN: &str = "Already seen = true";
pub(crate) const ENUM: &str = "Enum = true";
pub(crate) const INTERFACE: &str = "Interface = true";
pub(crate) const ARRAY: &str = "Array = true";

pub(crate) fn nullable(mandatory: bool) -> &'static str {
    if mandatory {
        "Nullable = false"
    } else {
        "Nullable = true"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wire descriptor symbol, `net.ledger:<fingerprint>`.
    pub fn descriptor(&self) -> String {
        format!("{}:{}", DESCRIPTOR_DOMAIN, self.0)
    }

    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        descriptor
            .strip_prefix(DESCRIPTOR_DOMAIN)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(Self::new)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves what the local walk cannot see in the tree itself.
pub trait LocalLookup {
    /// Full information for a type, used to expand `Cycle` markers.
    fn resolve(&self, type_id: &TypeIdentifier) -> Option<Arc<LocalTypeInformation>>;

    /// Descriptor of the custom serializer handling the type, if any.
    fn custom_descriptor(&self, type_id: &TypeIdentifier) -> Option<String>;
}

impl LocalLookup for LocalTypeModel {
    fn resolve(&self, type_id: &TypeIdentifier) -> Option<Arc<LocalTypeInformation>> {
        Some(self.inspect(type_id))
    }

    fn custom_descriptor(&self, _type_id: &TypeIdentifier) -> Option<String> {
        None
    }
}

pub trait TypeFingerprinter: Send + Sync + fmt::Debug {
    fn local(&self, info: &LocalTypeInformation, lookup: &dyn LocalLookup) -> Fingerprint;

    fn remote(&self, info: &RemoteTypeInformation, catalogue: &RemoteTypeCatalogue) -> Fingerprint;

    /// Whether schema descriptors can be checked by recomputation.
    fn verifies_descriptors(&self) -> bool {
        true
    }
}

/// The production fingerprinter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashingFingerprinter;

impl TypeFingerprinter for HashingFingerprinter {
    fn local(&self, info: &LocalTypeInformation, lookup: &dyn LocalLookup) -> Fingerprint {
        let mut writer = FingerprintWriter::new();
        local::write_local(&mut writer, info, lookup);
        writer.finish()
    }

    fn remote(&self, info: &RemoteTypeInformation, catalogue: &RemoteTypeCatalogue) -> Fingerprint {
        let mut writer = FingerprintWriter::new();
        remote::write_remote(&mut writer, info, catalogue);
        writer.finish()
    }
}

/// Token sink shared by both walks.
pub struct FingerprintWriter {
    hasher: Md5,
    seen: HashSet<String>,
}

impl FingerprintWriter {
    pub fn new() -> Self {
        Self {
            hasher: Md5::new(),
            seen: HashSet::new(),
        }
    }

    pub fn write(&mut self, token: &str) {
        self.hasher.update(token.as_bytes());
        self.hasher.update([TOKEN_SEPARATOR]);
    }

    /// True the first time a composite name is offered.
    pub fn first_visit(&mut self, name: &str) -> bool {
        self.seen.insert(name.to_string())
    }

    pub fn finish(self) -> Fingerprint {
        let digest = self.hasher.finalize();
        let mut hex = String::with_capacity(FINGERPRINT_BYTES * 2);
        for byte in &digest[..FINGERPRINT_BYTES] {
            hex.push_str(&format!("{:02x}", byte));
        }
        Fingerprint(hex)
    }
}

impl Default for FingerprintWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint of a custom serializer: its target and proxy names.
pub fn custom_fingerprint(target: &TypeIdentifier, proxy: &TypeIdentifier) -> Fingerprint {
    let mut writer = FingerprintWriter::new();
    writer.write("custom");
    writer.write(&target.name());
    writer.write(&proxy.name());
    writer.finish()
}

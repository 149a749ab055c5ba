// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # ledger-wire - evolution-tolerant binary object serialization
//!
//! Converts typed object graphs into a self-describing binary format and
//! back, tolerating senders and receivers that run different versions of
//! the same types. Every payload carries a schema describing each type it
//! uses; each schema entry is identified by a structural fingerprint, so a
//! receiver decides from structure alone whether the bytes match its own
//! types, need an evolution bridge, or describe a type it has never seen.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ledger_wire::{SerializationScheme, Serializable, TypeRegistry, UseCase};
//! use std::sync::Arc;
//!
//! #[derive(Debug, PartialEq, Serializable)]
//! #[ledger(name = "demo.Trade")]
//! struct Trade {
//!     price: i64,
//!     venue: Option<String>,
//! }
//!
//! fn main() -> ledger_wire::Result<()> {
//!     let scheme = SerializationScheme::default();
//!     let ctx = scheme.context(UseCase::P2P, Arc::new(TypeRegistry::new()));
//!
//!     let trade = Trade { price: 42, venue: None };
//!     let bytes = scheme.serialize(&trade, &ctx)?;
//!     let back: Trade = scheme.deserialize(bytes.as_bytes(), &ctx)?;
//!     assert_eq!(back, trade);
//!     Ok(())
//! }
//! ```
//!
//! ## Layers
//!
//! ```text
//! +-------------------------------------------------------------------+
//! |  scheme     serialize / deserialize, factory cache per trust domain |
//! +-------------------------------------------------------------------+
//! |  factory    serializers by type and by descriptor                   |
//! |  evolution  bridges for changed types   carpenter  unknown types    |
//! +-------------------------------------------------------------------+
//! |  model      declarations, local and remote type information         |
//! |  fingerprint                                                        |
//! +-------------------------------------------------------------------+
//! |  schema / wire   notations, tagged values, envelope, compression    |
//! +-------------------------------------------------------------------+
//! ```

// Allow the derive macro to work inside this crate
extern crate self as ledger_wire;

/// Synthesis of types known only from a received schema.
pub mod carpenter;
/// Wire constants and runtime tunables.
pub mod config;
/// Per-call serialization context.
pub mod context;
/// Custom serializers and the built-in ones.
pub mod custom;
pub mod error;
/// Read-side bridges for evolved composites and enums.
pub mod evolution;
/// Serializer factory and its bounded cache.
pub mod factory;
/// Structural type fingerprints.
pub mod fingerprint;
/// Type identifiers, declarations, local and remote type information.
pub mod model;
/// Type and encoding whitelists.
pub mod policy;
/// Schema notations and enum transforms.
pub mod schema;
pub mod scheme;
/// Concrete serializers and the per-call output/input state.
pub mod serializers;
pub mod traits;
/// Dynamic values.
pub mod value;
/// Tagged binary values and envelope framing.
pub mod wire;

pub use config::CodecConfig;
pub use context::{EvolutionMode, SerializationContext, UseCase, INCLUDE_EXTENDED_DIAGNOSTICS};
pub use custom::{CustomSerializer, CustomSerializerRegistry, FailureReport, ProxySerializer};
pub use error::{Error, NotSerializableDetail, Result};
pub use fingerprint::{Fingerprint, HashingFingerprinter, SequentialFingerprinter, TypeFingerprinter};
pub use model::{
    CollectionKind, LegacyConstructor, ParameterDeclaration, Primitive, TypeDeclaration,
    TypeIdentifier, TypeRegistry,
};
pub use policy::{
    AllEncodings, AllWhitelist, ClassWhitelist, EmptyWhitelist, EncodingSet, EncodingWhitelist,
    NamedWhitelist, NoEncodings,
};
pub use schema::{EnumTransform, Schema, TransformsSchema};
pub use scheme::{ObjectAndEnvelope, SerializationScheme, SerializedBytes};
pub use traits::{Bytes, PrimitiveArray, Serializable, ValueReader, ValueWriter};
pub use value::{EnumValue, Record, Value};
pub use wire::{Encoding, Envelope};

// Derive macro (for #[derive(ledger_wire::Serializable)])
pub use ledger_wire_derive::Serializable;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

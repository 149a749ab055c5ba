// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural schema and transforms schema.

mod notation;
mod transforms;

pub use notation::{
    source, Choice, CompositeType, Descriptor, Field, RestrictedType, Schema, SchemaBuilder,
    TypeNotation,
};
pub use transforms::{resolve_constant, validate_enum_transforms, EnumTransform, TransformsSchema};

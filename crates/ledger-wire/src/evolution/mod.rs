// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read-side bridges between a sender's type shape and the local one.
//!
//! Evolution serializers only read. A process always writes its own current
//! shape.

mod enums;
mod object;

pub use enums::EnumEvolutionSerializer;
pub use object::ObjectEvolutionSerializer;

use crate::model::TypeIdentifier;

/// A remote property of type `remote` can feed a local slot of type `local`.
pub(crate) fn compatible(local: &TypeIdentifier, remote: &TypeIdentifier) -> bool {
    local == remote || local.is_open() || remote.is_open()
}

pub(crate) fn write_unsupported(type_id: &TypeIdentifier) -> crate::error::Error {
    crate::error::Error::not_serializable(format!(
        "{} is read through an evolution bridge and cannot be written with it",
        type_id
    ))
}

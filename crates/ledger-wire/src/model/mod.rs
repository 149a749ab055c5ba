// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type model: identifiers, declarations, and the local and remote
//! structural views built from them.

pub mod declaration;
pub mod local;
pub mod registry;
pub mod remote;
mod type_id;

pub use declaration::{
    Arguments, ConstructorDeclaration, DeclarationKind, LegacyConstructor, ParameterDeclaration,
    PropertyDeclaration, PropertyKind, TypeDeclaration,
};
pub use local::{
    LocalComposable, LocalConstructorInformation, LocalLegacyConstructor,
    LocalParameterInformation, LocalPropertyInformation, LocalTypeInformation, LocalTypeModel,
};
pub use registry::{RegistryId, TypeRegistry, NOT_APPLICABLE};
pub use remote::{
    is_self_describing, RemotePropertyInformation, RemoteTypeCatalogue, RemoteTypeInformation,
};
pub use type_id::{CollectionKind, Primitive, TypeIdentifier};

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Explicit type declarations.
//!
//! A [`TypeDeclaration`] is what a type registers about itself: its
//! properties, its constructors (including version-tagged legacy ones),
//! enum constants and transforms, supertypes, and the serialization markers.
//! `#[derive(Serializable)]` generates these; hand-written registrations use
//! the same builder.

use crate::error::{Error, Result};
use crate::model::TypeIdentifier;
use crate::schema::{validate_enum_transforms, EnumTransform};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Constructor arguments keyed by parameter name.
pub type Arguments = BTreeMap<String, Value>;

type Bridge = dyn Fn(Arguments) -> Result<Arguments> + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    Composite,
    Enum,
    Interface,
    /// Inspectable but not generically constructible; needs a custom serializer.
    NonComposable { reason: String, remedy: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Read through a getter, supplied to the constructor.
    Constructor,
    /// Read through a getter, written through a setter after construction.
    Setter,
    /// Derived from other properties; written for information, ignored on read.
    Calculated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDeclaration {
    pub name: String,
    pub type_id: TypeIdentifier,
    pub mandatory: bool,
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDeclaration {
    pub name: String,
    pub type_id: TypeIdentifier,
    pub mandatory: bool,
}

impl ParameterDeclaration {
    pub fn mandatory(name: impl Into<String>, type_id: TypeIdentifier) -> Self {
        Self {
            name: name.into(),
            type_id,
            mandatory: true,
        }
    }

    pub fn nullable(name: impl Into<String>, type_id: TypeIdentifier) -> Self {
        Self {
            name: name.into(),
            type_id,
            mandatory: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructorDeclaration {
    pub parameters: Vec<ParameterDeclaration>,
    pub for_deserialization: bool,
}

impl ConstructorDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, parameter: ParameterDeclaration) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Prefer this constructor over every other when deserializing.
    pub fn marked_for_deserialization(mut self) -> Self {
        self.for_deserialization = true;
        self
    }
}

/// A constructor kept for reading older payloads.
///
/// The bridge receives the arguments named by `parameters` and returns the
/// argument set of the next generation: either the input of a higher-version
/// legacy constructor or that of the canonical constructor.
#[derive(Clone)]
pub struct LegacyConstructor {
    pub version: u32,
    pub parameters: Vec<ParameterDeclaration>,
    bridge: Arc<Bridge>,
}

impl LegacyConstructor {
    pub fn new<F>(version: u32, parameters: Vec<ParameterDeclaration>, bridge: F) -> Self
    where
        F: Fn(Arguments) -> Result<Arguments> + Send + Sync + 'static,
    {
        Self {
            version,
            parameters,
            bridge: Arc::new(bridge),
        }
    }

    pub fn apply(&self, arguments: Arguments) -> Result<Arguments> {
        (self.bridge)(arguments)
    }
}

impl fmt::Debug for LegacyConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        write!(f, "LegacyConstructor(v{}, {:?})", self.version, names)
    }
}

#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub type_parameters: Vec<String>,
    pub supertypes: Vec<TypeIdentifier>,
    pub properties: Vec<PropertyDeclaration>,
    pub constructors: Vec<ConstructorDeclaration>,
    pub legacy_constructors: Vec<LegacyConstructor>,
    pub constants: Vec<String>,
    pub transforms: Vec<EnumTransform>,
    /// Bypasses the type whitelist.
    pub always_serializable: bool,
    /// Rejects custom serializers.
    pub structural_only: bool,
}

impl TypeDeclaration {
    fn with_kind(name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_parameters: Vec::new(),
            supertypes: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            legacy_constructors: Vec::new(),
            constants: Vec::new(),
            transforms: Vec::new(),
            always_serializable: false,
            structural_only: false,
        }
    }

    pub fn composite(name: impl Into<String>) -> Self {
        Self::with_kind(name, DeclarationKind::Composite)
    }

    pub fn enumeration<I, S>(name: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut decl = Self::with_kind(name, DeclarationKind::Enum);
        decl.constants = constants.into_iter().map(Into::into).collect();
        decl
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, DeclarationKind::Interface)
    }

    pub fn non_composable(
        name: impl Into<String>,
        reason: impl Into<String>,
        remedy: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            name,
            DeclarationKind::NonComposable {
                reason: reason.into(),
                remedy: remedy.into(),
            },
        )
    }

    pub fn type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn supertype(mut self, supertype: TypeIdentifier) -> Self {
        self.supertypes.push(supertype);
        self
    }

    pub fn always_serializable(mut self) -> Self {
        self.always_serializable = true;
        self
    }

    pub fn structural_only(mut self) -> Self {
        self.structural_only = true;
        self
    }

    fn push_property(
        mut self,
        name: impl Into<String>,
        type_id: TypeIdentifier,
        mandatory: bool,
        kind: PropertyKind,
    ) -> Self {
        self.properties.push(PropertyDeclaration {
            name: name.into(),
            type_id,
            mandatory,
            kind,
        });
        self
    }

    /// Non-null constructor property.
    pub fn property(self, name: impl Into<String>, type_id: TypeIdentifier) -> Self {
        self.push_property(name, type_id, true, PropertyKind::Constructor)
    }

    /// Nullable constructor property.
    pub fn nullable_property(self, name: impl Into<String>, type_id: TypeIdentifier) -> Self {
        self.push_property(name, type_id, false, PropertyKind::Constructor)
    }

    pub fn property_with(
        self,
        name: impl Into<String>,
        type_id: TypeIdentifier,
        mandatory: bool,
    ) -> Self {
        self.push_property(name, type_id, mandatory, PropertyKind::Constructor)
    }

    pub fn setter_property(
        self,
        name: impl Into<String>,
        type_id: TypeIdentifier,
        mandatory: bool,
    ) -> Self {
        self.push_property(name, type_id, mandatory, PropertyKind::Setter)
    }

    pub fn calculated_property(self, name: impl Into<String>, type_id: TypeIdentifier) -> Self {
        self.push_property(name, type_id, false, PropertyKind::Calculated)
    }

    pub fn constructor(mut self, constructor: ConstructorDeclaration) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn legacy_constructor(mut self, constructor: LegacyConstructor) -> Self {
        self.legacy_constructors.push(constructor);
        self
    }

    pub fn legacy_constructors(mut self, constructors: Vec<LegacyConstructor>) -> Self {
        self.legacy_constructors.extend(constructors);
        self
    }

    pub fn transform(mut self, transform: EnumTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn transforms(mut self, transforms: Vec<EnumTransform>) -> Self {
        self.transforms.extend(transforms);
        self
    }

    pub fn type_id(&self) -> TypeIdentifier {
        TypeIdentifier::named(self.name.clone())
    }

    /// Reject declarations that could never be serialized consistently.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::not_serializable("type declared with an empty name"));
        }
        let fail = |message: String| Err(Error::detailed(self.name.clone(), message));

        if self.kind != DeclarationKind::Composite
            && !(self.properties.is_empty()
                && self.constructors.is_empty()
                && self.legacy_constructors.is_empty())
        {
            if !matches!(self.kind, DeclarationKind::NonComposable { .. }) {
                return fail("only composite types may declare properties or constructors".into());
            }
        }
        if self.kind != DeclarationKind::Enum && !(self.constants.is_empty() && self.transforms.is_empty()) {
            return fail("only enums may declare constants or transforms".into());
        }

        let mut seen = BTreeSet::new();
        for property in &self.properties {
            if !seen.insert(property.name.as_str()) {
                return fail(format!("property {} is declared twice", property.name));
            }
        }
        for constructor in &self.constructors {
            let mut names = BTreeSet::new();
            for parameter in &constructor.parameters {
                if !names.insert(parameter.name.as_str()) {
                    return fail(format!("constructor parameter {} is declared twice", parameter.name));
                }
            }
        }
        let mut versions = BTreeSet::new();
        for legacy in &self.legacy_constructors {
            if !versions.insert(legacy.version) {
                return fail(format!(
                    "two legacy constructors are tagged with version {}",
                    legacy.version
                ));
            }
        }

        if self.kind == DeclarationKind::Enum {
            let mut constants = BTreeSet::new();
            for constant in &self.constants {
                if !constants.insert(constant.as_str()) {
                    return fail(format!("enum constant {} is declared twice", constant));
                }
            }
            validate_enum_transforms(&self.name, &self.constants, &self.transforms)?;
        }
        Ok(())
    }
}

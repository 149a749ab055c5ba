// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural description of types known to this process.
//!
//! [`LocalTypeModel::inspect`] turns a [`TypeIdentifier`] into a
//! [`LocalTypeInformation`] tree using the declarations of a
//! [`TypeRegistry`]. Generic arguments are substituted transitively; a
//! parameter with no argument becomes `Unknown`. A type met again while it
//! is still being inspected becomes a `Cycle` marker.

use super::declaration::{
    ConstructorDeclaration, DeclarationKind, LegacyConstructor, ParameterDeclaration,
    PropertyKind, TypeDeclaration,
};
use super::registry::TypeRegistry;
use super::type_id::{CollectionKind, Primitive, TypeIdentifier};
use crate::schema::EnumTransform;
use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum LocalTypeInformation {
    Top,
    Unknown,
    Primitive(Primitive),
    /// Back-edge to a type that encloses this position.
    Cycle(TypeIdentifier),
    Composable(Arc<LocalComposable>),
    NonComposable {
        type_id: TypeIdentifier,
        reason: String,
        remedy: String,
        interfaces: Vec<TypeIdentifier>,
    },
    AnInterface {
        type_id: TypeIdentifier,
        interfaces: Vec<TypeIdentifier>,
    },
    AnEnum {
        type_id: TypeIdentifier,
        constants: Vec<String>,
        transforms: Vec<EnumTransform>,
        interfaces: Vec<TypeIdentifier>,
    },
    ACollection {
        type_id: TypeIdentifier,
        kind: CollectionKind,
        element: Arc<LocalTypeInformation>,
    },
    AMap {
        type_id: TypeIdentifier,
        kind: CollectionKind,
        key: Arc<LocalTypeInformation>,
        value: Arc<LocalTypeInformation>,
    },
    AnArray {
        type_id: TypeIdentifier,
        component: Arc<LocalTypeInformation>,
    },
}

impl LocalTypeInformation {
    pub fn type_id(&self) -> TypeIdentifier {
        match self {
            LocalTypeInformation::Top => TypeIdentifier::Top,
            LocalTypeInformation::Unknown => TypeIdentifier::Unknown,
            LocalTypeInformation::Primitive(p) => TypeIdentifier::Primitive(*p),
            LocalTypeInformation::Cycle(type_id) => type_id.clone(),
            LocalTypeInformation::Composable(c) => c.type_id.clone(),
            LocalTypeInformation::NonComposable { type_id, .. }
            | LocalTypeInformation::AnInterface { type_id, .. }
            | LocalTypeInformation::AnEnum { type_id, .. }
            | LocalTypeInformation::ACollection { type_id, .. }
            | LocalTypeInformation::AMap { type_id, .. }
            | LocalTypeInformation::AnArray { type_id, .. } => type_id.clone(),
        }
    }

    /// Transitive supertypes, nearest first.
    pub fn interfaces(&self) -> &[TypeIdentifier] {
        match self {
            LocalTypeInformation::Composable(c) => &c.interfaces,
            LocalTypeInformation::NonComposable { interfaces, .. }
            | LocalTypeInformation::AnInterface { interfaces, .. }
            | LocalTypeInformation::AnEnum { interfaces, .. } => interfaces,
            _ => &[],
        }
    }

    pub fn as_composable(&self) -> Option<&Arc<LocalComposable>> {
        match self {
            LocalTypeInformation::Composable(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalPropertyInformation {
    pub name: String,
    pub type_info: Arc<LocalTypeInformation>,
    pub mandatory: bool,
    pub kind: PropertyKind,
}

impl LocalPropertyInformation {
    pub fn type_id(&self) -> TypeIdentifier {
        self.type_info.type_id()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalParameterInformation {
    pub name: String,
    pub type_id: TypeIdentifier,
    pub mandatory: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalConstructorInformation {
    pub parameters: Vec<LocalParameterInformation>,
}

#[derive(Debug, Clone)]
pub struct LocalLegacyConstructor {
    pub version: u32,
    pub parameters: Vec<LocalParameterInformation>,
    pub constructor: LegacyConstructor,
}

#[derive(Debug, Clone)]
pub struct LocalComposable {
    pub type_id: TypeIdentifier,
    /// Alphabetic by name: the wire order.
    pub properties: Vec<LocalPropertyInformation>,
    pub constructor: LocalConstructorInformation,
    /// Ascending version order.
    pub legacy_constructors: Vec<LocalLegacyConstructor>,
    pub interfaces: Vec<TypeIdentifier>,
    pub always_serializable: bool,
}

impl LocalComposable {
    pub fn property(&self, name: &str) -> Option<&LocalPropertyInformation> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Memoizing inspector over one registry.
#[derive(Debug)]
pub struct LocalTypeModel {
    registry: Arc<TypeRegistry>,
    memo: DashMap<TypeIdentifier, Arc<LocalTypeInformation>>,
}

impl LocalTypeModel {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            memo: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn cached(&self, type_id: &TypeIdentifier) -> Option<Arc<LocalTypeInformation>> {
        self.memo.get(type_id).map(|e| Arc::clone(e.value()))
    }

    /// Inspect a type. Results are memoized unless some declaration reached
    /// from it was missing, since it may be registered later.
    pub fn inspect(&self, type_id: &TypeIdentifier) -> Arc<LocalTypeInformation> {
        if let Some(hit) = self.cached(type_id) {
            return hit;
        }
        let mut builder = Builder {
            registry: &self.registry,
            stack: Vec::new(),
            incomplete: false,
        };
        let info = builder.build(type_id);
        if builder.incomplete {
            log::debug!("[TYPE-MODEL] {} inspected with missing declarations", type_id);
            return info;
        }
        Arc::clone(
            self.memo
                .entry(type_id.clone())
                .or_insert(info)
                .value(),
        )
    }
}

struct Builder<'a> {
    registry: &'a TypeRegistry,
    stack: Vec<TypeIdentifier>,
    incomplete: bool,
}

impl Builder<'_> {
    fn build(&mut self, type_id: &TypeIdentifier) -> Arc<LocalTypeInformation> {
        Arc::new(self.build_info(type_id))
    }

    fn build_info(&mut self, type_id: &TypeIdentifier) -> LocalTypeInformation {
        match type_id {
            TypeIdentifier::Top => return LocalTypeInformation::Top,
            TypeIdentifier::Unknown => return LocalTypeInformation::Unknown,
            TypeIdentifier::Primitive(p) => return LocalTypeInformation::Primitive(*p),
            TypeIdentifier::PrimitiveArrayOf(p) => {
                return LocalTypeInformation::AnArray {
                    type_id: type_id.clone(),
                    component: Arc::new(LocalTypeInformation::Primitive(*p)),
                }
            }
            TypeIdentifier::ArrayOf(component) => {
                return LocalTypeInformation::AnArray {
                    type_id: type_id.clone(),
                    component: self.build(component),
                }
            }
            _ => {}
        }

        if let Some(kind) = type_id.collection_kind() {
            let argument = |i: usize| {
                type_id
                    .arguments()
                    .get(i)
                    .cloned()
                    .unwrap_or(TypeIdentifier::Unknown)
            };
            return if kind.is_map() {
                LocalTypeInformation::AMap {
                    type_id: type_id.clone(),
                    kind,
                    key: self.build(&argument(0)),
                    value: self.build(&argument(1)),
                }
            } else {
                LocalTypeInformation::ACollection {
                    type_id: type_id.clone(),
                    kind,
                    element: self.build(&argument(0)),
                }
            };
        }

        if self.stack.contains(type_id) {
            return LocalTypeInformation::Cycle(type_id.clone());
        }

        let Some(declaration) = self.registry.declaration_for(type_id) else {
            self.incomplete = true;
            return LocalTypeInformation::NonComposable {
                type_id: type_id.clone(),
                reason: format!("no declaration is registered for {}", type_id),
                remedy: "register the type or supply a custom serializer".into(),
                interfaces: Vec::new(),
            };
        };

        self.stack.push(type_id.clone());
        let info = self.build_declared(type_id, &declaration);
        self.stack.pop();
        info
    }

    fn build_declared(
        &mut self,
        requested: &TypeIdentifier,
        declaration: &TypeDeclaration,
    ) -> LocalTypeInformation {
        let substitution = Substitution::new(requested, declaration);
        let type_id = substitution.type_id.clone();
        let interfaces = self.flatten_interfaces(declaration, &substitution);

        match &declaration.kind {
            DeclarationKind::Interface => LocalTypeInformation::AnInterface {
                type_id,
                interfaces,
            },
            DeclarationKind::Enum => LocalTypeInformation::AnEnum {
                type_id,
                constants: declaration.constants.clone(),
                transforms: declaration.transforms.clone(),
                interfaces,
            },
            DeclarationKind::NonComposable { reason, remedy } => {
                LocalTypeInformation::NonComposable {
                    type_id,
                    reason: reason.clone(),
                    remedy: remedy.clone(),
                    interfaces,
                }
            }
            DeclarationKind::Composite => {
                match self.build_composable(type_id.clone(), declaration, &substitution, interfaces.clone()) {
                    Ok(composable) => LocalTypeInformation::Composable(Arc::new(composable)),
                    Err((reason, remedy)) => {
                        log::debug!("[TYPE-MODEL] {} is not composable: {}", type_id, reason);
                        LocalTypeInformation::NonComposable {
                            type_id,
                            reason,
                            remedy,
                            interfaces,
                        }
                    }
                }
            }
        }
    }

    fn flatten_interfaces(
        &self,
        declaration: &TypeDeclaration,
        substitution: &Substitution,
    ) -> Vec<TypeIdentifier> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<TypeIdentifier> = declaration
            .supertypes
            .iter()
            .map(|s| substitution.apply(s))
            .collect();
        while let Some(next) = queue.pop_front() {
            if next.is_open() || !seen.insert(next.clone()) {
                continue;
            }
            if let Some(parent) = self.registry.declaration_for(&next) {
                let inner = Substitution::new(&next, &parent);
                queue.extend(parent.supertypes.iter().map(|s| inner.apply(s)));
            }
            out.push(next);
        }
        out
    }

    fn build_composable(
        &mut self,
        type_id: TypeIdentifier,
        declaration: &TypeDeclaration,
        substitution: &Substitution,
        interfaces: Vec<TypeIdentifier>,
    ) -> Result<LocalComposable, (String, String)> {
        let resolved_properties: Vec<(&str, TypeIdentifier, bool, PropertyKind)> = declaration
            .properties
            .iter()
            .map(|p| (p.name.as_str(), substitution.apply(&p.type_id), p.mandatory, p.kind))
            .collect();

        let constructor = select_constructor(declaration, &resolved_properties, substitution)?;

        let mut properties = Vec::with_capacity(resolved_properties.len());
        for (name, property_type, mandatory, kind) in &resolved_properties {
            properties.push(LocalPropertyInformation {
                name: (*name).to_string(),
                type_info: self.build(property_type),
                mandatory: *mandatory,
                kind: *kind,
            });
        }
        properties.sort_by(|a, b| a.name.cmp(&b.name));

        let mut legacy_constructors: Vec<LocalLegacyConstructor> = declaration
            .legacy_constructors
            .iter()
            .map(|legacy| LocalLegacyConstructor {
                version: legacy.version,
                parameters: resolve_parameters(&legacy.parameters, substitution),
                constructor: legacy.clone(),
            })
            .collect();
        legacy_constructors.sort_by_key(|l| l.version);

        Ok(LocalComposable {
            type_id,
            properties,
            constructor,
            legacy_constructors,
            interfaces,
            always_serializable: declaration.always_serializable,
        })
    }
}

fn resolve_parameters(
    parameters: &[ParameterDeclaration],
    substitution: &Substitution,
) -> Vec<LocalParameterInformation> {
    parameters
        .iter()
        .map(|p| LocalParameterInformation {
            name: p.name.clone(),
            type_id: substitution.apply(&p.type_id),
            mandatory: p.mandatory,
        })
        .collect()
}

/// Pick the canonical constructor.
///
/// 1. The single constructor marked for deserialization.
/// 2. Otherwise the constructor matching the largest set of properties by
///    name and type. A tie is ambiguous.
/// 3. A parameter with no matching property rules a constructor out.
///
/// With no declared constructors the constructor-paired properties, in
/// declaration order, form the canonical constructor.
fn select_constructor(
    declaration: &TypeDeclaration,
    properties: &[(&str, TypeIdentifier, bool, PropertyKind)],
    substitution: &Substitution,
) -> Result<LocalConstructorInformation, (String, String)> {
    if declaration.constructors.is_empty() {
        let parameters = properties
            .iter()
            .filter(|(_, _, _, kind)| *kind == PropertyKind::Constructor)
            .map(|(name, type_id, mandatory, _)| LocalParameterInformation {
                name: (*name).to_string(),
                type_id: type_id.clone(),
                mandatory: *mandatory,
            })
            .collect();
        return Ok(LocalConstructorInformation { parameters });
    }

    let mismatch = |constructor: &ConstructorDeclaration| -> Option<String> {
        constructor.parameters.iter().find_map(|parameter| {
            let parameter_type = substitution.apply(&parameter.type_id);
            match properties.iter().find(|(name, ..)| *name == parameter.name) {
                None => Some(format!(
                    "constructor parameter {} has no matching property",
                    parameter.name
                )),
                Some((_, property_type, ..)) if *property_type != parameter_type => Some(format!(
                    "constructor parameter {} is {} but property {} is {}",
                    parameter.name, parameter_type, parameter.name, property_type
                )),
                Some(_) => None,
            }
        })
    };
    let remedy = "align constructor parameters with property names and types, \
                  or mark one constructor for deserialization";

    let marked: Vec<&ConstructorDeclaration> = declaration
        .constructors
        .iter()
        .filter(|c| c.for_deserialization)
        .collect();
    let chosen = match marked.as_slice() {
        [only] => {
            if let Some(reason) = mismatch(only) {
                return Err((reason, remedy.into()));
            }
            *only
        }
        [] => {
            let mut best: Option<&ConstructorDeclaration> = None;
            let mut tied = false;
            let mut first_failure = None;
            for candidate in &declaration.constructors {
                if let Some(reason) = mismatch(candidate) {
                    first_failure.get_or_insert(reason);
                    continue;
                }
                match best {
                    Some(current) if current.parameters.len() == candidate.parameters.len() => {
                        tied = true;
                    }
                    Some(current) if current.parameters.len() > candidate.parameters.len() => {}
                    _ => {
                        best = Some(candidate);
                        tied = false;
                    }
                }
            }
            match best {
                None => {
                    return Err((
                        first_failure.unwrap_or_else(|| "no usable constructor".into()),
                        remedy.into(),
                    ))
                }
                Some(_) if tied => {
                    return Err((
                        "several constructors match the same number of properties".into(),
                        remedy.into(),
                    ))
                }
                Some(best) => best,
            }
        }
        _ => {
            return Err((
                "more than one constructor is marked for deserialization".into(),
                "mark exactly one constructor".into(),
            ))
        }
    };

    if let Some((name, ..)) = properties.iter().find(|(name, _, _, kind)| {
        *kind == PropertyKind::Constructor && !chosen.parameters.iter().any(|p| p.name == *name)
    }) {
        return Err((
            format!("property {} is not set by the chosen constructor", name),
            "add it to the constructor or declare it as a setter property".into(),
        ));
    }

    Ok(LocalConstructorInformation {
        parameters: resolve_parameters(&chosen.parameters, substitution),
    })
}

/// Type-parameter name → argument mapping for one generic instantiation.
struct Substitution {
    type_id: TypeIdentifier,
    parameters: Vec<String>,
    arguments: Vec<TypeIdentifier>,
}

impl Substitution {
    fn new(requested: &TypeIdentifier, declaration: &TypeDeclaration) -> Self {
        let parameters = declaration.type_parameters.clone();
        let supplied = requested.arguments();
        let arguments: Vec<TypeIdentifier> = (0..parameters.len())
            .map(|i| supplied.get(i).cloned().unwrap_or(TypeIdentifier::Unknown))
            .collect();
        let type_id = match requested {
            TypeIdentifier::Unparameterised(name) if !parameters.is_empty() => {
                TypeIdentifier::Erased {
                    name: name.clone(),
                    parameter_count: parameters.len(),
                }
            }
            other => other.clone(),
        };
        Self {
            type_id,
            parameters,
            arguments,
        }
    }

    fn apply(&self, declared: &TypeIdentifier) -> TypeIdentifier {
        match declared {
            TypeIdentifier::Unparameterised(name) => self
                .parameters
                .iter()
                .position(|p| p == name)
                .map_or_else(|| declared.clone(), |i| self.arguments[i].clone()),
            TypeIdentifier::Parameterised { name, arguments } => TypeIdentifier::Parameterised {
                name: name.clone(),
                arguments: arguments.iter().map(|a| self.apply(a)).collect(),
            },
            TypeIdentifier::ArrayOf(component) => TypeIdentifier::array_of(self.apply(component)),
            other => other.clone(),
        }
    }
}

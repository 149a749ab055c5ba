// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type information reconstructed from a received schema alone.
//!
//! Nothing here consults local declarations: a [`RemoteTypeCatalogue`] is
//! exactly what the sender has proven about its types.

use super::type_id::{CollectionKind, TypeIdentifier};
use crate::error::{Error, Result};
use crate::schema::{source, Schema, TypeNotation};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePropertyInformation {
    pub name: String,
    pub type_id: TypeIdentifier,
    pub mandatory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteTypeInformation {
    Composable {
        type_id: TypeIdentifier,
        descriptor: String,
        /// Wire order.
        properties: Vec<RemotePropertyInformation>,
        interfaces: Vec<TypeIdentifier>,
    },
    AnEnum {
        type_id: TypeIdentifier,
        descriptor: String,
        /// Ordinal order.
        constants: Vec<String>,
        interfaces: Vec<TypeIdentifier>,
    },
    AnInterface {
        type_id: TypeIdentifier,
        descriptor: String,
        interfaces: Vec<TypeIdentifier>,
    },
    ACollection {
        type_id: TypeIdentifier,
        descriptor: String,
        kind: CollectionKind,
        element: TypeIdentifier,
    },
    AMap {
        type_id: TypeIdentifier,
        descriptor: String,
        kind: CollectionKind,
        key: TypeIdentifier,
        value: TypeIdentifier,
    },
    AnArray {
        type_id: TypeIdentifier,
        descriptor: String,
        component: TypeIdentifier,
    },
    /// Written by a custom serializer as its proxy type.
    Custom {
        type_id: TypeIdentifier,
        descriptor: String,
        proxy: TypeIdentifier,
    },
}

impl RemoteTypeInformation {
    pub fn type_id(&self) -> &TypeIdentifier {
        match self {
            RemoteTypeInformation::Composable { type_id, .. }
            | RemoteTypeInformation::AnEnum { type_id, .. }
            | RemoteTypeInformation::AnInterface { type_id, .. }
            | RemoteTypeInformation::ACollection { type_id, .. }
            | RemoteTypeInformation::AMap { type_id, .. }
            | RemoteTypeInformation::AnArray { type_id, .. }
            | RemoteTypeInformation::Custom { type_id, .. } => type_id,
        }
    }

    pub fn descriptor(&self) -> &str {
        match self {
            RemoteTypeInformation::Composable { descriptor, .. }
            | RemoteTypeInformation::AnEnum { descriptor, .. }
            | RemoteTypeInformation::AnInterface { descriptor, .. }
            | RemoteTypeInformation::ACollection { descriptor, .. }
            | RemoteTypeInformation::AMap { descriptor, .. }
            | RemoteTypeInformation::AnArray { descriptor, .. }
            | RemoteTypeInformation::Custom { descriptor, .. } => descriptor,
        }
    }

    pub fn interfaces(&self) -> &[TypeIdentifier] {
        match self {
            RemoteTypeInformation::Composable { interfaces, .. }
            | RemoteTypeInformation::AnEnum { interfaces, .. }
            | RemoteTypeInformation::AnInterface { interfaces, .. } => interfaces,
            _ => &[],
        }
    }

    /// Types this entry refers to that need their own schema entries.
    fn references(&self) -> Vec<&TypeIdentifier> {
        match self {
            RemoteTypeInformation::Composable { properties, .. } => {
                properties.iter().map(|p| &p.type_id).collect()
            }
            RemoteTypeInformation::ACollection { element, .. } => vec![element],
            RemoteTypeInformation::AMap { key, value, .. } => vec![key, value],
            RemoteTypeInformation::AnArray { component, .. } => vec![component],
            RemoteTypeInformation::Custom { proxy, .. } => vec![proxy],
            RemoteTypeInformation::AnEnum { .. } | RemoteTypeInformation::AnInterface { .. } => {
                Vec::new()
            }
        }
    }
}

/// True for identifiers that never get a schema entry.
pub fn is_self_describing(type_id: &TypeIdentifier) -> bool {
    matches!(
        type_id,
        TypeIdentifier::Top
            | TypeIdentifier::Unknown
            | TypeIdentifier::Primitive(_)
            | TypeIdentifier::PrimitiveArrayOf(_)
    )
}

/// Remote types of one payload, addressable by descriptor and by name.
#[derive(Debug, Default)]
pub struct RemoteTypeCatalogue {
    by_descriptor: HashMap<String, Arc<RemoteTypeInformation>>,
    by_name: HashMap<String, Arc<RemoteTypeInformation>>,
    order: Vec<Arc<RemoteTypeInformation>>,
}

impl RemoteTypeCatalogue {
    /// Interpret a schema, rejecting entries that reference types the schema
    /// does not itself describe.
    pub fn interpret(schema: &Schema) -> Result<Self> {
        let mut catalogue = Self::default();
        for notation in &schema.types {
            let info = Arc::new(interpret_notation(notation)?);
            catalogue
                .by_descriptor
                .insert(info.descriptor().to_string(), Arc::clone(&info));
            catalogue
                .by_name
                .insert(info.type_id().name(), Arc::clone(&info));
            catalogue.order.push(info);
        }
        for info in &catalogue.order {
            for reference in info.references() {
                if !is_self_describing(reference) && !catalogue.by_name.contains_key(&reference.name()) {
                    return Err(Error::detailed(
                        info.type_id().name(),
                        format!("schema references {} but does not describe it", reference),
                    ));
                }
            }
        }
        log::trace!(
            "[REMOTE-MODEL] [OK] interpreted {} schema entries",
            catalogue.order.len()
        );
        Ok(catalogue)
    }

    pub fn get(&self, descriptor: &str) -> Option<&Arc<RemoteTypeInformation>> {
        self.by_descriptor.get(descriptor)
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<RemoteTypeInformation>> {
        self.by_name.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RemoteTypeInformation>> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn interpret_notation(notation: &TypeNotation) -> Result<RemoteTypeInformation> {
    let in_context = |e: Error| e.in_context(notation.name());
    let type_id = TypeIdentifier::parse(notation.name()).map_err(in_context)?;
    let descriptor = notation.descriptor().name.clone();
    let parse_all = |names: &[String]| -> Result<Vec<TypeIdentifier>> {
        names
            .iter()
            .map(|n| TypeIdentifier::parse(n))
            .collect::<Result<Vec<_>>>()
            .map_err(in_context)
    };

    match notation {
        TypeNotation::Composite(composite) => {
            let properties = composite
                .fields
                .iter()
                .map(|field| {
                    Ok(RemotePropertyInformation {
                        name: field.name.clone(),
                        type_id: TypeIdentifier::parse(&field.type_name)?,
                        mandatory: field.mandatory,
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map_err(in_context)?;
            Ok(RemoteTypeInformation::Composable {
                type_id,
                descriptor,
                properties,
                interfaces: parse_all(&composite.provides)?,
            })
        }
        TypeNotation::Restricted(restricted) => {
            let argument = |i: usize| {
                type_id
                    .arguments()
                    .get(i)
                    .cloned()
                    .unwrap_or(TypeIdentifier::Unknown)
            };
            match restricted.source.as_str() {
                source::LIST | source::MAP => {
                    let kind = type_id.collection_kind().ok_or_else(|| {
                        Error::detailed(notation.name(), "collection entry has an unknown shape")
                    })?;
                    if kind.is_map() {
                        Ok(RemoteTypeInformation::AMap {
                            key: argument(0),
                            value: argument(1),
                            type_id,
                            descriptor,
                            kind,
                        })
                    } else {
                        Ok(RemoteTypeInformation::ACollection {
                            element: argument(0),
                            type_id,
                            descriptor,
                            kind,
                        })
                    }
                }
                source::ARRAY => {
                    let component = match &type_id {
                        TypeIdentifier::ArrayOf(component) => (**component).clone(),
                        TypeIdentifier::PrimitiveArrayOf(p) => TypeIdentifier::Primitive(*p),
                        _ => {
                            return Err(Error::detailed(
                                notation.name(),
                                "array entry is not an array type",
                            ))
                        }
                    };
                    Ok(RemoteTypeInformation::AnArray {
                        type_id,
                        descriptor,
                        component,
                    })
                }
                source::ENUM => {
                    let mut choices = restricted
                        .choices
                        .iter()
                        .map(|c| {
                            c.value.parse::<u32>().map(|o| (o, c.name.clone())).map_err(|_| {
                                Error::detailed(
                                    notation.name(),
                                    format!("choice {} has a non-numeric ordinal", c.name),
                                )
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    choices.sort_by_key(|(ordinal, _)| *ordinal);
                    if choices.iter().enumerate().any(|(i, (o, _))| *o as usize != i) {
                        return Err(Error::detailed(notation.name(), "enum ordinals are not contiguous"));
                    }
                    Ok(RemoteTypeInformation::AnEnum {
                        type_id,
                        descriptor,
                        constants: choices.into_iter().map(|(_, name)| name).collect(),
                        interfaces: parse_all(&restricted.provides)?,
                    })
                }
                source::INTERFACE => Ok(RemoteTypeInformation::AnInterface {
                    type_id,
                    descriptor,
                    interfaces: parse_all(&restricted.provides)?,
                }),
                proxy => Ok(RemoteTypeInformation::Custom {
                    proxy: TypeIdentifier::parse(proxy).map_err(in_context)?,
                    type_id,
                    descriptor,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Choice, CompositeType, Descriptor, Field, RestrictedType};

    fn composite(name: &str, fields: Vec<Field>) -> TypeNotation {
        TypeNotation::Composite(CompositeType {
            name: name.into(),
            provides: vec![],
            descriptor: Descriptor::new(format!("net.ledger:{}", name)),
            fields,
        })
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let schema = Schema {
            types: vec![composite("Outer", vec![Field::new("inner", "Inner", true)])],
        };
        let err = RemoteTypeCatalogue::interpret(&schema).unwrap_err();
        assert!(err.to_string().contains("Inner"), "{}", err);
    }

    #[test]
    fn test_catalogue_resolves_by_name_and_descriptor() {
        let schema = Schema {
            types: vec![
                composite(
                    "Outer",
                    vec![
                        Field::new("inner", "Inner", true),
                        Field::new("count", "int", true),
                        Field::new("raw", "long[p]", false),
                    ],
                ),
                composite("Inner", vec![]),
            ],
        };
        let catalogue = RemoteTypeCatalogue::interpret(&schema).unwrap();
        assert_eq!(catalogue.len(), 2);
        assert!(catalogue.by_name("Inner").is_some());
        assert!(catalogue.get("net.ledger:Outer").is_some());
    }

    #[test]
    fn test_enum_choices_ordered_by_ordinal() {
        let schema = Schema {
            types: vec![TypeNotation::Restricted(RestrictedType {
                name: "Side".into(),
                provides: vec![],
                source: source::ENUM.into(),
                descriptor: Descriptor::new("net.ledger:side"),
                choices: vec![Choice::new("SELL", "1"), Choice::new("BUY", "0")],
            })],
        };
        let catalogue = RemoteTypeCatalogue::interpret(&schema).unwrap();
        match catalogue.by_name("Side").unwrap().as_ref() {
            RemoteTypeInformation::AnEnum { constants, .. } => {
                assert_eq!(constants, &vec!["BUY".to_string(), "SELL".to_string()])
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_source_is_custom() {
        let schema = Schema {
            types: vec![
                TypeNotation::Restricted(RestrictedType {
                    name: "Instant".into(),
                    provides: vec![],
                    source: "InstantProxy".into(),
                    descriptor: Descriptor::new("net.ledger:instant"),
                    choices: vec![],
                }),
                composite("InstantProxy", vec![Field::new("seconds", "long", true)]),
            ],
        };
        let catalogue = RemoteTypeCatalogue::interpret(&schema).unwrap();
        assert!(matches!(
            catalogue.by_name("Instant").unwrap().as_ref(),
            RemoteTypeInformation::Custom { proxy, .. } if proxy.name() == "InstantProxy"
        ));
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class carpenter.
//!
//! Synthesizes declarations for remote types this process has never seen,
//! straight from the received schema, so their values can be read as
//! [`Record`]s. Synthesized types are always serializable and live in the
//! factory's child registry.

use crate::error::{Error, Result};
use crate::model::{
    is_self_describing, RemotePropertyInformation, RemoteTypeCatalogue, RemoteTypeInformation,
    TypeDeclaration, TypeIdentifier, TypeRegistry,
};
use crate::serializers::{expect_list, DeserializationInput, SerializationOutput, Serializer};
use crate::value::{Record, Value};
use crate::wire::WireValue;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct ClassCarpenter {
    registry: Arc<TypeRegistry>,
}

impl ClassCarpenter {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// Declare `remote` and every undeclared type it references.
    pub fn carpent(&self, remote: &RemoteTypeInformation, catalogue: &RemoteTypeCatalogue) -> Result<()> {
        match remote {
            RemoteTypeInformation::Composable {
                type_id,
                properties,
                interfaces,
                ..
            } => {
                if self.registry.contains(&type_id.name()) {
                    return Ok(());
                }
                let mut declaration = TypeDeclaration::composite(type_id.name()).always_serializable();
                for property in properties {
                    declaration = declaration.property_with(
                        property.name.clone(),
                        property.type_id.clone(),
                        property.mandatory,
                    );
                }
                for interface in interfaces {
                    declaration = declaration.supertype(interface.clone());
                }
                self.register(type_id, declaration)?;
                for interface in interfaces {
                    self.carpent_interface(interface, catalogue)?;
                }
                for property in properties {
                    self.carpent_reference(&property.type_id, catalogue)?;
                }
                Ok(())
            }
            RemoteTypeInformation::AnEnum {
                type_id,
                constants,
                interfaces,
                ..
            } => {
                if self.registry.contains(&type_id.name()) {
                    return Ok(());
                }
                let mut declaration =
                    TypeDeclaration::enumeration(type_id.name(), constants.iter().cloned())
                        .always_serializable();
                for interface in interfaces {
                    declaration = declaration.supertype(interface.clone());
                }
                self.register(type_id, declaration)?;
                for interface in interfaces {
                    self.carpent_interface(interface, catalogue)?;
                }
                Ok(())
            }
            RemoteTypeInformation::AnInterface {
                type_id,
                interfaces,
                ..
            } => {
                if self.registry.contains(&type_id.name()) {
                    return Ok(());
                }
                let mut declaration = TypeDeclaration::interface(type_id.name()).always_serializable();
                for interface in interfaces {
                    declaration = declaration.supertype(interface.clone());
                }
                self.register(type_id, declaration)?;
                for interface in interfaces {
                    self.carpent_interface(interface, catalogue)?;
                }
                Ok(())
            }
            RemoteTypeInformation::ACollection { element, .. } => {
                self.carpent_reference(element, catalogue)
            }
            RemoteTypeInformation::AMap { key, value, .. } => {
                self.carpent_reference(key, catalogue)?;
                self.carpent_reference(value, catalogue)
            }
            RemoteTypeInformation::AnArray { component, .. } => {
                self.carpent_reference(component, catalogue)
            }
            RemoteTypeInformation::Custom { proxy, .. } => self.carpent_reference(proxy, catalogue),
        }
    }

    fn register(&self, type_id: &TypeIdentifier, declaration: TypeDeclaration) -> Result<()> {
        self.registry
            .register(declaration)
            .map_err(|e| e.in_context(&type_id.name()))?;
        log::debug!("[CARPENTER] [OK] synthesized {}", type_id);
        Ok(())
    }

    fn carpent_reference(&self, type_id: &TypeIdentifier, catalogue: &RemoteTypeCatalogue) -> Result<()> {
        if is_self_describing(type_id) {
            return Ok(());
        }
        match catalogue.by_name(&type_id.name()) {
            Some(info) => self.carpent(info, catalogue),
            None => Ok(()),
        }
    }

    /// Interfaces may be referenced without being described.
    fn carpent_interface(&self, type_id: &TypeIdentifier, catalogue: &RemoteTypeCatalogue) -> Result<()> {
        if self.registry.contains(&type_id.name()) {
            return Ok(());
        }
        match catalogue.by_name(&type_id.name()) {
            Some(info) => self.carpent(info, catalogue),
            None => self.register(
                type_id,
                TypeDeclaration::interface(type_id.name()).always_serializable(),
            ),
        }
    }
}

/// Reads a composite purely from its remote description, yielding a record
/// under the remote type name. Used when a local type cannot be bridged and
/// the caller asked for lenient evolution.
#[derive(Debug)]
pub struct RemoteRecordSerializer {
    type_id: TypeIdentifier,
    descriptor: String,
    properties: Vec<RemotePropertyInformation>,
}

impl RemoteRecordSerializer {
    pub fn new(type_id: TypeIdentifier, descriptor: String, properties: Vec<RemotePropertyInformation>) -> Self {
        Self {
            type_id,
            descriptor,
            properties,
        }
    }
}

impl Serializer for RemoteRecordSerializer {
    fn type_id(&self) -> &TypeIdentifier {
        &self.type_id
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn write_type(&self, _output: &mut SerializationOutput<'_>) -> Result<()> {
        Ok(())
    }

    fn write_value(&self, _value: &Value, _output: &mut SerializationOutput<'_>) -> Result<WireValue> {
        Err(Error::not_serializable(format!(
            "{} was read as a remote record and cannot be written",
            self.type_id
        )))
    }

    fn read_value(&self, body: &WireValue, input: &mut DeserializationInput<'_>) -> Result<Value> {
        let items = expect_list(body, &self.type_id)?;
        if items.len() != self.properties.len() {
            return Err(Error::not_serializable(format!(
                "{} schema lists {} properties, payload has {}",
                self.type_id,
                self.properties.len(),
                items.len()
            )));
        }
        let mut fields = BTreeMap::new();
        for (property, item) in self.properties.iter().zip(items) {
            fields.insert(property.name.clone(), input.read_object(item, &property.type_id)?);
        }
        Ok(Record::from_fields(self.type_id.clone(), fields).into_value())
    }
}

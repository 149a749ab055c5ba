// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{DeserializationInput, SerializationOutput, Serializer};
use crate::error::{Error, Result};
use crate::model::TypeIdentifier;
use crate::schema::{source, Descriptor, RestrictedType, TypeNotation};
use crate::value::Value;
use crate::wire::WireValue;

/// Schema entry for an interface used as a declared property type. Values
/// are always written under their concrete type.
#[derive(Debug)]
pub struct InterfaceSerializer {
    type_id: TypeIdentifier,
    descriptor: String,
    interfaces: Vec<TypeIdentifier>,
}

impl InterfaceSerializer {
    pub fn new(type_id: TypeIdentifier, descriptor: String, interfaces: Vec<TypeIdentifier>) -> Self {
        Self {
            type_id,
            descriptor,
            interfaces,
        }
    }

    fn no_instances(&self) -> Error {
        Error::not_serializable(format!("interface {} has no instances of its own", self.type_id))
    }
}

impl Serializer for InterfaceSerializer {
    fn type_id(&self) -> &TypeIdentifier {
        &self.type_id
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn write_type(&self, output: &mut SerializationOutput<'_>) -> Result<()> {
        output.add_notation(TypeNotation::Restricted(RestrictedType {
            name: self.type_id.name(),
            provides: self.interfaces.iter().map(TypeIdentifier::name).collect(),
            source: source::INTERFACE.to_string(),
            descriptor: Descriptor::new(self.descriptor.clone()),
            choices: Vec::new(),
        }));
        Ok(())
    }

    fn write_value(&self, _value: &Value, _output: &mut SerializationOutput<'_>) -> Result<WireValue> {
        Err(self.no_instances())
    }

    fn read_value(&self, _body: &WireValue, _input: &mut DeserializationInput<'_>) -> Result<Value> {
        Err(self.no_instances())
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{expect_list, DeserializationInput, SerializationOutput, Serializer};
use crate::error::{Error, Result};
use crate::model::TypeIdentifier;
use crate::schema::{source, Choice, Descriptor, EnumTransform, RestrictedType, TypeNotation};
use crate::value::{EnumValue, Value};
use crate::wire::WireValue;

/// Enum constants travel as `[name, ordinal]`.
#[derive(Debug)]
pub struct EnumSerializer {
    type_id: TypeIdentifier,
    descriptor: String,
    constants: Vec<String>,
    transforms: Vec<EnumTransform>,
    interfaces: Vec<TypeIdentifier>,
}

impl EnumSerializer {
    pub fn new(
        type_id: TypeIdentifier,
        descriptor: String,
        constants: Vec<String>,
        transforms: Vec<EnumTransform>,
        interfaces: Vec<TypeIdentifier>,
    ) -> Self {
        Self {
            type_id,
            descriptor,
            constants,
            transforms,
            interfaces,
        }
    }
}

/// Split an enum body into its constant name and ordinal.
pub(crate) fn read_enum_body(body: &WireValue, type_id: &TypeIdentifier) -> Result<(String, u32)> {
    let items = expect_list(body, type_id)?;
    let (name, ordinal) = match items {
        [name, ordinal] => (name.as_str(), ordinal.as_u64()),
        _ => (None, None),
    };
    match (name, ordinal.and_then(|o| u32::try_from(o).ok())) {
        (Some(name), Some(ordinal)) => Ok((name.to_string(), ordinal)),
        _ => Err(Error::not_serializable(format!(
            "malformed {} constant",
            type_id
        ))),
    }
}

impl Serializer for EnumSerializer {
    fn type_id(&self) -> &TypeIdentifier {
        &self.type_id
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn write_type(&self, output: &mut SerializationOutput<'_>) -> Result<()> {
        let name = self.type_id.name();
        output.add_transforms(&name, &self.transforms);
        output.add_notation(TypeNotation::Restricted(RestrictedType {
            name,
            provides: self.interfaces.iter().map(TypeIdentifier::name).collect(),
            source: source::ENUM.to_string(),
            descriptor: Descriptor::new(self.descriptor.clone()),
            choices: self
                .constants
                .iter()
                .enumerate()
                .map(|(ordinal, constant)| Choice::new(constant.clone(), ordinal.to_string()))
                .collect(),
        }));
        Ok(())
    }

    fn write_value(&self, value: &Value, _output: &mut SerializationOutput<'_>) -> Result<WireValue> {
        let Value::Enum(constant) = value else {
            return Err(Error::not_serializable(format!(
                "expected a {} constant, found {}",
                self.type_id,
                value.kind_name()
            )));
        };
        let ordinal = self
            .constants
            .iter()
            .position(|c| *c == constant.name)
            .ok_or_else(|| {
                Error::detailed(
                    self.type_id.name(),
                    format!("{} is not a constant", constant.name),
                )
            })?;
        Ok(WireValue::List(vec![
            WireValue::string(constant.name.clone()),
            WireValue::UInt(ordinal as u32),
        ]))
    }

    fn read_value(&self, body: &WireValue, _input: &mut DeserializationInput<'_>) -> Result<Value> {
        let (name, ordinal) = read_enum_body(body, &self.type_id)?;
        match self.constants.get(ordinal as usize) {
            Some(local) if *local == name => {
                Ok(Value::Enum(EnumValue::new(self.type_id.clone(), name, ordinal)))
            }
            _ => Err(Error::detailed(
                self.type_id.name(),
                format!("constant {} does not sit at ordinal {}", name, ordinal),
            )),
        }
    }
}

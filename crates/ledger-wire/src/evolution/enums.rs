// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enum evolution.
//!
//! Each remote constant is mapped onto a local one through the rename and
//! default transforms. Constants that keep their identity (possibly under a
//! new name) must keep their ordinal: reordering is rejected when the
//! bridge is built. Constants with no local counterpart fail only when a
//! payload actually carries one.

use super::write_unsupported;
use crate::error::{Error, Result};
use crate::model::TypeIdentifier;
use crate::schema::{resolve_constant, EnumTransform};
use crate::serializers::{read_enum_body, DeserializationInput, SerializationOutput, Serializer};
use crate::value::{EnumValue, Value};
use crate::wire::WireValue;

#[derive(Debug)]
pub struct EnumEvolutionSerializer {
    type_id: TypeIdentifier,
    descriptor: String,
    remote: Vec<String>,
    /// Local constant and ordinal per remote ordinal.
    mapping: Vec<Option<(String, u32)>>,
}

impl EnumEvolutionSerializer {
    pub fn new(
        type_id: TypeIdentifier,
        descriptor: String,
        local: &[String],
        remote: &[String],
        transforms: &[EnumTransform],
    ) -> Result<Self> {
        let renames: Vec<EnumTransform> = transforms
            .iter()
            .filter(|t| matches!(t, EnumTransform::Rename { .. }))
            .cloned()
            .collect();
        let position = |name: &str| local.iter().position(|c| c == name).map(|i| i as u32);

        let mut mapping = Vec::with_capacity(remote.len());
        for (ordinal, name) in remote.iter().enumerate() {
            let ordinal = ordinal as u32;
            if let Some(renamed) = resolve_constant(name, local, &renames) {
                let local_ordinal = position(&renamed).unwrap_or(ordinal);
                if local_ordinal != ordinal {
                    return Err(Error::detailed(
                        type_id.name(),
                        format!(
                            "constant {} moved from ordinal {} to {}; reordering is not supported",
                            name, ordinal, local_ordinal
                        ),
                    ));
                }
                mapping.push(Some((renamed, local_ordinal)));
                continue;
            }
            mapping.push(
                resolve_constant(name, local, transforms)
                    .and_then(|c| position(&c).map(|o| (c, o))),
            );
        }
        log::debug!(
            "[EVOLUTION] [OK] {} maps {} remote constants onto {} local",
            type_id,
            remote.len(),
            local.len()
        );
        Ok(Self {
            type_id,
            descriptor,
            remote: remote.to_vec(),
            mapping,
        })
    }
}

impl Serializer for EnumEvolutionSerializer {
    fn type_id(&self) -> &TypeIdentifier {
        &self.type_id
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn write_type(&self, _output: &mut SerializationOutput<'_>) -> Result<()> {
        Err(write_unsupported(&self.type_id))
    }

    fn write_value(&self, _value: &Value, _output: &mut SerializationOutput<'_>) -> Result<WireValue> {
        Err(write_unsupported(&self.type_id))
    }

    fn read_value(&self, body: &WireValue, _input: &mut DeserializationInput<'_>) -> Result<Value> {
        let (name, ordinal) = read_enum_body(body, &self.type_id)?;
        if self.remote.get(ordinal as usize) != Some(&name) {
            return Err(Error::detailed(
                self.type_id.name(),
                format!("constant {} does not sit at remote ordinal {}", name, ordinal),
            ));
        }
        match self.mapping.get(ordinal as usize).cloned().flatten() {
            Some((local, local_ordinal)) => Ok(Value::Enum(EnumValue::new(
                self.type_id.clone(),
                local,
                local_ordinal,
            ))),
            None => Err(Error::detailed(
                self.type_id.name(),
                format!("constant {} has no local counterpart", name),
            )),
        }
    }
}

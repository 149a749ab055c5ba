// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{expect_list, DeserializationInput, SerializationOutput, Serializer};
use crate::error::{Error, Result};
use crate::model::{LocalComposable, PropertyKind, TypeIdentifier};
use crate::schema::{CompositeType, Descriptor, Field, TypeNotation};
use crate::value::{Record, Value};
use crate::wire::WireValue;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Property-list serializer for a composable type whose local shape matches
/// the wire shape exactly.
#[derive(Debug)]
pub struct ObjectSerializer {
    type_id: TypeIdentifier,
    descriptor: String,
    info: Arc<LocalComposable>,
}

impl ObjectSerializer {
    pub fn new(info: Arc<LocalComposable>, descriptor: String) -> Self {
        Self {
            type_id: info.type_id.clone(),
            descriptor,
            info,
        }
    }

    pub fn info(&self) -> &Arc<LocalComposable> {
        &self.info
    }
}

impl Serializer for ObjectSerializer {
    fn type_id(&self) -> &TypeIdentifier {
        &self.type_id
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn write_type(&self, output: &mut SerializationOutput<'_>) -> Result<()> {
        output.add_notation(TypeNotation::Composite(CompositeType {
            name: self.type_id.name(),
            provides: self.info.interfaces.iter().map(TypeIdentifier::name).collect(),
            descriptor: Descriptor::new(self.descriptor.clone()),
            fields: self
                .info
                .properties
                .iter()
                .map(|p| Field::new(p.name.clone(), p.type_id().name(), p.mandatory))
                .collect(),
        }));
        for property in &self.info.properties {
            output
                .require_type(&property.type_id())
                .map_err(|e| e.in_context(&property.name))?;
        }
        Ok(())
    }

    fn write_value(&self, value: &Value, output: &mut SerializationOutput<'_>) -> Result<WireValue> {
        let Value::Composite(record) = value else {
            return Err(Error::not_serializable(format!(
                "expected a {} record, found {}",
                self.type_id,
                value.kind_name()
            )));
        };
        if let Some(unknown) = record
            .fields()
            .keys()
            .find(|name| self.info.property(name).is_none())
        {
            return Err(Error::detailed(
                self.type_id.name(),
                format!("record carries undeclared property {}", unknown),
            ));
        }

        let mut items = Vec::with_capacity(self.info.properties.len());
        for property in &self.info.properties {
            let field = record.get(&property.name).unwrap_or(&Value::Null);
            if field.is_null() && property.mandatory {
                return Err(Error::detailed(
                    self.type_id.name(),
                    format!("mandatory property {} is null", property.name),
                ));
            }
            items.push(output.write_object(field, &property.type_id())?);
        }
        Ok(WireValue::List(items))
    }

    fn read_value(&self, body: &WireValue, input: &mut DeserializationInput<'_>) -> Result<Value> {
        let items = expect_list(body, &self.type_id)?;
        if items.len() != self.info.properties.len() {
            return Err(Error::not_serializable(format!(
                "{} expects {} properties, payload has {}",
                self.type_id,
                self.info.properties.len(),
                items.len()
            )));
        }

        let mut fields = BTreeMap::new();
        for (property, item) in self.info.properties.iter().zip(items) {
            let field = input.read_object(item, &property.type_id())?;
            if field.is_null() && property.mandatory {
                return Err(Error::detailed(
                    self.type_id.name(),
                    format!("mandatory property {} is null", property.name),
                ));
            }
            // calculated properties are informational only
            if property.kind != PropertyKind::Calculated {
                fields.insert(property.name.clone(), field);
            }
        }
        Ok(Record::from_fields(self.type_id.clone(), fields).into_value())
    }
}

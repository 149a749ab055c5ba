// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{expect_list, DeserializationInput, SerializationOutput, Serializer};
use crate::error::{Error, Result};
use crate::model::TypeIdentifier;
use crate::schema::{source, Descriptor, RestrictedType, TypeNotation};
use crate::value::Value;
use crate::wire::WireValue;

/// Boxed (`T[]`) and unboxed (`T[p]`) arrays. Unboxed elements may not be
/// null.
#[derive(Debug)]
pub struct ArraySerializer {
    type_id: TypeIdentifier,
    descriptor: String,
    component: TypeIdentifier,
}

impl ArraySerializer {
    pub fn new(type_id: TypeIdentifier, descriptor: String, component: TypeIdentifier) -> Self {
        Self {
            type_id,
            descriptor,
            component,
        }
    }

    fn unboxed(&self) -> bool {
        matches!(self.type_id, TypeIdentifier::PrimitiveArrayOf(_))
    }

    fn null_element(&self) -> Error {
        Error::not_serializable(format!("{} cannot hold null elements", self.type_id))
    }
}

impl Serializer for ArraySerializer {
    fn type_id(&self) -> &TypeIdentifier {
        &self.type_id
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn write_type(&self, output: &mut SerializationOutput<'_>) -> Result<()> {
        output.add_notation(TypeNotation::Restricted(RestrictedType {
            name: self.type_id.name(),
            provides: Vec::new(),
            source: source::ARRAY.to_string(),
            descriptor: Descriptor::new(self.descriptor.clone()),
            choices: Vec::new(),
        }));
        output.require_type(&self.component)
    }

    fn write_value(&self, value: &Value, output: &mut SerializationOutput<'_>) -> Result<WireValue> {
        let Value::Array(items) = value else {
            return Err(Error::not_serializable(format!(
                "expected {}, found {}",
                self.type_id,
                value.kind_name()
            )));
        };
        let mut encoded = Vec::with_capacity(items.len());
        for item in items {
            if self.unboxed() && item.is_null() {
                return Err(self.null_element());
            }
            encoded.push(output.write_object(item, &self.component)?);
        }
        Ok(WireValue::List(encoded))
    }

    fn read_value(&self, body: &WireValue, input: &mut DeserializationInput<'_>) -> Result<Value> {
        let items = expect_list(body, &self.type_id)?;
        let mut decoded = Vec::with_capacity(items.len());
        for item in items {
            let element = input.read_object(item, &self.component)?;
            if self.unboxed() && element.is_null() {
                return Err(self.null_element());
            }
            decoded.push(element);
        }
        Ok(Value::Array(decoded))
    }
}

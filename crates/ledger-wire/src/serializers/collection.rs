// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializers for the allow-listed collection shapes.

use super::{expect_list, DeserializationInput, SerializationOutput, Serializer};
use crate::error::{Error, Result};
use crate::model::{CollectionKind, TypeIdentifier};
use crate::schema::{source, Descriptor, RestrictedType, TypeNotation};
use crate::value::{first_duplicate, Value};
use crate::wire::WireValue;

fn restricted(type_id: &TypeIdentifier, descriptor: &str, kind: &str) -> TypeNotation {
    TypeNotation::Restricted(RestrictedType {
        name: type_id.name(),
        provides: Vec::new(),
        source: kind.to_string(),
        descriptor: Descriptor::new(descriptor.to_string()),
        choices: Vec::new(),
    })
}

/// `list<T>` and `set<T>`.
#[derive(Debug)]
pub struct CollectionSerializer {
    type_id: TypeIdentifier,
    descriptor: String,
    kind: CollectionKind,
    element: TypeIdentifier,
}

impl CollectionSerializer {
    pub fn new(type_id: TypeIdentifier, descriptor: String, kind: CollectionKind, element: TypeIdentifier) -> Self {
        Self {
            type_id,
            descriptor,
            kind,
            element,
        }
    }
}

impl CollectionSerializer {
    fn reject_duplicate(&self, items: &[Value]) -> Result<()> {
        match first_duplicate(items) {
            Some(item) => Err(Error::not_serializable(format!(
                "{} holds duplicate element {:?}",
                self.type_id, item
            ))),
            None => Ok(()),
        }
    }
}

impl Serializer for CollectionSerializer {
    fn type_id(&self) -> &TypeIdentifier {
        &self.type_id
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn write_type(&self, output: &mut SerializationOutput<'_>) -> Result<()> {
        output.add_notation(restricted(&self.type_id, &self.descriptor, source::LIST));
        output.require_type(&self.element)
    }

    fn write_value(&self, value: &Value, output: &mut SerializationOutput<'_>) -> Result<WireValue> {
        let Value::List(items) = value else {
            return Err(Error::not_serializable(format!(
                "expected {}, found {}",
                self.type_id,
                value.kind_name()
            )));
        };
        if self.kind == CollectionKind::Set {
            self.reject_duplicate(items)?;
        }
        let mut encoded = Vec::with_capacity(items.len());
        for item in items {
            encoded.push(output.write_object(item, &self.element)?);
        }
        Ok(WireValue::List(encoded))
    }

    fn read_value(&self, body: &WireValue, input: &mut DeserializationInput<'_>) -> Result<Value> {
        let items = expect_list(body, &self.type_id)?;
        let mut decoded = Vec::with_capacity(items.len());
        for item in items {
            decoded.push(input.read_object(item, &self.element)?);
        }
        if self.kind == CollectionKind::Set {
            self.reject_duplicate(&decoded)?;
        }
        Ok(Value::List(decoded))
    }
}

/// `map<K, V>` and `sorted_map<K, V>`; entries keep their wire order.
#[derive(Debug)]
pub struct MapSerializer {
    type_id: TypeIdentifier,
    descriptor: String,
    key: TypeIdentifier,
    value: TypeIdentifier,
}

impl MapSerializer {
    pub fn new(type_id: TypeIdentifier, descriptor: String, key: TypeIdentifier, value: TypeIdentifier) -> Self {
        Self {
            type_id,
            descriptor,
            key,
            value,
        }
    }
}

impl MapSerializer {
    fn reject_duplicate_key(&self, entries: &[(Value, Value)]) -> Result<()> {
        match first_duplicate(entries.iter().map(|(k, _)| k)) {
            Some(key) => Err(Error::not_serializable(format!(
                "{} holds duplicate key {:?}",
                self.type_id, key
            ))),
            None => Ok(()),
        }
    }
}

impl Serializer for MapSerializer {
    fn type_id(&self) -> &TypeIdentifier {
        &self.type_id
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn write_type(&self, output: &mut SerializationOutput<'_>) -> Result<()> {
        output.add_notation(restricted(&self.type_id, &self.descriptor, source::MAP));
        output.require_type(&self.key)?;
        output.require_type(&self.value)
    }

    fn write_value(&self, value: &Value, output: &mut SerializationOutput<'_>) -> Result<WireValue> {
        let Value::Map(entries) = value else {
            return Err(Error::not_serializable(format!(
                "expected {}, found {}",
                self.type_id,
                value.kind_name()
            )));
        };
        self.reject_duplicate_key(entries)?;
        let mut encoded = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            encoded.push((
                output.write_object(k, &self.key)?,
                output.write_object(v, &self.value)?,
            ));
        }
        Ok(WireValue::Map(encoded))
    }

    fn read_value(&self, body: &WireValue, input: &mut DeserializationInput<'_>) -> Result<Value> {
        let WireValue::Map(entries) = body else {
            return Err(Error::not_serializable(format!(
                "{} body must be a map, found {}",
                self.type_id,
                body.kind_name()
            )));
        };
        let mut decoded = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            decoded.push((
                input.read_object(k, &self.key)?,
                input.read_object(v, &self.value)?,
            ));
        }
        self.reject_duplicate_key(&decoded)?;
        Ok(Value::Map(decoded))
    }
}

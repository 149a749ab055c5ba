// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{DeserializationInput, SerializationOutput, Serializer};
use crate::custom::{CustomMatch, CustomSerializer};
use crate::error::{Error, Result};
use crate::model::TypeIdentifier;
use crate::schema::{Descriptor, RestrictedType, TypeNotation};
use crate::value::Value;
use crate::wire::WireValue;
use std::sync::Arc;

/// Bridges a [`CustomSerializer`] into the serializer pipeline: the value is
/// written as its proxy, described under the custom descriptor.
#[derive(Debug)]
pub struct CustomSerializerAdapter {
    type_id: TypeIdentifier,
    descriptor: String,
    proxy: TypeIdentifier,
    custom: Arc<dyn CustomSerializer>,
}

impl CustomSerializerAdapter {
    pub fn new(type_id: TypeIdentifier, found: CustomMatch) -> Self {
        Self {
            type_id,
            descriptor: found.descriptor,
            proxy: found.serializer.proxy_type(),
            custom: found.serializer,
        }
    }
}

impl Serializer for CustomSerializerAdapter {
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
            source: self.proxy.name(),
            descriptor: Descriptor::new(self.descriptor.clone()),
            choices: Vec::new(),
        }));
        output.require_type(&self.proxy)
    }

    fn write_value(&self, value: &Value, output: &mut SerializationOutput<'_>) -> Result<WireValue> {
        let proxy = self.custom.to_proxy(value, output.ctx())?;
        output.write_object(&proxy, &self.proxy)
    }

    fn read_value(&self, body: &WireValue, input: &mut DeserializationInput<'_>) -> Result<Value> {
        let proxy = input.read_object(body, &self.proxy)?;
        self.custom.from_proxy(proxy, input.ctx())
    }

    /// The proxy inside takes the slot.
    fn tracks_reference(&self) -> bool {
        false
    }
}

/// Reads a custom-serialized value this process has no serializer for,
/// yielding the proxy record itself.
#[derive(Debug)]
pub struct RemoteCustomSerializer {
    type_id: TypeIdentifier,
    descriptor: String,
    proxy: TypeIdentifier,
}

impl RemoteCustomSerializer {
    pub fn new(type_id: TypeIdentifier, descriptor: String, proxy: TypeIdentifier) -> Self {
        Self {
            type_id,
            descriptor,
            proxy,
        }
    }
}

impl Serializer for RemoteCustomSerializer {
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
            "{} was received without a local custom serializer and cannot be written",
            self.type_id
        )))
    }

    fn read_value(&self, body: &WireValue, input: &mut DeserializationInput<'_>) -> Result<Value> {
        input.read_object(body, &self.proxy)
    }

    fn tracks_reference(&self) -> bool {
        false
    }
}

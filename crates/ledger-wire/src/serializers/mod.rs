// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializers and the per-call state they write into and read from.
//!
//! A [`Serializer`] handles one type identified by one descriptor. The
//! framing (descriptor tagging, back-references, primitive passthrough,
//! nesting limits) lives in [`SerializationOutput::write_object`] and
//! [`DeserializationInput::read_object`]; serializers only produce and
//! consume bodies.

mod array;
mod collection;
mod custom;
mod enums;
mod interface;
mod object;
pub(crate) mod primitive;

pub use array::ArraySerializer;
pub use collection::{CollectionSerializer, MapSerializer};
pub use custom::{CustomSerializerAdapter, RemoteCustomSerializer};
pub(crate) use enums::read_enum_body;
pub use enums::EnumSerializer;
pub use interface::InterfaceSerializer;
pub use object::ObjectSerializer;

use crate::context::SerializationContext;
use crate::error::{Error, Result};
use crate::factory::SerializerFactory;
use crate::model::{RemoteTypeCatalogue, TypeIdentifier, NOT_APPLICABLE};
use crate::schema::{EnumTransform, SchemaBuilder, TransformsSchema, TypeNotation};
use crate::value::{Record, Value};
use crate::wire::{Envelope, WireDescriptor, WireValue};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

pub trait Serializer: Send + Sync + fmt::Debug {
    /// Local type produced on read.
    fn type_id(&self) -> &TypeIdentifier;

    /// Wire descriptor of the values this serializer reads or writes.
    fn descriptor(&self) -> &str;

    /// Add this type's schema entry and those of the types it references.
    fn write_type(&self, output: &mut SerializationOutput<'_>) -> Result<()>;

    fn write_value(&self, value: &Value, output: &mut SerializationOutput<'_>) -> Result<WireValue>;

    fn read_value(&self, body: &WireValue, input: &mut DeserializationInput<'_>) -> Result<Value>;

    /// Whether a composite read or written under this descriptor takes a
    /// back-reference slot. Both sides must agree for every descriptor.
    fn tracks_reference(&self) -> bool {
        true
    }
}

fn depth_exceeded(max_depth: usize) -> Error {
    Error::not_serializable(format!("object graph nested deeper than {}", max_depth))
}

// ============================================================================
// Write side
// ============================================================================

/// State accumulated while writing one root object.
pub struct SerializationOutput<'a> {
    factory: &'a SerializerFactory,
    ctx: &'a SerializationContext,
    schema: SchemaBuilder,
    transforms: TransformsSchema,
    described: HashSet<String>,
    references: HashMap<usize, u32>,
    /// Keeps written records alive so their addresses stay unique.
    retained: Vec<Arc<Record>>,
    depth: usize,
    max_depth: usize,
}

impl<'a> SerializationOutput<'a> {
    pub fn new(factory: &'a SerializerFactory, ctx: &'a SerializationContext, max_depth: usize) -> Self {
        Self {
            factory,
            ctx,
            schema: SchemaBuilder::new(),
            transforms: TransformsSchema::new(),
            described: HashSet::new(),
            references: HashMap::new(),
            retained: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    pub fn ctx(&self) -> &'a SerializationContext {
        self.ctx
    }

    pub fn factory(&self) -> &'a SerializerFactory {
        self.factory
    }

    /// Add a schema entry; duplicates (by descriptor) are ignored.
    pub fn add_notation(&mut self, notation: TypeNotation) {
        self.schema.add(notation);
    }

    pub fn add_transforms(&mut self, type_name: &str, transforms: &[EnumTransform]) {
        self.transforms.insert(type_name, transforms);
    }

    /// Make sure `type_id` is described in the schema.
    pub fn require_type(&mut self, type_id: &TypeIdentifier) -> Result<()> {
        if type_id.is_open()
            || type_id.is_primitive()
            || matches!(type_id, TypeIdentifier::PrimitiveArrayOf(_))
        {
            return Ok(());
        }
        let serializer = self.factory.get(type_id)?;
        self.describe(serializer.as_ref())
    }

    fn describe(&mut self, serializer: &dyn Serializer) -> Result<()> {
        if self.described.insert(serializer.descriptor().to_string()) {
            serializer
                .write_type(self)
                .map_err(|e| e.in_context(&serializer.type_id().name()))?;
        }
        Ok(())
    }

    /// Encode `value` where the schema declares `declared`.
    pub fn write_object(&mut self, value: &Value, declared: &TypeIdentifier) -> Result<WireValue> {
        if value.is_null() {
            return Ok(WireValue::Null);
        }
        if let Some(wire) = primitive::to_wire(value) {
            return match declared {
                TypeIdentifier::Primitive(p) if primitive::matches(value, *p) => Ok(wire),
                TypeIdentifier::Top | TypeIdentifier::Unknown => Ok(wire),
                other => Err(Error::not_serializable(format!(
                    "expected {}, found {}",
                    other,
                    value.kind_name()
                ))),
            };
        }

        let actual = self.actual_type(value, declared)?;
        if let Value::Composite(record) = value {
            if self.ctx.object_references_enabled {
                if let Some(index) = self.references.get(&(Arc::as_ptr(record) as usize)) {
                    return Ok(WireValue::Reference(*index));
                }
            }
        }

        if self.depth >= self.max_depth {
            return Err(depth_exceeded(self.max_depth));
        }
        self.depth += 1;
        let written = self.write_described(value, &actual);
        self.depth -= 1;
        let (wire, tracked) = written?;

        if let (Value::Composite(record), true) = (value, tracked) {
            let index = self.retained.len() as u32;
            self.references
                .entry(Arc::as_ptr(record) as usize)
                .or_insert(index);
            self.retained.push(Arc::clone(record));
        }
        Ok(wire)
    }

    fn write_described(&mut self, value: &Value, actual: &TypeIdentifier) -> Result<(WireValue, bool)> {
        let serializer = self.factory.get(actual)?;
        self.describe(serializer.as_ref())?;
        let body = serializer
            .write_value(value, self)
            .map_err(|e| e.in_context(&actual.name()))?;
        let wire = WireValue::described(
            WireDescriptor::Symbol(serializer.descriptor().to_string()),
            body,
        );
        Ok((wire, serializer.tracks_reference()))
    }

    fn actual_type(&self, value: &Value, declared: &TypeIdentifier) -> Result<TypeIdentifier> {
        let structural = declared.collection_kind().is_some()
            || matches!(
                declared,
                TypeIdentifier::ArrayOf(_) | TypeIdentifier::PrimitiveArrayOf(_)
            );
        let runtime = value
            .runtime_type()
            .ok_or_else(|| Error::not_serializable("value has no runtime type"))?;
        match value {
            Value::List(_) | Value::Map(_) | Value::Array(_) if structural => Ok(declared.clone()),
            Value::List(_) | Value::Map(_) | Value::Array(_) => Ok(runtime),
            _ if declared.is_open() => Ok(runtime),
            _ => {
                let registry = self.factory.registry();
                if registry.supertype_distance(&runtime, declared) == NOT_APPLICABLE {
                    return Err(Error::not_serializable(format!(
                        "{} is not assignable to {}",
                        runtime, declared
                    )));
                }
                Ok(runtime)
            }
        }
    }

    /// Assemble the envelope around the encoded root.
    pub fn finish(self, obj: WireValue) -> Envelope {
        log::trace!(
            "[SERIALIZE] [OK] {} schema entries, {} objects",
            self.schema.len(),
            self.retained.len()
        );
        Envelope {
            obj,
            schema: self.schema.build(),
            transforms: self.transforms,
        }
    }
}

// ============================================================================
// Read side
// ============================================================================

/// State accumulated while reading one envelope.
pub struct DeserializationInput<'a> {
    factory: &'a SerializerFactory,
    ctx: &'a SerializationContext,
    catalogue: RemoteTypeCatalogue,
    transforms: TransformsSchema,
    /// Completed composites, in the writer's reference order.
    objects: Vec<Value>,
    depth: usize,
    max_depth: usize,
}

impl<'a> DeserializationInput<'a> {
    /// Interpret the envelope's schema and verify every structurally
    /// described entry against its descriptor.
    pub fn new(
        factory: &'a SerializerFactory,
        ctx: &'a SerializationContext,
        envelope: &Envelope,
        max_depth: usize,
    ) -> Result<Self> {
        let catalogue = RemoteTypeCatalogue::interpret(&envelope.schema)?;
        factory.verify(&catalogue)?;
        Ok(Self {
            factory,
            ctx,
            catalogue,
            transforms: envelope.transforms.clone(),
            objects: Vec::new(),
            depth: 0,
            max_depth,
        })
    }

    pub fn ctx(&self) -> &'a SerializationContext {
        self.ctx
    }

    pub fn factory(&self) -> &'a SerializerFactory {
        self.factory
    }

    pub fn catalogue(&self) -> &RemoteTypeCatalogue {
        &self.catalogue
    }

    pub fn transforms(&self) -> &TransformsSchema {
        &self.transforms
    }

    /// Decode `wire` where the schema declares `declared`.
    pub fn read_object(&mut self, wire: &WireValue, declared: &TypeIdentifier) -> Result<Value> {
        match wire {
            WireValue::Null => Ok(Value::Null),
            WireValue::Reference(index) => {
                self.objects.get(*index as usize).cloned().ok_or_else(|| {
                    Error::not_serializable(format!(
                        "back-reference {} precedes its object",
                        index
                    ))
                })
            }
            WireValue::Described { descriptor, body } => {
                let WireDescriptor::Symbol(descriptor) = descriptor else {
                    return Err(Error::not_serializable(format!(
                        "object descriptor {} is not a symbol",
                        descriptor
                    )));
                };
                if self.depth >= self.max_depth {
                    return Err(depth_exceeded(self.max_depth));
                }
                self.depth += 1;
                let read = self.read_described(descriptor, body);
                self.depth -= 1;
                let (value, tracked) = read?;
                if let (Value::Composite(_), true) = (&value, tracked) {
                    self.objects.push(value.clone());
                }
                Ok(value)
            }
            other => {
                let value = primitive::from_wire(other).ok_or_else(|| {
                    Error::not_serializable(format!("undescribed {} in object data", other.kind_name()))
                })?;
                match declared {
                    TypeIdentifier::Primitive(p) if !primitive::matches(&value, *p) => {
                        Err(Error::not_serializable(format!(
                            "expected {}, found {}",
                            declared,
                            value.kind_name()
                        )))
                    }
                    _ => Ok(value),
                }
            }
        }
    }

    fn read_described(&mut self, descriptor: &str, body: &WireValue) -> Result<(Value, bool)> {
        let factory = self.factory;
        let serializer = factory.get_by_descriptor(descriptor, self)?;
        let value = serializer
            .read_value(body, self)
            .map_err(|e| e.in_context(&serializer.type_id().name()))?;
        Ok((value, serializer.tracks_reference()))
    }
}

/// Body of a described list, or a decode error naming `type_id`.
pub(crate) fn expect_list<'w>(body: &'w WireValue, type_id: &TypeIdentifier) -> Result<&'w [WireValue]> {
    body.as_list().ok_or_else(|| {
        Error::not_serializable(format!(
            "{} body must be a list, found {}",
            type_id,
            body.kind_name()
        ))
    })
}

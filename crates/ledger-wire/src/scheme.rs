// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entry points: `serialize` and `deserialize`.
//!
//! A [`SerializationScheme`] owns the process-wide pieces (custom
//! serializers, fingerprinter, bounded factory cache) and resolves the
//! factory for each call from the context's whitelist and registry.

use crate::config::CodecConfig;
use crate::context::{SerializationContext, UseCase};
use crate::custom::{CustomSerializer, CustomSerializerRegistry};
use crate::error::{Error, Result};
use crate::factory::{FactoryCache, FactoryKey, SerializerFactory};
use crate::fingerprint::{HashingFingerprinter, TypeFingerprinter};
use crate::model::{TypeIdentifier, TypeRegistry, NOT_APPLICABLE};
use crate::serializers::{DeserializationInput, SerializationOutput};
use crate::traits::{Serializable, ValueReader, ValueWriter};
use crate::value::Value;
use crate::wire::Envelope;
use std::fmt;
use std::sync::Arc;

/// Framed bytes produced by [`SerializationScheme::serialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedBytes(Vec<u8>);

impl SerializedBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SerializedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<SerializedBytes> for Vec<u8> {
    fn from(bytes: SerializedBytes) -> Self {
        bytes.0
    }
}

/// A decoded object together with the envelope it came in.
#[derive(Debug)]
pub struct ObjectAndEnvelope<T> {
    pub obj: T,
    pub envelope: Envelope,
}

pub struct SerializationScheme {
    config: CodecConfig,
    factories: FactoryCache,
    customs: Arc<CustomSerializerRegistry>,
    fingerprinter: Arc<dyn TypeFingerprinter>,
}

impl SerializationScheme {
    /// Scheme with the built-in custom serializers and the hashing
    /// fingerprinter.
    pub fn new(config: CodecConfig) -> Self {
        Self {
            factories: FactoryCache::new(config.factory_cache_capacity),
            config,
            customs: Arc::new(CustomSerializerRegistry::with_builtins()),
            fingerprinter: Arc::new(HashingFingerprinter),
        }
    }

    #[must_use]
    pub fn with_custom_serializer(self, serializer: Arc<dyn CustomSerializer>) -> Self {
        self.customs.register(serializer);
        // factories declare proxies when created
        self.factories.clear();
        self
    }

    #[must_use]
    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn TypeFingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self.factories.clear();
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn custom_serializers(&self) -> &Arc<CustomSerializerRegistry> {
        &self.customs
    }

    pub fn factory_cache(&self) -> &FactoryCache {
        &self.factories
    }

    /// Context following this scheme's evolution and carpentry settings.
    pub fn context(&self, use_case: UseCase, registry: Arc<TypeRegistry>) -> SerializationContext {
        SerializationContext::for_config(use_case, registry, &self.config)
    }

    /// Factory for the context's `(whitelist, registry)` pair.
    pub fn factory(&self, ctx: &SerializationContext) -> Result<Arc<SerializerFactory>> {
        let key = FactoryKey {
            whitelist: ctx.whitelist.policy_id(),
            registry: ctx.registry.id(),
        };
        self.factories.get_or_try_build(key, || {
            SerializerFactory::new(
                Arc::clone(&ctx.registry),
                Arc::clone(&ctx.whitelist),
                Arc::clone(&self.customs),
                Arc::clone(&self.fingerprinter),
            )
        })
    }

    // ========================================================================
    // Write
    // ========================================================================

    pub fn serialize<T: Serializable>(&self, obj: &T, ctx: &SerializationContext) -> Result<SerializedBytes> {
        T::declare(&ctx.registry)?;
        let value = ValueWriter::new().write(obj)?;
        self.serialize_value(&value, &T::type_identifier(), ctx)
    }

    /// Serialize a dynamic value written where `declared` is expected.
    pub fn serialize_value(
        &self,
        value: &Value,
        declared: &TypeIdentifier,
        ctx: &SerializationContext,
    ) -> Result<SerializedBytes> {
        let factory = self.factory(ctx)?;
        let mut output = SerializationOutput::new(&factory, ctx, self.config.max_depth);
        let obj = output.write_object(value, declared)?;
        let envelope = output.finish(obj);
        let bytes = envelope.write(ctx.encoding)?;
        log::debug!(
            "[SERIALIZE] [OK] {} as {} bytes ({} schema entries, use case {})",
            declared,
            bytes.len(),
            envelope.schema.types.len(),
            ctx.use_case
        );
        Ok(SerializedBytes(bytes))
    }

    // ========================================================================
    // Read
    // ========================================================================

    pub fn deserialize<T: Serializable>(&self, bytes: &[u8], ctx: &SerializationContext) -> Result<T> {
        Ok(self.deserialize_and_return_envelope::<T>(bytes, ctx)?.obj)
    }

    /// Deserialize, also returning the envelope for inspection. Meant for
    /// tooling.
    pub fn deserialize_and_return_envelope<T: Serializable>(
        &self,
        bytes: &[u8],
        ctx: &SerializationContext,
    ) -> Result<ObjectAndEnvelope<T>> {
        T::declare(&ctx.registry)?;
        let decoded = self.deserialize_value_and_envelope(bytes, &T::type_identifier(), ctx)?;
        if decoded.obj.is_null() && !T::nullable() {
            return Err(Error::not_serializable(format!(
                "payload holds null where {} was expected",
                T::type_identifier()
            )));
        }
        let obj = ValueReader::new().read::<T>(&decoded.obj)?;
        Ok(ObjectAndEnvelope {
            obj,
            envelope: decoded.envelope,
        })
    }

    /// Deserialize to a dynamic value whose type must be assignable to
    /// `target`.
    pub fn deserialize_value(
        &self,
        bytes: &[u8],
        target: &TypeIdentifier,
        ctx: &SerializationContext,
    ) -> Result<Value> {
        Ok(self.deserialize_value_and_envelope(bytes, target, ctx)?.obj)
    }

    pub fn deserialize_value_and_envelope(
        &self,
        bytes: &[u8],
        target: &TypeIdentifier,
        ctx: &SerializationContext,
    ) -> Result<ObjectAndEnvelope<Value>> {
        let (envelope, encoding) = Envelope::read_bounded(
            bytes,
            ctx.encoding_whitelist.as_ref(),
            self.config.max_depth,
            self.config.max_inflated_size,
        )?;
        let factory = self.factory(ctx)?;
        let mut input = DeserializationInput::new(&factory, ctx, &envelope, self.config.max_depth)?;
        let obj = input.read_object(&envelope.obj, target)?;
        check_target(&factory, &obj, target)?;
        log::debug!(
            "[DESERIALIZE] [OK] {} from {} bytes (encoding {})",
            target,
            bytes.len(),
            encoding.map_or_else(|| "none".to_string(), |e| e.to_string())
        );
        Ok(ObjectAndEnvelope { obj, envelope })
    }
}

/// The decoded root must be assignable to the requested type.
fn check_target(factory: &SerializerFactory, obj: &Value, target: &TypeIdentifier) -> Result<()> {
    if target.is_open() {
        return Ok(());
    }
    let actual = match obj {
        Value::Composite(record) => &record.type_id,
        Value::Enum(constant) => &constant.type_id,
        _ => return Ok(()),
    };
    if factory.registry().supertype_distance(actual, target) == NOT_APPLICABLE {
        return Err(Error::not_serializable(format!(
            "payload holds {} where {} was expected",
            actual, target
        )));
    }
    Ok(())
}

impl Default for SerializationScheme {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

impl fmt::Debug for SerializationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationScheme")
            .field("config", &self.config)
            .field("factories", &self.factories)
            .field("custom_serializers", &self.customs.len())
            .field("fingerprinter", &self.fingerprinter)
            .finish()
    }
}

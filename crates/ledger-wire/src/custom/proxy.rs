// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::CustomSerializer;
use crate::context::SerializationContext;
use crate::error::{Error, Result};
use crate::model::{TypeDeclaration, TypeIdentifier, TypeRegistry};
use crate::traits::{Serializable, ValueReader, ValueWriter};
use crate::value::{OpaqueValue, Value};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// Encodes a native type `T` (carried as [`Value::Opaque`]) as the typed
/// proxy `P`.
pub struct ProxySerializer<T, P> {
    target: TypeIdentifier,
    to_proxy: fn(&T) -> P,
    from_proxy: fn(P) -> Result<T>,
    _marker: PhantomData<fn() -> (T, P)>,
}

impl<T, P> ProxySerializer<T, P>
where
    T: Any + Send + Sync,
    P: Serializable,
{
    pub fn new(target: TypeIdentifier, to_proxy: fn(&T) -> P, from_proxy: fn(P) -> Result<T>) -> Self {
        Self {
            target,
            to_proxy,
            from_proxy,
            _marker: PhantomData,
        }
    }
}

impl<T, P> fmt::Debug for ProxySerializer<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProxySerializer({})", self.target)
    }
}

impl<T, P> CustomSerializer for ProxySerializer<T, P>
where
    T: Any + Send + Sync,
    P: Serializable,
{
    fn type_id(&self) -> TypeIdentifier {
        self.target.clone()
    }

    fn proxy_type(&self) -> TypeIdentifier {
        P::type_identifier()
    }

    fn declare(&self, registry: &TypeRegistry) -> Result<()> {
        let name = self.target.name();
        if !registry.contains(&name) {
            registry.register(TypeDeclaration::non_composable(
                name,
                "native type",
                format!("encode through {}", P::type_identifier()),
            ))?;
        }
        P::declare(registry)
    }

    fn to_proxy(&self, value: &Value, _ctx: &SerializationContext) -> Result<Value> {
        let native = match value {
            Value::Opaque(opaque) => opaque.downcast_ref::<T>(),
            _ => None,
        }
        .ok_or_else(|| {
            Error::not_serializable(format!(
                "expected native {}, found {}",
                self.target,
                value.kind_name()
            ))
        })?;
        (self.to_proxy)(native).to_value(&mut ValueWriter::new())
    }

    fn from_proxy(&self, proxy: Value, _ctx: &SerializationContext) -> Result<Value> {
        let proxy = P::from_value(&proxy, &mut ValueReader::new())?;
        let native = (self.from_proxy)(proxy)?;
        Ok(Value::Opaque(OpaqueValue::new(self.target.clone(), native)))
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Custom serializers.
//!
//! A custom serializer encodes a type that cannot be described structurally
//! (a native type, or one whose fields must not leak) as an instance of a
//! composable proxy type. The schema records the target type as a
//! `RestrictedType` whose `source` names the proxy, and the proxy gets its
//! own entry.
//!
//! Lookup follows declared supertypes: a serializer registered for a
//! supertype applies to its subtypes, and the closest one wins.

mod builtin;
mod proxy;

pub use builtin::{
    duration_serializer, system_time_serializer, DurationProxy, DurationSerializer,
    FailureReport, FailureReportProxy, FailureReportSerializer, SystemTimeProxy,
    SystemTimeSerializer,
};
pub use proxy::ProxySerializer;

use crate::context::SerializationContext;
use crate::error::{Error, Result};
use crate::fingerprint::custom_fingerprint;
use crate::model::{TypeIdentifier, TypeRegistry, NOT_APPLICABLE};
use crate::value::Value;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

pub trait CustomSerializer: Send + Sync + fmt::Debug {
    /// Type (or supertype) this serializer handles.
    fn type_id(&self) -> TypeIdentifier;

    /// Composable type values are encoded as.
    fn proxy_type(&self) -> TypeIdentifier;

    /// Register the declarations of the proxy type and, if needed, the target.
    fn declare(&self, registry: &TypeRegistry) -> Result<()>;

    fn to_proxy(&self, value: &Value, ctx: &SerializationContext) -> Result<Value>;

    fn from_proxy(&self, proxy: Value, ctx: &SerializationContext) -> Result<Value>;

    fn name(&self) -> String {
        format!("{} via {}", self.type_id(), self.proxy_type())
    }

    /// Descriptor of the target type on the wire.
    fn descriptor(&self) -> String {
        custom_fingerprint(&self.type_id(), &self.proxy_type()).descriptor()
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone)]
pub struct CustomMatch {
    pub serializer: Arc<dyn CustomSerializer>,
    pub descriptor: String,
    /// Supertype hops between the looked-up type and the serializer's type.
    pub distance: u32,
}

/// Serializers registered with one scheme.
#[derive(Debug, Default)]
pub struct CustomSerializerRegistry {
    serializers: RwLock<Vec<Arc<dyn CustomSerializer>>>,
}

impl CustomSerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the `Duration`, `SystemTime` and
    /// [`FailureReport`] serializers.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(duration_serializer()));
        registry.register(Arc::new(system_time_serializer()));
        registry.register(Arc::new(FailureReportSerializer));
        registry
    }

    /// Add a serializer. Conflicts surface on lookup, not here.
    pub fn register(&self, serializer: Arc<dyn CustomSerializer>) {
        log::debug!("[CUSTOM] registered {}", serializer.name());
        self.serializers.write().push(serializer);
    }

    pub fn len(&self) -> usize {
        self.serializers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.serializers.read().is_empty()
    }

    /// Declare every proxy type into `registry`.
    pub fn declare_all(&self, registry: &TypeRegistry) -> Result<()> {
        for serializer in self.serializers.read().iter() {
            serializer.declare(registry)?;
        }
        Ok(())
    }

    /// Supertype hops from `type_id` to the type `serializer` handles, or
    /// [`NOT_APPLICABLE`].
    pub fn distance(
        type_id: &TypeIdentifier,
        serializer: &dyn CustomSerializer,
        registry: &TypeRegistry,
    ) -> u32 {
        registry.supertype_distance(type_id, &serializer.type_id())
    }

    /// Closest applicable serializer for `type_id`.
    ///
    /// Fails when the type may not have one (primitives, structural-only
    /// types) or when two serializers apply at the same distance.
    pub fn find(&self, type_id: &TypeIdentifier, registry: &TypeRegistry) -> Result<Option<CustomMatch>> {
        if type_id.is_open() {
            return Ok(None);
        }
        let serializers = self.serializers.read();
        let mut applicable: Vec<(u32, &Arc<dyn CustomSerializer>)> = serializers
            .iter()
            .map(|s| (Self::distance(type_id, s.as_ref(), registry), s))
            .filter(|(distance, _)| *distance != NOT_APPLICABLE)
            .collect();
        if applicable.is_empty() {
            return Ok(None);
        }

        let type_name = type_id.name();
        if type_id.is_primitive() {
            return Err(Error::IllegalCustomSerializer {
                type_name,
                reason: "primitive types are always serialized natively".into(),
            });
        }
        if registry
            .declaration_for(type_id)
            .is_some_and(|d| d.structural_only)
        {
            return Err(Error::IllegalCustomSerializer {
                type_name,
                reason: "type is marked structural-only".into(),
            });
        }

        applicable.sort_by_key(|(distance, _)| *distance);
        let closest = applicable[0].0;
        let tied: Vec<String> = applicable
            .iter()
            .take_while(|(distance, _)| *distance == closest)
            .map(|(_, s)| s.name())
            .collect();
        if tied.len() > 1 {
            return Err(Error::DuplicateCustomSerializer {
                type_name,
                serializers: tied,
            });
        }

        let serializer = Arc::clone(applicable[0].1);
        log::trace!(
            "[CUSTOM] [OK] {} handled by {} at distance {}",
            type_name,
            serializer.name(),
            closest
        );
        Ok(Some(CustomMatch {
            descriptor: serializer.descriptor(),
            serializer,
            distance: closest,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Primitive, TypeDeclaration};

    #[derive(Debug)]
    struct Fake {
        target: &'static str,
        proxy: &'static str,
    }

    impl CustomSerializer for Fake {
        fn type_id(&self) -> TypeIdentifier {
            TypeIdentifier::named(self.target)
        }

        fn proxy_type(&self) -> TypeIdentifier {
            TypeIdentifier::named(self.proxy)
        }

        fn declare(&self, _registry: &TypeRegistry) -> Result<()> {
            Ok(())
        }

        fn to_proxy(&self, value: &Value, _ctx: &SerializationContext) -> Result<Value> {
            Ok(value.clone())
        }

        fn from_proxy(&self, proxy: Value, _ctx: &SerializationContext) -> Result<Value> {
            Ok(proxy)
        }
    }

    fn fake(target: &'static str, proxy: &'static str) -> Arc<dyn CustomSerializer> {
        Arc::new(Fake { target, proxy })
    }

    fn hierarchy() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register(TypeDeclaration::interface("Base")).unwrap();
        registry
            .register(TypeDeclaration::interface("Middle").supertype(TypeIdentifier::named("Base")))
            .unwrap();
        registry
            .register(
                TypeDeclaration::composite("Leaf")
                    .property("x", TypeIdentifier::Primitive(Primitive::Int))
                    .supertype(TypeIdentifier::named("Middle")),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_distance_follows_supertypes() {
        let registry = hierarchy();
        let leaf = TypeIdentifier::named("Leaf");
        let base = fake("Base", "P");
        let other = fake("Other", "P");
        assert_eq!(CustomSerializerRegistry::distance(&leaf, base.as_ref(), &registry), 2);
        assert_eq!(
            CustomSerializerRegistry::distance(&leaf, other.as_ref(), &registry),
            NOT_APPLICABLE
        );
    }

    #[test]
    fn test_closest_serializer_wins() {
        let registry = hierarchy();
        let customs = CustomSerializerRegistry::new();
        customs.register(fake("Base", "BaseProxy"));
        customs.register(fake("Middle", "MiddleProxy"));
        let found = customs
            .find(&TypeIdentifier::named("Leaf"), &registry)
            .unwrap()
            .unwrap();
        assert_eq!(found.distance, 1);
        assert_eq!(found.serializer.proxy_type().name(), "MiddleProxy");
        assert!(customs.find(&TypeIdentifier::named("Unrelated"), &registry).unwrap().is_none());
    }

    #[test]
    fn test_duplicates_fail_on_lookup_only() {
        let registry = hierarchy();
        let customs = CustomSerializerRegistry::new();
        customs.register(fake("Leaf", "A"));
        customs.register(fake("Leaf", "B"));
        assert_eq!(customs.len(), 2);
        match customs.find(&TypeIdentifier::named("Leaf"), &registry) {
            Err(Error::DuplicateCustomSerializer { type_name, serializers }) => {
                assert_eq!(type_name, "Leaf");
                assert_eq!(serializers.len(), 2);
            }
            other => panic!("unexpected lookup result: {other:?}"),
        }
    }

    #[test]
    fn test_primitive_targets_are_illegal() {
        let customs = CustomSerializerRegistry::new();
        customs.register(fake("int", "IntProxy"));
        let err = customs
            .find(&TypeIdentifier::Primitive(Primitive::Int), &TypeRegistry::new())
            .unwrap_err();
        assert!(matches!(err, Error::IllegalCustomSerializer { .. }));
    }

    #[test]
    fn test_structural_only_types_are_illegal() {
        let registry = TypeRegistry::new();
        registry
            .register(
                TypeDeclaration::composite("Pinned")
                    .property("x", TypeIdentifier::Primitive(Primitive::Int))
                    .structural_only(),
            )
            .unwrap();
        let customs = CustomSerializerRegistry::new();
        customs.register(fake("Pinned", "PinnedProxy"));
        let err = customs
            .find(&TypeIdentifier::named("Pinned"), &registry)
            .unwrap_err();
        assert!(matches!(err, Error::IllegalCustomSerializer { .. }));
    }

    #[test]
    fn test_builtins_are_registered() {
        let customs = CustomSerializerRegistry::with_builtins();
        assert_eq!(customs.len(), 3);
        let registry = TypeRegistry::new();
        customs.declare_all(&registry).unwrap();
        let found = customs
            .find(&TypeIdentifier::named(builtin::DURATION), &registry)
            .unwrap()
            .unwrap();
        assert!(found.descriptor.starts_with("net.ledger:"));
    }
}

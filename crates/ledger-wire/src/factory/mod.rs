// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializer factory.
//!
//! A factory owns every serializer built for one `(whitelist, registry)`
//! pair. Serializers are found by local type when writing and by wire
//! descriptor when reading; a descriptor that differs from the local one
//! means the sender's type has evolved, and the factory builds an evolution
//! serializer bridging the two shapes. Types the process has never declared
//! are synthesized by the class carpenter into a child registry, so the
//! caller's registry is never modified.

mod cache;

pub use cache::{FactoryCache, FactoryKey, LookupStats};

use crate::carpenter::{ClassCarpenter, RemoteRecordSerializer};
use crate::context::EvolutionMode;
use crate::custom::CustomSerializerRegistry;
use crate::error::{Error, Result};
use crate::evolution::{EnumEvolutionSerializer, ObjectEvolutionSerializer};
use crate::fingerprint::{custom_fingerprint, LocalLookup, TypeFingerprinter};
use crate::model::{
    LocalTypeInformation, LocalTypeModel, RemoteTypeCatalogue, RemoteTypeInformation,
    TypeIdentifier, TypeRegistry,
};
use crate::policy::ClassWhitelist;
use crate::schema::EnumTransform;
use crate::serializers::{
    ArraySerializer, CollectionSerializer, CustomSerializerAdapter, DeserializationInput,
    EnumSerializer, InterfaceSerializer, MapSerializer, ObjectSerializer, RemoteCustomSerializer,
    Serializer,
};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

type EvolvedKey = (String, EvolutionMode, bool);

pub struct SerializerFactory {
    /// Child of the caller's registry; receives proxy and carpented types.
    registry: Arc<TypeRegistry>,
    model: LocalTypeModel,
    whitelist: Arc<dyn ClassWhitelist>,
    customs: Arc<CustomSerializerRegistry>,
    fingerprinter: Arc<dyn TypeFingerprinter>,
    carpenter: ClassCarpenter,
    serializers: DashMap<TypeIdentifier, Arc<dyn Serializer>>,
    by_descriptor: DashMap<String, Arc<dyn Serializer>>,
    evolved: DashMap<EvolvedKey, Arc<dyn Serializer>>,
}

impl SerializerFactory {
    pub fn new(
        registry: Arc<TypeRegistry>,
        whitelist: Arc<dyn ClassWhitelist>,
        customs: Arc<CustomSerializerRegistry>,
        fingerprinter: Arc<dyn TypeFingerprinter>,
    ) -> Result<Self> {
        let synthetic = Arc::new(TypeRegistry::with_parent(registry));
        customs.declare_all(&synthetic)?;
        log::debug!(
            "[FACTORY] [OK] created over {} (whitelist {})",
            synthetic.id(),
            whitelist.policy_id()
        );
        Ok(Self {
            model: LocalTypeModel::new(Arc::clone(&synthetic)),
            carpenter: ClassCarpenter::new(Arc::clone(&synthetic)),
            registry: synthetic,
            whitelist,
            customs,
            fingerprinter,
            serializers: DashMap::new(),
            by_descriptor: DashMap::new(),
            evolved: DashMap::new(),
        })
    }

    /// Registry every lookup of this factory goes through.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn whitelist(&self) -> &Arc<dyn ClassWhitelist> {
        &self.whitelist
    }

    /// Number of serializers built so far.
    pub fn len(&self) -> usize {
        self.serializers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serializers.is_empty()
    }

    // ========================================================================
    // By local type
    // ========================================================================

    /// Serializer for a local type, built on first use.
    pub fn get(&self, type_id: &TypeIdentifier) -> Result<Arc<dyn Serializer>> {
        if let Some(hit) = self.serializers.get(type_id) {
            return Ok(Arc::clone(hit.value()));
        }

        let (serializer, cacheable) = self.build(type_id)?;
        if !cacheable {
            return Ok(serializer);
        }
        let serializer = Arc::clone(
            self.serializers
                .entry(type_id.clone())
                .or_insert(serializer)
                .value(),
        );
        self.by_descriptor
            .entry(serializer.descriptor().to_string())
            .or_insert_with(|| Arc::clone(&serializer));
        log::trace!(
            "[FACTORY] [OK] {} -> {}",
            type_id,
            serializer.descriptor()
        );
        Ok(serializer)
    }

    /// Build a serializer; the flag is false when some declaration reached
    /// from the type was missing and the result must not be cached.
    fn build(&self, type_id: &TypeIdentifier) -> Result<(Arc<dyn Serializer>, bool)> {
        if type_id.is_open() || type_id.is_primitive() {
            return Err(Error::not_serializable(format!(
                "{} has no serializer of its own",
                type_id
            )));
        }
        if let Some(kind) = type_id.collection_kind() {
            if let Some(stable) = kind.stable_replacement() {
                return Err(Error::UnsupportedCollection {
                    type_name: type_id.name(),
                    suggestion: TypeIdentifier::collection(stable, type_id.arguments().to_vec())
                        .name(),
                });
            }
        }

        if let Some(found) = self.customs.find(type_id, &self.registry)? {
            found.serializer.declare(&self.registry)?;
            let adapter: Arc<dyn Serializer> =
                Arc::new(CustomSerializerAdapter::new(type_id.clone(), found));
            return Ok((adapter, true));
        }

        let info = self.model.inspect(type_id);
        let cacheable = self.model.cached(type_id).is_some();
        self.check_whitelist(&info)?;
        let descriptor = self.fingerprinter.local(&info, self).descriptor();

        let serializer: Arc<dyn Serializer> = match info.as_ref() {
            LocalTypeInformation::Composable(composable) => {
                Arc::new(ObjectSerializer::new(Arc::clone(composable), descriptor))
            }
            LocalTypeInformation::AnEnum {
                type_id,
                constants,
                transforms,
                interfaces,
            } => Arc::new(EnumSerializer::new(
                type_id.clone(),
                descriptor,
                constants.clone(),
                transforms.clone(),
                interfaces.clone(),
            )),
            LocalTypeInformation::AnInterface {
                type_id,
                interfaces,
            } => Arc::new(InterfaceSerializer::new(
                type_id.clone(),
                descriptor,
                interfaces.clone(),
            )),
            LocalTypeInformation::ACollection {
                type_id,
                kind,
                element,
            } => Arc::new(CollectionSerializer::new(
                type_id.clone(),
                descriptor,
                *kind,
                element.type_id(),
            )),
            LocalTypeInformation::AMap {
                type_id, key, value, ..
            } => Arc::new(MapSerializer::new(
                type_id.clone(),
                descriptor,
                key.type_id(),
                value.type_id(),
            )),
            LocalTypeInformation::AnArray { type_id, component } => Arc::new(
                ArraySerializer::new(type_id.clone(), descriptor, component.type_id()),
            ),
            LocalTypeInformation::NonComposable {
                type_id,
                reason,
                remedy,
                ..
            } => {
                return Err(Error::detailed(
                    type_id.name(),
                    format!("{}; {}", reason, remedy),
                ))
            }
            LocalTypeInformation::Top
            | LocalTypeInformation::Unknown
            | LocalTypeInformation::Primitive(_)
            | LocalTypeInformation::Cycle(_) => {
                return Err(Error::not_serializable(format!(
                    "{} cannot be serialized on its own",
                    type_id
                )))
            }
        };
        Ok((serializer, cacheable))
    }

    /// Composites and enums must be whitelisted or always serializable.
    fn check_whitelist(&self, info: &LocalTypeInformation) -> Result<()> {
        let always = match info {
            LocalTypeInformation::Composable(composable) => composable.always_serializable,
            LocalTypeInformation::AnEnum { type_id, .. } => self
                .registry
                .declaration_for(type_id)
                .is_some_and(|d| d.always_serializable),
            _ => return Ok(()),
        };
        let type_id = info.type_id();
        let listed_name = type_id
            .erased_name()
            .map_or_else(|| type_id.name(), str::to_string);
        if always || self.whitelist.has_listed(&listed_name) {
            Ok(())
        } else {
            Err(Error::detailed(
                type_id.name(),
                "not on the whitelist or marked always serializable",
            ))
        }
    }

    // ========================================================================
    // By descriptor
    // ========================================================================

    /// Check every schema entry's descriptor against its own structure.
    pub fn verify(&self, catalogue: &RemoteTypeCatalogue) -> Result<()> {
        if !self.fingerprinter.verifies_descriptors() {
            return Ok(());
        }
        for info in catalogue.iter() {
            let actual = match info.as_ref() {
                RemoteTypeInformation::Custom { type_id, proxy, .. } => {
                    custom_fingerprint(type_id, proxy).descriptor()
                }
                other => self.fingerprinter.remote(other, catalogue).descriptor(),
            };
            if actual != info.descriptor() {
                return Err(Error::HashMismatch {
                    type_name: info.type_id().name(),
                    expected: info.descriptor().to_string(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Serializer able to read values written under `descriptor`.
    pub fn get_by_descriptor(
        &self,
        descriptor: &str,
        input: &DeserializationInput<'_>,
    ) -> Result<Arc<dyn Serializer>> {
        let verifies = self.fingerprinter.verifies_descriptors();
        if verifies {
            if let Some(hit) = self.by_descriptor.get(descriptor) {
                return Ok(Arc::clone(hit.value()));
            }
        }

        let catalogue = input.catalogue();
        let remote = catalogue.get(descriptor).ok_or_else(|| {
            Error::not_serializable(format!("descriptor {} is not in the schema", descriptor))
        })?;
        let type_id = remote.type_id();
        let ctx = input.ctx();

        match remote.as_ref() {
            RemoteTypeInformation::Custom { proxy, .. } => {
                return match self.customs.find(type_id, &self.registry)? {
                    Some(_) => self.get(type_id),
                    None if ctx.carpenter_enabled => {
                        self.carpenter.carpent(remote, catalogue)?;
                        Ok(Arc::new(RemoteCustomSerializer::new(
                            type_id.clone(),
                            descriptor.to_string(),
                            proxy.clone(),
                        )))
                    }
                    None => Err(Error::CarpentryDisabled {
                        type_name: type_id.name(),
                    }),
                };
            }
            RemoteTypeInformation::ACollection { .. }
            | RemoteTypeInformation::AMap { .. }
            | RemoteTypeInformation::AnArray { .. } => {
                self.carpent_referenced(remote, catalogue, ctx.carpenter_enabled)?;
                return self.get(type_id);
            }
            _ => {}
        }

        if self.registry.declaration_for(type_id).is_none() {
            if !ctx.carpenter_enabled {
                return Err(Error::CarpentryDisabled {
                    type_name: type_id.name(),
                });
            }
            self.carpenter.carpent(remote, catalogue)?;
        }

        let local = self.get(type_id)?;
        if local.descriptor() == descriptor {
            return Ok(local);
        }
        self.evolve(remote, local, input)
    }

    /// Carpent undeclared element types of a container so its local
    /// fingerprint can be computed.
    fn carpent_referenced(
        &self,
        remote: &RemoteTypeInformation,
        catalogue: &RemoteTypeCatalogue,
        enabled: bool,
    ) -> Result<()> {
        if enabled {
            self.carpenter.carpent(remote, catalogue)?;
        }
        Ok(())
    }

    fn evolve(
        &self,
        remote: &Arc<RemoteTypeInformation>,
        local: Arc<dyn Serializer>,
        input: &DeserializationInput<'_>,
    ) -> Result<Arc<dyn Serializer>> {
        let ctx = input.ctx();
        let descriptor = remote.descriptor().to_string();
        let info = self.model.inspect(remote.type_id());
        log::debug!(
            "[EVOLUTION] {} arrived as {}, local is {}",
            remote.type_id(),
            descriptor,
            local.descriptor()
        );

        match (remote.as_ref(), info.as_ref()) {
            (RemoteTypeInformation::Composable { properties, .. }, LocalTypeInformation::Composable(composable)) => {
                let key = (descriptor.clone(), ctx.evolution_mode, ctx.carpenter_enabled);
                let cacheable = self.fingerprinter.verifies_descriptors();
                if cacheable {
                    if let Some(hit) = self.evolved.get(&key) {
                        return Ok(Arc::clone(hit.value()));
                    }
                }

                let built: Arc<dyn Serializer> = match ObjectEvolutionSerializer::new(
                    Arc::clone(composable),
                    properties,
                    descriptor.clone(),
                    ctx.evolution_mode,
                ) {
                    Ok(Some(evolved)) => Arc::new(evolved),
                    Ok(None) => local,
                    Err(Error::Evolution { reason, .. })
                        if ctx.evolution_mode == EvolutionMode::Lenient && ctx.carpenter_enabled =>
                    {
                        log::debug!(
                            "[EVOLUTION] {} read as a plain record: {}",
                            remote.type_id(),
                            reason
                        );
                        Arc::new(RemoteRecordSerializer::new(
                            remote.type_id().clone(),
                            descriptor.clone(),
                            properties.clone(),
                        ))
                    }
                    Err(e) => return Err(e),
                };
                if cacheable {
                    self.evolved.insert(key, Arc::clone(&built));
                }
                Ok(built)
            }
            (
                RemoteTypeInformation::AnEnum { constants: remote_constants, .. },
                LocalTypeInformation::AnEnum {
                    type_id,
                    constants,
                    transforms,
                    ..
                },
            ) => {
                let merged = merge_transforms(transforms, input.transforms().get(&type_id.name()));
                Ok(Arc::new(EnumEvolutionSerializer::new(
                    type_id.clone(),
                    descriptor,
                    constants,
                    remote_constants,
                    &merged,
                )?))
            }
            (RemoteTypeInformation::Composable { .. }, _) | (RemoteTypeInformation::AnEnum { .. }, _) => {
                Err(Error::evolution(
                    remote.type_id().name(),
                    "the local type is no longer of the same kind",
                ))
            }
            // interfaces carry no data; their shape is irrelevant on read
            _ => Ok(local),
        }
    }
}

/// Local transforms followed by any the sender knew that this process does
/// not.
fn merge_transforms(local: &[EnumTransform], remote: &[EnumTransform]) -> Vec<EnumTransform> {
    let mut merged = local.to_vec();
    for transform in remote {
        if !merged.contains(transform) {
            merged.push(transform.clone());
        }
    }
    merged
}

impl LocalLookup for SerializerFactory {
    fn resolve(&self, type_id: &TypeIdentifier) -> Option<Arc<LocalTypeInformation>> {
        Some(self.model.inspect(type_id))
    }

    fn custom_descriptor(&self, type_id: &TypeIdentifier) -> Option<String> {
        self.customs
            .find(type_id, &self.registry)
            .ok()
            .flatten()
            .map(|found| found.descriptor)
    }
}

impl fmt::Debug for SerializerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerFactory")
            .field("registry", &self.registry.id())
            .field("whitelist", &self.whitelist.policy_id())
            .field("serializers", &self.serializers.len())
            .finish()
    }
}

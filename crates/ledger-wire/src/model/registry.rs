// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry: maps wire names to declarations.
//!
//! A registry plays the role of a classloader. Its id takes part in factory
//! cache keys, and a child registry (used for carpented types) falls back to
//! its parent on lookup.

use super::declaration::TypeDeclaration;
use super::TypeIdentifier;
use crate::error::Result;
use crate::traits::Serializable;
use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Distance reported when a type does not descend from another.
pub const NOT_APPLICABLE: u32 = u32::MAX;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryId(u64);

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registry-{}", self.0)
    }
}

pub struct TypeRegistry {
    id: RegistryId,
    declarations: DashMap<String, Arc<TypeDeclaration>>,
    parent: Option<Arc<TypeRegistry>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            id: RegistryId(NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed)),
            declarations: DashMap::new(),
            parent: None,
        }
    }

    /// Child registry whose lookups fall back to `parent`.
    pub fn with_parent(parent: Arc<TypeRegistry>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new()
        }
    }

    #[must_use]
    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// Validate and add a declaration. Registering the same name again keeps
    /// the first declaration.
    pub fn register(&self, declaration: TypeDeclaration) -> Result<()> {
        declaration.validate()?;
        let name = declaration.name.clone();
        self.declarations
            .entry(name.clone())
            .or_insert_with(|| Arc::new(declaration));
        log::trace!("[TYPE-REGISTRY] [OK] {} declared {}", self.id, name);
        Ok(())
    }

    /// Declare `T` and everything it references.
    pub fn register_type<T: Serializable>(&self) -> Result<()> {
        T::declare(self)
    }

    /// Declared here (not in a parent).
    pub fn declares_locally(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declares_locally(name) || self.parent.as_ref().is_some_and(|p| p.contains(name))
    }

    pub fn get(&self, name: &str) -> Option<Arc<TypeDeclaration>> {
        if let Some(found) = self.declarations.get(name) {
            return Some(Arc::clone(found.value()));
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Declaration for a type identifier, by full name first, then by its
    /// erased base name.
    pub fn declaration_for(&self, type_id: &TypeIdentifier) -> Option<Arc<TypeDeclaration>> {
        if type_id.is_open() || type_id.is_primitive() {
            return None;
        }
        self.get(&type_id.name())
            .or_else(|| type_id.erased_name().and_then(|name| self.get(name)))
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Inheritance hops from `from` up to `to`: 0 for the same type,
    /// [`NOT_APPLICABLE`] when `to` is not a supertype of `from`.
    pub fn supertype_distance(&self, from: &TypeIdentifier, to: &TypeIdentifier) -> u32 {
        let mut queue = VecDeque::from([(from.clone(), 0u32)]);
        let mut visited = HashSet::new();
        while let Some((current, distance)) = queue.pop_front() {
            if same_type(&current, to) {
                return distance;
            }
            if !visited.insert(current.name()) {
                continue;
            }
            if let Some(declaration) = self.declaration_for(&current) {
                for supertype in &declaration.supertypes {
                    queue.push_back((supertype.clone(), distance.saturating_add(1)));
                }
            }
        }
        NOT_APPLICABLE
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("id", &self.id)
            .field("declarations", &self.declarations.len())
            .field("parent", &self.parent.as_ref().map(|p| p.id))
            .finish()
    }
}

fn same_type(a: &TypeIdentifier, b: &TypeIdentifier) -> bool {
    a == b || (a.erased_name().is_some() && a.erased_name() == b.erased_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> TypeIdentifier {
        TypeIdentifier::named(name)
    }

    fn hierarchy() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register(TypeDeclaration::interface("Asset")).unwrap();
        registry
            .register(TypeDeclaration::interface("Fungible").supertype(named("Asset")))
            .unwrap();
        registry
            .register(TypeDeclaration::composite("Cash").supertype(named("Fungible")))
            .unwrap();
        registry
    }

    #[test]
    fn test_supertype_distance() {
        let registry = hierarchy();
        assert_eq!(registry.supertype_distance(&named("Cash"), &named("Cash")), 0);
        assert_eq!(registry.supertype_distance(&named("Cash"), &named("Fungible")), 1);
        assert_eq!(registry.supertype_distance(&named("Cash"), &named("Asset")), 2);
        assert_eq!(
            registry.supertype_distance(&named("Asset"), &named("Cash")),
            NOT_APPLICABLE
        );
    }

    #[test]
    fn test_child_falls_back_to_parent() {
        let parent = Arc::new(hierarchy());
        let child = TypeRegistry::with_parent(Arc::clone(&parent));
        child.register(TypeDeclaration::composite("Synthetic")).unwrap();
        assert!(child.contains("Cash"));
        assert!(child.contains("Synthetic"));
        assert!(!parent.contains("Synthetic"));
        assert!(!child.declares_locally("Cash"));
        assert_ne!(child.id(), parent.id());
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = TypeRegistry::new();
        registry
            .register(TypeDeclaration::composite("C").property("a", named("int")))
            .unwrap();
        registry.register(TypeDeclaration::composite("C")).unwrap();
        assert_eq!(registry.get("C").unwrap().properties.len(), 1);
    }

    #[test]
    fn test_generic_lookup_uses_erased_name() {
        let registry = TypeRegistry::new();
        registry
            .register(TypeDeclaration::composite("Pair").type_parameter("A"))
            .unwrap();
        let id = TypeIdentifier::parameterised("Pair", vec![named("int")]);
        assert!(registry.declaration_for(&id).is_some());
    }
}

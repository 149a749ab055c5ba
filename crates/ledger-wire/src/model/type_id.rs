// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Canonical, language-neutral type names.
//!
//! A [`TypeIdentifier`] is what the schema writes into `Field::type_name` and
//! `TypeNotation::name`. Two wire-compatible types always produce equal
//! identifiers, and [`TypeIdentifier::parse`] inverts [`TypeIdentifier::name`]
//! exactly, including the distinction between boxed (`int[]`) and unboxed
//! (`int[p]`) arrays.

use crate::error::{Error, Result};
use std::fmt;

/// Wire-level primitive types. These never get a schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Boolean,
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Char,
    String,
    Binary,
}

impl Primitive {
    pub const ALL: [Primitive; 14] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::UByte,
        Primitive::Short,
        Primitive::UShort,
        Primitive::Int,
        Primitive::UInt,
        Primitive::Long,
        Primitive::ULong,
        Primitive::Float,
        Primitive::Double,
        Primitive::Char,
        Primitive::String,
        Primitive::Binary,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::UByte => "ubyte",
            Primitive::Short => "short",
            Primitive::UShort => "ushort",
            Primitive::Int => "int",
            Primitive::UInt => "uint",
            Primitive::Long => "long",
            Primitive::ULong => "ulong",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
            Primitive::String => "string",
            Primitive::Binary => "binary",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Whether the primitive may appear as the component of an unboxed array.
    pub const fn is_unboxable(self) -> bool {
        !matches!(self, Primitive::String | Primitive::Binary)
    }
}

/// Built-in collection shapes, stable and unstable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Set,
    Map,
    SortedMap,
    HashMap,
    HashSet,
    WeakHashMap,
}

impl CollectionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "list" => CollectionKind::List,
            "set" => CollectionKind::Set,
            "map" => CollectionKind::Map,
            "sorted_map" => CollectionKind::SortedMap,
            "hash_map" => CollectionKind::HashMap,
            "hash_set" => CollectionKind::HashSet,
            "weak_hash_map" => CollectionKind::WeakHashMap,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            CollectionKind::List => "list",
            CollectionKind::Set => "set",
            CollectionKind::Map => "map",
            CollectionKind::SortedMap => "sorted_map",
            CollectionKind::HashMap => "hash_map",
            CollectionKind::HashSet => "hash_set",
            CollectionKind::WeakHashMap => "weak_hash_map",
        }
    }

    pub const fn is_map(self) -> bool {
        matches!(
            self,
            CollectionKind::Map
                | CollectionKind::SortedMap
                | CollectionKind::HashMap
                | CollectionKind::WeakHashMap
        )
    }

    /// Stable replacement for shapes whose iteration order is not
    /// deterministic. `None` for allow-listed shapes.
    pub const fn stable_replacement(self) -> Option<CollectionKind> {
        match self {
            CollectionKind::HashMap | CollectionKind::WeakHashMap => Some(CollectionKind::SortedMap),
            CollectionKind::HashSet => Some(CollectionKind::Set),
            _ => None,
        }
    }
}

/// Canonical type name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeIdentifier {
    /// The universal supertype, written `*`.
    Top,
    /// An unbounded or unresolved generic argument, written `?`.
    Unknown,
    Primitive(Primitive),
    Unparameterised(String),
    /// A generic type used without its arguments.
    Erased {
        name: String,
        parameter_count: usize,
    },
    Parameterised {
        name: String,
        arguments: Vec<TypeIdentifier>,
    },
    /// Boxed array, elements may be null. Written `T[]`.
    ArrayOf(Box<TypeIdentifier>),
    /// Unboxed array of a primitive. Written `T[p]`.
    PrimitiveArrayOf(Primitive),
}

impl TypeIdentifier {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        match Primitive::from_name(&name) {
            Some(primitive) => TypeIdentifier::Primitive(primitive),
            None => TypeIdentifier::Unparameterised(name),
        }
    }

    pub fn parameterised(name: impl Into<String>, arguments: Vec<TypeIdentifier>) -> Self {
        TypeIdentifier::Parameterised {
            name: name.into(),
            arguments,
        }
    }

    pub fn collection(kind: CollectionKind, arguments: Vec<TypeIdentifier>) -> Self {
        Self::parameterised(kind.name(), arguments)
    }

    pub fn array_of(component: TypeIdentifier) -> Self {
        TypeIdentifier::ArrayOf(Box::new(component))
    }

    /// Full wire name, e.g. `sorted_map<string, list<Trade>>` or `long[p]`.
    pub fn name(&self) -> String {
        match self {
            TypeIdentifier::Top => "*".to_string(),
            TypeIdentifier::Unknown => "?".to_string(),
            TypeIdentifier::Primitive(p) => p.name().to_string(),
            TypeIdentifier::Unparameterised(name) | TypeIdentifier::Erased { name, .. } => {
                name.clone()
            }
            TypeIdentifier::Parameterised { name, arguments } => {
                let args: Vec<String> = arguments.iter().map(TypeIdentifier::name).collect();
                format!("{}<{}>", name, args.join(", "))
            }
            TypeIdentifier::ArrayOf(component) => format!("{}[]", component.name()),
            TypeIdentifier::PrimitiveArrayOf(p) => format!("{}[p]", p.name()),
        }
    }

    /// Name without generic arguments; the key used for registry lookups.
    pub fn erased_name(&self) -> Option<&str> {
        match self {
            TypeIdentifier::Unparameterised(name)
            | TypeIdentifier::Erased { name, .. }
            | TypeIdentifier::Parameterised { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn arguments(&self) -> &[TypeIdentifier] {
        match self {
            TypeIdentifier::Parameterised { arguments, .. } => arguments,
            _ => &[],
        }
    }

    pub const fn is_primitive(&self) -> bool {
        matches!(self, TypeIdentifier::Primitive(_))
    }

    /// `Top` or `Unknown`: no concrete type is implied.
    pub const fn is_open(&self) -> bool {
        matches!(self, TypeIdentifier::Top | TypeIdentifier::Unknown)
    }

    pub fn collection_kind(&self) -> Option<CollectionKind> {
        self.erased_name().and_then(CollectionKind::from_name)
    }

    /// Parse a wire name produced by [`TypeIdentifier::name`].
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::not_serializable("empty type name"));
        }
        if let Some(component) = text.strip_suffix("[p]") {
            return match Self::parse(component)? {
                TypeIdentifier::Primitive(p) if p.is_unboxable() => {
                    Ok(TypeIdentifier::PrimitiveArrayOf(p))
                }
                other => Err(Error::not_serializable(format!(
                    "{} cannot be the component of an unboxed array",
                    other.name()
                ))),
            };
        }
        if let Some(component) = text.strip_suffix("[]") {
            return Ok(TypeIdentifier::array_of(Self::parse(component)?));
        }
        match text {
            "*" => return Ok(TypeIdentifier::Top),
            "?" => return Ok(TypeIdentifier::Unknown),
            _ => {}
        }
        let Some(open) = text.find('<') else {
            if text.contains('>') || text.contains(',') {
                return Err(Error::not_serializable(format!("malformed type name {}", text)));
            }
            return Ok(Self::named(text));
        };
        let Some(inner) = text[open + 1..].strip_suffix('>') else {
            return Err(Error::not_serializable(format!("unbalanced type name {}", text)));
        };
        let name = text[..open].trim();
        if name.is_empty() {
            return Err(Error::not_serializable(format!("missing base name in {}", text)));
        }
        let arguments = split_arguments(inner, text)?
            .into_iter()
            .map(Self::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::parameterised(name, arguments))
    }
}

/// Split on commas at nesting depth zero.
fn split_arguments<'a>(inner: &'a str, whole: &str) -> Result<Vec<&'a str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::not_serializable(format!("unbalanced type name {}", whole)))?;
            }
            ',' if depth == 0 => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::not_serializable(format!("unbalanced type name {}", whole)));
    }
    parts.push(&inner[start..]);
    Ok(parts)
}

impl fmt::Debug for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeIdentifier::Erased {
                name,
                parameter_count,
            } => write!(f, "TypeId::Erased({}/{})", name, parameter_count),
            other => write!(f, "TypeId({})", other.name()),
        }
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> TypeIdentifier {
        TypeIdentifier::Primitive(Primitive::Int)
    }

    #[test]
    fn test_primitive_names_resolve() {
        for p in Primitive::ALL {
            assert_eq!(TypeIdentifier::parse(p.name()).unwrap(), TypeIdentifier::Primitive(p));
        }
    }

    #[test]
    fn test_boxed_and_unboxed_arrays_differ() {
        let boxed = TypeIdentifier::array_of(int());
        let unboxed = TypeIdentifier::PrimitiveArrayOf(Primitive::Int);
        assert_eq!(boxed.name(), "int[]");
        assert_eq!(unboxed.name(), "int[p]");
        assert_ne!(boxed, unboxed);
        assert_eq!(TypeIdentifier::parse("int[]").unwrap(), boxed);
        assert_eq!(TypeIdentifier::parse("int[p]").unwrap(), unboxed);
    }

    #[test]
    fn test_nested_generics_parse() {
        let id = TypeIdentifier::collection(
            CollectionKind::SortedMap,
            vec![
                TypeIdentifier::Primitive(Primitive::String),
                TypeIdentifier::collection(
                    CollectionKind::List,
                    vec![TypeIdentifier::array_of(TypeIdentifier::named("Trade"))],
                ),
            ],
        );
        assert_eq!(id.name(), "sorted_map<string, list<Trade[]>>");
        assert_eq!(TypeIdentifier::parse(&id.name()).unwrap(), id);
    }

    #[test]
    fn test_array_of_generic() {
        let id = TypeIdentifier::array_of(TypeIdentifier::parameterised(
            "Pair",
            vec![TypeIdentifier::Top, TypeIdentifier::Unknown],
        ));
        assert_eq!(id.name(), "Pair<*, ?>[]");
        assert_eq!(TypeIdentifier::parse(&id.name()).unwrap(), id);
    }

    #[test]
    fn test_string_cannot_be_unboxed() {
        assert!(TypeIdentifier::parse("string[p]").is_err());
        assert!(TypeIdentifier::parse("Foo[p]").is_err());
    }

    #[test]
    fn test_malformed_names_rejected() {
        assert!(TypeIdentifier::parse("").is_err());
        assert!(TypeIdentifier::parse("list<int").is_err());
        assert!(TypeIdentifier::parse("list<int>>").is_err());
        assert!(TypeIdentifier::parse("<int>").is_err());
    }

    #[test]
    fn test_unstable_collections_have_replacements() {
        assert_eq!(
            CollectionKind::HashMap.stable_replacement(),
            Some(CollectionKind::SortedMap)
        );
        assert_eq!(CollectionKind::HashSet.stable_replacement(), Some(CollectionKind::Set));
        assert_eq!(CollectionKind::List.stable_replacement(), None);
        assert!(CollectionKind::WeakHashMap.is_map());
    }
}

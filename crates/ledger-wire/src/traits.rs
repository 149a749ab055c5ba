// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed access to the codec.
//!
//! [`Serializable`] maps a Rust type to its [`TypeIdentifier`], its
//! declaration, and its [`Value`] form. `#[derive(Serializable)]` generates
//! it for structs with named fields and for fieldless enums; the impls here
//! cover primitives, standard collections and shared pointers.
//!
//! `Arc<T>` is the unit of object identity: two `Arc`s pointing at the same
//! allocation produce one shared [`Record`] in the value graph, which the
//! wire encodes once and decodes back into one shared `Arc`.

use crate::error::{Error, Result};
use crate::model::{CollectionKind, Primitive, TypeIdentifier, TypeRegistry};
use crate::value::{EnumValue, Record, Value};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

/// A Rust type the codec can write and read.
pub trait Serializable: Sized + Send + Sync + 'static {
    fn type_identifier() -> TypeIdentifier;

    /// Register this type's declaration and everything it references.
    fn declare(registry: &TypeRegistry) -> Result<()> {
        let _ = registry;
        Ok(())
    }

    fn to_value(&self, writer: &mut ValueWriter) -> Result<Value>;

    fn from_value(value: &Value, reader: &mut ValueReader) -> Result<Self>;

    /// Whether `null` is a legal value (only `Option<T>`).
    fn nullable() -> bool {
        false
    }
}

/// Typed-to-dynamic conversion state for one root object.
#[derive(Debug, Default)]
pub struct ValueWriter {
    shared: HashMap<usize, Value>,
}

impl ValueWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write<T: Serializable>(&mut self, value: &T) -> Result<Value> {
        value.to_value(self)
    }

    /// Convert the target of `arc` once, returning the same `Value` (and so
    /// the same shared record) for every later pointer to it.
    pub fn shared<T: Serializable>(&mut self, arc: &Arc<T>) -> Result<Value> {
        let key = Arc::as_ptr(arc) as *const () as usize;
        if let Some(hit) = self.shared.get(&key) {
            return Ok(hit.clone());
        }
        let value = arc.as_ref().to_value(self)?;
        self.shared.insert(key, value.clone());
        Ok(value)
    }
}

/// Dynamic-to-typed conversion state for one decoded root.
#[derive(Default)]
pub struct ValueReader {
    shared: HashMap<usize, Arc<dyn Any + Send + Sync>>,
}

impl ValueReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<T: Serializable>(&mut self, value: &Value) -> Result<T> {
        T::from_value(value, self)
    }

    /// The record behind a composite value, checked against `T`'s name.
    pub fn record<'v, T: Serializable>(&self, value: &'v Value) -> Result<&'v Arc<Record>> {
        let expected = T::type_identifier();
        match value {
            Value::Composite(record) if record.type_id.name() == expected.name() => Ok(record),
            other => Err(mismatch(&expected, other)),
        }
    }

    /// The constant behind an enum value, checked against `T`'s name.
    pub fn enum_constant<'v, T: Serializable>(&self, value: &'v Value) -> Result<&'v EnumValue> {
        let expected = T::type_identifier();
        match value {
            Value::Enum(constant) if constant.type_id.name() == expected.name() => Ok(constant),
            other => Err(mismatch(&expected, other)),
        }
    }

    /// Read one field of a record. An absent field reads as null.
    pub fn field<T: Serializable>(&mut self, record: &Record, name: &str) -> Result<T> {
        let value = record.get(name).unwrap_or(&Value::Null);
        T::from_value(value, self).map_err(|e| match e {
            Error::NotSerializable(message) => {
                Error::NotSerializable(format!("{}.{}: {}", record.type_id, name, message))
            }
            other => other.in_context(&record.type_id.name()),
        })
    }

    fn shared<T: Serializable>(&mut self, value: &Value) -> Result<Arc<T>> {
        let Value::Composite(record) = value else {
            return T::from_value(value, self).map(Arc::new);
        };
        let key = Arc::as_ptr(record) as usize;
        if let Some(hit) = self.shared.get(&key) {
            return Arc::clone(hit)
                .downcast::<T>()
                .map_err(|_| mismatch(&T::type_identifier(), value));
        }
        let typed = Arc::new(T::from_value(value, self)?);
        self.shared
            .insert(key, Arc::clone(&typed) as Arc<dyn Any + Send + Sync>);
        Ok(typed)
    }
}

impl std::fmt::Debug for ValueReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValueReader({} shared)", self.shared.len())
    }
}

pub(crate) fn mismatch(expected: &TypeIdentifier, found: &Value) -> Error {
    Error::not_serializable(format!("expected {}, found {}", expected, found.kind_name()))
}

// ============================================================================
// Primitives
// ============================================================================

macro_rules! impl_primitive {
    ($type:ty, $primitive:ident, $variant:ident) => {
        impl Serializable for $type {
            fn type_identifier() -> TypeIdentifier {
                TypeIdentifier::Primitive(Primitive::$primitive)
            }

            fn to_value(&self, _writer: &mut ValueWriter) -> Result<Value> {
                Ok(Value::$variant(*self))
            }

            fn from_value(value: &Value, _reader: &mut ValueReader) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(*v),
                    other => Err(mismatch(&Self::type_identifier(), other)),
                }
            }
        }

        impl PrimitiveType for $type {
            const PRIMITIVE: Primitive = Primitive::$primitive;
        }

        impl sealed::Sealed for $type {}
    };
}

impl_primitive!(bool, Boolean, Bool);
impl_primitive!(i8, Byte, I8);
impl_primitive!(u8, UByte, U8);
impl_primitive!(i16, Short, I16);
impl_primitive!(u16, UShort, U16);
impl_primitive!(i32, Int, I32);
impl_primitive!(u32, UInt, U32);
impl_primitive!(i64, Long, I64);
impl_primitive!(u64, ULong, U64);
impl_primitive!(f32, Float, F32);
impl_primitive!(f64, Double, F64);
impl_primitive!(char, Char, Char);

impl Serializable for String {
    fn type_identifier() -> TypeIdentifier {
        TypeIdentifier::Primitive(Primitive::String)
    }

    fn to_value(&self, _writer: &mut ValueWriter) -> Result<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value, _reader: &mut ValueReader) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(&Self::type_identifier(), value))
    }
}

/// Byte array. Equal contents are never shared on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bytes(pub Vec<u8>);

impl Serializable for Bytes {
    fn type_identifier() -> TypeIdentifier {
        TypeIdentifier::Primitive(Primitive::Binary)
    }

    fn to_value(&self, _writer: &mut ValueWriter) -> Result<Value> {
        Ok(Value::Binary(self.0.clone()))
    }

    fn from_value(value: &Value, _reader: &mut ValueReader) -> Result<Self> {
        match value {
            Value::Binary(bytes) => Ok(Bytes(bytes.clone())),
            other => Err(mismatch(&Self::type_identifier(), other)),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Primitive usable as the component of an unboxed array.
pub trait PrimitiveType: Serializable + Copy + sealed::Sealed {
    const PRIMITIVE: Primitive;
}

/// Unboxed array of primitives (`int[p]`), distinct on the wire from the
/// boxed `Box<[i32]>` (`int[]`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveArray<T: PrimitiveType>(pub Vec<T>);

impl<T: PrimitiveType> Serializable for PrimitiveArray<T> {
    fn type_identifier() -> TypeIdentifier {
        TypeIdentifier::PrimitiveArrayOf(T::PRIMITIVE)
    }

    fn to_value(&self, writer: &mut ValueWriter) -> Result<Value> {
        let items = self
            .0
            .iter()
            .map(|item| item.to_value(writer))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Array(items))
    }

    fn from_value(value: &Value, reader: &mut ValueReader) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| T::from_value(item, reader))
                .collect::<Result<Vec<_>>>()
                .map(PrimitiveArray),
            other => Err(mismatch(&Self::type_identifier(), other)),
        }
    }
}

// ============================================================================
// Wrappers
// ============================================================================

impl<T: Serializable> Serializable for Option<T> {
    fn type_identifier() -> TypeIdentifier {
        T::type_identifier()
    }

    fn declare(registry: &TypeRegistry) -> Result<()> {
        T::declare(registry)
    }

    fn to_value(&self, writer: &mut ValueWriter) -> Result<Value> {
        match self {
            Some(inner) => inner.to_value(writer),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value, reader: &mut ValueReader) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, reader).map(Some),
        }
    }

    fn nullable() -> bool {
        true
    }
}

impl<T: Serializable> Serializable for Box<T> {
    fn type_identifier() -> TypeIdentifier {
        T::type_identifier()
    }

    fn declare(registry: &TypeRegistry) -> Result<()> {
        T::declare(registry)
    }

    fn to_value(&self, writer: &mut ValueWriter) -> Result<Value> {
        self.as_ref().to_value(writer)
    }

    fn from_value(value: &Value, reader: &mut ValueReader) -> Result<Self> {
        T::from_value(value, reader).map(Box::new)
    }

    fn nullable() -> bool {
        T::nullable()
    }
}

impl<T: Serializable> Serializable for Arc<T> {
    fn type_identifier() -> TypeIdentifier {
        T::type_identifier()
    }

    fn declare(registry: &TypeRegistry) -> Result<()> {
        T::declare(registry)
    }

    fn to_value(&self, writer: &mut ValueWriter) -> Result<Value> {
        writer.shared(self)
    }

    fn from_value(value: &Value, reader: &mut ValueReader) -> Result<Self> {
        reader.shared(value)
    }

    fn nullable() -> bool {
        T::nullable()
    }
}

// ============================================================================
// Collections
// ============================================================================

fn read_items<'v>(value: &'v Value, expected: TypeIdentifier) -> Result<&'v [Value]> {
    match value {
        Value::List(items) | Value::Array(items) => Ok(items),
        other => Err(mismatch(&expected, other)),
    }
}

fn read_entries(value: &Value, expected: TypeIdentifier) -> Result<&[(Value, Value)]> {
    match value {
        Value::Map(entries) => Ok(entries),
        other => Err(mismatch(&expected, other)),
    }
}

macro_rules! impl_sequence {
    ($collection:ident, $kind:ident, [$($bound:path),*]) => {
        impl<T: Serializable $(+ $bound)*> Serializable for $collection<T> {
            fn type_identifier() -> TypeIdentifier {
                TypeIdentifier::collection(CollectionKind::$kind, vec![T::type_identifier()])
            }

            fn declare(registry: &TypeRegistry) -> Result<()> {
                T::declare(registry)
            }

            fn to_value(&self, writer: &mut ValueWriter) -> Result<Value> {
                let items = self
                    .iter()
                    .map(|item| item.to_value(writer))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::List(items))
            }

            fn from_value(value: &Value, reader: &mut ValueReader) -> Result<Self> {
                read_items(value, Self::type_identifier())?
                    .iter()
                    .map(|item| T::from_value(item, reader))
                    .collect()
            }
        }
    };
}

impl_sequence!(Vec, List, []);
impl_sequence!(BTreeSet, Set, [Ord]);
impl_sequence!(HashSet, HashSet, [Eq, Hash]);

macro_rules! impl_mapping {
    ($collection:ident, $kind:ident, [$($bound:path),*]) => {
        impl<K: Serializable $(+ $bound)*, V: Serializable> Serializable for $collection<K, V> {
            fn type_identifier() -> TypeIdentifier {
                TypeIdentifier::collection(
                    CollectionKind::$kind,
                    vec![K::type_identifier(), V::type_identifier()],
                )
            }

            fn declare(registry: &TypeRegistry) -> Result<()> {
                K::declare(registry)?;
                V::declare(registry)
            }

            fn to_value(&self, writer: &mut ValueWriter) -> Result<Value> {
                let entries = self
                    .iter()
                    .map(|(k, v)| Ok((k.to_value(writer)?, v.to_value(writer)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Map(entries))
            }

            fn from_value(value: &Value, reader: &mut ValueReader) -> Result<Self> {
                let entries = read_entries(value, Self::type_identifier())?;
                let map = entries
                    .iter()
                    .map(|(k, v)| Ok((K::from_value(k, reader)?, V::from_value(v, reader)?)))
                    .collect::<Result<Self>>()?;
                if map.len() != entries.len() {
                    return Err(Error::not_serializable(format!(
                        "{} holds duplicate keys",
                        Self::type_identifier()
                    )));
                }
                Ok(map)
            }
        }
    };
}

impl_mapping!(BTreeMap, SortedMap, [Ord]);
impl_mapping!(HashMap, HashMap, [Eq, Hash]);

impl<T: Serializable> Serializable for Box<[T]> {
    fn type_identifier() -> TypeIdentifier {
        TypeIdentifier::array_of(T::type_identifier())
    }

    fn declare(registry: &TypeRegistry) -> Result<()> {
        T::declare(registry)
    }

    fn to_value(&self, writer: &mut ValueWriter) -> Result<Value> {
        let items = self
            .iter()
            .map(|item| item.to_value(writer))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Array(items))
    }

    fn from_value(value: &Value, reader: &mut ValueReader) -> Result<Self> {
        read_items(value, Self::type_identifier())?
            .iter()
            .map(|item| T::from_value(item, reader))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Leaf {
        n: i32,
    }

    impl Serializable for Leaf {
        fn type_identifier() -> TypeIdentifier {
            TypeIdentifier::named("Leaf")
        }

        fn to_value(&self, writer: &mut ValueWriter) -> Result<Value> {
            Ok(Record::new(Self::type_identifier())
                .with("n", writer.write(&self.n)?)
                .into_value())
        }

        fn from_value(value: &Value, reader: &mut ValueReader) -> Result<Self> {
            let record = reader.record::<Self>(value)?;
            Ok(Leaf {
                n: reader.field(record, "n")?,
            })
        }
    }

    #[test]
    fn test_type_identifiers() {
        assert_eq!(<Vec<Option<i64>>>::type_identifier().name(), "list<long>");
        assert_eq!(<BTreeMap<String, Vec<u8>>>::type_identifier().name(), "sorted_map<string, list<ubyte>>");
        assert_eq!(<HashMap<String, i32>>::type_identifier().name(), "hash_map<string, int>");
        assert_eq!(<Box<[Leaf]>>::type_identifier().name(), "Leaf[]");
        assert_eq!(<PrimitiveArray<i32>>::type_identifier().name(), "int[p]");
        assert_eq!(Bytes::type_identifier().name(), "binary");
        assert!(<Option<i32>>::nullable());
        assert!(!i32::nullable());
    }

    #[test]
    fn test_shared_arcs_stay_shared() {
        let leaf = Arc::new(Leaf { n: 4 });
        let pair = vec![Arc::clone(&leaf), leaf];
        let mut writer = ValueWriter::new();
        let value = pair.to_value(&mut writer).unwrap();
        let Value::List(items) = &value else {
            panic!("expected list");
        };
        assert!(Arc::ptr_eq(items[0].as_record().unwrap(), items[1].as_record().unwrap()));

        let mut reader = ValueReader::new();
        let back: Vec<Arc<Leaf>> = reader.read(&value).unwrap();
        assert!(Arc::ptr_eq(&back[0], &back[1]));
        assert_eq!(back[0].n, 4);
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let record = Record::new(TypeIdentifier::named("Leaf"));
        let mut reader = ValueReader::new();
        let missing: Option<i32> = reader.field(&record, "n").unwrap();
        assert_eq!(missing, None);
        let err = reader.field::<i32>(&record, "n").unwrap_err();
        assert!(err.to_string().contains("Leaf.n"));
    }

    #[test]
    fn test_record_type_is_checked() {
        let other = Record::new(TypeIdentifier::named("Other")).into_value();
        let mut reader = ValueReader::new();
        assert!(Leaf::from_value(&other, &mut reader).is_err());
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values.
//!
//! [`Value`] is the object graph every serializer reads and writes. Typed
//! code reaches it through [`Serializable`](crate::Serializable); carpented
//! types only ever exist as [`Record`]s.

use crate::model::TypeIdentifier;
use std::any::Any;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

/// A dynamically-typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    // Primitives
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    /// Byte array. Compared by content, never shared by reference on the wire.
    Binary(Vec<u8>),

    // Containers
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Array(Vec<Value>),

    // Described
    Enum(EnumValue),
    Composite(Arc<Record>),
    Opaque(OpaqueValue),
}

macro_rules! impl_as_primitive {
    ($name:ident, $variant:ident, $type:ty) => {
        pub fn $name(&self) -> Option<$type> {
            match self {
                Self::$variant(v) => Some(*v),
                _ => None,
            }
        }
    };
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    impl_as_primitive!(as_bool, Bool, bool);
    impl_as_primitive!(as_i8, I8, i8);
    impl_as_primitive!(as_u8, U8, u8);
    impl_as_primitive!(as_i16, I16, i16);
    impl_as_primitive!(as_u16, U16, u16);
    impl_as_primitive!(as_i32, I32, i32);
    impl_as_primitive!(as_u32, U32, u32);
    impl_as_primitive!(as_i64, I64, i64);
    impl_as_primitive!(as_u64, U64, u64);
    impl_as_primitive!(as_f32, F32, f32);
    impl_as_primitive!(as_f64, F64, f64);
    impl_as_primitive!(as_char, Char, char);

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Arc<Record>> {
        match self {
            Self::Composite(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Self::Null => "null".into(),
            Self::Bool(_) => "boolean".into(),
            Self::I8(_) => "byte".into(),
            Self::U8(_) => "ubyte".into(),
            Self::I16(_) => "short".into(),
            Self::U16(_) => "ushort".into(),
            Self::I32(_) => "int".into(),
            Self::U32(_) => "uint".into(),
            Self::I64(_) => "long".into(),
            Self::U64(_) => "ulong".into(),
            Self::F32(_) => "float".into(),
            Self::F64(_) => "double".into(),
            Self::Char(_) => "char".into(),
            Self::String(_) => "string".into(),
            Self::Binary(_) => "binary".into(),
            Self::List(_) => "list".into(),
            Self::Map(_) => "map".into(),
            Self::Array(_) => "array".into(),
            Self::Enum(e) => e.type_id.name(),
            Self::Composite(r) => r.type_id.name(),
            Self::Opaque(o) => o.type_id.name(),
        }
    }

    /// Type carried by the value itself, for values whose declared type is
    /// open (`Top`/`Unknown`) or a supertype.
    pub fn runtime_type(&self) -> Option<TypeIdentifier> {
        use crate::model::{CollectionKind, Primitive};
        let primitive = |p| Some(TypeIdentifier::Primitive(p));
        match self {
            Self::Null => None,
            Self::Bool(_) => primitive(Primitive::Boolean),
            Self::I8(_) => primitive(Primitive::Byte),
            Self::U8(_) => primitive(Primitive::UByte),
            Self::I16(_) => primitive(Primitive::Short),
            Self::U16(_) => primitive(Primitive::UShort),
            Self::I32(_) => primitive(Primitive::Int),
            Self::U32(_) => primitive(Primitive::UInt),
            Self::I64(_) => primitive(Primitive::Long),
            Self::U64(_) => primitive(Primitive::ULong),
            Self::F32(_) => primitive(Primitive::Float),
            Self::F64(_) => primitive(Primitive::Double),
            Self::Char(_) => primitive(Primitive::Char),
            Self::String(_) => primitive(Primitive::String),
            Self::Binary(_) => primitive(Primitive::Binary),
            Self::List(_) => Some(TypeIdentifier::collection(
                CollectionKind::List,
                vec![TypeIdentifier::Top],
            )),
            Self::Map(_) => Some(TypeIdentifier::collection(
                CollectionKind::Map,
                vec![TypeIdentifier::Top, TypeIdentifier::Top],
            )),
            Self::Array(_) => Some(TypeIdentifier::array_of(TypeIdentifier::Top)),
            Self::Enum(e) => Some(e.type_id.clone()),
            Self::Composite(r) => Some(r.type_id.clone()),
            Self::Opaque(o) => Some(o.type_id.clone()),
        }
    }
}

// Hashing agrees with `PartialEq`: floats hash their bits with both zeros
// folded together, opaque values hash their allocation.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::I8(v) => v.hash(state),
            Self::U8(v) => v.hash(state),
            Self::I16(v) => v.hash(state),
            Self::U16(v) => v.hash(state),
            Self::I32(v) => v.hash(state),
            Self::U32(v) => v.hash(state),
            Self::I64(v) => v.hash(state),
            Self::U64(v) => v.hash(state),
            Self::F32(v) => (if *v == 0.0 { 0 } else { v.to_bits() }).hash(state),
            Self::F64(v) => (if *v == 0.0 { 0 } else { v.to_bits() }).hash(state),
            Self::Char(v) => v.hash(state),
            Self::String(v) => v.hash(state),
            Self::Binary(v) => v.hash(state),
            Self::List(items) | Self::Array(items) => items.hash(state),
            Self::Map(entries) => entries.hash(state),
            Self::Enum(e) => e.hash(state),
            Self::Composite(record) => {
                record.type_id.hash(state);
                record.fields.hash(state);
            }
            Self::Opaque(o) => {
                o.type_id.hash(state);
                (Arc::as_ptr(&o.inner) as *const () as usize).hash(state);
            }
        }
    }
}

/// First value of `items` equal to an earlier one.
pub(crate) fn first_duplicate<'v>(items: impl IntoIterator<Item = &'v Value>) -> Option<&'v Value> {
    let hasher = RandomState::new();
    let mut seen: HashMap<u64, Vec<&'v Value>> = HashMap::new();
    for item in items {
        let bucket = seen.entry(hasher.hash_one(item)).or_default();
        if bucket.iter().any(|earlier| *earlier == item) {
            return Some(item);
        }
        bucket.push(item);
    }
    None
}

/// A constant of an enumerated type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_id: TypeIdentifier,
    pub name: String,
    pub ordinal: u32,
}

impl EnumValue {
    pub fn new(type_id: TypeIdentifier, name: impl Into<String>, ordinal: u32) -> Self {
        Self {
            type_id,
            name: name.into(),
            ordinal,
        }
    }
}

/// Generic tagged record: a type plus its properties in alphabetic order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_id: TypeIdentifier,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(type_id: TypeIdentifier) -> Self {
        Self {
            type_id,
            fields: BTreeMap::new(),
        }
    }

    pub fn from_fields(type_id: TypeIdentifier, fields: BTreeMap<String, Value>) -> Self {
        Self { type_id, fields }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Composite(Arc::new(self))
    }
}

/// A native value that only a custom serializer knows how to encode.
#[derive(Clone)]
pub struct OpaqueValue {
    pub type_id: TypeIdentifier,
    inner: Arc<dyn Any + Send + Sync>,
}

impl OpaqueValue {
    pub fn new<T: Any + Send + Sync>(type_id: TypeIdentifier, value: T) -> Self {
        Self {
            type_id,
            inner: Arc::new(value),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_id)
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// From implementations for ergonomic construction
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::I8(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::U8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::I16(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Self::U16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        v.into_value()
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Self::Enum(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

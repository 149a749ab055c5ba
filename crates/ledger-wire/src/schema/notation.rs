// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema notations: the self-contained type description carried in every
//! envelope.

use crate::config::descriptors;
use crate::error::{Error, Result};
use crate::wire::WireValue;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schema-json", derive(serde::Serialize, serde::Deserialize))]
pub struct Descriptor {
    /// `net.ledger:<fingerprint>`.
    pub name: String,
    pub code: Option<u64>,
}

impl Descriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
        }
    }

    fn to_wire(&self) -> WireValue {
        WireValue::described_list(
            descriptors::OBJECT_DESCRIPTOR,
            vec![
                WireValue::symbol(self.name.as_str()),
                self.code.map_or(WireValue::Null, WireValue::ULong),
            ],
        )
    }

    fn from_wire(value: &WireValue) -> Result<Self> {
        let items = body(value, descriptors::OBJECT_DESCRIPTOR, "descriptor")?;
        Ok(Self {
            name: text(items, 0, "descriptor name")?,
            code: items.get(1).and_then(WireValue::as_u64),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schema-json", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    pub name: String,
    /// Wire name of the field's declared type.
    pub type_name: String,
    pub mandatory: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, mandatory: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            mandatory,
        }
    }

    fn to_wire(&self) -> WireValue {
        WireValue::described_list(
            descriptors::FIELD,
            vec![
                WireValue::string(self.name.as_str()),
                WireValue::string(self.type_name.as_str()),
                WireValue::Bool(self.mandatory),
            ],
        )
    }

    fn from_wire(value: &WireValue) -> Result<Self> {
        let items = body(value, descriptors::FIELD, "field")?;
        Ok(Self {
            name: text(items, 0, "field name")?,
            type_name: text(items, 1, "field type")?,
            mandatory: items.get(2).and_then(WireValue::as_bool).unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schema-json", derive(serde::Serialize, serde::Deserialize))]
pub struct Choice {
    pub name: String,
    pub value: String,
}

impl Choice {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schema-json", derive(serde::Serialize, serde::Deserialize))]
pub struct CompositeType {
    pub name: String,
    /// Interfaces implemented, by wire name.
    pub provides: Vec<String>,
    pub descriptor: Descriptor,
    /// Alphabetic order.
    pub fields: Vec<Field>,
}

/// Non-composite types: enums, collections, arrays, interfaces, and
/// custom-serialized types (whose `source` is the proxy type name).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schema-json", derive(serde::Serialize, serde::Deserialize))]
pub struct RestrictedType {
    pub name: String,
    pub provides: Vec<String>,
    pub source: String,
    pub descriptor: Descriptor,
    pub choices: Vec<Choice>,
}

pub mod source {
    pub const LIST: &str = "list";
    pub const MAP: &str = "map";
    pub const ARRAY: &str = "array";
    pub const ENUM: &str = "enum";
    pub const INTERFACE: &str = "interface";
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "schema-json", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeNotation {
    Composite(CompositeType),
    Restricted(RestrictedType),
}

impl TypeNotation {
    pub fn name(&self) -> &str {
        match self {
            TypeNotation::Composite(c) => &c.name,
            TypeNotation::Restricted(r) => &r.name,
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        match self {
            TypeNotation::Composite(c) => &c.descriptor,
            TypeNotation::Restricted(r) => &r.descriptor,
        }
    }

    pub fn to_wire(&self) -> WireValue {
        match self {
            TypeNotation::Composite(c) => WireValue::described_list(
                descriptors::COMPOSITE_TYPE,
                vec![
                    WireValue::string(c.name.as_str()),
                    string_list(&c.provides),
                    c.descriptor.to_wire(),
                    WireValue::List(c.fields.iter().map(Field::to_wire).collect()),
                ],
            ),
            TypeNotation::Restricted(r) => WireValue::described_list(
                descriptors::RESTRICTED_TYPE,
                vec![
                    WireValue::string(r.name.as_str()),
                    string_list(&r.provides),
                    WireValue::string(r.source.as_str()),
                    r.descriptor.to_wire(),
                    WireValue::List(
                        r.choices
                            .iter()
                            .map(|c| {
                                WireValue::described_list(
                                    descriptors::CHOICE,
                                    vec![
                                        WireValue::string(c.name.as_str()),
                                        WireValue::string(c.value.as_str()),
                                    ],
                                )
                            })
                            .collect(),
                    ),
                ],
            ),
        }
    }

    pub fn from_wire(value: &WireValue) -> Result<Self> {
        if let Some(items) = value
            .described_body(descriptors::COMPOSITE_TYPE)
            .and_then(WireValue::as_list)
        {
            let fields = list(items, 3, "fields")?
                .iter()
                .map(Field::from_wire)
                .collect::<Result<Vec<_>>>()?;
            return Ok(TypeNotation::Composite(CompositeType {
                name: text(items, 0, "type name")?,
                provides: strings(items, 1)?,
                descriptor: Descriptor::from_wire(item(items, 2, "descriptor")?)?,
                fields,
            }));
        }
        let items = body(value, descriptors::RESTRICTED_TYPE, "type notation")?;
        let choices = list(items, 4, "choices")?
            .iter()
            .map(|choice| {
                let parts = body(choice, descriptors::CHOICE, "choice")?;
                Ok(Choice {
                    name: text(parts, 0, "choice name")?,
                    value: text(parts, 1, "choice value")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TypeNotation::Restricted(RestrictedType {
            name: text(items, 0, "type name")?,
            provides: strings(items, 1)?,
            source: text(items, 2, "source")?,
            descriptor: Descriptor::from_wire(item(items, 3, "descriptor")?)?,
            choices,
        }))
    }
}

/// Every type used by one payload, in first-encountered order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "schema-json", derive(serde::Serialize, serde::Deserialize))]
pub struct Schema {
    pub types: Vec<TypeNotation>,
}

impl Schema {
    pub fn find(&self, descriptor: &str) -> Option<&TypeNotation> {
        self.types.iter().find(|t| t.descriptor().name == descriptor)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&TypeNotation> {
        self.types.iter().find(|t| t.name() == name)
    }

    pub fn to_wire(&self) -> WireValue {
        WireValue::described_list(
            descriptors::SCHEMA,
            vec![WireValue::List(self.types.iter().map(TypeNotation::to_wire).collect())],
        )
    }

    pub fn from_wire(value: &WireValue) -> Result<Self> {
        let items = body(value, descriptors::SCHEMA, "schema")?;
        let types = list(items, 0, "types")?
            .iter()
            .map(TypeNotation::from_wire)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { types })
    }

    /// Pretty JSON dump for tooling.
    #[cfg(feature = "schema-json")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::not_serializable(format!("schema JSON dump failed: {}", e)))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<schema>")?;
        for notation in &self.types {
            match notation {
                TypeNotation::Composite(c) => {
                    writeln!(
                        f,
                        "  <type class=\"composite\" name=\"{}\" provides=\"[{}]\">",
                        c.name,
                        c.provides.join(", ")
                    )?;
                    writeln!(f, "    <descriptor name=\"{}\"/>", c.descriptor.name)?;
                    for field in &c.fields {
                        writeln!(
                            f,
                            "    <field name=\"{}\" type=\"{}\" mandatory=\"{}\"/>",
                            field.name, field.type_name, field.mandatory
                        )?;
                    }
                }
                TypeNotation::Restricted(r) => {
                    writeln!(
                        f,
                        "  <type class=\"restricted\" name=\"{}\" source=\"{}\" provides=\"[{}]\">",
                        r.name,
                        r.source,
                        r.provides.join(", ")
                    )?;
                    writeln!(f, "    <descriptor name=\"{}\"/>", r.descriptor.name)?;
                    for choice in &r.choices {
                        writeln!(f, "    <choice name=\"{}\" value=\"{}\"/>", choice.name, choice.value)?;
                    }
                }
            }
            writeln!(f, "  </type>")?;
        }
        write!(f, "</schema>")
    }
}

/// Accumulates notations for one payload, one per descriptor.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    types: Vec<TypeNotation>,
    seen: HashSet<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, descriptor: &str) -> bool {
        self.seen.contains(descriptor)
    }

    /// Returns false when a notation with the same descriptor is present.
    pub fn add(&mut self, notation: TypeNotation) -> bool {
        if !self.seen.insert(notation.descriptor().name.clone()) {
            return false;
        }
        self.types.push(notation);
        true
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn build(self) -> Schema {
        Schema { types: self.types }
    }
}

fn string_list(items: &[String]) -> WireValue {
    WireValue::List(items.iter().map(|s| WireValue::string(s.as_str())).collect())
}

fn malformed(what: &str) -> Error {
    Error::not_serializable(format!("malformed schema: bad or missing {}", what))
}

fn body<'a>(value: &'a WireValue, code: u64, what: &str) -> Result<&'a [WireValue]> {
    value
        .described_body(code)
        .and_then(WireValue::as_list)
        .ok_or_else(|| malformed(what))
}

fn item<'a>(items: &'a [WireValue], index: usize, what: &str) -> Result<&'a WireValue> {
    items.get(index).ok_or_else(|| malformed(what))
}

fn text(items: &[WireValue], index: usize, what: &str) -> Result<String> {
    item(items, index, what)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(what))
}

fn list<'a>(items: &'a [WireValue], index: usize, what: &str) -> Result<&'a [WireValue]> {
    item(items, index, what)?.as_list().ok_or_else(|| malformed(what))
}

fn strings(items: &[WireValue], index: usize) -> Result<Vec<String>> {
    list(items, index, "provides")?
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(|| malformed("provides")))
        .collect()
}

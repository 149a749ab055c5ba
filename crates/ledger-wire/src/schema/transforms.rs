// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Non-structural enum evolution: renames and default values.
//!
//! Transforms are declared on the local enum in chronological order and
//! travel in every envelope that carries the enum, so a receiver built
//! against an older or newer version can map constants it does not know.

use crate::config::descriptors;
use crate::error::{Error, Result};
use crate::wire::WireValue;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schema-json", derive(serde::Serialize, serde::Deserialize))]
pub enum EnumTransform {
    /// Constant `from` was renamed to `to`.
    Rename { from: String, to: String },
    /// Constant `new` was added; receivers that do not know it read `old`.
    Default { new: String, old: String },
}

impl EnumTransform {
    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        EnumTransform::Rename {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn default_to(new: impl Into<String>, old: impl Into<String>) -> Self {
        EnumTransform::Default {
            new: new.into(),
            old: old.into(),
        }
    }

    fn to_wire(&self) -> WireValue {
        let (kind, a, b) = match self {
            EnumTransform::Rename { from, to } => ("rename", from, to),
            EnumTransform::Default { new, old } => ("default", new, old),
        };
        WireValue::described_list(
            descriptors::TRANSFORM_ELEMENT,
            vec![
                WireValue::symbol(kind),
                WireValue::string(a.as_str()),
                WireValue::string(b.as_str()),
            ],
        )
    }

    fn from_wire(value: &WireValue) -> Result<Self> {
        let items = value
            .described_body(descriptors::TRANSFORM_ELEMENT)
            .and_then(WireValue::as_list)
            .ok_or_else(|| malformed("transform element is not a described list"))?;
        let text = |i: usize| {
            items
                .get(i)
                .and_then(WireValue::as_str)
                .map(str::to_string)
                .ok_or_else(|| malformed("transform element is missing a name"))
        };
        match text(0)?.as_str() {
            "rename" => Ok(EnumTransform::Rename {
                from: text(1)?,
                to: text(2)?,
            }),
            "default" => Ok(EnumTransform::Default {
                new: text(1)?,
                old: text(2)?,
            }),
            other => Err(malformed(&format!("unknown transform kind {}", other))),
        }
    }
}

impl fmt::Display for EnumTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumTransform::Rename { from, to } => write!(f, "rename {} -> {}", from, to),
            EnumTransform::Default { new, old } => write!(f, "default {} -> {}", new, old),
        }
    }
}

fn malformed(reason: &str) -> Error {
    Error::not_serializable(format!("malformed transforms schema: {}", reason))
}

/// Per-type transform lists, keyed by wire type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "schema-json", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformsSchema {
    pub types: BTreeMap<String, Vec<EnumTransform>>,
}

impl TransformsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, type_name: &str) -> &[EnumTransform] {
        self.types.get(type_name).map_or(&[], Vec::as_slice)
    }

    /// Record the transforms of one type. Empty lists are not recorded.
    pub fn insert(&mut self, type_name: impl Into<String>, transforms: &[EnumTransform]) {
        if !transforms.is_empty() {
            self.types
                .entry(type_name.into())
                .or_insert_with(|| transforms.to_vec());
        }
    }

    pub fn to_wire(&self) -> WireValue {
        let entries = self
            .types
            .iter()
            .map(|(name, transforms)| {
                (
                    WireValue::string(name.as_str()),
                    WireValue::List(transforms.iter().map(EnumTransform::to_wire).collect()),
                )
            })
            .collect();
        WireValue::described_list(descriptors::TRANSFORMS_SCHEMA, vec![WireValue::Map(entries)])
    }

    pub fn from_wire(value: &WireValue) -> Result<Self> {
        let items = value
            .described_body(descriptors::TRANSFORMS_SCHEMA)
            .and_then(WireValue::as_list)
            .ok_or_else(|| malformed("not a described list"))?;
        let Some(WireValue::Map(entries)) = items.first() else {
            return Err(malformed("missing type map"));
        };
        let mut types = BTreeMap::new();
        for (key, list) in entries {
            let name = key.as_str().ok_or_else(|| malformed("type name is not a string"))?;
            let transforms = list
                .as_list()
                .ok_or_else(|| malformed("transforms are not a list"))?
                .iter()
                .map(EnumTransform::from_wire)
                .collect::<Result<Vec<_>>>()?;
            types.insert(name.to_string(), transforms);
        }
        Ok(Self { types })
    }
}

/// Reject transform lists that could never resolve deterministically:
/// self-renames, self-defaults, cycles, renames of live constants, and
/// transforms whose targets are not declared constants.
pub fn validate_enum_transforms(
    type_name: &str,
    constants: &[String],
    transforms: &[EnumTransform],
) -> Result<()> {
    let fail = |message: String| Err(Error::detailed(type_name, message));
    let live: BTreeSet<&str> = constants.iter().map(String::as_str).collect();

    for (i, transform) in transforms.iter().enumerate() {
        match transform {
            EnumTransform::Rename { from, to } => {
                if from == to {
                    return fail(format!("constant {} is renamed to itself", from));
                }
                if live.contains(from.as_str()) {
                    return fail(format!("renamed constant {} is still declared", from));
                }
                if transforms[..i]
                    .iter()
                    .any(|t| matches!(t, EnumTransform::Rename { from: f, .. } if f == from))
                {
                    return fail(format!("constant {} is renamed twice", from));
                }
                if resolve_constant(from, constants, transforms).is_none() {
                    return fail(format!(
                        "rename of {} does not resolve to a declared constant",
                        from
                    ));
                }
            }
            EnumTransform::Default { new, old } => {
                if new == old {
                    return fail(format!("constant {} defaults to itself", new));
                }
                if !live.contains(new.as_str()) {
                    return fail(format!("defaulted constant {} is not declared", new));
                }
                if resolve_constant(old, constants, transforms).is_none() {
                    return fail(format!("default {} of {} is unknown", old, new));
                }
            }
        }
    }

    let mut followed = BTreeMap::new();
    for transform in transforms {
        if let EnumTransform::Default { new, old } = transform {
            followed.insert(new.as_str(), old.as_str());
        }
    }
    for start in followed.keys() {
        let mut seen = BTreeSet::new();
        let mut current = *start;
        while let Some(next) = followed.get(current) {
            if !seen.insert(current) {
                return fail(format!("default chain through {} is cyclic", start));
            }
            current = next;
        }
    }
    Ok(())
}

/// Map a constant name onto one of `known`.
///
/// Renames apply in declaration order, so `A -> B` followed by `B -> C`
/// maps `A` to `C`; when the result is still unknown, default links are
/// followed until a known constant is reached.
pub fn resolve_constant(
    name: &str,
    known: &[String],
    transforms: &[EnumTransform],
) -> Option<String> {
    let is_known = |n: &str| known.iter().any(|k| k == n);
    let rename = |start: &str| {
        let mut current = start.to_string();
        for transform in transforms {
            if let EnumTransform::Rename { from, to } = transform {
                if *from == current {
                    current = to.clone();
                }
            }
        }
        current
    };

    let mut current = rename(name);
    let mut visited = BTreeSet::new();
    while !is_known(&current) {
        if !visited.insert(current.clone()) {
            return None;
        }
        let old = transforms.iter().find_map(|t| match t {
            EnumTransform::Default { new, old } if *new == current => Some(old),
            _ => None,
        })?;
        current = rename(old);
    }
    Some(current)
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Composite evolution.
//!
//! The remote property list is matched against the local canonical
//! constructor and every legacy constructor. The best candidate is the one
//! that consumes the remote properties exactly, then the one matching the
//! most of them, then the canonical constructor, then the newest legacy
//! version. A legacy constructor's output is fed to each newer legacy
//! constructor whose parameters it names exactly, and finally to the
//! canonical constructor.

use super::{compatible, write_unsupported};
use crate::context::EvolutionMode;
use crate::error::{Error, Result};
use crate::model::{
    Arguments, LocalComposable, LocalParameterInformation, PropertyKind,
    RemotePropertyInformation, TypeIdentifier,
};
use crate::serializers::{DeserializationInput, SerializationOutput, Serializer};
use crate::value::{Record, Value};
use crate::wire::WireValue;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Canonical,
    /// Index into the local legacy constructors.
    Legacy(usize),
}

#[derive(Debug, Clone, Copy)]
struct Score {
    exact: bool,
    matched: usize,
}

#[derive(Debug)]
pub struct ObjectEvolutionSerializer {
    type_id: TypeIdentifier,
    descriptor: String,
    local: Arc<LocalComposable>,
    remote: Vec<RemotePropertyInformation>,
    plan: Plan,
}

impl ObjectEvolutionSerializer {
    /// Bridge for `remote`, or `None` when its properties already match the
    /// local ones and the plain object serializer can read it.
    pub fn new(
        local: Arc<LocalComposable>,
        remote: &[RemotePropertyInformation],
        descriptor: String,
        mode: EvolutionMode,
    ) -> Result<Option<Self>> {
        if same_properties(&local, remote) {
            return Ok(None);
        }
        let type_name = local.type_id.name();

        if mode == EvolutionMode::Strict {
            check_strict(&local, remote)?;
        }

        let mut best: Option<(Plan, Score, u32)> = None;
        let candidates = std::iter::once((Plan::Canonical, &local.constructor.parameters, u32::MAX))
            .chain(
                local
                    .legacy_constructors
                    .iter()
                    .enumerate()
                    .map(|(i, legacy)| (Plan::Legacy(i), &legacy.parameters, legacy.version)),
            );
        for (plan, parameters, version) in candidates {
            let Some(score) = score(parameters, remote) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((best_plan, best_score, best_version)) => {
                    let rank = |plan: &Plan, score: &Score, version: u32| {
                        (score.exact, score.matched, *plan == Plan::Canonical, version)
                    };
                    rank(&plan, &score, version) > rank(best_plan, best_score, *best_version)
                }
            };
            if better {
                best = Some((plan, score, version));
            }
        }

        let Some((plan, score, _)) = best else {
            let names: Vec<&str> = remote.iter().map(|p| p.name.as_str()).collect();
            return Err(Error::evolution(
                type_name,
                format!("no constructor accepts the remote properties {:?}", names),
            ));
        };
        log::debug!(
            "[EVOLUTION] [OK] {} bridged via {:?} ({} of {} properties matched)",
            local.type_id,
            plan,
            score.matched,
            remote.len()
        );
        Ok(Some(Self {
            type_id: local.type_id.clone(),
            descriptor,
            remote: remote.to_vec(),
            local,
            plan,
        }))
    }

    fn legacy_chain(&self, start: usize, arguments: Arguments) -> Result<Arguments> {
        let legacies = &self.local.legacy_constructors;
        let first = &legacies[start];
        let mut current = first
            .constructor
            .apply(take_parameters(&self.type_id, &first.parameters, &arguments)?)?;
        for next in &legacies[start + 1..] {
            let names: BTreeSet<&str> = next.parameters.iter().map(|p| p.name.as_str()).collect();
            let produced: BTreeSet<&str> = current.keys().map(String::as_str).collect();
            if names == produced {
                current = next
                    .constructor
                    .apply(take_parameters(&self.type_id, &next.parameters, &current)?)?;
            }
        }
        Ok(current)
    }
}

fn same_properties(local: &LocalComposable, remote: &[RemotePropertyInformation]) -> bool {
    local.properties.len() == remote.len()
        && local.properties.iter().zip(remote).all(|(l, r)| {
            l.name == r.name && l.type_id() == r.type_id && l.mandatory == r.mandatory
        })
}

/// Every remote property must land somewhere: on a compatible local
/// property, or on a legacy constructor parameter.
fn check_strict(local: &LocalComposable, remote: &[RemotePropertyInformation]) -> Result<()> {
    for property in remote {
        match local.property(&property.name) {
            Some(found) if !compatible(&found.type_id(), &property.type_id) => {
                return Err(Error::evolution(
                    local.type_id.name(),
                    format!(
                        "property {} changed type from {} to {}",
                        property.name,
                        property.type_id,
                        found.type_id()
                    ),
                ));
            }
            Some(_) => {}
            None => {
                let bridged = local
                    .legacy_constructors
                    .iter()
                    .flat_map(|l| &l.parameters)
                    .any(|p| p.name == property.name && compatible(&p.type_id, &property.type_id));
                if !bridged {
                    return Err(Error::evolution(
                        local.type_id.name(),
                        format!("remote property {} has no local counterpart", property.name),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// How well a parameter list fits the remote properties, or `None` when it
/// cannot be called with them.
fn score(parameters: &[LocalParameterInformation], remote: &[RemotePropertyInformation]) -> Option<Score> {
    let mut matched = 0;
    for parameter in parameters {
        match remote.iter().find(|r| r.name == parameter.name) {
            Some(found) => {
                if !compatible(&parameter.type_id, &found.type_id) {
                    return None;
                }
                // a nullable remote value cannot feed a mandatory parameter
                if parameter.mandatory && !found.mandatory {
                    return None;
                }
                matched += 1;
            }
            None if parameter.mandatory => return None,
            None => {}
        }
    }
    Some(Score {
        exact: matched == parameters.len() && matched == remote.len(),
        matched,
    })
}

/// Arguments for `parameters`, filling absent nullable ones with null.
fn take_parameters(
    type_id: &TypeIdentifier,
    parameters: &[LocalParameterInformation],
    available: &Arguments,
) -> Result<Arguments> {
    let mut out = Arguments::new();
    for parameter in parameters {
        let value = available.get(&parameter.name).cloned().unwrap_or(Value::Null);
        if value.is_null() && parameter.mandatory {
            return Err(Error::detailed(
                type_id.name(),
                format!("mandatory parameter {} has no value", parameter.name),
            ));
        }
        out.insert(parameter.name.clone(), value);
    }
    Ok(out)
}

impl Serializer for ObjectEvolutionSerializer {
    fn type_id(&self) -> &TypeIdentifier {
        &self.type_id
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn write_type(&self, _output: &mut SerializationOutput<'_>) -> Result<()> {
        Err(write_unsupported(&self.type_id))
    }

    fn write_value(&self, _value: &Value, _output: &mut SerializationOutput<'_>) -> Result<WireValue> {
        Err(write_unsupported(&self.type_id))
    }

    fn read_value(&self, body: &WireValue, input: &mut DeserializationInput<'_>) -> Result<Value> {
        let items = crate::serializers::expect_list(body, &self.type_id)?;
        if items.len() != self.remote.len() {
            return Err(Error::not_serializable(format!(
                "{} schema lists {} properties, payload has {}",
                self.type_id,
                self.remote.len(),
                items.len()
            )));
        }
        let mut remote_values = Arguments::new();
        for (property, item) in self.remote.iter().zip(items) {
            let value = input.read_object(item, &property.type_id)?;
            if value.is_null() && property.mandatory {
                return Err(Error::detailed(
                    self.type_id.name(),
                    format!("mandatory property {} is null", property.name),
                ));
            }
            remote_values.insert(property.name.clone(), value);
        }

        let arguments = match self.plan {
            Plan::Canonical => remote_values.clone(),
            Plan::Legacy(index) => self.legacy_chain(index, remote_values.clone())?,
        };
        let mut fields = take_parameters(
            &self.type_id,
            &self.local.constructor.parameters,
            &arguments,
        )?;

        for property in &self.local.properties {
            if property.kind != PropertyKind::Setter {
                continue;
            }
            let remote_type = self.remote.iter().find(|r| r.name == property.name);
            if let (Some(remote_type), Some(value)) = (remote_type, remote_values.get(&property.name)) {
                if compatible(&property.type_id(), &remote_type.type_id) {
                    fields.insert(property.name.clone(), value.clone());
                }
            }
        }
        Ok(Record::from_fields(self.type_id.clone(), fields).into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        LegacyConstructor, LocalTypeModel, ParameterDeclaration, Primitive, TypeDeclaration,
        TypeRegistry,
    };

    fn int() -> TypeIdentifier {
        TypeIdentifier::Primitive(Primitive::Int)
    }

    fn remote(name: &str, mandatory: bool) -> RemotePropertyInformation {
        RemotePropertyInformation {
            name: name.into(),
            type_id: int(),
            mandatory,
        }
    }

    fn composable(declaration: TypeDeclaration) -> Arc<LocalComposable> {
        let type_id = declaration.type_id();
        let registry = Arc::new(TypeRegistry::new());
        registry.register(declaration).unwrap();
        let model = LocalTypeModel::new(registry);
        Arc::clone(model.inspect(&type_id).as_composable().unwrap())
    }

    #[test]
    fn test_identical_shape_needs_no_bridge() {
        let local = composable(TypeDeclaration::composite("C").property("a", int()));
        let bridge =
            ObjectEvolutionSerializer::new(local, &[remote("a", true)], "d".into(), EvolutionMode::Strict)
                .unwrap();
        assert!(bridge.is_none());
    }

    #[test]
    fn test_added_nullable_property_uses_canonical() {
        let local = composable(
            TypeDeclaration::composite("C")
                .property("a", int())
                .nullable_property("b", int()),
        );
        let bridge =
            ObjectEvolutionSerializer::new(local, &[remote("a", true)], "d".into(), EvolutionMode::Strict)
                .unwrap()
                .unwrap();
        assert_eq!(bridge.plan, Plan::Canonical);
    }

    #[test]
    fn test_added_mandatory_property_needs_legacy() {
        let without_legacy = composable(
            TypeDeclaration::composite("C")
                .property("a", int())
                .property("b", int()),
        );
        let err = ObjectEvolutionSerializer::new(
            without_legacy,
            &[remote("a", true)],
            "d".into(),
            EvolutionMode::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Evolution { .. }));

        let with_legacy = composable(
            TypeDeclaration::composite("C")
                .property("a", int())
                .property("b", int())
                .legacy_constructor(LegacyConstructor::new(
                    1,
                    vec![ParameterDeclaration::mandatory("a", int())],
                    |mut args| {
                        args.insert("b".into(), Value::I32(42));
                        Ok(args)
                    },
                )),
        );
        let bridge = ObjectEvolutionSerializer::new(
            with_legacy,
            &[remote("a", true)],
            "d".into(),
            EvolutionMode::Strict,
        )
        .unwrap()
        .unwrap();
        assert_eq!(bridge.plan, Plan::Legacy(0));
    }

    #[test]
    fn test_removed_property_strict_vs_lenient() {
        let local = composable(TypeDeclaration::composite("C").property("a", int()));
        let fields = [remote("a", true), remote("gone", true)];
        let strict = ObjectEvolutionSerializer::new(
            Arc::clone(&local),
            &fields,
            "d".into(),
            EvolutionMode::Strict,
        );
        assert!(matches!(strict, Err(Error::Evolution { .. })));

        let lenient =
            ObjectEvolutionSerializer::new(local, &fields, "d".into(), EvolutionMode::Lenient).unwrap();
        assert!(lenient.is_some());
    }

    #[test]
    fn test_nullable_remote_cannot_feed_mandatory() {
        let params = vec![LocalParameterInformation {
            name: "a".into(),
            type_id: int(),
            mandatory: true,
        }];
        assert!(score(&params, &[remote("a", false)]).is_none());
        assert!(score(&params, &[remote("a", true)]).is_some_and(|s| s.exact));
    }
}

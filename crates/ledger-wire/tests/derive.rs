// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Declarations produced by `#[derive(Serializable)]`.

use ledger_wire::model::DeclarationKind;
use ledger_wire::{
    EnumTransform, Primitive, Serializable, SerializationScheme, TypeIdentifier, TypeRegistry,
    UseCase,
};
use std::sync::Arc;

#[derive(Debug, PartialEq, Serializable)]
#[ledger(name = "demo.Node", implements = "demo.Linked", always_serializable)]
struct Node {
    label: String,
    weight: Option<i32>,
    next: Option<Box<Node>>,
}

#[derive(Debug, PartialEq, Serializable)]
struct Unnamed {
    flag: bool,
}

fn color_transforms() -> Vec<EnumTransform> {
    vec![EnumTransform::default_to("Teal", "Blue")]
}

#[derive(Debug, Clone, Copy, PartialEq, Serializable)]
#[ledger(name = "demo.Color", transforms = "color_transforms", structural_only)]
enum Color {
    Red,
    Blue,
    Teal,
}

#[test]
fn test_struct_declaration() {
    let registry = TypeRegistry::new();
    Node::declare(&registry).unwrap();

    let node = registry.get("demo.Node").unwrap();
    assert_eq!(node.kind, DeclarationKind::Composite);
    assert!(node.always_serializable);
    assert_eq!(node.supertypes, vec![TypeIdentifier::named("demo.Linked")]);

    let label = node.properties.iter().find(|p| p.name == "label").unwrap();
    assert!(label.mandatory);
    assert_eq!(label.type_id, TypeIdentifier::Primitive(Primitive::String));
    let weight = node.properties.iter().find(|p| p.name == "weight").unwrap();
    assert!(!weight.mandatory);
    let next = node.properties.iter().find(|p| p.name == "next").unwrap();
    assert_eq!(next.type_id, TypeIdentifier::named("demo.Node"));

    let linked = registry.get("demo.Linked").unwrap();
    assert_eq!(linked.kind, DeclarationKind::Interface);
}

#[test]
fn test_default_name_is_identifier() {
    assert_eq!(Unnamed::type_identifier(), TypeIdentifier::named("Unnamed"));
}

#[test]
fn test_enum_declaration() {
    let registry = TypeRegistry::new();
    Color::declare(&registry).unwrap();
    let color = registry.get("demo.Color").unwrap();
    assert_eq!(color.kind, DeclarationKind::Enum);
    assert_eq!(color.constants, vec!["Red", "Blue", "Teal"]);
    assert_eq!(color.transforms, color_transforms());
    assert!(color.structural_only);
}

#[test]
fn test_existing_declaration_kept() {
    let registry = TypeRegistry::new();
    Node::declare(&registry).unwrap();
    let first = registry.get("demo.Node").unwrap();
    Node::declare(&registry).unwrap();
    assert!(Arc::ptr_eq(&first, &registry.get("demo.Node").unwrap()));
}

#[test]
fn test_recursive_struct_round_trips() {
    let scheme = SerializationScheme::default();
    let ctx = scheme.context(UseCase::Testing, Arc::new(TypeRegistry::new()));
    let list = Node {
        label: "head".into(),
        weight: Some(1),
        next: Some(Box::new(Node {
            label: "tail".into(),
            weight: None,
            next: None,
        })),
    };
    let bytes = scheme.serialize(&list, &ctx).unwrap();
    let back: Node = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert_eq!(back, list);
}

#[test]
fn test_enum_ordinals_follow_declaration_order() {
    let scheme = SerializationScheme::default();
    let ctx = scheme.context(UseCase::Testing, Arc::new(TypeRegistry::new()));
    let value = ledger_wire::ValueWriter::new().write(&Color::Teal).unwrap();
    let constant = value.as_enum().unwrap();
    assert_eq!(constant.name, "Teal");
    assert_eq!(constant.ordinal, 2);

    let bytes = scheme.serialize(&Color::Teal, &ctx).unwrap();
    assert_eq!(scheme.deserialize::<Color>(bytes.as_bytes(), &ctx).unwrap(), Color::Teal);
}

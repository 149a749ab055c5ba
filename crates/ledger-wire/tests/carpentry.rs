// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Reading types the receiver has never declared.

use ledger_wire::{
    CollectionKind, EnumValue, Error, Primitive, Record, SerializationContext, SerializationScheme,
    TypeDeclaration, TypeIdentifier, TypeRegistry, UseCase, Value,
};
use std::sync::Arc;

fn long() -> TypeIdentifier {
    TypeIdentifier::Primitive(Primitive::Long)
}

fn tags() -> TypeIdentifier {
    TypeIdentifier::collection(
        CollectionKind::List,
        vec![TypeIdentifier::Primitive(Primitive::String)],
    )
}

fn sender_registry() -> Arc<TypeRegistry> {
    let registry = Arc::new(TypeRegistry::new());
    registry
        .register(TypeDeclaration::interface("remote.Priced"))
        .unwrap();
    registry
        .register(TypeDeclaration::enumeration("remote.Side", ["BUY", "SELL"]))
        .unwrap();
    registry
        .register(
            TypeDeclaration::composite("remote.Trade")
                .property("price", long())
                .property("side", TypeIdentifier::named("remote.Side"))
                .property("tags", tags())
                .supertype(TypeIdentifier::named("remote.Priced")),
        )
        .unwrap();
    registry
}

fn trade_record() -> Record {
    Record::new(TypeIdentifier::named("remote.Trade"))
        .with("price", 1_000i64)
        .with(
            "side",
            EnumValue::new(TypeIdentifier::named("remote.Side"), "SELL", 1),
        )
        .with(
            "tags",
            Value::List(vec![Value::String("a".into()), Value::String("b".into())]),
        )
}

fn sent(scheme: &SerializationScheme) -> Vec<u8> {
    let ctx = scheme.context(UseCase::P2P, sender_registry());
    scheme
        .serialize_value(
            &trade_record().into_value(),
            &TypeIdentifier::named("remote.Trade"),
            &ctx,
        )
        .unwrap()
        .into_vec()
}

fn receiver(scheme: &SerializationScheme) -> SerializationContext {
    scheme.context(UseCase::P2P, Arc::new(TypeRegistry::new()))
}

#[test]
fn test_unknown_type_read_as_record() {
    let scheme = SerializationScheme::default();
    let bytes = sent(&scheme);
    let value = scheme
        .deserialize_value(&bytes, &TypeIdentifier::Top, &receiver(&scheme))
        .unwrap();

    let record = value.as_record().unwrap();
    assert_eq!(record.type_id.name(), "remote.Trade");
    assert_eq!(record.get("price"), Some(&Value::I64(1_000)));
    let side = record.get("side").and_then(Value::as_enum).unwrap();
    assert_eq!(side.name, "SELL");
    assert_eq!(side.ordinal, 1);
    assert!(matches!(record.get("tags"), Some(Value::List(items)) if items.len() == 2));
}

#[test]
fn test_caller_registry_not_modified() {
    let scheme = SerializationScheme::default();
    let bytes = sent(&scheme);
    let ctx = receiver(&scheme);
    scheme
        .deserialize_value(&bytes, &TypeIdentifier::Top, &ctx)
        .unwrap();
    assert!(!ctx.registry.contains("remote.Trade"));

    let factory = scheme.factory(&ctx).unwrap();
    assert!(factory.registry().contains("remote.Trade"));
    assert!(factory.registry().contains("remote.Side"));
    assert!(factory.registry().contains("remote.Priced"));
}

#[test]
fn test_synthesized_type_honours_supertypes() {
    let scheme = SerializationScheme::default();
    let bytes = sent(&scheme);
    let value = scheme
        .deserialize_value(
            &bytes,
            &TypeIdentifier::named("remote.Priced"),
            &receiver(&scheme),
        )
        .unwrap();
    assert!(value.as_record().is_some());
}

#[test]
fn test_carpentry_disabled_is_reported() {
    let scheme = SerializationScheme::default();
    let bytes = sent(&scheme);
    let ctx = receiver(&scheme).with_carpenter(false);
    match scheme.deserialize_value(&bytes, &TypeIdentifier::Top, &ctx) {
        Err(Error::CarpentryDisabled { type_name }) => assert_eq!(type_name, "remote.Trade"),
        other => panic!("expected CarpentryDisabled, got {:?}", other),
    }
}

#[test]
fn test_synthesized_record_can_be_forwarded() {
    let scheme = SerializationScheme::default();
    let bytes = sent(&scheme);
    let ctx = receiver(&scheme);
    let value = scheme
        .deserialize_value(&bytes, &TypeIdentifier::Top, &ctx)
        .unwrap();

    let forwarded = scheme
        .serialize_value(&value, &TypeIdentifier::named("remote.Trade"), &ctx)
        .unwrap();
    let again = scheme
        .deserialize_value(forwarded.as_bytes(), &TypeIdentifier::Top, &receiver(&scheme))
        .unwrap();
    assert_eq!(
        again.as_record().and_then(|r| r.get("price")),
        Some(&Value::I64(1_000))
    );
}

#[test]
fn test_config_disables_carpentry_for_new_contexts() {
    let scheme =
        SerializationScheme::new(ledger_wire::CodecConfig::default().with_carpenter(false));
    let bytes = sent(&scheme);
    let err = scheme
        .deserialize_value(&bytes, &TypeIdentifier::Top, &receiver(&scheme))
        .unwrap_err();
    assert!(matches!(err, Error::CarpentryDisabled { .. }), "{}", err);
}

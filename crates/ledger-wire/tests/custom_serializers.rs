// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Custom serializers: user proxies, lookup conflicts, built-ins.

use ledger_wire::model::TypeDeclaration;
use ledger_wire::traits::{ValueReader, ValueWriter};
use ledger_wire::value::OpaqueValue;
use ledger_wire::{
    Error, FailureReport, ProxySerializer, Serializable, SerializationScheme, TypeIdentifier,
    TypeRegistry, UseCase, Value, INCLUDE_EXTENDED_DIAGNOSTICS,
};
use std::sync::Arc;

const MONEY: &str = "demo.Money";

/// Native type with no structural description of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Money {
    units: i64,
    currency: [u8; 3],
}

impl Serializable for Money {
    fn type_identifier() -> TypeIdentifier {
        TypeIdentifier::named(MONEY)
    }

    fn to_value(&self, _writer: &mut ValueWriter) -> ledger_wire::Result<Value> {
        Ok(Value::Opaque(OpaqueValue::new(Self::type_identifier(), *self)))
    }

    fn from_value(value: &Value, _reader: &mut ValueReader) -> ledger_wire::Result<Self> {
        match value {
            Value::Opaque(opaque) => opaque.downcast_ref::<Money>().copied(),
            _ => None,
        }
        .ok_or_else(|| Error::not_serializable("expected native money"))
    }
}

#[derive(Debug, Clone, PartialEq, Serializable)]
#[ledger(name = "demo.MoneyProxy", always_serializable)]
struct MoneyProxy {
    units: i64,
    currency: String,
}

fn money_serializer() -> ProxySerializer<Money, MoneyProxy> {
    ProxySerializer::new(
        TypeIdentifier::named(MONEY),
        |m| MoneyProxy {
            units: m.units,
            currency: String::from_utf8_lossy(&m.currency).into_owned(),
        },
        |p| {
            let currency: [u8; 3] = p
                .currency
                .as_bytes()
                .try_into()
                .map_err(|_| Error::not_serializable("currency must be three letters"))?;
            Ok(Money {
                units: p.units,
                currency,
            })
        },
    )
}

#[derive(Debug, PartialEq, Serializable)]
#[ledger(name = "demo.Invoice")]
struct Invoice {
    total: Money,
    lines: Vec<Money>,
}

fn invoice() -> Invoice {
    let eur = |units| Money {
        units,
        currency: *b"EUR",
    };
    Invoice {
        total: eur(300),
        lines: vec![eur(100), eur(200)],
    }
}

#[test]
fn test_proxy_round_trip() {
    let scheme = SerializationScheme::default().with_custom_serializer(Arc::new(money_serializer()));
    let ctx = scheme.context(UseCase::Testing, Arc::new(TypeRegistry::new()));
    let bytes = scheme.serialize(&invoice(), &ctx).unwrap();
    let back: Invoice = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert_eq!(back, invoice());
}

#[test]
fn test_schema_names_proxy_as_source() {
    let scheme = SerializationScheme::default().with_custom_serializer(Arc::new(money_serializer()));
    let ctx = scheme.context(UseCase::Testing, Arc::new(TypeRegistry::new()));
    let bytes = scheme.serialize(&invoice(), &ctx).unwrap();
    let decoded = scheme
        .deserialize_and_return_envelope::<Invoice>(bytes.as_bytes(), &ctx)
        .unwrap();
    let schema = decoded.envelope.schema;
    match schema.find_by_name(MONEY) {
        Some(ledger_wire::schema::TypeNotation::Restricted(restricted)) => {
            assert_eq!(restricted.source, "demo.MoneyProxy");
        }
        other => panic!("expected a restricted entry for money, got {:?}", other),
    }
    assert!(schema.find_by_name("demo.MoneyProxy").is_some());
}

#[test]
fn test_receiver_without_serializer_reads_proxy_record() {
    let sender = SerializationScheme::default().with_custom_serializer(Arc::new(money_serializer()));
    let ctx = sender.context(UseCase::P2P, Arc::new(TypeRegistry::new()));
    let bytes = sender.serialize(&invoice().total, &ctx).unwrap();

    let receiver = SerializationScheme::default();
    let rctx = receiver.context(UseCase::P2P, Arc::new(TypeRegistry::new()));
    let value = receiver
        .deserialize_value(bytes.as_bytes(), &TypeIdentifier::Top, &rctx)
        .unwrap();
    let record = value.as_record().unwrap();
    assert_eq!(record.type_id.name(), "demo.MoneyProxy");
    assert_eq!(record.get("units"), Some(&Value::I64(300)));
    assert_eq!(record.get("currency"), Some(&Value::String("EUR".into())));

    let disabled = rctx.with_carpenter(false);
    let err = receiver
        .deserialize_value(bytes.as_bytes(), &TypeIdentifier::Top, &disabled)
        .unwrap_err();
    assert!(matches!(err, Error::CarpentryDisabled { .. }), "{}", err);
}

#[derive(Debug, PartialEq, Serializable)]
#[ledger(name = "demo.Tag")]
struct Tag {
    label: String,
}

#[derive(Debug, Serializable)]
#[ledger(name = "demo.Holder")]
struct Holder {
    a_money: Money,
    b_tag: Arc<Tag>,
    c_tag: Arc<Tag>,
}

fn holder() -> Holder {
    let tag = Arc::new(Tag { label: "x".into() });
    Holder {
        a_money: invoice().total,
        b_tag: Arc::clone(&tag),
        c_tag: tag,
    }
}

#[test]
fn test_shared_object_after_custom_value_keeps_identity() {
    let scheme = SerializationScheme::default().with_custom_serializer(Arc::new(money_serializer()));
    let ctx = scheme.context(UseCase::Testing, Arc::new(TypeRegistry::new()));
    let bytes = scheme.serialize(&holder(), &ctx).unwrap();

    let back: Holder = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert_eq!(back.a_money, invoice().total);
    assert!(Arc::ptr_eq(&back.b_tag, &back.c_tag));
    assert_eq!(back.b_tag.label, "x");
}

#[test]
fn test_shared_object_after_unknown_custom_value_keeps_identity() {
    let sender = SerializationScheme::default().with_custom_serializer(Arc::new(money_serializer()));
    let ctx = sender.context(UseCase::P2P, Arc::new(TypeRegistry::new()));
    let bytes = sender.serialize(&holder(), &ctx).unwrap();

    let receiver = SerializationScheme::default();
    let rctx = receiver.context(UseCase::P2P, Arc::new(TypeRegistry::new()));
    let value = receiver
        .deserialize_value(bytes.as_bytes(), &TypeIdentifier::Top, &rctx)
        .unwrap();
    let record = value.as_record().unwrap();

    let money = record.get("a_money").and_then(Value::as_record).unwrap();
    assert_eq!(money.type_id.name(), "demo.MoneyProxy");

    let (b, c) = match (record.get("b_tag"), record.get("c_tag")) {
        (Some(Value::Composite(b)), Some(Value::Composite(c))) => (b, c),
        other => panic!("expected two tag records, got {:?}", other),
    };
    assert_eq!(c.type_id.name(), "demo.Tag");
    assert_eq!(c.get("label"), Some(&Value::String("x".into())));
    assert!(Arc::ptr_eq(b, c));
}

#[test]
fn test_two_serializers_for_one_type_conflict() {
    let scheme = SerializationScheme::default()
        .with_custom_serializer(Arc::new(money_serializer()))
        .with_custom_serializer(Arc::new(money_serializer()));
    let ctx = scheme.context(UseCase::Testing, Arc::new(TypeRegistry::new()));
    match scheme.serialize(&invoice().total, &ctx) {
        Err(Error::DuplicateCustomSerializer { type_name, serializers }) => {
            assert_eq!(type_name, MONEY);
            assert_eq!(serializers.len(), 2);
        }
        other => panic!("expected a conflict, got {:?}", other),
    }
}

#[derive(Debug, PartialEq, Serializable)]
#[ledger(name = "demo.Money", structural_only)]
struct StructuralMoney {
    units: i64,
}

#[test]
fn test_structural_only_type_refuses_custom_serializer() {
    let scheme = SerializationScheme::default().with_custom_serializer(Arc::new(money_serializer()));
    let registry = Arc::new(TypeRegistry::new());
    registry.register_type::<StructuralMoney>().unwrap();
    let ctx = scheme.context(UseCase::Testing, registry);
    let err = scheme
        .serialize(&StructuralMoney { units: 1 }, &ctx)
        .unwrap_err();
    assert!(matches!(err, Error::IllegalCustomSerializer { .. }), "{}", err);
}

#[test]
fn test_serializer_for_supertype_applies_to_subtype() {
    let scheme = SerializationScheme::default().with_custom_serializer(Arc::new(money_serializer()));
    let registry = Arc::new(TypeRegistry::new());
    registry
        .register(TypeDeclaration::non_composable("demo.Cash", "native", "use a proxy").supertype(
            TypeIdentifier::named(MONEY),
        ))
        .unwrap();
    let ctx = scheme.context(UseCase::Testing, registry);
    let factory = scheme.factory(&ctx).unwrap();
    let serializer = factory.get(&TypeIdentifier::named("demo.Cash")).unwrap();
    assert_eq!(serializer.type_id().name(), "demo.Cash");
}

#[test]
fn test_failure_report_trace_follows_context_flag() {
    let scheme = SerializationScheme::default();
    let report = FailureReport::new("Evolution", "cannot evolve demo.Contract")
        .with_trace(vec!["demo.Contract".into(), "demo.Leg".into()]);

    let plain = scheme.context(UseCase::RpcServer, Arc::new(TypeRegistry::new()));
    let bytes = scheme.serialize(&report, &plain).unwrap();
    let back: FailureReport = scheme.deserialize(bytes.as_bytes(), &plain).unwrap();
    assert_eq!(back.kind, "Evolution");
    assert!(back.trace.is_empty());

    let verbose = plain.with_property(INCLUDE_EXTENDED_DIAGNOSTICS, "true");
    let bytes = scheme.serialize(&report, &verbose).unwrap();
    let back: FailureReport = scheme.deserialize(bytes.as_bytes(), &verbose).unwrap();
    assert_eq!(back, report);
}

#[test]
fn test_failure_report_from_error() {
    let err = Error::CarpentryDisabled {
        type_name: "remote.Trade".into(),
    };
    let report = FailureReport::from(&err);
    assert_eq!(report.kind, "CarpentryDisabled");
    assert!(report.message.contains("remote.Trade"));
}

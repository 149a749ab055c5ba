// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Typed round trips through `serialize` / `deserialize`.
//!
//! Covers derived composites and enums, the standard wrappers and
//! collections, shared references, and the built-in native serializers.

use ledger_wire::model::CollectionKind;
use ledger_wire::{
    Bytes, Error, Primitive, PrimitiveArray, Serializable, SerializationContext,
    SerializationScheme, TypeIdentifier, TypeRegistry, UseCase, Value, ValueReader,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serializable)]
#[ledger(name = "demo.Side")]
enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serializable)]
#[ledger(name = "demo.Party")]
struct Party {
    name: String,
    key: Bytes,
}

#[derive(Debug, Clone, PartialEq, Serializable)]
#[ledger(name = "demo.Trade")]
struct Trade {
    id: u64,
    price: i64,
    quantity: f64,
    side: Side,
    buyer: Party,
    venue: Option<String>,
    tags: Vec<String>,
    legs: BTreeMap<String, i32>,
    sides_seen: BTreeSet<Side>,
    checksum: PrimitiveArray<u8>,
    fills: Box<[i64]>,
}

#[derive(Debug, Serializable)]
#[ledger(name = "demo.Pair")]
struct Pair {
    left: Arc<Party>,
    right: Arc<Party>,
}

#[derive(Debug, Serializable)]
#[ledger(name = "demo.Timed")]
struct Timed {
    elapsed: Duration,
    at: SystemTime,
}

fn setup() -> (SerializationScheme, SerializationContext) {
    let scheme = SerializationScheme::default();
    let ctx = scheme.context(UseCase::Testing, Arc::new(TypeRegistry::new()));
    (scheme, ctx)
}

fn trade() -> Trade {
    Trade {
        id: 7,
        price: -1_250,
        quantity: 12.5,
        side: Side::Sell,
        buyer: Party {
            name: "alice".into(),
            key: Bytes(vec![1, 2, 3]),
        },
        venue: None,
        tags: vec!["otc".into(), "fx".into()],
        legs: BTreeMap::from([("near".to_string(), 1), ("far".to_string(), 2)]),
        sides_seen: BTreeSet::from([Side::Buy, Side::Sell]),
        checksum: PrimitiveArray(vec![0xde, 0xad]),
        fills: vec![10, 20, 30].into_boxed_slice(),
    }
}

#[test]
fn test_composite_round_trip() {
    let (scheme, ctx) = setup();
    let original = trade();
    let bytes = scheme.serialize(&original, &ctx).unwrap();
    let back: Trade = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert_eq!(back, original);
}

#[test]
fn test_optional_field_present() {
    let (scheme, ctx) = setup();
    let mut original = trade();
    original.venue = Some("XLON".into());
    let bytes = scheme.serialize(&original, &ctx).unwrap();
    let back: Trade = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert_eq!(back.venue.as_deref(), Some("XLON"));
}

#[test]
fn test_enum_round_trip() {
    let (scheme, ctx) = setup();
    for side in [Side::Buy, Side::Sell] {
        let bytes = scheme.serialize(&side, &ctx).unwrap();
        assert_eq!(scheme.deserialize::<Side>(bytes.as_bytes(), &ctx).unwrap(), side);
    }
}

#[test]
fn test_null_root() {
    let (scheme, ctx) = setup();
    let bytes = scheme.serialize(&None::<Party>, &ctx).unwrap();
    let back: Option<Party> = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert!(back.is_none());

    let err = scheme.deserialize::<Party>(bytes.as_bytes(), &ctx).unwrap_err();
    assert!(err.to_string().contains("null"), "{}", err);
}

#[test]
fn test_primitive_root() {
    let (scheme, ctx) = setup();
    let bytes = scheme.serialize(&"hello".to_string(), &ctx).unwrap();
    let back: String = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert_eq!(back, "hello");
}

#[test]
fn test_shared_reference_identity_preserved() {
    let (scheme, ctx) = setup();
    let party = Arc::new(Party {
        name: "bob".into(),
        key: Bytes(vec![9]),
    });
    let pair = Pair {
        left: Arc::clone(&party),
        right: party,
    };
    let bytes = scheme.serialize(&pair, &ctx).unwrap();
    let back: Pair = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert!(Arc::ptr_eq(&back.left, &back.right));
    assert_eq!(back.left.name, "bob");
}

#[test]
fn test_distinct_equal_objects_stay_distinct() {
    let (scheme, ctx) = setup();
    let make = || {
        Arc::new(Party {
            name: "carol".into(),
            key: Bytes(vec![]),
        })
    };
    let pair = Pair {
        left: make(),
        right: make(),
    };
    let bytes = scheme.serialize(&pair, &ctx).unwrap();
    let back: Pair = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert!(!Arc::ptr_eq(&back.left, &back.right));
    assert_eq!(back.left, back.right);
}

#[test]
fn test_references_disabled_duplicates_objects() {
    let (scheme, ctx) = setup();
    let ctx = ctx.with_object_references(false);
    let party = Arc::new(Party {
        name: "dave".into(),
        key: Bytes(vec![4]),
    });
    let pair = Pair {
        left: Arc::clone(&party),
        right: party,
    };
    let shared = scheme
        .serialize(&pair, &ctx.clone().with_object_references(true))
        .unwrap();
    let copied = scheme.serialize(&pair, &ctx).unwrap();
    assert!(copied.len() > shared.len());

    let back: Pair = scheme.deserialize(copied.as_bytes(), &ctx).unwrap();
    assert!(!Arc::ptr_eq(&back.left, &back.right));
}

#[test]
fn test_native_time_types_round_trip() {
    let (scheme, ctx) = setup();
    let original = Timed {
        elapsed: Duration::new(90, 500),
        at: UNIX_EPOCH - Duration::new(3, 250_000_000),
    };
    let bytes = scheme.serialize(&original, &ctx).unwrap();
    let back: Timed = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert_eq!(back.elapsed, original.elapsed);
    assert_eq!(back.at, original.at);
}

#[test]
fn test_envelope_returned_for_tooling() {
    let (scheme, ctx) = setup();
    let bytes = scheme.serialize(&trade(), &ctx).unwrap();
    let decoded = scheme
        .deserialize_and_return_envelope::<Trade>(bytes.as_bytes(), &ctx)
        .unwrap();
    assert_eq!(decoded.obj, trade());
    let schema = &decoded.envelope.schema;
    assert!(schema.find_by_name("demo.Trade").is_some());
    assert!(schema.find_by_name("demo.Party").is_some());
    assert!(schema.find_by_name("demo.Side").is_some());
}

#[test]
fn test_wrong_target_type_rejected() {
    let (scheme, ctx) = setup();
    let bytes = scheme.serialize(&trade(), &ctx).unwrap();
    let err = scheme.deserialize::<Party>(bytes.as_bytes(), &ctx).unwrap_err();
    assert!(err.is_decode_failure(), "{}", err);
}

#[test]
fn test_dynamic_value_read() {
    let (scheme, ctx) = setup();
    let bytes = scheme.serialize(&trade(), &ctx).unwrap();
    let value = scheme
        .deserialize_value(bytes.as_bytes(), &TypeIdentifier::Top, &ctx)
        .unwrap();
    let record = value.as_record().unwrap();
    assert_eq!(record.get("price"), Some(&Value::I64(-1_250)));
    assert_eq!(record.get("venue"), Some(&Value::Null));
}

#[test]
fn test_nesting_limit_enforced() {
    let scheme = SerializationScheme::new(ledger_wire::CodecConfig::default().with_max_depth(2));
    let ctx = scheme.context(UseCase::Testing, Arc::new(TypeRegistry::new()));
    match scheme.serialize(&trade(), &ctx) {
        Err(Error::NotSerializable(message)) => assert!(message.contains("deeper"), "{}", message),
        other => panic!("expected depth failure, got {:?}", other),
    }
}

// ============================================================================
// Collections
// ============================================================================

fn sorted_map_of_int() -> TypeIdentifier {
    TypeIdentifier::collection(
        CollectionKind::SortedMap,
        vec![
            TypeIdentifier::Primitive(Primitive::String),
            TypeIdentifier::Primitive(Primitive::Int),
        ],
    )
}

#[test]
fn test_hash_map_refused_and_sorted_map_accepted() {
    let (scheme, ctx) = setup();
    let unstable: HashMap<String, i32> = HashMap::from([("near".to_string(), 1)]);
    match scheme.serialize(&unstable, &ctx) {
        Err(Error::UnsupportedCollection { suggestion, .. }) => {
            assert!(suggestion.starts_with("sorted_map"), "{}", suggestion);
        }
        other => panic!("expected UnsupportedCollection, got {:?}", other),
    }

    let stable: BTreeMap<String, i32> = unstable.into_iter().collect();
    let bytes = scheme.serialize(&stable, &ctx).unwrap();
    let back: BTreeMap<String, i32> = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert_eq!(back, stable);
}

#[test]
fn test_duplicate_map_keys_rejected_on_write() {
    let (scheme, ctx) = setup();
    let entries = Value::Map(vec![
        (Value::String("a".into()), Value::I32(1)),
        (Value::String("a".into()), Value::I32(2)),
    ]);
    let err = scheme
        .serialize_value(&entries, &sorted_map_of_int(), &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("duplicate key"), "{}", err);
}

#[test]
fn test_duplicate_map_keys_rejected_on_read() {
    let (scheme, ctx) = setup();
    let entries = Value::Map(vec![
        (Value::String("x".into()), Value::I32(1)),
        (Value::String("y".into()), Value::I32(2)),
    ]);
    let mut bytes = scheme
        .serialize_value(&entries, &sorted_map_of_int(), &ctx)
        .unwrap()
        .into_vec();

    // rename key "y" to "x" in place
    let key_y = [0xb1, 1, 0, 0, 0, b'y'];
    let at = bytes
        .windows(key_y.len())
        .position(|w| w == key_y)
        .unwrap();
    bytes[at + key_y.len() - 1] = b'x';

    let err = scheme
        .deserialize::<BTreeMap<String, i32>>(&bytes, &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("duplicate key"), "{}", err);
}

#[test]
fn test_duplicate_keys_rejected_by_typed_map() {
    let entries = Value::Map(vec![
        (Value::String("a".into()), Value::I32(1)),
        (Value::String("a".into()), Value::I32(2)),
    ]);
    let err = ValueReader::new()
        .read::<BTreeMap<String, i32>>(&entries)
        .unwrap_err();
    assert!(err.to_string().contains("duplicate"), "{}", err);
}

#[test]
fn test_duplicate_set_elements_rejected_on_write() {
    let (scheme, ctx) = setup();
    let set = TypeIdentifier::collection(
        CollectionKind::Set,
        vec![TypeIdentifier::Primitive(Primitive::Int)],
    );
    let items = Value::List(vec![Value::I32(3), Value::I32(4), Value::I32(3)]);
    let err = scheme.serialize_value(&items, &set, &ctx).unwrap_err();
    assert!(err.to_string().contains("duplicate element"), "{}", err);
}

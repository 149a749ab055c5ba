// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Framing, compression policy and descriptor stability.

use ledger_wire::config::{HEADER_LEN, MAGIC, MAJOR_VERSION, SECTION_DATA_AND_STOP, SECTION_ENCODING};
use ledger_wire::{
    AllEncodings, CodecConfig, Encoding, EncodingSet, Envelope, Error, NoEncodings, Serializable,
    SequentialFingerprinter, SerializationContext, SerializationScheme, TypeRegistry, UseCase,
};
use std::sync::Arc;

#[derive(Debug, PartialEq, Serializable)]
#[ledger(name = "demo.Batch")]
struct Batch {
    id: u32,
    lines: Vec<String>,
}

fn batch() -> Batch {
    Batch {
        id: 11,
        lines: (0..64).map(|i| format!("settlement instruction {}", i % 4)).collect(),
    }
}

fn context(scheme: &SerializationScheme) -> SerializationContext {
    scheme.context(UseCase::Storage, Arc::new(TypeRegistry::new()))
}

#[test]
fn test_header_layout() {
    let scheme = SerializationScheme::default();
    let bytes = scheme.serialize(&batch(), &context(&scheme)).unwrap();
    let bytes = bytes.as_bytes();
    assert_eq!(&bytes[..MAGIC.len()], &MAGIC);
    assert_eq!(bytes[MAGIC.len()], MAJOR_VERSION);
    assert_eq!(bytes[HEADER_LEN], SECTION_DATA_AND_STOP);
}

#[test]
fn test_every_available_encoding_round_trips() {
    let scheme = SerializationScheme::default();
    let plain = scheme.serialize(&batch(), &context(&scheme)).unwrap();
    for encoding in Encoding::ALL.into_iter().filter(|e| e.is_available()) {
        let ctx = context(&scheme).with_encoding(Some(encoding));
        let bytes = scheme.serialize(&batch(), &ctx).unwrap();
        assert_eq!(bytes.as_bytes()[HEADER_LEN], SECTION_ENCODING);
        assert_eq!(bytes.as_bytes()[HEADER_LEN + 1], encoding.as_byte());
        assert!(bytes.len() < plain.len(), "{} did not shrink the payload", encoding);

        let back: Batch = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
        assert_eq!(back, batch());
    }
}

#[test]
fn test_encoding_refused_by_policy() {
    let scheme = SerializationScheme::default();
    let ctx = context(&scheme).with_encoding(Some(Encoding::Gzip));
    let bytes = scheme.serialize(&batch(), &ctx).unwrap();

    let closed = context(&scheme).with_encoding_whitelist(Arc::new(NoEncodings));
    match scheme.deserialize::<Batch>(bytes.as_bytes(), &closed) {
        Err(Error::EncodingNotPermitted(encoding)) => assert_eq!(encoding, Encoding::Gzip),
        other => panic!("expected EncodingNotPermitted, got {:?}", other),
    }

    let deflate_only =
        context(&scheme).with_encoding_whitelist(Arc::new(EncodingSet::new([Encoding::Deflate])));
    assert!(matches!(
        scheme.deserialize::<Batch>(bytes.as_bytes(), &deflate_only),
        Err(Error::EncodingNotPermitted(Encoding::Gzip))
    ));

    let gzip_ok =
        context(&scheme).with_encoding_whitelist(Arc::new(EncodingSet::new([Encoding::Gzip])));
    assert_eq!(
        scheme.deserialize::<Batch>(bytes.as_bytes(), &gzip_ok).unwrap(),
        batch()
    );
}

#[test]
fn test_inflated_size_bounded_by_config() {
    let sender = SerializationScheme::default();
    let ctx = context(&sender).with_encoding(Some(Encoding::Gzip));
    let bytes = sender.serialize(&batch(), &ctx).unwrap();

    let receiver = SerializationScheme::new(CodecConfig::default().with_max_inflated_size(64));
    let err = receiver
        .deserialize::<Batch>(bytes.as_bytes(), &context(&receiver))
        .unwrap_err();
    assert!(
        matches!(err, Error::Compression { encoding: Encoding::Gzip, .. }),
        "{}",
        err
    );
}

#[test]
fn test_uncompressed_payload_ignores_encoding_policy() {
    let scheme = SerializationScheme::default();
    let bytes = scheme.serialize(&batch(), &context(&scheme)).unwrap();
    let closed = context(&scheme).with_encoding_whitelist(Arc::new(NoEncodings));
    assert_eq!(
        scheme.deserialize::<Batch>(bytes.as_bytes(), &closed).unwrap(),
        batch()
    );
}

#[test]
fn test_bad_magic_rejected() {
    let scheme = SerializationScheme::default();
    let mut bytes = scheme.serialize(&batch(), &context(&scheme)).unwrap().into_vec();
    bytes[0] ^= 0xff;
    let err = scheme
        .deserialize::<Batch>(&bytes, &context(&scheme))
        .unwrap_err();
    assert!(matches!(err, Error::Decode { offset: 0, .. }), "{}", err);
}

#[test]
fn test_unknown_major_version_rejected() {
    let scheme = SerializationScheme::default();
    let mut bytes = scheme.serialize(&batch(), &context(&scheme)).unwrap().into_vec();
    bytes[MAGIC.len()] = MAJOR_VERSION + 1;
    let err = scheme
        .deserialize::<Batch>(&bytes, &context(&scheme))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownFormatVersion { .. }), "{}", err);
}

#[test]
fn test_truncated_and_padded_payloads_rejected() {
    let scheme = SerializationScheme::default();
    let bytes = scheme.serialize(&batch(), &context(&scheme)).unwrap().into_vec();

    let truncated = &bytes[..bytes.len() - 3];
    let err = scheme
        .deserialize::<Batch>(truncated, &context(&scheme))
        .unwrap_err();
    assert!(err.is_decode_failure(), "{}", err);

    let mut padded = bytes.clone();
    padded.push(0x40);
    let err = scheme
        .deserialize::<Batch>(&padded, &context(&scheme))
        .unwrap_err();
    assert!(err.to_string().contains("trailing"), "{}", err);

    let err = scheme
        .deserialize::<Batch>(&bytes[..4], &context(&scheme))
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }), "{}", err);
}

#[test]
fn test_descriptors_stable_across_schemes_and_registries() {
    let descriptor = || {
        let scheme = SerializationScheme::default();
        let ctx = context(&scheme);
        let bytes = scheme.serialize(&batch(), &ctx).unwrap();
        let (envelope, _) = Envelope::read(bytes.as_bytes(), &AllEncodings, 64).unwrap();
        envelope
            .schema
            .find_by_name("demo.Batch")
            .map(|t| t.descriptor().name.clone())
            .unwrap()
    };
    let first = descriptor();
    assert!(first.starts_with("net.ledger:"));
    assert_eq!(first, descriptor());
}

#[test]
fn test_sequential_fingerprints_round_trip() {
    let scheme =
        SerializationScheme::default().with_fingerprinter(Arc::new(SequentialFingerprinter::new()));
    let ctx = context(&scheme);
    let bytes = scheme.serialize(&batch(), &ctx).unwrap();
    let back: Batch = scheme.deserialize(bytes.as_bytes(), &ctx).unwrap();
    assert_eq!(back, batch());
}

#[cfg(feature = "schema-json")]
#[test]
fn test_schema_dumps_as_json() {
    let scheme = SerializationScheme::default();
    let ctx = context(&scheme);
    let bytes = scheme.serialize(&batch(), &ctx).unwrap();
    let decoded = scheme
        .deserialize_and_return_envelope::<Batch>(bytes.as_bytes(), &ctx)
        .unwrap();
    let json = decoded.envelope.schema.to_json().unwrap();
    assert!(json.contains("demo.Batch"));
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for the codec.
//!
//! Every failure surfaced by the crate is a variant of [`Error`], so callers
//! can tell a policy refusal (`EncodingNotPermitted`) apart from corrupt data
//! (`Decode`, `HashMismatch`) and from registry misconfiguration
//! (`IllegalCustomSerializer`, `DuplicateCustomSerializer`).

use crate::wire::Encoding;
use std::fmt;

/// Structured "cannot serialize" failure carrying the chain of types that
/// were being processed when it happened, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotSerializableDetail {
    pub class_hierarchy: Vec<String>,
    pub message: String,
}

impl NotSerializableDetail {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_hierarchy: vec![type_name.into()],
            message: message.into(),
        }
    }

    /// Innermost type the failure originated in.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.class_hierarchy.last().map(String::as_str)
    }
}

impl fmt::Display for NotSerializableDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.class_hierarchy {
            write!(f, "{} -> ", name)?;
        }
        write!(f, "{}", self.message)
    }
}

#[derive(Debug)]
pub enum Error {
    /// General failure with a flattened `A -> B -> cause` chain.
    NotSerializable(String),
    /// General failure with a structured class hierarchy.
    NotSerializableDetailed(NotSerializableDetail),
    IllegalCustomSerializer {
        type_name: String,
        reason: String,
    },
    DuplicateCustomSerializer {
        type_name: String,
        serializers: Vec<String>,
    },
    /// Strict-mode evolution mismatch.
    Evolution {
        type_name: String,
        reason: String,
    },
    /// A schema entry's descriptor disagrees with the fingerprint recomputed
    /// from its own structure.
    HashMismatch {
        type_name: String,
        expected: String,
        actual: String,
    },
    EncodingNotPermitted(Encoding),
    UnsupportedCollection {
        type_name: String,
        suggestion: String,
    },
    UnknownFormatVersion {
        major: u8,
        minor: u16,
    },
    CarpentryDisabled {
        type_name: String,
    },
    Decode {
        offset: usize,
        reason: String,
    },
    Compression {
        encoding: Encoding,
        reason: String,
    },
}

impl Error {
    pub fn not_serializable(message: impl Into<String>) -> Self {
        Error::NotSerializable(message.into())
    }

    pub fn detailed(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::NotSerializableDetailed(NotSerializableDetail::new(type_name, message))
    }

    pub fn evolution(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Evolution {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub fn decode(offset: usize, reason: impl Into<String>) -> Self {
        Error::Decode {
            offset,
            reason: reason.into(),
        }
    }

    /// Prefix the failure with the type that was being processed.
    ///
    /// Only the two `NotSerializable` flavours accumulate context; every
    /// other kind is returned untouched so callers can still match on it.
    #[must_use]
    pub fn in_context(self, type_name: &str) -> Self {
        match self {
            Error::NotSerializable(message) => {
                Error::NotSerializable(format!("{} -> {}", type_name, message))
            }
            Error::NotSerializableDetailed(mut detail) => {
                if detail.class_hierarchy.first().map(String::as_str) != Some(type_name) {
                    detail.class_hierarchy.insert(0, type_name.to_string());
                }
                Error::NotSerializableDetailed(detail)
            }
            other => other,
        }
    }

    /// True for every variant that denotes "this payload cannot be decoded".
    #[must_use]
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Error::NotSerializable(_)
                | Error::NotSerializableDetailed(_)
                | Error::Decode { .. }
                | Error::HashMismatch { .. }
                | Error::UnknownFormatVersion { .. }
                | Error::Evolution { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotSerializable(message) => write!(f, "not serializable: {}", message),
            Error::NotSerializableDetailed(detail) => write!(f, "not serializable: {}", detail),
            Error::IllegalCustomSerializer { type_name, reason } => {
                write!(f, "illegal custom serializer for {}: {}", type_name, reason)
            }
            Error::DuplicateCustomSerializer {
                type_name,
                serializers,
            } => write!(
                f,
                "multiple custom serializers apply to {}: [{}]",
                type_name,
                serializers.join(", ")
            ),
            Error::Evolution { type_name, reason } => {
                write!(f, "cannot evolve {}: {}", type_name, reason)
            }
            Error::HashMismatch {
                type_name,
                expected,
                actual,
            } => write!(
                f,
                "fingerprint mismatch for {}: descriptor {} but structure hashes to {}",
                type_name, expected, actual
            ),
            Error::EncodingNotPermitted(encoding) => {
                write!(f, "encoding {} is not permitted by policy", encoding)
            }
            Error::UnsupportedCollection {
                type_name,
                suggestion,
            } => write!(
                f,
                "unable to serialize unstable collection type {}; suggested fix: use {}",
                type_name, suggestion
            ),
            Error::UnknownFormatVersion { major, minor } => {
                write!(f, "unsupported format version {}.{}", major, minor)
            }
            Error::CarpentryDisabled { type_name } => write!(
                f,
                "type {} is not known locally and type synthesis is disabled",
                type_name
            ),
            Error::Decode { offset, reason } => {
                write!(f, "decode failed at offset {}: {}", offset, reason)
            }
            Error::Compression { encoding, reason } => {
                write!(f, "{} stream failed: {}", encoding, reason)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_chain_is_outermost_first() {
        let err = Error::not_serializable("root cause")
            .in_context("C")
            .in_context("B")
            .in_context("A");
        assert_eq!(err.to_string(), "not serializable: A -> B -> C -> root cause");
    }

    #[test]
    fn test_detailed_hierarchy_is_structured() {
        let err = Error::detailed("Inner", "bad property")
            .in_context("Middle")
            .in_context("Outer");
        match err {
            Error::NotSerializableDetailed(detail) => {
                assert_eq!(detail.class_hierarchy, vec!["Outer", "Middle", "Inner"]);
                assert_eq!(detail.origin(), Some("Inner"));
                assert_eq!(detail.message, "bad property");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_context_does_not_duplicate_origin() {
        let err = Error::detailed("Inner", "x").in_context("Inner");
        match err {
            Error::NotSerializableDetailed(detail) => assert_eq!(detail.class_hierarchy.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_policy_refusal_is_not_a_decode_failure() {
        assert!(!Error::EncodingNotPermitted(Encoding::Deflate).is_decode_failure());
        assert!(Error::decode(3, "truncated").is_decode_failure());
    }
}

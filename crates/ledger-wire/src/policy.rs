// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Policies supplied by the embedding application: which types may be
//! serialized structurally, and which compression encodings a receiver will
//! open.

use crate::wire::Encoding;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Type whitelist consulted before structurally serializing a type that has
/// neither a custom serializer nor the always-serializable marker.
pub trait ClassWhitelist: Send + Sync + fmt::Debug {
    fn has_listed(&self, type_name: &str) -> bool;

    /// Stable identity of this policy instance, part of the factory cache key.
    fn policy_id(&self) -> String;
}

/// Accepts every type.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllWhitelist;

impl ClassWhitelist for AllWhitelist {
    fn has_listed(&self, _type_name: &str) -> bool {
        true
    }

    fn policy_id(&self) -> String {
        "all".into()
    }
}

/// Accepts nothing; only always-serializable and custom-serialized types pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyWhitelist;

impl ClassWhitelist for EmptyWhitelist {
    fn has_listed(&self, _type_name: &str) -> bool {
        false
    }

    fn policy_id(&self) -> String {
        "empty".into()
    }
}

static NEXT_WHITELIST_ID: AtomicU64 = AtomicU64::new(1);

/// Explicit set of accepted type names. Each instance is its own trust
/// domain, even when two instances list the same names.
#[derive(Debug)]
pub struct NamedWhitelist {
    id: u64,
    names: BTreeSet<String>,
}

impl NamedWhitelist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: NEXT_WHITELIST_ID.fetch_add(1, Ordering::Relaxed),
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ClassWhitelist for NamedWhitelist {
    fn has_listed(&self, type_name: &str) -> bool {
        self.names.contains(type_name)
    }

    fn policy_id(&self) -> String {
        format!("named-{}", self.id)
    }
}

/// Encodings a receiver is willing to decompress.
pub trait EncodingWhitelist: Send + Sync + fmt::Debug {
    fn accepts(&self, encoding: Encoding) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllEncodings;

impl EncodingWhitelist for AllEncodings {
    fn accepts(&self, _encoding: Encoding) -> bool {
        true
    }
}

/// Uncompressed payloads only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEncodings;

impl EncodingWhitelist for NoEncodings {
    fn accepts(&self, _encoding: Encoding) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default)]
pub struct EncodingSet {
    accepted: BTreeSet<Encoding>,
}

impl EncodingSet {
    pub fn new(accepted: impl IntoIterator<Item = Encoding>) -> Self {
        Self {
            accepted: accepted.into_iter().collect(),
        }
    }
}

impl EncodingWhitelist for EncodingSet {
    fn accepts(&self, encoding: Encoding) -> bool {
        self.accepted.contains(&encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_whitelists_are_distinct_domains() {
        let a = NamedWhitelist::new(["Trade"]);
        let b = NamedWhitelist::new(["Trade"]);
        assert!(a.has_listed("Trade"));
        assert!(!a.has_listed("Cash"));
        assert_ne!(a.policy_id(), b.policy_id());
        assert_eq!(AllWhitelist.policy_id(), AllWhitelist.policy_id());
    }

    #[test]
    fn test_encoding_set() {
        let set = EncodingSet::new([Encoding::Lz4]);
        assert!(set.accepts(Encoding::Lz4));
        assert!(!set.accepts(Encoding::Gzip));
        assert!(AllEncodings.accepts(Encoding::Gzip));
        assert!(!NoEncodings.accepts(Encoding::Deflate));
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-call serialization context.
//!
//! A [`SerializationContext`] carries the policy a caller applies to one
//! `serialize`/`deserialize` invocation: which registry types are resolved
//! against, which types and encodings are trusted, and free-form properties
//! read by custom serializers.

use crate::config::CodecConfig;
use crate::model::TypeRegistry;
use crate::policy::{AllEncodings, AllWhitelist, ClassWhitelist, EncodingWhitelist};
use crate::wire::Encoding;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Property read by the failure-report serializer.
pub const INCLUDE_EXTENDED_DIAGNOSTICS: &str = "include_extended_diagnostics";

/// Purpose of the bytes being produced or consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseCase {
    P2P,
    RpcServer,
    RpcClient,
    Storage,
    Checkpoint,
    Testing,
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UseCase::P2P => "p2p",
            UseCase::RpcServer => "rpc-server",
            UseCase::RpcClient => "rpc-client",
            UseCase::Storage => "storage",
            UseCase::Checkpoint => "checkpoint",
            UseCase::Testing => "testing",
        };
        f.write_str(name)
    }
}

/// How remote fields with no local target are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvolutionMode {
    /// Unmatched remote fields fail the read.
    Strict,
    /// Unmatched remote fields are dropped. Diagnostic tooling only.
    Lenient,
}

#[derive(Clone)]
pub struct SerializationContext {
    pub use_case: UseCase,
    pub object_references_enabled: bool,
    /// Resolves wire names to declarations (the "classloader").
    pub registry: Arc<TypeRegistry>,
    pub whitelist: Arc<dyn ClassWhitelist>,
    /// Compression applied when writing.
    pub encoding: Option<Encoding>,
    /// Encodings honored when reading.
    pub encoding_whitelist: Arc<dyn EncodingWhitelist>,
    pub properties: BTreeMap<String, String>,
    pub evolution_mode: EvolutionMode,
    pub carpenter_enabled: bool,
}

impl SerializationContext {
    /// Context with permissive policies, strict evolution and carpentry on.
    pub fn new(use_case: UseCase, registry: Arc<TypeRegistry>) -> Self {
        Self {
            use_case,
            object_references_enabled: true,
            registry,
            whitelist: Arc::new(AllWhitelist),
            encoding: None,
            encoding_whitelist: Arc::new(AllEncodings),
            properties: BTreeMap::new(),
            evolution_mode: EvolutionMode::Strict,
            carpenter_enabled: true,
        }
    }

    /// Context whose evolution mode and carpentry switch follow `config`.
    pub fn for_config(use_case: UseCase, registry: Arc<TypeRegistry>, config: &CodecConfig) -> Self {
        let mode = if config.strict_evolution {
            EvolutionMode::Strict
        } else {
            EvolutionMode::Lenient
        };
        Self::new(use_case, registry)
            .with_evolution_mode(mode)
            .with_carpenter(config.carpenter_enabled)
    }

    pub fn with_whitelist(mut self, whitelist: Arc<dyn ClassWhitelist>) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn with_encoding(mut self, encoding: Option<Encoding>) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_encoding_whitelist(mut self, whitelist: Arc<dyn EncodingWhitelist>) -> Self {
        self.encoding_whitelist = whitelist;
        self
    }

    pub fn with_object_references(mut self, enabled: bool) -> Self {
        self.object_references_enabled = enabled;
        self
    }

    pub fn with_evolution_mode(mut self, mode: EvolutionMode) -> Self {
        self.evolution_mode = mode;
        self
    }

    pub fn with_carpenter(mut self, enabled: bool) -> Self {
        self.carpenter_enabled = enabled;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// True when `key` is set to `true` (case-insensitive).
    pub fn flag(&self, key: &str) -> bool {
        self.property(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

impl fmt::Debug for SerializationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationContext")
            .field("use_case", &self.use_case)
            .field("object_references_enabled", &self.object_references_enabled)
            .field("registry", &self.registry.id())
            .field("whitelist", &self.whitelist.policy_id())
            .field("encoding", &self.encoding)
            .field("evolution_mode", &self.evolution_mode)
            .field("carpenter_enabled", &self.carpenter_enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_parsing() {
        let ctx = SerializationContext::new(UseCase::Testing, Arc::new(TypeRegistry::new()))
            .with_property(INCLUDE_EXTENDED_DIAGNOSTICS, "TRUE")
            .with_property("other", "yes");
        assert!(ctx.flag(INCLUDE_EXTENDED_DIAGNOSTICS));
        assert!(!ctx.flag("other"));
        assert!(!ctx.flag("missing"));
    }

    #[test]
    fn test_config_drives_mode() {
        let config = CodecConfig::default()
            .with_strict_evolution(false)
            .with_carpenter(false);
        let ctx = SerializationContext::for_config(
            UseCase::Storage,
            Arc::new(TypeRegistry::new()),
            &config,
        );
        assert_eq!(ctx.evolution_mode, EvolutionMode::Lenient);
        assert!(!ctx.carpenter_enabled);
    }
}

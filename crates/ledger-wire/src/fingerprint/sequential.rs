// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Diagnostic fingerprinter handing out `0`, `1`, `2`, ... per distinct type
//! name, in first-request order.

use super::{Fingerprint, LocalLookup, TypeFingerprinter};
use crate::model::{LocalTypeInformation, RemoteTypeCatalogue, RemoteTypeInformation};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SequentialFingerprinter {
    assigned: Mutex<HashMap<String, u64>>,
}

impl SequentialFingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    fn token(&self, name: String) -> Fingerprint {
        let mut assigned = self.assigned.lock();
        let next = assigned.len() as u64;
        let value = *assigned.entry(name).or_insert(next);
        Fingerprint::new(value.to_string())
    }

    pub fn assigned(&self) -> usize {
        self.assigned.lock().len()
    }
}

impl TypeFingerprinter for SequentialFingerprinter {
    fn local(&self, info: &LocalTypeInformation, _lookup: &dyn LocalLookup) -> Fingerprint {
        self.token(info.type_id().name())
    }

    fn remote(&self, info: &RemoteTypeInformation, _catalogue: &RemoteTypeCatalogue) -> Fingerprint {
        self.token(info.type_id().name())
    }

    fn verifies_descriptors(&self) -> bool {
        false
    }
}

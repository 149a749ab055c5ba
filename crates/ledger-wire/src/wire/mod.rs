// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary layer: cursors, tagged values, compression and framing.

mod cursor;
mod encoding;
mod envelope;
mod value;

pub use cursor::{WireReader, WireWriter};
pub use encoding::Encoding;
pub use envelope::{read_header, Envelope};
pub use value::{tag, WireDescriptor, WireValue};

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{
    nullable, FingerprintWriter, LocalLookup, ALREADY_SEEN, ANY_TYPE, ARRAY, ENUM, INTERFACE,
    UNKNOWN,
};
use crate::model::{LocalTypeInformation, TypeIdentifier};

pub(super) fn write_local(
    writer: &mut FingerprintWriter,
    info: &LocalTypeInformation,
    lookup: &dyn LocalLookup,
) {
    let type_id = info.type_id();
    if !type_id.is_open() && !type_id.is_primitive() {
        if let Some(descriptor) = lookup.custom_descriptor(&type_id) {
            writer.write(&descriptor);
            return;
        }
    }

    match info {
        LocalTypeInformation::Top => writer.write(ANY_TYPE),
        LocalTypeInformation::Unknown => writer.write(UNKNOWN),
        LocalTypeInformation::Primitive(p) => writer.write(p.name()),
        LocalTypeInformation::Cycle(id) => match lookup.resolve(id) {
            Some(resolved) if !matches!(resolved.as_ref(), LocalTypeInformation::Cycle(_)) => {
                write_local(writer, &resolved, lookup)
            }
            _ => {
                writer.write(&id.name());
                writer.write(ALREADY_SEEN);
            }
        },
        LocalTypeInformation::Composable(composable) => {
            let name = composable.type_id.name();
            if !writer.first_visit(&name) {
                writer.write(&name);
                writer.write(ALREADY_SEEN);
                return;
            }
            writer.write(&name);
            for property in &composable.properties {
                write_local(writer, &property.type_info, lookup);
                writer.write(&property.name);
                writer.write(nullable(property.mandatory));
            }
            for interface in &composable.interfaces {
                writer.write(&interface.name());
                writer.write(INTERFACE);
            }
        }
        LocalTypeInformation::NonComposable { type_id, .. } => writer.write(&type_id.name()),
        LocalTypeInformation::AnInterface {
            type_id,
            interfaces,
        } => {
            writer.write(&type_id.name());
            writer.write(INTERFACE);
            for interface in interfaces {
                writer.write(&interface.name());
            }
        }
        LocalTypeInformation::AnEnum {
            type_id, constants, ..
        } => {
            for constant in constants {
                writer.write(constant);
            }
            writer.write(&type_id.name());
            writer.write(ENUM);
        }
        LocalTypeInformation::ACollection { kind, element, .. } => {
            writer.write(kind.name());
            write_local(writer, element, lookup);
        }
        LocalTypeInformation::AMap {
            kind, key, value, ..
        } => {
            writer.write(kind.name());
            write_local(writer, key, lookup);
            write_local(writer, value, lookup);
        }
        LocalTypeInformation::AnArray { type_id, component } => {
            if let TypeIdentifier::PrimitiveArrayOf(_) = type_id {
                writer.write(&type_id.name());
            } else {
                write_local(writer, component, lookup);
            }
            writer.write(ARRAY);
        }
    }
}

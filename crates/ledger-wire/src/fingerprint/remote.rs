// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{nullable, FingerprintWriter, ALREADY_SEEN, ANY_TYPE, ARRAY, ENUM, INTERFACE, UNKNOWN};
use crate::model::{RemoteTypeCatalogue, RemoteTypeInformation, TypeIdentifier};

pub(super) fn write_remote(
    writer: &mut FingerprintWriter,
    info: &RemoteTypeInformation,
    catalogue: &RemoteTypeCatalogue,
) {
    match info {
        RemoteTypeInformation::Custom { descriptor, .. } => writer.write(descriptor),
        RemoteTypeInformation::Composable {
            type_id,
            properties,
            interfaces,
            ..
        } => {
            let name = type_id.name();
            if !writer.first_visit(&name) {
                writer.write(&name);
                writer.write(ALREADY_SEEN);
                return;
            }
            writer.write(&name);
            for property in properties {
                write_reference(writer, &property.type_id, catalogue);
                writer.write(&property.name);
                writer.write(nullable(property.mandatory));
            }
            for interface in interfaces {
                writer.write(&interface.name());
                writer.write(INTERFACE);
            }
        }
        RemoteTypeInformation::AnEnum {
            type_id, constants, ..
        } => {
            for constant in constants {
                writer.write(constant);
            }
            writer.write(&type_id.name());
            writer.write(ENUM);
        }
        RemoteTypeInformation::AnInterface {
            type_id,
            interfaces,
            ..
        } => {
            writer.write(&type_id.name());
            writer.write(INTERFACE);
            for interface in interfaces {
                writer.write(&interface.name());
            }
        }
        RemoteTypeInformation::ACollection { kind, element, .. } => {
            writer.write(kind.name());
            write_reference(writer, element, catalogue);
        }
        RemoteTypeInformation::AMap {
            kind, key, value, ..
        } => {
            writer.write(kind.name());
            write_reference(writer, key, catalogue);
            write_reference(writer, value, catalogue);
        }
        RemoteTypeInformation::AnArray {
            type_id, component, ..
        } => {
            if let TypeIdentifier::PrimitiveArrayOf(_) = type_id {
                writer.write(&type_id.name());
            } else {
                write_reference(writer, component, catalogue);
            }
            writer.write(ARRAY);
        }
    }
}

fn write_reference(
    writer: &mut FingerprintWriter,
    type_id: &TypeIdentifier,
    catalogue: &RemoteTypeCatalogue,
) {
    match type_id {
        TypeIdentifier::Top => writer.write(ANY_TYPE),
        TypeIdentifier::Unknown => writer.write(UNKNOWN),
        TypeIdentifier::Primitive(p) => writer.write(p.name()),
        TypeIdentifier::PrimitiveArrayOf(_) => {
            writer.write(&type_id.name());
            writer.write(ARRAY);
        }
        other => match catalogue.by_name(&other.name()) {
            Some(info) => write_remote(writer, info, catalogue),
            // interpret() rejects dangling references
            None => writer.write(&other.name()),
        },
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in custom serializers for native types.

use super::{CustomSerializer, ProxySerializer};
use crate::context::{SerializationContext, INCLUDE_EXTENDED_DIAGNOSTICS};
use crate::error::{Error, Result};
use crate::model::{TypeDeclaration, TypeIdentifier, TypeRegistry};
use crate::traits::{mismatch, Serializable, ValueReader, ValueWriter};
use crate::value::{OpaqueValue, Value};
use crate::Serializable as DeriveSerializable;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub(crate) const DURATION: &str = "ledger.Duration";
pub(crate) const SYSTEM_TIME: &str = "ledger.SystemTime";
pub(crate) const FAILURE_REPORT: &str = "ledger.FailureReport";

fn declare_native(registry: &TypeRegistry, name: &str) -> Result<()> {
    if registry.contains(name) {
        return Ok(());
    }
    registry.register(TypeDeclaration::non_composable(
        name,
        "native type with private state",
        "register the built-in custom serializers",
    ))
}

fn read_native<T: Clone + 'static>(value: &Value, expected: &TypeIdentifier) -> Result<T> {
    match value {
        Value::Opaque(opaque) => opaque.downcast_ref::<T>().cloned(),
        _ => None,
    }
    .ok_or_else(|| mismatch(expected, value))
}

// ============================================================================
// Duration
// ============================================================================

#[derive(Debug, Clone, PartialEq, DeriveSerializable)]
#[ledger(name = "ledger.DurationProxy", always_serializable)]
pub struct DurationProxy {
    seconds: u64,
    nanos: u32,
}

impl Serializable for Duration {
    fn type_identifier() -> TypeIdentifier {
        TypeIdentifier::named(DURATION)
    }

    fn declare(registry: &TypeRegistry) -> Result<()> {
        declare_native(registry, DURATION)
    }

    fn to_value(&self, _writer: &mut ValueWriter) -> Result<Value> {
        Ok(Value::Opaque(OpaqueValue::new(Self::type_identifier(), *self)))
    }

    fn from_value(value: &Value, _reader: &mut ValueReader) -> Result<Self> {
        read_native(value, &Self::type_identifier())
    }
}

pub type DurationSerializer = ProxySerializer<Duration, DurationProxy>;

/// `Duration` encoded as whole seconds plus nanoseconds.
pub fn duration_serializer() -> DurationSerializer {
    ProxySerializer::new(
        TypeIdentifier::named(DURATION),
        |d| DurationProxy {
            seconds: d.as_secs(),
            nanos: d.subsec_nanos(),
        },
        |p| {
            if p.nanos >= 1_000_000_000 {
                return Err(Error::not_serializable(format!(
                    "{} nanoseconds out of range",
                    p.nanos
                )));
            }
            Ok(Duration::new(p.seconds, p.nanos))
        },
    )
}

// ============================================================================
// SystemTime
// ============================================================================

/// Seconds relative to the Unix epoch (negative before it) plus a
/// non-negative nanosecond adjustment.
#[derive(Debug, Clone, PartialEq, DeriveSerializable)]
#[ledger(name = "ledger.SystemTimeProxy", always_serializable)]
pub struct SystemTimeProxy {
    epoch_seconds: i64,
    nanos: u32,
}

impl Serializable for SystemTime {
    fn type_identifier() -> TypeIdentifier {
        TypeIdentifier::named(SYSTEM_TIME)
    }

    fn declare(registry: &TypeRegistry) -> Result<()> {
        declare_native(registry, SYSTEM_TIME)
    }

    fn to_value(&self, _writer: &mut ValueWriter) -> Result<Value> {
        Ok(Value::Opaque(OpaqueValue::new(Self::type_identifier(), *self)))
    }

    fn from_value(value: &Value, _reader: &mut ValueReader) -> Result<Self> {
        read_native(value, &Self::type_identifier())
    }
}

fn to_epoch(time: &SystemTime) -> SystemTimeProxy {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => SystemTimeProxy {
            epoch_seconds: after.as_secs() as i64,
            nanos: after.subsec_nanos(),
        },
        Err(before) => {
            let before = before.duration();
            let mut epoch_seconds = -(before.as_secs() as i64);
            let mut nanos = 0;
            if before.subsec_nanos() > 0 {
                epoch_seconds -= 1;
                nanos = 1_000_000_000 - before.subsec_nanos();
            }
            SystemTimeProxy {
                epoch_seconds,
                nanos,
            }
        }
    }
}

fn from_epoch(proxy: SystemTimeProxy) -> Result<SystemTime> {
    let out_of_range = || Error::not_serializable("timestamp out of range");
    if proxy.nanos >= 1_000_000_000 {
        return Err(out_of_range());
    }
    let base = if proxy.epoch_seconds >= 0 {
        UNIX_EPOCH.checked_add(Duration::from_secs(proxy.epoch_seconds as u64))
    } else {
        UNIX_EPOCH.checked_sub(Duration::from_secs(proxy.epoch_seconds.unsigned_abs()))
    };
    base.and_then(|t| t.checked_add(Duration::from_nanos(u64::from(proxy.nanos))))
        .ok_or_else(out_of_range)
}

pub type SystemTimeSerializer = ProxySerializer<SystemTime, SystemTimeProxy>;

pub fn system_time_serializer() -> SystemTimeSerializer {
    ProxySerializer::new(TypeIdentifier::named(SYSTEM_TIME), to_epoch, from_epoch)
}

// ============================================================================
// FailureReport
// ============================================================================

/// Transportable description of a failure.
///
/// The trace is only written when the context sets
/// [`INCLUDE_EXTENDED_DIAGNOSTICS`]; otherwise it reads back empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureReport {
    pub kind: String,
    pub message: String,
    pub trace: Vec<String>,
}

impl FailureReport {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: Vec::new(),
        }
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.trace = trace;
        self
    }
}

impl From<&Error> for FailureReport {
    fn from(err: &Error) -> Self {
        let kind = match err {
            Error::NotSerializable(_) | Error::NotSerializableDetailed(_) => "NotSerializable",
            Error::IllegalCustomSerializer { .. } => "IllegalCustomSerializer",
            Error::DuplicateCustomSerializer { .. } => "DuplicateCustomSerializer",
            Error::Evolution { .. } => "Evolution",
            Error::HashMismatch { .. } => "HashMismatch",
            Error::EncodingNotPermitted(_) => "EncodingNotPermitted",
            Error::UnsupportedCollection { .. } => "UnsupportedCollection",
            Error::UnknownFormatVersion { .. } => "UnknownFormatVersion",
            Error::CarpentryDisabled { .. } => "CarpentryDisabled",
            Error::Decode { .. } => "Decode",
            Error::Compression { .. } => "Compression",
        };
        let trace = match err {
            Error::NotSerializableDetailed(detail) => detail.class_hierarchy.clone(),
            _ => Vec::new(),
        };
        FailureReport::new(kind, err.to_string()).with_trace(trace)
    }
}

impl Serializable for FailureReport {
    fn type_identifier() -> TypeIdentifier {
        TypeIdentifier::named(FAILURE_REPORT)
    }

    fn declare(registry: &TypeRegistry) -> Result<()> {
        declare_native(registry, FAILURE_REPORT)
    }

    fn to_value(&self, _writer: &mut ValueWriter) -> Result<Value> {
        Ok(Value::Opaque(OpaqueValue::new(
            Self::type_identifier(),
            self.clone(),
        )))
    }

    fn from_value(value: &Value, _reader: &mut ValueReader) -> Result<Self> {
        read_native(value, &Self::type_identifier())
    }
}

#[derive(Debug, Clone, PartialEq, DeriveSerializable)]
#[ledger(name = "ledger.FailureReportProxy", always_serializable)]
pub struct FailureReportProxy {
    kind: String,
    message: String,
    trace: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FailureReportSerializer;

impl CustomSerializer for FailureReportSerializer {
    fn type_id(&self) -> TypeIdentifier {
        FailureReport::type_identifier()
    }

    fn proxy_type(&self) -> TypeIdentifier {
        FailureReportProxy::type_identifier()
    }

    fn declare(&self, registry: &TypeRegistry) -> Result<()> {
        FailureReport::declare(registry)?;
        FailureReportProxy::declare(registry)
    }

    fn to_proxy(&self, value: &Value, ctx: &SerializationContext) -> Result<Value> {
        let report: FailureReport = read_native(value, &self.type_id())?;
        let proxy = FailureReportProxy {
            kind: report.kind,
            message: report.message,
            trace: ctx
                .flag(INCLUDE_EXTENDED_DIAGNOSTICS)
                .then_some(report.trace),
        };
        proxy.to_value(&mut ValueWriter::new())
    }

    fn from_proxy(&self, proxy: Value, _ctx: &SerializationContext) -> Result<Value> {
        let proxy = FailureReportProxy::from_value(&proxy, &mut ValueReader::new())?;
        let report = FailureReport {
            kind: proxy.kind,
            message: proxy.message,
            trace: proxy.trace.unwrap_or_default(),
        };
        report.to_value(&mut ValueWriter::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UseCase;
    use std::sync::Arc;

    fn ctx() -> SerializationContext {
        SerializationContext::new(UseCase::Testing, Arc::new(TypeRegistry::new()))
    }

    #[test]
    fn test_duration_proxy_roundtrip() {
        let serializer = duration_serializer();
        let original = Duration::new(90, 5);
        let value = original.to_value(&mut ValueWriter::new()).unwrap();
        let proxy = serializer.to_proxy(&value, &ctx()).unwrap();
        assert_eq!(proxy.as_record().unwrap().get("seconds"), Some(&Value::U64(90)));
        let back = serializer.from_proxy(proxy, &ctx()).unwrap();
        let back = Duration::from_value(&back, &mut ValueReader::new()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_pre_epoch_time() {
        let before = UNIX_EPOCH - Duration::new(10, 250);
        let proxy = to_epoch(&before);
        assert_eq!(proxy.epoch_seconds, -11);
        assert_eq!(proxy.nanos, 999_999_750);
        assert_eq!(from_epoch(proxy).unwrap(), before);
    }

    #[test]
    fn test_failure_trace_requires_flag() {
        let report = FailureReport::new("Boom", "it broke").with_trace(vec!["A".into(), "B".into()]);
        let value = report.to_value(&mut ValueWriter::new()).unwrap();

        let plain = FailureReportSerializer.to_proxy(&value, &ctx()).unwrap();
        assert_eq!(plain.as_record().unwrap().get("trace"), Some(&Value::Null));

        let verbose_ctx = ctx().with_property(INCLUDE_EXTENDED_DIAGNOSTICS, "true");
        let verbose = FailureReportSerializer.to_proxy(&value, &verbose_ctx).unwrap();
        let back = FailureReportSerializer.from_proxy(verbose, &ctx()).unwrap();
        let back = FailureReport::from_value(&back, &mut ValueReader::new()).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_report_from_error() {
        let err = Error::detailed("Inner", "bad").in_context("Outer");
        let report = FailureReport::from(&err);
        assert_eq!(report.kind, "NotSerializable");
        assert_eq!(report.trace, vec!["Outer", "Inner"]);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive values are written untagged by any schema: the wire
//! constructor byte alone identifies them.

use crate::model::Primitive;
use crate::value::Value;
use crate::wire::WireValue;

/// Wire form of a primitive value, `None` for everything else.
pub(crate) fn to_wire(value: &Value) -> Option<WireValue> {
    Some(match value {
        Value::Bool(v) => WireValue::Bool(*v),
        Value::I8(v) => WireValue::Byte(*v),
        Value::U8(v) => WireValue::UByte(*v),
        Value::I16(v) => WireValue::Short(*v),
        Value::U16(v) => WireValue::UShort(*v),
        Value::I32(v) => WireValue::Int(*v),
        Value::U32(v) => WireValue::UInt(*v),
        Value::I64(v) => WireValue::Long(*v),
        Value::U64(v) => WireValue::ULong(*v),
        Value::F32(v) => WireValue::Float(*v),
        Value::F64(v) => WireValue::Double(*v),
        Value::Char(v) => WireValue::Char(*v),
        Value::String(v) => WireValue::String(v.clone()),
        Value::Binary(v) => WireValue::Binary(v.clone()),
        _ => return None,
    })
}

/// Value form of a primitive wire value, `None` for everything else.
pub(crate) fn from_wire(wire: &WireValue) -> Option<Value> {
    Some(match wire {
        WireValue::Bool(v) => Value::Bool(*v),
        WireValue::Byte(v) => Value::I8(*v),
        WireValue::UByte(v) => Value::U8(*v),
        WireValue::Short(v) => Value::I16(*v),
        WireValue::UShort(v) => Value::U16(*v),
        WireValue::Int(v) => Value::I32(*v),
        WireValue::UInt(v) => Value::U32(*v),
        WireValue::Long(v) => Value::I64(*v),
        WireValue::ULong(v) => Value::U64(*v),
        WireValue::Float(v) => Value::F32(*v),
        WireValue::Double(v) => Value::F64(*v),
        WireValue::Char(v) => Value::Char(*v),
        WireValue::String(v) => Value::String(v.clone()),
        WireValue::Binary(v) => Value::Binary(v.clone()),
        _ => return None,
    })
}

/// Whether `value` is an instance of `primitive`.
pub(crate) fn matches(value: &Value, primitive: Primitive) -> bool {
    matches!(
        (value, primitive),
        (Value::Bool(_), Primitive::Boolean)
            | (Value::I8(_), Primitive::Byte)
            | (Value::U8(_), Primitive::UByte)
            | (Value::I16(_), Primitive::Short)
            | (Value::U16(_), Primitive::UShort)
            | (Value::I32(_), Primitive::Int)
            | (Value::U32(_), Primitive::UInt)
            | (Value::I64(_), Primitive::Long)
            | (Value::U64(_), Primitive::ULong)
            | (Value::F32(_), Primitive::Float)
            | (Value::F64(_), Primitive::Double)
            | (Value::Char(_), Primitive::Char)
            | (Value::String(_), Primitive::String)
            | (Value::Binary(_), Primitive::Binary)
    )
}

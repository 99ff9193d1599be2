use std::collections::BTreeMap;

use thiserror::Error;

use crate::payload::{metric, DataType, Metric};
use crate::utils::timestamp;

/// A dynamically typed application value that can be turned into a Sparkplug metric.
///
/// `Null`, `List` and `Map` exist so values from loosely typed sources (such as JSON) can be
/// represented, they have no scalar wire representation and are rejected by [encode].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Boolean(bool),
    Bytes(Vec<u8>),
    Null,
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Metric '{name}' has a value of unsupported kind {kind}")]
pub struct UnsupportedValue {
    pub name: String,
    pub kind: &'static str,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeValueError {
    #[error("Metric has no datatype")]
    MissingDataType,
    #[error("Unknown datatype {0}")]
    UnknownDataType(u32),
    #[error("Unsupported datatype {0:?}")]
    UnsupportedDataType(DataType),
    #[error("Metric value does not match datatype {0:?}")]
    DataTypeMismatch(DataType),
}

fn i32_to_proto(val: i32) -> u32 {
    u32::from_le_bytes(val.to_le_bytes())
}
fn i64_to_proto(val: i64) -> u64 {
    u64::from_le_bytes(val.to_le_bytes())
}
fn proto_to_i32(val: u32) -> i32 {
    i32::from_le_bytes(val.to_le_bytes())
}
fn proto_to_i64(val: u64) -> i64 {
    i64::from_le_bytes(val.to_le_bytes())
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::UInt32(_) => "UInt32",
            Value::UInt64(_) => "UInt64",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::String(_) => "String",
            Value::Boolean(_) => "Boolean",
            Value::Bytes(_) => "Bytes",
            Value::Null => "Null",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    /// The datatype tag this value is encoded with, `None` if it cannot be encoded.
    pub fn datatype(&self) -> Option<DataType> {
        let datatype = match self {
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::UInt32(_) => DataType::UInt32,
            Value::UInt64(_) => DataType::UInt64,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::String(_) => DataType::String,
            Value::Boolean(_) => DataType::Boolean,
            Value::Bytes(_) => DataType::Bytes,
            Value::Null | Value::List(_) | Value::Map(_) => return None,
        };
        Some(datatype)
    }

    pub fn is_supported(&self) -> bool {
        self.datatype().is_some()
    }

    fn into_proto(self) -> Option<(DataType, metric::Value)> {
        let out = match self {
            Value::Int32(v) => (DataType::Int32, metric::Value::IntValue(i32_to_proto(v))),
            Value::Int64(v) => (DataType::Int64, metric::Value::LongValue(i64_to_proto(v))),
            Value::UInt32(v) => (DataType::UInt32, metric::Value::IntValue(v)),
            Value::UInt64(v) => (DataType::UInt64, metric::Value::LongValue(v)),
            Value::Float(v) => (DataType::Float, metric::Value::FloatValue(v)),
            Value::Double(v) => (DataType::Double, metric::Value::DoubleValue(v)),
            Value::String(v) => (DataType::String, metric::Value::StringValue(v)),
            Value::Boolean(v) => (DataType::Boolean, metric::Value::BooleanValue(v)),
            Value::Bytes(v) => (DataType::Bytes, metric::Value::BytesValue(v)),
            Value::Null | Value::List(_) | Value::Map(_) => return None,
        };
        Some(out)
    }

    /// Decode the value of a received metric using its datatype tag.
    ///
    /// A metric flagged as null, or carrying no value, decodes to [Value::Null].
    pub fn try_from_metric(metric: &Metric) -> Result<Self, DecodeValueError> {
        let datatype = metric.datatype.ok_or(DecodeValueError::MissingDataType)?;
        let datatype =
            DataType::try_from(datatype).map_err(|_| DecodeValueError::UnknownDataType(datatype))?;

        let value = match &metric.value {
            Some(value) if metric.is_null != Some(true) => value,
            _ => return Ok(Value::Null),
        };

        let out = match (datatype, value) {
            (DataType::Int8, metric::Value::IntValue(v)) => Value::Int32(*v as u8 as i8 as i32),
            (DataType::Int16, metric::Value::IntValue(v)) => {
                Value::Int32(*v as u16 as i16 as i32)
            }
            (DataType::Int32, metric::Value::IntValue(v)) => Value::Int32(proto_to_i32(*v)),
            (DataType::Int64, metric::Value::LongValue(v)) => Value::Int64(proto_to_i64(*v)),
            (DataType::UInt8, metric::Value::IntValue(v)) => Value::UInt32(*v as u8 as u32),
            (DataType::UInt16, metric::Value::IntValue(v)) => Value::UInt32(*v as u16 as u32),
            (DataType::UInt32, metric::Value::IntValue(v)) => Value::UInt32(*v),
            (DataType::UInt32, metric::Value::LongValue(v)) => Value::UInt64(*v),
            (DataType::UInt64, metric::Value::LongValue(v)) => Value::UInt64(*v),
            (DataType::DateTime, metric::Value::LongValue(v)) => Value::UInt64(*v),
            (DataType::Float, metric::Value::FloatValue(v)) => Value::Float(*v),
            (DataType::Double, metric::Value::DoubleValue(v)) => Value::Double(*v),
            (DataType::Boolean, metric::Value::BooleanValue(v)) => Value::Boolean(*v),
            (
                DataType::String | DataType::Text | DataType::Uuid,
                metric::Value::StringValue(v),
            ) => Value::String(v.clone()),
            (DataType::Bytes | DataType::File, metric::Value::BytesValue(v)) => {
                Value::Bytes(v.clone())
            }
            (
                DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::DateTime
                | DataType::Float
                | DataType::Double
                | DataType::Boolean
                | DataType::String
                | DataType::Text
                | DataType::Uuid
                | DataType::Bytes
                | DataType::File,
                _,
            ) => return Err(DecodeValueError::DataTypeMismatch(datatype)),
            (other, _) => return Err(DecodeValueError::UnsupportedDataType(other)),
        };
        Ok(out)
    }
}

/// Encode a named value into a metric stamped with the current time.
pub fn encode<S: Into<String>>(name: S, value: Value) -> Result<Metric, UnsupportedValue> {
    encode_with_timestamp(name, value, timestamp())
}

/// Encode a named value into a metric with the provided timestamp.
pub fn encode_with_timestamp<S: Into<String>>(
    name: S,
    value: Value,
    timestamp: u64,
) -> Result<Metric, UnsupportedValue> {
    let name = name.into();
    let kind = value.kind();
    let (datatype, value) = match value.into_proto() {
        Some(proto) => proto,
        None => return Err(UnsupportedValue { name, kind }),
    };
    let mut metric = Metric::new();
    metric
        .set_name(name)
        .set_datatype(datatype)
        .set_timestamp(timestamp)
        .set_value(value);
    Ok(metric)
}

macro_rules! impl_from_type_for_value {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Value {
            fn from(value: $type) -> Self {
                Value::$variant(value)
            }
        }
    };
}

impl_from_type_for_value!(i32, Int32);
impl_from_type_for_value!(i64, Int64);
impl_from_type_for_value!(u32, UInt32);
impl_from_type_for_value!(u64, UInt64);
impl_from_type_for_value!(f32, Float);
impl_from_type_for_value!(f64, Double);
impl_from_type_for_value!(String, String);
impl_from_type_for_value!(bool, Boolean);
impl_from_type_for_value!(Vec<u8>, Bytes);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(values) => {
                Value::List(values.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

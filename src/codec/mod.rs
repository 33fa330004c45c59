// src/codec/mod.rs

//! Таблица конвертеров значений атрибутов.
//!
//! Каталог отдаёт значения в «проводном» виде ([`RawValue`]): пары
//! HighPart/LowPart, байтовые строки, битовые маски. Для каждого атрибута
//! таблица подбирает [`Codec`] — пару функций decode/encode, которая
//! переводит их в [`Value`] и обратно.

pub mod convert;
pub mod syntax;
pub mod table;
pub mod time;

use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::models::{ObjectGuid, SecurityIdentifier, WellKnownObject};
use crate::path::DistinguishedName;

pub use convert::Codec;
pub use syntax::AttributeSyntax;
pub use table::CodecTable;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("{codec} codec cannot encode {value}")]
    Unsupported { codec: &'static str, value: String },
    #[error("Unknown name '{name}' for {table}")]
    UnknownName { table: &'static str, name: String },
    #[error("Value out of range for {codec}: {value}")]
    OutOfRange { codec: &'static str, value: String },
    #[error("Invalid value for {codec}: {value}")]
    Invalid { codec: &'static str, value: String },
    #[error("Unknown attribute syntax: {0}")]
    UnknownSyntax(String),
}

// ========================================
// RawValue — значение в представлении каталога
// ========================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    Null,
    Integer(i32),
    /// IADsLargeInteger, собранный из HighPart/LowPart
    LargeInteger(i64),
    Octets(#[serde(with = "hex_bytes")] Vec<u8>),
    Text(String),
    Multi(Vec<RawValue>),
}

impl RawValue {
    /// Собрать из пары HighPart/LowPart; LowPart беззнаковый
    pub fn from_parts(high: i32, low: i32) -> Self {
        RawValue::LargeInteger((i64::from(high) << 32) | i64::from(low as u32))
    }

    pub fn high(&self) -> Option<i32> {
        match self {
            RawValue::LargeInteger(v) => Some((v >> 32) as i32),
            _ => None,
        }
    }

    pub fn low(&self) -> Option<i32> {
        match self {
            RawValue::LargeInteger(v) => Some(*v as i32),
            _ => None,
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        RawValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Целое из любого числового представления, включая текст из LDAP
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Integer(v) => Some(i64::from(*v)),
            RawValue::LargeInteger(v) => Some(*v),
            RawValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Все значения, одиночное или многозначное
    pub fn values(&self) -> Vec<&RawValue> {
        match self {
            RawValue::Null => Vec::new(),
            RawValue::Multi(items) => items.iter().filter(|v| !v.is_null()).collect(),
            other => vec![other],
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => f.write_str("<null>"),
            RawValue::Integer(v) => write!(f, "{}", v),
            RawValue::LargeInteger(v) => write!(f, "{}", v),
            RawValue::Octets(b) => write!(f, "<{}>", hex::encode(b)),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Multi(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim()).map_err(serde::de::Error::custom)
    }
}

// ========================================
// Value — значение для приложения
// ========================================

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Text(String),
    Bytes(Vec<u8>),
    Hex(String),
    DateTime(DateTime<Utc>),
    Interval(TimeDelta),
    Sid(SecurityIdentifier),
    Guid(ObjectGuid),
    Flags(BTreeSet<String>),
    Name(String),
    Dn(DistinguishedName),
    WellKnown(WellKnownObject),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn flags<'a, I: IntoIterator<Item = &'a str>>(names: I) -> Self {
        Value::Flags(names.into_iter().map(str::to_string).collect())
    }

    /// Краткое имя варианта для сообщений об ошибках
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Hex(_) => "hex",
            Value::DateTime(_) => "datetime",
            Value::Interval(_) => "interval",
            Value::Sid(_) => "sid",
            Value::Guid(_) => "guid",
            Value::Flags(_) => "flags",
            Value::Name(_) => "name",
            Value::Dn(_) => "dn",
            Value::WellKnown(_) => "well-known object",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("<null>"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Text(s) | Value::Name(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{}>", hex::encode(b)),
            Value::Hex(h) => write!(f, "<{}>", h),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Interval(d) => write!(f, "{}", d),
            Value::Sid(sid) => write!(f, "{}", sid),
            Value::Guid(guid) => write!(f, "{}", guid),
            Value::Flags(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", names.join(", "))
            }
            Value::Dn(dn) => write!(f, "{}", dn),
            Value::WellKnown(wko) => write!(f, "{}", wko),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

// JSON для CLI: всё, что имеет каноническую строковую форму, уходит строкой
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Text(s) | Value::Name(s) | Value::Hex(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&hex::encode(b)),
            Value::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Value::Interval(d) => serializer.serialize_i64(d.num_seconds()),
            Value::Sid(sid) => serializer.collect_str(sid),
            Value::Guid(guid) => serializer.collect_str(guid),
            Value::Dn(dn) => serializer.serialize_str(dn.as_str()),
            Value::WellKnown(wko) => serializer.collect_str(wko),
            Value::Flags(names) => {
                let mut seq = serializer.serialize_seq(Some(names.len()))?;
                for name in names {
                    seq.serialize_element(name)?;
                }
                seq.end()
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

static STANDARD: Lazy<CodecTable> = Lazy::new(CodecTable::standard);

/// Общая для процесса стандартная таблица
pub fn standard_table() -> &'static CodecTable {
    &STANDARD
}

// src/codec/convert.rs

use std::fmt;
use tracing::debug;

use crate::codec::time;
use crate::codec::{CodecError, RawValue, Value};
use crate::models::{EnumTable, FlagTable, ObjectGuid, SecurityIdentifier, WellKnownObject};
use crate::path::DistinguishedName;

/// Разделитель цепочки objectClass при выводе
pub const BREADCRUMB_SEPARATOR: &str = " > ";

pub type DecodeFn = fn(&RawValue) -> Value;
pub type EncodeFn = fn(&Value) -> Result<RawValue, CodecError>;

/// Пара преобразований decode/encode для одного атрибута или синтаксиса
#[derive(Clone, Copy)]
pub enum Codec {
    /// Значение как есть
    Identity,
    /// FILETIME → дата (pwdLastSet, lastLogon, accountExpires)
    FileTime,
    /// FILETIME-интервал → длительность (maxPwdAge, lockoutDuration)
    Interval,
    LargeInteger,
    /// Generalized Time (whenCreated, whenChanged)
    GeneralizedTime,
    Sid,
    Guid,
    Hex,
    Boolean,
    Flags(FlagTable),
    Enumeration(EnumTable),
    Dn,
    /// objectClass: `top > person > user`
    Breadcrumbs,
    DnWithBinary,
    Custom {
        name: &'static str,
        decode: DecodeFn,
        encode: EncodeFn,
    },
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Flags(table) => write!(f, "Codec::Flags({:?})", table),
            Codec::Enumeration(table) => write!(f, "Codec::Enumeration({:?})", table),
            other => write!(f, "Codec::{}", other.name()),
        }
    }
}

impl Codec {
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Identity => "identity",
            Codec::FileTime => "filetime",
            Codec::Interval => "interval",
            Codec::LargeInteger => "large-integer",
            Codec::GeneralizedTime => "generalized-time",
            Codec::Sid => "sid",
            Codec::Guid => "guid",
            Codec::Hex => "hex",
            Codec::Boolean => "boolean",
            Codec::Flags(_) => "flags",
            Codec::Enumeration(_) => "enumeration",
            Codec::Dn => "dn",
            Codec::Breadcrumbs => "breadcrumbs",
            Codec::DnWithBinary => "dn-with-binary",
            Codec::Custom { name, .. } => *name,
        }
    }

    /// Декодировать значение каталога. Никогда не падает: пустое значение
    /// даёт `Value::Null`, испорченное — тоже `Value::Null`.
    pub fn decode(&self, raw: &RawValue) -> Value {
        match raw {
            RawValue::Null => Value::Null,
            RawValue::Multi(items) if !matches!(self, Codec::Breadcrumbs) => {
                Value::List(items.iter().map(|item| self.decode(item)).collect())
            }
            _ => match self.decode_one(raw) {
                Some(value) => value,
                None => {
                    debug!(codec = self.name(), raw = %raw, "malformed value, decoding to null");
                    Value::Null
                }
            },
        }
    }

    /// Обратное преобразование. Определено для всего, что выдаёт `decode`.
    pub fn encode(&self, value: &Value) -> Result<RawValue, CodecError> {
        match value {
            Value::Null => Ok(RawValue::Null),
            Value::List(items) if !matches!(self, Codec::Breadcrumbs) => items
                .iter()
                .map(|item| self.encode(item))
                .collect::<Result<Vec<_>, _>>()
                .map(RawValue::Multi),
            _ => self.encode_one(value),
        }
    }

    /// Прикладное значение из текста в форме, которую понимает `encode`
    /// (командная строка, конфиг). Флаги перечисляются через запятую.
    pub fn parse_value(&self, text: &str) -> Result<Value, CodecError> {
        let codec = self.name();
        let invalid = || CodecError::Invalid {
            codec,
            value: text.to_string(),
        };
        let text = text.trim();

        // число подходит всем целочисленным кодекам
        let number = text.parse::<i64>().ok();
        match self {
            Codec::FileTime | Codec::GeneralizedTime => match number {
                Some(i) if matches!(self, Codec::FileTime) => Ok(Value::Integer(i)),
                _ => chrono::DateTime::parse_from_rfc3339(text)
                    .map(|dt| Value::DateTime(dt.with_timezone(&chrono::Utc)))
                    .or_else(|_| time::parse_generalized_time(text).map(Value::DateTime).ok_or_else(invalid)),
            },
            Codec::Interval => number
                .map(|secs| Value::Interval(chrono::TimeDelta::seconds(secs)))
                .ok_or_else(invalid),
            Codec::LargeInteger => number.map(Value::Integer).ok_or_else(invalid),
            Codec::Sid => text.parse().map(Value::Sid).map_err(|_| invalid()),
            Codec::Guid => text.parse().map(Value::Guid).map_err(|_| invalid()),
            Codec::Hex => Ok(Value::Hex(text.to_string())),
            Codec::Boolean => match text.to_ascii_uppercase().as_str() {
                "TRUE" | "1" | "YES" => Ok(Value::Boolean(true)),
                "FALSE" | "0" | "NO" => Ok(Value::Boolean(false)),
                _ => Err(invalid()),
            },
            Codec::Flags(_) => Ok(match number {
                Some(i) => Value::Integer(i),
                None => Value::flags(text.split(',').map(str::trim).filter(|s| !s.is_empty())),
            }),
            Codec::Enumeration(_) => Ok(match number {
                Some(i) => Value::Integer(i),
                None => Value::Name(text.to_string()),
            }),
            Codec::Dn => DistinguishedName::parse(text).map(Value::Dn).map_err(|_| invalid()),
            Codec::DnWithBinary => WellKnownObject::parse(text).map(Value::WellKnown).ok_or_else(invalid),
            Codec::Identity | Codec::Breadcrumbs | Codec::Custom { .. } => Ok(match number {
                Some(i) if !matches!(self, Codec::Breadcrumbs) => Value::Integer(i),
                _ => Value::Text(text.to_string()),
            }),
        }
    }

    fn decode_one(&self, raw: &RawValue) -> Option<Value> {
        match self {
            Codec::Identity => Some(match raw {
                RawValue::Integer(i) => Value::Integer(i64::from(*i)),
                RawValue::LargeInteger(i) => Value::Integer(*i),
                RawValue::Octets(b) => Value::Bytes(b.clone()),
                RawValue::Text(s) => Value::Text(s.clone()),
                RawValue::Null | RawValue::Multi(_) => return None,
            }),
            Codec::FileTime => time::ticks_to_datetime(raw.as_i64()?).map(Value::DateTime),
            Codec::Interval => time::ticks_to_interval(raw.as_i64()?).map(Value::Interval),
            Codec::LargeInteger => raw.as_i64().map(Value::Integer),
            Codec::GeneralizedTime => time::parse_generalized_time(raw.as_text()?).map(Value::DateTime),
            Codec::Sid => match raw {
                RawValue::Octets(b) => SecurityIdentifier::from_bytes(b).ok().map(Value::Sid),
                RawValue::Text(s) => s.parse().ok().map(Value::Sid),
                _ => None,
            },
            Codec::Guid => match raw {
                RawValue::Octets(b) => ObjectGuid::from_bytes(b).map(Value::Guid),
                RawValue::Text(s) => s.parse().ok().map(Value::Guid),
                _ => None,
            },
            Codec::Hex => match raw {
                RawValue::Octets(b) => Some(Value::Hex(hex::encode(b))),
                _ => None,
            },
            Codec::Boolean => match raw.as_text()? {
                s if s.eq_ignore_ascii_case("TRUE") => Some(Value::Boolean(true)),
                s if s.eq_ignore_ascii_case("FALSE") => Some(Value::Boolean(false)),
                _ => None,
            },
            Codec::Flags(table) => {
                let bits = to_u32(raw.as_i64()?)?;
                Some(Value::Flags(table.names(bits)))
            }
            Codec::Enumeration(table) => {
                let number = raw.as_i64()?;
                // значение вне таблицы оставляем числом
                match table.name(to_u32(number)?) {
                    Some(name) => Some(Value::Name(name.to_string())),
                    None => Some(Value::Integer(number)),
                }
            }
            Codec::Dn => DistinguishedName::parse(raw.as_text()?).ok().map(Value::Dn),
            Codec::Breadcrumbs => {
                let parts = raw
                    .values()
                    .into_iter()
                    .map(|v| v.as_text())
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::Text(parts.join(BREADCRUMB_SEPARATOR)))
            }
            Codec::DnWithBinary => WellKnownObject::parse(raw.as_text()?).map(Value::WellKnown),
            Codec::Custom { decode, .. } => Some(decode(raw)),
        }
    }

    fn encode_one(&self, value: &Value) -> Result<RawValue, CodecError> {
        let codec = self.name();
        let unsupported = || CodecError::Unsupported {
            codec,
            value: format!("{} value {}", value.kind(), value),
        };
        let out_of_range = || CodecError::OutOfRange {
            codec,
            value: value.to_string(),
        };

        match (self, value) {
            // LargeInteger после decode становится Integer; обратно он сужается до
            // Integer, если помещается в i32
            (Codec::Identity, Value::Integer(i)) => Ok(match i32::try_from(*i) {
                Ok(small) => RawValue::Integer(small),
                Err(_) => RawValue::LargeInteger(*i),
            }),
            (Codec::Identity, Value::Text(s)) => Ok(RawValue::Text(s.clone())),
            (Codec::Identity, Value::Bytes(b)) => Ok(RawValue::Octets(b.clone())),

            (Codec::FileTime, Value::DateTime(dt)) => time::datetime_to_ticks(dt)
                .map(RawValue::LargeInteger)
                .ok_or_else(out_of_range),
            (Codec::FileTime | Codec::Interval | Codec::LargeInteger, Value::Integer(i)) => {
                Ok(RawValue::LargeInteger(*i))
            }
            (Codec::Interval, Value::Interval(d)) => time::interval_to_ticks(d)
                .map(RawValue::LargeInteger)
                .ok_or_else(out_of_range),

            // доли секунды отбрасываются: формат всегда `...SS.0Z`
            (Codec::GeneralizedTime, Value::DateTime(dt)) => {
                Ok(RawValue::Text(time::format_generalized_time(dt)))
            }

            (Codec::Sid, Value::Sid(sid)) => Ok(RawValue::Octets(sid.to_bytes())),
            (Codec::Sid, Value::Text(s)) => s
                .parse::<SecurityIdentifier>()
                .map(|sid| RawValue::Octets(sid.to_bytes()))
                .map_err(|_| CodecError::Invalid { codec, value: s.clone() }),

            (Codec::Guid, Value::Guid(guid)) => Ok(RawValue::Octets(guid.to_bytes().to_vec())),
            (Codec::Guid, Value::Text(s)) => s
                .parse::<ObjectGuid>()
                .map(|guid| RawValue::Octets(guid.to_bytes().to_vec()))
                .map_err(|_| CodecError::Invalid { codec, value: s.clone() }),

            (Codec::Hex, Value::Hex(h)) => hex::decode(h)
                .map(RawValue::Octets)
                .map_err(|_| CodecError::Invalid { codec, value: h.clone() }),
            (Codec::Hex, Value::Bytes(b)) => Ok(RawValue::Octets(b.clone())),

            (Codec::Boolean, Value::Boolean(b)) => {
                Ok(RawValue::text(if *b { "TRUE" } else { "FALSE" }))
            }

            (Codec::Flags(table), Value::Flags(names)) => table
                .bits(names.iter().map(String::as_str))
                .map(|bits| RawValue::Integer(bits as i32))
                .map_err(|name| CodecError::UnknownName {
                    table: flag_table_name(table),
                    name,
                }),
            (Codec::Flags(_) | Codec::Enumeration(_), Value::Integer(i)) => {
                to_u32(*i).map(|bits| RawValue::Integer(bits as i32)).ok_or_else(out_of_range)
            }
            (Codec::Enumeration(table), Value::Name(name)) => table
                .value(name)
                .map(|v| RawValue::Integer(v as i32))
                .ok_or_else(|| CodecError::UnknownName {
                    table: enum_table_name(table),
                    name: name.clone(),
                }),

            (Codec::Dn, Value::Dn(dn)) => Ok(RawValue::Text(dn.as_str().to_string())),
            (Codec::Dn, Value::Text(s)) => DistinguishedName::parse(s)
                .map(|dn| RawValue::Text(dn.as_str().to_string()))
                .map_err(|_| CodecError::Invalid { codec, value: s.clone() }),

            (Codec::Breadcrumbs, Value::Text(s)) => {
                let mut parts: Vec<RawValue> = s.split(BREADCRUMB_SEPARATOR).map(RawValue::text).collect();
                Ok(match parts.len() {
                    1 => parts.remove(0),
                    _ => RawValue::Multi(parts),
                })
            }
            (Codec::Breadcrumbs, Value::List(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Text(s) => Ok(RawValue::Text(s.clone())),
                    _ => Err(unsupported()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(RawValue::Multi),

            (Codec::DnWithBinary, Value::WellKnown(wko)) => Ok(RawValue::Text(wko.to_string())),

            (Codec::Custom { encode, .. }, value) => encode(value),

            _ => Err(unsupported()),
        }
    }
}

/// Битовые маски приходят и как i32 (groupType = -2147483646), и как u32
fn to_u32(value: i64) -> Option<u32> {
    if value < i64::from(i32::MIN) || value > i64::from(u32::MAX) {
        return None;
    }
    Some(value as u32)
}

fn flag_table_name(table: &FlagTable) -> &'static str {
    match table {
        FlagTable::UserAccountControl => "USER_ACCOUNT_CONTROL",
        FlagTable::GroupType => "GROUP_TYPES",
        FlagTable::SystemFlags => "ADS_SYSTEMFLAG",
        FlagTable::AuthenticationFlags => "AUTHENTICATION_TYPES",
    }
}

fn enum_table_name(table: &EnumTable) -> &'static str {
    match table {
        EnumTable::SamAccountType => "SAM_ACCOUNT_TYPES",
        EnumTable::PropertyOperation => "ADS_PROPERTY",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn filetime_decodes_pair() {
        // HighPart/LowPart из IADsLargeInteger
        let raw = RawValue::from_parts(0x01CC_2B6D, 0x2E45_0780u32 as i32);
        let value = Codec::FileTime.decode(&raw);
        let Value::DateTime(dt) = &value else {
            panic!("expected datetime, got {:?}", value);
        };
        assert_eq!(dt.format("%Y").to_string(), "2011");
        assert_eq!(Codec::FileTime.encode(&value).unwrap(), raw);
    }

    #[test]
    fn filetime_from_ldap_text() {
        let value = Codec::FileTime.decode(&RawValue::text("116444736000000000"));
        assert_eq!(value, Value::DateTime(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn malformed_decodes_to_null() {
        assert_eq!(Codec::FileTime.decode(&RawValue::text("soon")), Value::Null);
        assert_eq!(Codec::Sid.decode(&RawValue::Octets(vec![1, 5, 0])), Value::Null);
        assert_eq!(Codec::Guid.decode(&RawValue::Octets(vec![0; 3])), Value::Null);
        assert_eq!(Codec::Boolean.decode(&RawValue::text("maybe")), Value::Null);
        assert_eq!(Codec::Flags(FlagTable::GroupType).decode(&RawValue::text("x")), Value::Null);
    }

    #[test]
    fn multi_values_decode_element_wise() {
        let raw = RawValue::Multi(vec![
            RawValue::text("CN=Admins,DC=corp"),
            RawValue::text("CN=Staff,DC=corp"),
        ]);
        let Value::List(items) = Codec::Dn.decode(&raw) else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(Codec::Dn.encode(&Value::List(items)).unwrap(), raw);
    }

    #[test]
    fn breadcrumbs_join_object_class() {
        let raw = RawValue::Multi(vec![
            RawValue::text("top"),
            RawValue::text("person"),
            RawValue::text("user"),
        ]);
        let value = Codec::Breadcrumbs.decode(&raw);
        assert_eq!(value, Value::Text("top > person > user".to_string()));
        assert_eq!(Codec::Breadcrumbs.encode(&value).unwrap(), raw);
    }

    #[test]
    fn single_breadcrumb_stays_text() {
        let raw = RawValue::text("top");
        let value = Codec::Breadcrumbs.decode(&raw);
        assert_eq!(value, Value::Text("top".to_string()));
        assert_eq!(Codec::Breadcrumbs.encode(&value).unwrap(), raw);
    }

    #[test]
    fn identity_narrows_small_large_integers() {
        let value = Codec::Identity.decode(&RawValue::LargeInteger(5));
        assert_eq!(value, Value::Integer(5));
        assert_eq!(Codec::Identity.encode(&value).unwrap(), RawValue::Integer(5));
        let big = Codec::Identity.decode(&RawValue::LargeInteger(1 << 40));
        assert_eq!(Codec::Identity.encode(&big).unwrap(), RawValue::LargeInteger(1 << 40));
    }

    #[test]
    fn generalized_time_drops_fraction() {
        let value = Codec::GeneralizedTime.decode(&RawValue::text("20240131235959.5Z"));
        let Value::DateTime(dt) = &value else {
            panic!("expected datetime, got {:?}", value);
        };
        assert_eq!(dt.timestamp_subsec_millis(), 500);
        assert_eq!(
            Codec::GeneralizedTime.encode(&value).unwrap(),
            RawValue::text("20240131235959.0Z")
        );
    }

    #[test]
    fn enumeration_keeps_unknown_numbers() {
        let codec = Codec::Enumeration(EnumTable::SamAccountType);
        assert_eq!(
            codec.decode(&RawValue::Integer(0x3000_0001)),
            Value::Name("MACHINE_ACCOUNT".to_string())
        );
        assert_eq!(codec.decode(&RawValue::Integer(7)), Value::Integer(7));
        assert_eq!(codec.encode(&Value::Integer(7)).unwrap(), RawValue::Integer(7));
    }

    #[test]
    fn flags_reject_unknown_names() {
        let codec = Codec::Flags(FlagTable::UserAccountControl);
        let err = codec.encode(&Value::flags(["ACCOUNTDISABLE", "BOGUS"])).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownName {
                table: "USER_ACCOUNT_CONTROL",
                name: "BOGUS".to_string()
            }
        );
    }

    #[test]
    fn wrong_value_kind_is_unsupported() {
        let err = Codec::Sid.encode(&Value::Integer(1)).unwrap_err();
        assert!(matches!(err, CodecError::Unsupported { codec: "sid", .. }));
    }

    #[test]
    fn custom_codec_is_called() {
        fn upper(raw: &RawValue) -> Value {
            Value::Text(raw.as_text().unwrap_or_default().to_uppercase())
        }
        fn lower(value: &Value) -> Result<RawValue, CodecError> {
            Ok(RawValue::text(value.to_string().to_lowercase()))
        }
        let codec = Codec::Custom {
            name: "shout",
            decode: upper,
            encode: lower,
        };
        assert_eq!(codec.decode(&RawValue::text("jdoe")), Value::Text("JDOE".to_string()));
        assert_eq!(codec.encode(&Value::Text("JDOE".into())).unwrap(), RawValue::text("jdoe"));
        assert_eq!(codec.name(), "shout");
    }

    #[test]
    fn parse_value_from_text() {
        assert_eq!(
            Codec::Flags(FlagTable::UserAccountControl).parse_value("NORMAL_ACCOUNT, ACCOUNTDISABLE").unwrap(),
            Value::flags(["ACCOUNTDISABLE", "NORMAL_ACCOUNT"])
        );
        assert_eq!(Codec::Flags(FlagTable::GroupType).parse_value("2").unwrap(), Value::Integer(2));
        assert_eq!(
            Codec::FileTime.parse_value("2030-01-01T00:00:00Z").unwrap(),
            Value::DateTime(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(Codec::Boolean.parse_value("true").unwrap(), Value::Boolean(true));
        assert!(matches!(Codec::Sid.parse_value("S-x"), Err(CodecError::Invalid { .. })));
        assert_eq!(Codec::Identity.parse_value("jdoe").unwrap(), Value::Text("jdoe".into()));
    }
}

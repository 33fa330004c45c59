// src/models/guid.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// GUID объекта AD (objectGUID, schemaIDGUID, msExchMailboxGuid)
///
/// В каталоге хранится 16 байт в порядке Windows: первые три группы
/// little-endian. Строковая форма — `{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectGuid(pub Uuid);

impl ObjectGuid {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; 16] = bytes.try_into().ok()?;
        Some(Self(Uuid::from_bytes_le(raw)))
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_bytes_le()
    }

    /// Форма без разделителей, как в wellKnownObjects (`AA312825768811D1ADED00C04FD8D5CD`)
    pub fn from_packed_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let raw: [u8; 16] = bytes.try_into().ok()?;
        Some(Self(Uuid::from_bytes(raw)))
    }

    pub fn to_packed_hex(&self) -> String {
        hex::encode_upper(self.0.as_bytes())
    }
}

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.hyphenated())
    }
}

impl FromStr for ObjectGuid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Uuid::parse_str понимает и `{...}`, и голую форму
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_windows_byte_order() {
        let bytes = [
            0x25, 0x28, 0x31, 0xAA, 0x88, 0x76, 0xD1, 0x11, 0xAD, 0xED, 0x00, 0xC0, 0x4F, 0xD8,
            0xD5, 0xCD,
        ];
        let guid = ObjectGuid::from_bytes(&bytes).unwrap();
        assert_eq!(guid.to_string(), "{aa312825-7688-11d1-aded-00c04fd8d5cd}");
        assert_eq!(guid.to_bytes(), bytes);
    }

    #[test]
    fn parses_braced_and_plain() {
        let a: ObjectGuid = "{aa312825-7688-11d1-aded-00c04fd8d5cd}".parse().unwrap();
        let b: ObjectGuid = "AA312825-7688-11D1-ADED-00C04FD8D5CD".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_packed_hex(), "AA312825768811D1ADED00C04FD8D5CD");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(ObjectGuid::from_bytes(&[0u8; 15]).is_none());
        assert!(ObjectGuid::from_packed_hex("AA31").is_none());
    }
}

// src/models/well_known.rs

use crate::models::guid::ObjectGuid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// GUID well-known объектов из Active Directory
pub mod guid {
    pub const USERS_CONTAINER: &str = "AA312825768811D1ADED00C04FD8D5CD";
    pub const COMPUTERS_CONTAINER: &str = "AA312826768811D1ADED00C04FD8D5CD";
    pub const SYSTEMS_CONTAINER: &str = "AB1D30F3768811D1ADED00C04FD8D5CD";
    pub const DOMAIN_CONTROLLERS_CONTAINER: &str = "A361B2FFFFD211D1AA4B00C04FD7D83A";
    pub const INFRASTRUCTURE_CONTAINER: &str = "2FBAC1870ADE11D297C400C04FD8D5CD";
    pub const DELETED_OBJECTS_CONTAINER: &str = "18E2EA80684F11D2B9AA00C04F79F805";
    pub const LOST_AND_FOUND_CONTAINER: &str = "AB8153B7768811D1ADED00C04FD8D5CD";
    pub const PROGRAM_DATA_CONTAINER: &str = "09460C08AE1E4A4EA0F64AEE7DAA1E5A";
    pub const FOREIGN_SECURITY_PRINCIPALS_CONTAINER: &str = "22B70C67D56E4EFB91E9300FCA3DC1AA";
}

/// Значение синтаксиса DN-with-Binary (2.5.5.7): `B:32:<GUID>:<DN>`
///
/// Так хранятся wellKnownObjects / otherWellKnownObjects домена.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WellKnownObject {
    pub guid: ObjectGuid,
    pub dn: String,
}

impl WellKnownObject {
    pub fn new(guid: ObjectGuid, dn: impl Into<String>) -> Self {
        Self { guid, dn: dn.into() }
    }

    /// Разобрать `B:<длина>:<hex>:<DN>`; длина — число hex-символов
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.strip_prefix("B:")?;
        let (len, rest) = rest.split_once(':')?;
        let len: usize = len.parse().ok()?;
        if rest.len() < len + 1 || !rest.is_char_boundary(len) {
            return None;
        }
        let (hex, dn) = rest.split_at(len);
        let dn = dn.strip_prefix(':')?;
        let guid = ObjectGuid::from_packed_hex(hex)?;
        Some(Self::new(guid, dn))
    }

    /// Является ли объект одним из стандартных контейнеров домена
    pub fn is_standard_container(&self) -> bool {
        let packed = self.guid.to_packed_hex();
        [
            guid::USERS_CONTAINER,
            guid::COMPUTERS_CONTAINER,
            guid::SYSTEMS_CONTAINER,
            guid::DOMAIN_CONTROLLERS_CONTAINER,
            guid::INFRASTRUCTURE_CONTAINER,
            guid::DELETED_OBJECTS_CONTAINER,
            guid::LOST_AND_FOUND_CONTAINER,
            guid::PROGRAM_DATA_CONTAINER,
            guid::FOREIGN_SECURITY_PRINCIPALS_CONTAINER,
        ]
        .contains(&packed.as_str())
    }
}

impl fmt::Display for WellKnownObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.guid.to_packed_hex();
        write!(f, "B:{}:{}:{}", hex.len(), hex, self.dn)
    }
}

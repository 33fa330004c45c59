// src/models/flags.rs

use bitflags::{Flags, bitflags};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ========================================
// Битовые атрибуты AD
// ========================================

bitflags! {
    /// userAccountControl
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct UserAccountControl: u32 {
        const SCRIPT                                 = 0x0000_0001;
        const ACCOUNTDISABLE                         = 0x0000_0002;
        const HOMEDIR_REQUIRED                       = 0x0000_0008;
        const LOCKOUT                                = 0x0000_0010;
        const PASSWD_NOTREQD                         = 0x0000_0020;
        const PASSWD_CANT_CHANGE                     = 0x0000_0040;
        const ENCRYPTED_TEXT_PASSWORD_ALLOWED        = 0x0000_0080;
        const TEMP_DUPLICATE_ACCOUNT                 = 0x0000_0100;
        const NORMAL_ACCOUNT                         = 0x0000_0200;
        const INTERDOMAIN_TRUST_ACCOUNT              = 0x0000_0800;
        const WORKSTATION_TRUST_ACCOUNT              = 0x0000_1000;
        const SERVER_TRUST_ACCOUNT                   = 0x0000_2000;
        const DONT_EXPIRE_PASSWD                     = 0x0001_0000;
        const MNS_LOGON_ACCOUNT                      = 0x0002_0000;
        const SMARTCARD_REQUIRED                     = 0x0004_0000;
        const TRUSTED_FOR_DELEGATION                 = 0x0008_0000;
        const NOT_DELEGATED                          = 0x0010_0000;
        const USE_DES_KEY_ONLY                       = 0x0020_0000;
        const DONT_REQUIRE_PREAUTH                   = 0x0040_0000;
        const PASSWORD_EXPIRED                       = 0x0080_0000;
        const TRUSTED_TO_AUTHENTICATE_FOR_DELEGATION = 0x0100_0000;
    }
}

bitflags! {
    /// groupType: область действия + SECURITY_ENABLED
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct GroupType: u32 {
        const BUILTIN          = 0x0000_0001;
        const GLOBAL           = 0x0000_0002;
        const DOMAIN_LOCAL     = 0x0000_0004;
        const LOCAL            = 0x0000_0004;
        const UNIVERSAL        = 0x0000_0008;
        const SECURITY_ENABLED = 0x8000_0000;
    }
}

bitflags! {
    /// systemFlags (ADS_SYSTEMFLAG_ENUM); младшие биты зависят от класса объекта
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SystemFlags: u32 {
        const CR_NTDS_NC                = 0x0000_0001;
        const ATTR_NOT_REPLICATED       = 0x0000_0001;
        const CR_NTDS_DOMAIN            = 0x0000_0002;
        const ATTR_IS_CONSTRUCTED       = 0x0000_0004;
        const DOMAIN_DISALLOW_MOVE      = 0x0400_0000;
        const DOMAIN_DISALLOW_RENAME    = 0x0800_0000;
        const CONFIG_ALLOW_LIMITED_MOVE = 0x1000_0000;
        const CONFIG_ALLOW_MOVE         = 0x2000_0000;
        const CONFIG_ALLOW_RENAME       = 0x4000_0000;
        const DISALLOW_DELETE           = 0x8000_0000;
    }
}

bitflags! {
    /// ADS_AUTHENTICATION_ENUM — флаги привязки к каталогу
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AuthenticationFlags: u32 {
        const SECURE_AUTHENTICATION = 0x0000_0001;
        const USE_ENCRYPTION        = 0x0000_0002;
        const USE_SSL               = 0x0000_0002;
        const READONLY_SERVER       = 0x0000_0004;
        const PROMPT_CREDENTIALS    = 0x0000_0008;
        const NO_AUTHENTICATION     = 0x0000_0010;
        const FAST_BIND             = 0x0000_0020;
        const USE_SIGNING           = 0x0000_0040;
        const USE_SEALING           = 0x0000_0080;
        const USE_DELEGATION        = 0x0000_0100;
        const SERVER_BIND           = 0x0000_0200;
        const AUTH_RESERVED         = 0x8000_0000;
    }
}

impl UserAccountControl {
    pub fn is_enabled(&self) -> bool {
        !self.contains(Self::ACCOUNTDISABLE)
    }
}

impl GroupType {
    pub fn is_security_group(&self) -> bool {
        self.contains(Self::SECURITY_ENABLED)
    }

    pub fn scope(&self) -> Option<GroupScope> {
        if self.contains(Self::UNIVERSAL) {
            Some(GroupScope::Universal)
        } else if self.contains(Self::GLOBAL) {
            Some(GroupScope::Global)
        } else if self.contains(Self::DOMAIN_LOCAL) {
            Some(GroupScope::DomainLocal)
        } else {
            None
        }
    }
}

/// Область действия группы
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupScope {
    DomainLocal,
    Global,
    Universal,
}

// ========================================
// Таблицы перечислений
// ========================================

/// Фиксированная таблица битовых флагов, по которой декодируется атрибут
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagTable {
    UserAccountControl,
    GroupType,
    SystemFlags,
    AuthenticationFlags,
}

impl FlagTable {
    /// Имена всех установленных битов; неизвестные биты отбрасываются
    pub fn names(&self, bits: u32) -> BTreeSet<String> {
        match self {
            FlagTable::UserAccountControl => names_of::<UserAccountControl>(bits),
            FlagTable::GroupType => names_of::<GroupType>(bits),
            FlagTable::SystemFlags => names_of::<SystemFlags>(bits),
            FlagTable::AuthenticationFlags => names_of::<AuthenticationFlags>(bits),
        }
    }

    /// Обратное преобразование; `Err` с первым незнакомым именем
    pub fn bits<'a, I>(&self, names: I) -> Result<u32, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            FlagTable::UserAccountControl => bits_of::<UserAccountControl, _>(names),
            FlagTable::GroupType => bits_of::<GroupType, _>(names),
            FlagTable::SystemFlags => bits_of::<SystemFlags, _>(names),
            FlagTable::AuthenticationFlags => bits_of::<AuthenticationFlags, _>(names),
        }
    }

    /// Пары (маска, имя) в порядке объявления, включая синонимы
    pub fn entries(&self) -> Vec<(u32, &'static str)> {
        match self {
            FlagTable::UserAccountControl => entries_of::<UserAccountControl>(),
            FlagTable::GroupType => entries_of::<GroupType>(),
            FlagTable::SystemFlags => entries_of::<SystemFlags>(),
            FlagTable::AuthenticationFlags => entries_of::<AuthenticationFlags>(),
        }
    }

    pub fn from_table_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().replace('-', "_").as_str() {
            "USER_ACCOUNT_CONTROL" | "USERACCOUNTCONTROL" | "UAC" => Some(Self::UserAccountControl),
            "GROUP_TYPES" | "GROUP_TYPE" | "GROUPTYPE" => Some(Self::GroupType),
            "ADS_SYSTEMFLAG" | "SYSTEM_FLAGS" | "SYSTEMFLAGS" => Some(Self::SystemFlags),
            "AUTHENTICATION_TYPES" | "AUTHENTICATION_FLAGS" => Some(Self::AuthenticationFlags),
            _ => None,
        }
    }
}

fn names_of<F: Flags<Bits = u32>>(bits: u32) -> BTreeSet<String> {
    F::from_bits_truncate(bits)
        .iter_names()
        .map(|(name, _)| name.to_string())
        .collect()
}

fn bits_of<'a, F, I>(names: I) -> Result<u32, String>
where
    F: Flags<Bits = u32>,
    I: IntoIterator<Item = &'a str>,
{
    let mut flags = F::empty();
    for name in names {
        let flag = F::from_name(name).ok_or_else(|| name.to_string())?;
        flags.insert(flag);
    }
    Ok(flags.bits())
}

fn entries_of<F: Flags<Bits = u32>>() -> Vec<(u32, &'static str)> {
    F::FLAGS
        .iter()
        .map(|flag| (flag.value().bits(), flag.name()))
        .collect()
}

/// sAMAccountType — не флаги, а одно значение из таблицы
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SamAccountType {
    DomainObject = 0x0000_0000,
    GroupObject = 0x1000_0000,
    NonSecurityGroupObject = 0x1000_0001,
    AliasObject = 0x2000_0000,
    NonSecurityAliasObject = 0x2000_0001,
    NormalUserAccount = 0x3000_0000,
    MachineAccount = 0x3000_0001,
    TrustAccount = 0x3000_0002,
    AppBasicGroup = 0x4000_0000,
    AppQueryGroup = 0x4000_0001,
    AccountTypeMax = 0x7fff_ffff,
}

impl SamAccountType {
    pub const ALL: [SamAccountType; 11] = [
        Self::DomainObject,
        Self::GroupObject,
        Self::NonSecurityGroupObject,
        Self::AliasObject,
        Self::NonSecurityAliasObject,
        Self::NormalUserAccount,
        Self::MachineAccount,
        Self::TrustAccount,
        Self::AppBasicGroup,
        Self::AppQueryGroup,
        Self::AccountTypeMax,
    ];

    pub fn value(self) -> u32 {
        self as u32
    }

    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.value() == value)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DomainObject => "DOMAIN_OBJECT",
            Self::GroupObject => "GROUP_OBJECT",
            Self::NonSecurityGroupObject => "NON_SECURITY_GROUP_OBJECT",
            Self::AliasObject => "ALIAS_OBJECT",
            Self::NonSecurityAliasObject => "NON_SECURITY_ALIAS_OBJECT",
            Self::NormalUserAccount => "NORMAL_USER_ACCOUNT",
            Self::MachineAccount => "MACHINE_ACCOUNT",
            Self::TrustAccount => "TRUST_ACCOUNT",
            Self::AppBasicGroup => "APP_BASIC_GROUP",
            Self::AppQueryGroup => "APP_QUERY_GROUP",
            Self::AccountTypeMax => "ACCOUNT_TYPE_MAX",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        // USER_OBJECT — синоним NORMAL_USER_ACCOUNT
        if name.eq_ignore_ascii_case("USER_OBJECT") {
            return Some(Self::NormalUserAccount);
        }
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for SamAccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Таблица перечисления (одно значение, а не набор битов)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumTable {
    SamAccountType,
    PropertyOperation,
}

impl EnumTable {
    pub fn name(&self, value: u32) -> Option<&'static str> {
        match self {
            EnumTable::SamAccountType => SamAccountType::from_value(value).map(SamAccountType::name),
            EnumTable::PropertyOperation => PropertyOperation::from_value(value).map(PropertyOperation::name),
        }
    }

    pub fn value(&self, name: &str) -> Option<u32> {
        match self {
            EnumTable::SamAccountType => SamAccountType::from_name(name).map(SamAccountType::value),
            EnumTable::PropertyOperation => PropertyOperation::from_name(name).map(|op| op as u32),
        }
    }

    pub fn from_table_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().replace('-', "_").as_str() {
            "SAM_ACCOUNT_TYPE" | "SAMACCOUNTTYPE" => Some(Self::SamAccountType),
            "PROPERTY_OPERATION" | "ADS_PROPERTY_OPERATION" => Some(Self::PropertyOperation),
            _ => None,
        }
    }
}

/// ADS_PROPERTY_OPERATION_ENUM — операция PutEx
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PropertyOperation {
    Clear = 1,
    Update = 2,
    Append = 3,
    Delete = 4,
}

impl PropertyOperation {
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Clear),
            2 => Some(Self::Update),
            3 => Some(Self::Append),
            4 => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Clear => "CLEAR",
            Self::Update => "UPDATE",
            Self::Append => "APPEND",
            Self::Delete => "DELETE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Clear, Self::Update, Self::Append, Self::Delete]
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }
}

// src/error.rs

use thiserror::Error;

use crate::codec::CodecError;
use crate::filter::FilterError;

/// Коды ошибок ADSI/Win32 (HRESULT), которые мы различаем
pub mod hresult {
    pub const ERROR_DS_NO_SUCH_OBJECT: u32 = 0x8007_2030;
    pub const ERROR_DS_CANT_ON_NON_LEAF: u32 = 0x8007_2015;
    pub const ERROR_OBJECT_ALREADY_EXISTS: u32 = 0x8007_1392;
    pub const ERROR_MEMBER_NOT_IN_ALIAS: u32 = 0x8007_0561;
    pub const ERROR_MEMBER_IN_ALIAS: u32 = 0x8007_0562;
    pub const ERROR_LOGON_FAILURE: u32 = 0x8007_052E;
    pub const E_ADS_BAD_PATHNAME: u32 = 0x8000_5000;
    pub const E_NOTIMPL: u32 = 0x8000_4001;
    pub const E_ADS_PROPERTY_NOT_FOUND: u32 = 0x8000_500D;
    pub const E_ADS_PROPERTY_NOT_SUPPORTED: u32 = 0x8000_5006;
    pub const E_ADS_PROPERTY_INVALID: u32 = 0x8000_5007;
}

/// Коды результата LDAP (RFC 4511), которые имеют своё исключение
pub mod ldap_result {
    pub const NO_SUCH_ATTRIBUTE: u32 = 16;
    pub const ATTRIBUTE_OR_VALUE_EXISTS: u32 = 20;
    pub const NO_SUCH_OBJECT: u32 = 32;
    pub const INVALID_DN_SYNTAX: u32 = 34;
    pub const INVALID_CREDENTIALS: u32 = 49;
    pub const UNWILLING_TO_PERFORM: u32 = 53;
    pub const NOT_ALLOWED_ON_NON_LEAF: u32 = 66;
    pub const ENTRY_ALREADY_EXISTS: u32 = 68;
}

/// Ошибки каталога
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Member already in group: {0}")]
    MemberAlreadyInGroup(String),

    #[error("Member not in group: {0}")]
    MemberNotInGroup(String),

    #[error("Bad path: {0}")]
    BadPath(String),

    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("No netrc entry for {0}")]
    NetrcNotFound(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory lock poisoned")]
    Poisoned,

    #[error("{code:08X} - {message}")]
    Other { code: u32, message: String },
}

impl DirectoryError {
    /// Перевести HRESULT в вид ошибки; коды принимаются и со знаком
    pub fn from_hresult(code: i64, message: impl Into<String>) -> Self {
        use hresult::*;

        let code = code as u32;
        let message = message.into();
        match code {
            ERROR_DS_NO_SUCH_OBJECT => DirectoryError::ObjectNotFound(message),
            ERROR_OBJECT_ALREADY_EXISTS => DirectoryError::AlreadyExists(message),
            ERROR_MEMBER_IN_ALIAS => DirectoryError::MemberAlreadyInGroup(message),
            ERROR_MEMBER_NOT_IN_ALIAS => DirectoryError::MemberNotInGroup(message),
            E_ADS_BAD_PATHNAME => DirectoryError::BadPath(message),
            E_NOTIMPL => DirectoryError::NotImplemented(message),
            E_ADS_PROPERTY_NOT_FOUND | E_ADS_PROPERTY_NOT_SUPPORTED | E_ADS_PROPERTY_INVALID => {
                DirectoryError::PropertyNotFound(message)
            }
            ERROR_LOGON_FAILURE => DirectoryError::InvalidCredentials(message),
            _ => DirectoryError::Other { code, message },
        }
    }

    /// То же для кода результата LDAP
    pub fn from_ldap_result(rc: u32, message: impl Into<String>) -> Self {
        use ldap_result::*;

        let message = message.into();
        match rc {
            NO_SUCH_OBJECT => DirectoryError::ObjectNotFound(message),
            ENTRY_ALREADY_EXISTS | ATTRIBUTE_OR_VALUE_EXISTS => DirectoryError::AlreadyExists(message),
            NO_SUCH_ATTRIBUTE => DirectoryError::PropertyNotFound(message),
            INVALID_DN_SYNTAX => DirectoryError::BadPath(message),
            INVALID_CREDENTIALS => DirectoryError::InvalidCredentials(message),
            UNWILLING_TO_PERFORM => DirectoryError::NotImplemented(message),
            NOT_ALLOWED_ON_NON_LEAF => DirectoryError::Other {
                code: hresult::ERROR_DS_CANT_ON_NON_LEAF,
                message,
            },
            _ => DirectoryError::Other { code: rc, message },
        }
    }

    /// HRESULT, соответствующий ошибке (если он есть)
    pub fn hresult(&self) -> Option<u32> {
        use hresult::*;

        match self {
            DirectoryError::ObjectNotFound(_) => Some(ERROR_DS_NO_SUCH_OBJECT),
            DirectoryError::AlreadyExists(_) => Some(ERROR_OBJECT_ALREADY_EXISTS),
            DirectoryError::MemberAlreadyInGroup(_) => Some(ERROR_MEMBER_IN_ALIAS),
            DirectoryError::MemberNotInGroup(_) => Some(ERROR_MEMBER_NOT_IN_ALIAS),
            DirectoryError::BadPath(_) => Some(E_ADS_BAD_PATHNAME),
            DirectoryError::NotImplemented(_) => Some(E_NOTIMPL),
            DirectoryError::PropertyNotFound(_) => Some(E_ADS_PROPERTY_NOT_FOUND),
            DirectoryError::InvalidCredentials(_) => Some(ERROR_LOGON_FAILURE),
            DirectoryError::Other { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(e: serde_json::Error) -> Self {
        DirectoryError::Serialization(e.to_string())
    }
}

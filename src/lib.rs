// src/lib.rs

//! Работа с объектами Active Directory: конвертеры значений атрибутов,
//! пути ADSI, LDAP-фильтры, учётные данные и доступ к каталогу.

pub mod codec;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod entry;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod path;

pub use codec::{AttributeSyntax, Codec, CodecError, CodecTable, RawValue, Value};
pub use config::AppConfig;
pub use credentials::{Credentials, CredentialsCache, CredentialsGuard};
pub use directory::{Directory, DirectoryBackend, DirectoryObject, MemoryDirectory, Modification, SearchPage, SearchRequest};
pub use entry::{RawEntry, SearchRow};
pub use error::DirectoryError;
pub use filter::{Filter, FilterError, QueryString, Scope};
pub use path::{DirectoryPath, DistinguishedName, Scheme};

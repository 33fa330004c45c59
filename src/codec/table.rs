// src/codec/table.rs

use std::collections::HashMap;
use tracing::debug;

use crate::codec::{AttributeSyntax, Codec, CodecError, RawValue, Value};
use crate::models::{EnumTable, FlagTable};

/// Реестр конвертеров: по имени атрибута, по синтаксису и схема (имя → синтаксис)
#[derive(Debug, Clone, Default)]
pub struct CodecTable {
    names: HashMap<String, Codec>,
    syntaxes: HashMap<AttributeSyntax, Codec>,
    schema: HashMap<String, AttributeSyntax>,
}

const FILETIME_ATTRIBUTES: &[&str] = &[
    "accountExpires",
    "badPasswordTime",
    "creationTime",
    "lastLogoff",
    "lastLogon",
    "lastLogonTimestamp",
    "lockoutTime",
    "pwdLastSet",
    "modifiedCount",
    "modifiedCountAtLastProm",
];

const INTERVAL_ATTRIBUTES: &[&str] = &[
    "maxPwdAge",
    "minPwdAge",
    "lockoutDuration",
    "lockoutObservationWindow",
    "forceLogoff",
];

const GUID_ATTRIBUTES: &[&str] = &["objectGUID", "msExchMailboxGuid", "schemaIDGUID"];

const HEX_ATTRIBUTES: &[&str] = &[
    "auditingPolicy",
    "dSASignature",
    "mSMQDigests",
    "mSMQSignCertificates",
    "replicationSignature",
    "replUpToDateVector",
    "repsFrom",
    "repsTo",
];

const DN_ATTRIBUTES: &[&str] = &[
    "member",
    "memberOf",
    "manager",
    "fSMORoleOwner",
    "masteredBy",
    "msDs-masteredBy",
    "publicDelegates",
    "publicDelegatesBL",
    "subRefs",
];

// Атрибуты, синтаксис которых известен без запроса к схеме
const KNOWN_SYNTAXES: &[(&str, AttributeSyntax)] = &[
    ("uSNChanged", AttributeSyntax::LargeInteger),
    ("uSNCreated", AttributeSyntax::LargeInteger),
    ("msDS-LastSuccessfulInteractiveLogonTime", AttributeSyntax::LargeInteger),
    ("sIDHistory", AttributeSyntax::Sid),
    ("tokenGroups", AttributeSyntax::Sid),
    ("securityIdentifier", AttributeSyntax::Sid),
    ("thumbnailPhoto", AttributeSyntax::OctetString),
    ("userCertificate", AttributeSyntax::OctetString),
    ("dSCorePropagationData", AttributeSyntax::Time),
    ("msDS-UserPasswordExpiryTimeComputed", AttributeSyntax::LargeInteger),
];

impl CodecTable {
    /// Пустая таблица: всё декодируется как есть
    pub fn new() -> Self {
        Self::default()
    }

    /// Таблица со всеми известными атрибутами AD
    pub fn standard() -> Self {
        let mut table = Self::new();

        for name in FILETIME_ATTRIBUTES {
            table.register(name, Codec::FileTime);
        }
        for name in INTERVAL_ATTRIBUTES {
            table.register(name, Codec::Interval);
        }
        table.register("whenCreated", Codec::GeneralizedTime);
        table.register("whenChanged", Codec::GeneralizedTime);
        table.register("objectSid", Codec::Sid);
        for name in GUID_ATTRIBUTES {
            table.register(name, Codec::Guid);
        }
        for name in HEX_ATTRIBUTES {
            table.register(name, Codec::Hex);
        }
        table.register("isGlobalCatalogReady", Codec::Boolean);
        table.register("isSynchronized", Codec::Boolean);
        table.register("groupType", Codec::Flags(FlagTable::GroupType));
        table.register("userAccountControl", Codec::Flags(FlagTable::UserAccountControl));
        table.register("systemFlags", Codec::Flags(FlagTable::SystemFlags));
        table.register("sAMAccountType", Codec::Enumeration(EnumTable::SamAccountType));
        for name in DN_ATTRIBUTES {
            table.register(name, Codec::Dn);
        }
        table.register("objectClass", Codec::Breadcrumbs);
        table.register("wellKnownObjects", Codec::DnWithBinary);
        table.register("otherWellKnownObjects", Codec::DnWithBinary);

        table.register_syntax(AttributeSyntax::LargeInteger, Codec::LargeInteger);
        table.register_syntax(AttributeSyntax::Sid, Codec::Sid);
        table.register_syntax(AttributeSyntax::OctetString, Codec::Hex);
        table.register_syntax(AttributeSyntax::Time, Codec::GeneralizedTime);

        for (name, syntax) in KNOWN_SYNTAXES {
            table.register_attribute_syntax(name, *syntax);
        }

        table
    }

    pub fn register(&mut self, name: &str, codec: Codec) -> &mut Self {
        self.names.insert(name.to_lowercase(), codec);
        self
    }

    pub fn register_syntax(&mut self, syntax: AttributeSyntax, codec: Codec) -> &mut Self {
        self.syntaxes.insert(syntax, codec);
        self
    }

    /// Запомнить синтаксис атрибута (снимок схемы)
    pub fn register_attribute_syntax(&mut self, name: &str, syntax: AttributeSyntax) -> &mut Self {
        self.schema.insert(name.to_lowercase(), syntax);
        self
    }

    pub fn attribute_syntax(&self, name: &str) -> Option<AttributeSyntax> {
        self.schema.get(&name.to_lowercase()).copied()
    }

    pub fn lookup(&self, name: &str) -> Codec {
        self.lookup_with_syntax(name, None)
    }

    /// Порядок: имя → синтаксис → суффикс GUID → как есть
    pub fn lookup_with_syntax(&self, name: &str, syntax: Option<AttributeSyntax>) -> Codec {
        let key = name.to_lowercase();
        if let Some(codec) = self.names.get(&key) {
            return *codec;
        }

        let syntax = syntax.or_else(|| self.schema.get(&key).copied());
        if let Some(codec) = syntax.and_then(|s| self.syntaxes.get(&s)) {
            return *codec;
        }

        if key.ends_with("guid") {
            return Codec::Guid;
        }

        debug!(attribute = name, "no codec registered, using identity");
        Codec::Identity
    }

    pub fn decode(&self, name: &str, raw: &RawValue) -> Value {
        self.lookup(name).decode(raw)
    }

    pub fn encode(&self, name: &str, value: &Value) -> Result<RawValue, CodecError> {
        self.lookup(name).encode(value)
    }

    /// Зарегистрированные имена (в нижнем регистре) с их конвертерами
    pub fn registered(&self) -> impl Iterator<Item = (&str, &Codec)> {
        self.names.iter().map(|(name, codec)| (name.as_str(), codec))
    }
}

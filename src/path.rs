// src/path.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::DirectoryError;

// ========================================
// Scheme — провайдер ADSI
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    #[default]
    Ldap,
    /// Global Catalog
    Gc,
    WinNt,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Ldap => "LDAP",
            Scheme::Gc => "GC",
            Scheme::WinNt => "WinNT",
        }
    }

    /// WinNT-пути не являются DN и не экранируются
    pub fn has_dn(&self) -> bool {
        !matches!(self, Scheme::WinNt)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_end_matches(':');
        if s.eq_ignore_ascii_case("LDAP") {
            Ok(Scheme::Ldap)
        } else if s.eq_ignore_ascii_case("GC") {
            Ok(Scheme::Gc)
        } else if s.eq_ignore_ascii_case("WinNT") {
            Ok(Scheme::WinNt)
        } else {
            Err(DirectoryError::BadPath(format!("unknown scheme: {}", s)))
        }
    }
}

// ========================================
// DistinguishedName
// ========================================

/// Один компонент DN: `CN=Users`. Значение хранится в экранированном виде.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rdn {
    pub attribute: String,
    pub value: String,
}

impl Rdn {
    /// Построить RDN из сырого значения, экранируя спецсимволы
    pub fn new(attribute: &str, value: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            value: escape_rdn_value(value),
        }
    }

    /// Значение без экранирования
    pub fn unescaped_value(&self) -> String {
        unescape_rdn_value(&self.value)
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, self.value)
    }
}

/// Distinguished Name. Исходный текст сохраняется как есть,
/// сравнение — без учёта регистра по компонентам.
#[derive(Debug, Clone)]
pub struct DistinguishedName {
    text: String,
    rdns: Vec<Rdn>,
}

impl DistinguishedName {
    pub fn parse(text: &str) -> Result<Self, DirectoryError> {
        let text = text.trim();
        let mut rdns = Vec::new();
        if !text.is_empty() {
            for part in split_unescaped(text, ',') {
                let part = part.trim();
                let (attribute, value) = split_once_unescaped(part, '=')
                    .ok_or_else(|| DirectoryError::BadPath(format!("invalid RDN '{}' in '{}'", part, text)))?;
                let attribute = attribute.trim();
                if attribute.is_empty() {
                    return Err(DirectoryError::BadPath(format!("empty attribute in '{}'", text)));
                }
                rdns.push(Rdn {
                    attribute: attribute.to_string(),
                    value: value.trim().to_string(),
                });
            }
        }
        Ok(Self {
            text: text.to_string(),
            rdns,
        })
    }

    pub fn empty() -> Self {
        Self {
            text: String::new(),
            rdns: Vec::new(),
        }
    }

    pub fn from_rdns(rdns: Vec<Rdn>) -> Self {
        let text = rdns.iter().map(Rdn::to_string).collect::<Vec<_>>().join(",");
        Self { text, rdns }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Имя объекта — значение первого RDN
    pub fn name(&self) -> Option<String> {
        self.rdns.first().map(Rdn::unescaped_value)
    }

    pub fn parent(&self) -> Option<DistinguishedName> {
        if self.rdns.len() < 2 {
            return None;
        }
        Some(Self::from_rdns(self.rdns[1..].to_vec()))
    }

    pub fn child(&self, rdn: Rdn) -> DistinguishedName {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(self.rdns.iter().cloned());
        Self::from_rdns(rdns)
    }

    /// Ключ для сравнения и индексов: компоненты в нижнем регистре
    pub fn key(&self) -> String {
        self.rdns
            .iter()
            .map(|r| format!("{}={}", r.attribute.to_lowercase(), r.value.to_lowercase()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Лежит ли объект где-то под `ancestor` (не равен ему)
    pub fn is_descendant_of(&self, ancestor: &DistinguishedName) -> bool {
        self.rdns.len() > ancestor.rdns.len() && self.has_suffix(ancestor)
    }

    /// Непосредственный потомок `parent`
    pub fn is_child_of(&self, parent: &DistinguishedName) -> bool {
        self.rdns.len() == parent.rdns.len() + 1 && self.has_suffix(parent)
    }

    fn has_suffix(&self, other: &DistinguishedName) -> bool {
        let offset = self.rdns.len() - other.rdns.len();
        self.rdns[offset..]
            .iter()
            .zip(other.rdns.iter())
            .all(|(a, b)| {
                a.attribute.eq_ignore_ascii_case(&b.attribute) && a.value.to_lowercase() == b.value.to_lowercase()
            })
    }
}

impl PartialEq for DistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DistinguishedName {}

impl std::hash::Hash for DistinguishedName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for DistinguishedName {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DistinguishedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for DistinguishedName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ========================================
// DirectoryPath — моникер `LDAP://server/DN`
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryPath {
    pub scheme: Scheme,
    pub server: Option<String>,
    /// Часть после сервера: DN для LDAP/GC (с экранированными `/`), путь для WinNT
    pub object: String,
}

const ROOT_DSE: &str = "rootDSE";

impl DirectoryPath {
    pub fn parse(moniker: &str) -> Result<Self, DirectoryError> {
        let moniker = moniker.trim();
        if moniker.is_empty() {
            return Err(DirectoryError::BadPath("empty path".to_string()));
        }

        let (scheme, rest, has_authority) = match moniker.find("://") {
            Some(i) => (moniker[..i].parse::<Scheme>()?, &moniker[i + 3..], true),
            None => match moniker.strip_suffix(':') {
                // `LDAP:` — корень пространства имён
                Some(s) if !s.contains('=') => (s.parse::<Scheme>()?, "", false),
                _ => (Scheme::Ldap, moniker, false),
            },
        };

        let (server, object) = match find_unescaped(rest, '/') {
            Some(i) if scheme == Scheme::WinNt || !rest[..i].contains('=') => {
                let server = &rest[..i];
                if server.is_empty() {
                    return Err(DirectoryError::BadPath(format!("empty server in '{}'", moniker)));
                }
                (Some(server.to_string()), &rest[i + 1..])
            }
            // `LDAP://dc01.corp.acme.com` — только сервер, объект по умолчанию
            None if has_authority
                && scheme.has_dn()
                && !rest.is_empty()
                && !rest.contains('=')
                && !rest.eq_ignore_ascii_case(ROOT_DSE) =>
            {
                (Some(rest.to_string()), "")
            }
            _ => (None, rest),
        };

        let object = if scheme.has_dn() {
            let escaped = escaped_moniker(object);
            if !escaped.eq_ignore_ascii_case(ROOT_DSE) {
                DistinguishedName::parse(&escaped)?;
            }
            escaped
        } else {
            object.to_string()
        };

        Ok(Self {
            scheme,
            server,
            object,
        })
    }

    pub fn for_dn(scheme: Scheme, server: Option<&str>, dn: &DistinguishedName) -> Self {
        Self {
            scheme,
            server: server.map(str::to_string),
            object: escaped_moniker(dn.as_str()),
        }
    }

    /// Моникер rootDSE для сервера (или любого контроллера домена)
    pub fn root_dse(server: Option<&str>, scheme: Scheme) -> Self {
        Self {
            scheme,
            server: server.map(str::to_string),
            object: ROOT_DSE.to_string(),
        }
    }

    pub fn is_root_dse(&self) -> bool {
        self.object.eq_ignore_ascii_case(ROOT_DSE)
    }

    pub fn dn(&self) -> Result<DistinguishedName, DirectoryError> {
        if !self.scheme.has_dn() {
            return Err(DirectoryError::NotImplemented(format!(
                "{} paths have no distinguished name",
                self.scheme
            )));
        }
        if self.is_root_dse() {
            return Ok(DistinguishedName::empty());
        }
        DistinguishedName::parse(&self.object.replace("\\/", "/"))
    }

    pub fn with_dn(&self, dn: &DistinguishedName) -> Self {
        Self::for_dn(self.scheme, self.server.as_deref(), dn)
    }

    pub fn parent(&self) -> Option<Self> {
        let dn = self.dn().ok()?;
        dn.parent().map(|p| self.with_dn(&p))
    }

    pub fn child(&self, rdn: Rdn) -> Result<Self, DirectoryError> {
        Ok(self.with_dn(&self.dn()?.child(rdn)))
    }
}

impl fmt::Display for DirectoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        match &self.server {
            Some(server) if self.object.is_empty() => return f.write_str(server),
            Some(server) => write!(f, "{}/", server)?,
            None => {}
        }
        f.write_str(&self.object)
    }
}

impl FromStr for DirectoryPath {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DirectoryPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DirectoryPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ========================================
// Экранирование
// ========================================

/// Экранировать `/` в DN для моникера, если это ещё не сделано
pub fn escaped_moniker(moniker: &str) -> String {
    if moniker.contains("\\/") {
        moniker.to_string()
    } else {
        moniker.replace('/', "\\/")
    }
}

/// Экранирование значения RDN (RFC 4514)
pub fn escape_rdn_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, ch) in value.chars().enumerate() {
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                out.push('\\');
                out.push(ch);
            }
            '#' if i == 0 => out.push_str("\\#"),
            ' ' if i == 0 || i == last => out.push_str("\\ "),
            _ => out.push(ch),
        }
    }
    out
}

pub fn unescape_rdn_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn find_unescaped(s: &str, sep: char) -> Option<usize> {
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == sep {
            return Some(i);
        }
    }
    None
}

fn split_once_unescaped(s: &str, sep: char) -> Option<(&str, &str)> {
    find_unescaped(s, sep).map(|i| (&s[..i], &s[i + sep.len_utf8()..]))
}

fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(i) = find_unescaped(rest, sep) {
        parts.push(&rest[..i]);
        rest = &rest[i + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}

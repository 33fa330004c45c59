// src/filter.rs

//! LDAP-фильтры (RFC 4515): разбор, сборка из частей, вычисление на объекте
//! и строка запроса ADO `<base>;filter;attrs;scope`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::codec::time::format_generalized_time;
use crate::codec::RawValue;
use crate::entry::RawEntry;
use crate::models::{ObjectGuid, SecurityIdentifier};
use crate::path::{DirectoryPath, DistinguishedName};

/// LDAP_MATCHING_RULE_BIT_AND
pub const MATCHING_RULE_BIT_AND: &str = "1.2.840.113556.1.4.803";
/// LDAP_MATCHING_RULE_BIT_OR
pub const MATCHING_RULE_BIT_OR: &str = "1.2.840.113556.1.4.804";
/// LDAP_MATCHING_RULE_IN_CHAIN
pub const MATCHING_RULE_IN_CHAIN: &str = "1.2.840.113556.1.4.1941";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid filter syntax: {0}")]
    InvalidSyntax(String),
    #[error("Unbalanced parentheses in filter")]
    UnbalancedParentheses,
    #[error("Unexpected end of filter")]
    UnexpectedEnd,
    #[error("Unexpected input after filter: {0}")]
    TrailingInput(String),
    #[error("Invalid attribute description: '{0}'")]
    InvalidAttribute(String),
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
}

/// Значения хранятся в экранированном виде, как в тексте фильтра
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Equality(String, String),
    GreaterOrEqual(String, String),
    LessOrEqual(String, String),
    ApproxMatch(String, String),
    Present(String),
    Substring {
        attr: String,
        initial: Option<String>,
        any: Vec<String>,
        last: Option<String>,
    },
    Extensible {
        attr: String,
        rule: String,
        value: String,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    /// Готовый текст, вставляется как есть
    Raw(String),
}

impl Filter {
    /// Разбирает фильтр из строки (например, "(sAMAccountName=jdoe)").
    /// Внешние скобки можно опустить.
    pub fn parse(s: &str) -> Result<Self, FilterError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FilterError::UnexpectedEnd);
        }
        if !s.starts_with('(') {
            return Self::parse(&format!("({})", s));
        }

        let mut parser = Parser { input: s, pos: 0 };
        let filter = parser.filter()?;
        parser.skip_ws();
        if parser.pos < s.len() {
            return Err(FilterError::TrailingInput(s[parser.pos..].to_string()));
        }
        Ok(filter)
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Filter::Raw(text.into())
    }

    /// Проверяет, соответствует ли объект фильтру.
    /// Правило IN_CHAIN сводится к прямой ссылке.
    pub fn matches(&self, entry: &RawEntry) -> bool {
        self.matches_with(entry, &direct_link)
    }

    /// То же, но транзитивные ссылки (`within`) разрешает `resolve(entry, attr, target)`
    pub fn matches_with<R>(&self, entry: &RawEntry, resolve: &R) -> bool
    where
        R: Fn(&RawEntry, &str, &DistinguishedName) -> bool,
    {
        match self {
            Filter::Equality(attr, value) | Filter::ApproxMatch(attr, value) => {
                if is_dn_attribute(attr) {
                    return same_dn(entry.dn.as_str(), &unescape_text(value));
                }
                if attr.eq_ignore_ascii_case("objectCategory") && !value.contains('=') {
                    // objectCategory=person — короткое имя категории
                    let wanted = unescape_text(value);
                    return entry.texts(attr).iter().any(|dn| {
                        DistinguishedName::parse(dn)
                            .ok()
                            .and_then(|dn| dn.name())
                            .is_some_and(|name| name.eq_ignore_ascii_case(&wanted))
                    });
                }
                let bytes = unescape_filter_value(value);
                let text = String::from_utf8_lossy(&bytes);
                entry
                    .values(attr)
                    .into_iter()
                    .any(|raw| value_equals(raw, &bytes, &text))
            }
            Filter::GreaterOrEqual(attr, value) => {
                let wanted = unescape_text(value);
                entry
                    .values(attr)
                    .into_iter()
                    .any(|raw| compare(raw, &wanted).is_some_and(|o| o != Ordering::Less))
            }
            Filter::LessOrEqual(attr, value) => {
                let wanted = unescape_text(value);
                entry
                    .values(attr)
                    .into_iter()
                    .any(|raw| compare(raw, &wanted).is_some_and(|o| o != Ordering::Greater))
            }
            Filter::Present(attr) => is_dn_attribute(attr) || entry.contains(attr),
            Filter::Substring {
                attr,
                initial,
                any,
                last,
            } => entry.values(attr).into_iter().any(|raw| {
                raw.as_text()
                    .is_some_and(|text| substring_match(text, initial.as_deref(), any, last.as_deref()))
            }),
            Filter::Extensible { attr, rule, value } => {
                let wanted = unescape_text(value);
                match rule.as_str() {
                    MATCHING_RULE_BIT_AND => parse_mask(&wanted).is_some_and(|mask| {
                        entry
                            .values(attr)
                            .into_iter()
                            .filter_map(RawValue::as_i64)
                            .any(|n| (n as u32) & mask == mask)
                    }),
                    MATCHING_RULE_BIT_OR => parse_mask(&wanted).is_some_and(|mask| {
                        entry
                            .values(attr)
                            .into_iter()
                            .filter_map(RawValue::as_i64)
                            .any(|n| (n as u32) & mask != 0)
                    }),
                    MATCHING_RULE_IN_CHAIN => DistinguishedName::parse(&wanted)
                        .is_ok_and(|target| resolve(entry, attr, &target)),
                    _ => false,
                }
            }
            Filter::And(items) => items.iter().all(|f| f.matches_with(entry, resolve)),
            Filter::Or(items) => items.iter().any(|f| f.matches_with(entry, resolve)),
            Filter::Not(inner) => !inner.matches_with(entry, resolve),
            Filter::Raw(text) => Filter::parse(text).is_ok_and(|f| f.matches_with(entry, resolve)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Equality(attr, value) => write!(f, "({}={})", attr, value),
            Filter::GreaterOrEqual(attr, value) => write!(f, "({}>={})", attr, value),
            Filter::LessOrEqual(attr, value) => write!(f, "({}<={})", attr, value),
            Filter::ApproxMatch(attr, value) => write!(f, "({}~={})", attr, value),
            Filter::Present(attr) => write!(f, "({}=*)", attr),
            Filter::Substring {
                attr,
                initial,
                any,
                last,
            } => {
                write!(f, "({}={}*", attr, initial.as_deref().unwrap_or(""))?;
                for part in any {
                    write!(f, "{}*", part)?;
                }
                write!(f, "{})", last.as_deref().unwrap_or(""))
            }
            Filter::Extensible { attr, rule, value } => write!(f, "({}:{}:={})", attr, rule, value),
            Filter::And(items) => {
                f.write_str("(&")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Filter::Or(items) => {
                f.write_str("(|")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Filter::Not(inner) => write!(f, "(!{})", inner),
            Filter::Raw(text) if text.starts_with('(') => f.write_str(text),
            Filter::Raw(text) => write!(f, "({})", text),
        }
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ========================================
// Разбор
// ========================================

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), FilterError> {
        self.skip_ws();
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(FilterError::InvalidSyntax(format!(
                "expected '{}' at position {} in '{}'",
                byte as char, self.pos, self.input
            ))),
            None => Err(FilterError::UnexpectedEnd),
        }
    }

    fn filter(&mut self) -> Result<Filter, FilterError> {
        self.expect(b'(')?;
        self.skip_ws();
        let filter = match self.peek() {
            Some(b'&') => {
                self.pos += 1;
                Filter::And(self.list()?)
            }
            Some(b'|') => {
                self.pos += 1;
                Filter::Or(self.list()?)
            }
            Some(b'!') => {
                self.pos += 1;
                Filter::Not(Box::new(self.filter()?))
            }
            Some(_) => self.item()?,
            None => return Err(FilterError::UnexpectedEnd),
        };
        self.expect(b')')?;
        Ok(filter)
    }

    fn list(&mut self) -> Result<Vec<Filter>, FilterError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() != Some(b'(') {
                return Ok(items);
            }
            items.push(self.filter()?);
        }
    }

    fn item(&mut self) -> Result<Filter, FilterError> {
        let rest = &self.input[self.pos..];
        let end = rest
            .find(['(', ')'])
            .ok_or(FilterError::UnbalancedParentheses)?;
        if rest.as_bytes()[end] == b'(' {
            return Err(FilterError::InvalidSyntax(format!(
                "unescaped '(' in '{}'",
                &rest[..=end]
            )));
        }
        self.pos += end;
        parse_item(&rest[..end])
    }
}

fn parse_item(text: &str) -> Result<Filter, FilterError> {
    let eq = text
        .find('=')
        .ok_or_else(|| FilterError::InvalidSyntax(text.to_string()))?;
    let (lhs, value) = (&text[..eq], text[eq + 1..].to_string());

    if let Some(attr) = lhs.strip_suffix('>') {
        Ok(Filter::GreaterOrEqual(check_attr(attr)?, value))
    } else if let Some(attr) = lhs.strip_suffix('<') {
        Ok(Filter::LessOrEqual(check_attr(attr)?, value))
    } else if let Some(attr) = lhs.strip_suffix('~') {
        Ok(Filter::ApproxMatch(check_attr(attr)?, value))
    } else if let Some(spec) = lhs.strip_suffix(':') {
        // attr:rule:=value, attr:dn:rule:=value
        let (attr, rule) = spec
            .split_once(':')
            .ok_or_else(|| FilterError::InvalidSyntax(text.to_string()))?;
        let attr = if attr.is_empty() { String::new() } else { check_attr(attr)? };
        if rule.is_empty() {
            return Err(FilterError::InvalidSyntax(text.to_string()));
        }
        Ok(Filter::Extensible {
            attr,
            rule: rule.to_string(),
            value,
        })
    } else {
        Ok(simple(check_attr(lhs)?, value))
    }
}

fn check_attr(attr: &str) -> Result<String, FilterError> {
    let valid = !attr.is_empty()
        && attr
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ';' | '_'));
    if valid {
        Ok(attr.to_string())
    } else {
        Err(FilterError::InvalidAttribute(attr.to_string()))
    }
}

/// `attr=value` с учётом `*`: присутствие, подстрока или равенство
fn simple(attr: String, value: String) -> Filter {
    if value == "*" {
        return Filter::Present(attr);
    }
    if !value.contains('*') {
        return Filter::Equality(attr, value);
    }
    let mut parts: Vec<&str> = value.split('*').collect();
    let last = parts.pop().filter(|s| !s.is_empty()).map(str::to_string);
    let initial = match parts.first() {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => None,
    };
    let any = parts
        .into_iter()
        .skip(1)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Filter::Substring {
        attr,
        initial,
        any,
        last,
    }
}

// ========================================
// Конструкторы
// ========================================

/// Значение, которое можно подставить в фильтр (уже экранированное)
pub trait IntoFilterValue {
    fn into_filter_value(self) -> String;
}

impl IntoFilterValue for &str {
    /// Завершающая `*` остаётся шаблоном, всё остальное экранируется
    fn into_filter_value(self) -> String {
        match self.strip_suffix('*') {
            Some(prefix) if !prefix.ends_with('\\') => format!("{}*", escape_filter_value(prefix)),
            _ => escape_filter_value(self),
        }
    }
}

impl IntoFilterValue for String {
    fn into_filter_value(self) -> String {
        self.as_str().into_filter_value()
    }
}

impl IntoFilterValue for &String {
    fn into_filter_value(self) -> String {
        self.as_str().into_filter_value()
    }
}

macro_rules! integer_filter_value {
    ($($t:ty),*) => {
        $(impl IntoFilterValue for $t {
            fn into_filter_value(self) -> String {
                self.to_string()
            }
        })*
    };
}

integer_filter_value!(i32, i64, u32, u64, usize);

impl IntoFilterValue for bool {
    fn into_filter_value(self) -> String {
        (if self { "TRUE" } else { "FALSE" }).to_string()
    }
}

impl IntoFilterValue for DateTime<Utc> {
    fn into_filter_value(self) -> String {
        format_generalized_time(&self)
    }
}

impl IntoFilterValue for &DistinguishedName {
    fn into_filter_value(self) -> String {
        escape_filter_value(self.as_str())
    }
}

impl IntoFilterValue for &SecurityIdentifier {
    fn into_filter_value(self) -> String {
        self.to_string()
    }
}

impl IntoFilterValue for ObjectGuid {
    /// GUID в фильтре задаётся байтами: `\25\28\31\aa...`
    fn into_filter_value(self) -> String {
        escape_filter_bytes(&self.to_bytes())
    }
}

/// `(&...)`; один операнд возвращается без обёртки
pub fn and_<I: IntoIterator<Item = Filter>>(filters: I) -> Filter {
    let mut items: Vec<Filter> = filters.into_iter().collect();
    if items.len() == 1 {
        return items.remove(0);
    }
    Filter::And(items)
}

/// `(|...)`; один операнд возвращается без обёртки
pub fn or_<I: IntoIterator<Item = Filter>>(filters: I) -> Filter {
    let mut items: Vec<Filter> = filters.into_iter().collect();
    if items.len() == 1 {
        return items.remove(0);
    }
    Filter::Or(items)
}

pub fn not_(filter: Filter) -> Filter {
    Filter::Not(Box::new(filter))
}

pub fn present(attr: &str) -> Filter {
    Filter::Present(attr.to_string())
}

pub fn eq(attr: &str, value: impl IntoFilterValue) -> Filter {
    simple(attr.to_string(), value.into_filter_value())
}

pub fn ne(attr: &str, value: impl IntoFilterValue) -> Filter {
    not_(eq(attr, value))
}

pub fn ge(attr: &str, value: impl IntoFilterValue) -> Filter {
    Filter::GreaterOrEqual(attr.to_string(), value.into_filter_value())
}

pub fn le(attr: &str, value: impl IntoFilterValue) -> Filter {
    Filter::LessOrEqual(attr.to_string(), value.into_filter_value())
}

/// В LDAP нет `>`: `(!(attr<=value))`
pub fn gt(attr: &str, value: impl IntoFilterValue) -> Filter {
    not_(le(attr, value))
}

pub fn lt(attr: &str, value: impl IntoFilterValue) -> Filter {
    not_(ge(attr, value))
}

/// Все биты маски установлены
pub fn band(attr: &str, bits: u32) -> Filter {
    Filter::Extensible {
        attr: attr.to_string(),
        rule: MATCHING_RULE_BIT_AND.to_string(),
        value: bits.to_string(),
    }
}

/// Хотя бы один бит маски установлен
pub fn bor(attr: &str, bits: u32) -> Filter {
    Filter::Extensible {
        attr: attr.to_string(),
        rule: MATCHING_RULE_BIT_OR.to_string(),
        value: bits.to_string(),
    }
}

/// Транзитивная ссылка: `within("memberOf", group_dn)` — член группы на любом уровне
pub fn within(attr: &str, dn: impl IntoFilterValue) -> Filter {
    Filter::Extensible {
        attr: attr.to_string(),
        rule: MATCHING_RULE_IN_CHAIN.to_string(),
        value: dn.into_filter_value(),
    }
}

pub fn not_within(attr: &str, dn: impl IntoFilterValue) -> Filter {
    not_(within(attr, dn))
}

// ========================================
// Экранирование (RFC 4515)
// ========================================

pub fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => out.push_str("\\2a"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '\\' => out.push_str("\\5c"),
            '\0' => out.push_str("\\00"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_filter_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("\\{:02x}", b)).collect()
}

/// `\xx` → байт; старая форма `\c` тоже понимается
pub fn unescape_filter_value(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let hex = value
                .get(i + 1..i + 3)
                .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = hex {
                out.push(byte);
                i += 3;
                continue;
            }
            if let Some(&next) = bytes.get(i + 1) {
                out.push(next);
                i += 2;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn unescape_text(value: &str) -> String {
    String::from_utf8_lossy(&unescape_filter_value(value)).into_owned()
}

// ========================================
// Вычисление
// ========================================

fn is_dn_attribute(attr: &str) -> bool {
    attr.eq_ignore_ascii_case("distinguishedName")
}

fn same_dn(a: &str, b: &str) -> bool {
    match (DistinguishedName::parse(a), DistinguishedName::parse(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.eq_ignore_ascii_case(b),
    }
}

/// Прямая ссылка: среди значений `attr` есть `target`
pub fn direct_link(entry: &RawEntry, attr: &str, target: &DistinguishedName) -> bool {
    entry.texts(attr).into_iter().any(|dn| same_dn(dn, target.as_str()))
}

fn value_equals(raw: &RawValue, bytes: &[u8], text: &str) -> bool {
    match raw {
        RawValue::Octets(octets) => {
            octets.as_slice() == bytes
                || SecurityIdentifier::from_bytes(octets)
                    .is_ok_and(|sid| sid.to_string().eq_ignore_ascii_case(text))
        }
        RawValue::Integer(_) | RawValue::LargeInteger(_) => {
            raw.as_i64().is_some() && raw.as_i64() == text.trim().parse::<i64>().ok()
        }
        RawValue::Text(s) => s.to_lowercase() == text.to_lowercase(),
        RawValue::Null | RawValue::Multi(_) => false,
    }
}

/// Числа сравниваются как числа, строки — без учёта регистра
fn compare(raw: &RawValue, wanted: &str) -> Option<Ordering> {
    if let (Some(a), Ok(b)) = (raw.as_i64(), wanted.trim().parse::<i64>()) {
        return Some(a.cmp(&b));
    }
    raw.as_text()
        .map(|s| s.to_lowercase().cmp(&wanted.to_lowercase()))
}

fn parse_mask(value: &str) -> Option<u32> {
    let n: i64 = value.trim().parse().ok()?;
    if n < i64::from(i32::MIN) || n > i64::from(u32::MAX) {
        return None;
    }
    Some(n as u32)
}

fn substring_match(text: &str, initial: Option<&str>, any: &[String], last: Option<&str>) -> bool {
    let lowered = text.to_lowercase();
    let mut rest = lowered.as_str();
    if let Some(initial) = initial {
        match rest.strip_prefix(unescape_text(initial).to_lowercase().as_str()) {
            Some(r) => rest = r,
            None => return false,
        }
    }
    for part in any {
        let part = unescape_text(part).to_lowercase();
        match rest.find(part.as_str()) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }
    match last {
        Some(last) => rest.ends_with(unescape_text(last).to_lowercase().as_str()),
        None => true,
    }
}

// ========================================
// Строка запроса ADO
// ========================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    Base,
    OneLevel,
    #[default]
    Subtree,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Base => f.write_str("Base"),
            Scope::OneLevel => f.write_str("OneLevel"),
            Scope::Subtree => f.write_str("Subtree"),
        }
    }
}

impl FromStr for Scope {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" => Ok(Scope::Base),
            "onelevel" | "one" => Ok(Scope::OneLevel),
            "subtree" | "sub" => Ok(Scope::Subtree),
            other => Err(FilterError::InvalidQuery(format!("unknown scope '{}'", other))),
        }
    }
}

/// `<LDAP://DC=corp,DC=acme>;(objectClass=user);cn,mail;Range=0-1499;Subtree`
#[derive(Debug, Clone, PartialEq)]
pub struct QueryString {
    pub base: DirectoryPath,
    pub filter: Option<Filter>,
    pub attributes: Vec<String>,
    pub range: Option<(u32, u32)>,
    pub scope: Scope,
}

impl QueryString {
    pub fn new(base: DirectoryPath) -> Self {
        Self {
            base,
            filter: None,
            attributes: vec!["ADsPath".to_string()],
            range: None,
            scope: Scope::Subtree,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn range(mut self, first: u32, last: u32) -> Self {
        self.range = Some((first, last));
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn parse(s: &str) -> Result<Self, FilterError> {
        let invalid = |why: &str| FilterError::InvalidQuery(format!("{}: '{}'", why, s));
        let shape = || invalid("expected <base>;filter;attributes[;Range=a-b];scope");

        let rest = s
            .trim()
            .strip_prefix('<')
            .ok_or_else(|| invalid("base must be enclosed in <>"))?;
        let (base, rest) = rest
            .split_once('>')
            .ok_or_else(|| invalid("base must be enclosed in <>"))?;
        let base = DirectoryPath::parse(base).map_err(|e| FilterError::InvalidQuery(e.to_string()))?;
        let rest = rest.strip_prefix(';').ok_or_else(shape)?;

        let (rest, scope) = rest.rsplit_once(';').ok_or_else(shape)?;
        let split = find_top_level(rest, ';').ok_or_else(shape)?;
        let (filter_text, rest) = (&rest[..split], &rest[split + 1..]);

        let filter = match filter_text.trim() {
            "" => None,
            text => Some(Filter::parse(text)?),
        };

        // `;range=` внутри списка атрибутов остаётся опцией атрибута
        let (attribute_text, range) = match rest.rsplit_once(';') {
            Some((attributes, last)) if !last.contains(',') => {
                let range = parse_range(last).ok_or_else(|| invalid("bad range segment"))?;
                (attributes, Some(range))
            }
            _ => (rest, None),
        };
        let attributes = attribute_text
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            base,
            filter,
            attributes,
            range,
            scope: scope.parse()?,
        })
    }
}

/// `Range=0-1499` или `range=1500-*` (до конца)
pub fn parse_range(segment: &str) -> Option<(u32, u32)> {
    let segment = segment.trim();
    let spec = segment
        .get(..6)
        .filter(|prefix| prefix.eq_ignore_ascii_case("range="))
        .map(|_| &segment[6..])?;
    let (first, last) = spec.split_once('-')?;
    let first = first.trim().parse().ok()?;
    let last = match last.trim() {
        "*" => u32::MAX,
        n => n.parse().ok()?,
    };
    (first <= last).then_some((first, last))
}

/// Первая `sep` вне скобок
fn find_top_level(s: &str, sep: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>;", self.base)?;
        if let Some(filter) = &self.filter {
            write!(f, "{}", filter)?;
        }
        write!(f, ";{}", self.attributes.join(","))?;
        if let Some((first, last)) = self.range {
            write!(f, ";Range={}-{}", first, last)?;
        }
        write!(f, ";{}", self.scope)
    }
}

impl FromStr for QueryString {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

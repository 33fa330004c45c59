// src/entry.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::codec::RawValue;
use crate::path::DistinguishedName;

/// Объект каталога в «сыром» виде: DN и атрибуты в проводном представлении.
/// Имена атрибутов сравниваются без учёта регистра, но хранятся как заданы.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub dn: DistinguishedName,
    #[serde(default)]
    attributes: BTreeMap<String, RawValue>,
}

/// Строка результата поиска
pub type SearchRow = RawEntry;

impl RawEntry {
    pub fn new(dn: DistinguishedName) -> Self {
        Self {
            dn,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: RawValue) -> Self {
        self.set(name, value);
        self
    }

    fn key_of(&self, name: &str) -> Option<&String> {
        self.attributes.keys().find(|k| k.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.key_of(name).and_then(|k| self.attributes.get(k))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.values().is_empty())
    }

    /// Записать значение; `Null` удаляет атрибут
    pub fn set(&mut self, name: &str, value: RawValue) {
        let key = self.key_of(name).cloned().unwrap_or_else(|| name.to_string());
        if value.is_null() {
            self.attributes.remove(&key);
        } else {
            self.attributes.insert(key, value);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<RawValue> {
        let key = self.key_of(name).cloned()?;
        self.attributes.remove(&key)
    }

    /// Все значения атрибута (пусто, если его нет)
    pub fn values(&self, name: &str) -> Vec<&RawValue> {
        self.get(name).map(RawValue::values).unwrap_or_default()
    }

    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.values(name).into_iter().filter_map(RawValue::as_text).collect()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has_object_class(&self, class: &str) -> bool {
        self.texts("objectClass")
            .iter()
            .any(|c| c.eq_ignore_ascii_case(class))
    }

    /// Копия только с запрошенными атрибутами; пустой список — все
    pub fn project(&self, names: &[String]) -> RawEntry {
        if names.is_empty() || names.iter().any(|n| n == "*") {
            return self.clone();
        }
        let mut out = RawEntry::new(self.dn.clone());
        for name in names {
            if name.eq_ignore_ascii_case("distinguishedName") {
                out.set(name, RawValue::text(self.dn.as_str()));
            } else if let Some(value) = self.get(name) {
                out.set(name, value.clone());
            }
        }
        out
    }
}

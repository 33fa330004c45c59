// src/directory/memory.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info, warn};

use crate::codec::{AttributeSyntax, RawValue};
use crate::credentials::{CredentialKind, Credentials};
use crate::directory::{DirectoryBackend, Modification, SearchRequest};
use crate::entry::RawEntry;
use crate::error::{hresult, DirectoryError};
use crate::filter::Scope;
use crate::models::PropertyOperation;
use crate::path::{DirectoryPath, DistinguishedName};

const MEMBER: &str = "member";
const MEMBER_OF: &str = "memberOf";

/// Снимок каталога в JSON
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Snapshot {
    pub naming_context: DistinguishedName,
    #[serde(default)]
    pub allow_anonymous: bool,
    /// Логин → пароль
    #[serde(default)]
    pub accounts: BTreeMap<String, String>,
    /// Атрибут → OID синтаксиса
    #[serde(default)]
    pub schema: BTreeMap<String, String>,
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

/// Каталог в памяти: объекты по ключу DN, обратные ссылки memberOf
/// поддерживаются при изменении member.
pub struct MemoryDirectory {
    naming_context: DistinguishedName,
    entries: RwLock<BTreeMap<String, RawEntry>>,
    accounts: HashMap<String, String>,
    allow_anonymous: bool,
    schema: HashMap<String, AttributeSyntax>,
}

impl MemoryDirectory {
    /// Пустой домен с одним корневым объектом
    pub fn new(naming_context: DistinguishedName) -> Self {
        let mut root = RawEntry::new(naming_context.clone()).with(
            "objectClass",
            RawValue::Multi(vec![RawValue::text("top"), RawValue::text("domain"), RawValue::text("domainDNS")]),
        );
        stamp(&mut root);

        let mut entries = BTreeMap::new();
        entries.insert(naming_context.key(), root);
        Self {
            naming_context,
            entries: RwLock::new(entries),
            accounts: HashMap::new(),
            allow_anonymous: false,
            schema: HashMap::new(),
        }
    }

    pub fn with_account(mut self, username: &str, password: &str) -> Self {
        self.accounts.insert(username.to_lowercase(), password.to_string());
        self
    }

    pub fn allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    pub fn with_attribute_syntax(mut self, name: &str, syntax: AttributeSyntax) -> Self {
        self.schema.insert(name.to_lowercase(), syntax);
        self
    }

    pub fn naming_context(&self) -> &DistinguishedName {
        &self.naming_context
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, DirectoryError> {
        let mut directory = Self::new(snapshot.naming_context).allow_anonymous(snapshot.allow_anonymous);
        for (user, password) in &snapshot.accounts {
            directory = directory.with_account(user, password);
        }
        for (name, oid) in &snapshot.schema {
            let syntax: AttributeSyntax = oid.parse()?;
            directory = directory.with_attribute_syntax(name, syntax);
        }

        {
            let mut entries = directory.write()?;
            for mut entry in snapshot.entries {
                stamp(&mut entry);
                entries.insert(entry.dn.key(), entry);
            }
        }
        Ok(directory)
    }

    pub fn snapshot(&self) -> Result<Snapshot, DirectoryError> {
        let entries = self.read()?;
        let mut accounts: BTreeMap<String, String> = BTreeMap::new();
        accounts.extend(self.accounts.iter().map(|(k, v)| (k.clone(), v.clone())));
        let mut schema: BTreeMap<String, String> = BTreeMap::new();
        schema.extend(self.schema.iter().map(|(k, v)| (k.clone(), v.oid().to_string())));
        Ok(Snapshot {
            naming_context: self.naming_context.clone(),
            allow_anonymous: self.allow_anonymous,
            accounts,
            schema,
            entries: entries.values().cloned().collect(),
        })
    }

    /// Загрузить снимок из JSON-файла
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        let directory = Self::from_snapshot(snapshot)?;
        info!(path = %path.display(), objects = directory.len(), "directory snapshot loaded");
        Ok(directory)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DirectoryError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&self.snapshot()?)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        info!(path = %path.display(), "directory snapshot saved");
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, RawEntry>>, DirectoryError> {
        self.entries.read().map_err(|_| DirectoryError::Poisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, RawEntry>>, DirectoryError> {
        self.entries.write().map_err(|_| DirectoryError::Poisoned)
    }

    fn root_dse(&self) -> RawEntry {
        let context = RawValue::text(self.naming_context.as_str());
        RawEntry::new(DistinguishedName::empty())
            .with("defaultNamingContext", context.clone())
            .with("rootDomainNamingContext", context.clone())
            .with("namingContexts", RawValue::Multi(vec![context]))
            .with("supportedLDAPVersion", RawValue::Multi(vec![RawValue::text("3")]))
            .with("isGlobalCatalogReady", RawValue::text("TRUE"))
            .with("isSynchronized", RawValue::text("TRUE"))
    }
}

impl DirectoryBackend for MemoryDirectory {
    fn bind(&self, credentials: Option<&Credentials>) -> Result<(), DirectoryError> {
        let Some(credentials) = credentials else {
            return Ok(());
        };
        match credentials.kind {
            CredentialKind::Passthrough => Ok(()),
            CredentialKind::Anonymous if self.allow_anonymous => Ok(()),
            CredentialKind::Anonymous => Err(DirectoryError::InvalidCredentials(
                "anonymous bind is not allowed".to_string(),
            )),
            CredentialKind::Simple => {
                let user = credentials.username.as_deref().unwrap_or_default();
                if self.accounts.is_empty() {
                    return Ok(());
                }
                match self.accounts.get(&user.to_lowercase()) {
                    Some(password) if Some(password.as_str()) == credentials.password.as_deref() => Ok(()),
                    _ => {
                        warn!(user, "bind rejected");
                        Err(DirectoryError::InvalidCredentials(user.to_string()))
                    }
                }
            }
        }
    }

    fn fetch(&self, path: &DirectoryPath) -> Result<RawEntry, DirectoryError> {
        if path.is_root_dse() {
            return Ok(self.root_dse());
        }
        let dn = path.dn()?;
        self.read()?
            .get(&dn.key())
            .cloned()
            .ok_or_else(|| DirectoryError::ObjectNotFound(dn.to_string()))
    }

    fn create(&self, mut entry: RawEntry) -> Result<(), DirectoryError> {
        let mut entries = self.write()?;
        let key = entry.dn.key();
        if entries.contains_key(&key) {
            return Err(DirectoryError::AlreadyExists(entry.dn.to_string()));
        }
        match entry.dn.parent() {
            Some(parent) if entries.contains_key(&parent.key()) => {}
            Some(parent) => return Err(DirectoryError::ObjectNotFound(parent.to_string())),
            None => return Err(DirectoryError::BadPath(format!("no parent for '{}'", entry.dn))),
        }

        let members = dn_values(entry.get(MEMBER));
        for member in &members {
            if !entries.contains_key(&member.key()) {
                return Err(DirectoryError::ObjectNotFound(member.to_string()));
            }
        }

        stamp(&mut entry);
        let dn = entry.dn.clone();
        entries.insert(key, entry);
        relink(&mut entries, &dn, &members, &[]);
        info!(dn = %dn, "object created");
        Ok(())
    }

    fn delete(&self, path: &DirectoryPath) -> Result<(), DirectoryError> {
        let dn = path.dn()?;
        let mut entries = self.write()?;
        let entry = entries
            .get(&dn.key())
            .cloned()
            .ok_or_else(|| DirectoryError::ObjectNotFound(dn.to_string()))?;
        if entries.values().any(|e| e.dn.is_child_of(&dn)) {
            return Err(DirectoryError::from_hresult(
                i64::from(hresult::ERROR_DS_CANT_ON_NON_LEAF),
                format!("'{}' has children", dn),
            ));
        }

        let members = dn_values(entry.get(MEMBER));
        relink(&mut entries, &dn, &[], &members);
        // убрать объект из групп, где он состоит
        for group in dn_values(entry.get(MEMBER_OF)) {
            if let Some(group_entry) = entries.get_mut(&group.key()) {
                let remaining = remove_dn(group_entry.get(MEMBER), &dn);
                group_entry.set(MEMBER, remaining);
            }
        }
        entries.remove(&dn.key());
        info!(dn = %dn, "object deleted");
        Ok(())
    }

    fn modify(&self, path: &DirectoryPath, changes: &[Modification]) -> Result<(), DirectoryError> {
        let dn = path.dn()?;
        let mut entries = self.write()?;
        let original = entries
            .get(&dn.key())
            .cloned()
            .ok_or_else(|| DirectoryError::ObjectNotFound(dn.to_string()))?;

        let mut updated = original.clone();
        for change in changes {
            apply(&mut updated, change)?;
        }

        let before = dn_values(original.get(MEMBER));
        let after = dn_values(updated.get(MEMBER));
        let added: Vec<DistinguishedName> = after.iter().filter(|d| !before.contains(d)).cloned().collect();
        let removed: Vec<DistinguishedName> = before.iter().filter(|d| !after.contains(d)).cloned().collect();
        for member in &added {
            if !entries.contains_key(&member.key()) {
                return Err(DirectoryError::ObjectNotFound(member.to_string()));
            }
        }

        entries.insert(dn.key(), updated);
        relink(&mut entries, &dn, &added, &removed);
        debug!(dn = %dn, changes = changes.len(), "object modified");
        Ok(())
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<RawEntry>, DirectoryError> {
        let entries = self.read()?;
        if !entries.contains_key(&request.base.key()) {
            return Err(DirectoryError::ObjectNotFound(request.base.to_string()));
        }

        let resolve = |entry: &RawEntry, attr: &str, target: &DistinguishedName| {
            in_chain(&entries, entry, attr, target)
        };

        let limit = request.size_limit.unwrap_or(usize::MAX);
        let found: Vec<RawEntry> = entries
            .values()
            .filter(|e| in_scope(&e.dn, &request.base, request.scope))
            .filter(|e| request.filter.matches_with(e, &resolve))
            .take(limit)
            .map(|e| {
                let mut projected = e.project(&request.attributes);
                if let Some(range) = request.range {
                    apply_range(&mut projected, range);
                }
                projected
            })
            .collect();
        debug!(base = %request.base, filter = %request.filter, found = found.len(), "memory search");
        Ok(found)
    }

    fn attribute_syntax(&self, name: &str) -> Option<AttributeSyntax> {
        self.schema.get(&name.to_lowercase()).copied()
    }
}

/// distinguishedName и name всегда соответствуют DN
fn stamp(entry: &mut RawEntry) {
    let dn = entry.dn.clone();
    entry.set("distinguishedName", RawValue::text(dn.as_str()));
    if let Some(name) = dn.name() {
        entry.set("name", RawValue::text(name));
    }
}

fn in_scope(dn: &DistinguishedName, base: &DistinguishedName, scope: Scope) -> bool {
    match scope {
        Scope::Base => dn == base,
        Scope::OneLevel => dn.is_child_of(base),
        Scope::Subtree => dn == base || dn.is_descendant_of(base),
    }
}

fn dn_values(raw: Option<&RawValue>) -> Vec<DistinguishedName> {
    raw.map(RawValue::values)
        .unwrap_or_default()
        .into_iter()
        .filter_map(RawValue::as_text)
        .filter_map(|s| DistinguishedName::parse(s).ok())
        .collect()
}

fn from_values(mut values: Vec<RawValue>) -> RawValue {
    match values.len() {
        0 => RawValue::Null,
        1 => values.remove(0),
        _ => RawValue::Multi(values),
    }
}

fn remove_dn(raw: Option<&RawValue>, dn: &DistinguishedName) -> RawValue {
    let kept = raw
        .map(RawValue::values)
        .unwrap_or_default()
        .into_iter()
        .filter(|v| !v.as_text().is_some_and(|s| same_value(s, dn.as_str())))
        .cloned()
        .collect();
    from_values(kept)
}

fn same_value(a: &str, b: &str) -> bool {
    match (DistinguishedName::parse(a), DistinguishedName::parse(b)) {
        (Ok(a), Ok(b)) if !a.is_empty() => a == b,
        _ => a.eq_ignore_ascii_case(b),
    }
}

/// Равенство значений атрибута: текст и DN без учёта регистра
pub(crate) fn same_raw(a: &RawValue, b: &RawValue) -> bool {
    match (a.as_text(), b.as_text()) {
        (Some(x), Some(y)) => same_value(x, y),
        _ => a == b,
    }
}

fn contains_value(values: &[RawValue], wanted: &RawValue) -> bool {
    values.iter().any(|v| same_raw(v, wanted))
}

/// Одно изменение над копией объекта
fn apply(entry: &mut RawEntry, change: &Modification) -> Result<(), DirectoryError> {
    let attr = change.attribute.as_str();
    let is_member = attr.eq_ignore_ascii_case(MEMBER);
    let mut current: Vec<RawValue> = entry.values(attr).into_iter().cloned().collect();

    match change.operation {
        PropertyOperation::Clear => {
            entry.remove(attr);
        }
        PropertyOperation::Update => {
            entry.set(attr, change.value.clone());
        }
        PropertyOperation::Append => {
            for value in change.value.values() {
                if contains_value(&current, value) {
                    let shown = value.to_string();
                    return Err(if is_member {
                        DirectoryError::MemberAlreadyInGroup(shown)
                    } else {
                        DirectoryError::AlreadyExists(format!("{} already has value {}", attr, shown))
                    });
                }
                current.push(value.clone());
            }
            entry.set(attr, from_values(current));
        }
        PropertyOperation::Delete => {
            for value in change.value.values() {
                if !contains_value(&current, value) {
                    let shown = value.to_string();
                    return Err(if is_member {
                        DirectoryError::MemberNotInGroup(shown)
                    } else {
                        DirectoryError::PropertyNotFound(format!("{} has no value {}", attr, shown))
                    });
                }
                current.retain(|v| !same_raw(v, value));
            }
            entry.set(attr, from_values(current));
        }
    }
    Ok(())
}

/// Обновить memberOf у добавленных и удалённых участников группы `group`
fn relink(
    entries: &mut BTreeMap<String, RawEntry>,
    group: &DistinguishedName,
    added: &[DistinguishedName],
    removed: &[DistinguishedName],
) {
    for member in added {
        if let Some(entry) = entries.get_mut(&member.key()) {
            let mut values: Vec<RawValue> = entry.values(MEMBER_OF).into_iter().cloned().collect();
            let link = RawValue::text(group.as_str());
            if !contains_value(&values, &link) {
                values.push(link);
            }
            entry.set(MEMBER_OF, RawValue::Multi(values));
        }
    }
    for member in removed {
        if let Some(entry) = entries.get_mut(&member.key()) {
            let remaining = remove_dn(entry.get(MEMBER_OF), group);
            entry.set(MEMBER_OF, remaining);
        }
    }
}

/// LDAP_MATCHING_RULE_IN_CHAIN: обход ссылок `attr` в ширину
fn in_chain(
    entries: &BTreeMap<String, RawEntry>,
    entry: &RawEntry,
    attr: &str,
    target: &DistinguishedName,
) -> bool {
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<DistinguishedName> = dn_values(entry.get(attr)).into();
    while let Some(dn) = queue.pop_front() {
        if &dn == target {
            return true;
        }
        if !seen.insert(dn.key()) {
            continue;
        }
        if let Some(next) = entries.get(&dn.key()) {
            queue.extend(dn_values(next.get(attr)));
        }
    }
    false
}

/// `Range=a-b`: оставить значения многозначных атрибутов с a по b включительно
fn apply_range(entry: &mut RawEntry, (first, last): (u32, u32)) {
    let ranged: Vec<(String, RawValue)> = entry
        .attributes()
        .filter_map(|(name, raw)| match raw {
            RawValue::Multi(items) => {
                let start = (first as usize).min(items.len());
                let end = (last as usize).saturating_add(1).min(items.len());
                let slice = if start < end { items[start..end].to_vec() } else { Vec::new() };
                Some((name.to_string(), RawValue::Multi(slice)))
            }
            _ => None,
        })
        .collect();
    for (name, value) in ranged {
        entry.set(&name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{self, Filter};

    fn dn(s: &str) -> DistinguishedName {
        DistinguishedName::parse(s).unwrap()
    }

    fn path(s: &str) -> DirectoryPath {
        DirectoryPath::for_dn(Default::default(), None, &dn(s))
    }

    fn sample() -> MemoryDirectory {
        crate::logging::init_test_logging();
        let directory = MemoryDirectory::new(dn("DC=corp,DC=acme"));
        directory
            .create(
                RawEntry::new(dn("OU=Staff,DC=corp,DC=acme")).with(
                    "objectClass",
                    RawValue::Multi(vec![RawValue::text("top"), RawValue::text("organizationalUnit")]),
                ),
            )
            .unwrap();
        for name in ["jdoe", "asmith"] {
            directory
                .create(
                    RawEntry::new(dn(&format!("CN={},OU=Staff,DC=corp,DC=acme", name)))
                        .with("objectClass", RawValue::Multi(vec![RawValue::text("top"), RawValue::text("user")]))
                        .with("sAMAccountName", RawValue::text(name)),
                )
                .unwrap();
        }
        for name in ["Staff", "Everyone"] {
            directory
                .create(
                    RawEntry::new(dn(&format!("CN={},DC=corp,DC=acme", name)))
                        .with("objectClass", RawValue::Multi(vec![RawValue::text("top"), RawValue::text("group")])),
                )
                .unwrap();
        }
        directory
    }

    #[test]
    fn create_requires_parent_and_unique_dn() {
        let directory = sample();
        let err = directory
            .create(RawEntry::new(dn("CN=x,OU=Nowhere,DC=corp,DC=acme")))
            .unwrap_err();
        assert!(matches!(err, DirectoryError::ObjectNotFound(_)));
        let err = directory
            .create(RawEntry::new(dn("CN=JDOE,OU=Staff,DC=corp,DC=acme")))
            .unwrap_err();
        assert!(matches!(err, DirectoryError::AlreadyExists(_)));
    }

    #[test]
    fn membership_keeps_back_links() {
        let directory = sample();
        let staff = path("CN=Staff,DC=corp,DC=acme");
        let jdoe = "CN=jdoe,OU=Staff,DC=corp,DC=acme";

        directory
            .modify(&staff, &[Modification::append(MEMBER, RawValue::text(jdoe))])
            .unwrap();
        let user = directory.fetch(&path(jdoe)).unwrap();
        assert_eq!(user.texts(MEMBER_OF), vec!["CN=Staff,DC=corp,DC=acme"]);

        let err = directory
            .modify(&staff, &[Modification::append(MEMBER, RawValue::text(jdoe))])
            .unwrap_err();
        assert!(matches!(err, DirectoryError::MemberAlreadyInGroup(_)));

        directory
            .modify(&staff, &[Modification::delete(MEMBER, RawValue::text(jdoe))])
            .unwrap();
        assert!(directory.fetch(&path(jdoe)).unwrap().texts(MEMBER_OF).is_empty());

        let err = directory
            .modify(&staff, &[Modification::delete(MEMBER, RawValue::text(jdoe))])
            .unwrap_err();
        assert!(matches!(err, DirectoryError::MemberNotInGroup(_)));
    }

    #[test]
    fn failed_modify_changes_nothing() {
        let directory = sample();
        let target = path("CN=jdoe,OU=Staff,DC=corp,DC=acme");
        let err = directory
            .modify(
                &target,
                &[
                    Modification::update("displayName", RawValue::text("John")),
                    Modification::delete("mail", RawValue::text("none@corp")),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, DirectoryError::PropertyNotFound(_)));
        assert!(directory.fetch(&target).unwrap().get("displayName").is_none());
    }

    #[test]
    fn delete_refuses_non_leaf() {
        let directory = sample();
        let err = directory.delete(&path("OU=Staff,DC=corp,DC=acme")).unwrap_err();
        assert_eq!(err.hresult(), Some(hresult::ERROR_DS_CANT_ON_NON_LEAF));
        directory.delete(&path("CN=asmith,OU=Staff,DC=corp,DC=acme")).unwrap();
        assert!(matches!(
            directory.fetch(&path("CN=asmith,OU=Staff,DC=corp,DC=acme")),
            Err(DirectoryError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn search_scopes() {
        let directory = sample();
        let base = dn("DC=corp,DC=acme");
        let all = Filter::Present("objectClass".into());
        let count = |scope| {
            directory
                .search(&SearchRequest::new(base.clone(), all.clone()).scope(scope))
                .unwrap()
                .len()
        };
        assert_eq!(count(Scope::Base), 1);
        assert_eq!(count(Scope::OneLevel), 3);
        assert_eq!(count(Scope::Subtree), 6);
    }

    #[test]
    fn nested_membership_in_chain() {
        let directory = sample();
        let jdoe = "CN=jdoe,OU=Staff,DC=corp,DC=acme";
        directory
            .modify(&path("CN=Staff,DC=corp,DC=acme"), &[Modification::append(MEMBER, RawValue::text(jdoe))])
            .unwrap();
        directory
            .modify(
                &path("CN=Everyone,DC=corp,DC=acme"),
                &[Modification::append(MEMBER, RawValue::text("CN=Staff,DC=corp,DC=acme"))],
            )
            .unwrap();

        let everyone = dn("CN=Everyone,DC=corp,DC=acme");
        let request = SearchRequest::new(dn("DC=corp,DC=acme"), filter::within(MEMBER_OF, &everyone));
        let found: Vec<String> = directory
            .search(&request)
            .unwrap()
            .into_iter()
            .map(|e| e.dn.to_string())
            .collect();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&jdoe.to_string()));
    }

    #[test]
    fn bind_checks_accounts() {
        let directory = sample().with_account("admin", "pw");
        assert!(directory.bind(None).is_ok());
        assert!(directory.bind(Some(&Credentials::simple("ADMIN", "pw"))).is_ok());
        assert!(matches!(
            directory.bind(Some(&Credentials::simple("admin", "nope"))),
            Err(DirectoryError::InvalidCredentials(_))
        ));
        assert!(directory.bind(Some(&Credentials::anonymous())).is_err());
        let open = sample().allow_anonymous(true);
        assert!(open.bind(Some(&Credentials::anonymous())).is_ok());
    }

    #[test]
    fn range_limits_multi_values() {
        let mut entry = RawEntry::new(dn("CN=g,DC=corp"))
            .with("member", RawValue::Multi((0..5).map(|i| RawValue::text(format!("CN=u{}", i))).collect()));
        apply_range(&mut entry, (1, 2));
        assert_eq!(entry.texts("member"), vec!["CN=u1", "CN=u2"]);
    }

    #[test]
    fn snapshot_round_trip() {
        let directory = sample().with_attribute_syntax("uSNChanged", AttributeSyntax::LargeInteger);
        let file = tempfile::NamedTempFile::new().unwrap();
        directory.save(file.path()).unwrap();

        let loaded = MemoryDirectory::load(file.path()).unwrap();
        assert_eq!(loaded.len(), directory.len());
        assert_eq!(loaded.attribute_syntax("usnchanged"), Some(AttributeSyntax::LargeInteger));
        let user = loaded.fetch(&path("CN=jdoe,OU=Staff,DC=corp,DC=acme")).unwrap();
        assert_eq!(user.texts("sAMAccountName"), vec!["jdoe"]);
    }
}

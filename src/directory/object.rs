// src/directory/object.rs

use std::fmt;
use tracing::{debug, info};

use crate::codec::{RawValue, Value};
use crate::directory::memory::same_raw;
use crate::directory::{class_filter, user_filter, Directory, Modification, SearchRequest};
use crate::entry::RawEntry;
use crate::error::DirectoryError;
use crate::filter::{self, Filter, Scope};
use crate::models::{GroupType, PropertyOperation, SamAccountType};
use crate::path::{DirectoryPath, DistinguishedName, Rdn};

/// Классы, которые считаются контейнерами при обходе дерева
const CONTAINER_CLASSES: [&str; 5] = [
    "organizationalUnit",
    "container",
    "domainDNS",
    "builtinDomain",
    "lostAndFound",
];

/// Объект каталога, открытый через `Directory`.
///
/// Держит снимок атрибутов и очередь несохранённых изменений.
/// `set` меняет локальный снимок сразу, в каталог всё уходит на `commit`.
/// Изменения членства в группах применяются немедленно.
#[derive(Clone)]
pub struct DirectoryObject<'d> {
    directory: &'d Directory,
    path: DirectoryPath,
    entry: RawEntry,
    pending: Vec<Modification>,
}

impl<'d> DirectoryObject<'d> {
    pub(crate) fn new(directory: &'d Directory, path: DirectoryPath, entry: RawEntry) -> Self {
        Self {
            directory,
            path,
            entry,
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &DirectoryPath {
        &self.path
    }

    pub fn dn(&self) -> &DistinguishedName {
        &self.entry.dn
    }

    /// Значение первого RDN (`CN=jdoe,...` → `jdoe`)
    pub fn name(&self) -> Option<String> {
        self.entry.dn.name()
    }

    pub fn raw_entry(&self) -> &RawEntry {
        &self.entry
    }

    pub fn object_class(&self) -> Vec<&str> {
        self.entry.texts("objectClass")
    }

    /// Самый конкретный класс: последний в objectClass
    pub fn class(&self) -> Option<&str> {
        self.object_class().last().copied()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.entry.has_object_class(class)
    }

    pub fn is_container(&self) -> bool {
        CONTAINER_CLASSES.iter().any(|c| self.has_class(c))
    }

    pub fn is_group(&self) -> bool {
        self.has_class("group")
    }

    /// Есть ли несохранённые изменения
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending(&self) -> &[Modification] {
        &self.pending
    }

    // ---------- атрибуты ----------

    /// Декодированное значение; отсутствующий атрибут даёт `Value::Null`
    pub fn get(&self, name: &str) -> Value {
        match self.entry.get(name) {
            Some(raw) => self.directory.decode(name, raw),
            None => Value::Null,
        }
    }

    pub fn try_get(&self, name: &str) -> Result<Value, DirectoryError> {
        let raw = self
            .entry
            .get(name)
            .ok_or_else(|| DirectoryError::PropertyNotFound(format!("{} on {}", name, self.entry.dn)))?;
        Ok(self.directory.decode(name, raw))
    }

    pub fn raw(&self, name: &str) -> Option<&RawValue> {
        self.entry.get(name)
    }

    /// Записать значение (Update); `Value::Null` очищает атрибут
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), DirectoryError> {
        if value.is_null() {
            self.clear(name);
            return Ok(());
        }
        let raw = self.directory.encode(name, &value)?;
        self.entry.set(name, raw.clone());
        self.pending.push(Modification::update(name, raw));
        Ok(())
    }

    pub fn set_many<I>(&mut self, values: I) -> Result<(), DirectoryError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (name, value) in values {
            self.set(&name, value)?;
        }
        Ok(())
    }

    pub fn clear(&mut self, name: &str) {
        self.entry.remove(name);
        self.pending.push(Modification::clear(name));
    }

    /// Аналог PutEx: операция над значениями многозначного атрибута
    pub fn put_ex(&mut self, operation: PropertyOperation, name: &str, value: Value) -> Result<(), DirectoryError> {
        let raw = match operation {
            PropertyOperation::Clear => RawValue::Null,
            _ => self.directory.encode(name, &value)?,
        };
        let mut values: Vec<RawValue> = self.entry.values(name).into_iter().cloned().collect();
        match operation {
            PropertyOperation::Clear => values.clear(),
            PropertyOperation::Update => values = raw.values().into_iter().cloned().collect(),
            PropertyOperation::Append => values.extend(raw.values().into_iter().cloned()),
            PropertyOperation::Delete => {
                let removed = raw.values();
                values.retain(|v| !removed.iter().any(|r| same_raw(v, r)));
            }
        }
        let local = match values.len() {
            0 => RawValue::Null,
            1 => values.remove(0),
            _ => RawValue::Multi(values),
        };
        self.entry.set(name, local);
        self.pending.push(Modification {
            attribute: name.to_string(),
            operation,
            value: raw,
        });
        Ok(())
    }

    pub fn append(&mut self, name: &str, value: Value) -> Result<(), DirectoryError> {
        self.put_ex(PropertyOperation::Append, name, value)
    }

    // ---------- сохранение ----------

    /// Отправить накопленные изменения одним вызовом
    pub fn commit(&mut self) -> Result<(), DirectoryError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.directory.backend().modify(&self.path, &self.pending)?;
        info!(dn = %self.entry.dn, changes = self.pending.len(), "changes committed");
        self.pending.clear();
        self.refresh()
    }

    /// Перечитать объект; несохранённые изменения отбрасываются
    pub fn refresh(&mut self) -> Result<(), DirectoryError> {
        self.entry = self.directory.backend().fetch(&self.path)?;
        self.pending.clear();
        Ok(())
    }

    pub fn delete(self) -> Result<(), DirectoryError> {
        self.directory.backend().delete(&self.path)
    }

    // ---------- навигация ----------

    /// Родитель; у корня домена его нет
    pub fn parent(&self) -> Result<Option<DirectoryObject<'d>>, DirectoryError> {
        let Some(dn) = self.entry.dn.parent() else {
            return Ok(None);
        };
        if self.entry.dn == self.directory.default_naming_context()? {
            return Ok(None);
        }
        self.directory.open_dn(&dn).map(Some)
    }

    /// Непосредственные потомки
    pub fn children(&self) -> Result<Vec<DirectoryObject<'d>>, DirectoryError> {
        self.search_scope(filter::present("objectClass"), Scope::OneLevel)
    }

    /// Обход контейнеров в глубину, начиная с этого объекта
    pub fn walk(&self) -> Result<Vec<Level<'d>>, DirectoryError> {
        let mut levels = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(container) = stack.pop() {
            let (containers, items): (Vec<_>, Vec<_>) =
                container.children()?.into_iter().partition(DirectoryObject::is_container);
            stack.extend(containers.iter().rev().cloned());
            levels.push(Level {
                container,
                containers,
                items,
            });
        }
        Ok(levels)
    }

    /// Все листья поддерева
    pub fn flat(&self) -> Result<Vec<DirectoryObject<'d>>, DirectoryError> {
        Ok(self.walk()?.into_iter().flat_map(|level| level.items).collect())
    }

    /// Поиск по поддереву этого объекта
    pub fn search(&self, filter: Filter) -> Result<Vec<DirectoryObject<'d>>, DirectoryError> {
        self.search_scope(filter, Scope::Subtree)
    }

    fn search_scope(&self, filter: Filter, scope: Scope) -> Result<Vec<DirectoryObject<'d>>, DirectoryError> {
        let request = SearchRequest::new(self.entry.dn.clone(), filter).scope(scope);
        let directory = self.directory;
        let entries = directory.search_all(request)?;
        Ok(entries
            .into_iter()
            .filter(|e| scope != Scope::Subtree || e.dn != self.entry.dn)
            .map(|entry| DirectoryObject::new(directory, directory.path_for(&entry.dn), entry))
            .collect())
    }

    pub fn find_user(&self, name: &str) -> Result<Option<DirectoryObject<'d>>, DirectoryError> {
        Ok(self.search(user_filter(name))?.into_iter().next())
    }

    pub fn find_group(&self, name: &str) -> Result<Option<DirectoryObject<'d>>, DirectoryError> {
        Ok(self.search(class_filter("group", name))?.into_iter().next())
    }

    pub fn find_ou(&self, name: &str) -> Result<Option<DirectoryObject<'d>>, DirectoryError> {
        Ok(self.search(class_filter("organizationalUnit", name))?.into_iter().next())
    }

    // ---------- создание ----------

    /// Создать дочерний объект `rdn_attr=name` класса `class` и открыть его
    pub fn create_child(
        &self,
        rdn_attr: &str,
        name: &str,
        class: &str,
        attributes: Vec<(&str, Value)>,
    ) -> Result<DirectoryObject<'d>, DirectoryError> {
        let dn = self.entry.dn.child(Rdn::new(rdn_attr, name));
        let mut entry = RawEntry::new(dn.clone()).with(
            "objectClass",
            RawValue::Multi(vec![RawValue::text("top"), RawValue::text(class)]),
        );
        for (attr, value) in attributes {
            entry.set(attr, self.directory.encode(attr, &value)?);
        }
        self.directory.backend().create(entry)?;
        self.directory.open_dn(&dn)
    }

    pub fn new_ou(&self, name: &str, description: Option<&str>) -> Result<DirectoryObject<'d>, DirectoryError> {
        let attributes = description
            .map(|d| vec![("description", Value::Text(d.to_string()))])
            .unwrap_or_default();
        self.create_child("OU", name, "organizationalUnit", attributes)
    }

    pub fn new_group(&self, name: &str, group_type: GroupType) -> Result<DirectoryObject<'d>, DirectoryError> {
        let sam_type = if group_type.is_security_group() {
            SamAccountType::GroupObject
        } else {
            SamAccountType::NonSecurityGroupObject
        };
        self.create_child(
            "CN",
            name,
            "group",
            vec![
                ("sAMAccountName", Value::Text(name.to_string())),
                ("groupType", Value::Integer(i64::from(group_type.bits() as i32))),
                ("sAMAccountType", Value::Integer(i64::from(sam_type.value()))),
            ],
        )
    }

    pub fn new_user(&self, name: &str, sam_account_name: &str) -> Result<DirectoryObject<'d>, DirectoryError> {
        self.create_child(
            "CN",
            name,
            "user",
            vec![
                ("sAMAccountName", Value::Text(sam_account_name.to_string())),
                (
                    "sAMAccountType",
                    Value::Integer(i64::from(SamAccountType::NormalUserAccount.value())),
                ),
            ],
        )
    }

    // ---------- членство ----------

    /// Участники группы
    pub fn members(&self) -> Result<Vec<DirectoryObject<'d>>, DirectoryError> {
        self.linked("member")
    }

    /// Группы, где состоит объект
    pub fn member_of(&self) -> Result<Vec<DirectoryObject<'d>>, DirectoryError> {
        self.linked("memberOf")
    }

    fn linked(&self, attr: &str) -> Result<Vec<DirectoryObject<'d>>, DirectoryError> {
        self.entry
            .texts(attr)
            .into_iter()
            .map(|text| {
                let dn = DistinguishedName::parse(text)?;
                self.directory.open_dn(&dn)
            })
            .collect()
    }

    pub fn add_member(&mut self, member: &DirectoryObject<'_>) -> Result<(), DirectoryError> {
        self.change_membership(PropertyOperation::Append, member.dn())
    }

    pub fn remove_member(&mut self, member: &DirectoryObject<'_>) -> Result<(), DirectoryError> {
        self.change_membership(PropertyOperation::Delete, member.dn())
    }

    fn change_membership(&mut self, operation: PropertyOperation, member: &DistinguishedName) -> Result<(), DirectoryError> {
        let change = Modification {
            attribute: "member".to_string(),
            operation,
            value: RawValue::text(member.as_str()),
        };
        self.directory.backend().modify(&self.path, std::slice::from_ref(&change))?;
        debug!(group = %self.entry.dn, member = %member, operation = operation.name(), "membership changed");
        self.entry = self.directory.backend().fetch(&self.path)?;
        Ok(())
    }

    /// Все атрибуты в декодированном виде, по имени
    pub fn dump(&self) -> Vec<(String, Value)> {
        self.entry
            .attributes()
            .map(|(name, raw)| (name.to_string(), self.directory.decode(name, raw)))
            .collect()
    }
}

impl PartialEq for DirectoryObject<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.entry.dn == other.entry.dn
    }
}

impl fmt::Debug for DirectoryObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryObject")
            .field("path", &self.path.to_string())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl fmt::Display for DirectoryObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {}>", self.class().unwrap_or("object"), self.entry.dn)
    }
}

/// Один шаг `walk`
#[derive(Debug, Clone)]
pub struct Level<'d> {
    pub container: DirectoryObject<'d>,
    pub containers: Vec<DirectoryObject<'d>>,
    pub items: Vec<DirectoryObject<'d>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;
    use crate::models::UserAccountControl;
    use chrono::{TimeZone, Utc};

    fn directory() -> Directory {
        crate::logging::init_test_logging();
        let memory = MemoryDirectory::new(DistinguishedName::parse("DC=corp,DC=acme").unwrap());
        Directory::new(memory)
    }

    #[test]
    fn create_and_navigate() {
        let dir = directory();
        let root = dir.root().unwrap();
        assert!(root.is_container());

        let staff = root.new_ou("Staff", Some("people")).unwrap();
        assert_eq!(staff.get("description"), Value::Text("people".into()));
        let jdoe = staff.new_user("John Doe", "jdoe").unwrap();
        assert_eq!(jdoe.name().as_deref(), Some("John Doe"));
        assert_eq!(jdoe.parent().unwrap().unwrap(), staff);

        let children = root.children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(root.flat().unwrap(), vec![jdoe.clone()]);
        assert_eq!(root.find_user("jdoe").unwrap().unwrap(), jdoe);
        assert_eq!(dir.find_ou("Staff").unwrap().unwrap(), staff);
        assert!(root.parent().unwrap().is_none());
    }

    #[test]
    fn set_encodes_and_commits() {
        let dir = directory();
        let root = dir.root().unwrap();
        let mut user = root.new_user("jdoe", "jdoe").unwrap();

        let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        user.set("accountExpires", Value::DateTime(expires)).unwrap();
        user.set(
            "userAccountControl",
            Value::flags(["NORMAL_ACCOUNT", "DONT_EXPIRE_PASSWD"]),
        )
        .unwrap();
        assert!(user.is_dirty());
        user.commit().unwrap();
        assert!(!user.is_dirty());

        let reopened = dir.open_dn(user.dn()).unwrap();
        assert_eq!(reopened.get("accountExpires"), Value::DateTime(expires));
        let uac = (UserAccountControl::NORMAL_ACCOUNT | UserAccountControl::DONT_EXPIRE_PASSWD).bits();
        assert_eq!(reopened.raw("userAccountControl"), Some(&RawValue::Integer(uac as i32)));
    }

    #[test]
    fn unknown_flag_name_is_rejected() {
        let dir = directory();
        let mut root = dir.root().unwrap();
        let err = root
            .set("userAccountControl", Value::flags(["NOT_A_FLAG"]))
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Codec(_)));
        assert!(!root.is_dirty());
    }

    #[test]
    fn group_membership() {
        let dir = directory();
        let root = dir.root().unwrap();
        let mut group = root
            .new_group("Staff", GroupType::GLOBAL | GroupType::SECURITY_ENABLED)
            .unwrap();
        let user = root.new_user("jdoe", "jdoe").unwrap();

        group.add_member(&user).unwrap();
        assert_eq!(group.members().unwrap(), vec![user.clone()]);
        assert!(matches!(
            group.add_member(&user),
            Err(DirectoryError::MemberAlreadyInGroup(_))
        ));

        let user = dir.open_dn(user.dn()).unwrap();
        assert_eq!(user.member_of().unwrap(), vec![group.clone()]);

        group.remove_member(&user).unwrap();
        assert!(group.members().unwrap().is_empty());
        assert!(matches!(
            group.remove_member(&user),
            Err(DirectoryError::MemberNotInGroup(_))
        ));
    }

    #[test]
    fn put_ex_delete_matches_backend_case_rules() {
        let dir = directory();
        let root = dir.root().unwrap();
        let mut user = root.new_user("jdoe", "jdoe").unwrap();
        user.append("proxyAddresses", Value::Text("smtp:jdoe@corp.acme".into())).unwrap();
        user.append("proxyAddresses", Value::Text("SMTP:John.Doe@corp.acme".into())).unwrap();
        user.commit().unwrap();

        user.put_ex(
            PropertyOperation::Delete,
            "proxyAddresses",
            Value::Text("SMTP:JDOE@CORP.ACME".into()),
        )
        .unwrap();
        let local = user.raw("proxyAddresses").cloned();
        assert_eq!(local, Some(RawValue::text("SMTP:John.Doe@corp.acme")));
        user.commit().unwrap();

        let reopened = dir.open_dn(user.dn()).unwrap();
        assert_eq!(reopened.raw("proxyAddresses").cloned(), local);
    }

    #[test]
    fn group_type_decodes_to_names() {
        let dir = directory();
        let group = dir
            .root()
            .unwrap()
            .new_group("Staff", GroupType::UNIVERSAL | GroupType::SECURITY_ENABLED)
            .unwrap();
        match group.get("groupType") {
            Value::Flags(names) => {
                assert!(names.contains("UNIVERSAL"));
                assert!(names.contains("SECURITY_ENABLED"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(group.get("sAMAccountType"), Value::Name("GROUP_OBJECT".into()));
    }

    #[test]
    fn missing_attribute() {
        let dir = directory();
        let root = dir.root().unwrap();
        assert_eq!(root.get("mail"), Value::Null);
        assert!(matches!(root.try_get("mail"), Err(DirectoryError::PropertyNotFound(_))));
    }

    #[test]
    fn delete_leaf() {
        let dir = directory();
        let root = dir.root().unwrap();
        let ou = root.new_ou("Temp", None).unwrap();
        let dn = ou.dn().clone();
        ou.delete().unwrap();
        assert!(matches!(dir.open_dn(&dn), Err(DirectoryError::ObjectNotFound(_))));
    }
}

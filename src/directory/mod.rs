// src/directory/mod.rs

//! Доступ к каталогу: граница `DirectoryBackend`, фасад `Directory`
//! и объект каталога `DirectoryObject`.

pub mod memory;
pub mod object;

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::codec::{AttributeSyntax, CodecTable, RawValue, Value};
use crate::credentials::{self, Credentials};
use crate::entry::RawEntry;
use crate::error::DirectoryError;
use crate::filter::{self, Filter, QueryString, Scope};
use crate::models::{PropertyOperation, SamAccountType};
use crate::path::{DirectoryPath, DistinguishedName, Scheme};

pub use memory::MemoryDirectory;
pub use object::DirectoryObject;

/// Изменение атрибута (аналог PutEx)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub attribute: String,
    pub operation: PropertyOperation,
    pub value: RawValue,
}

impl Modification {
    pub fn update(attribute: &str, value: RawValue) -> Self {
        Self {
            attribute: attribute.to_string(),
            operation: PropertyOperation::Update,
            value,
        }
    }

    pub fn append(attribute: &str, value: RawValue) -> Self {
        Self {
            attribute: attribute.to_string(),
            operation: PropertyOperation::Append,
            value,
        }
    }

    pub fn delete(attribute: &str, value: RawValue) -> Self {
        Self {
            attribute: attribute.to_string(),
            operation: PropertyOperation::Delete,
            value,
        }
    }

    pub fn clear(attribute: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            operation: PropertyOperation::Clear,
            value: RawValue::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub base: DistinguishedName,
    pub scope: Scope,
    pub filter: Filter,
    /// Пустой список — все атрибуты
    pub attributes: Vec<String>,
    /// Диапазон значений многозначных атрибутов (`Range=0-1499`)
    pub range: Option<(u32, u32)>,
    pub size_limit: Option<usize>,
    /// Размер страницы (paged results); `None` или 0 — без страниц
    pub page_size: Option<u32>,
}

/// Страница результатов поиска
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub entries: Vec<RawEntry>,
    /// Смещение следующей страницы; `None` — страниц больше нет
    pub cookie: Option<usize>,
}

impl SearchRequest {
    pub fn new(base: DistinguishedName, filter: Filter) -> Self {
        Self {
            base,
            scope: Scope::Subtree,
            filter,
            attributes: Vec::new(),
            range: None,
            size_limit: None,
            page_size: None,
        }
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
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

    pub fn size_limit(mut self, limit: usize) -> Self {
        self.size_limit = Some(limit);
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Опция `member;range=0-1499` задаёт диапазон, если в запросе нет общего `Range=`
    pub fn from_query(query: &QueryString) -> Result<Self, DirectoryError> {
        let mut range = query.range;
        let mut attributes = Vec::with_capacity(query.attributes.len());
        for attribute in &query.attributes {
            let (name, option) = match attribute.split_once(';') {
                Some((name, option)) => (name, Some(option)),
                None => (attribute.as_str(), None),
            };
            if name.eq_ignore_ascii_case("ADsPath") {
                continue;
            }
            if range.is_none() {
                range = option.and_then(filter::parse_range);
            }
            attributes.push(name.to_string());
        }
        Ok(Self {
            base: query.base.dn()?,
            scope: query.scope,
            filter: query.filter.clone().unwrap_or_else(|| filter::present("objectClass")),
            attributes,
            range,
            size_limit: None,
            page_size: None,
        })
    }
}

/// Хранилище объектов каталога. Все вызовы синхронные.
pub trait DirectoryBackend: Send + Sync {
    /// Проверить учётные данные (`None` — учётка процесса)
    fn bind(&self, credentials: Option<&Credentials>) -> Result<(), DirectoryError>;

    fn fetch(&self, path: &DirectoryPath) -> Result<RawEntry, DirectoryError>;

    fn create(&self, entry: RawEntry) -> Result<(), DirectoryError>;

    fn delete(&self, path: &DirectoryPath) -> Result<(), DirectoryError>;

    /// Применить изменения атомарно: либо все, либо ни одного
    fn modify(&self, path: &DirectoryPath, changes: &[Modification]) -> Result<(), DirectoryError>;

    fn search(&self, request: &SearchRequest) -> Result<Vec<RawEntry>, DirectoryError>;

    /// Страница поиска начиная со смещения `cookie`
    fn search_page(&self, request: &SearchRequest, cookie: usize) -> Result<SearchPage, DirectoryError> {
        let all = self.search(request)?;
        let size = match request.page_size {
            Some(size) if size > 0 => size as usize,
            _ => {
                return Ok(SearchPage {
                    entries: all,
                    cookie: None,
                })
            }
        };
        let total = all.len();
        let end = cookie.saturating_add(size).min(total);
        Ok(SearchPage {
            entries: all.into_iter().take(end).skip(cookie).collect(),
            cookie: (end < total).then_some(end),
        })
    }

    /// Синтаксис атрибута по схеме, если он известен
    fn attribute_syntax(&self, name: &str) -> Option<AttributeSyntax>;
}

impl<T: DirectoryBackend + ?Sized> DirectoryBackend for Arc<T> {
    fn bind(&self, credentials: Option<&Credentials>) -> Result<(), DirectoryError> {
        (**self).bind(credentials)
    }

    fn fetch(&self, path: &DirectoryPath) -> Result<RawEntry, DirectoryError> {
        (**self).fetch(path)
    }

    fn create(&self, entry: RawEntry) -> Result<(), DirectoryError> {
        (**self).create(entry)
    }

    fn delete(&self, path: &DirectoryPath) -> Result<(), DirectoryError> {
        (**self).delete(path)
    }

    fn modify(&self, path: &DirectoryPath, changes: &[Modification]) -> Result<(), DirectoryError> {
        (**self).modify(path, changes)
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<RawEntry>, DirectoryError> {
        (**self).search(request)
    }

    fn search_page(&self, request: &SearchRequest, cookie: usize) -> Result<SearchPage, DirectoryError> {
        (**self).search_page(request, cookie)
    }

    fn attribute_syntax(&self, name: &str) -> Option<AttributeSyntax> {
        (**self).attribute_syntax(name)
    }
}

/// Строка результата запроса: имя атрибута → декодированное значение
pub type Row = BTreeMap<String, Value>;

/// Подключение к каталогу
pub struct Directory {
    backend: Box<dyn DirectoryBackend>,
    codecs: CodecTable,
    scheme: Scheme,
    server: Option<String>,
    credentials: Option<Credentials>,
    page_size: u32,
}

/// Размер страницы поиска по умолчанию
pub const DEFAULT_PAGE_SIZE: u32 = 500;

impl Directory {
    pub fn new(backend: impl DirectoryBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            codecs: crate::codec::standard_table().clone(),
            scheme: Scheme::Ldap,
            server: None,
            credentials: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Подключиться, проверив учётку: явную или верхнюю подходящую из стека потока
    pub fn connect(
        backend: impl DirectoryBackend + 'static,
        server: Option<&str>,
        credentials: Option<Credentials>,
    ) -> Result<Self, DirectoryError> {
        let mut directory = Self::new(backend);
        directory.server = server.map(str::to_string);
        directory.credentials = credentials.or_else(|| credentials::current_for(server));
        directory.bind()?;
        info!(
            server = server.unwrap_or("<default>"),
            user = directory
                .credentials
                .as_ref()
                .and_then(|c| c.username.as_deref())
                .unwrap_or("<process>"),
            "connected to directory"
        );
        Ok(directory)
    }

    pub fn with_codecs(mut self, codecs: CodecTable) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn bind(&self) -> Result<(), DirectoryError> {
        self.backend.bind(self.credentials.as_ref())
    }

    pub fn backend(&self) -> &dyn DirectoryBackend {
        self.backend.as_ref()
    }

    pub fn codecs(&self) -> &CodecTable {
        &self.codecs
    }

    pub fn codecs_mut(&mut self) -> &mut CodecTable {
        &mut self.codecs
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn path_for(&self, dn: &DistinguishedName) -> DirectoryPath {
        DirectoryPath::for_dn(self.scheme, self.server.as_deref(), dn)
    }

    /// Декодировать значение атрибута с учётом схемы каталога
    pub fn decode(&self, name: &str, raw: &RawValue) -> Value {
        self.codecs
            .lookup_with_syntax(name, self.backend.attribute_syntax(name))
            .decode(raw)
    }

    pub fn encode(&self, name: &str, value: &Value) -> Result<RawValue, DirectoryError> {
        Ok(self
            .codecs
            .lookup_with_syntax(name, self.backend.attribute_syntax(name))
            .encode(value)?)
    }

    /// Открыть объект по моникеру (`LDAP://server/CN=...`, просто DN или rootDSE)
    pub fn open(&self, moniker: &str) -> Result<DirectoryObject<'_>, DirectoryError> {
        let path = DirectoryPath::parse(moniker)?;
        self.open_path(&path)
    }

    pub fn open_path(&self, path: &DirectoryPath) -> Result<DirectoryObject<'_>, DirectoryError> {
        if path.scheme == Scheme::WinNt {
            return Err(DirectoryError::NotImplemented(format!(
                "WinNT provider is not supported: {}",
                path
            )));
        }
        // `LDAP://server` без DN открывает корень домена
        let path = if path.object.is_empty() && path.server.is_some() {
            path.with_dn(&self.default_naming_context()?)
        } else {
            path.clone()
        };
        let entry = self.backend.fetch(&path)?;
        debug!(path = %path, "opened directory object");
        Ok(DirectoryObject::new(self, path, entry))
    }

    pub fn open_dn(&self, dn: &DistinguishedName) -> Result<DirectoryObject<'_>, DirectoryError> {
        self.open_path(&self.path_for(dn))
    }

    pub fn root_dse(&self) -> Result<DirectoryObject<'_>, DirectoryError> {
        self.open_path(&DirectoryPath::root_dse(self.server.as_deref(), self.scheme))
    }

    pub fn default_naming_context(&self) -> Result<DistinguishedName, DirectoryError> {
        let root_dse = self
            .backend
            .fetch(&DirectoryPath::root_dse(self.server.as_deref(), self.scheme))?;
        let text = root_dse
            .texts("defaultNamingContext")
            .first()
            .map(|s| s.to_string())
            .ok_or_else(|| DirectoryError::PropertyNotFound("defaultNamingContext".to_string()))?;
        DistinguishedName::parse(&text)
    }

    /// Корень домена (defaultNamingContext)
    pub fn root(&self) -> Result<DirectoryObject<'_>, DirectoryError> {
        self.open_dn(&self.default_naming_context()?)
    }

    /// Поиск от `base` (по умолчанию от корня домена)
    pub fn search(
        &self,
        filter: &Filter,
        base: Option<&DistinguishedName>,
        scope: Scope,
    ) -> Result<Vec<DirectoryObject<'_>>, DirectoryError> {
        let base = match base {
            Some(b) => b.clone(),
            None => self.default_naming_context()?,
        };
        let request = SearchRequest::new(base, filter.clone()).scope(scope);
        let entries = self.search_all(request)?;
        debug!(filter = %filter, found = entries.len(), "search finished");
        Ok(entries
            .into_iter()
            .map(|entry| DirectoryObject::new(self, self.path_for(&entry.dn), entry))
            .collect())
    }

    /// Запрос в диалекте ADO; значения декодируются таблицей конвертеров
    pub fn query(&self, query: &QueryString) -> Result<Vec<Row>, DirectoryError> {
        let request = SearchRequest::from_query(query)?;
        let wants_path = query.attributes.iter().any(|a| a.eq_ignore_ascii_case("ADsPath"));
        let wanted = |name: &str| {
            query.attributes.is_empty()
                || query.attributes.iter().any(|a| {
                    let requested = a.split_once(';').map_or(a.as_str(), |(n, _)| n);
                    requested == "*" || requested.eq_ignore_ascii_case(name)
                })
        };
        let entries = self.search_all(request)?;

        Ok(entries
            .iter()
            .map(|entry| {
                let mut row: Row = entry
                    .attributes()
                    .filter(|(name, _)| wanted(name))
                    .map(|(name, raw)| (name.to_string(), self.decode(name, raw)))
                    .collect();
                if wants_path {
                    row.insert("ADsPath".to_string(), Value::Text(self.path_for(&entry.dn).to_string()));
                }
                row
            })
            .collect())
    }

    /// Собрать все страницы результата
    pub(crate) fn search_all(&self, request: SearchRequest) -> Result<Vec<RawEntry>, DirectoryError> {
        let request = request.page_size(self.page_size);
        let mut entries = Vec::new();
        let mut cookie = 0;
        let mut pages = 0;
        loop {
            let page = self.backend.search_page(&request, cookie)?;
            pages += 1;
            entries.extend(page.entries);
            match page.cookie {
                Some(next) if next > cookie => cookie = next,
                _ => break,
            }
        }
        debug!(pages, found = entries.len(), "paged search finished");
        Ok(entries)
    }

    /// Первый объект с таким именем (`name`)
    pub fn find(&self, name: &str) -> Result<Option<DirectoryObject<'_>>, DirectoryError> {
        self.find_one(filter::eq("name", name), None)
    }

    /// Пользователь по sAMAccountName, displayName или cn
    pub fn find_user(&self, name: &str) -> Result<Option<DirectoryObject<'_>>, DirectoryError> {
        self.find_one(user_filter(name), None)
    }

    pub fn find_group(&self, name: &str) -> Result<Option<DirectoryObject<'_>>, DirectoryError> {
        self.find_one(class_filter("group", name), None)
    }

    pub fn find_ou(&self, name: &str) -> Result<Option<DirectoryObject<'_>>, DirectoryError> {
        self.find_one(class_filter("organizationalUnit", name), None)
    }

    pub fn find_computer(&self, name: &str) -> Result<Option<DirectoryObject<'_>>, DirectoryError> {
        self.find_one(class_filter("computer", name), None)
    }

    pub(crate) fn find_one(
        &self,
        filter: Filter,
        base: Option<&DistinguishedName>,
    ) -> Result<Option<DirectoryObject<'_>>, DirectoryError> {
        Ok(self.search(&filter, base, Scope::Subtree)?.into_iter().next())
    }
}

pub(crate) fn user_filter(name: &str) -> Filter {
    filter::and_([
        filter::or_([
            filter::eq("sAMAccountName", name),
            filter::eq("displayName", name),
            filter::eq("cn", name),
        ]),
        filter::eq("sAMAccountType", SamAccountType::NormalUserAccount.value()),
    ])
}

pub(crate) fn class_filter(class: &str, name: &str) -> Filter {
    filter::and_([filter::eq("objectClass", class), filter::eq("name", name)])
}

// tests/integration/directory.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use activedir::codec::{AttributeSyntax, Value};
use activedir::credentials::{self, Credentials};
use activedir::directory::{Directory, DirectoryBackend, MemoryDirectory, Modification, SearchPage, SearchRequest};
use activedir::entry::RawEntry;
use activedir::filter::{self, QueryString, Scope};
use activedir::models::{GroupType, UserAccountControl};
use activedir::path::{DirectoryPath, DistinguishedName, Scheme};
use activedir::DirectoryError;

fn naming_context() -> DistinguishedName {
    DistinguishedName::parse("DC=corp,DC=acme").unwrap()
}

/// Домен: OU Staff с тремя пользователями, группы Staff ⊂ Everyone
fn populated(directory: &Directory) {
    let root = directory.root().unwrap();
    let staff = root.new_ou("Staff", Some("Employees")).unwrap();
    for (cn, sam) in [("John Doe", "jdoe"), ("Anna Smith", "asmith"), ("Old Timer", "otimer")] {
        let mut user = staff.new_user(cn, sam).unwrap();
        let mut uac = UserAccountControl::NORMAL_ACCOUNT;
        if sam == "otimer" {
            uac |= UserAccountControl::ACCOUNTDISABLE;
        }
        user.set("userAccountControl", Value::Integer(i64::from(uac.bits()))).unwrap();
        user.set("mail", Value::Text(format!("{}@corp.acme", sam))).unwrap();
        user.commit().unwrap();
    }

    let mut staff_group = root
        .new_group("Staff", GroupType::GLOBAL | GroupType::SECURITY_ENABLED)
        .unwrap();
    let mut everyone = root
        .new_group("Everyone", GroupType::UNIVERSAL | GroupType::SECURITY_ENABLED)
        .unwrap();
    for sam in ["jdoe", "asmith"] {
        let user = directory.find_user(sam).unwrap().unwrap();
        staff_group.add_member(&user).unwrap();
    }
    everyone.add_member(&staff_group).unwrap();
}

fn directory() -> Directory {
    let directory = Directory::new(MemoryDirectory::new(naming_context()));
    populated(&directory);
    directory
}

#[test]
fn root_dse_names_the_domain() {
    let directory = directory();
    assert_eq!(directory.default_naming_context().unwrap(), naming_context());
    let root_dse = directory.root_dse().unwrap();
    assert_eq!(root_dse.get("isGlobalCatalogReady"), Value::Boolean(true));
    assert_eq!(
        directory.open("LDAP://rootDSE").unwrap().get("defaultNamingContext"),
        Value::Text("DC=corp,DC=acme".into())
    );
}

#[test]
fn find_helpers() {
    let directory = directory();
    let jdoe = directory.find_user("John Doe").unwrap().unwrap();
    assert_eq!(jdoe.get("sAMAccountName"), Value::Text("jdoe".into()));
    assert!(directory.find_user("nobody").unwrap().is_none());
    assert!(directory.find_group("Everyone").unwrap().is_some());
    assert_eq!(directory.find_ou("Staff").unwrap().unwrap().name().as_deref(), Some("Staff"));
    // OU и группа с одинаковым именем различаются по классу
    assert!(directory.find_group("Staff").unwrap().unwrap().is_group());
}

#[test]
fn search_disabled_accounts() {
    let directory = directory();
    let disabled = filter::and_([
        filter::eq("objectClass", "user"),
        filter::band("userAccountControl", UserAccountControl::ACCOUNTDISABLE.bits()),
    ]);
    let found = directory.search(&disabled, None, Scope::Subtree).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("sAMAccountName"), Value::Text("otimer".into()));
    match found[0].get("userAccountControl") {
        Value::Flags(names) => assert!(names.contains("ACCOUNTDISABLE")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn nested_membership() {
    let directory = directory();
    let everyone = directory.find_group("Everyone").unwrap().unwrap();

    let direct = directory
        .search(&filter::eq("memberOf", everyone.dn()), None, Scope::Subtree)
        .unwrap();
    assert_eq!(direct.len(), 1);
    assert!(direct[0].is_group());

    let transitive = directory
        .search(
            &filter::and_([filter::eq("objectClass", "user"), filter::within("memberOf", everyone.dn())]),
            None,
            Scope::Subtree,
        )
        .unwrap();
    let mut names: Vec<String> = transitive.iter().filter_map(|o| o.name()).collect();
    names.sort();
    assert_eq!(names, vec!["Anna Smith".to_string(), "John Doe".to_string()]);
}

#[test]
fn membership_errors() {
    let directory = directory();
    let mut staff = directory.find_group("Staff").unwrap().unwrap();
    let jdoe = directory.find_user("jdoe").unwrap().unwrap();
    let otimer = directory.find_user("otimer").unwrap().unwrap();

    let err = staff.add_member(&jdoe).unwrap_err();
    assert!(matches!(err, DirectoryError::MemberAlreadyInGroup(_)));
    assert_eq!(err.hresult(), Some(0x8007_0562));

    let err = staff.remove_member(&otimer).unwrap_err();
    assert!(matches!(err, DirectoryError::MemberNotInGroup(_)));

    staff.remove_member(&jdoe).unwrap();
    let jdoe = directory.open_dn(jdoe.dn()).unwrap();
    assert!(jdoe.member_of().unwrap().is_empty());
}

#[test]
fn ado_query_rows() {
    let directory = directory();
    let query = QueryString::new(directory.path_for(&naming_context()))
        .filter(filter::eq("objectClass", "group"))
        .attributes(["ADsPath", "name", "member", "groupType"])
        .range(0, 0)
        .scope(Scope::OneLevel);

    let rows = directory.query(&query).unwrap();
    assert_eq!(rows.len(), 2);
    let staff = rows
        .iter()
        .find(|row| row.get("name") == Some(&Value::Text("Staff".into())))
        .unwrap();
    assert_eq!(
        staff.get("ADsPath"),
        Some(&Value::Text("LDAP://CN=Staff,DC=corp,DC=acme".into()))
    );
    // Range=0-0 оставляет одно значение
    match staff.get("member") {
        Some(Value::List(items)) => assert_eq!(items.len(), 1),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(staff.get("groupType"), Some(Value::Flags(_))));
}

#[test]
fn handles_cannot_outlive_connection_but_snapshot_does() {
    let store = Arc::new(MemoryDirectory::new(naming_context()));
    {
        let directory = Directory::new(store.clone());
        populated(&directory);
    }
    let file = tempfile::NamedTempFile::new().unwrap();
    store.save(file.path()).unwrap();

    let reloaded = Directory::new(MemoryDirectory::load(file.path()).unwrap()).with_scheme(Scheme::Gc);
    let jdoe = reloaded.find_user("jdoe").unwrap().unwrap();
    assert_eq!(jdoe.path().scheme, Scheme::Gc);
    assert_eq!(jdoe.member_of().unwrap().len(), 1);
}

#[test]
fn connect_uses_ambient_credentials() {
    credentials::clear();
    let store = Arc::new(MemoryDirectory::new(naming_context()).with_account("CORP\\admin", "s3cret"));

    assert!(matches!(
        Directory::connect(store.clone(), None, Some(Credentials::simple("CORP\\admin", "wrong"))),
        Err(DirectoryError::InvalidCredentials(_))
    ));

    {
        let _guard = credentials::scoped(Credentials::simple("CORP\\admin", "s3cret"));
        assert!(Directory::connect(store.clone(), None, None).is_ok());
    }

    // учётка для другого сервера не подходит
    let _guard = credentials::scoped(Credentials::simple("CORP\\admin", "wrong").for_server("dc9"));
    assert!(Directory::connect(store.clone(), Some("dc9"), None).is_err());
    assert!(Directory::connect(store, Some("dc1"), None).is_ok());
}

#[test]
fn winnt_paths_are_not_supported() {
    let directory = directory();
    let path = DirectoryPath::parse("WinNT://CORP/jdoe,user").unwrap();
    assert!(matches!(directory.open_path(&path), Err(DirectoryError::NotImplemented(_))));
}

#[test]
fn server_only_path_opens_the_domain_root() {
    let directory = directory();
    let root = directory.open("LDAP://dc1.corp.acme").unwrap();
    assert_eq!(root.dn(), &naming_context());
    assert_eq!(root.path().server.as_deref(), Some("dc1.corp.acme"));
}

/// Считает запросы страниц к хранилищу
struct CountingBackend {
    inner: Arc<MemoryDirectory>,
    pages: Arc<AtomicUsize>,
}

impl DirectoryBackend for CountingBackend {
    fn bind(&self, credentials: Option<&Credentials>) -> Result<(), DirectoryError> {
        self.inner.bind(credentials)
    }

    fn fetch(&self, path: &DirectoryPath) -> Result<RawEntry, DirectoryError> {
        self.inner.fetch(path)
    }

    fn create(&self, entry: RawEntry) -> Result<(), DirectoryError> {
        self.inner.create(entry)
    }

    fn delete(&self, path: &DirectoryPath) -> Result<(), DirectoryError> {
        self.inner.delete(path)
    }

    fn modify(&self, path: &DirectoryPath, changes: &[Modification]) -> Result<(), DirectoryError> {
        self.inner.modify(path, changes)
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<RawEntry>, DirectoryError> {
        self.inner.search(request)
    }

    fn search_page(&self, request: &SearchRequest, cookie: usize) -> Result<SearchPage, DirectoryError> {
        self.pages.fetch_add(1, Ordering::SeqCst);
        self.inner.search_page(request, cookie)
    }

    fn attribute_syntax(&self, name: &str) -> Option<AttributeSyntax> {
        self.inner.attribute_syntax(name)
    }
}

#[test]
fn search_collects_every_page() {
    let store = Arc::new(MemoryDirectory::new(naming_context()));
    populated(&Directory::new(store.clone()));
    let pages = Arc::new(AtomicUsize::new(0));
    let backend = CountingBackend {
        inner: store,
        pages: pages.clone(),
    };
    let directory = Directory::new(backend).with_page_size(2);
    assert_eq!(directory.page_size(), 2);

    let users = directory
        .search(&filter::eq("objectClass", "user"), None, Scope::Subtree)
        .unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(pages.load(Ordering::SeqCst), 2);

    pages.store(0, Ordering::SeqCst);
    let unpaged = Directory::new(CountingBackend {
        inner: Arc::new(MemoryDirectory::new(naming_context())),
        pages: pages.clone(),
    })
    .with_page_size(0);
    assert_eq!(unpaged.search(&filter::present("objectClass"), None, Scope::Subtree).unwrap().len(), 1);
    assert_eq!(pages.load(Ordering::SeqCst), 1);
}


// tests/integration/filters.rs

use activedir::entry::RawEntry;
use activedir::filter::{self, Filter, QueryString, Scope};
use activedir::models::UserAccountControl;
use activedir::path::{DirectoryPath, DistinguishedName};
use activedir::RawValue;

fn user(name: &str, uac: u32) -> RawEntry {
    RawEntry::new(DistinguishedName::parse(&format!("CN={},OU=Staff,DC=corp,DC=acme", name)).unwrap())
        .with("sAMAccountName", RawValue::text(name))
        .with("userAccountControl", RawValue::Integer(uac as i32))
        .with("logonCount", RawValue::text("17"))
        .with(
            "objectClass",
            RawValue::Multi(vec![RawValue::text("top"), RawValue::text("person"), RawValue::text("user")]),
        )
}

#[test]
fn builders_render_ldap_syntax() {
    let disabled = UserAccountControl::ACCOUNTDISABLE.bits();
    let f = filter::and_([
        filter::eq("objectClass", "user"),
        filter::band("userAccountControl", disabled),
        filter::or_([filter::eq("sAMAccountName", "j(d)oe"), filter::eq("cn", "smith*")]),
    ]);
    assert_eq!(
        f.to_string(),
        "(&(objectClass=user)(userAccountControl:1.2.840.113556.1.4.803:=2)\
         (|(sAMAccountName=j\\28d\\29oe)(cn=smith*)))"
    );
    assert_eq!(filter::gt("logonCount", 5).to_string(), "(!(logonCount<=5))");
    assert_eq!(filter::or_([filter::present("mail")]), filter::present("mail"));
}

#[test]
fn parsed_filter_renders_back() {
    let text = "(&(objectCategory=person)(!(userAccountControl:1.2.840.113556.1.4.803:=2))(mail=*@corp.acme))";
    let f: Filter = text.parse().unwrap();
    assert_eq!(f.to_string(), text);
}

#[test]
fn evaluation_against_rows() {
    let active = user("jdoe", 0x200);
    let disabled = user("old", 0x202);

    let enabled_users = filter::and_([
        filter::eq("objectClass", "user"),
        filter::not_(filter::band("userAccountControl", 2)),
    ]);
    assert!(enabled_users.matches(&active));
    assert!(!enabled_users.matches(&disabled));

    assert!(filter::ge("logonCount", 10).matches(&active));
    assert!(!filter::gt("logonCount", 17).matches(&active));
    assert!(filter::eq("SAMACCOUNTNAME", "JDO*").matches(&active));
    assert!(filter::bor("userAccountControl", 0x2 | 0x10).matches(&disabled));
}

#[test]
fn unbalanced_filter_is_rejected() {
    assert!(Filter::parse("(&(cn=a)").is_err());
    assert!(Filter::parse("(cn=a))").is_err());
}

#[test]
fn query_string_layout() {
    let base = DirectoryPath::parse("LDAP://dc1.corp.acme/DC=corp,DC=acme").unwrap();
    let query = QueryString::new(base)
        .filter(filter::eq("objectClass", "group"))
        .attributes(["cn", "member"])
        .range(0, 1499)
        .scope(Scope::OneLevel);
    let text = query.to_string();
    assert_eq!(
        text,
        "<LDAP://dc1.corp.acme/DC=corp,DC=acme>;(objectClass=group);cn,member;Range=0-1499;OneLevel"
    );
    assert_eq!(QueryString::parse(&text).unwrap(), query);

    let default = QueryString::new(DirectoryPath::parse("LDAP://DC=corp").unwrap());
    assert_eq!(default.attributes, vec!["ADsPath".to_string()]);
    assert_eq!(default.scope, Scope::Subtree);
}

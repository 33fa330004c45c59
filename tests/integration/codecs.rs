// tests/integration/codecs.rs

use activedir::codec::{standard_table, AttributeSyntax, Codec, CodecTable, RawValue, Value};
use activedir::models::{FlagTable, ObjectGuid, SecurityIdentifier};

fn representative() -> Vec<(&'static str, RawValue)> {
    let sid: SecurityIdentifier = "S-1-5-21-1004336348-1177238915-682003330-512".parse().unwrap();
    vec![
        ("pwdLastSet", RawValue::LargeInteger(130_000_000_000_000_000)),
        ("maxPwdAge", RawValue::LargeInteger(-36_288_000_000_000)),
        ("whenCreated", RawValue::text("20240102030405.0Z")),
        ("objectSid", RawValue::Octets(sid.to_bytes())),
        ("objectGUID", RawValue::Octets((0u8..16).collect())),
        ("repsFrom", RawValue::Octets(vec![0xde, 0xad, 0xbe, 0xef])),
        ("isGlobalCatalogReady", RawValue::text("TRUE")),
        ("userAccountControl", RawValue::Integer(0x0000_0202)),
        ("groupType", RawValue::Integer(0x8000_0002u32 as i32)),
        ("sAMAccountType", RawValue::Integer(0x3000_0000)),
        ("manager", RawValue::text("CN=Boss,OU=Staff,DC=corp,DC=acme")),
        (
            "objectClass",
            RawValue::Multi(vec![
                RawValue::text("top"),
                RawValue::text("person"),
                RawValue::text("organizationalPerson"),
                RawValue::text("user"),
            ]),
        ),
        (
            "wellKnownObjects",
            RawValue::text("B:32:AA312825768811D1ADED00C04FD8D5CD:CN=Users,DC=corp,DC=acme"),
        ),
        ("uSNChanged", RawValue::LargeInteger(123_456_789_012)),
        ("description", RawValue::text("plain text")),
        ("logonCount", RawValue::Integer(42)),
    ]
}

#[test]
fn encode_inverts_decode() {
    let table = standard_table();
    for (name, raw) in representative() {
        let value = table.decode(name, &raw);
        assert!(!value.is_null(), "{} decoded to null", name);
        let back = table.encode(name, &value).unwrap_or_else(|e| panic!("{}: {}", name, e));
        assert_eq!(back, raw, "round trip of {}", name);
    }
}

#[test]
fn null_decodes_to_null_everywhere() {
    let table = standard_table();
    for (name, codec) in table.registered() {
        assert_eq!(codec.decode(&RawValue::Null), Value::Null, "{}", name);
    }
    for syntax in AttributeSyntax::ALL {
        let codec = table.lookup_with_syntax("someAttribute", Some(syntax));
        assert_eq!(codec.decode(&RawValue::Null), Value::Null);
    }
}

#[test]
fn flag_names_follow_the_table() {
    let raw = RawValue::Integer(0x8000_0002u32 as i32);
    assert_eq!(
        Codec::Flags(FlagTable::GroupType).decode(&raw),
        Value::flags(["GLOBAL", "SECURITY_ENABLED"])
    );
    // старший бит в userAccountControl не определён
    assert_eq!(
        Codec::Flags(FlagTable::UserAccountControl).decode(&raw),
        Value::flags(["ACCOUNTDISABLE"])
    );
}

#[test]
fn lookup_order() {
    let mut table = CodecTable::standard();

    // имя важнее синтаксиса
    assert_eq!(
        table.lookup_with_syntax("pwdLastSet", Some(AttributeSyntax::Sid)).name(),
        "filetime"
    );
    // синтаксис важнее суффикса guid
    assert_eq!(
        table.lookup_with_syntax("customGuid", Some(AttributeSyntax::LargeInteger)).name(),
        "large-integer"
    );
    // суффикс guid
    assert_eq!(table.lookup("msDS-SomethingGUID").name(), "guid");
    // иначе как есть
    assert_eq!(table.lookup("telephoneNumber").name(), "identity");

    table.register_attribute_syntax("extensionAttribute9", AttributeSyntax::Sid);
    assert_eq!(table.lookup("EXTENSIONATTRIBUTE9").name(), "sid");
}

#[test]
fn guid_renders_braced() {
    let bytes: Vec<u8> = (0u8..16).collect();
    let value = standard_table().decode("objectGUID", &RawValue::Octets(bytes));
    assert_eq!(
        value.to_string(),
        "{03020100-0504-0706-0809-0a0b0c0d0e0f}"
    );
    let Value::Guid(guid) = value else {
        panic!("expected guid");
    };
    assert_eq!(guid, "{03020100-0504-0706-0809-0a0b0c0d0e0f}".parse::<ObjectGuid>().unwrap());
}

#[test]
fn malformed_values_decode_to_null() {
    let table = standard_table();
    assert_eq!(table.decode("objectSid", &RawValue::Octets(vec![1, 2])), Value::Null);
    assert_eq!(table.decode("whenCreated", &RawValue::text("yesterday")), Value::Null);
    assert_eq!(table.decode("pwdLastSet", &RawValue::text("n/a")), Value::Null);
}

#[test]
fn multi_values_decode_element_wise() {
    let raw = RawValue::Multi(vec![
        RawValue::text("CN=A,DC=corp"),
        RawValue::text("CN=B,DC=corp"),
    ]);
    match standard_table().decode("memberOf", &raw) {
        Value::List(items) => {
            assert_eq!(items.len(), 2);
            assert!(matches!(&items[0], Value::Dn(dn) if dn.as_str() == "CN=A,DC=corp"));
        }
        other => panic!("expected list, got {:?}", other),
    }
}

// tests/integration/config.rs

use std::io::Write;

use activedir::codec::{RawValue, Value};
use activedir::config::AppConfig;
use activedir::directory::{Directory, MemoryDirectory};
use activedir::models::SecurityIdentifier;
use activedir::path::Scheme;

const CONFIG: &str = r#"
directory:
  scheme: GC
  server: dc1.corp.acme
  base_dn: DC=corp,DC=acme
schema:
  msExchMasterAccountSid: 2.5.5.17
logging:
  level: debug
"#;

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load_or_default(Some(&dir.path().join("absent.yaml"))).unwrap();
    assert_eq!(config.scheme().unwrap(), Scheme::Ldap);
    assert_eq!(config.directory.page_size, 500);
    assert!(!config.logging.enable_json_output);
}

#[test]
fn file_configures_the_connection() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = AppConfig::load_or_default(Some(file.path())).unwrap();
    assert_eq!(config.scheme().unwrap(), Scheme::Gc);
    assert_eq!(config.directory.server.as_deref(), Some("dc1.corp.acme"));
    assert_eq!(config.logging.level, "debug");

    let base = config.base_dn().unwrap();
    let mut directory = Directory::new(MemoryDirectory::new(base.clone())).with_scheme(config.scheme().unwrap());
    config.apply_schema(directory.codecs_mut()).unwrap();

    let sid: SecurityIdentifier = "S-1-5-21-1-2-3-1105".parse().unwrap();
    let value = directory.decode("msExchMasterAccountSid", &RawValue::Octets(sid.to_bytes()));
    assert_eq!(value, Value::Sid(sid));
    assert_eq!(directory.path_for(&base).to_string(), "GC://DC=corp,DC=acme");
}

#[test]
fn broken_yaml_is_a_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"directory: [unterminated").unwrap();
    assert!(matches!(
        AppConfig::load(file.path()),
        Err(activedir::DirectoryError::Config(_))
    ));
}

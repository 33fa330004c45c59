// tests/integration/credentials.rs

use std::io::Write;
use std::thread;

use activedir::credentials::{self, CredentialKind, Credentials};
use activedir::models::AuthenticationFlags;

#[test]
fn guards_nest_and_unwind() {
    credentials::clear();
    assert!(credentials::current().is_none());
    {
        let _outer = credentials::scoped(Credentials::simple("CORP\\svc", "one"));
        {
            let _inner = credentials::scoped(Credentials::anonymous());
            assert_eq!(credentials::current().unwrap().kind, CredentialKind::Anonymous);
            assert_eq!(credentials::snapshot().len(), 2);
        }
        assert_eq!(credentials::current().unwrap().username.as_deref(), Some("CORP\\svc"));
    }
    assert!(credentials::current().is_none());
    assert!(credentials::pop().is_none());
}

#[test]
fn stack_is_per_thread() {
    credentials::clear();
    let _guard = credentials::scoped(Credentials::simple("CORP\\main", "pw"));
    let seen = thread::spawn(|| credentials::current()).join().unwrap();
    assert!(seen.is_none());
    assert!(credentials::current().is_some());
}

#[test]
fn server_specific_entries_are_skipped_for_other_servers() {
    credentials::clear();
    let _any = credentials::scoped(Credentials::simple("CORP\\any", "pw"));
    let _dc2 = credentials::scoped(Credentials::simple("CORP\\dc2", "pw").for_server("DC2.corp.acme"));

    let picked = credentials::current_for(Some("dc2.corp.acme")).unwrap();
    assert_eq!(picked.username.as_deref(), Some("CORP\\dc2"));
    let picked = credentials::current_for(Some("dc1.corp.acme")).unwrap();
    assert_eq!(picked.username.as_deref(), Some("CORP\\any"));
    let picked = credentials::current_for(None).unwrap();
    assert_eq!(picked.username.as_deref(), Some("CORP\\any"));
}

#[test]
fn netrc_lookup() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# corporate accounts").unwrap();
    writeln!(file, "machine dc1.corp.acme login CORP\\admin password s3cret").unwrap();
    writeln!(file, "macdef init").unwrap();
    writeln!(file, "cd /tmp").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "default login guest password guest").unwrap();

    let cred = Credentials::from_netrc("DC1.corp.acme", Some(file.path())).unwrap();
    assert_eq!(cred.username.as_deref(), Some("CORP\\admin"));
    assert_eq!(cred.password.as_deref(), Some("s3cret"));
    assert_eq!(cred.server.as_deref(), Some("DC1.corp.acme"));
    assert_eq!(cred.authentication_flags(), AuthenticationFlags::SECURE_AUTHENTICATION);

    let fallback = Credentials::from_netrc("dc7.corp.acme", Some(file.path())).unwrap();
    assert_eq!(fallback.username.as_deref(), Some("guest"));
}

#[test]
fn password_is_never_serialized() {
    let cred = Credentials::simple("CORP\\admin", "s3cret");
    let json = serde_json::to_string(&cred).unwrap();
    assert!(!json.contains("s3cret"));
    assert!(!format!("{:?}", cred).contains("s3cret"));
}

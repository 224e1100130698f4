//! Properties file loading.

use db_probe::config::ConnectionConfig;
use db_probe::db::DatabaseBackend;
use db_probe::error::ProbeError;
use pretty_assertions::assert_eq;

use super::common::Fixture;

#[test]
fn test_loads_the_five_keys() {
    let fixture = Fixture::new(
        "# connection\nHOST=db.internal\nPORT=1433\nDB=inventory\nUSER=reader\nPASS=s3cret\n",
        "",
    );

    let config = ConnectionConfig::load_from_file(&fixture.properties).unwrap();

    assert_eq!(config.backend, DatabaseBackend::SqlServer);
    assert_eq!(config.host, "db.internal");
    assert_eq!(config.port, "1433");
    assert_eq!(config.database, "inventory");
    assert_eq!(config.user, "reader");
    assert_eq!(config.password, "s3cret");
}

#[test]
fn test_unknown_keys_are_ignored() {
    let fixture = Fixture::new("HOST=h\nDB=d\nCOLOR=blue\nfoo: bar\n", "");

    let config = ConnectionConfig::load_from_file(&fixture.properties).unwrap();

    assert_eq!(config.host, "h");
    assert_eq!(config.database, "d");
    assert_eq!(config.user, "");
}

#[test]
fn test_missing_file_is_a_read_error() {
    let fixture = Fixture::new("", "");
    std::fs::remove_file(&fixture.properties).unwrap();

    let error = ConnectionConfig::load_from_file(&fixture.properties).unwrap_err();
    assert!(matches!(error, ProbeError::Read { .. }));
    assert!(error.report().contains("db.properties"));
}

#[test]
fn test_load_or_default_falls_back() {
    let fixture = Fixture::new("", "");
    std::fs::remove_file(&fixture.properties).unwrap();

    let config = ConnectionConfig::load_or_default(&fixture.properties);
    assert_eq!(config, ConnectionConfig::default());
}

#[test]
fn test_password_never_appears_in_summary() {
    let fixture = Fixture::new("HOST=h\nDB=d\nUSER=u\nPASS=hunter2\n", "");

    let config = ConnectionConfig::load_from_file(&fixture.properties).unwrap();

    for (_, value) in config.summary() {
        assert!(!value.contains("hunter2"));
    }
    assert!(!config
        .redacted_connection_string()
        .unwrap()
        .contains("hunter2"));
}

#[test]
fn test_latin1_properties_file() {
    // Written by an editor using ISO-8859-1: 0xE9 is "é", 0xA7 is "§".
    let fixture = Fixture::new(
        b"# base de donn\xE9es\nHOST=h\nDB=d\nUSER=ren\xE9\nPASS=p\xA7ss\n".as_slice(),
        "",
    );

    let config = ConnectionConfig::load_from_file(&fixture.properties).unwrap();

    assert_eq!(config.host, "h");
    assert_eq!(config.user, "ren\u{e9}");
    assert_eq!(config.password, "p\u{a7}ss");
}

#[test]
fn test_escaped_trailing_space_in_password() {
    let fixture = Fixture::new("HOST=h\nDB=d\nPASS=secret\\ \n", "");

    let config = ConnectionConfig::load_from_file(&fixture.properties).unwrap();

    assert_eq!(config.password, "secret ");
}

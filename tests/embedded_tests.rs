//! End-to-end tests against the embedded engine
//!
//! These go through the public API only: connect, administrative calls,
//! statement execution and result decoding, then teardown.

use mysql_bridge::drivers::EmbeddedDriver;
use mysql_bridge::{BridgeError, ClientOption, ConnectOptions, Connection, ErrorCode, FieldType};
use tempfile::TempDir;

fn memory() -> Connection<EmbeddedDriver> {
    let mut conn = Connection::<EmbeddedDriver>::new().unwrap();
    conn.connect_with("localhost", "root", "", Some("test"), 0, &[])
        .unwrap();
    conn
}

#[test]
fn select_one() {
    let mut conn = memory();
    let set = conn.execute("SELECT 1").unwrap().expect("result set");

    assert_eq!(set.len(), 1);
    assert_eq!(set.columns().len(), 1);
    let row = &set.rows()[0];
    assert_eq!(row.len(), 1);
    assert_eq!(row.get(0), Some(Some(&b"1"[..])));
}

#[test]
fn binary_values_survive_decoding() {
    let mut conn = memory();
    let set = conn
        .execute("SELECT X'00FF00' AS payload, '' AS empty, NULL AS missing")
        .unwrap()
        .unwrap();

    let row = &set.rows()[0];
    assert_eq!(row.get_by_name("payload"), Some(Some(&[0x00, 0xFF, 0x00][..])));
    assert_eq!(row.get_by_name("empty"), Some(Some(&b""[..])));
    assert_eq!(row.get_by_name("missing"), Some(None));
    assert_eq!(set.columns()[0].field_type, FieldType::Blob);
    assert!(set.columns()[0].is_binary());
}

#[test]
fn statements_without_result_set() {
    let mut conn = memory();
    assert!(conn.execute("CREATE TABLE items (id INTEGER, label TEXT)").unwrap().is_none());
    assert!(conn
        .execute("INSERT INTO items VALUES (1, 'one'), (2, 'two')")
        .unwrap()
        .is_none());

    let set = conn.execute("SELECT id, label FROM items WHERE id > 5").unwrap().unwrap();
    assert!(set.is_empty());
    assert_eq!(set.column_names(), vec!["id", "label"]);

    let set = conn.execute("SELECT label FROM items ORDER BY id").unwrap().unwrap();
    let labels: Vec<_> = set
        .into_iter()
        .map(|row| row.get(0).flatten().map(<[u8]>::to_vec))
        .collect();
    assert_eq!(labels, vec![Some(b"one".to_vec()), Some(b"two".to_vec())]);
}

#[test]
fn query_failures_carry_codes() {
    let mut conn = memory();
    match conn.execute("SELEC 1") {
        Err(BridgeError::Query(e)) => assert_eq!(e.code, ErrorCode::ParseError),
        other => panic!("expected a parse error, got {:?}", other),
    }
    match conn.execute("SELECT * FROM nowhere") {
        Err(BridgeError::Query(e)) => {
            assert_eq!(e.code, ErrorCode::NoSuchTable);
            assert!(e.message().contains("nowhere"));
        }
        other => panic!("expected a missing table error, got {:?}", other),
    }
    // the connection stays usable
    assert!(conn.execute("SELECT 1").unwrap().is_some());
}

fn query_error_code(result: mysql_bridge::Result<Option<mysql_bridge::ResultSet>>) -> ErrorCode {
    match result {
        Err(BridgeError::Query(e)) => e.code,
        other => panic!("expected a query error, got {:?}", other),
    }
}

#[test]
fn multiple_statements_rejected_without_option() {
    let mut conn = memory();
    let result = conn.execute("CREATE TABLE a (x INTEGER); CREATE TABLE b (y INTEGER)");
    assert_eq!(query_error_code(result), ErrorCode::ParseError);
    // neither statement ran
    assert_eq!(query_error_code(conn.execute("SELECT * FROM a")), ErrorCode::NoSuchTable);

    conn.execute("CREATE TABLE a (x INTEGER)").unwrap();
    let code = query_error_code(conn.execute("SELECT 1; DROP TABLE a"));
    assert_eq!(code, ErrorCode::ParseError);
    assert!(conn.execute("SELECT * FROM a").unwrap().is_some());
}

#[test]
fn multiple_statements_run_with_option() {
    let mut conn = Connection::<EmbeddedDriver>::new().unwrap();
    conn.connect_with("localhost", "root", "", Some("test"), 0, &[ClientOption::MultiStatements])
        .unwrap();

    let result = conn
        .execute("CREATE TABLE a (x INTEGER); CREATE TABLE b (y INTEGER)")
        .unwrap();
    assert!(result.is_none());
    assert!(conn.execute("SELECT * FROM b").unwrap().unwrap().is_empty());

    let set = conn
        .execute("INSERT INTO b VALUES (3); SELECT y FROM b; DROP TABLE a")
        .unwrap()
        .unwrap();
    assert_eq!(set.rows()[0].get(0), Some(Some(&b"3"[..])));
    assert_eq!(query_error_code(conn.execute("SELECT * FROM a")), ErrorCode::NoSuchTable);
}

#[test]
fn empty_statement_is_reported() {
    let mut conn = memory();
    for sql in ["", "-- just a comment"] {
        match conn.execute(sql) {
            Err(BridgeError::Query(e)) => {
                assert_eq!(e.code, ErrorCode::EmptyQuery);
                assert_eq!(e.to_string(), "[1065] Query was empty");
            }
            other => panic!("expected an empty query error, got {:?}", other),
        }
    }
}

#[test]
fn large_doubles_use_exponent_text() {
    let mut conn = memory();
    let set = conn.execute("SELECT 1e20, 0.25").unwrap().unwrap();
    assert_eq!(set.rows()[0].get(0), Some(Some(&b"1e20"[..])));
    assert_eq!(set.rows()[0].get(1), Some(Some(&b"0.25"[..])));
}

#[test]
fn database_lifecycle_on_disk() {
    let dir = TempDir::new().unwrap();
    let host = dir.path().to_str().unwrap();

    let mut conn = Connection::<EmbeddedDriver>::new().unwrap();
    conn.connect(&ConnectOptions::new(host, "root", "")).unwrap();
    assert_eq!(conn.current_database(), None);

    conn.create_database("shop").unwrap();
    assert!(dir.path().join("shop.db").is_file());
    match conn.create_database("shop") {
        Err(BridgeError::Connection(e)) => assert_eq!(e.code, ErrorCode::DatabaseCreateExists),
        other => panic!("expected 1007, got {:?}", other),
    }

    conn.select_database("shop").unwrap();
    assert_eq!(conn.current_database(), Some("shop"));
    conn.execute("CREATE TABLE t (v TEXT)").unwrap();
    conn.execute("INSERT INTO t VALUES ('kept')").unwrap();
    conn.close();

    // data persists across connections
    let mut conn = Connection::<EmbeddedDriver>::new().unwrap();
    conn.connect(&ConnectOptions::new(host, "root", "").database("shop")).unwrap();
    let set = conn.execute("SELECT v FROM t").unwrap().unwrap();
    assert_eq!(set.rows()[0].get(0), Some(Some(&b"kept"[..])));

    conn.delete_database("shop").unwrap();
    assert!(!dir.path().join("shop.db").exists());
    match conn.delete_database("shop") {
        Err(BridgeError::Connection(e)) => assert_eq!(e.code, ErrorCode::DatabaseDropExists),
        other => panic!("expected 1008, got {:?}", other),
    }
}

#[test]
fn connect_failures() {
    let mut conn = Connection::<EmbeddedDriver>::new().unwrap();
    match conn.connect(&ConnectOptions::new("/nonexistent/bridge", "root", "")) {
        Err(BridgeError::Connection(e)) => assert_eq!(e.code, ErrorCode::UnknownHost),
        other => panic!("expected 2005, got {:?}", other),
    }
    assert!(!conn.is_connected());

    let dir = TempDir::new().unwrap();
    let options = ConnectOptions::new(dir.path().to_str().unwrap(), "root", "").database("absent");
    match conn.connect(&options) {
        Err(BridgeError::Connection(e)) => assert_eq!(e.code, ErrorCode::BadDatabase),
        other => panic!("expected 1049, got {:?}", other),
    }
}

#[test]
fn nul_bytes_are_rejected_before_the_driver() {
    let mut conn = memory();
    assert!(matches!(
        conn.select_database("te\0st"),
        Err(BridgeError::InvalidArgument(_))
    ));
    assert!(matches!(
        conn.create_database("a\0"),
        Err(BridgeError::InvalidArgument(_))
    ));
}

#[test]
fn diagnostics() {
    let conn = memory();
    assert!(Connection::<EmbeddedDriver>::client_info()
        .unwrap()
        .starts_with("embedded (SQLite "));
    assert!(Connection::<EmbeddedDriver>::client_version() > 3_000_000);
    assert_eq!(conn.host_info().as_deref(), Some("Embedded engine (in-memory)"));
}

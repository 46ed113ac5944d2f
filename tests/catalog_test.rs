//! Integration tests for catalog listing, including the obfuscated
//! whole-file variant.

mod common;

use common::catalog_fixture;
use mdb::jet::database::Database;
use mdb::jet::pagefile::JetVersion;

#[test]
fn test_list_tables_reports_all_catalog_rows() {
    let tmp = catalog_fixture(0).write();
    let db = Database::open(tmp.path()).unwrap();

    let entries = db.list_tables();
    assert_eq!(entries.len(), 3);

    assert_eq!(entries[0].object_name, "MSysObjects");
    assert_eq!(entries[0].object_type, 3);
    assert!(!entries[0].is_user_table());

    assert_eq!(entries[1].object_name, "MSysAccessObjects");
    assert_eq!(entries[1].object_type, 3);
    assert!(!entries[1].is_user_table());

    assert_eq!(entries[2].object_name, "Users");
    assert_eq!(entries[2].object_type, 1);
    assert_eq!(entries[2].flags, 0);
    assert!(entries[2].is_user_table());
    // Root page is the low 24 bits of Id.
    assert_eq!(entries[2].table_pg, 3);

    assert_eq!(db.user_tables().count(), 1);
}

#[test]
fn test_header_fields() {
    let tmp = catalog_fixture(0).write();
    let db = Database::open(tmp.path()).unwrap();
    assert_eq!(db.version(), JetVersion::Jet4);
    assert_eq!(db.file().page_size(), 4096);
    assert_eq!(db.file().code_page(), 1252);
    assert_eq!(db.file().lang_id(), 0x0409);
    assert_eq!(db.file().db_key(), 0);
}

#[test]
fn test_obfuscated_file_lists_identically() {
    let clear = catalog_fixture(0).write();
    let obfuscated = catalog_fixture(0x5EED_1234).write();

    let db_clear = Database::open(clear.path()).unwrap();
    let db_obf = Database::open(obfuscated.path()).unwrap();

    assert_eq!(db_obf.file().db_key(), 0x5EED_1234);

    let clear_entries = db_clear.list_tables();
    let obf_entries = db_obf.list_tables();
    assert_eq!(clear_entries.len(), obf_entries.len());
    for (a, b) in clear_entries.iter().zip(obf_entries.iter()) {
        assert_eq!(a.object_name, b.object_name);
        assert_eq!(a.object_type, b.object_type);
        assert_eq!(a.table_pg, b.table_pg);
        assert_eq!(a.flags, b.flags);
    }
}

#[test]
fn test_open_missing_table() {
    let tmp = catalog_fixture(0).write();
    let mut db = Database::open(tmp.path()).unwrap();
    assert!(db.open_table("NoSuchTable").is_err());
    assert!(db.open_table("Users").is_ok());
}

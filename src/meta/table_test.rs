use std::{fs, path};

use crate::{record::FieldType, Config, SimpleDB};

use super::*;

fn tmp_dir(name: &str) -> path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("simpledb-tm-{}-{}", name, rand::random::<u32>()));
    fs::remove_dir_all(&dir).ok();
    dir
}

#[test]
fn test_create_and_get_layout() {
    let dir = tmp_dir("layout");
    let db = SimpleDB::new(&dir, Config::default()).expect("db");
    let mut tx = db.new_tx().unwrap();

    let tm = TableManager::new(true, &mut tx).unwrap();

    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_string_field("b", 9);
    tm.create_table("movies", &schema, &mut tx).unwrap();

    let layout = tm.get_layout("movies", &mut tx).unwrap();
    assert_eq!(layout.slot_size(), 21);
    assert_eq!(layout.offset("a").unwrap(), 4);
    assert_eq!(layout.offset("b").unwrap(), 8);
    assert_eq!(layout.schema().field_type("b").unwrap(), FieldType::Varchar);
    assert_eq!(layout.schema().length("b").unwrap(), 9);

    tx.commit().unwrap();
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_catalogs_describe_themselves() {
    let dir = tmp_dir("selfdesc");
    let db = SimpleDB::new(&dir, Config::default()).expect("db");
    let mut tx = db.new_tx().unwrap();

    let tm = TableManager::new(true, &mut tx).unwrap();

    let tcat = tm.get_layout("table_catalog", &mut tx).unwrap();
    assert!(tcat.schema().has_field("table_name"));
    assert!(tcat.schema().has_field("slot_size"));

    let fcat = tm.get_layout("field_catalog", &mut tx).unwrap();
    for field in ["table_name", "field_name", "type", "length", "offset"].iter() {
        assert!(fcat.schema().has_field(field), "missing {}", field);
    }

    tx.commit().unwrap();
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_unknown_table() {
    let dir = tmp_dir("unknown");
    let db = SimpleDB::new(&dir, Config::default()).expect("db");
    let mut tx = db.new_tx().unwrap();

    let tm = TableManager::new(true, &mut tx).unwrap();
    match tm.get_layout("nosuch", &mut tx) {
        Err(crate::Error::KeyNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res.map(|_| ())),
    }

    tx.commit().unwrap();
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_long_names_rejected() {
    let dir = tmp_dir("longname");
    let db = SimpleDB::new(&dir, Config::default()).expect("db");
    let mut tx = db.new_tx().unwrap();

    let tm = TableManager::new(true, &mut tx).unwrap();
    let mut schema = Schema::new();
    schema.add_int_field("a");
    match tm.create_table("a_name_well_over_sixteen_bytes", &schema, &mut tx) {
        Err(crate::Error::InvalidInput(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }

    tx.commit().unwrap();
    fs::remove_dir_all(&dir).ok();
}

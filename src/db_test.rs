use std::{fs, path};

use super::*;

fn tmp_dir(name: &str) -> path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("simpledb-db-{}-{}", name, rand::random::<u32>()));
    fs::remove_dir_all(&dir).ok();
    dir
}

fn rows(db: &SimpleDB, tx: &mut Transaction, query: &str) -> Vec<Vec<String>> {
    let plan = db.create_query_plan(query, tx).unwrap();
    let fields: Vec<String> = plan.schema().fields().to_vec();
    let mut scan = plan.open(tx).unwrap();
    scan.before_first(tx).unwrap();
    let mut out = vec![];
    while scan.next(tx).unwrap() {
        let mut row = vec![];
        for field in fields.iter() {
            row.push(scan.get_val(tx, field).unwrap().to_string());
        }
        out.push(row);
    }
    scan.close(tx).unwrap();
    out
}

#[test]
fn test_single_record_crud() {
    let dir = tmp_dir("crud");
    let db = SimpleDB::open(&dir).expect("open db");
    let mut tx = db.new_tx().unwrap();

    db.execute_update("create table t (a int, b varchar(9))", &mut tx).unwrap();

    assert_eq!(
        db.execute_update("insert into t (a, b) values (1, 'one')", &mut tx).unwrap(),
        1
    );
    assert_eq!(
        rows(&db, &mut tx, "select a, b from t"),
        vec![vec!["1".to_string(), "'one'".to_string()]]
    );

    assert_eq!(
        db.execute_update("update t set a = 2 where b = 'one'", &mut tx).unwrap(),
        1
    );
    assert_eq!(
        rows(&db, &mut tx, "select a, b from t"),
        vec![vec!["2".to_string(), "'one'".to_string()]]
    );

    assert_eq!(
        db.execute_update("delete from t where b = 'one'", &mut tx).unwrap(),
        1
    );
    assert!(rows(&db, &mut tx, "select a, b from t").is_empty());

    tx.commit().unwrap();
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_committed_data_survives_reopen() {
    let dir = tmp_dir("reopen");
    {
        let db = SimpleDB::open(&dir).expect("open db");
        let mut tx = db.new_tx().unwrap();
        db.execute_update("create table t (a int, b varchar(9))", &mut tx).unwrap();
        for i in 0..5 {
            db.execute_update(
                &format!("insert into t (a, b) values ({}, 'rec{}')", i, i),
                &mut tx,
            )
            .unwrap();
        }
        tx.commit().unwrap();
    }

    let db = SimpleDB::open(&dir).expect("reopen db");
    let mut tx = db.new_tx().unwrap();
    let got = rows(&db, &mut tx, "select a from t");
    assert_eq!(got.len(), 5);
    tx.commit().unwrap();

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_uncommitted_statement_rolls_back() {
    let dir = tmp_dir("rollback");
    let db = SimpleDB::open(&dir).expect("open db");

    let mut tx = db.new_tx().unwrap();
    db.execute_update("create table t (a int, b varchar(9))", &mut tx).unwrap();
    db.execute_update("insert into t (a, b) values (1, 'one')", &mut tx).unwrap();
    tx.commit().unwrap();

    let mut tx = db.new_tx().unwrap();
    db.execute_update("update t set a = 99 where b = 'one'", &mut tx).unwrap();
    tx.rollback().unwrap();

    let mut tx = db.new_tx().unwrap();
    assert_eq!(
        rows(&db, &mut tx, "select a from t"),
        vec![vec!["1".to_string()]]
    );
    tx.commit().unwrap();

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_config_persisted_and_reused() {
    let dir = tmp_dir("config");
    {
        let db = SimpleDB::open(&dir).expect("open db");
        assert_eq!(db.config().block_size, 400);
    }

    // doctor the persisted config; the next open honors it
    let mut config: Config = crate::util::load_toml(&dir.join(CONFIG_FILE)).unwrap();
    config.set_num_buffers(12);
    crate::util::save_toml(&dir.join(CONFIG_FILE), &config).unwrap();

    let db = SimpleDB::open(&dir).expect("reopen db");
    assert_eq!(db.config().num_buffers, 12);
    assert_eq!(db.buffer_manager().available(), 12);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_arbitrary_config() {
    use arbitrary::Unstructured;
    use rand::{prelude::random, rngs::SmallRng, Rng, SeedableRng};

    let seed: u64 = random();
    println!("test_arbitrary_config seed {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let config: Config = {
        let bytes = rng.gen::<[u8; 32]>();
        let mut uns = Unstructured::new(&bytes);
        uns.arbitrary().unwrap()
    };
    println!("test_arbitrary_config {:?}", config);

    let dir = tmp_dir("arbitrary");
    let db = SimpleDB::new(&dir, config.clone()).expect("db");
    assert_eq!(db.file_manager().block_size(), config.block_size);
    assert_eq!(db.buffer_manager().available(), config.num_buffers);

    let block = crate::file::BlockId::new("testfile", 0);
    let mut tx = db.new_tx().unwrap();
    tx.pin(&block).unwrap();
    tx.set_int(&block, 8, 17, true).unwrap();
    tx.commit().unwrap();

    let mut tx = db.new_tx().unwrap();
    tx.pin(&block).unwrap();
    assert_eq!(tx.get_int(&block, 8).unwrap(), 17);
    tx.commit().unwrap();

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_bad_statement_has_no_effect() {
    let dir = tmp_dir("badsql");
    let db = SimpleDB::open(&dir).expect("open db");
    let mut tx = db.new_tx().unwrap();

    match db.execute_update("create banana t (a int)", &mut tx) {
        Err(crate::Error::BadSyntax(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    match db.create_query_plan("select a from nosuch", &mut tx) {
        Err(crate::Error::KeyNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res.map(|_| ())),
    }

    tx.commit().unwrap();
    fs::remove_dir_all(&dir).ok();
}

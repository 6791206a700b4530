use std::{fs, path};

use crate::{
    record::{Layout, Schema, TableScan},
    Config, SimpleDB,
};

use super::*;

fn tmp_dir(name: &str) -> path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("simpledb-query-{}-{}", name, rand::random::<u32>()));
    fs::remove_dir_all(&dir).ok();
    dir
}

fn number_layout() -> Layout {
    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_string_field("b", 9);
    Layout::new(schema).unwrap()
}

// table of (i, "rec{i%modulo}") for i in 0..n
fn fill_table(tx: &mut crate::tx::Transaction, name: &str, n: i32, modulo: i32) -> Scan {
    let mut ts = TableScan::new(tx, name, number_layout()).unwrap();
    for i in 0..n {
        ts.insert(tx).unwrap();
        ts.set_int(tx, "a", i).unwrap();
        ts.set_string(tx, "b", &format!("rec{}", i % modulo)).unwrap();
    }
    ts.before_first(tx).unwrap();
    Scan::Table(ts)
}

#[test]
fn test_constant_display_and_order() {
    assert_eq!(Constant::Int(5).to_string(), "5");
    assert_eq!(Constant::Str("one".to_string()).to_string(), "'one'");
    assert!(Constant::Int(3) < Constant::Int(7));
    assert_eq!(Constant::Int(3).as_int().unwrap(), 3);
    assert!(Constant::Int(3).as_str().is_err());
}

#[test]
fn test_term_equates() {
    let term = Term::new(
        Expression::Field("a".to_string()),
        Expression::Const(Constant::Int(7)),
    );
    assert_eq!(term.equates_with_constant("a"), Some(&Constant::Int(7)));
    assert_eq!(term.equates_with_constant("b"), None);
    assert_eq!(term.equates_with_field("a"), None);
    assert_eq!(term.to_string(), "a = 7");

    let join = Term::new(
        Expression::Field("a".to_string()),
        Expression::Field("c".to_string()),
    );
    assert_eq!(join.equates_with_field("a"), Some("c"));
    assert_eq!(join.equates_with_field("c"), Some("a"));
}

#[test]
fn test_predicate_sub_preds() {
    let mut sch1 = Schema::new();
    sch1.add_int_field("a");
    let mut sch2 = Schema::new();
    sch2.add_int_field("c");

    let mut pred = Predicate::from_term(Term::new(
        Expression::Field("a".to_string()),
        Expression::Const(Constant::Int(1)),
    ));
    pred.add_term(Term::new(
        Expression::Field("a".to_string()),
        Expression::Field("c".to_string()),
    ));

    let sub = pred.select_sub_pred(&sch1).unwrap();
    assert_eq!(sub.to_string(), "a = 1");
    let join = pred.join_sub_pred(&sch1, &sch2).unwrap();
    assert_eq!(join.to_string(), "a = c");
    assert!(pred.select_sub_pred(&sch2).is_none());
}

#[test]
fn test_select_scan_filters() {
    let dir = tmp_dir("select");
    let db = SimpleDB::new(&dir, Config::default()).expect("db");
    let mut tx = db.new_tx().unwrap();

    let inner = fill_table(&mut tx, "t1", 40, 4);
    let pred = Predicate::from_term(Term::new(
        Expression::Field("b".to_string()),
        Expression::Const(Constant::Str("rec2".to_string())),
    ));
    let mut scan = Scan::Select(SelectScan::new(inner, pred));

    scan.before_first(&mut tx).unwrap();
    let mut seen = 0;
    while scan.next(&mut tx).unwrap() {
        assert_eq!(scan.get_int(&mut tx, "a").unwrap() % 4, 2);
        seen += 1;
    }
    assert_eq!(seen, 10);

    scan.close(&mut tx).unwrap();
    tx.commit().unwrap();
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_select_scan_forwards_updates() {
    let dir = tmp_dir("update");
    let db = SimpleDB::new(&dir, Config::default()).expect("db");
    let mut tx = db.new_tx().unwrap();

    let inner = fill_table(&mut tx, "t1", 10, 2);
    let pred = Predicate::from_term(Term::new(
        Expression::Field("b".to_string()),
        Expression::Const(Constant::Str("rec0".to_string())),
    ));
    let mut scan = Scan::Select(SelectScan::new(inner, pred));

    scan.before_first(&mut tx).unwrap();
    let mut count = 0;
    while scan.next(&mut tx).unwrap() {
        scan.set_int(&mut tx, "a", 100).unwrap();
        count += 1;
    }
    assert_eq!(count, 5);

    // updates landed in the underlying table
    let mut ts = TableScan::new(&mut tx, "t1", number_layout()).unwrap();
    let mut hundreds = 0;
    while ts.next(&mut tx).unwrap() {
        if ts.get_int(&mut tx, "a").unwrap() == 100 {
            hundreds += 1;
        }
    }
    assert_eq!(hundreds, 5);

    ts.close(&mut tx).unwrap();
    scan.close(&mut tx).unwrap();
    tx.commit().unwrap();
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_project_scan_restricts_fields() {
    let dir = tmp_dir("project");
    let db = SimpleDB::new(&dir, Config::default()).expect("db");
    let mut tx = db.new_tx().unwrap();

    let inner = fill_table(&mut tx, "t1", 5, 5);
    let fields: FieldSet = vec!["b".to_string()].into_iter().collect();
    let mut scan = Scan::Project(ProjectScan::new(inner, fields));

    scan.before_first(&mut tx).unwrap();
    assert!(scan.next(&mut tx).unwrap());
    assert!(scan.has_field("b"));
    assert!(!scan.has_field("a"));
    scan.get_string(&mut tx, "b").unwrap();
    match scan.get_int(&mut tx, "a") {
        Err(crate::Error::KeyNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }

    // projections are read only
    match scan.insert(&mut tx) {
        Err(crate::Error::InvalidInput(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }

    scan.close(&mut tx).unwrap();
    tx.commit().unwrap();
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_product_scan_cross() {
    let dir = tmp_dir("product");
    let db = SimpleDB::new(&dir, Config::default()).expect("db");
    let mut tx = db.new_tx().unwrap();

    let mut lhs_schema = Schema::new();
    lhs_schema.add_int_field("x");
    let lhs_layout = Layout::new(lhs_schema).unwrap();
    let mut lts = TableScan::new(&mut tx, "lhs", lhs_layout).unwrap();
    for i in 0..3 {
        lts.insert(&mut tx).unwrap();
        lts.set_int(&mut tx, "x", i).unwrap();
    }

    let mut rhs_schema = Schema::new();
    rhs_schema.add_int_field("y");
    let rhs_layout = Layout::new(rhs_schema).unwrap();
    let mut rts = TableScan::new(&mut tx, "rhs", rhs_layout).unwrap();
    for i in 0..4 {
        rts.insert(&mut tx).unwrap();
        rts.set_int(&mut tx, "y", i * 10).unwrap();
    }

    let mut scan =
        Scan::Product(ProductScan::new(Scan::Table(lts), Scan::Table(rts)));
    scan.before_first(&mut tx).unwrap();

    let mut rows = vec![];
    while scan.next(&mut tx).unwrap() {
        let x = scan.get_int(&mut tx, "x").unwrap();
        let y = scan.get_int(&mut tx, "y").unwrap();
        rows.push((x, y));
    }
    assert_eq!(rows.len(), 12);
    // right side cycles fastest
    assert_eq!(rows[0], (0, 0));
    assert_eq!(rows[3], (0, 30));
    assert_eq!(rows[4], (1, 0));
    assert_eq!(rows[11], (2, 30));

    scan.close(&mut tx).unwrap();
    tx.commit().unwrap();
    fs::remove_dir_all(&dir).ok();
}

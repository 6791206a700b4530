use crate::record::FieldType;

use super::*;

#[test]
fn test_parse_query() {
    let mut parser =
        Parser::new("select a, b from movies, stars where a = 3 and b = c").unwrap();
    let data = parser.parse_query().unwrap();
    assert_eq!(data.fields, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(data.tables, vec!["movies".to_string(), "stars".to_string()]);
    assert_eq!(data.pred.to_string(), "a = 3 and b = c");
    assert_eq!(
        data.to_string(),
        "select a, b from movies, stars where a = 3 and b = c"
    );
}

#[test]
fn test_parse_query_no_predicate() {
    let mut parser = Parser::new("select a from movies").unwrap();
    let data = parser.parse_query().unwrap();
    assert!(data.pred.is_empty());
    assert_eq!(data.to_string(), "select a from movies");
}

#[test]
fn test_parse_insert() {
    let mut parser =
        Parser::new("insert into movies (a, b) values (1, 'one')").unwrap();
    match parser.parse_update_cmd().unwrap() {
        UpdateCmd::Insert(data) => {
            assert_eq!(data.table_name, "movies");
            assert_eq!(data.fields, vec!["a".to_string(), "b".to_string()]);
            assert_eq!(
                data.values,
                vec![Constant::Int(1), Constant::Str("one".to_string())]
            );
        }
        cmd => panic!("unexpected {:?}", cmd),
    }
}

#[test]
fn test_parse_insert_arity_mismatch() {
    let mut parser = Parser::new("insert into movies (a, b) values (1)").unwrap();
    match parser.parse_update_cmd() {
        Err(crate::Error::BadSyntax(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
}

#[test]
fn test_parse_delete_and_modify() {
    let mut parser = Parser::new("delete from movies where a = 3").unwrap();
    match parser.parse_update_cmd().unwrap() {
        UpdateCmd::Delete(data) => {
            assert_eq!(data.table_name, "movies");
            assert_eq!(data.pred.to_string(), "a = 3");
        }
        cmd => panic!("unexpected {:?}", cmd),
    }

    let mut parser = Parser::new("update movies set a = 2 where b = 'one'").unwrap();
    match parser.parse_update_cmd().unwrap() {
        UpdateCmd::Modify(data) => {
            assert_eq!(data.table_name, "movies");
            assert_eq!(data.field_name, "a");
            assert_eq!(data.new_value, Expression::Const(Constant::Int(2)));
            assert_eq!(data.pred.to_string(), "b = 'one'");
        }
        cmd => panic!("unexpected {:?}", cmd),
    }
}

#[test]
fn test_parse_create_table() {
    let mut parser =
        Parser::new("create table movies (a int, b varchar(9))").unwrap();
    match parser.parse_update_cmd().unwrap() {
        UpdateCmd::CreateTable(data) => {
            assert_eq!(data.table_name, "movies");
            let schema = &data.schema;
            assert_eq!(schema.field_type("a").unwrap(), FieldType::Integer);
            assert_eq!(schema.field_type("b").unwrap(), FieldType::Varchar);
            assert_eq!(schema.length("b").unwrap(), 9);
        }
        cmd => panic!("unexpected {:?}", cmd),
    }
}

#[test]
fn test_parse_create_view_renders_definition() {
    let mut parser =
        Parser::new("create view top as select a from movies where a = 1").unwrap();
    match parser.parse_update_cmd().unwrap() {
        UpdateCmd::CreateView(data) => {
            assert_eq!(data.view_name, "top");
            assert_eq!(
                data.view_def_text(),
                "select a from movies where a = 1"
            );
        }
        cmd => panic!("unexpected {:?}", cmd),
    }
}

#[test]
fn test_parse_create_index() {
    let mut parser = Parser::new("create index ix on movies (a)").unwrap();
    match parser.parse_update_cmd().unwrap() {
        UpdateCmd::CreateIndex(data) => {
            assert_eq!(data.index_name, "ix");
            assert_eq!(data.table_name, "movies");
            assert_eq!(data.field_name, "a");
        }
        cmd => panic!("unexpected {:?}", cmd),
    }
}

#[test]
fn test_bad_syntax() {
    for statement in [
        "selec a from t",
        "select from t",
        "insert movies (a) values (1)",
        "create movies",
        "update set a = 1",
    ]
    .iter()
    {
        let res = Parser::new(statement).and_then(|mut p| {
            if statement.starts_with("selec ") || statement.starts_with("select") {
                p.parse_query().map(|_| ())
            } else {
                p.parse_update_cmd().map(|_| ())
            }
        });
        match res {
            Err(crate::Error::BadSyntax(_, _)) => (),
            res => panic!("unexpected {:?} for {}", res, statement),
        }
    }
}

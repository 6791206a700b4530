use super::*;

#[test]
fn test_schema_fields() {
    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_string_field("b", 9);

    assert_eq!(schema.fields(), &["a".to_string(), "b".to_string()]);
    assert!(schema.has_field("a"));
    assert!(!schema.has_field("c"));
    assert_eq!(schema.field_type("a").unwrap(), FieldType::Integer);
    assert_eq!(schema.field_type("b").unwrap(), FieldType::Varchar);
    assert_eq!(schema.length("b").unwrap(), 9);

    match schema.field_type("c") {
        Err(crate::Error::KeyNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
}

#[test]
fn test_schema_add_from_other() {
    let mut base = Schema::new();
    base.add_int_field("a");
    base.add_string_field("b", 20);

    let mut sub = Schema::new();
    sub.add("b", &base).unwrap();
    assert_eq!(sub.fields(), &["b".to_string()]);
    assert_eq!(sub.length("b").unwrap(), 20);

    let mut all = Schema::new();
    all.add_all(&base).unwrap();
    assert_eq!(all, base);
}

#[test]
fn test_field_type_codes() {
    assert_eq!(FieldType::Integer.to_code(), 0);
    assert_eq!(FieldType::Varchar.to_code(), 1);
    assert_eq!(FieldType::from_code(0).unwrap(), FieldType::Integer);
    assert_eq!(FieldType::from_code(1).unwrap(), FieldType::Varchar);
    match FieldType::from_code(12) {
        Err(crate::Error::FailConvert(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
}

#[test]
fn test_layout_offsets() {
    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_string_field("b", 9);
    let layout = Layout::new(schema).unwrap();

    // 4 byte flag, then fields in schema order
    assert_eq!(layout.offset("a").unwrap(), 4);
    assert_eq!(layout.offset("b").unwrap(), 8);
    assert_eq!(layout.slot_size(), 21); // 4 + 4 + (4 + 9)

    match layout.offset("c") {
        Err(crate::Error::KeyNotFound(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
}

#[test]
fn test_layout_from_parts_matches_new() {
    let mut schema = Schema::new();
    schema.add_string_field("name", 16);
    schema.add_int_field("count");
    let layout = Layout::new(schema.clone()).unwrap();

    let mut offsets = std::collections::HashMap::new();
    offsets.insert("name".to_string(), 4);
    offsets.insert("count".to_string(), 24);
    let rebuilt = Layout::from_parts(schema, offsets, 28);

    assert_eq!(layout, rebuilt);
}

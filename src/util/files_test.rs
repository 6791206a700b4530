use serde::{Deserialize, Serialize};

use std::fs;

use super::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct TestConfig {
    name: String,
    count: usize,
}

#[test]
fn test_toml_roundtrip() {
    let mut loc = std::env::temp_dir();
    loc.push(format!("simpledb-files-test-{}.toml", rand::random::<u32>()));
    fs::remove_file(&loc).ok();

    let config = TestConfig {
        name: "movies".to_string(),
        count: 1024,
    };
    save_toml(&loc, &config).expect("save_toml");
    let loaded: TestConfig = load_toml(&loc).expect("load_toml");
    assert_eq!(loaded, config);

    fs::remove_file(&loc).ok();
}

#[test]
fn test_load_toml_missing() {
    let mut loc = std::env::temp_dir();
    loc.push("simpledb-files-test-missing.toml");
    fs::remove_file(&loc).ok();

    let res: crate::Result<TestConfig> = load_toml(&loc);
    match res {
        Err(crate::Error::IOError(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
}

#[test]
fn test_open_file_rw() {
    use std::io::{Read, Seek, SeekFrom, Write};

    let mut loc = std::env::temp_dir();
    loc.push(format!("simpledb-files-test-{}.data", rand::random::<u32>()));
    fs::remove_file(&loc).ok();

    // creates the file when missing
    let mut fd = open_file_rw(&loc).expect("open_file_rw create");
    fd.write_all(b"hello world").expect("write");

    // re-opens without truncating
    let mut fd = open_file_rw(&loc).expect("open_file_rw reuse");
    let mut buf = vec![];
    fd.seek(SeekFrom::Start(0)).expect("seek");
    fd.read_to_end(&mut buf).expect("read");
    assert_eq!(&buf, b"hello world");

    fs::remove_file(&loc).ok();
}

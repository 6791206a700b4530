use rand::{prelude::random, rngs::SmallRng, Rng, SeedableRng};

use super::*;

#[test]
fn test_page_int() {
    let mut page = Page::new(400);
    page.set_int(0, 42).unwrap();
    page.set_int(80, -1).unwrap();
    page.set_int(396, i32::MAX).unwrap();

    assert_eq!(page.get_int(0).unwrap(), 42);
    assert_eq!(page.get_int(80).unwrap(), -1);
    assert_eq!(page.get_int(396).unwrap(), i32::MAX);

    // untouched offsets read zero
    assert_eq!(page.get_int(100).unwrap(), 0);
}

#[test]
fn test_page_int_endianness() {
    // ints are big-endian on disk
    let mut page = Page::new(16);
    page.set_int(0, 0x01020304).unwrap();
    assert_eq!(&page.as_bytes()[..4], &[1, 2, 3, 4]);
}

#[test]
fn test_page_bytes_and_string() {
    let mut page = Page::new(400);
    page.set_bytes(20, &[1, 2, 3]).unwrap();
    assert_eq!(page.get_bytes(20).unwrap(), &[1, 2, 3]);

    page.set_string(100, "abcdefghijklm").unwrap();
    assert_eq!(page.get_string(100).unwrap(), "abcdefghijklm");
    assert_eq!(Page::str_len("abcdefghijklm"), 17);

    page.set_string(200, "").unwrap();
    assert_eq!(page.get_string(200).unwrap(), "");
}

#[test]
fn test_page_out_of_bounds() {
    let mut page = Page::new(40);
    match page.set_int(38, 1) {
        Err(crate::Error::Fatal(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    match page.get_int(40) {
        Err(crate::Error::Fatal(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
    match page.set_string(30, "too long for page") {
        Err(crate::Error::Fatal(_, _)) => (),
        res => panic!("unexpected {:?}", res),
    }
}

#[test]
fn test_page_random_roundtrip() {
    let seed: u64 = random();
    println!("test_page_random_roundtrip seed {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    for _i in 0..100 {
        let mut page = Page::new(400);
        // non-overlapping offset sequence
        let mut writes: Vec<(usize, i32)> = vec![];
        let mut pos = 0;
        while pos + 4 <= 400 {
            let val = rng.gen::<i32>();
            writes.push((pos, val));
            pos += 4 + (rng.gen::<usize>() % 12);
        }
        for (offset, val) in writes.iter() {
            page.set_int(*offset, *val).unwrap();
        }
        for (offset, val) in writes.iter() {
            assert_eq!(page.get_int(*offset).unwrap(), *val);
        }
    }
}

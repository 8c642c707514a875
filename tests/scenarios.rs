//! Black-box end-to-end scenarios, asserting on exact encoded byte sequences.

use pretty_assertions::assert_eq;
use velocypack::{Builder, BuilderOptions, Error, Value};

#[test]
fn s1_empty_array() {
    let mut b = Builder::new(8);
    b.open_array(false).unwrap();
    b.close().unwrap();
    assert_eq!(b.bytes().unwrap(), &[0x01]);
}

#[test]
fn s2_array_of_three_small_ints() {
    let mut b = Builder::new(8);
    b.open_array(false).unwrap();
    b.add_value(Value::SmallInt(1)).unwrap();
    b.add_value(Value::SmallInt(2)).unwrap();
    b.add_value(Value::SmallInt(3)).unwrap();
    b.close().unwrap();
    assert_eq!(b.bytes().unwrap(), &[0x02, 0x05, 0x31, 0x32, 0x33]);
}

/// Keys are inserted `"b"` then `"a"`. Payload bytes stay in insertion order
/// (the builder never moves already-written bytes around to re-sort
/// content); only the index table, which the closer sorts by key, reflects
/// key order.
#[test]
fn s3_object_sorts_index_table_not_payload() {
    let mut b = Builder::new(32);
    b.open_object(false).unwrap();
    b.add_key_value("b", Value::UInt(12)).unwrap();
    b.add_key_value("a", Value::Bool(true)).unwrap();
    b.close().unwrap();
    assert_eq!(
        b.bytes().unwrap(),
        &[0x0b, 0x0c, 0x02, 0x41, 0x62, 0x28, 0x0c, 0x41, 0x61, 0x1a, 0x07, 0x03]
    );
}

#[test]
fn s4_duplicate_key_rejected_when_uniqueness_checked() {
    let mut b = Builder::with_options(
        32,
        BuilderOptions::default().with_check_attribute_uniqueness(true),
    );
    b.open_object(false).unwrap();
    b.add_key_value("x", Value::SmallInt(1)).unwrap();
    b.add_key_value("x", Value::SmallInt(2)).unwrap();
    let err = b.close().unwrap_err();
    assert_eq!(
        err,
        Error::DuplicateAttributeName {
            key: "x".to_string()
        }
    );
}

#[test]
fn s5_long_string_of_200_bytes() {
    let s = "a".repeat(200);
    let mut b = Builder::new(256);
    b.add_value(Value::String(&s)).unwrap();
    let bytes = b.bytes().unwrap();
    assert_eq!(bytes.len(), 209);
    assert_eq!(bytes[0], 0xbf);
    assert_eq!(&bytes[1..9], &[0xc8, 0, 0, 0, 0, 0, 0, 0]);
    assert!(bytes[9..].iter().all(|&b| b == b'a'));
}

#[test]
fn s6_nested_array_of_object_roundtrips_structure() {
    let mut b = Builder::new(32);
    b.open_array(false).unwrap();
    b.open_object(false).unwrap();
    b.add_key_value("k", Value::String("v")).unwrap();
    b.close().unwrap();
    b.close().unwrap();

    let bytes = b.bytes().unwrap();
    // Outer array has one child, equal-length shortcut fires trivially (N=1).
    assert_eq!(bytes[0], 0x02);
    // The inner value is a single-entry object, closed as the compact layout
    // (N == 1 makes it a compact candidate regardless of options).
    assert_eq!(bytes[2], 0x14);
}

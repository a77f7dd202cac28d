//! Cross-module scenarios: JSON/CBOR interop, base64 tunneling,
//! indefinite-length framing, and the parent/child lock discipline, all
//! driven through the crate's public API rather than format-internal types.

use goldfish_stream::io::{ByteReader, SliceReader};
use goldfish_stream::tag::Tag;
use goldfish_stream::{cbor, copy, json};

#[test]
fn json_object_with_mixed_array_iterates_in_order() {
    let mut r = json::Reader::new(SliceReader::new(br#"{"a":1,"b":[true,null,-2,3.5]}"#));
    let mut map = r.read().unwrap().as_map().unwrap();

    let key = map.read_key().unwrap().unwrap();
    let mut buf = [0u8; 4];
    let n = key.as_string().unwrap().read_full_buffer(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"a");
    assert_eq!(map.read_value().unwrap().as_u64().unwrap(), 1);

    let key = map.read_key().unwrap().unwrap();
    key.seek_to_end().unwrap();
    let mut arr = map.read_value().unwrap().as_array().unwrap();
    assert!(arr.read().unwrap().unwrap().as_bool().unwrap());
    assert!(arr.read().unwrap().unwrap().is_null());
    assert_eq!(arr.read().unwrap().unwrap().as_i64().unwrap(), -2);
    assert_eq!(arr.read().unwrap().unwrap().as_f64().unwrap(), 3.5);
    assert!(arr.read().unwrap().is_none());
    assert!(map.read_key().unwrap().is_none());
}

#[test]
fn cbor_map_of_two_entries_matches_same_logical_content() {
    // A2 {"a":1, "b":[true,null,-2,3.5]} as definite-length CBOR.
    let bytes: &[u8] = &[
        0xA2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x84, 0xF5, 0xF6, 0x21, 0xFB, 0x40, 0x0C, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
    ];
    let mut r = cbor::Reader::new(SliceReader::new(bytes));
    let mut map = r.read().unwrap().as_map().unwrap();

    let key = map.read_key().unwrap().unwrap();
    let mut buf = [0u8; 4];
    let n = key.as_string().unwrap().read_full_buffer(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"a");
    assert_eq!(map.read_value().unwrap().as_u64().unwrap(), 1);

    let key = map.read_key().unwrap().unwrap();
    key.seek_to_end().unwrap();
    let mut arr = map.read_value().unwrap().as_array().unwrap();
    assert!(arr.read().unwrap().unwrap().as_bool().unwrap());
    assert!(arr.read().unwrap().unwrap().is_null());
    assert_eq!(arr.read().unwrap().unwrap().as_i64().unwrap(), -2);
    assert_eq!(arr.read().unwrap().unwrap().as_f64().unwrap(), 3.5);
    assert!(arr.read().unwrap().is_none());
    assert!(map.read_key().unwrap().is_none());
}

#[test]
fn json_string_decodes_surrogate_pair_to_utf8() {
    let mut r = json::Reader::new(SliceReader::new(b"\"\\u0041\\uD834\\uDD1E\""));
    let mut s = r.read().unwrap().as_string().unwrap();
    let mut out = Vec::new();
    let mut chunk = [0u8; 8];
    loop {
        let n = s.read_partial_buffer(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(out, vec![0x41, 0xF0, 0x9D, 0x84, 0x9E]);
}

#[test]
fn indefinite_cbor_binary_concatenates_chunks_then_eos() {
    let mut r = cbor::Reader::new(SliceReader::new(b"\x5F\x42\x01\x02\x41\x03\xFF"));
    let mut bin = r.read().unwrap().as_binary().unwrap();
    let mut out = Vec::new();
    let mut chunk = [0u8; 8];
    loop {
        let n = bin.read_partial_buffer(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(out, vec![1, 2, 3]);
}

#[test]
fn json_write_of_binary_blob_uses_padded_base64() {
    let mut w = json::writer::Writer::new_compact(Vec::new());
    w.write_binary(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
    assert_eq!(String::from_utf8(w.into_inner()).unwrap(), r#""3q2+7w==""#);
}

#[test]
fn round_trips_through_json_cbor_json() {
    let mut r = json::Reader::new(SliceReader::new(br#"{"a":1,"b":[true,null,-2,3.5]}"#));
    let doc = r.read().unwrap();

    let mut to_cbor = cbor::writer::Writer::new(Vec::new());
    copy::copy(doc, &mut to_cbor).unwrap();
    let cbor_bytes = to_cbor.into_inner();

    let mut from_cbor = cbor::Reader::new(SliceReader::new(&cbor_bytes));
    let doc = from_cbor.read().unwrap();

    let mut to_json = json::writer::Writer::new_compact(Vec::new());
    copy::copy(doc, &mut to_json).unwrap();
    assert_eq!(
        String::from_utf8(to_json.into_inner()).unwrap(),
        r#"{"a":1,"b":[true,null,-2,3.5]}"#
    );
}

#[test]
fn child_closure_advances_past_consumed_terminator() {
    let mut r = json::Reader::new(SliceReader::new(br#"[[1,2],3]"#));
    let mut outer = r.read().unwrap().as_array().unwrap();
    let mut inner = outer.read().unwrap().unwrap().as_array().unwrap();
    assert_eq!(inner.read().unwrap().unwrap().as_u64().unwrap(), 1);
    assert_eq!(inner.read().unwrap().unwrap().as_u64().unwrap(), 2);
    assert!(inner.read().unwrap().is_none());

    // the inner array's closing ']' is already consumed; the outer array's
    // next element starts right at "3".
    assert_eq!(outer.read().unwrap().unwrap().as_u64().unwrap(), 3);
    assert!(outer.read().unwrap().is_none());
}

#[cfg(feature = "checked")]
#[test]
fn lock_discipline_rejects_advancing_past_a_live_child() {
    let mut r = json::Reader::new(SliceReader::new(br#"[[1,2],3]"#));
    let mut outer = r.read().unwrap().as_array().unwrap();
    let _inner = outer.read().unwrap().unwrap().as_array().unwrap();
    // the inner array is still live (undrained); advancing the outer array
    // without draining it first must fail deterministically.
    assert!(outer.read().is_err());
}

#[test]
fn map_key_round_trips_through_json_as_a_quoted_string() {
    let mut w = json::writer::Writer::new_compact(Vec::new());
    {
        let mut m = w.start_map().unwrap();
        m.write_u64("42", 1).unwrap();
    }
    let bytes = w.into_inner();
    assert_eq!(String::from_utf8(bytes.clone()).unwrap(), r#"{"42":1}"#);

    let mut r = json::Reader::new(SliceReader::new(&bytes));
    let mut map = r.read().unwrap().as_map().unwrap();
    let key = map.read_key().unwrap().unwrap();
    assert_eq!(key.tag(), Tag::String);
    assert_eq!(key.as_u64().unwrap(), 42);
}

//! Tests for HPACK decoding

use h2_oneshot::{HeaderField, HpackDecoder};

#[test]
fn test_decode_huffman_request() {
    let mut decoder = HpackDecoder::new();

    // RFC 7541 C.4.1: :authority is a Huffman-coded literal
    let data = [
        0x82, 0x86, 0x84, 0x41, 0x8c, 0xf1, 0xe3, 0xc2, 0xe5, 0xf2, 0x3a, 0x6b, 0xa0, 0xab, 0x90, 0xf4, 0xff,
    ];
    let fields = decoder.decode(&data).unwrap();

    assert_eq!(
        fields,
        vec![
            HeaderField::new(":method", "GET"),
            HeaderField::new(":scheme", "http"),
            HeaderField::new(":path", "/"),
            HeaderField::new(":authority", "www.example.com"),
        ]
    );
}

#[test]
fn test_decode_static_status() {
    let mut decoder = HpackDecoder::new();

    // 0x88 = :status: 200
    let fields = decoder.decode(&[0x88]).unwrap();
    assert_eq!(fields, vec![HeaderField::new(":status", "200")]);
}

#[test]
fn test_decode_literal_with_indexed_name() {
    let mut decoder = HpackDecoder::new();

    // 0x5F = literal with indexing, name index 31 (content-type); 0x10 = value length 16
    let mut data = vec![0x5F, 0x10];
    data.extend_from_slice(b"application/json");

    let fields = decoder.decode(&data).unwrap();
    assert_eq!(fields, vec![HeaderField::new("content-type", "application/json")]);
}

#[test]
fn test_dynamic_table_spans_blocks() {
    let mut decoder = HpackDecoder::new();

    // Literal with incremental indexing, new name: lands at dynamic index 62.
    let mut first = vec![0x40, 0x07];
    first.extend_from_slice(b"x-trace");
    first.push(0x03);
    first.extend_from_slice(b"abc");
    decoder.decode(&first).unwrap();

    // 0xBE = indexed, index 62
    let fields = decoder.decode(&[0xBE]).unwrap();
    assert_eq!(fields, vec![HeaderField::new("x-trace", "abc")]);
}

#[test]
fn test_decode_unknown_index_fails() {
    let mut decoder = HpackDecoder::new();

    // Index 62 with an empty dynamic table
    assert!(decoder.decode(&[0xBE]).is_err());
}

#[test]
fn test_decode_invalid_utf8_is_lossy() {
    let mut decoder = HpackDecoder::new();

    // Literal without indexing, new name "x", value 0xFF
    let fields = decoder.decode(&[0x00, 0x01, b'x', 0x01, 0xFF]).unwrap();
    assert_eq!(fields[0].name, "x");
    assert_eq!(fields[0].value, "\u{FFFD}");
}

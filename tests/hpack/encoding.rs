//! Tests for HPACK encoding

use h2_oneshot::{hpack, HeaderField, HpackDecoder, HpackEncoder, Response};

#[test]
fn test_encode_response_fields() {
    let mut encoder = HpackEncoder::new();
    let mut decoder = HpackDecoder::new();

    let response = Response::ok("image/png", vec![0; 2500]);
    let block = encoder.encode(&response.header_fields());
    let fields = decoder.decode(&block).unwrap();

    assert_eq!(hpack::find(&fields, ":status"), Some("200"));
    assert_eq!(hpack::find(&fields, "content-length"), Some("2500"));
    assert_eq!(hpack::find(&fields, "content-type"), Some("image/png"));
}

#[test]
fn test_encode_preserves_order() {
    let mut encoder = HpackEncoder::new();
    let mut decoder = HpackDecoder::new();
    let fields = vec![
        HeaderField::new(":method", "POST"),
        HeaderField::new(":scheme", "http"),
        HeaderField::new(":authority", "127.0.0.1:3000"),
        HeaderField::new(":path", "/upload"),
        HeaderField::new("content-type", "application/json"),
        HeaderField::new("content-length", "19"),
    ];

    let block = encoder.encode(&fields);
    assert_eq!(decoder.decode(&block).unwrap(), fields);
}

#[test]
fn test_encode_empty_list() {
    let mut encoder = HpackEncoder::new();
    let mut decoder = HpackDecoder::new();

    let block = encoder.encode(&[]);
    assert!(block.is_empty());
    assert!(decoder.decode(&block).unwrap().is_empty());
}

#[test]
fn test_encoder_decoder_pair_across_blocks() {
    let mut encoder = HpackEncoder::new();
    let mut decoder = HpackDecoder::new();
    let first = vec![HeaderField::new("x-request", "one")];
    let second = vec![HeaderField::new("x-request", "two"), HeaderField::new(":status", "404")];

    let a = encoder.encode(&first);
    let b = encoder.encode(&second);
    assert_eq!(decoder.decode(&a).unwrap(), first);
    assert_eq!(decoder.decode(&b).unwrap(), second);
}

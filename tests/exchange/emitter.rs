//! Response emission as seen by a reader on the other side

use std::num::NonZeroUsize;

use h2_oneshot::{
    flags, frame_type, FrameChannel, HeaderField, RequestAssembler, Response, ResponseEmitter,
};

use super::support::{payload, split_frames, Scripted};

#[test]
fn test_frame_sequence_for_2500_byte_body() {
    let mut channel = FrameChannel::new(Scripted::new(Vec::new()));
    let response = Response::ok("image/png", payload());
    ResponseEmitter::default().emit(&mut channel, 1, &response).unwrap();

    let frames = split_frames(&channel.into_inner().output);
    let shape: Vec<(u8, u32, u8)> = frames
        .iter()
        .map(|(h, _)| (h.frame_type, h.length, h.flags))
        .collect();

    assert_eq!(shape.len(), 5);
    assert_eq!(shape[0].0, frame_type::HEADERS);
    assert_eq!(shape[0].2, flags::END_HEADERS);
    assert_eq!(
        shape[1..],
        [
            (frame_type::DATA, 1024, 0),
            (frame_type::DATA, 1024, 0),
            (frame_type::DATA, 452, 0),
            (frame_type::DATA, 0, flags::END_STREAM),
        ]
    );
}

#[test]
fn test_emitted_response_reassembles() {
    let mut writer = FrameChannel::new(Scripted::new(Vec::new()));
    let response = Response::ok("image/png", payload());
    ResponseEmitter::new(NonZeroUsize::new(700).unwrap())
        .emit(&mut writer, 3, &response)
        .unwrap();

    let wire = writer.into_inner().output;
    let mut reader = FrameChannel::new(Scripted::new(wire));
    let received = RequestAssembler::new().assemble(&mut reader, None).unwrap();

    assert_eq!(received.stream_id, 3);
    assert_eq!(received.body, payload());
    assert_eq!(
        received.headers,
        vec![
            HeaderField::new(":status", "200"),
            HeaderField::new("content-length", "2500"),
            HeaderField::new("content-type", "image/png"),
        ]
    );
}

#[test]
fn test_successive_responses_share_codec_state() {
    let mut writer = FrameChannel::new(Scripted::new(Vec::new()));
    let mut emitter = ResponseEmitter::default();
    let response = Response::ok("image/png", b"abc".to_vec());
    emitter.emit(&mut writer, 1, &response).unwrap();
    emitter.emit(&mut writer, 3, &response).unwrap();

    let frames = split_frames(&writer.get_ref().output);
    let headers = frames.iter().filter(|(h, _)| h.frame_type == frame_type::HEADERS).count();
    assert_eq!(headers, 2);

    let mut reader = FrameChannel::new(Scripted::new(writer.into_inner().output));
    let mut assembler = RequestAssembler::new();
    let first = assembler.assemble(&mut reader, None).unwrap();
    let second = assembler.assemble(&mut reader, None).unwrap();
    assert_eq!(first.headers, second.headers);
    assert_eq!(second.stream_id, 3);
}

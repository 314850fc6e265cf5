//! The stage crates driven by hand, without a handler in between.

mod common;

use ffmpeg_decode::Decoder;
use ffmpeg_encode::{Encoder, EncoderTarget};
use ffmpeg_source::Source;
use ffmpeg_transcode::{EncoderOptions, ErrorKind, Poll, StreamType};
use ffmpeg_transform::FilterGraph;

use common::write_wav;

#[test]
fn stages_reject_input_after_end_of_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.wav");
    write_wav(&path, 8_000, 1);

    let mut source = Source::open(&path, StreamType::Audio).unwrap();
    let mut decoder = Decoder::open(source.decoder_input().unwrap()).unwrap();
    let decoded = decoder.format().unwrap();

    let target =
        EncoderTarget::find("pcm_s16le", &decoded, None, EncoderOptions::default()).unwrap();
    let mut filter = FilterGraph::build(&decoded, "anull", target.sink_format()).unwrap();
    let negotiated = filter.negotiated().unwrap();
    let mut encoder = Encoder::open(target, &negotiated, false).unwrap();

    let packet = match source.read().unwrap() {
        Poll::Produced(packet) => packet.clone(),
        _ => panic!("input has no packet"),
    };

    decoder.submit(Some(&packet)).unwrap();
    decoder.submit(None).unwrap();
    let err = decoder.submit(Some(&packet)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(decoder.submit(None).unwrap_err().kind(), ErrorKind::InvalidState);

    let Poll::Produced(decoded_frame) = decoder.receive().unwrap() else {
        panic!("decoder held no frame");
    };
    filter.push(Some(&*decoded_frame)).unwrap();
    filter.push(None).unwrap();
    let err = filter.push(Some(&*decoded_frame)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let Poll::Produced(filtered) = filter.pull().unwrap() else {
        panic!("filter graph held no frame");
    };
    encoder.submit(Some(&mut *filtered)).unwrap();
    assert!(matches!(encoder.receive().unwrap(), Poll::Produced(_)));

    // PCM has no delay, so there is nothing to flush.
    assert!(!encoder.flush().unwrap());

    encoder.submit(None).unwrap();
    let err = encoder.submit(Some(filtered)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

/*!
    Single-track transcoding on top of the ffmpeg stage crates.

    Wires [`ffmpeg_source`], [`ffmpeg_decode`], [`ffmpeg_transform`],
    [`ffmpeg_encode`] and [`ffmpeg_sink`] into one [`Handler`] with a simple
    lifecycle: initialize, optionally seek, process, flush, close.

    # Example

    ```ignore
    use ffmpeg_transcode::{Handler, TranscodeParams};

    let params = TranscodeParams::audio("talk.wav", "talk.m4a")
        .with_filters("aresample=48000")
        .with_encoder_options("b 64k");

    let mut handler = Handler::open(&params)?;
    handler.process_all()?;
    handler.flush()?;
    ```
*/

mod handler;
mod params;
mod report;

pub use handler::{Handler, HandlerState};
pub use params::TranscodeParams;
pub use report::{describe_error, end_of_stream_code, error_string, need_more_input_code, report};

pub use ffmpeg_types::{EncoderOptions, Error, ErrorKind, Poll, Result, StreamType};

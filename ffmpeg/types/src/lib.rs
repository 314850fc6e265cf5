/*!
    Shared types for the ffmpeg transcoding crates.

    This crate defines the vocabulary that crosses crate boundaries in the
    pipeline: errors, the backpressure signal every stage returns, the stream
    kind, and encoder option lists. By default it has no dependency on FFmpeg.
    The `ffmpeg` feature adds conversions from `ffmpeg_next::Error` and
    parsing of option strings through the engine's dictionary parser.

    # Core Types

    - [`Error`], [`ErrorKind`] and [`Result`] - Errors carrying an engine code
    - [`Poll`] - Produced / need more input / exhausted
    - [`StreamType`] - Video or audio
    - [`EncoderOptions`] - `key value,key value` option lists
*/

mod error;
mod options;
mod poll;
mod stream;

#[cfg(feature = "ffmpeg")]
mod engine;

pub use error::{Error, ErrorKind, Result};
pub use options::EncoderOptions;
pub use poll::Poll;
pub use stream::StreamType;

/*!
    Single-stream muxing for the ffmpeg transcoding crates.

    This crate handles the output side of the pipeline. An [`OutputFormat`]
    resolves the muxer from a format name or the output file name, and a
    [`Sink`] created from an opened encoder writes one stream: header,
    interleaved packets, trailer.
*/

mod format;
mod sink;

pub use format::OutputFormat;
pub use sink::Sink;

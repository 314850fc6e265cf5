/*!
    Filter graphs for the ffmpeg transcoding crates.

    A [`FilterGraph`] sits between the decoder and the encoder. It is built
    from the decoder's [`DecodedFormat`](ffmpeg_decode::DecodedFormat), an
    opaque filter chain such as `"scale=640:-2"` or `"aresample=48000"`, and
    the [`SinkFormat`] the encoder needs. Once validated it reports the
    [`NegotiatedFormat`] the encoder must be opened with.

    Filter chains are passed through to the engine as written, the only
    addition is a trailing format filter pinning the sink format.
*/

mod format;
mod graph;

pub use format::{NegotiatedFormat, SinkFormat};
pub use graph::FilterGraph;

/*!
    Packet decoding for the ffmpeg transcoding crates.

    This crate turns compressed packets from `ffmpeg-source` into raw frames.
    A [`Decoder`] is opened from the source's [`DecoderInput`](ffmpeg_source::DecoderInput)
    and hands out one reusable frame at a time, with its pts already replaced
    by the decoder's best-effort timestamp.

    The [`DecodedFormat`] it reports is what the filter graph is built from.
*/

mod decoder;
mod format;
mod layout;

pub use decoder::Decoder;
pub use format::{AudioFormat, DecodedFormat, VideoFormat};
pub use layout::ChannelLayout;

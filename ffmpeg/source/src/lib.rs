/*!
    Input opening and single-stream demuxing for the ffmpeg transcoding crates.

    This crate handles the input side of the pipeline. It opens a container,
    picks the best stream of the requested kind, tells the demuxer to discard
    every other stream, and reads compressed packets of the selected stream
    into a buffer it reuses for every read.

    ```ignore
    let mut source = Source::open("input.mp4", StreamType::Video)?;
    let decoder_input = source.decoder_input()?;

    while let Poll::Produced(packet) = source.read()? {
        // hand the packet to the decoder
    }
    ```
*/

mod decoder_input;
mod source;

pub use decoder_input::DecoderInput;
pub use source::Source;

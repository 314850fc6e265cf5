/*!
    Frame encoding for the ffmpeg transcoding crates.

    Encoding happens in two steps. An [`EncoderTarget`] looks the encoder up
    by name and decides which format the filter graph has to deliver, before
    anything is built. Once the filter graph is validated, an [`Encoder`] is
    opened from the target and the graph's
    [`NegotiatedFormat`](ffmpeg_transform::NegotiatedFormat).

    ```ignore
    let target = EncoderTarget::find("libx264", &decoded, Some(Pixel::YUV420P), options)?;
    let mut graph = FilterGraph::build(&decoded, "scale=640:-2", target.sink_format())?;
    let encoder = Encoder::open(target, &graph.negotiated()?, false)?;
    ```

    # Time bases

    Video is encoded in the inverse of the frame rate at the filter sink,
    audio in `1/sample_rate`. Frames are rescaled into the encoder's time
    base on [`Encoder::submit`]; packets come out in it.
*/

mod encoder;
mod target;

pub use encoder::Encoder;
pub use target::EncoderTarget;

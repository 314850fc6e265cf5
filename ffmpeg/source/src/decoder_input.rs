/*!
    Decoder configuration handed from the source to the decoder.
*/

use ffmpeg_next::{Rational, codec};

use ffmpeg_types::StreamType;

/**
    Everything a decoder needs to know about the selected input stream.

    Only an opened [`Source`](crate::Source) can produce one, so a decoder
    can never be configured before its input exists.

    Pass this to `ffmpeg-decode` to create the decoder for the stream.
*/
pub struct DecoderInput {
    parameters: codec::Parameters,
    stream_type: StreamType,
    stream_index: usize,
    time_base: Rational,
    frame_rate: Rational,
}

impl DecoderInput {
    pub(crate) fn new(
        parameters: codec::Parameters,
        stream_type: StreamType,
        stream_index: usize,
        time_base: Rational,
        frame_rate: Rational,
    ) -> Self {
        Self {
            parameters,
            stream_type,
            stream_index,
            time_base,
            frame_rate,
        }
    }

    /**
        Codec parameters of the input stream.
    */
    pub fn parameters(&self) -> &codec::Parameters {
        &self.parameters
    }

    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    /**
        Index of the selected stream inside the input container.
    */
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /**
        Time base of packets read from the selected stream.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Frame rate guessed from container and codec information.

        Zero (`0/1`) when nothing could be guessed, which is normal for audio.
    */
    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }
}

impl std::fmt::Debug for DecoderInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderInput")
            .field("codec_id", &self.parameters.id())
            .field("stream_type", &self.stream_type)
            .field("stream_index", &self.stream_index)
            .field("time_base", &self.time_base)
            .field("frame_rate", &self.frame_rate)
            .finish_non_exhaustive()
    }
}

/*!
    Decoder output description.
*/

use ffmpeg_next::{Rational, format};

use ffmpeg_types::StreamType;

use crate::layout::ChannelLayout;

/**
    Geometry and pixel format of decoded video frames.
*/
#[derive(Clone, Debug)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub pixel: format::Pixel,
    pub sample_aspect_ratio: Rational,
}

/**
    Sample layout of decoded audio frames.
*/
#[derive(Debug)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub sample: format::Sample,
    pub channel_layout: ChannelLayout,
}

#[derive(Debug)]
pub(crate) enum Media {
    Video(VideoFormat),
    Audio(AudioFormat),
}

/**
    What an opened [`Decoder`](crate::Decoder) produces.

    Only a decoder can create one, which is what lets the filter graph demand
    an opened decoder before it can be built.
*/
#[derive(Debug)]
pub struct DecodedFormat {
    pub(crate) media: Media,
    pub(crate) time_base: Rational,
    pub(crate) frame_rate: Rational,
}

impl DecodedFormat {
    pub fn stream_type(&self) -> StreamType {
        match self.media {
            Media::Video(_) => StreamType::Video,
            Media::Audio(_) => StreamType::Audio,
        }
    }

    pub fn video(&self) -> Option<&VideoFormat> {
        match &self.media {
            Media::Video(video) => Some(video),
            Media::Audio(_) => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioFormat> {
        match &self.media {
            Media::Audio(audio) => Some(audio),
            Media::Video(_) => None,
        }
    }

    /**
        Time base of the timestamps on decoded frames.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Frame rate guessed for the input stream, `0/1` if unknown.
    */
    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }
}

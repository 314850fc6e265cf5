/*!
    Sink constraints and negotiated output formats.
*/

use std::ffi::CStr;

use ffmpeg_next::{Rational, ffi, format};

use ffmpeg_decode::{AudioFormat, VideoFormat};
use ffmpeg_types::{Error, Result, StreamType};

/**
    The single format the filter graph's sink is allowed to produce.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkFormat {
    Video(format::Pixel),
    Audio(format::Sample),
}

impl SinkFormat {
    pub fn stream_type(self) -> StreamType {
        match self {
            Self::Video(_) => StreamType::Video,
            Self::Audio(_) => StreamType::Audio,
        }
    }

    /**
        The engine's numeric id for the format.
    */
    pub(crate) fn raw(self) -> i32 {
        match self {
            Self::Video(pixel) => ffi::AVPixelFormat::from(pixel) as i32,
            Self::Audio(sample) => ffi::AVSampleFormat::from(sample) as i32,
        }
    }

    /**
        Filter appended after the user chain to pin the sink format.
    */
    pub(crate) fn constraint(self) -> Result<String> {
        match self {
            Self::Video(pixel) => Ok(format!("format=pix_fmts={}", pixel_name(pixel)?)),
            Self::Audio(sample) => Ok(format!("aformat=sample_fmts={}", sample_name(sample)?)),
        }
    }
}

#[derive(Debug)]
pub(crate) enum Media {
    Video(VideoFormat),
    Audio(AudioFormat),
}

/**
    What the filter graph's sink settled on after validation.

    Only a validated [`FilterGraph`](crate::FilterGraph) can report one, and
    an encoder can only be opened from one.
*/
#[derive(Debug)]
pub struct NegotiatedFormat {
    pub(crate) media: Media,
    pub(crate) time_base: Rational,
    pub(crate) frame_rate: Rational,
}

impl NegotiatedFormat {
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
        Time base of the frames pulled from the sink.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Frame rate reported by the sink, `0/1` if unknown.
    */
    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }
}

pub(crate) fn pixel_name(pixel: format::Pixel) -> Result<&'static str> {
    // SAFETY: the engine returns a static string or null.
    let name = unsafe { ffi::av_get_pix_fmt_name(pixel.into()) };
    static_name(name).ok_or_else(|| Error::unsupported(format!("pixel format {pixel:?} has no name")))
}

pub(crate) fn sample_name(sample: format::Sample) -> Result<&'static str> {
    // SAFETY: the engine returns a static string or null.
    let name = unsafe { ffi::av_get_sample_fmt_name(sample.into()) };
    static_name(name)
        .ok_or_else(|| Error::unsupported(format!("sample format {sample:?} has no name")))
}

fn static_name(name: *const std::os::raw::c_char) -> Option<&'static str> {
    if name.is_null() {
        return None;
    }
    // SAFETY: non-null names point into the engine's static format tables.
    unsafe { CStr::from_ptr(name) }.to_str().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_constraint() {
        let sink = SinkFormat::Video(format::Pixel::YUV420P);
        assert_eq!(sink.stream_type(), StreamType::Video);
        assert_eq!(sink.constraint().unwrap(), "format=pix_fmts=yuv420p");
    }

    #[test]
    fn audio_constraint() {
        let sink = SinkFormat::Audio(format::Sample::F32(format::sample::Type::Planar));
        assert_eq!(sink.stream_type(), StreamType::Audio);
        assert_eq!(sink.constraint().unwrap(), "aformat=sample_fmts=fltp");
    }

    #[test]
    fn unnamed_formats_are_unsupported() {
        assert!(SinkFormat::Video(format::Pixel::None).constraint().is_err());
        assert!(SinkFormat::Audio(format::Sample::None).constraint().is_err());
    }
}

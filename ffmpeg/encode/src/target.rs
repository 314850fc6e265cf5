/*!
    Encoder lookup.
*/

use ffmpeg_next::{codec, format, media};
use tracing::debug;

use ffmpeg_decode::DecodedFormat;
use ffmpeg_transform::SinkFormat;
use ffmpeg_types::{EncoderOptions, Error, ErrorKind, Result, StreamType};

/**
    An encoder that exists, can encode the stream, and knows its input format.

    Looking the encoder up is cheap and opens nothing, so an unknown encoder
    name is reported before the output file is touched.
*/
pub struct EncoderTarget {
    pub(crate) codec: codec::Codec,
    pub(crate) name: String,
    pub(crate) stream_type: StreamType,
    pub(crate) sink_format: SinkFormat,
    pub(crate) options: EncoderOptions,
}

impl EncoderTarget {
    /**
        Find the encoder called `name` for frames described by `decoded`.

        For video, `pixel_format` picks the pixel format to encode in. When
        it is `None` the encoder's first supported pixel format is used, or
        the decoder's own format if the encoder lists none. Audio is always
        encoded in the encoder's first supported sample format, again falling
        back to the decoder's.
    */
    pub fn find(
        name: &str,
        decoded: &DecodedFormat,
        pixel_format: Option<format::Pixel>,
        options: EncoderOptions,
    ) -> Result<Self> {
        ffmpeg_next::init()
            .map_err(|e| Error::engine(e, ErrorKind::EngineFailure, "initialize ffmpeg"))?;

        let codec = ffmpeg_next::encoder::find_by_name(name).ok_or_else(|| {
            Error::engine(
                ffmpeg_next::Error::EncoderNotFound,
                ErrorKind::UnsupportedMedia,
                format!("encoder '{name}' not found"),
            )
        })?;

        let stream_type = decoded.stream_type();
        let medium = match stream_type {
            StreamType::Video => media::Type::Video,
            StreamType::Audio => media::Type::Audio,
        };
        if codec.medium() != medium {
            return Err(Error::unsupported(format!(
                "encoder '{name}' cannot encode {stream_type}"
            )));
        }

        let sink_format = match (decoded.video(), decoded.audio()) {
            (Some(video), _) => {
                let pixel = match pixel_format {
                    Some(pixel) => pixel,
                    None => first_pixel_format(codec).unwrap_or(video.pixel),
                };
                SinkFormat::Video(pixel)
            }
            (None, Some(audio)) => {
                SinkFormat::Audio(first_sample_format(codec).unwrap_or(audio.sample))
            }
            (None, None) => return Err(Error::invalid_argument("decoded format has no media")),
        };

        debug!(encoder = name, ?sink_format, options = options.len(), "found encoder");

        Ok(Self {
            codec,
            name: name.to_owned(),
            stream_type,
            sink_format,
            options,
        })
    }

    /**
        The format the filter graph must deliver to this encoder.
    */
    pub fn sink_format(&self) -> SinkFormat {
        self.sink_format
    }
}

impl std::fmt::Debug for EncoderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderTarget")
            .field("name", &self.name)
            .field("stream_type", &self.stream_type)
            .field("sink_format", &self.sink_format)
            .field("options", &self.options)
            .finish()
    }
}

fn first_pixel_format(codec: codec::Codec) -> Option<format::Pixel> {
    codec.video().ok()?.formats()?.next()
}

fn first_sample_format(codec: codec::Codec) -> Option<format::Sample> {
    codec.audio().ok()?.formats()?.next()
}

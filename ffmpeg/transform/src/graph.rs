/*!
    Filter stage.
*/

use ffmpeg_next::{Frame, Rational, ffi, filter};
use tracing::{Level, debug, trace};

use ffmpeg_decode::{AudioFormat, ChannelLayout, DecodedFormat, VideoFormat};
use ffmpeg_types::{Error, ErrorKind, Poll, Result, StreamType};

use crate::format::{Media, NegotiatedFormat, SinkFormat, sample_name};

const SOURCE: &str = "in";
const SINK: &str = "out";

/**
    A validated `in -> <chain> -> out` filter graph.

    Frames go in through [`FilterGraph::push`] and come out of
    [`FilterGraph::pull`] one at a time, carrying the sink's time base.
*/
pub struct FilterGraph {
    graph: filter::Graph,
    frame: Frame,
    stream_type: StreamType,
    sink_format: SinkFormat,
    time_base: Rational,
    draining: bool,
}

impl FilterGraph {
    /**
        Build and validate a graph for frames described by `decoded`.

        An empty `chain` passes frames through unchanged. Parse and
        validation failures are reported as [`ErrorKind::MalformedFilterSpec`].
    */
    pub fn build(decoded: &DecodedFormat, chain: &str, sink_format: SinkFormat) -> Result<Self> {
        let stream_type = decoded.stream_type();
        if sink_format.stream_type() != stream_type {
            return Err(Error::invalid_argument(format!(
                "cannot constrain a {stream_type} filter graph to {sink_format:?}"
            )));
        }

        let (source_name, sink_name, args, passthrough) = match decoded.audio() {
            None => {
                let video = decoded
                    .video()
                    .ok_or_else(|| Error::invalid_argument("decoded format has no media"))?;
                let args = video_source_args(video, decoded.time_base(), decoded.frame_rate());
                ("buffer", "buffersink", args, "null")
            }
            Some(audio) => {
                let args = audio_source_args(audio, decoded.time_base())?;
                ("abuffer", "abuffersink", args, "anull")
            }
        };

        let chain = match chain.trim() {
            "" => passthrough,
            chain => chain,
        };
        let spec = format!("{chain},{}", sink_format.constraint()?);

        let mut graph = filter::Graph::new();
        graph
            .add(&find_filter(source_name)?, SOURCE, &args)
            .map_err(|e| {
                Error::engine(e, ErrorKind::EngineFailure, format!("cannot create {source_name} '{args}'"))
            })?;
        graph
            .add(&find_filter(sink_name)?, SINK, "")
            .map_err(|e| Error::engine(e, ErrorKind::EngineFailure, format!("cannot create {sink_name}")))?;

        graph
            .output(SOURCE, 0)
            .and_then(|parser| parser.input(SINK, 0))
            .and_then(|parser| parser.parse(&spec))
            .map_err(|e| {
                Error::engine(
                    e,
                    ErrorKind::MalformedFilterSpec,
                    format!("cannot parse filter chain '{chain}'"),
                )
            })?;

        graph.validate().map_err(|e| {
            Error::engine(
                e,
                ErrorKind::MalformedFilterSpec,
                format!("filter chain '{chain}' does not validate"),
            )
        })?;

        let time_base = {
            let sink = context(&mut graph, SINK)?;
            // SAFETY: the sink belongs to a configured graph.
            Rational::from(unsafe { ffi::av_buffersink_get_time_base(sink.as_ptr()) })
        };

        // SAFETY: plain allocation, checked for null below.
        let frame = unsafe { Frame::empty() };
        // SAFETY: only the pointer value is inspected.
        if unsafe { frame.as_ptr() }.is_null() {
            return Err(Error::engine(
                ffmpeg_next::Error::Other {
                    errno: ffmpeg_next::error::ENOMEM,
                },
                ErrorKind::AllocationFailure,
                "allocate filtered frame",
            ));
        }

        debug!(%stream_type, source = %args, %spec, time_base = %time_base, "built filter graph");
        if tracing::enabled!(Level::DEBUG) {
            debug!("filter graph:\n{}", graph.dump());
        }

        Ok(Self {
            graph,
            frame,
            stream_type,
            sink_format,
            time_base,
            draining: false,
        })
    }

    /**
        Describe what the sink settled on after validation.
    */
    pub fn negotiated(&mut self) -> Result<NegotiatedFormat> {
        let sink = context(&mut self.graph, SINK)?;

        // SAFETY: the sink belongs to a configured graph and is only read.
        let (media, format, frame_rate) = unsafe {
            let ptr = sink.as_ptr();
            let format = ffi::av_buffersink_get_format(ptr);
            let frame_rate = Rational::from(ffi::av_buffersink_get_frame_rate(ptr));
            let media = match self.sink_format {
                SinkFormat::Video(pixel) => Media::Video(VideoFormat {
                    width: ffi::av_buffersink_get_w(ptr).max(0) as u32,
                    height: ffi::av_buffersink_get_h(ptr).max(0) as u32,
                    pixel,
                    sample_aspect_ratio: Rational::from(
                        ffi::av_buffersink_get_sample_aspect_ratio(ptr),
                    ),
                }),
                SinkFormat::Audio(sample) => {
                    let mut raw: ffi::AVChannelLayout = std::mem::zeroed();
                    let code = ffi::av_buffersink_get_ch_layout(ptr, &mut raw);
                    if code < 0 {
                        return Err(Error::engine(
                            ffmpeg_next::Error::from(code),
                            ErrorKind::AllocationFailure,
                            "read negotiated channel layout",
                        ));
                    }
                    let channel_layout = ChannelLayout::copy_from(&raw);
                    ffi::av_channel_layout_uninit(&mut raw);
                    Media::Audio(AudioFormat {
                        sample_rate: ffi::av_buffersink_get_sample_rate(ptr).max(0) as u32,
                        sample,
                        channel_layout: channel_layout?,
                    })
                }
            };
            (media, format, frame_rate)
        };

        if format != self.sink_format.raw() {
            return Err(Error::unsupported(format!(
                "filter sink negotiated format {format}, expected {:?}",
                self.sink_format
            )));
        }

        match &media {
            Media::Video(video) => debug!(
                width = video.width,
                height = video.height,
                pixel = ?video.pixel,
                "negotiated video format"
            ),
            Media::Audio(audio) => debug!(
                sample_rate = audio.sample_rate,
                sample = sample_name(audio.sample).unwrap_or("?"),
                channels = audio.channel_layout.channels(),
                "negotiated audio format"
            ),
        }

        Ok(NegotiatedFormat {
            media,
            time_base: self.time_base,
            frame_rate,
        })
    }

    /**
        Make the sink emit audio frames of exactly `samples` samples.

        The last frame before end of stream may be shorter.
    */
    pub fn set_frame_size(&mut self, samples: u32) -> Result<()> {
        if !matches!(self.stream_type, StreamType::Audio) {
            return Err(Error::invalid_argument("frame size only applies to audio graphs"));
        }
        context(&mut self.graph, SINK)?.sink().set_frame_size(samples);
        debug!(samples, "fixed sink frame size");
        Ok(())
    }

    /**
        Feed a decoded frame into the graph, or `None` to signal end of stream.

        After end of stream the graph accepts nothing more and only
        [`FilterGraph::pull`] is meaningful.
    */
    pub fn push(&mut self, frame: Option<&Frame>) -> Result<()> {
        if self.draining {
            return Err(Error::invalid_state("filter graph already received end of stream"));
        }

        let mut source = context(&mut self.graph, SOURCE)?;
        let result = match frame {
            Some(frame) => {
                trace!(pts = ?frame.pts(), "pushing frame into filter graph");
                source.source().add(frame)
            }
            None => {
                self.draining = true;
                source.source().flush()
            }
        };

        result.map_err(|e| Error::engine(e, ErrorKind::EngineFailure, "feed filter graph"))
    }

    /**
        Take the next filtered frame.

        The frame carries the sink's time base and no picture type. It is
        overwritten by the next call.
    */
    pub fn pull(&mut self) -> Result<Poll<&mut Frame>> {
        // SAFETY: the frame is owned by us and not borrowed at this point.
        unsafe { ffi::av_frame_unref(self.frame.as_mut_ptr()) };

        let result = context(&mut self.graph, SINK)?.sink().frame(&mut self.frame);
        match result {
            Ok(()) => {
                // SAFETY: the frame was just filled by the sink.
                unsafe {
                    let ptr = self.frame.as_mut_ptr();
                    (*ptr).time_base = self.time_base.into();
                    (*ptr).pict_type = ffi::AVPictureType::AV_PICTURE_TYPE_NONE;
                }
                trace!(pts = ?self.frame.pts(), "filtered frame");
                Ok(Poll::Produced(&mut self.frame))
            }
            Err(e) => Poll::from_error(Error::engine(
                e,
                ErrorKind::EngineFailure,
                "pull frame from filter graph",
            )),
        }
    }
}

impl std::fmt::Debug for FilterGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterGraph")
            .field("stream_type", &self.stream_type)
            .field("sink_format", &self.sink_format)
            .field("time_base", &self.time_base)
            .field("draining", &self.draining)
            .finish_non_exhaustive()
    }
}

fn find_filter(name: &str) -> Result<filter::Filter> {
    filter::find(name).ok_or_else(|| {
        Error::engine(
            ffmpeg_next::Error::FilterNotFound,
            ErrorKind::UnsupportedMedia,
            format!("filter '{name}' is not available"),
        )
    })
}

fn context<'a>(graph: &'a mut filter::Graph, name: &str) -> Result<filter::Context<'a>> {
    graph.get(name).ok_or_else(|| {
        Error::new(
            ErrorKind::EngineFailure,
            i32::from(ffmpeg_next::Error::Bug),
            format!("filter graph has no '{name}' node"),
        )
    })
}

fn video_source_args(video: &VideoFormat, time_base: Rational, frame_rate: Rational) -> String {
    let pixel: ffi::AVPixelFormat = video.pixel.into();
    let mut args = format!(
        "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect={}/{}",
        video.width,
        video.height,
        pixel as i32,
        time_base.numerator(),
        time_base.denominator(),
        video.sample_aspect_ratio.numerator(),
        video.sample_aspect_ratio.denominator(),
    );
    if frame_rate.numerator() > 0 && frame_rate.denominator() > 0 {
        args.push_str(&format!(
            ":frame_rate={}/{}",
            frame_rate.numerator(),
            frame_rate.denominator()
        ));
    }
    args
}

fn audio_source_args(audio: &AudioFormat, time_base: Rational) -> Result<String> {
    Ok(format!(
        "time_base={}/{}:sample_rate={}:sample_fmt={}:channel_layout={}",
        time_base.numerator(),
        time_base.denominator(),
        audio.sample_rate,
        sample_name(audio.sample)?,
        audio.channel_layout.describe()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_next::format;

    #[test]
    fn video_args_include_frame_rate_when_known() {
        let video = VideoFormat {
            width: 320,
            height: 240,
            pixel: format::Pixel::YUV420P,
            sample_aspect_ratio: Rational::new(1, 1),
        };
        let args = video_source_args(&video, Rational::new(1, 12800), Rational::new(25, 1));
        assert_eq!(
            args,
            "video_size=320x240:pix_fmt=0:time_base=1/12800:pixel_aspect=1/1:frame_rate=25/1"
        );

        let args = video_source_args(&video, Rational::new(1, 25), Rational::new(0, 1));
        assert!(!args.contains("frame_rate"));
    }

    #[test]
    fn missing_filter_is_unsupported() {
        let err = find_filter("definitely-not-a-filter").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMedia);
    }
}

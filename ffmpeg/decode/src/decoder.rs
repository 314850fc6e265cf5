/*!
    Decode stage.
*/

use ffmpeg_next::{Frame, Packet, Rational, codec, format};
use tracing::{debug, trace};

use ffmpeg_source::DecoderInput;
use ffmpeg_types::{Error, ErrorKind, Poll, Result, StreamType};

use crate::format::{AudioFormat, DecodedFormat, Media, VideoFormat};
use crate::layout::ChannelLayout;

/**
    Decoder for the selected input stream.

    Packets go in through [`Decoder::submit`], frames come out of
    [`Decoder::receive`] one at a time. The decoder buffers internally, so a
    single packet can yield zero, one or several frames.
*/
pub struct Decoder {
    decoder: codec::decoder::Opened,
    frame: Frame,
    stream_type: StreamType,
    time_base: Rational,
    frame_rate: Rational,
    draining: bool,
}

impl Decoder {
    /**
        Open a decoder for the stream described by `input`.

        The packet time base and the guessed frame rate of the stream are
        handed to the codec before it is opened.
    */
    pub fn open(input: DecoderInput) -> Result<Self> {
        ffmpeg_next::init()
            .map_err(|e| Error::engine(e, ErrorKind::EngineFailure, "initialize ffmpeg"))?;

        let codec_id = input.parameters().id();
        let codec = codec::decoder::find(codec_id).ok_or_else(|| {
            Error::engine(
                ffmpeg_next::Error::DecoderNotFound,
                ErrorKind::UnsupportedMedia,
                format!("no decoder for codec {codec_id:?}"),
            )
        })?;
        let codec_name = codec.name().to_owned();

        let mut context = codec::Context::from_parameters(input.parameters().clone())
            .map_err(|e| {
                Error::engine(e, ErrorKind::EngineFailure, "copy stream parameters to decoder")
            })?;

        // SAFETY: the context is owned and not opened yet.
        unsafe {
            let ctx = context.as_mut_ptr();
            (*ctx).pkt_timebase = input.time_base().into();
            (*ctx).framerate = input.frame_rate().into();
        }

        let decoder = context.decoder().open_as(codec).map_err(|e| {
            Error::engine(
                e,
                ErrorKind::EngineFailure,
                format!("cannot open decoder '{codec_name}'"),
            )
        })?;

        // SAFETY: plain allocation, checked for null below.
        let frame = unsafe { Frame::empty() };
        // SAFETY: only the pointer value is inspected.
        if unsafe { frame.as_ptr() }.is_null() {
            return Err(Error::engine(
                ffmpeg_next::Error::Other {
                    errno: ffmpeg_next::error::ENOMEM,
                },
                ErrorKind::AllocationFailure,
                "allocate decoded frame",
            ));
        }

        debug!(
            codec = %codec_name,
            stream_type = %input.stream_type(),
            time_base = %input.time_base(),
            "opened decoder"
        );

        Ok(Self {
            decoder,
            frame,
            stream_type: input.stream_type(),
            time_base: input.time_base(),
            frame_rate: input.frame_rate(),
            draining: false,
        })
    }

    /**
        Describe the frames this decoder produces.
    */
    pub fn format(&self) -> Result<DecodedFormat> {
        // SAFETY: the context is open and owned by `self`.
        let ctx = unsafe { self.decoder.as_ptr() };

        let media = match self.stream_type {
            StreamType::Video => {
                // SAFETY: see above.
                let video = unsafe {
                    VideoFormat {
                        width: (*ctx).width.max(0) as u32,
                        height: (*ctx).height.max(0) as u32,
                        pixel: format::Pixel::from((*ctx).pix_fmt),
                        sample_aspect_ratio: Rational::from((*ctx).sample_aspect_ratio),
                    }
                };
                if video.pixel == format::Pixel::None {
                    return Err(Error::unsupported("decoder reports no pixel format"));
                }
                Media::Video(video)
            }
            StreamType::Audio => {
                // SAFETY: see above.
                let audio = unsafe {
                    AudioFormat {
                        sample_rate: (*ctx).sample_rate.max(0) as u32,
                        sample: format::Sample::from((*ctx).sample_fmt),
                        channel_layout: ChannelLayout::copy_from(&(*ctx).ch_layout)?,
                    }
                };
                if audio.sample == format::Sample::None {
                    return Err(Error::unsupported("decoder reports no sample format"));
                }
                Media::Audio(audio)
            }
        };

        Ok(DecodedFormat {
            media,
            time_base: self.time_base,
            frame_rate: self.frame_rate,
        })
    }

    /**
        Send a packet to the decoder, or `None` to signal end of stream.

        Once end of stream was signalled the decoder only hands out what it
        still holds, and any further submission is an
        [`ErrorKind::InvalidState`] error.
    */
    pub fn submit(&mut self, packet: Option<&Packet>) -> Result<()> {
        if self.draining {
            return Err(Error::invalid_state("decoder already received end of stream"));
        }

        let result = match packet {
            Some(packet) => self.decoder.send_packet(packet),
            None => {
                self.draining = true;
                self.decoder.send_eof()
            }
        };

        result.map_err(|e| Error::engine(e, ErrorKind::EngineFailure, "send packet to decoder"))
    }

    /**
        Take the next decoded frame.

        The frame's pts is the decoder's best-effort timestamp, in the time
        base reported by [`Decoder::format`]. It is overwritten by the next
        call.
    */
    pub fn receive(&mut self) -> Result<Poll<&mut Frame>> {
        match self.decoder.receive_frame(&mut self.frame) {
            Ok(()) => {
                let timestamp = self.frame.timestamp();
                self.frame.set_pts(timestamp);
                trace!(pts = ?timestamp, "decoded frame");
                Ok(Poll::Produced(&mut self.frame))
            }
            Err(e) => Poll::from_error(Error::engine(
                e,
                ErrorKind::EngineFailure,
                "receive frame from decoder",
            )),
        }
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("stream_type", &self.stream_type)
            .field("time_base", &self.time_base)
            .field("draining", &self.draining)
            .finish_non_exhaustive()
    }
}


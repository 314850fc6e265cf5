/*!
    Encode stage.
*/

use std::ops::{Deref, DerefMut};

use ffmpeg_next::{
    Dictionary, Frame, Packet, Rational, Rescale, codec, codec::encoder as engine, ffi,
};
use tracing::{debug, trace};

use ffmpeg_transform::NegotiatedFormat;
use ffmpeg_types::{Error, ErrorKind, Poll, Result, StreamType};

use crate::target::EncoderTarget;

/**
    Opened encoder, video or audio.
*/
enum Opened {
    Video(engine::video::Encoder),
    Audio(engine::audio::Encoder),
}

impl Deref for Opened {
    type Target = engine::Encoder;

    fn deref(&self) -> &engine::Encoder {
        match self {
            Self::Video(encoder) => encoder,
            Self::Audio(encoder) => encoder,
        }
    }
}

impl DerefMut for Opened {
    fn deref_mut(&mut self) -> &mut engine::Encoder {
        match self {
            Self::Video(encoder) => encoder,
            Self::Audio(encoder) => encoder,
        }
    }
}

/**
    Encoder for the filtered stream.

    Frames go in through [`Encoder::submit`], packets come out of
    [`Encoder::receive`] one at a time, in [`Encoder::time_base`].
*/
pub struct Encoder {
    encoder: Opened,
    packet: Packet,
    name: String,
    stream_type: StreamType,
    time_base: Rational,
    capabilities: codec::Capabilities,
    draining: bool,
}

impl Encoder {
    /**
        Open the encoder described by `target` for frames in `negotiated`.

        Set `global_header` when the muxer stores codec headers out of band.
    */
    pub fn open(
        target: EncoderTarget,
        negotiated: &NegotiatedFormat,
        global_header: bool,
    ) -> Result<Self> {
        if negotiated.stream_type() != target.stream_type {
            return Err(Error::invalid_argument(format!(
                "encoder '{}' expects {}, filter graph produces {}",
                target.name,
                target.stream_type,
                negotiated.stream_type()
            )));
        }

        let mut options = Dictionary::new();
        for (key, value) in target.options.iter() {
            options.set(key, value);
        }

        let capabilities = target.codec.capabilities();
        let context = codec::Context::new_with_codec(target.codec);

        let (encoder, time_base) = match (negotiated.video(), negotiated.audio()) {
            (Some(video), _) => {
                let mut encoder = context
                    .encoder()
                    .video()
                    .map_err(|e| Error::engine(e, ErrorKind::EngineFailure, "create video encoder"))?;

                let frame_rate = negotiated.frame_rate();
                let time_base = if frame_rate.numerator() > 0 && frame_rate.denominator() > 0 {
                    frame_rate.invert()
                } else {
                    negotiated.time_base()
                };

                encoder.set_width(video.width);
                encoder.set_height(video.height);
                encoder.set_aspect_ratio(video.sample_aspect_ratio);
                encoder.set_format(video.pixel);
                encoder.set_time_base(time_base);
                if frame_rate.numerator() > 0 {
                    encoder.set_frame_rate(Some(frame_rate));
                }
                if global_header {
                    set_global_header(&mut encoder);
                }

                let encoder = encoder.open_with(options).map_err(|e| {
                    Error::engine(
                        e,
                        ErrorKind::EngineFailure,
                        format!("cannot open encoder '{}'", target.name),
                    )
                })?;
                (Opened::Video(encoder), time_base)
            }
            (None, Some(audio)) => {
                let mut encoder = context
                    .encoder()
                    .audio()
                    .map_err(|e| Error::engine(e, ErrorKind::EngineFailure, "create audio encoder"))?;

                let time_base = Rational::new(1, audio.sample_rate as i32);

                encoder.set_rate(audio.sample_rate as i32);
                encoder.set_format(audio.sample);
                // SAFETY: the context is owned and not opened yet.
                unsafe {
                    audio
                        .channel_layout
                        .copy_to(&mut (*encoder.as_mut_ptr()).ch_layout)?;
                }
                encoder.set_time_base(time_base);
                if global_header {
                    set_global_header(&mut encoder);
                }

                let encoder = encoder.open_with(options).map_err(|e| {
                    Error::engine(
                        e,
                        ErrorKind::EngineFailure,
                        format!("cannot open encoder '{}'", target.name),
                    )
                })?;
                (Opened::Audio(encoder), time_base)
            }
            (None, None) => return Err(Error::invalid_argument("negotiated format has no media")),
        };

        debug!(
            encoder = %target.name,
            stream_type = %target.stream_type,
            time_base = %time_base,
            global_header,
            delay = capabilities.contains(codec::Capabilities::DELAY),
            "opened encoder"
        );

        Ok(Self {
            encoder,
            packet: Packet::empty(),
            name: target.name,
            stream_type: target.stream_type,
            time_base,
            capabilities,
            draining: false,
        })
    }

    /**
        Send a filtered frame to the encoder, or `None` to signal end of stream.

        A frame with a pts is rescaled from its own time base into the
        encoder's first. Frames without a pts are passed on as they are.
        Nothing can be submitted after end of stream.
    */
    pub fn submit(&mut self, frame: Option<&mut Frame>) -> Result<()> {
        if self.draining {
            return Err(Error::invalid_state(format!(
                "encoder '{}' already received end of stream",
                self.name
            )));
        }

        let result = match frame {
            Some(frame) => {
                if let Some(pts) = frame.pts() {
                    // SAFETY: only the time base field is read.
                    let from = Rational::from(unsafe { (*frame.as_ptr()).time_base });
                    if from.denominator() != 0 {
                        frame.set_pts(Some(pts.rescale(from, self.time_base)));
                    }
                }
                trace!(pts = ?frame.pts(), "encoding frame");
                self.encoder.send_frame(frame)
            }
            None => {
                self.draining = true;
                self.encoder.send_eof()
            }
        };

        result.map_err(|e| Error::engine(e, ErrorKind::EngineFailure, "send frame to encoder"))
    }

    /**
        Take the next encoded packet.

        The packet's timestamps are in [`Encoder::time_base`]. It is
        overwritten by the next call.
    */
    pub fn receive(&mut self) -> Result<Poll<&mut Packet>> {
        match self.encoder.receive_packet(&mut self.packet) {
            Ok(()) => {
                trace!(
                    pts = ?self.packet.pts(),
                    dts = ?self.packet.dts(),
                    size = self.packet.size(),
                    "encoded packet"
                );
                Ok(Poll::Produced(&mut self.packet))
            }
            Err(e) => Poll::from_error(Error::engine(
                e,
                ErrorKind::EngineFailure,
                "receive packet from encoder",
            )),
        }
    }

    /**
        Signal end of stream if the encoder buffers frames.

        Returns false, without touching the encoder, when it does not declare
        the delay capability and so has nothing left to emit.
    */
    pub fn flush(&mut self) -> Result<bool> {
        if !self.capabilities.contains(codec::Capabilities::DELAY) {
            debug!(encoder = %self.name, "encoder has no delay, skipping flush");
            return Ok(false);
        }
        self.submit(None)?;
        Ok(true)
    }

    /**
        Number of samples every audio frame must carry, if the encoder
        cannot take variable-sized frames.
    */
    pub fn fixed_frame_size(&self) -> Option<u32> {
        match &self.encoder {
            Opened::Audio(encoder)
                if !self
                    .capabilities
                    .contains(codec::Capabilities::VARIABLE_FRAME_SIZE) =>
            {
                Some(encoder.frame_size()).filter(|&size| size > 0)
            }
            _ => None,
        }
    }

    /**
        Codec parameters for the output stream.
    */
    pub fn parameters(&self) -> Result<codec::Parameters> {
        let mut parameters = codec::Parameters::new();
        // SAFETY: both sides are valid, the context is open.
        let code = unsafe {
            ffi::avcodec_parameters_from_context(parameters.as_mut_ptr(), self.encoder.as_ptr())
        };
        if code < 0 {
            return Err(Error::engine(
                ffmpeg_next::Error::from(code),
                ErrorKind::EngineFailure,
                "copy encoder parameters",
            ));
        }
        Ok(parameters)
    }

    /**
        Time base of the packets returned by [`Encoder::receive`].
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("name", &self.name)
            .field("stream_type", &self.stream_type)
            .field("time_base", &self.time_base)
            .field("draining", &self.draining)
            .finish_non_exhaustive()
    }
}

fn set_global_header(encoder: &mut engine::Encoder) {
    // SAFETY: the context is owned and not opened yet.
    unsafe {
        (*encoder.as_mut_ptr()).flags |= ffi::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
    }
}

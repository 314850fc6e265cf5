/*!
    Single-stream demuxer.
*/

use std::path::{Path, PathBuf};

use ffmpeg_next::{Packet, Rational, ffi, format::context::Input as InputContext, media::Type};
use tracing::{Level, debug, trace};

use ffmpeg_types::{Error, ErrorKind, Poll, Result, StreamType};

use crate::decoder_input::DecoderInput;

/**
    An opened input restricted to one stream.

    Created by [`Source::open`]. Every stream except the selected one is
    marked as discarded, and [`Source::read`] skips anything the demuxer
    still returns for them.
*/
pub struct Source {
    input: InputContext,
    path: PathBuf,
    stream_type: StreamType,
    stream_index: usize,
    time_base: Rational,
    frame_rate: Rational,
    packet: Packet,
    last_pts: Option<i64>,
}

impl Source {
    /**
        Open a media file and select its best stream of `stream_type`.

        Fails with [`ErrorKind::IoFailure`] when the file cannot be opened or
        probed, and with [`ErrorKind::UnsupportedMedia`] when it has no stream
        of the requested kind.
    */
    pub fn open<P: AsRef<Path>>(path: P, stream_type: StreamType) -> Result<Self> {
        ffmpeg_next::init()
            .map_err(|e| Error::engine(e, ErrorKind::EngineFailure, "initialize ffmpeg"))?;

        let path = path.as_ref();
        let mut input = ffmpeg_next::format::input(&path).map_err(|e| {
            Error::engine(
                e,
                ErrorKind::IoFailure,
                format!("cannot open input '{}'", path.display()),
            )
        })?;

        let media_type = match stream_type {
            StreamType::Video => Type::Video,
            StreamType::Audio => Type::Audio,
        };

        let (stream_index, time_base) = {
            let stream = input.streams().best(media_type).ok_or_else(|| {
                Error::engine(
                    ffmpeg_next::Error::StreamNotFound,
                    ErrorKind::UnsupportedMedia,
                    format!("no {stream_type} stream in '{}'", path.display()),
                )
            })?;
            (stream.index(), stream.time_base())
        };

        // SAFETY: `stream_index` came from `streams().best()` on this context,
        // so it is below `nb_streams` and the stream pointers are valid.
        let frame_rate = unsafe {
            let ctx = input.as_mut_ptr();
            for index in 0..(*ctx).nb_streams as usize {
                if index != stream_index {
                    (**(*ctx).streams.add(index)).discard = ffi::AVDiscard::AVDISCARD_ALL;
                }
            }
            let stream = *(*ctx).streams.add(stream_index);
            Rational::from(ffi::av_guess_frame_rate(ctx, stream, std::ptr::null_mut()))
        };

        debug!(
            path = %path.display(),
            %stream_type,
            stream_index,
            time_base = %time_base,
            frame_rate = %frame_rate,
            "opened input"
        );
        if tracing::enabled!(Level::DEBUG) {
            ffmpeg_next::format::context::input::dump(&input, 0, path.to_str());
        }

        Ok(Self {
            input,
            path: path.to_path_buf(),
            stream_type,
            stream_index,
            time_base,
            frame_rate,
            packet: Packet::empty(),
            last_pts: None,
        })
    }

    /**
        Build the configuration for this stream's decoder.
    */
    pub fn decoder_input(&self) -> Result<DecoderInput> {
        let stream = self.input.stream(self.stream_index).ok_or_else(|| {
            Error::engine(
                ffmpeg_next::Error::StreamNotFound,
                ErrorKind::UnsupportedMedia,
                format!("stream {} disappeared from input", self.stream_index),
            )
        })?;

        Ok(DecoderInput::new(
            stream.parameters().clone(),
            self.stream_type,
            self.stream_index,
            self.time_base,
            self.frame_rate,
        ))
    }

    /**
        Read the next packet of the selected stream.

        The packet lives in a buffer owned by the source and is replaced on
        the next call. End of input yields [`Poll::Exhausted`].
    */
    pub fn read(&mut self) -> Result<Poll<&Packet>> {
        loop {
            // SAFETY: the packet is owned by us and not borrowed at this point.
            unsafe { ffi::av_packet_unref(self.packet.as_mut_ptr()) };

            if let Err(e) = self.packet.read(&mut self.input) {
                return Poll::from_error(Error::engine(e, ErrorKind::IoFailure, "read packet"));
            }

            if self.packet.stream() != self.stream_index {
                trace!(stream = self.packet.stream(), "skipping packet");
                continue;
            }

            if let Some(pts) = self.packet.pts() {
                self.last_pts = Some(pts);
            }
            trace!(
                pts = ?self.packet.pts(),
                dts = ?self.packet.dts(),
                size = self.packet.size(),
                "read packet"
            );

            return Ok(Poll::Produced(&self.packet));
        }
    }

    /**
        Seek to a position in seconds.

        Lands on the nearest keyframe at or before the target. The decoder
        still holds frames from before the seek; callers that care must
        drain or rebuild it.
    */
    pub fn seek(&mut self, position: f64) -> Result<()> {
        if !position.is_finite() {
            return Err(Error::invalid_argument(format!(
                "cannot seek to {position}"
            )));
        }

        let timestamp = (position * ffi::AV_TIME_BASE as f64) as i64;
        self.input.seek(timestamp, ..timestamp).map_err(|e| {
            Error::engine(e, ErrorKind::IoFailure, format!("seek to {position}s failed"))
        })?;

        debug!(position, "seeked input");
        self.last_pts = None;
        Ok(())
    }

    /**
        Presentation time in seconds of the last packet read, if any.

        Reset by [`Source::seek`].
    */
    pub fn position(&self) -> Option<f64> {
        self.last_pts
            .map(|pts| pts as f64 * f64::from(self.time_base))
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("path", &self.path)
            .field("stream_type", &self.stream_type)
            .field("stream_index", &self.stream_index)
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}

/*!
    The transcoding handler.

    A [`Handler`] owns one instance of every stage and drives packets from
    the demuxer to the muxer:

    ```text
    Source -> Decoder -> FilterGraph -> Encoder -> Sink
    ```

    Every stage buffers internally and answers [`Poll::NeedMoreInput`] when
    it is starved. The handler is the only scheduler: after feeding a stage
    it drains it completely before reading more input, so no stage ever
    holds more than the engine's own look-ahead.
*/

use std::ffi::CString;
use std::fmt;

use ffmpeg_next::{ffi, format::Pixel};
use tracing::{debug, error, info, trace, warn};

use ffmpeg_decode::Decoder;
use ffmpeg_encode::{Encoder, EncoderTarget};
use ffmpeg_sink::{OutputFormat, Sink};
use ffmpeg_source::Source;
use ffmpeg_transform::FilterGraph;
use ffmpeg_types::{EncoderOptions, Error, Poll, Result, StreamType};

use crate::params::TranscodeParams;

/**
    Lifecycle state of a [`Handler`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerState {
    /// Created, nothing opened yet.
    Uninitialized,
    /// [`Handler::initialize`] is running.
    Configuring,
    /// Stages are open and the output header is written.
    Ready,
    /// [`Handler::flush`] was called. Only [`Handler::close`] is left.
    Draining,
    /// Every resource has been released.
    Closed,
    /// A call failed. Only [`Handler::close`] is left.
    Failed,
}

impl HandlerState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Configuring => "configuring",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/**
    The opened stages.

    Fields drop in declaration order, which is the release order: codec
    contexts first, then the graph, the input and finally the output.
*/
struct Stages {
    encoder: Encoder,
    decoder: Decoder,
    filter: FilterGraph,
    source: Source,
    sink: Sink,
}

/**
    A single-track transcode from one input file to one output file.

    ```ignore
    let params = TranscodeParams::video("in.mkv", "out.mp4");
    let mut handler = Handler::open(&params)?;
    handler.seek(10.0)?;
    handler.process_all()?;
    handler.flush()?;
    handler.close();
    ```

    Any error other than from [`Handler::seek`] moves the handler to
    [`HandlerState::Failed`]. A failed handler still has to be closed,
    which dropping it does as well.
*/
pub struct Handler {
    stages: Option<Stages>,
    state: HandlerState,
    stop: Option<f64>,
    packets_read: u64,
    packets_written: u64,
}

impl Handler {
    /**
        Create a handler with nothing opened.
    */
    pub fn new() -> Self {
        Self {
            stages: None,
            state: HandlerState::Uninitialized,
            stop: None,
            packets_read: 0,
            packets_written: 0,
        }
    }

    /**
        Create a handler and initialize it from `params`.
    */
    pub fn open(params: &TranscodeParams) -> Result<Self> {
        let mut handler = Self::new();
        handler.initialize(params)?;
        Ok(handler)
    }

    /**
        Open the input, set up every stage and write the output header.

        The stages are configured in dependency order, each from what the
        previous one negotiated. On failure whatever was opened so far is
        released, the handler is left [`HandlerState::Failed`] and the
        error of the step that failed is returned.
    */
    pub fn initialize(&mut self, params: &TranscodeParams) -> Result<()> {
        if self.state != HandlerState::Uninitialized {
            return Err(Error::invalid_state(format!(
                "cannot initialize a handler that is {}",
                self.state
            )));
        }

        self.state = HandlerState::Configuring;
        match configure(params) {
            Ok(stages) => {
                info!(
                    input = %params.input.display(),
                    output = %params.output.display(),
                    encoder = %params.encoder,
                    kind = %params.kind,
                    "transcoder ready"
                );
                self.stages = Some(stages);
                self.stop = params.stop;
                self.state = HandlerState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = HandlerState::Failed;
                Err(e)
            }
        }
    }

    /**
        Seek the input to `position` seconds.

        Lands on the nearest keyframe at or before the target. Only allowed
        while the handler is [`HandlerState::Ready`]. A failed seek is
        reported but leaves the handler usable, reading from wherever the
        demuxer ended up.

        Only the demuxer is repositioned. Frames the decoder and filter graph
        still hold from before the seek are emitted as they are, so output
        timestamps are only guaranteed to keep increasing when seeking before
        the first [`Handler::process_packet`] or [`Handler::process_all`]
        call. A later seek still succeeds, but after a backward jump the
        muxer may refuse the out-of-order packets that follow.
    */
    pub fn seek(&mut self, position: f64) -> Result<()> {
        let stages = self.stages_in(HandlerState::Ready, "seek")?;
        stages.source.seek(position).inspect_err(|e| {
            warn!(position, error = %e, "seek failed, continuing from current position");
        })
    }

    /**
        Read one packet of the selected stream and push it through every stage.

        Returns [`Poll::Exhausted`] at end of input and
        [`Poll::NeedMoreInput`] if the demuxer has nothing right now. Neither
        is an error.
    */
    pub fn process_packet(&mut self) -> Result<Poll<()>> {
        let stages = self.stages_in(HandlerState::Ready, "process")?;
        let result = step_packet(stages);
        let written = self.track(result)?;
        Ok(written.map(|written| {
            self.packets_read += 1;
            self.packets_written += written;
        }))
    }

    /**
        Process packets until the input is exhausted or the stop position is
        reached.
    */
    pub fn process_all(&mut self) -> Result<()> {
        self.stages_in(HandlerState::Ready, "process")?;

        loop {
            if let (Some(stop), Some(position)) = (self.stop, self.position())
                && position >= stop
            {
                debug!(position, stop, "reached stop position");
                break;
            }

            match self.process_packet()? {
                Poll::Produced(()) => {}
                Poll::NeedMoreInput => {
                    debug!("input has no packet available, ending read loop");
                    break;
                }
                Poll::Exhausted => {
                    debug!("end of input");
                    break;
                }
            }
        }

        debug!(
            packets_read = self.packets_read,
            packets_written = self.packets_written,
            "processed input"
        );
        Ok(())
    }

    /**
        Drain every stage and write the output trailer.

        Decoder, filter graph and encoder are each told about end of stream
        in turn and everything they still hold is pushed downstream. Allowed
        once, from [`HandlerState::Ready`].
    */
    pub fn flush(&mut self) -> Result<()> {
        let stages = self.stages_in(HandlerState::Ready, "flush")?;
        let result = drain_all(stages);
        let written = self.track(result)?;
        self.packets_written += written;
        self.state = HandlerState::Draining;

        info!(packets_written = self.packets_written, "output finished");
        Ok(())
    }

    /**
        Release every resource.

        Safe to call in any state and any number of times. Called by `Drop`.
    */
    pub fn close(&mut self) {
        if let Some(stages) = self.stages.take() {
            let Stages {
                encoder,
                decoder,
                filter,
                source,
                sink,
            } = stages;

            if !sink.is_finished() {
                warn!(path = %sink.path().display(), "closing output without a trailer");
            }

            drop(encoder);
            drop(decoder);
            drop(filter);
            drop(source);
            drop(sink);
            debug!("released transcoder");
        }

        if self.state != HandlerState::Closed {
            trace!(from = %self.state, "handler closed");
        }
        self.state = HandlerState::Closed;
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    /**
        Presentation time in seconds of the last packet read from the input.
    */
    pub fn position(&self) -> Option<f64> {
        self.stages.as_ref()?.source.position()
    }

    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    fn stages_in(&mut self, expected: HandlerState, operation: &str) -> Result<&mut Stages> {
        if self.state != expected {
            return Err(Error::invalid_state(format!(
                "cannot {operation} a handler that is {}",
                self.state
            )));
        }
        self.stages
            .as_mut()
            .ok_or_else(|| Error::invalid_state(format!("cannot {operation} without stages")))
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        result.inspect_err(|e| {
            error!(state = %self.state, error = %e, code = e.code(), "transcoder failed");
            self.state = HandlerState::Failed;
        })
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Handler {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Handler");
        debug.field("state", &self.state);
        if let Some(stages) = &self.stages {
            debug
                .field("source", &stages.source)
                .field("decoder", &stages.decoder)
                .field("filter", &stages.filter)
                .field("encoder", &stages.encoder)
                .field("sink", &stages.sink);
        }
        debug
            .field("stop", &self.stop)
            .field("packets_read", &self.packets_read)
            .field("packets_written", &self.packets_written)
            .finish()
    }
}

/// Log the step that failed and pass the error on.
fn step<T>(name: &'static str, result: Result<T>) -> Result<T> {
    result.inspect_err(|e| {
        error!(step = name, error = %e, code = e.code(), "initialization failed");
    })
}

fn configure(params: &TranscodeParams) -> Result<Stages> {
    step("validate parameters", params.validate())?;
    let options = step(
        "parse encoder options",
        EncoderOptions::parse(&params.encoder_options),
    )?;
    let pixel_format = match params.kind {
        StreamType::Video => step(
            "parse pixel format",
            parse_pixel_format(&params.pixel_format),
        )?,
        StreamType::Audio => None,
    };

    let source = step("open input", Source::open(&params.input, params.kind))?;
    let decoder_input = step("read stream parameters", source.decoder_input())?;
    let decoder = step("open decoder", Decoder::open(decoder_input))?;
    let decoded = step("read decoder format", decoder.format())?;

    let target = step(
        "find encoder",
        EncoderTarget::find(&params.encoder, &decoded, pixel_format, options),
    )?;
    let mut filter = step(
        "build filter graph",
        FilterGraph::build(&decoded, &params.filters, target.sink_format()),
    )?;
    let output_format = step(
        "find output format",
        OutputFormat::find(&params.format, &params.output),
    )?;
    let negotiated = step("read filter output format", filter.negotiated())?;

    let encoder = step(
        "open encoder",
        Encoder::open(target, &negotiated, output_format.needs_global_header()),
    )?;
    if let Some(samples) = encoder.fixed_frame_size() {
        step("fix filter frame size", filter.set_frame_size(samples))?;
    }

    let sink = step(
        "create output",
        Sink::create(&params.output, &output_format, &encoder),
    )?;

    Ok(Stages {
        encoder,
        decoder,
        filter,
        source,
        sink,
    })
}

fn parse_pixel_format(name: &str) -> Result<Option<Pixel>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }

    let c_name = CString::new(name).map_err(|_| {
        Error::invalid_argument(format!("pixel format '{name}' contains a NUL byte"))
    })?;
    // SAFETY: `c_name` is a valid C string for the duration of the call.
    let pixel = unsafe { ffi::av_get_pix_fmt(c_name.as_ptr()) };
    if pixel == ffi::AVPixelFormat::AV_PIX_FMT_NONE {
        return Err(Error::unsupported(format!(
            "pixel format '{name}' not recognized"
        )));
    }
    Ok(Some(Pixel::from(pixel)))
}

/// Read one packet and push it all the way to the sink.
fn step_packet(stages: &mut Stages) -> Result<Poll<u64>> {
    let Stages {
        encoder,
        decoder,
        filter,
        source,
        sink,
    } = stages;

    match source.read()? {
        Poll::Produced(packet) => {
            decoder.submit(Some(packet))?;
            Ok(Poll::Produced(drain_decoder(decoder, filter, encoder, sink)?))
        }
        Poll::NeedMoreInput => Ok(Poll::NeedMoreInput),
        Poll::Exhausted => Ok(Poll::Exhausted),
    }
}

/// End of stream through every stage, then the trailer.
fn drain_all(stages: &mut Stages) -> Result<u64> {
    let Stages {
        encoder,
        decoder,
        filter,
        sink,
        ..
    } = stages;

    decoder.submit(None)?;
    let mut written = drain_decoder(decoder, filter, encoder, sink)?;

    filter.push(None)?;
    written += drain_filter(filter, encoder, sink)?;

    if encoder.flush()? {
        written += drain_encoder(encoder, sink)?;
    }

    sink.finish()?;
    Ok(written)
}

/// Push every frame the decoder has ready through the filter graph.
fn drain_decoder(
    decoder: &mut Decoder,
    filter: &mut FilterGraph,
    encoder: &mut Encoder,
    sink: &mut Sink,
) -> Result<u64> {
    let mut written = 0;
    loop {
        match decoder.receive()? {
            Poll::Produced(frame) => {
                filter.push(Some(&*frame))?;
                written += drain_filter(filter, encoder, sink)?;
            }
            Poll::NeedMoreInput | Poll::Exhausted => return Ok(written),
        }
    }
}

/// Push every frame the filter graph has ready through the encoder.
fn drain_filter(filter: &mut FilterGraph, encoder: &mut Encoder, sink: &mut Sink) -> Result<u64> {
    let mut written = 0;
    loop {
        match filter.pull()? {
            Poll::Produced(frame) => {
                encoder.submit(Some(frame))?;
                written += drain_encoder(encoder, sink)?;
            }
            Poll::NeedMoreInput | Poll::Exhausted => return Ok(written),
        }
    }
}

/// Write every packet the encoder has ready.
fn drain_encoder(encoder: &mut Encoder, sink: &mut Sink) -> Result<u64> {
    let time_base = encoder.time_base();
    let mut written = 0;
    loop {
        match encoder.receive()? {
            Poll::Produced(packet) => {
                sink.write(packet, time_base)?;
                written += 1;
            }
            Poll::NeedMoreInput | Poll::Exhausted => return Ok(written),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_types::ErrorKind;

    #[test]
    fn new_handler_is_uninitialized() {
        let handler = Handler::new();
        assert_eq!(handler.state(), HandlerState::Uninitialized);
        assert_eq!(handler.position(), None);
        assert_eq!(handler.packets_written(), 0);
    }

    #[test]
    fn operations_before_initialize_are_rejected() {
        let mut handler = Handler::new();
        assert_eq!(handler.process_all().unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(handler.flush().unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(handler.seek(1.0).unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(handler.state(), HandlerState::Uninitialized);
    }

    #[test]
    fn close_is_idempotent() {
        let mut handler = Handler::new();
        handler.close();
        handler.close();
        assert_eq!(handler.state(), HandlerState::Closed);

        let params = TranscodeParams::video("a.y4m", "b.mp4");
        let err = handler.initialize(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn failed_initialize_leaves_failed_state() {
        let mut handler = Handler::new();
        let params = TranscodeParams::video("/nonexistent/input.y4m", "/nonexistent/out.mp4");
        let err = handler.initialize(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert_eq!(handler.state(), HandlerState::Failed);

        assert_eq!(handler.process_all().unwrap_err().kind(), ErrorKind::InvalidState);
        handler.close();
        handler.close();
        assert_eq!(handler.state(), HandlerState::Closed);
    }

    #[test]
    fn invalid_params_fail_before_opening_input() {
        let params = TranscodeParams::video("/nonexistent/input.y4m", "out.mp4")
            .with_encoder_options("preset");
        let err = Handler::open(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let params =
            TranscodeParams::video("/nonexistent/input.y4m", "out.mp4").with_pixel_format("nope");
        let err = Handler::open(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMedia);
    }

    #[test]
    fn pixel_format_names() {
        assert_eq!(parse_pixel_format("").unwrap(), None);
        assert_eq!(parse_pixel_format("yuv420p").unwrap(), Some(Pixel::YUV420P));
        assert_eq!(parse_pixel_format(" rgb24 ").unwrap(), Some(Pixel::RGB24));
        assert_eq!(
            parse_pixel_format("not-a-format").unwrap_err().kind(),
            ErrorKind::UnsupportedMedia
        );
    }

    #[test]
    fn state_names() {
        assert_eq!(HandlerState::Ready.to_string(), "ready");
        assert_eq!(HandlerState::Failed.as_str(), "failed");
    }
}

/*!
    Mux endpoint.
*/

use std::path::{Path, PathBuf};
use std::ptr;

use ffmpeg_next::{Packet, Rational, ffi, format::context::Output as OutputContext};
use tracing::{Level, debug, trace};

use ffmpeg_encode::Encoder;
use ffmpeg_types::{Error, ErrorKind, Result};

use crate::format::{OutputFormat, c_string, path_str};

/**
    An output container holding the one stream produced by an [`Encoder`].

    The header is written by [`Sink::create`], the trailer by
    [`Sink::finish`]. Dropping the sink closes the output file if the sink
    opened one. The I/O handle of a muxer that does its own I/O is left to
    the muxer.
*/
pub struct Sink {
    output: OutputContext,
    path: PathBuf,
    nofile: bool,
    stream_index: usize,
    time_base: Rational,
    finished: bool,
}

impl Sink {
    /**
        Create the output container at `path` and write its header.

        The file itself is only opened when the muxer does not do its own
        I/O. The stream's time base is whatever the muxer settled on while
        writing the header.
    */
    pub fn create<P: AsRef<Path>>(path: P, format: &OutputFormat, encoder: &Encoder) -> Result<Self> {
        let path = path.as_ref();
        let file_name = c_string(path_str(path)?, "output path")?;

        let mut context = ptr::null_mut();
        // SAFETY: `file_name` outlives the call, the muxer descriptor is static.
        let code = unsafe {
            ffi::avformat_alloc_output_context2(
                &mut context,
                format.as_ptr(),
                ptr::null(),
                file_name.as_ptr(),
            )
        };
        if code < 0 || context.is_null() {
            return Err(Error::engine(
                ffmpeg_next::Error::from(code.min(-1)),
                ErrorKind::AllocationFailure,
                "allocate output context",
            ));
        }
        // SAFETY: freshly allocated and owned from here on, released on drop.
        let output = unsafe { OutputContext::wrap(context) };

        // Owned by a sink from here, so every early return goes through its drop.
        let mut sink = Self {
            output,
            path: path.to_path_buf(),
            nofile: format.is_nofile(),
            stream_index: 0,
            time_base: encoder.time_base(),
            finished: false,
        };
        let output = &mut sink.output;

        if !sink.nofile {
            // SAFETY: the context is ours and has no I/O handle yet.
            let code = unsafe {
                ffi::avio_open(
                    &mut (*output.as_mut_ptr()).pb,
                    file_name.as_ptr(),
                    ffi::AVIO_FLAG_WRITE as i32,
                )
            };
            if code < 0 {
                return Err(Error::engine(
                    ffmpeg_next::Error::from(code),
                    ErrorKind::IoFailure,
                    format!("cannot open output '{}'", path.display()),
                ));
            }
        }

        // SAFETY: the context is ours, a null codec adds a bare stream.
        let stream = unsafe { ffi::avformat_new_stream(output.as_mut_ptr(), ptr::null()) };
        if stream.is_null() {
            return Err(Error::engine(
                ffmpeg_next::Error::Other {
                    errno: ffmpeg_next::error::ENOMEM,
                },
                ErrorKind::AllocationFailure,
                "add output stream",
            ));
        }
        // SAFETY: just checked for null.
        let stream_index = unsafe { (*stream).index } as usize;

        {
            let parameters = encoder.parameters()?;
            let mut stream = output.stream_mut(stream_index).ok_or_else(|| {
                Error::new(
                    ErrorKind::EngineFailure,
                    i32::from(ffmpeg_next::Error::Bug),
                    format!("output stream {stream_index} missing"),
                )
            })?;
            stream.set_parameters(parameters);
            stream.set_time_base(encoder.time_base());
        }

        if tracing::enabled!(Level::DEBUG) {
            ffmpeg_next::format::context::output::dump(output, 0, path.to_str());
        }

        output.write_header().map_err(|e| {
            Error::engine(
                e,
                ErrorKind::IoFailure,
                format!("cannot write header to '{}'", path.display()),
            )
        })?;

        if let Some(stream) = output.stream(stream_index) {
            sink.time_base = stream.time_base();
        }
        sink.stream_index = stream_index;

        debug!(
            path = %path.display(),
            muxer = format.name(),
            stream_index,
            time_base = %sink.time_base,
            nofile = sink.nofile,
            "wrote output header"
        );

        Ok(sink)
    }

    /**
        Write an encoded packet whose timestamps are in `time_base`.

        The packet is tagged with the output stream index and rescaled into
        the stream's time base. The muxer takes its payload.
    */
    pub fn write(&mut self, packet: &mut Packet, time_base: Rational) -> Result<()> {
        if self.finished {
            return Err(Error::invalid_state("output already has its trailer"));
        }

        packet.set_stream(self.stream_index);
        packet.rescale_ts(time_base, self.time_base);
        packet.set_position(-1);
        trace!(pts = ?packet.pts(), dts = ?packet.dts(), "muxing packet");

        packet
            .write_interleaved(&mut self.output)
            .map_err(|e| Error::engine(e, ErrorKind::IoFailure, "write packet"))
    }

    /**
        Write the trailer. The output is incomplete until this succeeds.
    */
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Err(Error::invalid_state("output already has its trailer"));
        }
        self.finished = true;

        self.output.write_trailer().map_err(|e| {
            Error::engine(
                e,
                ErrorKind::IoFailure,
                format!("cannot write trailer to '{}'", self.path.display()),
            )
        })?;

        debug!(path = %self.path.display(), "wrote output trailer");
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        if self.nofile {
            // The context drop closes `pb`, which only belongs to us when we opened it.
            // SAFETY: the context is still owned, only the handle is detached.
            unsafe { (*self.output.as_mut_ptr()).pb = ptr::null_mut() };
        }
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("path", &self.path)
            .field("nofile", &self.nofile)
            .field("stream_index", &self.stream_index)
            .field("time_base", &self.time_base)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

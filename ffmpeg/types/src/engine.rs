/*!
    Conversions from FFmpeg engine errors.
*/

use std::ffi::CString;
use std::ptr;
use std::str::FromStr;

use ffmpeg_next::error::{EAGAIN, ENOMEM};
use ffmpeg_next::{Dictionary, Error as EngineError, ffi};

use crate::error::{Error, ErrorKind, Result};
use crate::options::EncoderOptions;
use crate::poll::Poll;

impl Error {
    /**
        Wrap an engine error, keeping its numeric code.

        Codes with a fixed meaning (EOF, EAGAIN, ENOMEM, the various
        "not found" codes) get their own kind. Anything else is classified
        as `fallback`, which the caller picks for the step that failed.
    */
    pub fn engine(error: EngineError, fallback: ErrorKind, context: impl Into<String>) -> Self {
        Self::new(classify(error, fallback), i32::from(error), context)
    }
}

impl<T> Poll<T> {
    /**
        Convert an engine call result into a poll, absorbing EOF and EAGAIN.
    */
    pub fn from_engine(
        result: std::result::Result<T, EngineError>,
        fallback: ErrorKind,
        context: &str,
    ) -> Result<Self> {
        match result {
            Ok(item) => Ok(Self::Produced(item)),
            Err(e) => Self::from_error(Error::engine(e, fallback, context)),
        }
    }
}

impl EncoderOptions {
    /**
        Parse an option string such as `"preset ultrafast,crf 28"`.

        Pairs are split by the engine's dictionary parser with a space
        between key and value and a comma between pairs, so quoting and
        backslash escapes work as they do on the `ffmpeg` command line. An
        empty or blank string yields no options. A pair with an empty key or
        value is rejected.
    */
    pub fn parse(input: &str) -> Result<Self> {
        let mut options = Self::default();
        if input.trim().is_empty() {
            return Ok(options);
        }

        let c_input = CString::new(input).map_err(|_| {
            Error::invalid_argument(format!("encoder options '{input}' contain a NUL byte"))
        })?;

        let mut raw = ptr::null_mut();
        // SAFETY: all strings outlive the call, `raw` starts out empty.
        let code = unsafe {
            ffi::av_dict_parse_string(&mut raw, c_input.as_ptr(), c" ".as_ptr(), c",".as_ptr(), 0)
        };
        // SAFETY: whatever was parsed, even on failure, is ours to free.
        let dictionary = unsafe { Dictionary::own(raw) };
        if code < 0 {
            return Err(Error::engine(
                EngineError::from(code),
                ErrorKind::InvalidArgument,
                format!("malformed encoder options '{input}'"),
            ));
        }

        for (key, value) in dictionary.iter() {
            options.set(key, value);
        }
        Ok(options)
    }
}

impl FromStr for EncoderOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn classify(error: EngineError, fallback: ErrorKind) -> ErrorKind {
    match error {
        EngineError::Eof => ErrorKind::EndOfStream,
        EngineError::Other { errno } if errno == EAGAIN => ErrorKind::NeedMoreInput,
        EngineError::Other { errno } if errno == ENOMEM => ErrorKind::AllocationFailure,
        EngineError::DecoderNotFound
        | EngineError::EncoderNotFound
        | EngineError::DemuxerNotFound
        | EngineError::MuxerNotFound
        | EngineError::StreamNotFound
        | EngineError::ProtocolNotFound => ErrorKind::UnsupportedMedia,
        EngineError::FilterNotFound => ErrorKind::MalformedFilterSpec,
        _ => fallback,
    }
}

/*!
    Error types for the ffmpeg crate ecosystem.
*/

use std::fmt;

/**
    Engine code used for errors raised on the Rust side of the pipeline.

    This is `AVERROR(EINVAL)`, so every [`Error`] can be rendered by the
    engine's error reporter, including ones the engine never saw.
*/
const INVALID_ARGUMENT_CODE: i32 = -22;

/**
    Broad classification of a pipeline error.

    `EndOfStream` and `NeedMoreInput` are sentinels, not failures. Stages
    turn them into [`Poll`](crate::Poll) variants at their boundary.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The engine could not allocate a context, frame or packet.
    AllocationFailure,
    /// No decoder/encoder for the codec, no matching stream, or an
    /// unsupported pixel/sample format.
    UnsupportedMedia,
    /// The filter chain failed to parse or the graph failed to validate.
    MalformedFilterSpec,
    /// Container open, read or write failure.
    IoFailure,
    /// No more input exists.
    EndOfStream,
    /// A stage is temporarily starved and needs more input.
    NeedMoreInput,
    /// Any other engine failure.
    EngineFailure,
    /// A caller-supplied value could not be used.
    InvalidArgument,
    /// A lifecycle operation was called in a state that does not allow it.
    InvalidState,
}

impl ErrorKind {
    /**
        Returns a short human-readable name for this kind.
    */
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllocationFailure => "allocation failure",
            Self::UnsupportedMedia => "unsupported media",
            Self::MalformedFilterSpec => "malformed filter spec",
            Self::IoFailure => "I/O failure",
            Self::EndOfStream => "end of stream",
            Self::NeedMoreInput => "need more input",
            Self::EngineFailure => "engine failure",
            Self::InvalidArgument => "invalid argument",
            Self::InvalidState => "invalid state",
        }
    }

    /**
        Returns true for the two kinds that signal normal loop termination.
    */
    pub const fn is_sentinel(self) -> bool {
        matches!(self, Self::EndOfStream | Self::NeedMoreInput)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/**
    Error type for the transcoding pipeline.

    Carries the classified [`ErrorKind`], the numeric engine code it came
    from (an `AVERROR` value), and a description of the step that failed.
*/
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {context}")]
pub struct Error {
    kind: ErrorKind,
    code: i32,
    context: String,
}

impl Error {
    /**
        Create an error from its parts.
    */
    pub fn new(kind: ErrorKind, code: i32, context: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            context: context.into(),
        }
    }

    /**
        Create an unsupported media error raised outside the engine.
    */
    pub fn unsupported(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedMedia, INVALID_ARGUMENT_CODE, context)
    }

    /**
        Create an invalid argument error.
    */
    pub fn invalid_argument(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, INVALID_ARGUMENT_CODE, context)
    }

    /**
        Create an invalid state error.
    */
    pub fn invalid_state(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, INVALID_ARGUMENT_CODE, context)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /**
        The engine error code, suitable for the engine's error reporter.
    */
    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /**
        Returns true if this error is an end-of-stream or need-more-input sentinel.
    */
    pub fn is_sentinel(&self) -> bool {
        self.kind.is_sentinel()
    }
}

/**
    Result type alias for the ffmpeg crate ecosystem.
*/
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let e = Error::unsupported("pixel format 'nope' not recognized");
        assert_eq!(
            format!("{e}"),
            "unsupported media: pixel format 'nope' not recognized"
        );

        let e = Error::invalid_state("flush called twice");
        assert_eq!(format!("{e}"), "invalid state: flush called twice");
    }

    #[test]
    fn rust_side_errors_carry_einval() {
        assert_eq!(Error::invalid_argument("x").code(), INVALID_ARGUMENT_CODE);
        assert_eq!(Error::invalid_state("x").code(), INVALID_ARGUMENT_CODE);
        assert_eq!(Error::unsupported("x").code(), INVALID_ARGUMENT_CODE);
    }

    #[test]
    fn error_preserves_code() {
        let e = Error::new(ErrorKind::IoFailure, -2, "open input");
        assert_eq!(e.kind(), ErrorKind::IoFailure);
        assert_eq!(e.code(), -2);
        assert_eq!(e.context(), "open input");
    }

    #[test]
    fn sentinels() {
        assert!(ErrorKind::EndOfStream.is_sentinel());
        assert!(ErrorKind::NeedMoreInput.is_sentinel());
        assert!(!ErrorKind::EngineFailure.is_sentinel());
        assert!(!Error::invalid_state("x").is_sentinel());
    }
}

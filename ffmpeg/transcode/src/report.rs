/*!
    Rendering engine error codes as text.
*/

use std::ffi::c_char;

use ffmpeg_next::ffi;

use ffmpeg_types::{Error, ErrorKind, Result};

/// Big enough for every message the engine produces.
const MESSAGE_CAPACITY: usize = 256;

/**
    Write the engine's description of `code` into `buffer`.

    The text is NUL-terminated and truncated to fit. Returns the number of
    bytes written before the terminator. Codes the engine has no
    description for are reported as an error carrying the engine's own
    return value.
*/
pub fn describe_error(code: i32, buffer: &mut [u8]) -> Result<usize> {
    if buffer.is_empty() {
        return Err(Error::invalid_argument("error description buffer is empty"));
    }

    // SAFETY: the pointer and length describe `buffer`, which the engine
    // NUL-terminates within bounds.
    let ret = unsafe {
        ffi::av_strerror(
            code,
            buffer.as_mut_ptr() as *mut c_char,
            buffer.len(),
        )
    };
    if ret < 0 {
        return Err(Error::new(
            ErrorKind::InvalidArgument,
            ret,
            format!("no description for error code {code}"),
        ));
    }

    Ok(buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len()))
}

/**
    The engine's description of `code`, or a generic one if it has none.
*/
pub fn error_string(code: i32) -> String {
    let mut buffer = [0u8; MESSAGE_CAPACITY];
    match describe_error(code, &mut buffer) {
        Ok(len) => String::from_utf8_lossy(&buffer[..len]).into_owned(),
        Err(_) => format!("error code {code}"),
    }
}

/**
    The code the engine uses for end of stream.
*/
pub fn end_of_stream_code() -> i32 {
    i32::from(ffmpeg_next::Error::Eof)
}

/**
    The code the engine uses when a stage needs more input.
*/
pub fn need_more_input_code() -> i32 {
    i32::from(ffmpeg_next::Error::Other {
        errno: ffmpeg_next::error::EAGAIN,
    })
}

/**
    One-line report of `error`: what failed, and the engine's words for it.
*/
pub fn report(error: &Error) -> String {
    format!("{error} ({})", error_string(error.code()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_end_of_stream() {
        let mut buffer = [0u8; 64];
        let len = describe_error(end_of_stream_code(), &mut buffer).unwrap();
        assert_eq!(&buffer[..len], b"End of file");
        assert_eq!(buffer[len], 0);
    }

    #[test]
    fn truncates_to_buffer() {
        let mut buffer = [0u8; 4];
        let len = describe_error(end_of_stream_code(), &mut buffer).unwrap();
        assert_eq!(len, 3);
        assert_eq!(&buffer[..len], b"End");
    }

    #[test]
    fn empty_buffer_is_rejected() {
        let err = describe_error(end_of_stream_code(), &mut []).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn sentinel_codes() {
        assert!(end_of_stream_code() < 0);
        assert_eq!(need_more_input_code(), -ffmpeg_next::error::EAGAIN);
        assert!(!error_string(need_more_input_code()).is_empty());
    }

    #[test]
    fn rust_side_errors_render() {
        let err = Error::invalid_state("flush called twice");
        let line = report(&err);
        assert!(line.starts_with("invalid state: flush called twice ("));
        assert_eq!(error_string(err.code()), "Invalid argument");
    }
}

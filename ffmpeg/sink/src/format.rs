/*!
    Muxer lookup.
*/

use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr;

use ffmpeg_next::ffi;

use ffmpeg_types::{Error, ErrorKind, Result};

/**
    A muxer resolved by name or guessed from the output file name.
*/
pub struct OutputFormat {
    format: *const ffi::AVOutputFormat,
    name: String,
    flags: i32,
}

impl OutputFormat {
    /**
        Resolve the muxer called `name`, or guess it from `path` when `name`
        is empty.
    */
    pub fn find(name: &str, path: &Path) -> Result<Self> {
        ffmpeg_next::init()
            .map_err(|e| Error::engine(e, ErrorKind::EngineFailure, "initialize ffmpeg"))?;

        let short_name = match name.trim() {
            "" => None,
            name => Some(c_string(name, "format name")?),
        };
        let file_name = c_string(path_str(path)?, "output path")?;

        // An explicit name must match on its own, not through the extension.
        // SAFETY: both strings outlive the call, the result is static or null.
        let format = unsafe {
            match &short_name {
                Some(short_name) => {
                    ffi::av_guess_format(short_name.as_ptr(), ptr::null(), ptr::null())
                }
                None => ffi::av_guess_format(ptr::null(), file_name.as_ptr(), ptr::null()),
            }
        };
        if format.is_null() {
            return Err(Error::engine(
                ffmpeg_next::Error::MuxerNotFound,
                ErrorKind::UnsupportedMedia,
                match short_name {
                    Some(_) => format!("no muxer named '{name}'"),
                    None => format!("cannot guess a muxer for '{}'", path.display()),
                },
            ));
        }

        // SAFETY: non-null muxer descriptors are static.
        let (name, flags) = unsafe {
            let name = CStr::from_ptr((*format).name).to_string_lossy().into_owned();
            (name, (*format).flags)
        };

        Ok(Self { format, name, flags })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /**
        Returns true if the muxer wants codec headers out of band.
    */
    pub fn needs_global_header(&self) -> bool {
        self.flags & ffi::AVFMT_GLOBALHEADER as i32 != 0
    }

    /**
        Returns true if the muxer does its own I/O and needs no opened file.
    */
    pub fn is_nofile(&self) -> bool {
        self.flags & ffi::AVFMT_NOFILE as i32 != 0
    }

    pub(crate) fn as_ptr(&self) -> *const ffi::AVOutputFormat {
        self.format
    }
}

impl std::fmt::Debug for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputFormat")
            .field("name", &self.name)
            .field("global_header", &self.needs_global_header())
            .field("nofile", &self.is_nofile())
            .finish()
    }
}

pub(crate) fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        Error::invalid_argument(format!("path '{}' is not valid UTF-8", path.display()))
    })
}

pub(crate) fn c_string(value: &str, what: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| Error::invalid_argument(format!("{what} '{value}' contains a NUL byte")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_by_name() {
        let format = OutputFormat::find("mp4", Path::new("out.bin")).unwrap();
        assert_eq!(format.name(), "mp4");
        assert!(format.needs_global_header());
        assert!(!format.is_nofile());
    }

    #[test]
    fn guess_from_path() {
        let format = OutputFormat::find("", Path::new("out.wav")).unwrap();
        assert_eq!(format.name(), "wav");
        assert!(!format.needs_global_header());
    }

    #[test]
    fn null_muxer_does_its_own_io() {
        let format = OutputFormat::find("null", Path::new("out.bin")).unwrap();
        assert_eq!(format.name(), "null");
        assert!(format.is_nofile());
    }

    #[test]
    fn unknown_muxer_is_unsupported() {
        let err = OutputFormat::find("no-such-muxer", Path::new("out.mp4")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMedia);

        let err = OutputFormat::find("", Path::new("out.unknown-extension")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMedia);
    }

    #[test]
    fn nul_in_name_is_invalid() {
        let err = OutputFormat::find("mp\0", Path::new("out.mp4")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

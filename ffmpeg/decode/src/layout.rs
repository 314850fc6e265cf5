/*!
    Owned channel layouts.
*/

use std::ffi::CStr;

use ffmpeg_next::ffi;

use ffmpeg_types::{Error, ErrorKind, Result};

/**
    An owned `AVChannelLayout`, released on drop.

    Layouts with an unspecified channel order are replaced by the default
    layout for their channel count when copied in, so a `ChannelLayout`
    always describes concrete channel positions.
*/
pub struct ChannelLayout {
    inner: ffi::AVChannelLayout,
}

impl ChannelLayout {
    /**
        Copy a layout owned by the engine.

        # Safety

        `layout` must point to a valid, initialized `AVChannelLayout`.
    */
    pub unsafe fn copy_from(layout: *const ffi::AVChannelLayout) -> Result<Self> {
        // SAFETY: an all-zero layout is the engine's "uninitialized" layout.
        let mut inner: ffi::AVChannelLayout = unsafe { std::mem::zeroed() };

        unsafe {
            if (*layout).order == ffi::AVChannelOrder::AV_CHANNEL_ORDER_UNSPEC {
                ffi::av_channel_layout_default(&mut inner, (*layout).nb_channels);
            } else {
                let code = ffi::av_channel_layout_copy(&mut inner, layout);
                if code < 0 {
                    return Err(Error::engine(
                        ffmpeg_next::Error::from(code),
                        ErrorKind::AllocationFailure,
                        "copy channel layout",
                    ));
                }
            }
        }

        Ok(Self { inner })
    }

    /**
        Copy this layout into an engine-owned layout, replacing its contents.

        # Safety

        `target` must point to a valid, initialized `AVChannelLayout`.
    */
    pub unsafe fn copy_to(&self, target: *mut ffi::AVChannelLayout) -> Result<()> {
        let code = unsafe { ffi::av_channel_layout_copy(target, &self.inner) };
        if code < 0 {
            return Err(Error::engine(
                ffmpeg_next::Error::from(code),
                ErrorKind::AllocationFailure,
                "copy channel layout",
            ));
        }
        Ok(())
    }

    pub fn channels(&self) -> u32 {
        self.inner.nb_channels.max(0) as u32
    }

    /**
        Render the layout the way filter arguments expect it, e.g. `stereo`.
    */
    pub fn describe(&self) -> Result<String> {
        let mut buf = [0u8; 128];
        // SAFETY: the buffer length is passed along, the engine NUL-terminates.
        let code = unsafe {
            ffi::av_channel_layout_describe(&self.inner, buf.as_mut_ptr().cast(), buf.len())
        };
        if code < 0 {
            return Err(Error::engine(
                ffmpeg_next::Error::from(code),
                ErrorKind::EngineFailure,
                "describe channel layout",
            ));
        }

        let text = CStr::from_bytes_until_nul(&buf)
            .map_err(|_| Error::invalid_argument("channel layout description is not terminated"))?;
        Ok(text.to_string_lossy().into_owned())
    }

    pub fn as_ptr(&self) -> *const ffi::AVChannelLayout {
        &self.inner
    }
}

impl Drop for ChannelLayout {
    fn drop(&mut self) {
        // SAFETY: `inner` is either zeroed or was filled by the engine.
        unsafe { ffi::av_channel_layout_uninit(&mut self.inner) };
    }
}

impl std::fmt::Debug for ChannelLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelLayout")
            .field("channels", &self.channels())
            .field("description", &self.describe().ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unspecified(channels: i32) -> ffi::AVChannelLayout {
        let mut layout: ffi::AVChannelLayout = unsafe { std::mem::zeroed() };
        layout.order = ffi::AVChannelOrder::AV_CHANNEL_ORDER_UNSPEC;
        layout.nb_channels = channels;
        layout
    }

    #[test]
    fn unspecified_order_gets_default_layout() {
        let raw = unspecified(2);
        let layout = unsafe { ChannelLayout::copy_from(&raw) }.unwrap();
        assert_eq!(layout.channels(), 2);
        assert_eq!(layout.describe().unwrap(), "stereo");

        let raw = unspecified(1);
        let layout = unsafe { ChannelLayout::copy_from(&raw) }.unwrap();
        assert_eq!(layout.describe().unwrap(), "mono");
    }

    #[test]
    fn copy_round_trips_through_engine_layout() {
        let raw = unspecified(2);
        let layout = unsafe { ChannelLayout::copy_from(&raw) }.unwrap();

        let mut target: ffi::AVChannelLayout = unsafe { std::mem::zeroed() };
        unsafe { layout.copy_to(&mut target) }.unwrap();
        let copy = unsafe { ChannelLayout::copy_from(&target) }.unwrap();
        unsafe { ffi::av_channel_layout_uninit(&mut target) };

        assert_eq!(copy.describe().unwrap(), layout.describe().unwrap());
    }
}

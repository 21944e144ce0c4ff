use crate::frame::{Frame, yv12_len};
use crate::platform::smpeg::sys::SMPEG_Frame;
use crate::types::{PixelFormat, Size};

/// A frame handed out by the decoder's display callback.
/// Only valid within the callback scope.
pub struct SmpegFrame<'a> {
    size: Size,
    image_size: Size,
    data: &'a [u8],
}

impl<'a> SmpegFrame<'a> {
    /// SAFETY: `frame.image`, when non-null, must point to at least
    /// `yv12_len(image_width x image_height)` bytes that stay valid for `'a`.
    pub(crate) unsafe fn from_raw(frame: &'a SMPEG_Frame) -> Self {
        let size = Size::new(frame.w, frame.h);
        let image_size = Size::new(frame.image_width, frame.image_height);
        let data = if frame.image.is_null() {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(frame.image, yv12_len(image_size)) }
        };
        SmpegFrame {
            size,
            image_size,
            data,
        }
    }
}

impl Frame for SmpegFrame<'_> {
    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Yv12
    }

    fn size(&self) -> Size {
        self.size
    }

    fn image_size(&self) -> Size {
        self.image_size
    }

    fn data(&self) -> &[u8] {
        self.data
    }
}

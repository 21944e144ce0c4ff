use crate::types::{PixelFormat, Size};

/// A single plane of image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub bytes_per_row: usize,
}

/// Number of bytes in a YV12 image of the given buffer dimensions.
pub fn yv12_len(image_size: Size) -> usize {
    let luma = image_size.width as usize * image_size.height as usize;
    luma + 2 * chroma_len(image_size)
}

fn chroma_len(image_size: Size) -> usize {
    (image_size.width as usize / 2) * (image_size.height as usize / 2)
}

/// Splits a contiguous YV12 buffer into its Y, V and U planes.
///
/// Planes that would run past the end of `data` come back empty.
pub fn yv12_planes(data: &[u8], image_size: Size) -> [Plane<'_>; 3] {
    let width = image_size.width as usize;
    let luma = width * image_size.height as usize;
    let chroma = chroma_len(image_size);

    let slice = |start: usize, len: usize| data.get(start..start + len).unwrap_or(&[]);
    [
        Plane {
            data: slice(0, luma),
            bytes_per_row: width,
        },
        Plane {
            data: slice(luma, chroma),
            bytes_per_row: width / 2,
        },
        Plane {
            data: slice(luma + chroma, chroma),
            bytes_per_row: width / 2,
        },
    ]
}

/// A decoded video frame.
///
/// `size` is what should be shown; `image_size` is the macroblock-padded
/// size the pixel buffer is laid out in.
pub trait Frame {
    fn pixel_format(&self) -> PixelFormat;
    fn size(&self) -> Size;
    fn image_size(&self) -> Size;
    /// The whole image buffer, planes back to back.
    fn data(&self) -> &[u8];

    fn planes(&self) -> [Plane<'_>; 3] {
        yv12_planes(self.data(), self.image_size())
    }

    /// Row pitch of the first plane in bytes.
    fn pitch(&self) -> usize {
        self.image_size().width as usize
    }
}

/// An owned copy of a frame, safe to hand across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    size: Size,
    image_size: Size,
    data: Vec<u8>,
}

impl VideoFrame {
    /// An empty frame whose buffer can later be filled by [`copy_from`](Self::copy_from).
    pub fn empty() -> Self {
        VideoFrame::with_buffer(Vec::new())
    }

    pub(crate) fn with_buffer(data: Vec<u8>) -> Self {
        VideoFrame {
            size: Size::default(),
            image_size: Size::default(),
            data,
        }
    }

    /// Copies `frame` into this one, reusing the existing allocation.
    pub fn copy_from<F: Frame + ?Sized>(&mut self, frame: &F) {
        self.size = frame.size();
        self.image_size = frame.image_size();
        self.data.clear();
        self.data.extend_from_slice(frame.data());
    }

    pub(crate) fn into_buffer(self) -> Vec<u8> {
        self.data
    }
}

impl Frame for VideoFrame {
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
        &self.data
    }
}

impl<F: Frame> From<&F> for VideoFrame {
    fn from(frame: &F) -> Self {
        let mut owned = VideoFrame::with_buffer(Vec::with_capacity(frame.data().len()));
        owned.copy_from(frame);
        owned
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A borrowed frame over a test buffer.
    pub(crate) struct TestFrame<'a> {
        pub size: Size,
        pub image_size: Size,
        pub data: &'a [u8],
    }

    impl Frame for TestFrame<'_> {
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

    #[test]
    fn yv12_planes_are_split_in_order() {
        let image_size = Size::new(4, 2);
        // 8 luma bytes, then 2 V, then 2 U
        let data = [1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 3, 3];
        assert_eq!(yv12_len(image_size), data.len());

        let [y, v, u] = yv12_planes(&data, image_size);
        assert_eq!(y.data, &[1; 8]);
        assert_eq!(y.bytes_per_row, 4);
        assert_eq!(v.data, &[2, 2]);
        assert_eq!(u.data, &[3, 3]);
        assert_eq!(u.bytes_per_row, 2);
    }

    #[test]
    fn short_buffer_yields_empty_planes() {
        let data = [0u8; 8];
        let [y, v, u] = yv12_planes(&data, Size::new(4, 2));
        assert_eq!(y.data.len(), 8);
        assert!(v.data.is_empty());
        assert!(u.data.is_empty());
    }

    #[test]
    fn copy_reuses_allocation() {
        let data = vec![9u8; yv12_len(Size::new(16, 16))];
        let frame = TestFrame {
            size: Size::new(10, 12),
            image_size: Size::new(16, 16),
            data: &data,
        };

        let mut owned = VideoFrame::with_buffer(Vec::with_capacity(1024));
        let before = owned.data.as_ptr();
        owned.copy_from(&frame);

        assert_eq!(owned.data.as_ptr(), before);
        assert_eq!(owned.size(), Size::new(10, 12));
        assert_eq!(owned.image_size(), Size::new(16, 16));
        assert_eq!(owned.pitch(), 16);
        assert_eq!(owned.data(), &data[..]);
    }
}

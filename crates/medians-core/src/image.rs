//! Stride-aware image views over caller-owned 8-bit buffers.
//!
//! Both views support padded rows and interleaved channels. A channel of an
//! interleaved image is addressed as a [`Plane`], which is what the filter
//! kernels consume: a single logical 8-bit image with a pixel step.

use crate::error::ImageError;

fn validate(
    len: usize,
    width: usize,
    height: usize,
    stride: usize,
    channels: usize,
) -> Result<(), ImageError> {
    if channels == 0 {
        return Err(ImageError::NoChannels);
    }
    let row_bytes = width * channels;
    if stride < row_bytes {
        return Err(ImageError::StrideTooSmall {
            stride,
            width,
            channels,
        });
    }
    let required = if height > 0 && width > 0 {
        (height - 1) * stride + row_bytes
    } else {
        0
    };
    if len < required {
        return Err(ImageError::BufferTooSmall {
            actual: len,
            required,
            width,
            height,
            stride,
        });
    }
    Ok(())
}

/// A read-only view into an image buffer with explicit stride support.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    /// Raw pixel bytes, row-major.
    pub data: &'a [u8],
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Distance between the starts of adjacent rows, in bytes.
    pub stride: usize,
    /// Number of interleaved channels per pixel.
    pub channels: usize,
}

impl<'a> ImageView<'a> {
    /// Create a single-channel view after validating buffer size and stride.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, ImageError> {
        Self::with_channels(data, width, height, stride, 1)
    }

    /// Create a view over `channels` interleaved 8-bit channels.
    pub fn with_channels(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
        channels: usize,
    ) -> Result<Self, ImageError> {
        validate(data.len(), width, height, stride, channels)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
            channels,
        })
    }

    /// Safe accessor for a specific row, including every channel.
    #[inline(always)]
    pub fn get_row(&self, y: usize) -> &[u8] {
        assert!(y < self.height, "Row index {} out of bounds", y);
        let start = y * self.stride;
        &self.data[start..start + self.width * self.channels]
    }

    /// Safe accessor for one channel of a specific pixel.
    #[inline(always)]
    pub fn get_pixel(&self, x: usize, y: usize, channel: usize) -> u8 {
        assert!(x < self.width, "Column index {} out of bounds", x);
        assert!(channel < self.channels, "Channel {} out of bounds", channel);
        self.get_row(y)[x * self.channels + channel]
    }

    /// View one interleaved channel as an independent single-channel plane.
    pub fn plane(&self, channel: usize) -> Plane<'a> {
        assert!(channel < self.channels, "Channel {} out of bounds", channel);
        Plane {
            data: &self.data[channel..],
            width: self.width,
            height: self.height,
            stride: self.stride,
            step: self.channels,
        }
    }

    /// Returns an error unless `other` has the same width, height and channels.
    pub fn ensure_same_geometry(&self, other: &ImageViewMut<'_>) -> Result<(), ImageError> {
        if self.width == other.width
            && self.height == other.height
            && self.channels == other.channels
        {
            return Ok(());
        }
        Err(ImageError::GeometryMismatch {
            src_width: self.width,
            src_height: self.height,
            src_channels: self.channels,
            dst_width: other.width,
            dst_height: other.height,
            dst_channels: other.channels,
        })
    }
}

/// A mutable view into an image buffer with explicit stride support.
#[derive(Debug)]
pub struct ImageViewMut<'a> {
    /// Raw pixel bytes, row-major.
    pub data: &'a mut [u8],
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Distance between the starts of adjacent rows, in bytes.
    pub stride: usize,
    /// Number of interleaved channels per pixel.
    pub channels: usize,
}

impl<'a> ImageViewMut<'a> {
    /// Create a single-channel mutable view after validating buffer size and stride.
    pub fn new(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, ImageError> {
        Self::with_channels(data, width, height, stride, 1)
    }

    /// Create a mutable view over `channels` interleaved 8-bit channels.
    pub fn with_channels(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        stride: usize,
        channels: usize,
    ) -> Result<Self, ImageError> {
        validate(data.len(), width, height, stride, channels)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
            channels,
        })
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> ImageView<'_> {
        ImageView {
            data: self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
            channels: self.channels,
        }
    }

    /// View one interleaved channel as an independent writable plane.
    pub fn plane_mut(&mut self, channel: usize) -> PlaneMut<'_> {
        assert!(channel < self.channels, "Channel {} out of bounds", channel);
        PlaneMut {
            data: &mut self.data[channel..],
            width: self.width,
            height: self.height,
            stride: self.stride,
            step: self.channels,
        }
    }
}

/// One logical 8-bit channel of an image: `step` bytes between neighbors in a row.
#[derive(Clone, Copy, Debug)]
pub struct Plane<'a> {
    data: &'a [u8],
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Distance between rows, in bytes.
    pub stride: usize,
    /// Distance between horizontally adjacent pixels, in bytes.
    pub step: usize,
}

impl<'a> Plane<'a> {
    /// Bytes of row `y` starting at column `x0`, spanning `len` pixels.
    ///
    /// The returned slice holds the pixels at indices `0, step, 2 * step, ...`.
    #[inline]
    pub fn row_span(&self, y: usize, x0: usize, len: usize) -> &'a [u8] {
        assert!(y < self.height, "Row index {} out of bounds", y);
        assert!(x0 + len <= self.width, "Span {}+{} out of bounds", x0, len);
        if len == 0 {
            return &[];
        }
        let start = y * self.stride + x0 * self.step;
        &self.data[start..start + (len - 1) * self.step + 1]
    }

    /// Single pixel accessor.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.row_span(y, x, 1)[0]
    }
}

/// Writable counterpart of [`Plane`].
#[derive(Debug)]
pub struct PlaneMut<'a> {
    data: &'a mut [u8],
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Distance between rows, in bytes.
    pub stride: usize,
    /// Distance between horizontally adjacent pixels, in bytes.
    pub step: usize,
}

impl<'a> PlaneMut<'a> {
    /// Wrap a tightly packed single-channel buffer.
    pub fn packed(data: &'a mut [u8], width: usize, height: usize) -> Self {
        assert!(data.len() >= width * height, "Buffer too small for packed plane");
        Self {
            data,
            width,
            height,
            stride: width,
            step: 1,
        }
    }

    /// Store one pixel.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        assert!(x < self.width && y < self.height, "Pixel ({}, {}) out of bounds", x, y);
        self.data[y * self.stride + x * self.step] = value;
    }

    /// Read one pixel back.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        assert!(x < self.width && y < self.height, "Pixel ({}, {}) out of bounds", x, y);
        self.data[y * self.stride + x * self.step]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_view_stride() {
        let data = vec![
            1, 2, 3, 0, // row 0 + padding
            4, 5, 6, 0, // row 1 + padding
        ];
        let view = ImageView::new(&data, 3, 2, 4).unwrap();
        assert_eq!(view.get_row(0), &[1, 2, 3]);
        assert_eq!(view.get_row(1), &[4, 5, 6]);
        assert_eq!(view.get_pixel(1, 1, 0), 5);
    }

    #[test]
    fn test_invalid_buffer_size() {
        let data = vec![1, 2, 3];
        let result = ImageView::new(&data, 2, 2, 2);
        assert!(matches!(result, Err(ImageError::BufferTooSmall { required: 4, .. })));
    }

    #[test]
    fn test_stride_must_cover_all_channels() {
        let data = vec![0u8; 64];
        let result = ImageView::with_channels(&data, 4, 4, 8, 3);
        assert!(matches!(result, Err(ImageError::StrideTooSmall { .. })));
        assert_eq!(
            ImageView::with_channels(&data, 4, 4, 8, 0).unwrap_err(),
            ImageError::NoChannels
        );
    }

    #[test]
    fn test_plane_extracts_interleaved_channel() {
        // 2x2 RGB with one byte of row padding
        let data = vec![
            10, 11, 12, 20, 21, 22, 0, //
            30, 31, 32, 40, 41, 42, 0,
        ];
        let view = ImageView::with_channels(&data, 2, 2, 7, 3).unwrap();
        let green = view.plane(1);
        assert_eq!(green.get(0, 0), 11);
        assert_eq!(green.get(1, 0), 21);
        assert_eq!(green.get(1, 1), 41);
        assert_eq!(green.row_span(1, 0, 2), &[31, 32, 40, 41]);
    }

    #[test]
    fn test_plane_mut_writes_only_its_channel() {
        let mut data = vec![0u8; 2 * 2 * 2];
        {
            let mut view = ImageViewMut::with_channels(&mut data, 2, 2, 4, 2).unwrap();
            let mut second = view.plane_mut(1);
            second.set(1, 1, 9);
            assert_eq!(second.get(1, 1), 9);
        }
        assert_eq!(data, vec![0, 0, 0, 0, 0, 0, 0, 9]);
    }

    #[test]
    fn test_geometry_mismatch_reported() {
        let src = vec![0u8; 16];
        let mut dst = vec![0u8; 16];
        let view = ImageView::new(&src, 4, 4, 4).unwrap();
        let out = ImageViewMut::new(&mut dst, 2, 8, 2).unwrap();
        assert!(matches!(
            view.ensure_same_geometry(&out),
            Err(ImageError::GeometryMismatch { .. })
        ));
    }
}

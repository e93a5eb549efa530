//! Errors raised while describing image buffers.

use thiserror::Error;

/// Geometry errors detected when wrapping a caller buffer in an image view.
///
/// These are the only recoverable failures in the crate. Anything that gets
/// past view construction but still violates a filter precondition (window
/// larger than the image, radius too large) is a programming error and panics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// The image declares zero interleaved channels.
    #[error("channel count must be at least 1")]
    NoChannels,

    /// A row is shorter than `width * channels` bytes.
    #[error("stride ({stride}) cannot be less than width ({width}) times channels ({channels})")]
    StrideTooSmall {
        /// Declared row stride in bytes.
        stride: usize,
        /// Image width in pixels.
        width: usize,
        /// Interleaved channel count.
        channels: usize,
    },

    /// The buffer cannot hold the declared geometry.
    #[error("buffer size ({actual}) is too small for {width}x{height} image with stride {stride} (required: {required})")]
    BufferTooSmall {
        /// Length of the supplied buffer.
        actual: usize,
        /// Minimum length implied by the geometry.
        required: usize,
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
        /// Row stride in bytes.
        stride: usize,
    },

    /// Source and destination views disagree on width, height or channels.
    #[error("destination is {dst_width}x{dst_height}x{dst_channels}, source is {src_width}x{src_height}x{src_channels}")]
    GeometryMismatch {
        /// Source width.
        src_width: usize,
        /// Source height.
        src_height: usize,
        /// Source channel count.
        src_channels: usize,
        /// Destination width.
        dst_width: usize,
        /// Destination height.
        dst_height: usize,
        /// Destination channel count.
        dst_channels: usize,
    },
}

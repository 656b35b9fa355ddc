//! Error types for ogvframes-media.

use std::io;
use thiserror::Error;

use crate::codec::{CodecError, PixelFormat};
use crate::handle::ContainerId;
use crate::stream::RejectReason;

/// Result type for ogvframes-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for ogvframes-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading the byte source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad sync, unknown serial without beginning-of-stream, or a malformed page.
    #[error("Framing error: {0}")]
    Framing(String),

    /// The leading packets of a logical stream are not the target codec.
    #[error("Stream {serial:#010x} rejected: {reason}")]
    CodecRejected { serial: u32, reason: RejectReason },

    /// The stream uses a codec version this build cannot decode.
    #[error("Stream {serial:#010x} uses an unsupported codec version: {reason}")]
    VersionUnsupported { serial: u32, reason: String },

    /// A header packet of the selected stream could not be parsed.
    #[error("Stream {serial:#010x} has a corrupt header: {reason}")]
    HeaderCorrupt { serial: u32, reason: String },

    /// The codec failed to create a decode context.
    #[error("Stream {serial:#010x}: decoder allocation failed: {reason}")]
    AllocFailed { serial: u32, reason: String },

    /// The codec reported an unrecoverable decode error.
    #[error("Stream {serial:#010x}: decode failed: {reason}")]
    DecodeFailed { serial: u32, reason: String },

    /// More logical streams than the configured ceiling.
    #[error("Too many streams in container (limit: {limit})")]
    TooManyStreams { limit: usize },

    /// No logical stream carried the target codec.
    #[error("No decodable video stream found")]
    NoVideoStream,

    /// Pixel format the color converter does not implement.
    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(PixelFormat),

    /// Plane or destination buffer does not match the picture geometry.
    #[error("Invalid picture: {0}")]
    InvalidPicture(String),

    /// The container has been closed, or released after a fatal error.
    #[error("Container is closed")]
    Closed,

    /// No open container is registered under this handle.
    #[error("Unknown container handle: {0}")]
    UnknownHandle(ContainerId),
}

impl Error {
    /// Create a framing error.
    pub fn framing(msg: impl Into<String>) -> Self {
        Self::Framing(msg.into())
    }

    /// Create an invalid picture error.
    pub fn invalid_picture(msg: impl Into<String>) -> Self {
        Self::InvalidPicture(msg.into())
    }

    /// Attach a stream serial to a codec error raised while reading headers.
    pub fn from_header_error(serial: u32, err: CodecError) -> Self {
        match err {
            CodecError::VersionUnsupported(reason) => Self::VersionUnsupported { serial, reason },
            CodecError::AllocFailed(reason) => Self::AllocFailed { serial, reason },
            CodecError::Decode(reason) => Self::DecodeFailed { serial, reason },
            other => Self::HeaderCorrupt {
                serial,
                reason: other.to_string(),
            },
        }
    }

    /// Attach a stream serial to a codec error raised while decoding data packets.
    pub fn from_decode_error(serial: u32, err: CodecError) -> Self {
        Self::DecodeFailed {
            serial,
            reason: err.to_string(),
        }
    }

    /// Whether this error tears down the whole container.
    ///
    /// Fatal errors release every stream, decode context and the byte source
    /// before they reach the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Framing(_)
                | Self::VersionUnsupported { .. }
                | Self::HeaderCorrupt { .. }
                | Self::AllocFailed { .. }
                | Self::DecodeFailed { .. }
                | Self::TooManyStreams { .. }
                | Self::NoVideoStream
        )
    }
}

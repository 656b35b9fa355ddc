//! Tunables for opening a container.

use crate::frame::PixelLayout;
use crate::ogg::{DEFAULT_CHUNK_SIZE, DEFAULT_RESYNC_LIMIT};

/// Default ceiling on logical streams per container.
pub const DEFAULT_MAX_STREAMS: usize = 16;

/// Options applied when a container is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ContainerOptions {
    /// Maximum number of logical streams; one more is a fatal error.
    pub max_streams: usize,
    /// Bytes requested from the source per read.
    pub read_chunk_size: usize,
    /// Garbage bytes tolerated while resynchronizing before giving up.
    pub resync_limit: usize,
    /// Layout of converted frames.
    pub pixel_layout: PixelLayout,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_streams: DEFAULT_MAX_STREAMS,
            read_chunk_size: DEFAULT_CHUNK_SIZE,
            resync_limit: DEFAULT_RESYNC_LIMIT,
            pixel_layout: PixelLayout::Rgba,
        }
    }
}

impl ContainerOptions {
    pub fn with_max_streams(mut self, max_streams: usize) -> Self {
        self.max_streams = max_streams;
        self
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    pub fn with_resync_limit(mut self, limit: usize) -> Self {
        self.resync_limit = limit;
        self
    }

    pub fn with_pixel_layout(mut self, layout: PixelLayout) -> Self {
        self.pixel_layout = layout;
        self
    }
}

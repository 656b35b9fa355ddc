//! ogvframes-media: Ogg demuxing, codec driving and color conversion.
//!
//! This crate turns a byte source holding an Ogg container into a sequence
//! of interleaved RGB(A) frames. The video codec itself is pluggable; this
//! crate only drives it through the [`Codec`] traits.
//!
//! # Modules
//!
//! - [`ogg`] - Page synchronization, page reading, packet reassembly and writing
//! - [`stream`] - Per-serial stream state and the stream table
//! - [`header`] - Header phase: codec classification and setup accumulation
//! - [`decoder`] - Data phase: packet-in / picture-out
//! - [`color`] - Studio-range YCbCr to RGB conversion
//! - [`container`] - Open/next-frame/rewind/close of one container
//! - [`handle`] - Generation-checked table of open containers
//! - [`probe`] - Header-only walk over a container

pub mod codec;
pub mod color;
pub mod container;
mod demux;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod handle;
pub mod header;
pub mod ogg;
pub mod options;
pub mod probe;
pub mod stream;

// Re-export commonly used items at the crate root.
pub use codec::{
    Codec, CodecError, Colorspace, DecodeContext, FrameRate, HeaderParser, HeaderStatus,
    PacketStatus, PictureGeometry, PixelFormat, Plane, PlaneBuf, StreamInfo, YCbCrBuffer,
};
pub use color::{convert_into, ycbcr_to_rgb, ColorConverter};
pub use container::Container;
pub use decoder::{DecodeStatus, FrameDecoder};
pub use demux::NextFrame;
pub use error::{Error, Result};
pub use frame::{ChannelOffsets, Frame, FrameLayout, PixelLayout};
pub use handle::{ContainerId, FileContainer, HandleTable, Session};
pub use header::HeaderAssembler;
pub use options::ContainerOptions;
pub use probe::{probe, HeaderOnly, ProbeReport};
pub use stream::{RejectReason, StreamPhase, StreamSummary, StreamTable};

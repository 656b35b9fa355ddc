//! Codec seam: header parsing, decode-context allocation, packet decoding
//! and planar picture output.
//!
//! The demuxer never looks inside packets. A codec implementation classifies
//! a stream from its leading packets, accumulates setup data, and once the
//! headers are complete hands out a [`DecodeContext`] that turns data packets
//! into planar Y'CbCr pictures.

use std::fmt;

use thiserror::Error;

use crate::ogg::Packet;

/// Chroma subsampling of a decoded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelFormat {
    /// Chroma halved horizontally and vertically.
    Yuv420,
    /// Reserved value; never valid.
    Reserved,
    /// Chroma halved horizontally.
    Yuv422,
    /// Full-resolution chroma.
    Yuv444,
}

impl PixelFormat {
    /// Horizontal and vertical chroma shift, or `None` for the reserved format.
    pub fn chroma_shift(self) -> Option<(u32, u32)> {
        match self {
            Self::Yuv420 => Some((1, 1)),
            Self::Yuv422 => Some((1, 0)),
            Self::Yuv444 => Some((0, 0)),
            Self::Reserved => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yuv420 => write!(f, "4:2:0"),
            Self::Reserved => write!(f, "reserved"),
            Self::Yuv422 => write!(f, "4:2:2"),
            Self::Yuv444 => write!(f, "4:4:4"),
        }
    }
}

/// Color space tag carried in the stream headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Colorspace {
    #[default]
    Unspecified,
    /// ITU-R BT.470 System M.
    Rec470M,
    /// ITU-R BT.470 System B/G.
    Rec470BG,
    /// Value outside the known range.
    Unknown(u8),
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::Rec470M => write!(f, "ITU Rec. 470M"),
            Self::Rec470BG => write!(f, "ITU Rec. 470BG"),
            Self::Unknown(v) => write!(f, "unknown ({v})"),
        }
    }
}

/// Coded frame size plus the visible picture rectangle inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct PictureGeometry {
    /// Coded (block-aligned) frame width.
    pub frame_width: u32,
    /// Coded (block-aligned) frame height.
    pub frame_height: u32,
    /// Visible picture width.
    pub pic_width: u32,
    /// Visible picture height.
    pub pic_height: u32,
    /// Left edge of the visible picture.
    pub pic_x: u32,
    /// Top edge of the visible picture.
    pub pic_y: u32,
    pub pixel_format: PixelFormat,
    pub colorspace: Colorspace,
}

impl PictureGeometry {
    /// Uncropped geometry: the visible picture is the whole coded frame.
    pub fn full_frame(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            frame_width: width,
            frame_height: height,
            pic_width: width,
            pic_height: height,
            pic_x: 0,
            pic_y: 0,
            pixel_format,
            colorspace: Colorspace::Unspecified,
        }
    }

    /// Whether the visible picture is smaller than the coded frame.
    pub fn is_cropped(&self) -> bool {
        self.pic_width != self.frame_width || self.pic_height != self.frame_height
    }

    /// Whether the visible rectangle fits inside the coded frame.
    pub fn crop_fits(&self) -> bool {
        self.pic_x as u64 + self.pic_width as u64 <= self.frame_width as u64
            && self.pic_y as u64 + self.pic_height as u64 <= self.frame_height as u64
    }
}

/// Frame rate as a rational number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Frames per second, or 0 for a zero denominator.
    pub fn as_f64(&self) -> f64 {
        if self.denominator == 0 {
            0.0
        } else {
            self.numerator as f64 / self.denominator as f64
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Codec-independent description of a video stream, available once its
/// identification header has been parsed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamInfo {
    /// Codec name.
    pub codec: String,
    /// Bitstream version (major, minor, revision).
    pub version: (u8, u8, u8),
    pub geometry: PictureGeometry,
    pub frame_rate: FrameRate,
    /// Pixel aspect ratio (numerator, denominator); 0/0 when unspecified.
    pub pixel_aspect: (u32, u32),
    /// Nominal bitrate in bits per second; 0 when unspecified.
    pub target_bitrate: u32,
    /// Encoder quality hint.
    pub quality: u8,
    /// Bits of the granule position holding the keyframe number.
    pub keyframe_granule_shift: u8,
}

/// Result of submitting one packet to a header parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStatus {
    /// The stream is not this codec.
    NotThisCodec,
    /// The packet was a header; more headers follow.
    MoreHeaders,
    /// All headers are in; the next packet is data.
    Complete,
}

/// Result of submitting one data packet to a decode context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketStatus {
    /// A new picture is available from [`DecodeContext::ycbcr_out`].
    Decoded,
    /// The packet produced no picture (corrupt, duplicate, or skipped).
    Dropped,
}

/// Errors reported by codec implementations.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported bitstream version: {0}")]
    VersionUnsupported(String),

    #[error("corrupt header: {0}")]
    HeaderCorrupt(String),

    #[error("decoder allocation failed: {0}")]
    AllocFailed(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("no decoded picture available")]
    NoPicture,
}

/// One plane of a decoded picture.
///
/// Rows are `stride` bytes apart; `stride` may exceed `width`, so samples must
/// always be addressed as `row * stride + column`.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub stride: usize,
}

impl Plane<'_> {
    /// Sample at (x, y), or `None` when outside the plane.
    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.stride + x as usize)
            .copied()
    }

    /// Whether the backing slice covers every addressable sample.
    pub fn is_complete(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return true;
        }
        self.stride >= self.width as usize
            && self.data.len() >= (self.height as usize - 1) * self.stride + self.width as usize
    }
}

/// Planar Y'CbCr picture borrowed from a decode context.
#[derive(Debug, Clone, Copy)]
pub struct YCbCrBuffer<'a> {
    pub planes: [Plane<'a>; 3],
}

impl<'a> YCbCrBuffer<'a> {
    pub fn new(y: Plane<'a>, cb: Plane<'a>, cr: Plane<'a>) -> Self {
        Self {
            planes: [y, cb, cr],
        }
    }

    pub fn y(&self) -> &Plane<'a> {
        &self.planes[0]
    }

    pub fn cb(&self) -> &Plane<'a> {
        &self.planes[1]
    }

    pub fn cr(&self) -> &Plane<'a> {
        &self.planes[2]
    }
}

/// Owned plane storage for decode contexts that keep their own buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneBuf {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: usize,
}

impl PlaneBuf {
    /// Plane filled with `value`, with `padding` extra bytes per row.
    pub fn filled(width: u32, height: u32, padding: usize, value: u8) -> Self {
        let stride = width as usize + padding;
        Self {
            data: vec![value; stride * height as usize],
            width,
            height,
            stride,
        }
    }

    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        let index = y as usize * self.stride + x as usize;
        self.data[index] = value;
    }

    pub fn as_plane(&self) -> Plane<'_> {
        Plane {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }
}

/// Parses the header packets of one logical stream.
pub trait HeaderParser {
    /// Setup data accumulated across header packets.
    type Setup: Default;

    /// Short codec name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Submit the next packet of a stream still in its header phase.
    fn header_in(&self, setup: &mut Self::Setup, packet: &Packet)
        -> Result<HeaderStatus, CodecError>;

    /// Stream description, once the identification header has been seen.
    fn stream_info(&self, setup: &Self::Setup) -> Option<StreamInfo>;
}

/// A header parser that can also allocate decode contexts.
pub trait Codec: HeaderParser {
    type Context: DecodeContext;

    /// Create a decode context from completed setup data.
    fn alloc(&mut self, setup: Self::Setup) -> Result<Self::Context, CodecError>;
}

/// Packet-in / picture-out decoding state for one stream.
pub trait DecodeContext {
    /// Submit a data packet.
    fn packet_in(&mut self, packet: &Packet) -> Result<PacketStatus, CodecError>;

    /// Borrow the most recently decoded picture.
    fn ycbcr_out(&mut self) -> Result<YCbCrBuffer<'_>, CodecError>;
}

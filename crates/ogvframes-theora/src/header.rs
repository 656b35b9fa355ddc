//! Theora identification, comment and setup headers.

use bitstream_io::{BigEndian, BitRead, BitReader};
use bytes::{Buf, Bytes};
use ogvframes_media::ogg::Packet;
use ogvframes_media::{
    CodecError, Colorspace, FrameRate, HeaderParser, HeaderStatus, PictureGeometry, PixelFormat,
    StreamInfo,
};

use crate::error::{HeaderKind, TheoraError};

/// Codec name reported in stream info and logs.
pub const CODEC_NAME: &str = "theora";

/// Signature following the header type byte.
pub const SIGNATURE: &[u8; 6] = b"theora";

/// Type byte plus signature.
pub const HEADER_PREFIX_LEN: usize = 7;

/// Size of an identification header packet.
pub const IDENTIFICATION_LEN: usize = 42;

/// Highest bitstream version this parser accepts.
pub const VERSION: (u8, u8, u8) = (3, 2, 1);

/// Fields of the identification header.
///
/// `pic_y` is measured from the top of the frame; the bitstream stores it
/// from the bottom and it is flipped on parse.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TheoraInfo {
    pub version: (u8, u8, u8),
    /// Coded frame width; a multiple of 16.
    pub frame_width: u32,
    /// Coded frame height; a multiple of 16.
    pub frame_height: u32,
    pub pic_width: u32,
    pub pic_height: u32,
    pub pic_x: u32,
    pub pic_y: u32,
    pub fps_numerator: u32,
    pub fps_denominator: u32,
    pub aspect_numerator: u32,
    pub aspect_denominator: u32,
    pub colorspace: Colorspace,
    pub pixel_format: PixelFormat,
    pub target_bitrate: u32,
    pub quality: u8,
    pub keyframe_granule_shift: u8,
}

impl TheoraInfo {
    /// Uncropped 4:2:0 stream info for a picture of the given size; the coded
    /// frame is rounded up to whole macroblocks.
    pub fn for_picture(width: u32, height: u32, frame_rate: FrameRate) -> Self {
        Self {
            version: VERSION,
            frame_width: width.div_ceil(16) * 16,
            frame_height: height.div_ceil(16) * 16,
            pic_width: width,
            pic_height: height,
            pic_x: 0,
            pic_y: 0,
            fps_numerator: frame_rate.numerator,
            fps_denominator: frame_rate.denominator,
            aspect_numerator: 1,
            aspect_denominator: 1,
            colorspace: Colorspace::Unspecified,
            pixel_format: PixelFormat::Yuv420,
            target_bitrate: 0,
            quality: 48,
            keyframe_granule_shift: 6,
        }
    }

    /// Parse an identification header packet.
    pub fn parse(data: &[u8]) -> Result<Self, TheoraError> {
        if data.len() < IDENTIFICATION_LEN {
            return Err(TheoraError::Truncated(HeaderKind::Identification));
        }
        let mut r = BitReader::endian(&data[HEADER_PREFIX_LEN..], BigEndian);

        let version = (r.read::<u8>(8)?, r.read::<u8>(8)?, r.read::<u8>(8)?);
        if version.0 != VERSION.0 || version.1 > VERSION.1 {
            return Err(TheoraError::UnsupportedVersion(version.0, version.1, version.2));
        }

        let frame_width = r.read::<u32>(16)? * 16;
        let frame_height = r.read::<u32>(16)? * 16;
        let pic_width = r.read::<u32>(24)?;
        let pic_height = r.read::<u32>(24)?;
        let pic_x = r.read::<u32>(8)?;
        let pic_y_from_bottom = r.read::<u32>(8)?;
        let fps_numerator = r.read::<u32>(32)?;
        let fps_denominator = r.read::<u32>(32)?;
        let aspect_numerator = r.read::<u32>(24)?;
        let aspect_denominator = r.read::<u32>(24)?;
        let colorspace = match r.read::<u8>(8)? {
            0 => Colorspace::Unspecified,
            1 => Colorspace::Rec470M,
            2 => Colorspace::Rec470BG,
            other => Colorspace::Unknown(other),
        };
        let target_bitrate = r.read::<u32>(24)?;
        let quality = r.read::<u8>(6)?;
        let keyframe_granule_shift = r.read::<u8>(5)?;
        let pixel_format = match r.read::<u8>(2)? {
            0 => PixelFormat::Yuv420,
            1 => PixelFormat::Reserved,
            2 => PixelFormat::Yuv422,
            _ => PixelFormat::Yuv444,
        };
        let reserved = r.read::<u8>(3)?;

        if frame_width == 0 || frame_height == 0 {
            return Err(TheoraError::invalid("frame size", "zero macroblocks"));
        }
        if pic_width + pic_x > frame_width || pic_height + pic_y_from_bottom > frame_height {
            return Err(TheoraError::invalid(
                "picture region",
                format!(
                    "{pic_width}x{pic_height}+{pic_x}+{pic_y_from_bottom} outside {frame_width}x{frame_height} frame"
                ),
            ));
        }
        if fps_numerator == 0 || fps_denominator == 0 {
            return Err(TheoraError::invalid(
                "frame rate",
                format!("{fps_numerator}/{fps_denominator}"),
            ));
        }
        if pixel_format == PixelFormat::Reserved {
            return Err(TheoraError::invalid("pixel format", "reserved value"));
        }
        if reserved != 0 {
            return Err(TheoraError::invalid("reserved bits", format!("{reserved:#05b}")));
        }

        Ok(Self {
            version,
            frame_width,
            frame_height,
            pic_width,
            pic_height,
            pic_x,
            pic_y: frame_height - pic_height - pic_y_from_bottom,
            fps_numerator,
            fps_denominator,
            aspect_numerator,
            aspect_denominator,
            colorspace,
            pixel_format,
            target_bitrate,
            quality,
            keyframe_granule_shift,
        })
    }

    pub fn geometry(&self) -> PictureGeometry {
        PictureGeometry {
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            pic_width: self.pic_width,
            pic_height: self.pic_height,
            pic_x: self.pic_x,
            pic_y: self.pic_y,
            pixel_format: self.pixel_format,
            colorspace: self.colorspace,
        }
    }

    pub fn frame_rate(&self) -> FrameRate {
        FrameRate::new(self.fps_numerator, self.fps_denominator)
    }

    pub fn stream_info(&self) -> StreamInfo {
        StreamInfo {
            codec: CODEC_NAME.to_string(),
            version: self.version,
            geometry: self.geometry(),
            frame_rate: self.frame_rate(),
            pixel_aspect: (self.aspect_numerator, self.aspect_denominator),
            target_bitrate: self.target_bitrate,
            quality: self.quality,
            keyframe_granule_shift: self.keyframe_granule_shift,
        }
    }
}

/// Vendor string and `KEY=value` user comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TheoraComment {
    pub vendor: String,
    pub comments: Vec<String>,
}

impl TheoraComment {
    pub fn new(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            comments: Vec::new(),
        }
    }

    pub fn push(&mut self, key: &str, value: &str) {
        self.comments.push(format!("{key}={value}"));
    }

    /// First value for `key`, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.comments.iter().find_map(|comment| {
            let (k, v) = comment.split_once('=')?;
            k.eq_ignore_ascii_case(key).then_some(v)
        })
    }

    /// Parse a comment header packet.
    pub fn parse(data: &[u8]) -> Result<Self, TheoraError> {
        let truncated = || TheoraError::Truncated(HeaderKind::Comment);
        let mut buf = data.get(HEADER_PREFIX_LEN..).ok_or_else(truncated)?;

        let read_string = |buf: &mut &[u8]| -> Result<String, TheoraError> {
            if buf.remaining() < 4 {
                return Err(truncated());
            }
            let len = buf.get_u32_le() as usize;
            if buf.remaining() < len {
                return Err(truncated());
            }
            let text = String::from_utf8_lossy(&buf[..len]).into_owned();
            buf.advance(len);
            Ok(text)
        };

        let vendor = read_string(&mut buf)?;
        if buf.remaining() < 4 {
            return Err(truncated());
        }
        let count = buf.get_u32_le() as usize;
        // Every comment needs at least its length field.
        if count > buf.remaining() / 4 {
            return Err(truncated());
        }
        let comments = (0..count)
            .map(|_| read_string(&mut buf))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { vendor, comments })
    }
}

/// Identify a Theora header packet.
///
/// `Ok(None)` means the packet does not carry the Theora signature at all.
pub fn header_kind(data: &[u8]) -> Result<Option<HeaderKind>, TheoraError> {
    if data.len() < HEADER_PREFIX_LEN
        || data[0] & 0x80 == 0
        || &data[1..HEADER_PREFIX_LEN] != SIGNATURE
    {
        return Ok(None);
    }
    HeaderKind::from_type_byte(data[0])
        .map(Some)
        .ok_or(TheoraError::UnknownHeader(data[0]))
}

/// Headers collected so far for one stream.
#[derive(Debug, Clone, Default)]
pub struct TheoraHeaderState {
    pub info: Option<TheoraInfo>,
    pub comment: Option<TheoraComment>,
    /// Setup header payload after the prefix; opaque to this crate.
    pub setup: Option<Bytes>,
}

impl TheoraHeaderState {
    /// Next header the bitstream must carry, or `None` once all are in.
    pub fn expected(&self) -> Option<HeaderKind> {
        if self.info.is_none() {
            Some(HeaderKind::Identification)
        } else if self.comment.is_none() {
            Some(HeaderKind::Comment)
        } else if self.setup.is_none() {
            Some(HeaderKind::Setup)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_none() && self.comment.is_none() && self.setup.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.expected().is_none()
    }

    /// Consume one header packet.
    pub fn push(&mut self, packet: &Bytes) -> Result<HeaderStatus, TheoraError> {
        let kind = match header_kind(packet)? {
            Some(kind) => kind,
            None if self.is_empty() => return Ok(HeaderStatus::NotThisCodec),
            None => return Err(TheoraError::NotTheora),
        };
        let Some(expected) = self.expected() else {
            return Err(TheoraError::Unexpected(kind));
        };
        if kind != expected {
            return Err(TheoraError::OutOfOrder {
                expected,
                found: kind,
            });
        }

        match kind {
            HeaderKind::Identification => {
                let info = TheoraInfo::parse(packet)?;
                tracing::debug!(
                    version = ?info.version,
                    width = info.pic_width,
                    height = info.pic_height,
                    fps = %info.frame_rate(),
                    pixel_format = %info.pixel_format,
                    "theora identification header"
                );
                self.info = Some(info);
            }
            HeaderKind::Comment => {
                let comment = TheoraComment::parse(packet)?;
                tracing::debug!(
                    vendor = %comment.vendor,
                    comments = comment.comments.len(),
                    "theora comment header"
                );
                self.comment = Some(comment);
            }
            HeaderKind::Setup => {
                let setup = packet.slice(HEADER_PREFIX_LEN..);
                tracing::debug!(len = setup.len(), "theora setup header");
                self.setup = Some(setup);
            }
        }

        Ok(if self.is_complete() {
            HeaderStatus::Complete
        } else {
            HeaderStatus::MoreHeaders
        })
    }
}

/// [`HeaderParser`] for Theora streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct TheoraHeaderParser;

impl HeaderParser for TheoraHeaderParser {
    type Setup = TheoraHeaderState;

    fn name(&self) -> &'static str {
        CODEC_NAME
    }

    fn header_in(&self, state: &mut TheoraHeaderState, packet: &Packet) -> Result<HeaderStatus, CodecError> {
        Ok(state.push(&packet.data)?)
    }

    fn stream_info(&self, state: &TheoraHeaderState) -> Option<StreamInfo> {
        state.info.as_ref().map(TheoraInfo::stream_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::setup_packet;

    fn info() -> TheoraInfo {
        TheoraInfo {
            pic_x: 2,
            pic_y: 4,
            pic_width: 300,
            pic_height: 200,
            ..TheoraInfo::for_picture(320, 240, FrameRate::new(25, 1))
        }
    }

    #[test]
    fn test_parse_identification() {
        let packet = info().to_packet().unwrap();
        assert_eq!(packet.len(), IDENTIFICATION_LEN);
        let parsed = TheoraInfo::parse(&packet).unwrap();
        assert_eq!(parsed, info());
        assert_eq!(parsed.frame_width, 320);
        assert_eq!(parsed.geometry().pic_y, 4);
        assert_eq!(parsed.frame_rate(), FrameRate::new(25, 1));
    }

    #[test]
    fn test_pic_y_is_flipped() {
        let mut packet = info().to_packet().unwrap().to_vec();
        // PICY byte sits after prefix, version, FMBW/FMBH, PICW/PICH and PICX.
        let picy = HEADER_PREFIX_LEN + 3 + 4 + 6 + 1;
        assert_eq!(packet[picy], (240 - 200 - 4) as u8);
        packet[picy] = 0;
        let parsed = TheoraInfo::parse(&packet).unwrap();
        assert_eq!(parsed.pic_y, 40);
    }

    #[test]
    fn test_version_checks() {
        let mut packet = info().to_packet().unwrap().to_vec();
        packet[HEADER_PREFIX_LEN + 1] = 3;
        assert!(matches!(
            TheoraInfo::parse(&packet),
            Err(TheoraError::UnsupportedVersion(3, 3, 1))
        ));
        packet[HEADER_PREFIX_LEN] = 4;
        packet[HEADER_PREFIX_LEN + 1] = 0;
        assert!(matches!(
            TheoraInfo::parse(&packet),
            Err(TheoraError::UnsupportedVersion(4, 0, 1))
        ));
    }

    #[test]
    fn test_invalid_fields() {
        let zero_fps = TheoraInfo {
            fps_denominator: 0,
            ..info()
        };
        let packet = zero_fps.to_packet().unwrap();
        assert!(matches!(
            TheoraInfo::parse(&packet),
            Err(TheoraError::InvalidField { field: "frame rate", .. })
        ));

        let reserved = TheoraInfo {
            pixel_format: PixelFormat::Reserved,
            ..info()
        };
        let packet = reserved.to_packet().unwrap();
        assert!(matches!(
            TheoraInfo::parse(&packet),
            Err(TheoraError::InvalidField { field: "pixel format", .. })
        ));

        assert!(matches!(
            TheoraInfo::parse(&info().to_packet().unwrap()[..30]),
            Err(TheoraError::Truncated(HeaderKind::Identification))
        ));
    }

    #[test]
    fn test_comment_roundtrip_and_lookup() {
        let mut comment = TheoraComment::new("Xiph.Org libtheora");
        comment.push("TITLE", "clip");
        comment.push("encoder", "test");
        let parsed = TheoraComment::parse(&comment.to_packet()).unwrap();
        assert_eq!(parsed, comment);
        assert_eq!(parsed.get("title"), Some("clip"));
        assert_eq!(parsed.get("ENCODER"), Some("test"));
        assert_eq!(parsed.get("artist"), None);
    }

    #[test]
    fn test_comment_truncated() {
        let packet = TheoraComment::new("vendor").to_packet();
        assert!(matches!(
            TheoraComment::parse(&packet[..packet.len() - 2]),
            Err(TheoraError::Truncated(HeaderKind::Comment))
        ));

        // Claims a billion comments.
        let mut packet = packet.to_vec();
        let count_at = packet.len() - 4;
        packet[count_at..].copy_from_slice(&1_000_000_000u32.to_le_bytes());
        assert!(TheoraComment::parse(&packet).is_err());
    }

    #[test]
    fn test_header_kind_detection() {
        assert_eq!(header_kind(b"\x80theora").unwrap(), Some(HeaderKind::Identification));
        assert_eq!(header_kind(b"\x01vorbis").unwrap(), None);
        assert_eq!(header_kind(b"\x80theor").unwrap(), None);
        assert!(matches!(header_kind(b"\x85theora"), Err(TheoraError::UnknownHeader(0x85))));
    }

    #[test]
    fn test_state_sequence() {
        let mut state = TheoraHeaderState::default();
        assert_eq!(state.push(&Bytes::from_static(b"\x01vorbis")).unwrap(), HeaderStatus::NotThisCodec);

        assert_eq!(state.push(&info().to_packet().unwrap()).unwrap(), HeaderStatus::MoreHeaders);
        assert!(matches!(
            state.push(&setup_packet(b"tables")),
            Err(TheoraError::OutOfOrder {
                expected: HeaderKind::Comment,
                found: HeaderKind::Setup
            })
        ));
        assert_eq!(
            state.push(&TheoraComment::new("v").to_packet()).unwrap(),
            HeaderStatus::MoreHeaders
        );
        assert!(matches!(
            state.push(&Bytes::from_static(b"\x00data")),
            Err(TheoraError::NotTheora)
        ));
        assert_eq!(state.push(&setup_packet(b"tables")).unwrap(), HeaderStatus::Complete);
        assert_eq!(state.setup.as_deref(), Some(&b"tables"[..]));
        assert!(matches!(
            state.push(&setup_packet(b"again")),
            Err(TheoraError::Unexpected(HeaderKind::Setup))
        ));
    }

    #[test]
    fn test_parser_maps_errors() {
        let parser = TheoraHeaderParser;
        let mut state = TheoraHeaderState::default();
        let mut packet = info().to_packet().unwrap().to_vec();
        packet[HEADER_PREFIX_LEN] = 9;
        let err = parser
            .header_in(&mut state, &Packet::new(packet, 0))
            .unwrap_err();
        assert!(matches!(err, CodecError::VersionUnsupported(_)));
        assert!(parser.stream_info(&state).is_none());
    }
}

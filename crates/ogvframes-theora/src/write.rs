//! Header packet encoding, for fixtures and remuxing tools.

use bitstream_io::{BigEndian, BitWrite, BitWriter};
use bytes::{BufMut, Bytes, BytesMut};
use ogvframes_media::{Colorspace, PixelFormat};

use crate::error::{HeaderKind, TheoraError};
use crate::header::{TheoraComment, TheoraInfo, HEADER_PREFIX_LEN, SIGNATURE};

fn prefix(kind: HeaderKind, out: &mut BytesMut) {
    out.put_u8(kind.type_byte());
    out.put_slice(SIGNATURE);
}

impl TheoraInfo {
    /// Encode as an identification header packet.
    ///
    /// Field values are written as given; only what cannot be represented
    /// in the bitstream is refused.
    pub fn to_packet(&self) -> Result<Bytes, TheoraError> {
        if self.frame_width % 16 != 0 || self.frame_height % 16 != 0 {
            return Err(TheoraError::invalid(
                "frame size",
                format!("{}x{} is not whole macroblocks", self.frame_width, self.frame_height),
            ));
        }
        let pic_y_from_bottom = self
            .frame_height
            .checked_sub(self.pic_height + self.pic_y)
            .ok_or_else(|| TheoraError::invalid("picture region", "taller than the frame"))?;

        let colorspace = match self.colorspace {
            Colorspace::Unspecified => 0,
            Colorspace::Rec470M => 1,
            Colorspace::Rec470BG => 2,
            Colorspace::Unknown(value) => value,
        };
        let pixel_format: u8 = match self.pixel_format {
            PixelFormat::Yuv420 => 0,
            PixelFormat::Reserved => 1,
            PixelFormat::Yuv422 => 2,
            PixelFormat::Yuv444 => 3,
        };

        let mut w = BitWriter::endian(Vec::with_capacity(35), BigEndian);
        w.write(8, self.version.0)?;
        w.write(8, self.version.1)?;
        w.write(8, self.version.2)?;
        w.write(16, self.frame_width / 16)?;
        w.write(16, self.frame_height / 16)?;
        w.write(24, self.pic_width)?;
        w.write(24, self.pic_height)?;
        w.write(8, self.pic_x)?;
        w.write(8, pic_y_from_bottom)?;
        w.write(32, self.fps_numerator)?;
        w.write(32, self.fps_denominator)?;
        w.write(24, self.aspect_numerator)?;
        w.write(24, self.aspect_denominator)?;
        w.write(8, colorspace)?;
        w.write(24, self.target_bitrate)?;
        w.write(6, self.quality)?;
        w.write(5, self.keyframe_granule_shift)?;
        w.write(2, pixel_format)?;
        w.write(3, 0u8)?;

        let mut out = BytesMut::with_capacity(HEADER_PREFIX_LEN + 35);
        prefix(HeaderKind::Identification, &mut out);
        out.put_slice(&w.into_writer());
        Ok(out.freeze())
    }
}

impl TheoraComment {
    /// Encode as a comment header packet.
    pub fn to_packet(&self) -> Bytes {
        let mut out = BytesMut::new();
        prefix(HeaderKind::Comment, &mut out);
        out.put_u32_le(self.vendor.len() as u32);
        out.put_slice(self.vendor.as_bytes());
        out.put_u32_le(self.comments.len() as u32);
        for comment in &self.comments {
            out.put_u32_le(comment.len() as u32);
            out.put_slice(comment.as_bytes());
        }
        out.freeze()
    }
}

/// Wrap opaque setup data as a setup header packet.
pub fn setup_packet(data: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(HEADER_PREFIX_LEN + data.len());
    prefix(HeaderKind::Setup, &mut out);
    out.put_slice(data);
    out.freeze()
}

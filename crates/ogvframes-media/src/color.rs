//! Studio-range Y'CbCr to interleaved RGB(A) conversion.
//!
//! Only the visible picture rectangle is converted. Chroma is sampled at
//! `((x + pic_x) >> sx, (y + pic_y) >> sy)` where the shifts come from the
//! pixel format; 4:2:2 is recognized but not implemented and is rejected.

use crate::codec::{PictureGeometry, PixelFormat, Plane, YCbCrBuffer};
use crate::frame::{Frame, FrameLayout, PixelLayout};
use crate::{Error, Result};

/// Convert one studio-range sample triple to RGB.
#[inline]
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let luma = 255.0 * (y as f64 - 16.0) / 219.0;
    let cb = cb as f64 - 128.0;
    let cr = cr as f64 - 128.0;

    let r = luma + 255.0 * 0.701 * cr / 112.0;
    let g = luma
        - 255.0 * 0.886 * 0.114 * cb / (112.0 * 0.587)
        - 255.0 * 0.701 * 0.299 * cr / (112.0 * 0.587);
    let b = luma + 255.0 * 0.866 * cb / 112.0;

    [clamp(r), clamp(g), clamp(b)]
}

#[inline]
fn clamp(v: f64) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

/// Converts decoded pictures into a fixed pixel layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorConverter {
    layout: PixelLayout,
}

impl ColorConverter {
    pub fn new(layout: PixelLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Convert the visible picture into a freshly allocated, tightly packed frame.
    pub fn convert(&self, picture: &YCbCrBuffer<'_>, geometry: &PictureGeometry) -> Result<Frame> {
        // Planes are checked against the geometry before the output is sized.
        check_source(picture, geometry)?;
        let layout = FrameLayout::packed(geometry.pic_width, geometry.pic_height, self.layout);
        let mut data = vec![0u8; layout.required_len()];
        convert_into(picture, geometry, &mut data, &layout)?;
        Ok(Frame {
            data,
            width: layout.width,
            height: layout.height,
            pitch: layout.pitch,
            pixel_size: layout.pixel_size,
            offsets: layout.offsets,
            granule_pos: -1,
        })
    }
}

/// Convert the visible picture into a caller-supplied buffer.
///
/// `dst` must hold `layout.required_len()` bytes and `layout` must match the
/// visible picture size.
pub fn convert_into(
    picture: &YCbCrBuffer<'_>,
    geometry: &PictureGeometry,
    dst: &mut [u8],
    layout: &FrameLayout,
) -> Result<()> {
    let (sx, sy) = check_source(picture, geometry)?;
    check_destination(geometry, dst, layout)?;

    let (y_plane, cb_plane, cr_plane) = (picture.y(), picture.cb(), picture.cr());
    let offsets = layout.offsets;

    for row in 0..geometry.pic_height {
        let src_y = (row + geometry.pic_y) as usize;
        let chroma_y = src_y >> sy;
        let luma_row = &y_plane.data[src_y * y_plane.stride..];
        let cb_row = &cb_plane.data[chroma_y * cb_plane.stride..];
        let cr_row = &cr_plane.data[chroma_y * cr_plane.stride..];
        let out_row = &mut dst[row as usize * layout.pitch..];

        for col in 0..geometry.pic_width {
            let src_x = (col + geometry.pic_x) as usize;
            let chroma_x = src_x >> sx;
            let [r, g, b] = ycbcr_to_rgb(luma_row[src_x], cb_row[chroma_x], cr_row[chroma_x]);

            let px = &mut out_row[col as usize * layout.pixel_size..];
            px[offsets.red] = r;
            px[offsets.green] = g;
            px[offsets.blue] = b;
            if let Some(alpha) = offsets.alpha {
                px[alpha] = 255;
            }
        }
    }
    Ok(())
}

/// Check the pixel format, crop rectangle and plane coverage; returns the
/// chroma shift.
fn check_source(picture: &YCbCrBuffer<'_>, geometry: &PictureGeometry) -> Result<(u32, u32)> {
    let (sx, sy) = match geometry.pixel_format {
        PixelFormat::Yuv420 | PixelFormat::Yuv444 => geometry
            .pixel_format
            .chroma_shift()
            .ok_or(Error::UnsupportedPixelFormat(geometry.pixel_format))?,
        other => return Err(Error::UnsupportedPixelFormat(other)),
    };

    if geometry.pic_width == 0 || geometry.pic_height == 0 {
        return Err(Error::invalid_picture("empty visible picture"));
    }
    if !geometry.crop_fits() {
        return Err(Error::invalid_picture(format!(
            "visible {}x{}+{}+{} exceeds coded {}x{}",
            geometry.pic_width,
            geometry.pic_height,
            geometry.pic_x,
            geometry.pic_y,
            geometry.frame_width,
            geometry.frame_height
        )));
    }

    // Last coordinates touched in each plane.
    let max_x = geometry.pic_x + geometry.pic_width - 1;
    let max_y = geometry.pic_y + geometry.pic_height - 1;
    check_plane("Y", picture.y(), max_x, max_y)?;
    check_plane("Cb", picture.cb(), max_x >> sx, max_y >> sy)?;
    check_plane("Cr", picture.cr(), max_x >> sx, max_y >> sy)?;
    Ok((sx, sy))
}

fn check_destination(geometry: &PictureGeometry, dst: &[u8], layout: &FrameLayout) -> Result<()> {
    if layout.width != geometry.pic_width || layout.height != geometry.pic_height {
        return Err(Error::invalid_picture(format!(
            "destination is {}x{}, picture is {}x{}",
            layout.width, layout.height, geometry.pic_width, geometry.pic_height
        )));
    }
    let offsets = layout.offsets;
    let highest = [offsets.red, offsets.green, offsets.blue, offsets.alpha.unwrap_or(0)]
        .into_iter()
        .max()
        .unwrap_or(0);
    if highest >= layout.pixel_size {
        return Err(Error::invalid_picture("channel offset outside pixel"));
    }
    if layout.pitch < layout.width as usize * layout.pixel_size {
        return Err(Error::invalid_picture("destination pitch shorter than a row"));
    }
    if dst.len() < layout.required_len() {
        return Err(Error::invalid_picture(format!(
            "destination holds {} bytes, need {}",
            dst.len(),
            layout.required_len()
        )));
    }
    Ok(())
}

fn check_plane(name: &str, plane: &Plane<'_>, max_x: u32, max_y: u32) -> Result<()> {
    if max_x >= plane.width || max_y >= plane.height || !plane.is_complete() {
        return Err(Error::invalid_picture(format!(
            "{name} plane {}x{} (stride {}, {} bytes) does not cover sample ({max_x}, {max_y})",
            plane.width,
            plane.height,
            plane.stride,
            plane.data.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PlaneBuf;

    fn planes(
        width: u32,
        height: u32,
        format: PixelFormat,
        padding: usize,
    ) -> (PlaneBuf, PlaneBuf, PlaneBuf) {
        let (sx, sy) = format.chroma_shift().unwrap_or((0, 0));
        let cw = (width + (1 << sx) - 1) >> sx;
        let ch = (height + (1 << sy) - 1) >> sy;
        (
            PlaneBuf::filled(width, height, padding, 128),
            PlaneBuf::filled(cw, ch, padding, 128),
            PlaneBuf::filled(cw, ch, padding, 128),
        )
    }

    fn buffer<'a>(p: &'a (PlaneBuf, PlaneBuf, PlaneBuf)) -> YCbCrBuffer<'a> {
        YCbCrBuffer::new(p.0.as_plane(), p.1.as_plane(), p.2.as_plane())
    }

    #[test]
    fn test_reference_points() {
        assert_eq!(ycbcr_to_rgb(128, 128, 128), [130, 130, 130]);
        assert_eq!(ycbcr_to_rgb(16, 128, 128), [0, 0, 0]);
        assert_eq!(ycbcr_to_rgb(235, 128, 128), [255, 255, 255]);
        assert_eq!(ycbcr_to_rgb(255, 128, 128), [255, 255, 255]);
        assert_eq!(ycbcr_to_rgb(0, 128, 128), [0, 0, 0]);
    }

    #[test]
    fn test_chroma_extremes_clamp() {
        // Saturated red: high Cr drives R up and G down.
        let [r, g, b] = ycbcr_to_rgb(81, 90, 240);
        assert!(r > 250);
        assert!(g < 10);
        assert!(b < 10);
    }

    #[test]
    fn test_convert_cropped_420() {
        let mut p = planes(16, 16, PixelFormat::Yuv420, 8);
        // Visible 6x4 at (2, 4). Mark the chroma sample for visible (0, 0):
        // coded (2, 4) -> chroma (1, 2).
        p.2.set(1, 2, 240);
        p.0.set(2, 4, 81);
        p.1.set(1, 2, 90);

        let geometry = PictureGeometry {
            pic_width: 6,
            pic_height: 4,
            pic_x: 2,
            pic_y: 4,
            ..PictureGeometry::full_frame(16, 16, PixelFormat::Yuv420)
        };
        let frame = ColorConverter::new(PixelLayout::Rgba)
            .convert(&buffer(&p), &geometry)
            .unwrap();

        assert_eq!((frame.width, frame.height), (6, 4));
        assert_eq!(frame.pitch, 24);
        assert_eq!(frame.data.len(), 96);

        let corner = frame.rgba_at(0, 0).unwrap();
        assert!(corner[0] > 250);
        assert!(corner[2] < 10);
        assert_eq!(corner[3], 255);
        // (1, 1) maps to coded (3, 5) -> chroma (1, 2): same chroma, neutral luma.
        let shared = frame.rgba_at(1, 1).unwrap();
        assert_eq!(shared[0], 255);
        assert!(shared[0] > shared[2]);
        // (2, 0) maps to coded (4, 4) -> chroma (2, 2): neutral.
        assert_eq!(frame.rgba_at(2, 0).unwrap(), [130, 130, 130, 255]);
    }

    #[test]
    fn test_convert_444_uses_full_chroma() {
        let mut p = planes(4, 2, PixelFormat::Yuv444, 0);
        p.1.set(3, 1, 240);
        let geometry = PictureGeometry::full_frame(4, 2, PixelFormat::Yuv444);
        let frame = ColorConverter::new(PixelLayout::Rgb)
            .convert(&buffer(&p), &geometry)
            .unwrap();

        assert_eq!(frame.pixel_size, 3);
        assert_eq!(frame.rgba_at(2, 1).unwrap(), [130, 130, 130, 255]);
        let blue = frame.rgba_at(3, 1).unwrap();
        assert_eq!(blue[2], 255);
    }

    #[test]
    fn test_422_rejected() {
        let p = planes(4, 4, PixelFormat::Yuv422, 0);
        let geometry = PictureGeometry::full_frame(4, 4, PixelFormat::Yuv422);
        let err = ColorConverter::default()
            .convert(&buffer(&p), &geometry)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedPixelFormat(PixelFormat::Yuv422)));
    }

    #[test]
    fn test_short_plane_rejected() {
        let p = planes(8, 8, PixelFormat::Yuv420, 0);
        let geometry = PictureGeometry::full_frame(16, 16, PixelFormat::Yuv420);
        let err = ColorConverter::default()
            .convert(&buffer(&p), &geometry)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPicture(_)));
    }

    #[test]
    fn test_oversized_geometry_rejected_before_allocation() {
        let p = planes(16, 16, PixelFormat::Yuv420, 0);
        let geometry = PictureGeometry::full_frame(65535 * 16, 65535 * 16, PixelFormat::Yuv420);
        let err = ColorConverter::new(PixelLayout::Rgba)
            .convert(&buffer(&p), &geometry)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPicture(_)));
    }

    #[test]
    fn test_convert_into_padded_destination() {
        let p = planes(4, 4, PixelFormat::Yuv420, 3);
        let geometry = PictureGeometry::full_frame(4, 4, PixelFormat::Yuv420);
        let layout = FrameLayout {
            pitch: 20,
            ..FrameLayout::packed(4, 4, PixelLayout::Bgra)
        };
        let mut dst = vec![7u8; layout.required_len()];
        convert_into(&buffer(&p), &geometry, &mut dst, &layout).unwrap();

        // Padding bytes at the end of each row are left alone.
        assert_eq!(&dst[16..20], &[7, 7, 7, 7]);
        assert_eq!(&dst[20..24], &[130, 130, 130, 255]);
    }

    #[test]
    fn test_destination_too_small() {
        let p = planes(4, 4, PixelFormat::Yuv420, 0);
        let geometry = PictureGeometry::full_frame(4, 4, PixelFormat::Yuv420);
        let layout = FrameLayout::packed(4, 4, PixelLayout::Rgba);
        let mut dst = vec![0u8; 10];
        assert!(matches!(
            convert_into(&buffer(&p), &geometry, &mut dst, &layout),
            Err(Error::InvalidPicture(_))
        ));
    }
}

//! Interleaved RGB(A) frames handed to pixel sinks.

/// Byte offsets of each channel inside one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelOffsets {
    pub red: usize,
    pub green: usize,
    pub blue: usize,
    pub alpha: Option<usize>,
}

/// Interleaved pixel layout of a frame buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum PixelLayout {
    /// R, G, B; 3 bytes per pixel.
    Rgb,
    /// R, G, B, A; 4 bytes per pixel.
    #[default]
    Rgba,
    /// B, G, R, A; 4 bytes per pixel.
    Bgra,
}

impl PixelLayout {
    pub fn pixel_size(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba | Self::Bgra => 4,
        }
    }

    pub fn offsets(self) -> ChannelOffsets {
        match self {
            Self::Rgb => ChannelOffsets {
                red: 0,
                green: 1,
                blue: 2,
                alpha: None,
            },
            Self::Rgba => ChannelOffsets {
                red: 0,
                green: 1,
                blue: 2,
                alpha: Some(3),
            },
            Self::Bgra => ChannelOffsets {
                red: 2,
                green: 1,
                blue: 0,
                alpha: Some(3),
            },
        }
    }
}

/// Geometry of a destination pixel buffer.
///
/// This is the contract any pixel sink must accept: rows `pitch` bytes apart,
/// `pixel_size` bytes per pixel, channels at `offsets` within each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub pixel_size: usize,
    pub offsets: ChannelOffsets,
}

impl FrameLayout {
    /// Tightly packed layout for the given pixel format.
    pub fn packed(width: u32, height: u32, layout: PixelLayout) -> Self {
        let pixel_size = layout.pixel_size();
        Self {
            width,
            height,
            pitch: width as usize * pixel_size,
            pixel_size,
            offsets: layout.offsets(),
        }
    }

    /// Minimum buffer length that holds every addressed byte.
    pub fn required_len(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        (self.height as usize - 1) * self.pitch + self.width as usize * self.pixel_size
    }
}

/// A converted picture plus its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Bytes between the starts of consecutive rows.
    pub pitch: usize,
    /// Bytes per pixel.
    pub pixel_size: usize,
    pub offsets: ChannelOffsets,
    /// Granule position of the packet the picture was decoded from; not
    /// interpreted.
    pub granule_pos: i64,
}

impl Frame {
    pub fn layout(&self) -> FrameLayout {
        FrameLayout {
            width: self.width,
            height: self.height,
            pitch: self.pitch,
            pixel_size: self.pixel_size,
            offsets: self.offsets,
        }
    }

    /// RGBA value at (x, y); alpha reads as 255 for layouts without it.
    pub fn rgba_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let base = y as usize * self.pitch + x as usize * self.pixel_size;
        let px = self.data.get(base..base + self.pixel_size)?;
        Some([
            px[self.offsets.red],
            px[self.offsets.green],
            px[self.offsets.blue],
            self.offsets.alpha.map_or(255, |a| px[a]),
        ])
    }

    /// Copy into an `image` RGBA buffer.
    #[cfg(feature = "image")]
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            image::Rgba(self.rgba_at(x, y).unwrap_or([0, 0, 0, 255]))
        })
    }
}

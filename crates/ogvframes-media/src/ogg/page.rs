//! Ogg page representation and serialization.

use bytes::Bytes;
use crc::{Algorithm, Crc};

/// Capture pattern at the start of every page.
pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// Fixed part of the page header, before the segment table.
pub const HEADER_LEN: usize = 27;

/// Maximum number of lacing values in one page.
pub const MAX_SEGMENTS: usize = 255;

/// Ogg page checksum: CRC-32, polynomial 0x04C11DB7, zero init, no reflection.
const OGG_CRC: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x04c1_1db7,
    init: 0,
    refin: false,
    refout: false,
    xorout: 0,
    check: 0x89a1_897f,
    residue: 0,
};

pub(crate) const CRC: Crc<u32> = Crc::<u32>::new(&OGG_CRC);

/// Offset of the checksum field inside the header.
pub(crate) const CRC_OFFSET: usize = 22;

/// Header type flags of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageFlags(u8);

impl PageFlags {
    /// First segment continues a packet from the previous page.
    pub const CONTINUED: u8 = 0x01;
    /// First page of a logical stream.
    pub const BEGINNING_OF_STREAM: u8 = 0x02;
    /// Last page of a logical stream.
    pub const END_OF_STREAM: u8 = 0x04;

    /// Wrap a raw header type byte.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw header type byte.
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_continued(self) -> bool {
        self.0 & Self::CONTINUED != 0
    }

    pub fn is_bos(self) -> bool {
        self.0 & Self::BEGINNING_OF_STREAM != 0
    }

    pub fn is_eos(self) -> bool {
        self.0 & Self::END_OF_STREAM != 0
    }

    /// Return a copy with the given flag bits set.
    pub fn with(self, bits: u8) -> Self {
        Self(self.0 | bits)
    }
}

/// A single Ogg page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Logical stream serial number.
    pub serial: u32,
    /// Page sequence number within the logical stream.
    pub sequence: u32,
    /// Codec-defined granule position (-1 when no packet ends on this page).
    pub granule_pos: i64,
    /// Header type flags.
    pub flags: PageFlags,
    /// Lacing values, one per segment.
    pub segments: Vec<u8>,
    /// Page payload (concatenated segments).
    pub body: Bytes,
}

impl Page {
    pub fn is_bos(&self) -> bool {
        self.flags.is_bos()
    }

    pub fn is_eos(&self) -> bool {
        self.flags.is_eos()
    }

    pub fn is_continued(&self) -> bool {
        self.flags.is_continued()
    }

    /// Number of packets that end on this page.
    pub fn packets_completed(&self) -> usize {
        self.segments.iter().filter(|&&lacing| lacing < 255).count()
    }

    /// Total encoded size of the page in bytes.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.segments.len() + self.body.len()
    }

    /// Serialize the page, computing its checksum.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(CAPTURE_PATTERN);
        out.push(0); // stream structure version
        out.push(self.flags.bits());
        out.extend_from_slice(&self.granule_pos.to_le_bytes());
        out.extend_from_slice(&self.serial.to_le_bytes());
        out.extend_from_slice(&self.sequence.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.push(self.segments.len() as u8);
        out.extend_from_slice(&self.segments);
        out.extend_from_slice(&self.body);

        let crc = CRC.checksum(&out);
        out[CRC_OFFSET..CRC_OFFSET + 4].copy_from_slice(&crc.to_le_bytes());
        out
    }
}

/// Checksum of an encoded page, treating the stored checksum field as zero.
pub(crate) fn page_checksum(page: &[u8]) -> u32 {
    let mut digest = CRC.digest();
    digest.update(&page[..CRC_OFFSET]);
    digest.update(&[0; 4]);
    digest.update(&page[CRC_OFFSET + 4..]);
    digest.finalize()
}

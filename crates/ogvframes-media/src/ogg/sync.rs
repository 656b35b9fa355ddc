//! Page synchronization: locating and verifying pages in a raw byte stream.

use bytes::{Buf, BytesMut};

use super::page::{page_checksum, Page, PageFlags, CAPTURE_PATTERN, CRC_OFFSET, HEADER_LEN};
use crate::{Error, Result};

/// Default number of bytes that may be skipped while hunting for a page
/// before sync is considered lost.
pub const DEFAULT_RESYNC_LIMIT: usize = 64 * 1024;

/// Push-style page synchronization primitive.
///
/// Bytes are fed in arbitrary fragments; complete, verified pages are pulled
/// out one at a time.
pub trait PageSync {
    /// Append raw bytes from the byte source.
    fn feed(&mut self, data: &[u8]);

    /// Extract the next complete page.
    ///
    /// Returns `Ok(None)` when more data is needed and an error when sync is
    /// unrecoverably lost.
    fn page_out(&mut self) -> Result<Option<Page>>;

    /// Discard all buffered data and sync state.
    fn reset(&mut self);

    /// Bytes currently buffered but not yet emitted as pages.
    fn buffered(&self) -> usize;
}

/// Ogg page synchronizer with checksum verification and bounded resync.
#[derive(Debug)]
pub struct OggSync {
    buf: BytesMut,
    skipped: usize,
    resync_limit: usize,
}

impl OggSync {
    /// Create a synchronizer that gives up after `resync_limit` bytes of garbage.
    pub fn new(resync_limit: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(8 * 1024),
            skipped: 0,
            resync_limit,
        }
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.buf.advance(n);
        self.skipped += n;
        if self.skipped > self.resync_limit {
            return Err(Error::framing(format!(
                "lost sync: skipped {} bytes without finding a valid page",
                self.skipped
            )));
        }
        Ok(())
    }

    /// Drop bytes up to the next candidate capture pattern.
    fn hunt(&mut self) -> Result<()> {
        let next = self.buf[1..]
            .windows(CAPTURE_PATTERN.len())
            .position(|w| w == CAPTURE_PATTERN)
            .map(|pos| pos + 1);

        match next {
            Some(pos) => self.skip(pos),
            None => {
                // A capture pattern may straddle the next feed.
                let keep = (CAPTURE_PATTERN.len() - 1).min(self.buf.len());
                let drop = self.buf.len() - keep;
                self.skip(drop)
            }
        }
    }
}

impl Default for OggSync {
    fn default() -> Self {
        Self::new(DEFAULT_RESYNC_LIMIT)
    }
}

impl PageSync for OggSync {
    fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    fn page_out(&mut self) -> Result<Option<Page>> {
        loop {
            if self.buf.len() < CAPTURE_PATTERN.len() {
                return Ok(None);
            }

            if &self.buf[..CAPTURE_PATTERN.len()] != CAPTURE_PATTERN {
                self.hunt()?;
                continue;
            }

            if self.buf.len() < HEADER_LEN {
                return Ok(None);
            }

            if self.buf[4] != 0 {
                tracing::trace!(version = self.buf[4], "unsupported page version, resyncing");
                self.skip(1)?;
                continue;
            }

            let segment_count = self.buf[26] as usize;
            let header_len = HEADER_LEN + segment_count;
            if self.buf.len() < header_len {
                return Ok(None);
            }

            let body_len: usize = self.buf[HEADER_LEN..header_len]
                .iter()
                .map(|&lacing| lacing as usize)
                .sum();
            let total = header_len + body_len;
            if self.buf.len() < total {
                return Ok(None);
            }

            let stored = u32::from_le_bytes([
                self.buf[CRC_OFFSET],
                self.buf[CRC_OFFSET + 1],
                self.buf[CRC_OFFSET + 2],
                self.buf[CRC_OFFSET + 3],
            ]);
            let computed = page_checksum(&self.buf[..total]);
            if stored != computed {
                tracing::warn!(
                    stored = format_args!("{stored:#010x}"),
                    computed = format_args!("{computed:#010x}"),
                    "page checksum mismatch, resyncing"
                );
                self.skip(1)?;
                continue;
            }

            if self.skipped > 0 {
                tracing::warn!(skipped = self.skipped, "resynchronized on page boundary");
                self.skipped = 0;
            }

            let raw = self.buf.split_to(total).freeze();
            let page = Page {
                flags: PageFlags::from_bits(raw[5]),
                granule_pos: i64::from_le_bytes([
                    raw[6], raw[7], raw[8], raw[9], raw[10], raw[11], raw[12], raw[13],
                ]),
                serial: u32::from_le_bytes([raw[14], raw[15], raw[16], raw[17]]),
                sequence: u32::from_le_bytes([raw[18], raw[19], raw[20], raw[21]]),
                segments: raw[HEADER_LEN..header_len].to_vec(),
                body: raw.slice(header_len..),
            };

            tracing::trace!(
                serial = page.serial,
                sequence = page.sequence,
                len = total,
                "page synchronized"
            );
            return Ok(Some(page));
        }
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.skipped = 0;
    }

    fn buffered(&self) -> usize {
        self.buf.len()
    }
}

//! Packet-to-page lacing for one logical stream.
//!
//! Used to produce well-formed Ogg data for fixtures and tooling.

use bytes::{Bytes, BytesMut};

use super::page::MAX_SEGMENTS;
use super::{Page, PageFlags};

#[derive(Debug, Clone, Copy)]
struct Segment {
    lacing: u8,
    ends_packet: bool,
    granule_pos: i64,
}

/// Laces packets of a single logical stream into pages.
#[derive(Debug)]
pub struct PacketWriter {
    serial: u32,
    sequence: u32,
    segments: Vec<Segment>,
    body: BytesMut,
    continued: bool,
    started: bool,
    page_segments: usize,
}

impl PacketWriter {
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            sequence: 0,
            segments: Vec::new(),
            body: BytesMut::new(),
            continued: false,
            started: false,
            page_segments: MAX_SEGMENTS,
        }
    }

    /// Limit the number of lacing values per page, forcing packets to span pages.
    pub fn with_page_segments(mut self, limit: usize) -> Self {
        self.page_segments = limit.clamp(1, MAX_SEGMENTS);
        self
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Queue a packet with the granule position to report once it completes.
    pub fn push(&mut self, data: &[u8], granule_pos: i64) {
        let full = data.len() / 255;
        for _ in 0..full {
            self.segments.push(Segment {
                lacing: 255,
                ends_packet: false,
                granule_pos,
            });
        }
        self.segments.push(Segment {
            lacing: (data.len() % 255) as u8,
            ends_packet: true,
            granule_pos,
        });
        self.body.extend_from_slice(data);
    }

    /// Emit every queued segment as pages. `eos` marks the final page.
    pub fn flush(&mut self, eos: bool) -> Vec<Page> {
        let mut pages = Vec::new();
        while !self.segments.is_empty() {
            let take = self.page_segments.min(self.segments.len());
            let chunk: Vec<Segment> = self.segments.drain(..take).collect();
            let body_len: usize = chunk.iter().map(|s| s.lacing as usize).sum();
            let body: Bytes = self.body.split_to(body_len).freeze();

            let granule_pos = chunk
                .iter()
                .rev()
                .find(|s| s.ends_packet)
                .map_or(-1, |s| s.granule_pos);

            let mut flags = PageFlags::default();
            if self.continued {
                flags = flags.with(PageFlags::CONTINUED);
            }
            if !self.started {
                flags = flags.with(PageFlags::BEGINNING_OF_STREAM);
                self.started = true;
            }
            if eos && self.segments.is_empty() {
                flags = flags.with(PageFlags::END_OF_STREAM);
            }
            self.continued = chunk.last().is_some_and(|s| !s.ends_packet);

            pages.push(Page {
                serial: self.serial,
                sequence: self.sequence,
                granule_pos,
                flags,
                segments: chunk.iter().map(|s| s.lacing).collect(),
                body,
            });
            self.sequence = self.sequence.wrapping_add(1);
        }
        pages
    }
}

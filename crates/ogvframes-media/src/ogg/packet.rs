//! Packet reassembly from the pages of one logical stream.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

use super::Page;
use crate::{Error, Result};

/// A logical packet reassembled from one or more pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet payload.
    pub data: Bytes,
    /// Granule position of the page this packet completed on, or -1 when
    /// another packet completed after it on the same page.
    pub granule_pos: i64,
    /// Zero-based packet number within the logical stream.
    pub packet_no: u64,
    /// First packet of the logical stream.
    pub bos: bool,
    /// Last packet of the logical stream.
    pub eos: bool,
}

impl Packet {
    /// Build a standalone packet, mainly for driving codecs directly.
    pub fn new(data: impl Into<Bytes>, packet_no: u64) -> Self {
        Self {
            data: data.into(),
            granule_pos: -1,
            packet_no,
            bos: packet_no == 0,
            eos: false,
        }
    }
}

/// Per-stream lacing state: turns pages into packets.
#[derive(Debug)]
pub struct Reassembler {
    serial: u32,
    expected_sequence: Option<u32>,
    partial: BytesMut,
    partial_active: bool,
    ready: VecDeque<Packet>,
    next_packet_no: u64,
    eos: bool,
}

impl Reassembler {
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            expected_sequence: None,
            partial: BytesMut::new(),
            partial_active: false,
            ready: VecDeque::new(),
            next_packet_no: 0,
            eos: false,
        }
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Whether an end-of-stream page has been seen.
    pub fn is_eos(&self) -> bool {
        self.eos
    }

    /// Number of complete packets waiting to be pulled.
    pub fn pending(&self) -> usize {
        self.ready.len()
    }

    /// Inject a page, queueing every packet that completes on it.
    pub fn page_in(&mut self, page: &Page) -> Result<()> {
        if page.serial != self.serial {
            return Err(Error::framing(format!(
                "page serial {:#010x} injected into stream {:#010x}",
                page.serial, self.serial
            )));
        }

        if let Some(expected) = self.expected_sequence {
            if page.sequence != expected {
                tracing::warn!(
                    serial = self.serial,
                    expected,
                    found = page.sequence,
                    "page sequence gap, dropping partial packet"
                );
                self.drop_partial();
            }
        }
        self.expected_sequence = Some(page.sequence.wrapping_add(1));

        if !page.is_continued() && self.partial_active {
            tracing::warn!(
                serial = self.serial,
                sequence = page.sequence,
                "unterminated packet before fresh page, dropping it"
            );
            self.drop_partial();
        }

        let body_len: usize = page.segments.iter().map(|&l| l as usize).sum();
        if body_len != page.body.len() {
            return Err(Error::framing(format!(
                "page body is {} bytes but lacing describes {}",
                page.body.len(),
                body_len
            )));
        }

        // Continued segments with nothing to continue are skipped.
        let mut skipping = page.is_continued() && !self.partial_active;
        let last_end = page.segments.iter().rposition(|&l| l < 255);
        let mut offset = 0usize;

        for (index, &lacing) in page.segments.iter().enumerate() {
            let len = lacing as usize;
            let segment = &page.body[offset..offset + len];
            offset += len;

            if skipping {
                if lacing < 255 {
                    skipping = false;
                }
                continue;
            }

            self.partial.extend_from_slice(segment);
            self.partial_active = true;

            if lacing < 255 {
                let is_last = Some(index) == last_end;
                let packet = Packet {
                    data: self.partial.split().freeze(),
                    granule_pos: if is_last { page.granule_pos } else { -1 },
                    packet_no: self.next_packet_no,
                    bos: self.next_packet_no == 0,
                    eos: is_last && page.is_eos(),
                };
                self.partial_active = false;
                self.next_packet_no += 1;
                self.ready.push_back(packet);
            }
        }

        if page.is_eos() {
            self.eos = true;
        }
        Ok(())
    }

    /// Pull the next complete packet.
    pub fn packet_out(&mut self) -> Option<Packet> {
        self.ready.pop_front()
    }

    /// Look at the next complete packet without consuming it.
    pub fn peek(&self) -> Option<&Packet> {
        self.ready.front()
    }

    fn drop_partial(&mut self) {
        self.partial.clear();
        self.partial_active = false;
    }
}

//! Per-logical-stream state and the serial-keyed stream table.

use std::collections::HashMap;
use std::fmt;

use crate::codec::{Codec, StreamInfo};
use crate::decoder::FrameDecoder;
use crate::ogg::{Packet, Page, Reassembler};
use crate::{Error, Result};

/// Why a stream was excluded from decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectReason {
    /// The leading packet is not the target codec.
    NotThisCodec,
    /// The target codec, but a version this build cannot decode.
    VersionUnsupported(String),
    /// The leading packet claimed the target codec but did not parse.
    HeaderCorrupt(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotThisCodec => write!(f, "not the target codec"),
            Self::VersionUnsupported(v) => write!(f, "unsupported version ({v})"),
            Self::HeaderCorrupt(msg) => write!(f, "corrupt header ({msg})"),
        }
    }
}

/// Where a stream is in its header/data life cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamPhase {
    /// No packet has been classified yet.
    Probing,
    /// Recognized as the target codec; collecting header packets.
    Headers,
    /// Headers complete and a decode context allocated.
    Ready,
    /// Permanently excluded from decoding.
    Rejected(RejectReason),
    /// Target codec, but another stream was already selected for output.
    Ignored,
}

impl StreamPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Probing => "probing",
            Self::Headers => "headers",
            Self::Ready => "ready",
            Self::Rejected(_) => "rejected",
            Self::Ignored => "ignored",
        }
    }
}

/// State of one logical stream.
pub struct StreamEntry<C: Codec> {
    serial: u32,
    reassembler: Reassembler,
    pub(crate) phase: StreamPhase,
    headers_complete: bool,
    pub(crate) setup: C::Setup,
    info: Option<StreamInfo>,
    decoder: Option<FrameDecoder<C::Context>>,
    packets: u64,
    pages: u64,
}

impl<C: Codec> StreamEntry<C> {
    fn new(serial: u32) -> Self {
        Self {
            serial,
            reassembler: Reassembler::new(serial),
            phase: StreamPhase::Probing,
            headers_complete: false,
            setup: C::Setup::default(),
            info: None,
            decoder: None,
            packets: 0,
            pages: 0,
        }
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn phase(&self) -> &StreamPhase {
        &self.phase
    }

    /// Sticky flag: set once, when the decode context is allocated.
    pub fn headers_complete(&self) -> bool {
        self.headers_complete
    }

    /// Whether the stream was recognized as the target codec and selected.
    pub fn is_recognized(&self) -> bool {
        matches!(self.phase, StreamPhase::Headers | StreamPhase::Ready)
    }

    pub fn info(&self) -> Option<&StreamInfo> {
        self.info.as_ref()
    }

    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    pub(crate) fn decoder_mut(&mut self) -> Option<&mut FrameDecoder<C::Context>> {
        self.decoder.as_mut()
    }

    /// Packets pulled from this stream so far.
    pub fn packet_count(&self) -> u64 {
        self.packets
    }

    /// Pages routed to this stream so far.
    pub fn page_count(&self) -> u64 {
        self.pages
    }

    pub fn is_eos(&self) -> bool {
        self.reassembler.is_eos()
    }

    /// Reassembled packets not yet pulled.
    pub fn pending_packets(&self) -> usize {
        self.reassembler.pending()
    }

    fn page_in(&mut self, page: &Page) -> Result<()> {
        self.pages += 1;
        self.reassembler.page_in(page)
    }

    /// Pull the next reassembled packet, counting it.
    pub fn next_packet(&mut self) -> Option<Packet> {
        let packet = self.reassembler.packet_out()?;
        self.packets += 1;
        Some(packet)
    }

    /// Pull and discard every pending packet.
    pub(crate) fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while self.next_packet().is_some() {
            discarded += 1;
        }
        discarded
    }

    /// Finish the header phase: record stream info and allocate the decode
    /// context. Runs at most once per stream.
    pub(crate) fn complete_headers(&mut self, codec: &mut C) -> Result<()> {
        debug_assert!(!self.headers_complete, "headers completed twice");
        if self.headers_complete {
            return Ok(());
        }

        let info = codec.stream_info(&self.setup).ok_or_else(|| Error::HeaderCorrupt {
            serial: self.serial,
            reason: format!("{} headers complete without stream info", codec.name()),
        })?;
        if !info.geometry.crop_fits() {
            return Err(Error::HeaderCorrupt {
                serial: self.serial,
                reason: "visible picture exceeds coded frame".into(),
            });
        }

        let setup = std::mem::take(&mut self.setup);
        let context = codec.alloc(setup).map_err(|e| Error::AllocFailed {
            serial: self.serial,
            reason: e.to_string(),
        })?;

        self.info = Some(info);
        self.decoder = Some(FrameDecoder::new(context));
        self.headers_complete = true;
        self.phase = StreamPhase::Ready;
        Ok(())
    }

    /// Snapshot for reporting.
    pub fn summary(&self) -> StreamSummary {
        StreamSummary {
            serial: self.serial,
            phase: self.phase.clone(),
            info: self.info.clone(),
            headers_complete: self.headers_complete,
            packets: self.packets,
            pages: self.pages,
            eos: self.is_eos(),
            frames_decoded: self.decoder.as_ref().map_or(0, |d| d.frames_decoded()),
            packets_dropped: self.decoder.as_ref().map_or(0, |d| d.packets_dropped()),
        }
    }
}

impl<C: Codec> fmt::Debug for StreamEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamEntry")
            .field("serial", &self.serial)
            .field("phase", &self.phase)
            .field("headers_complete", &self.headers_complete)
            .field("has_decoder", &self.decoder.is_some())
            .field("packets", &self.packets)
            .field("pages", &self.pages)
            .finish()
    }
}

/// Reporting snapshot of one stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamSummary {
    pub serial: u32,
    pub phase: StreamPhase,
    pub info: Option<StreamInfo>,
    pub headers_complete: bool,
    pub packets: u64,
    pub pages: u64,
    pub eos: bool,
    pub frames_decoded: u64,
    pub packets_dropped: u64,
}

/// Logical streams of one container, in discovery order, keyed by serial.
pub struct StreamTable<C: Codec> {
    streams: Vec<StreamEntry<C>>,
    index: HashMap<u32, usize>,
    max_streams: usize,
}

impl<C: Codec> StreamTable<C> {
    pub fn new(max_streams: usize) -> Self {
        Self {
            streams: Vec::new(),
            index: HashMap::new(),
            max_streams,
        }
    }

    pub fn max_streams(&self) -> usize {
        self.max_streams
    }

    /// Route a page to its stream, creating the stream on beginning-of-stream.
    ///
    /// Returns the position of the stream in discovery order.
    pub fn route(&mut self, page: &Page) -> Result<usize> {
        let position = match self.index.get(&page.serial) {
            Some(&position) => position,
            None if page.is_bos() => {
                if self.streams.len() >= self.max_streams {
                    return Err(Error::TooManyStreams {
                        limit: self.max_streams,
                    });
                }
                let position = self.streams.len();
                self.streams.push(StreamEntry::new(page.serial));
                self.index.insert(page.serial, position);
                tracing::debug!(serial = page.serial, position, "new logical stream");
                position
            }
            None => {
                return Err(Error::framing(format!(
                    "page for unknown stream {:#010x} without beginning-of-stream flag",
                    page.serial
                )))
            }
        };

        self.streams[position].page_in(page)?;
        Ok(position)
    }

    pub fn get(&self, position: usize) -> Option<&StreamEntry<C>> {
        self.streams.get(position)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut StreamEntry<C>> {
        self.streams.get_mut(position)
    }

    pub fn by_serial(&self, serial: u32) -> Option<&StreamEntry<C>> {
        self.index.get(&serial).map(|&i| &self.streams[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamEntry<C>> {
        self.streams.iter()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Drop every stream along with its decode context.
    pub fn clear(&mut self) {
        self.streams.clear();
        self.index.clear();
    }
}

impl<C: Codec> fmt::Debug for StreamTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamTable")
            .field("streams", &self.streams)
            .field("max_streams", &self.max_streams)
            .finish()
    }
}

//! Header-only walk over a whole container.

use std::io::Read;

use crate::codec::{
    Codec, CodecError, DecodeContext, HeaderParser, HeaderStatus, PacketStatus, StreamInfo,
    YCbCrBuffer,
};
use crate::demux::Demuxer;
use crate::ogg::Packet;
use crate::options::ContainerOptions;
use crate::stream::StreamSummary;
use crate::Result;

/// Adapts a [`HeaderParser`] into a [`Codec`] whose decode context drops
/// every data packet.
#[derive(Debug, Clone, Default)]
pub struct HeaderOnly<P>(pub P);

/// Decode context of [`HeaderOnly`].
#[derive(Debug, Default)]
pub struct SkipContext;

impl<P: HeaderParser> HeaderParser for HeaderOnly<P> {
    type Setup = P::Setup;

    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn header_in(&self, setup: &mut P::Setup, packet: &Packet) -> std::result::Result<HeaderStatus, CodecError> {
        self.0.header_in(setup, packet)
    }

    fn stream_info(&self, setup: &P::Setup) -> Option<StreamInfo> {
        self.0.stream_info(setup)
    }
}

impl<P: HeaderParser> Codec for HeaderOnly<P> {
    type Context = SkipContext;

    fn alloc(&mut self, _setup: P::Setup) -> std::result::Result<SkipContext, CodecError> {
        Ok(SkipContext)
    }
}

impl DecodeContext for SkipContext {
    fn packet_in(&mut self, _packet: &Packet) -> std::result::Result<PacketStatus, CodecError> {
        Ok(PacketStatus::Dropped)
    }

    fn ycbcr_out(&mut self) -> std::result::Result<YCbCrBuffer<'_>, CodecError> {
        Err(CodecError::NoPicture)
    }
}

/// What a probe found.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbeReport {
    /// Every logical stream, in discovery order.
    pub streams: Vec<StreamSummary>,
    /// Discovery position of the stream that would be decoded.
    pub selected: Option<usize>,
    pub pages: u64,
    pub bytes: u64,
}

impl ProbeReport {
    pub fn selected_stream(&self) -> Option<&StreamSummary> {
        self.streams.get(self.selected?)
    }
}

/// Read a whole container, classifying every stream and counting its pages
/// and packets, without decoding any data.
///
/// Unlike opening a container, finding no video stream is not an error.
pub fn probe<R: Read, P: HeaderParser>(
    source: R,
    parser: P,
    options: &ContainerOptions,
) -> Result<ProbeReport> {
    let mut demux = Demuxer::new(source, HeaderOnly(parser), options);
    while demux.pump_page()? {
        demux.skip_data();
    }

    let report = ProbeReport {
        streams: demux.table().iter().map(|entry| entry.summary()).collect(),
        selected: demux.selected(),
        pages: demux.reader().pages_read(),
        bytes: demux.reader().bytes_read(),
    };
    tracing::debug!(
        streams = report.streams.len(),
        pages = report.pages,
        bytes = report.bytes,
        "probe finished"
    );
    Ok(report)
}

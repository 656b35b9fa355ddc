//! Page pump shared by containers and probes.

use std::io::{Read, Seek};

use crate::codec::{Codec, StreamInfo};
use crate::color::ColorConverter;
use crate::decoder::DecodeStatus;
use crate::frame::Frame;
use crate::header::HeaderAssembler;
use crate::ogg::{PageReader, Packet};
use crate::options::ContainerOptions;
use crate::stream::{StreamPhase, StreamTable};
use crate::{Error, Result};

/// Result of pulling one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextFrame {
    Frame(Frame),
    /// No packets remain and the byte source is exhausted.
    End,
}

/// Reads pages, routes them to streams and drives each stream's header
/// phase. Data packets of the selected stream stay queued until pulled.
pub(crate) struct Demuxer<R, C: Codec> {
    reader: PageReader<R>,
    codec: C,
    table: StreamTable<C>,
    selected: Option<usize>,
}

impl<R: Read, C: Codec> Demuxer<R, C> {
    pub(crate) fn new(source: R, codec: C, options: &ContainerOptions) -> Self {
        Self {
            reader: PageReader::new(source, options.read_chunk_size, options.resync_limit),
            codec,
            table: StreamTable::new(options.max_streams),
            selected: None,
        }
    }

    pub(crate) fn table(&self) -> &StreamTable<C> {
        &self.table
    }

    pub(crate) fn reader(&self) -> &PageReader<R> {
        &self.reader
    }

    /// Discovery position of the output stream, once one was recognized.
    pub(crate) fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub(crate) fn selected_info(&self) -> Option<&StreamInfo> {
        self.table.get(self.selected?)?.info()
    }

    fn headers_ready(&self) -> bool {
        self.selected
            .and_then(|position| self.table.get(position))
            .is_some_and(|entry| entry.headers_complete())
    }

    /// Read and dispatch one page. Returns `false` at end of input.
    pub(crate) fn pump_page(&mut self) -> Result<bool> {
        let Some(page) = self.reader.next_page()? else {
            return Ok(false);
        };
        tracing::trace!(
            serial = page.serial,
            sequence = page.sequence,
            granule = page.granule_pos,
            len = page.body.len(),
            "page"
        );
        let position = self.table.route(&page)?;
        self.service_stream(position)?;
        Ok(true)
    }

    fn service_stream(&mut self, position: usize) -> Result<()> {
        let Some(entry) = self.table.get_mut(position) else {
            return Ok(());
        };

        let in_headers = matches!(entry.phase(), StreamPhase::Probing | StreamPhase::Headers);
        if in_headers {
            let may_select = self.selected.map_or(true, |s| s == position);
            match HeaderAssembler::drive(&mut self.codec, entry, may_select) {
                Ok(()) | Err(Error::CodecRejected { .. }) => {}
                Err(err) => return Err(err),
            }
            if self.selected.is_none() && entry.is_recognized() {
                tracing::debug!(serial = entry.serial(), position, "output stream selected");
                self.selected = Some(position);
            }
        }

        // Only the output stream keeps data packets queued.
        if self.selected != Some(position) || !entry.headers_complete() {
            entry.discard_pending();
        }
        Ok(())
    }

    /// Pump pages until the output stream has a decode context.
    pub(crate) fn read_headers(&mut self) -> Result<()> {
        while !self.headers_ready() {
            if !self.pump_page()? {
                return Err(match self.selected.and_then(|p| self.table.get(p)) {
                    None => Error::NoVideoStream,
                    Some(entry) => Error::HeaderCorrupt {
                        serial: entry.serial(),
                        reason: "end of input before all headers were read".into(),
                    },
                });
            }
        }
        Ok(())
    }

    /// Next data packet of the output stream, pumping pages as needed.
    /// `None` once the input is exhausted.
    pub(crate) fn next_data_packet(&mut self) -> Result<Option<Packet>> {
        let position = self.selected.ok_or(Error::NoVideoStream)?;
        loop {
            if let Some(packet) = self.table.get_mut(position).and_then(|e| e.next_packet()) {
                return Ok(Some(packet));
            }
            if !self.pump_page()? {
                return Ok(None);
            }
        }
    }

    /// Decode and convert until a frame is produced or the input ends.
    pub(crate) fn next_frame(&mut self, converter: &ColorConverter) -> Result<NextFrame> {
        loop {
            let packet = self.next_data_packet()?;
            let position = self.selected.ok_or(Error::NoVideoStream)?;
            let entry = self.table.get_mut(position).ok_or(Error::NoVideoStream)?;
            let serial = entry.serial();
            let geometry = entry
                .info()
                .map(|info| info.geometry)
                .ok_or(Error::NoVideoStream)?;
            let decoder = entry.decoder_mut().ok_or(Error::NoVideoStream)?;

            let status = decoder
                .decode(packet.as_ref())
                .map_err(|err| Error::from_decode_error(serial, err))?;
            match status {
                DecodeStatus::FrameReady(picture) => {
                    let mut frame = converter.convert(&picture, &geometry)?;
                    frame.granule_pos = packet.as_ref().map_or(-1, |p| p.granule_pos);
                    return Ok(NextFrame::Frame(frame));
                }
                DecodeStatus::PacketDropped => continue,
                DecodeStatus::End => return Ok(NextFrame::End),
            }
        }
    }

    /// Pull and discard everything queued on the output stream.
    pub(crate) fn skip_data(&mut self) -> usize {
        self.selected
            .and_then(|position| self.table.get_mut(position))
            .filter(|entry| entry.headers_complete())
            .map_or(0, |entry| entry.discard_pending())
    }
}

impl<R: Read + Seek, C: Codec> Demuxer<R, C> {
    /// Seek to the start and drop every stream and decode context.
    pub(crate) fn reset(&mut self) -> Result<()> {
        self.reader.rewind()?;
        self.table.clear();
        self.selected = None;
        Ok(())
    }
}

//! Open/next-frame/rewind/close life cycle of one container.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::codec::{Codec, FrameRate, StreamInfo};
use crate::color::ColorConverter;
use crate::demux::{Demuxer, NextFrame};
use crate::options::ContainerOptions;
use crate::stream::StreamSummary;
use crate::{Error, Result};

/// One open container: byte source, page reader, stream table, decode
/// contexts and the color converter for its output stream.
///
/// Any fatal error releases all of that before it is returned; the
/// container then answers every call with [`Error::Closed`].
pub struct Container<R, C: Codec> {
    demux: Option<Demuxer<R, C>>,
    converter: ColorConverter,
}

impl<C: Codec> Container<BufReader<File>, C> {
    /// Open a file and read the headers of its first video stream.
    pub fn open_path(path: impl AsRef<Path>, codec: C, options: ContainerOptions) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening container");
        let file = File::open(path)?;
        Self::open(BufReader::new(file), codec, options)
    }
}

impl<R: Read, C: Codec> Container<R, C> {
    /// Wrap a byte source and read until the output stream's headers are
    /// complete.
    ///
    /// Fails with [`Error::NoVideoStream`] when no stream is recognized
    /// before end of input. Nothing is kept on failure.
    pub fn open(source: R, codec: C, options: ContainerOptions) -> Result<Self> {
        let mut demux = Demuxer::new(source, codec, &options);
        demux.read_headers()?;
        if let Some(info) = demux.selected_info() {
            tracing::info!(
                codec = %info.codec,
                width = info.geometry.pic_width,
                height = info.geometry.pic_height,
                frame_rate = %info.frame_rate,
                "container opened"
            );
        }
        Ok(Self {
            demux: Some(demux),
            converter: ColorConverter::new(options.pixel_layout),
        })
    }

    fn active(&mut self) -> Result<&mut Demuxer<R, C>> {
        self.demux.as_mut().ok_or(Error::Closed)
    }

    fn release_on_fatal<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_fatal() {
                tracing::warn!(error = %err, "fatal container error, releasing resources");
                self.demux = None;
            }
        }
        result
    }

    /// Decode the next frame of the output stream.
    pub fn next_frame(&mut self) -> Result<NextFrame> {
        let converter = self.converter;
        let result = self.active()?.next_frame(&converter);
        self.release_on_fatal(result)
    }

    /// Frame rate of the output stream.
    pub fn frame_rate(&self) -> Result<FrameRate> {
        self.stream_info().map(|info| info.frame_rate)
    }

    /// Header info of the output stream.
    pub fn stream_info(&self) -> Result<&StreamInfo> {
        let demux = self.demux.as_ref().ok_or(Error::Closed)?;
        demux.selected_info().ok_or(Error::NoVideoStream)
    }

    /// Snapshot of every logical stream seen so far; empty once closed.
    pub fn streams(&self) -> Vec<StreamSummary> {
        self.demux
            .as_ref()
            .map(|demux| demux.table().iter().map(|entry| entry.summary()).collect())
            .unwrap_or_default()
    }

    pub fn stream_count(&self) -> usize {
        self.demux.as_ref().map_or(0, |demux| demux.table().len())
    }

    /// Bytes consumed from the source so far.
    pub fn bytes_read(&self) -> u64 {
        self.demux.as_ref().map_or(0, |demux| demux.reader().bytes_read())
    }

    pub fn is_closed(&self) -> bool {
        self.demux.is_none()
    }

    /// Release every decode context, the sync state and the byte source.
    /// Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.demux.take().is_some() {
            tracing::debug!("container closed");
        }
    }
}

impl<R: Read + Seek, C: Codec> Container<R, C> {
    /// Seek back to the start and rebuild all demux and decode state.
    ///
    /// The container keeps its identity; the next frame is the first frame.
    pub fn rewind(&mut self) -> Result<()> {
        let demux = self.active()?;
        let result = demux.reset().and_then(|()| demux.read_headers());
        if result.is_ok() {
            tracing::debug!("container rewound");
        }
        self.release_on_fatal(result)
    }
}

impl<R, C: Codec> fmt::Debug for Container<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("closed", &self.demux.is_none())
            .field("layout", &self.converter.layout())
            .finish()
    }
}

//! Incremental page reader over a byte source.

use std::io::{self, Read, Seek, SeekFrom};

use super::sync::{OggSync, PageSync};
use super::Page;
use crate::{Error, Result};

/// Default size of each read from the byte source.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Page reader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// The sync buffer needs more bytes before a page can be produced.
    NeedData,
    /// The last call produced a page.
    HavePage,
    /// The byte source is exhausted.
    Eof,
    /// Sync was lost or the source failed; the reader is unusable.
    Error,
}

/// Pulls pages from a byte source, reading fixed-size chunks on demand.
#[derive(Debug)]
pub struct PageReader<R, S = OggSync> {
    source: R,
    sync: S,
    chunk: Vec<u8>,
    state: ReaderState,
    bytes_read: u64,
    pages_read: u64,
}

impl<R: Read> PageReader<R> {
    /// Create a reader using the default Ogg synchronizer.
    pub fn new(source: R, chunk_size: usize, resync_limit: usize) -> Self {
        Self::with_sync(source, OggSync::new(resync_limit), chunk_size)
    }
}

impl<R: Read, S: PageSync> PageReader<R, S> {
    /// Create a reader around a custom page synchronizer.
    pub fn with_sync(source: R, sync: S, chunk_size: usize) -> Self {
        Self {
            source,
            sync,
            chunk: vec![0; chunk_size.max(1)],
            state: ReaderState::NeedData,
            bytes_read: 0,
            pages_read: 0,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn is_eof(&self) -> bool {
        self.state == ReaderState::Eof
    }

    /// Total bytes consumed from the source.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Total pages produced.
    pub fn pages_read(&self) -> u64 {
        self.pages_read
    }

    /// Produce the next page, reading from the source as needed.
    ///
    /// Returns `Ok(None)` once the source is exhausted. A page cut short by
    /// end of file is discarded.
    pub fn next_page(&mut self) -> Result<Option<Page>> {
        match self.state {
            ReaderState::Eof => return Ok(None),
            ReaderState::Error => {
                return Err(Error::framing("page reader failed earlier and cannot continue"))
            }
            ReaderState::NeedData | ReaderState::HavePage => {}
        }

        loop {
            match self.sync.page_out() {
                Ok(Some(page)) => {
                    self.state = ReaderState::HavePage;
                    self.pages_read += 1;
                    return Ok(Some(page));
                }
                Ok(None) => {}
                Err(err) => {
                    self.state = ReaderState::Error;
                    return Err(err);
                }
            }

            let n = match self.source.read(&mut self.chunk) {
                Ok(0) => {
                    let leftover = self.sync.buffered();
                    if leftover > 0 {
                        tracing::debug!(leftover, "end of file inside a page, discarding tail");
                    }
                    tracing::debug!(
                        bytes = self.bytes_read,
                        pages = self.pages_read,
                        "end of byte source"
                    );
                    self.state = ReaderState::Eof;
                    return Ok(None);
                }
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.state = ReaderState::Error;
                    return Err(err.into());
                }
            };

            self.bytes_read += n as u64;
            self.sync.feed(&self.chunk[..n]);
            self.state = ReaderState::NeedData;
        }
    }

    /// Drop the reader, returning the byte source.
    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: Read + Seek, S: PageSync> PageReader<R, S> {
    /// Seek the source back to the start and discard all sync state.
    pub fn rewind(&mut self) -> Result<()> {
        self.source.seek(SeekFrom::Start(0))?;
        self.sync.reset();
        self.state = ReaderState::NeedData;
        self.bytes_read = 0;
        self.pages_read = 0;
        Ok(())
    }
}

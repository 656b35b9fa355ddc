//! Ogg container plumbing.
//!
//! - `page` - page layout, flags and checksum
//! - `sync` - locating verified pages in a raw byte stream
//! - `reader` - incremental page reader over a byte source
//! - `packet` - per-stream packet reassembly
//! - `writer` - packet lacing into pages, for fixtures and tooling

mod packet;
mod page;
mod reader;
mod sync;
mod writer;

pub use packet::{Packet, Reassembler};
pub use page::{Page, PageFlags, CAPTURE_PATTERN, HEADER_LEN, MAX_SEGMENTS};
pub use reader::{PageReader, ReaderState, DEFAULT_CHUNK_SIZE};
pub use sync::{OggSync, PageSync, DEFAULT_RESYNC_LIMIT};
#[doc(hidden)]
pub use writer::PacketWriter;

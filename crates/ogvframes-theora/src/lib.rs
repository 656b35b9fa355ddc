//! ogvframes-theora: Theora headers for the ogvframes demuxer.
//!
//! Parses the identification, comment and setup headers of Theora streams
//! and plugs them into [`ogvframes_media`] through [`TheoraHeaderParser`].
//! Picture decoding is left to a [`TheoraBackend`] supplied by the embedder;
//! this workspace ships none, so the `ogvframes` binary only reads headers.
//!
//! # Modules
//!
//! - [`header`] - Header classification and parsing
//! - [`codec`] - [`TheoraCodec`] and the backend seam
//! - `write` - Header packet encoding for fixtures and tooling
//! - [`error`] - Error types

pub mod codec;
pub mod error;
pub mod header;
#[doc(hidden)]
pub mod write;

pub use codec::{TheoraBackend, TheoraCodec, TheoraHeaders};
pub use error::{HeaderKind, TheoraError};
pub use header::{
    header_kind, TheoraComment, TheoraHeaderParser, TheoraHeaderState, TheoraInfo, CODEC_NAME,
};
#[doc(hidden)]
pub use write::setup_packet;

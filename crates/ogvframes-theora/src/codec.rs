//! Theora as a [`Codec`]: header parsing here, picture decoding in a backend.

use bytes::Bytes;
use ogvframes_media::ogg::Packet;
use ogvframes_media::{Codec, CodecError, DecodeContext, HeaderParser, HeaderStatus, StreamInfo};

use crate::header::{TheoraComment, TheoraHeaderParser, TheoraHeaderState, TheoraInfo};

/// The complete header set of a Theora stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TheoraHeaders {
    pub info: TheoraInfo,
    pub comment: TheoraComment,
    /// Setup header payload (quantization and Huffman tables).
    pub setup: Bytes,
}

impl TryFrom<TheoraHeaderState> for TheoraHeaders {
    type Error = CodecError;

    fn try_from(state: TheoraHeaderState) -> Result<Self, Self::Error> {
        match state {
            TheoraHeaderState {
                info: Some(info),
                comment: Some(comment),
                setup: Some(setup),
            } => Ok(Self {
                info,
                comment,
                setup,
            }),
            _ => Err(CodecError::HeaderCorrupt("incomplete Theora header set".into())),
        }
    }
}

/// Picture decoding engine behind [`TheoraCodec`].
///
/// Implementations receive the parsed headers once per stream and return a
/// decode context that turns data packets into Y'CbCr pictures. The
/// embedding application provides the implementation.
pub trait TheoraBackend {
    type Decoder: DecodeContext;

    fn open(&mut self, headers: TheoraHeaders) -> Result<Self::Decoder, CodecError>;
}

/// Theora codec combining the header parser with a decoding backend.
#[derive(Debug, Clone, Default)]
pub struct TheoraCodec<B> {
    parser: TheoraHeaderParser,
    backend: B,
}

impl<B: TheoraBackend> TheoraCodec<B> {
    pub fn new(backend: B) -> Self {
        Self {
            parser: TheoraHeaderParser,
            backend,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: TheoraBackend> HeaderParser for TheoraCodec<B> {
    type Setup = TheoraHeaderState;

    fn name(&self) -> &'static str {
        self.parser.name()
    }

    fn header_in(&self, state: &mut TheoraHeaderState, packet: &Packet) -> Result<HeaderStatus, CodecError> {
        self.parser.header_in(state, packet)
    }

    fn stream_info(&self, state: &TheoraHeaderState) -> Option<StreamInfo> {
        self.parser.stream_info(state)
    }
}

impl<B: TheoraBackend> Codec for TheoraCodec<B> {
    type Context = B::Decoder;

    fn alloc(&mut self, state: TheoraHeaderState) -> Result<B::Decoder, CodecError> {
        let headers = TheoraHeaders::try_from(state)?;
        tracing::debug!(
            width = headers.info.frame_width,
            height = headers.info.frame_height,
            setup_len = headers.setup.len(),
            "opening theora decoder"
        );
        self.backend.open(headers)
    }
}

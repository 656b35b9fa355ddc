//! Error types for ogvframes-theora.

use std::fmt;
use std::io;

use ogvframes_media::CodecError;
use thiserror::Error;

/// The three Theora header packets, in bitstream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    Identification,
    Comment,
    Setup,
}

impl HeaderKind {
    /// Header type byte that opens the packet.
    pub fn type_byte(self) -> u8 {
        match self {
            Self::Identification => 0x80,
            Self::Comment => 0x81,
            Self::Setup => 0x82,
        }
    }

    pub fn from_type_byte(byte: u8) -> Option<Self> {
        match byte {
            0x80 => Some(Self::Identification),
            0x81 => Some(Self::Comment),
            0x82 => Some(Self::Setup),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identification => write!(f, "identification"),
            Self::Comment => write!(f, "comment"),
            Self::Setup => write!(f, "setup"),
        }
    }
}

/// Errors raised while parsing or writing Theora headers.
#[derive(Debug, Error)]
pub enum TheoraError {
    /// The packet does not carry the Theora signature.
    #[error("not a Theora header")]
    NotTheora,

    /// Theora signature with a header type this parser does not know.
    #[error("unknown Theora header type {0:#04x}")]
    UnknownHeader(u8),

    #[error("{0} header is truncated")]
    Truncated(HeaderKind),

    #[error("unsupported Theora version {0}.{1}.{2}")]
    UnsupportedVersion(u8, u8, u8),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("expected {expected} header, found {found} header")]
    OutOfOrder { expected: HeaderKind, found: HeaderKind },

    #[error("{0} header after all headers were read")]
    Unexpected(HeaderKind),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TheoraError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

impl From<TheoraError> for CodecError {
    fn from(err: TheoraError) -> Self {
        match err {
            TheoraError::UnsupportedVersion(major, minor, revision) => {
                CodecError::VersionUnsupported(format!("{major}.{minor}.{revision}"))
            }
            other => CodecError::HeaderCorrupt(other.to_string()),
        }
    }
}

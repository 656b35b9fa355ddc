//! Header phase of a logical stream: classification and setup accumulation.

use crate::codec::{Codec, CodecError, HeaderStatus};
use crate::stream::{RejectReason, StreamEntry, StreamPhase};
use crate::{Error, Result};

/// Drives streams through their header packets.
///
/// The first packet of every stream is offered to the codec for
/// classification. A recognized stream either becomes the output stream
/// (`may_select`) and keeps collecting headers until the codec reports
/// completion, or is marked ignored. Once `headers_complete` is set the
/// assembler never touches the stream again; its remaining packets are data.
#[derive(Debug, Default)]
pub struct HeaderAssembler;

impl HeaderAssembler {
    /// Pull packets from `entry` while it is in its header phase.
    ///
    /// Returns [`Error::CodecRejected`] when the first packet rules the stream
    /// out; callers treat that as non-fatal. Errors on later headers of the
    /// selected stream and allocation failures are fatal.
    pub fn drive<C: Codec>(codec: &mut C, entry: &mut StreamEntry<C>, may_select: bool) -> Result<()> {
        loop {
            let first = match entry.phase {
                StreamPhase::Probing => true,
                StreamPhase::Headers => false,
                _ => return Ok(()),
            };

            let Some(packet) = entry.next_packet() else {
                return Ok(());
            };
            let serial = entry.serial();

            let status = match codec.header_in(&mut entry.setup, &packet) {
                Ok(status) => status,
                Err(err) if first => {
                    let reason = match err {
                        CodecError::VersionUnsupported(v) => RejectReason::VersionUnsupported(v),
                        other => RejectReason::HeaderCorrupt(other.to_string()),
                    };
                    return Err(Self::reject(entry, reason));
                }
                Err(err) => return Err(Error::from_header_error(serial, err)),
            };

            match status {
                HeaderStatus::NotThisCodec if first => {
                    return Err(Self::reject(entry, RejectReason::NotThisCodec));
                }
                HeaderStatus::NotThisCodec => {
                    return Err(Error::HeaderCorrupt {
                        serial,
                        reason: format!("packet {} is not a {} header", packet.packet_no, codec.name()),
                    });
                }
                _ if first && !may_select => {
                    tracing::debug!(
                        serial,
                        codec = codec.name(),
                        "additional video stream ignored"
                    );
                    entry.phase = StreamPhase::Ignored;
                    entry.setup = C::Setup::default();
                    return Ok(());
                }
                HeaderStatus::MoreHeaders => {
                    if first {
                        tracing::debug!(serial, codec = codec.name(), "stream recognized");
                    }
                    entry.phase = StreamPhase::Headers;
                }
                HeaderStatus::Complete => {
                    entry.complete_headers(codec)?;
                    tracing::debug!(
                        serial,
                        codec = codec.name(),
                        header_packets = entry.packet_count(),
                        "all headers read"
                    );
                    return Ok(());
                }
            }
        }
    }

    fn reject<C: Codec>(entry: &mut StreamEntry<C>, reason: RejectReason) -> Error {
        tracing::debug!(serial = entry.serial(), %reason, "stream rejected");
        entry.phase = StreamPhase::Rejected(reason.clone());
        entry.setup = C::Setup::default();
        Error::CodecRejected {
            serial: entry.serial(),
            reason,
        }
    }
}

//! Packet-in / picture-out driver for a stream whose headers are complete.

use crate::codec::{CodecError, DecodeContext, PacketStatus, YCbCrBuffer};
use crate::ogg::Packet;

/// Outcome of one [`FrameDecoder::decode`] call.
#[derive(Debug)]
pub enum DecodeStatus<'a> {
    /// A picture was decoded.
    FrameReady(YCbCrBuffer<'a>),
    /// The packet produced no picture; fetch the next one.
    PacketDropped,
    /// No packets remain and the byte source is exhausted.
    End,
}

/// Owns a decode context and counts what it produced.
#[derive(Debug)]
pub struct FrameDecoder<X> {
    context: X,
    frames: u64,
    dropped: u64,
}

impl<X: DecodeContext> FrameDecoder<X> {
    pub fn new(context: X) -> Self {
        Self {
            context,
            frames: 0,
            dropped: 0,
        }
    }

    /// Decode the next data packet; `None` signals that the source is drained.
    ///
    /// Errors from the codec are fatal for the stream.
    pub fn decode(&mut self, packet: Option<&Packet>) -> Result<DecodeStatus<'_>, CodecError> {
        let Some(packet) = packet else {
            return Ok(DecodeStatus::End);
        };

        match self.context.packet_in(packet)? {
            PacketStatus::Decoded => {
                let picture = self.context.ycbcr_out()?;
                self.frames += 1;
                Ok(DecodeStatus::FrameReady(picture))
            }
            PacketStatus::Dropped => {
                self.dropped += 1;
                tracing::debug!(packet_no = packet.packet_no, "packet dropped by decoder");
                Ok(DecodeStatus::PacketDropped)
            }
        }
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames
    }

    pub fn packets_dropped(&self) -> u64 {
        self.dropped
    }

    pub fn context(&self) -> &X {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PlaneBuf;

    /// Decodes packets whose first byte is non-zero; drops the rest.
    struct FlagContext {
        planes: [PlaneBuf; 3],
    }

    impl DecodeContext for FlagContext {
        fn packet_in(&mut self, packet: &Packet) -> Result<PacketStatus, CodecError> {
            match packet.data.first() {
                Some(0) => Ok(PacketStatus::Dropped),
                Some(&v) => {
                    self.planes[0] = PlaneBuf::filled(2, 2, 0, v);
                    Ok(PacketStatus::Decoded)
                }
                None => Err(CodecError::Decode("empty packet".into())),
            }
        }

        fn ycbcr_out(&mut self) -> Result<YCbCrBuffer<'_>, CodecError> {
            Ok(YCbCrBuffer::new(
                self.planes[0].as_plane(),
                self.planes[1].as_plane(),
                self.planes[2].as_plane(),
            ))
        }
    }

    fn decoder() -> FrameDecoder<FlagContext> {
        FrameDecoder::new(FlagContext {
            planes: [
                PlaneBuf::filled(2, 2, 0, 16),
                PlaneBuf::filled(1, 1, 0, 128),
                PlaneBuf::filled(1, 1, 0, 128),
            ],
        })
    }

    #[test]
    fn test_frame_ready() {
        let mut decoder = decoder();
        let packet = Packet::new(vec![99u8], 3);
        match decoder.decode(Some(&packet)).unwrap() {
            DecodeStatus::FrameReady(picture) => assert_eq!(picture.y().sample(1, 1), Some(99)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(decoder.frames_decoded(), 1);
    }

    #[test]
    fn test_dropped_and_end() {
        let mut decoder = decoder();
        let packet = Packet::new(vec![0u8], 3);
        assert!(matches!(
            decoder.decode(Some(&packet)).unwrap(),
            DecodeStatus::PacketDropped
        ));
        assert!(matches!(decoder.decode(None).unwrap(), DecodeStatus::End));
        assert_eq!(decoder.packets_dropped(), 1);
        assert_eq!(decoder.frames_decoded(), 0);
    }

    #[test]
    fn test_codec_error_propagates() {
        let mut decoder = decoder();
        let packet = Packet::new(Vec::<u8>::new(), 3);
        assert!(matches!(
            decoder.decode(Some(&packet)),
            Err(CodecError::Decode(_))
        ));
    }
}

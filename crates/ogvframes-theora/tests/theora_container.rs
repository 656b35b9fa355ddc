//! Theora streams through the full demux pipeline.

use std::io::Cursor;

use assert_matches::assert_matches;
use bytes::Bytes;
use ogvframes_media::ogg::{Packet, PacketWriter};
use ogvframes_media::{
    probe, CodecError, Container, ContainerOptions, DecodeContext, Error, FrameRate, HeaderOnly,
    NextFrame, PacketStatus, PixelFormat, PlaneBuf, StreamPhase, YCbCrBuffer,
};
use ogvframes_theora::{
    setup_packet, TheoraBackend, TheoraCodec, TheoraComment, TheoraHeaderParser, TheoraHeaders,
    TheoraInfo,
};

/// Paints every plane with the first byte of each data packet as luma.
#[derive(Debug, Clone, Default)]
struct FlatBackend;

struct FlatDecoder {
    info: TheoraInfo,
    planes: [PlaneBuf; 3],
}

impl TheoraBackend for FlatBackend {
    type Decoder = FlatDecoder;

    fn open(&mut self, headers: TheoraHeaders) -> Result<FlatDecoder, CodecError> {
        let info = headers.info;
        let (sx, sy) = info
            .pixel_format
            .chroma_shift()
            .unwrap_or((1, 0));
        let (cw, ch) = (info.frame_width >> sx, info.frame_height >> sy);
        Ok(FlatDecoder {
            planes: [
                PlaneBuf::filled(info.frame_width, info.frame_height, 16, 16),
                PlaneBuf::filled(cw, ch, 8, 128),
                PlaneBuf::filled(cw, ch, 8, 128),
            ],
            info,
        })
    }
}

impl DecodeContext for FlatDecoder {
    fn packet_in(&mut self, packet: &Packet) -> Result<PacketStatus, CodecError> {
        // A zero-length packet repeats the previous frame.
        let Some(&luma) = packet.data.first() else {
            return Ok(PacketStatus::Dropped);
        };
        self.planes[0] = PlaneBuf::filled(self.info.frame_width, self.info.frame_height, 16, luma);
        Ok(PacketStatus::Decoded)
    }

    fn ycbcr_out(&mut self) -> Result<YCbCrBuffer<'_>, CodecError> {
        Ok(YCbCrBuffer::new(
            self.planes[0].as_plane(),
            self.planes[1].as_plane(),
            self.planes[2].as_plane(),
        ))
    }
}

fn theora_packets(info: &TheoraInfo, frames: &[u8]) -> Vec<Bytes> {
    let mut comment = TheoraComment::new("ogvframes test");
    comment.push("TITLE", "flat");
    let mut packets = vec![
        info.to_packet().unwrap(),
        comment.to_packet(),
        setup_packet(&[0xaa; 64]),
    ];
    packets.extend(frames.iter().map(|&luma| Bytes::from(vec![luma; 100])));
    packets
}

/// Vorbis-like audio stream first, then the Theora stream, both interleaved
/// the way muxers lay them out.
fn ogv(info: &TheoraInfo, frames: &[u8]) -> Vec<u8> {
    let video = theora_packets(info, frames);
    let audio: Vec<Bytes> = (0..frames.len() + 1)
        .map(|i| {
            let mut packet = if i == 0 { b"\x01vorbis".to_vec() } else { vec![0u8] };
            packet.extend(vec![i as u8; 50]);
            Bytes::from(packet)
        })
        .collect();

    let mut audio_writer = PacketWriter::new(0x0a0d10);
    let mut video_writer = PacketWriter::new(0x7e0);
    let mut out = Vec::new();

    audio_writer.push(&audio[0], 0);
    video_writer.push(&video[0], 0);
    for page in audio_writer.flush(false).into_iter().chain(video_writer.flush(false)) {
        out.extend(page.encode());
    }
    video_writer.push(&video[1], 0);
    video_writer.push(&video[2], 0);
    for page in video_writer.flush(false) {
        out.extend(page.encode());
    }

    let shift = info.keyframe_granule_shift;
    for (i, packet) in video[3..].iter().enumerate() {
        audio_writer.push(&audio[i + 1], (i as i64 + 1) * 1024);
        for page in audio_writer.flush(i + 1 == frames.len()) {
            out.extend(page.encode());
        }
        video_writer.push(packet, (1i64 << shift) + i as i64);
        for page in video_writer.flush(i + 1 == frames.len()) {
            out.extend(page.encode());
        }
    }
    out
}

fn open(bytes: Vec<u8>) -> Container<Cursor<Vec<u8>>, TheoraCodec<FlatBackend>> {
    Container::open(Cursor::new(bytes), TheoraCodec::new(FlatBackend), ContainerOptions::default())
        .unwrap()
}

#[test]
fn test_decodes_every_frame() {
    let info = TheoraInfo::for_picture(32, 24, FrameRate::new(24000, 1001));
    let mut container = open(ogv(&info, &[16, 126, 235]));

    assert_eq!(container.frame_rate().unwrap(), FrameRate::new(24000, 1001));
    let stream = container.stream_info().unwrap();
    assert_eq!(stream.codec, "theora");
    assert_eq!((stream.geometry.frame_width, stream.geometry.frame_height), (32, 32));

    let mut reds = Vec::new();
    while let NextFrame::Frame(frame) = container.next_frame().unwrap() {
        assert_eq!((frame.width, frame.height), (32, 24));
        reds.push(frame.rgba_at(31, 23).unwrap()[0]);
    }
    assert_eq!(reds, vec![0, 128, 255]);

    let streams = container.streams();
    assert_matches!(streams[0].phase, StreamPhase::Rejected(_));
    assert_eq!(streams[1].phase, StreamPhase::Ready);
}

#[test]
fn test_picture_offset_from_bottom() {
    let info = TheoraInfo {
        pic_width: 20,
        pic_height: 10,
        pic_x: 4,
        pic_y: 2,
        ..TheoraInfo::for_picture(32, 32, FrameRate::new(25, 1))
    };
    let mut container = open(ogv(&info, &[100]));
    let geometry = container.stream_info().unwrap().geometry;
    assert_eq!((geometry.pic_x, geometry.pic_y), (4, 2));

    let NextFrame::Frame(frame) = container.next_frame().unwrap() else {
        panic!("expected a frame");
    };
    assert_eq!((frame.width, frame.height), (20, 10));
}

#[test]
fn test_rewind_repeats_frames() {
    let info = TheoraInfo::for_picture(16, 16, FrameRate::new(25, 1));
    let mut container = open(ogv(&info, &[30, 60, 90]));

    let mut first = Vec::new();
    while let NextFrame::Frame(frame) = container.next_frame().unwrap() {
        first.push(frame);
    }
    container.rewind().unwrap();
    let mut second = Vec::new();
    while let NextFrame::Frame(frame) = container.next_frame().unwrap() {
        second.push(frame);
    }
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[test]
fn test_yuv422_is_reported_not_guessed() {
    let info = TheoraInfo {
        pixel_format: PixelFormat::Yuv422,
        ..TheoraInfo::for_picture(16, 16, FrameRate::new(25, 1))
    };
    let mut container = open(ogv(&info, &[30, 60]));
    assert_matches!(
        container.next_frame(),
        Err(Error::UnsupportedPixelFormat(PixelFormat::Yuv422))
    );
    assert!(!container.is_closed());
}

#[test]
fn test_newer_bitstream_version_is_rejected() {
    let info = TheoraInfo {
        version: (3, 7, 0),
        ..TheoraInfo::for_picture(16, 16, FrameRate::new(25, 1))
    };
    let err = Container::open(
        Cursor::new(ogv(&info, &[30])),
        TheoraCodec::new(FlatBackend),
        ContainerOptions::default(),
    )
    .unwrap_err();
    // The only Theora stream was rejected on its first packet.
    assert_matches!(err, Error::NoVideoStream);
}

#[test]
fn test_probe_reports_headers() {
    let info = TheoraInfo::for_picture(48, 32, FrameRate::new(30, 1));
    let bytes = ogv(&info, &[1, 2, 3, 4]);
    let report = probe(
        Cursor::new(bytes),
        TheoraHeaderParser,
        &ContainerOptions::default(),
    )
    .unwrap();

    assert_eq!(report.streams.len(), 2);
    let video = report.selected_stream().unwrap();
    assert_eq!(video.serial, 0x7e0);
    let stream = video.info.as_ref().unwrap();
    assert_eq!(stream.version, (3, 2, 1));
    assert_eq!(stream.frame_rate, FrameRate::new(30, 1));
    assert_eq!(stream.keyframe_granule_shift, 6);
    assert_eq!(video.packets, 7);
    assert!(video.eos);
}

#[test]
fn test_header_only_codec_yields_no_frames() {
    let info = TheoraInfo::for_picture(16, 16, FrameRate::new(25, 1));
    let mut container = Container::open(
        Cursor::new(ogv(&info, &[10, 20])),
        HeaderOnly(TheoraHeaderParser),
        ContainerOptions::default(),
    )
    .unwrap();
    assert_matches!(container.next_frame(), Ok(NextFrame::End));
    assert_eq!(container.streams()[1].packets_dropped, 2);
}

//! Shared fixtures for integration tests.
//!
//! Writes small Ogg files holding a Theora stream, optionally preceded by
//! an audio-like stream, into a temporary directory.

#![allow(dead_code)]

use std::path::PathBuf;

use bytes::Bytes;
use ogvframes::media::ogg::{Page, PacketWriter};
use ogvframes::media::FrameRate;
use ogvframes::theora::{setup_packet, TheoraComment, TheoraInfo};
use tempfile::TempDir;

pub const VIDEO_SERIAL: u32 = 0x7e0;
pub const AUDIO_SERIAL: u32 = 0x0a0d10;

/// A temp directory that owns the fixture files written into it.
pub struct Fixtures {
    pub dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `bytes` under `name` and return the full path.
    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// A 320x240 Theora clip at 30000/1001 fps with an audio stream first.
    pub fn clip(&self) -> PathBuf {
        let info = TheoraInfo::for_picture(320, 240, FrameRate::new(30000, 1001));
        self.write("clip.ogv", &ogv(&info, 3, true))
    }

    /// An Ogg file with only the audio-like stream.
    pub fn audio_only(&self) -> PathBuf {
        let mut writer = PacketWriter::new(AUDIO_SERIAL);
        writer.push(b"\x01vorbis-ish", 0);
        writer.push(&[0u8; 40], 1024);
        self.write("audio.ogg", &encode(writer.flush(true)))
    }

    pub fn config(&self, contents: &str) -> PathBuf {
        self.write("ogvframes.toml", contents.as_bytes())
    }
}

fn encode(pages: Vec<Page>) -> Vec<u8> {
    pages.iter().flat_map(|page| page.encode()).collect()
}

/// Serialize a Theora stream with `frames` data packets.
pub fn ogv(info: &TheoraInfo, frames: usize, with_audio: bool) -> Vec<u8> {
    let mut comment = TheoraComment::new("ogvframes fixtures");
    comment.push("TITLE", "fixture");

    let mut out = Vec::new();
    let mut audio = PacketWriter::new(AUDIO_SERIAL);
    if with_audio {
        audio.push(b"\x01vorbis-ish", 0);
        out.extend(encode(audio.flush(false)));
    }

    let mut video = PacketWriter::new(VIDEO_SERIAL);
    video.push(&info.to_packet().unwrap(), 0);
    out.extend(encode(video.flush(false)));
    video.push(&comment.to_packet(), 0);
    video.push(&setup_packet(&[0x5a; 32]), 0);
    out.extend(encode(video.flush(false)));

    if with_audio {
        audio.push(&[0u8; 40], 1024);
        out.extend(encode(audio.flush(true)));
    }

    let shift = info.keyframe_granule_shift;
    for i in 0..frames {
        let packet = Bytes::from(vec![0x40 | i as u8; 64]);
        video.push(&packet, (1i64 << shift) + i as i64);
    }
    out.extend(encode(video.flush(true)));
    out
}

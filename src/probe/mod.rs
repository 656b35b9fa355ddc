//! File-level probing for the CLI.

pub use ogvframes_media::{ProbeReport, StreamInfo, StreamPhase, StreamSummary};

use anyhow::{Context, Result};
use ogvframes_media::{probe, Container, ContainerOptions, FrameRate, HeaderOnly};
use ogvframes_theora::TheoraHeaderParser;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Walk every page of an Ogg file and classify its streams as Theora or not.
pub fn probe_file(path: &Path, options: &ContainerOptions) -> Result<ProbeReport> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let reader = BufReader::with_capacity(options.read_chunk_size.max(1), file);
    probe(reader, TheoraHeaderParser, options)
        .with_context(|| format!("Failed to probe {:?}", path))
}

/// Frame rate of the first Theora stream, read from its headers only.
pub fn frame_rate(path: &Path, options: &ContainerOptions) -> Result<FrameRate> {
    let container = Container::open_path(path, HeaderOnly(TheoraHeaderParser), *options)
        .with_context(|| format!("Failed to open {:?}", path))?;
    Ok(container.frame_rate()?)
}

/// Human-readable rendering of a probe report.
pub fn format_report(path: &Path, report: &ProbeReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File: {}", path.display());
    let _ = writeln!(out, "Size: {} bytes", report.bytes);
    let _ = writeln!(out, "Pages: {}", report.pages);

    let _ = writeln!(out, "\nStreams: {}", report.streams.len());
    for (i, stream) in report.streams.iter().enumerate() {
        let marker = if report.selected == Some(i) { "*" } else { " " };
        let _ = write!(
            out,
            " {}[{}] serial {:#010x} {}",
            marker,
            i,
            stream.serial,
            stream.phase.label()
        );
        if let StreamPhase::Rejected(reason) = &stream.phase {
            let _ = write!(out, ": {}", reason);
        }
        let _ = writeln!(out, ", {} pages, {} packets", stream.pages, stream.packets);
        if let Some(info) = &stream.info {
            write_info(&mut out, info);
        }
    }

    if report.selected.is_none() {
        let _ = writeln!(out, "\nNo Theora stream found");
    }
    out
}

fn write_info(out: &mut String, info: &StreamInfo) {
    let g = &info.geometry;
    let (major, minor, rev) = info.version;
    let _ = writeln!(out, "      {} {}.{}.{}", info.codec, major, minor, rev);
    let _ = writeln!(out, "      Frame: {}x{}", g.frame_width, g.frame_height);
    let _ = writeln!(
        out,
        "      Picture: {}x{} at ({}, {})",
        g.pic_width, g.pic_height, g.pic_x, g.pic_y
    );
    let _ = writeln!(
        out,
        "      Frame rate: {} ({:.3} fps)",
        info.frame_rate,
        info.frame_rate.as_f64()
    );
    let _ = writeln!(
        out,
        "      Pixel aspect: {}:{}",
        info.pixel_aspect.0, info.pixel_aspect.1
    );
    let _ = writeln!(out, "      Pixel format: {}", g.pixel_format);
    let _ = writeln!(out, "      Colorspace: {}", g.colorspace);
    if info.target_bitrate > 0 {
        let _ = writeln!(out, "      Bitrate: {} bit/s", info.target_bitrate);
    }
    let _ = writeln!(out, "      Quality: {}", info.quality);
    let _ = writeln!(out, "      Keyframe granule shift: {}", info.keyframe_granule_shift);
}

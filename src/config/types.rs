use ogvframes_media::options::DEFAULT_MAX_STREAMS;
use ogvframes_media::ogg::{DEFAULT_CHUNK_SIZE, DEFAULT_RESYNC_LIMIT};
use ogvframes_media::{ContainerOptions, PixelLayout};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub demux: DemuxConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Options handed to every container the CLI opens.
    pub fn container_options(&self) -> ContainerOptions {
        ContainerOptions {
            max_streams: self.demux.max_streams,
            read_chunk_size: self.demux.read_chunk_size,
            resync_limit: self.demux.resync_limit,
            pixel_layout: self.output.pixel_layout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DemuxConfig {
    /// Maximum logical streams per container
    #[serde(default = "default_max_streams")]
    pub max_streams: usize,

    /// Bytes read from the file per request
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,

    /// Garbage bytes tolerated while hunting for the next page
    #[serde(default = "default_resync_limit")]
    pub resync_limit: usize,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            max_streams: default_max_streams(),
            read_chunk_size: default_read_chunk_size(),
            resync_limit: default_resync_limit(),
        }
    }
}

fn default_max_streams() -> usize {
    DEFAULT_MAX_STREAMS
}

fn default_read_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_resync_limit() -> usize {
    DEFAULT_RESYNC_LIMIT
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Pixel layout of converted frames: "rgb", "rgba" or "bgra"
    #[serde(default)]
    pub pixel_layout: PixelLayout,
}

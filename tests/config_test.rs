//! Configuration loading and validation.

mod common;

use common::Fixtures;
use ogvframes::config::{load_config, load_config_or_default, validate_config, Config};
use ogvframes::media::{ContainerOptions, PixelLayout};

#[test]
fn test_default_config_matches_default_options() {
    let config = Config::default();
    assert_eq!(config.container_options(), ContainerOptions::default());
    validate_config(&config).unwrap();
}

#[test]
fn test_load_full_config() {
    let fixtures = Fixtures::new();
    let path = fixtures.config(
        r#"
[demux]
max_streams = 4
read_chunk_size = 512
resync_limit = 2048

[output]
pixel_layout = "bgra"
"#,
    );

    let config = load_config(&path).unwrap();
    assert_eq!(config.demux.max_streams, 4);
    assert_eq!(config.demux.read_chunk_size, 512);
    assert_eq!(config.demux.resync_limit, 2048);
    assert_eq!(config.output.pixel_layout, PixelLayout::Bgra);

    let options = config.container_options();
    assert_eq!(options.max_streams, 4);
    assert_eq!(options.pixel_layout, PixelLayout::Bgra);
}

#[test]
fn test_partial_config_keeps_defaults() {
    let fixtures = Fixtures::new();
    let path = fixtures.config("[demux]\nmax_streams = 2\n");

    let config = load_config(&path).unwrap();
    let defaults = ContainerOptions::default();
    assert_eq!(config.demux.max_streams, 2);
    assert_eq!(config.demux.read_chunk_size, defaults.read_chunk_size);
    assert_eq!(config.demux.resync_limit, defaults.resync_limit);
    assert_eq!(config.output.pixel_layout, defaults.pixel_layout);
}

#[test]
fn test_empty_config_is_default() {
    let fixtures = Fixtures::new();
    let path = fixtures.config("");
    assert_eq!(load_config(&path).unwrap(), Config::default());
}

#[test]
fn test_zero_max_streams_rejected() {
    let fixtures = Fixtures::new();
    let path = fixtures.config("[demux]\nmax_streams = 0\n");

    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("max_streams"), "{err}");
}

#[test]
fn test_zero_chunk_size_rejected() {
    let mut config = Config::default();
    config.demux.read_chunk_size = 0;
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("read_chunk_size"), "{err}");
}

#[test]
fn test_unknown_field_rejected() {
    let fixtures = Fixtures::new();
    let path = fixtures.config("[demux]\nmax_stream = 3\n");
    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("parse"), "{err:#}");
}

#[test]
fn test_unknown_pixel_layout_rejected() {
    let fixtures = Fixtures::new();
    let path = fixtures.config("[output]\npixel_layout = \"yuv\"\n");
    assert!(load_config(&path).is_err());
}

#[test]
fn test_missing_explicit_config_is_error() {
    let fixtures = Fixtures::new();
    let missing = fixtures.path("nope.toml");
    let err = load_config_or_default(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"), "{err}");
}

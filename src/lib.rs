//! ogvframes - Ogg/Theora frame extraction
//!
//! This library crate exposes configuration and probing for the CLI and
//! for integration testing. The demuxing core lives in `ogvframes-media`,
//! Theora header support in `ogvframes-theora`.

pub mod config;
pub mod probe;

pub use ogvframes_media as media;
pub use ogvframes_theora as theora;

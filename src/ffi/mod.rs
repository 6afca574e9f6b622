//! Hand-written FFmpeg C bindings (no bindgen)
//!
//! Minimal bindings for demuxing, decoding and pixel conversion.
//! All FFmpeg structs are opaque - we access fields via the thin C accessor library.

// Static FFmpeg builds reference zlib; linking libz-sys pulls it in.
use libz_sys as _;

pub mod accessors;
pub mod avcodec;
pub mod avformat;
pub mod avutil;
pub mod error;
pub mod swscale;
pub mod types;

pub use error::{check_error, FFmpegError, FFmpegResult};
pub use types::*;

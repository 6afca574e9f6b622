#![deny(clippy::all)]

//! Pull-based video decoding for Node.js
//!
//! Decodes the video stream of an in-memory container into fixed-size
//! packed 32-bit pixel frames using FFmpeg, with timestamp seeking.

// FFmpeg C bindings (hand-written, no bindgen)
pub mod ffi;

// Safe codec wrappers (RAII) and the decode session
pub mod codec;

// Node.js API surface (NAPI classes)
pub mod video;

pub use codec::{
  CodecError, CodecResult, DecodeState, OutputPixelFormat, ScaleAlgorithm, Session,
  SessionConfig, StepOutcome, VideoStreamDescriptor,
};
pub use video::{Video, VideoOptions, VideoPixelLayout, VideoScaleAlgorithm};

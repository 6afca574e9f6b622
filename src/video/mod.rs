//! Node.js surface
//!
//! Exposes [`crate::codec::Session`] to JavaScript as the `Video` class.

pub mod error;
mod frame_source;

pub use frame_source::{Video, VideoOptions, VideoPixelLayout, VideoScaleAlgorithm};

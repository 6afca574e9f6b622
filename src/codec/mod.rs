//! Safe Rust wrappers for FFmpeg demuxing, decoding and pixel conversion
//!
//! This module provides RAII wrappers around FFmpeg's C structures,
//! ensuring proper resource cleanup and memory safety.

pub mod avio_context;
pub mod context;
pub mod demuxer;
pub mod frame;
pub mod io_buffer;
pub mod packet;
pub mod runtime;
pub mod scaler;
pub mod session;
pub mod tracking;

#[cfg(test)]
pub(crate) mod test_media;

pub use avio_context::{StreamSource, Whence};
pub use context::{DecodeOutcome, DecoderContext};
pub use demuxer::{Demuxer, VideoStreamDescriptor};
pub use frame::Frame;
pub use io_buffer::{BufferSource, ReadOnlyBuffer};
pub use packet::Packet;
pub use scaler::Scaler;
pub use session::{DecodeState, Session, StepOutcome};

use crate::ffi::swscale;
use crate::ffi::{AVPixelFormat, FFmpegError};
use std::os::raw::c_int;

/// Largest accepted output edge in pixels
pub const MAX_DIMENSION: u32 = 16384;

/// Packed 32-bit output layouts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputPixelFormat {
  /// B, G, R, A in memory; a little-endian `u32` reads as 0xAARRGGBB
  #[default]
  Bgra,
  /// R, G, B, A in memory
  Rgba,
}

impl OutputPixelFormat {
  /// Matching FFmpeg pixel format
  pub fn av_format(&self) -> AVPixelFormat {
    match self {
      OutputPixelFormat::Bgra => AVPixelFormat::Bgra,
      OutputPixelFormat::Rgba => AVPixelFormat::Rgba,
    }
  }
}

/// Resampling filter used by the pixel converter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScaleAlgorithm {
  FastBilinear,
  Bilinear,
  #[default]
  Bicubic,
  Lanczos,
  Point,
}

impl ScaleAlgorithm {
  /// swscale flag for this filter
  pub fn sws_flags(&self) -> c_int {
    match self {
      ScaleAlgorithm::FastBilinear => swscale::SWS_FAST_BILINEAR,
      ScaleAlgorithm::Bilinear => swscale::SWS_BILINEAR,
      ScaleAlgorithm::Bicubic => swscale::SWS_BICUBIC,
      ScaleAlgorithm::Lanczos => swscale::SWS_LANCZOS,
      ScaleAlgorithm::Point => swscale::SWS_POINT,
    }
  }
}

/// Session configuration
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
  /// Output width in pixels
  pub width: u32,
  /// Output height in pixels
  pub height: u32,
  /// Output pixel layout
  pub pixel_format: OutputPixelFormat,
  /// Resampling filter
  pub scale_algorithm: ScaleAlgorithm,
  /// Number of decoder threads (0 for auto)
  pub thread_count: u32,
}

impl SessionConfig {
  /// Bicubic BGRA output at `width` x `height`
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      ..Default::default()
    }
  }

  /// Check that the output geometry is usable
  pub fn validate(&self) -> CodecResult<()> {
    if self.width == 0 || self.height == 0 {
      return Err(CodecError::InvalidConfig(format!(
        "output size must be non-zero, got {}x{}",
        self.width, self.height
      )));
    }
    if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
      return Err(CodecError::InvalidConfig(format!(
        "output size {}x{} exceeds {}x{}",
        self.width, self.height, MAX_DIMENSION, MAX_DIMENSION
      )));
    }
    Ok(())
  }

  /// Number of pixels in one output frame
  pub fn pixel_count(&self) -> usize {
    self.width as usize * self.height as usize
  }
}

/// Codec error type
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
  #[error("Failed to allocate format context")]
  FormatContextAllocFailed,

  #[error("Failed to open input: {0}")]
  InputOpenFailed(FFmpegError),

  #[error("Failed to read stream info: {0}")]
  StreamInfoFailed(FFmpegError),

  #[error("No video stream found")]
  NoVideoStream,

  #[error("Decoder not found for codec {name} ({codec_id})")]
  DecoderNotFound { codec_id: c_int, name: String },

  #[error("Failed to open decoder: {0}")]
  DecoderOpenFailed(FFmpegError),

  #[error("Failed to allocate frame")]
  FrameAllocFailed,

  #[error("Failed to allocate {0}")]
  AllocationFailed(&'static str),

  #[error("Failed to create conversion from {src_format} {src_width}x{src_height} to {dst_width}x{dst_height}")]
  ConversionInitFailed {
    src_format: String,
    src_width: i32,
    src_height: i32,
    dst_width: i32,
    dst_height: i32,
  },

  #[error("FFmpeg error: {0}")]
  Ffmpeg(#[from] FFmpegError),

  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("Pixel buffer too small: need {needed} pixels, got {actual}")]
  BufferTooSmall { needed: usize, actual: usize },
}

impl CodecError {
  /// Errors that abort session construction
  pub fn is_fatal_at_construction(&self) -> bool {
    matches!(
      self,
      CodecError::FormatContextAllocFailed
        | CodecError::InputOpenFailed(_)
        | CodecError::StreamInfoFailed(_)
        | CodecError::NoVideoStream
        | CodecError::DecoderNotFound { .. }
        | CodecError::DecoderOpenFailed(_)
        | CodecError::FrameAllocFailed
        | CodecError::AllocationFailed(_)
        | CodecError::InvalidConfig(_)
    )
  }

  /// Errors caused by the caller's arguments rather than the media
  pub fn is_caller_error(&self) -> bool {
    matches!(
      self,
      CodecError::InvalidConfig(_) | CodecError::BufferTooSmall { .. }
    )
  }

  /// Short variant name used as a message prefix at the host boundary
  pub fn kind(&self) -> &'static str {
    match self {
      CodecError::FormatContextAllocFailed => "FormatContextAllocFailed",
      CodecError::InputOpenFailed(_) => "InputOpenFailed",
      CodecError::StreamInfoFailed(_) => "StreamInfoFailed",
      CodecError::NoVideoStream => "NoVideoStream",
      CodecError::DecoderNotFound { .. } => "DecoderNotFound",
      CodecError::DecoderOpenFailed(_) => "DecoderOpenFailed",
      CodecError::FrameAllocFailed => "FrameAllocFailed",
      CodecError::AllocationFailed(_) => "AllocationFailed",
      CodecError::ConversionInitFailed { .. } => "ConversionInitFailed",
      CodecError::Ffmpeg(_) => "FfmpegError",
      CodecError::InvalidConfig(_) => "InvalidConfig",
      CodecError::BufferTooSmall { .. } => "BufferTooSmall",
    }
  }
}

pub type CodecResult<T> = Result<T, CodecError>;

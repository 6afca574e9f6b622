//! Video - pull-based frame source for JavaScript
//!
//! ```js
//! const video = new Video(bytes, 320, 240)
//! const pixels = new Uint32Array(320 * 240)
//! while (video.advanceFrame(pixels)) {
//!   draw(pixels, video.position * video.timeBase)
//! }
//! video.close()
//! ```

use crate::codec::{BufferSource, OutputPixelFormat, ScaleAlgorithm, Session, SessionConfig};
use crate::video::error::lock_poisoned;
use napi::bindgen_prelude::*;
use napi_derive::napi;
use std::sync::Mutex;

/// Lets a session read a JavaScript byte array in place
impl BufferSource for Uint8Array {
  fn buffer_data(&self) -> (*const u8, usize) {
    let slice: &[u8] = self.as_ref();
    (slice.as_ptr(), slice.len())
  }
}

/// Channel order of the output pixels
#[napi(string_enum)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoPixelLayout {
  /// Blue, green, red, alpha in memory
  #[default]
  #[napi(value = "bgra")]
  Bgra,
  /// Red, green, blue, alpha in memory
  #[napi(value = "rgba")]
  Rgba,
}

impl From<VideoPixelLayout> for OutputPixelFormat {
  fn from(layout: VideoPixelLayout) -> Self {
    match layout {
      VideoPixelLayout::Bgra => OutputPixelFormat::Bgra,
      VideoPixelLayout::Rgba => OutputPixelFormat::Rgba,
    }
  }
}

/// Resampling filter used when scaling to the output size
#[napi(string_enum)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoScaleAlgorithm {
  #[napi(value = "fast-bilinear")]
  FastBilinear,
  #[napi(value = "bilinear")]
  Bilinear,
  #[default]
  #[napi(value = "bicubic")]
  Bicubic,
  #[napi(value = "lanczos")]
  Lanczos,
  #[napi(value = "point")]
  Point,
}

impl From<VideoScaleAlgorithm> for ScaleAlgorithm {
  fn from(algorithm: VideoScaleAlgorithm) -> Self {
    match algorithm {
      VideoScaleAlgorithm::FastBilinear => ScaleAlgorithm::FastBilinear,
      VideoScaleAlgorithm::Bilinear => ScaleAlgorithm::Bilinear,
      VideoScaleAlgorithm::Bicubic => ScaleAlgorithm::Bicubic,
      VideoScaleAlgorithm::Lanczos => ScaleAlgorithm::Lanczos,
      VideoScaleAlgorithm::Point => ScaleAlgorithm::Point,
    }
  }
}

/// Optional settings for a [`Video`]
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct VideoOptions {
  /// Output channel order (default "bgra")
  pub pixel_format: Option<VideoPixelLayout>,
  /// Scaling filter (default "bicubic")
  pub scale_algorithm: Option<VideoScaleAlgorithm>,
  /// Decoder threads, 0 lets FFmpeg decide
  pub thread_count: Option<u32>,
}

impl VideoOptions {
  fn into_config(self, width: u32, height: u32) -> SessionConfig {
    SessionConfig {
      width,
      height,
      pixel_format: self.pixel_format.unwrap_or_default().into(),
      scale_algorithm: self.scale_algorithm.unwrap_or_default().into(),
      thread_count: self.thread_count.unwrap_or(0),
    }
  }
}

/// Decodes a video held in memory one frame at a time
///
/// Frames are scaled to the width and height given at construction and
/// written into a caller-provided `Uint32Array` of `width * height` pixels.
/// Timestamps, duration and seek targets are in stream ticks; multiply by
/// `timeBase` for seconds.
#[napi]
pub struct Video {
  session: Mutex<Session>,
}

#[napi]
impl Video {
  /// Open `data` for decoding into `width` x `height` frames
  ///
  /// The bytes are read in place; the array must not be modified while the
  /// video is open.
  #[napi(constructor)]
  pub fn new(
    data: Uint8Array,
    width: u32,
    height: u32,
    options: Option<VideoOptions>,
  ) -> Result<Self> {
    let config = options.unwrap_or_default().into_config(width, height);
    let session = Session::open(data, config)?;
    Ok(Self {
      session: Mutex::new(session),
    })
  }

  /// Decode the next step into `pixels`
  ///
  /// Returns false once the video is exhausted. A true result may leave
  /// `pixels` untouched when the step consumed input without finishing a
  /// frame.
  #[napi]
  pub fn advance_frame(&self, mut pixels: Uint32Array) -> Result<bool> {
    let mut session = self.session.lock().map_err(|_| lock_poisoned())?;
    let out = unsafe { pixels.as_mut() };
    Ok(session.advance_frame(out)?)
  }

  /// Decode until a whole frame lands in `pixels`; false at the end
  #[napi]
  pub fn next_frame(&self, mut pixels: Uint32Array) -> Result<bool> {
    let mut session = self.session.lock().map_err(|_| lock_poisoned())?;
    let out = unsafe { pixels.as_mut() };
    Ok(session.next_frame(out)?)
  }

  /// Jump to the last keyframe at or before `timestamp`
  ///
  /// Returns false if the seek failed; the video keeps its current position.
  #[napi]
  pub fn seek(&self, timestamp: i64) -> Result<bool> {
    let mut session = self.session.lock().map_err(|_| lock_poisoned())?;
    Ok(session.seek(timestamp))
  }

  /// Seconds per tick
  #[napi(getter)]
  pub fn time_base(&self) -> Result<f64> {
    let session = self.session.lock().map_err(|_| lock_poisoned())?;
    Ok(session.time_base_f64())
  }

  /// Total length in ticks, 0 if unknown
  #[napi(getter)]
  pub fn duration(&self) -> Result<i64> {
    let session = self.session.lock().map_err(|_| lock_poisoned())?;
    Ok(session.duration())
  }

  /// Timestamp of the most recent frame in ticks
  #[napi(getter)]
  pub fn position(&self) -> Result<i64> {
    let session = self.session.lock().map_err(|_| lock_poisoned())?;
    Ok(session.position())
  }

  #[napi(getter)]
  pub fn width(&self) -> Result<u32> {
    let session = self.session.lock().map_err(|_| lock_poisoned())?;
    Ok(session.width())
  }

  #[napi(getter)]
  pub fn height(&self) -> Result<u32> {
    let session = self.session.lock().map_err(|_| lock_poisoned())?;
    Ok(session.height())
  }

  /// Short name of the video codec, null without a stream
  #[napi(getter)]
  pub fn codec(&self) -> Result<Option<String>> {
    let session = self.session.lock().map_err(|_| lock_poisoned())?;
    Ok(session.stream().map(|s| s.codec_name.clone()))
  }

  /// Whether no more frames will be produced
  #[napi(getter)]
  pub fn finished(&self) -> Result<bool> {
    let session = self.session.lock().map_err(|_| lock_poisoned())?;
    Ok(session.is_finished())
  }

  /// Release the decoder and demuxer now instead of at garbage collection
  #[napi]
  pub fn close(&self) -> Result<()> {
    let mut session = self.session.lock().map_err(|_| lock_poisoned())?;
    session.close();
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_options_map_to_config() {
    let config = VideoOptions {
      pixel_format: Some(VideoPixelLayout::Rgba),
      scale_algorithm: Some(VideoScaleAlgorithm::Lanczos),
      thread_count: Some(2),
    }
    .into_config(320, 240);
    assert_eq!((config.width, config.height), (320, 240));
    assert_eq!(config.pixel_format, OutputPixelFormat::Rgba);
    assert_eq!(config.scale_algorithm, ScaleAlgorithm::Lanczos);
    assert_eq!(config.thread_count, 2);
  }

  #[test]
  fn test_default_options() {
    let config = VideoOptions::default().into_config(16, 16);
    assert_eq!(config.pixel_format, OutputPixelFormat::Bgra);
    assert_eq!(config.scale_algorithm, ScaleAlgorithm::Bicubic);
    assert_eq!(config.thread_count, 0);
  }
}

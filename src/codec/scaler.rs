//! Pixel converter built on FFmpeg SwsContext
//!
//! Converts decoded frames of any native format and size into a fixed
//! packed 32-bit target frame, then copies it into caller-owned pixels.

use crate::ffi::{
  avutil::pix_fmt_name,
  swscale::{self, sws_freeContext, sws_getCachedContext, sws_scale},
  SwsContext,
};
use std::os::raw::c_int;
use std::ptr::NonNull;

use super::tracking::{self, HandleKind};
use super::{CodecError, CodecResult, Frame, OutputPixelFormat, ScaleAlgorithm};

/// Source side of a conversion, the key of the cached context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceGeometry {
  pub format: c_int,
  pub width: u32,
  pub height: u32,
}

impl SourceGeometry {
  pub fn of(frame: &Frame) -> Self {
    Self {
      format: frame.format_raw(),
      width: frame.width(),
      height: frame.height(),
    }
  }
}

/// Cached conversion context plus the fixed-size target frame it writes into
pub struct Scaler {
  ctx: Option<NonNull<SwsContext>>,
  source: Option<SourceGeometry>,
  target: Frame,
  dst_format: OutputPixelFormat,
  algorithm: ScaleAlgorithm,
  rebuilds: u32,
}

impl Scaler {
  /// Create a converter with a `width` x `height` target
  ///
  /// The conversion context itself is built lazily by [`Scaler::prepare`]
  /// once the first source frame is known.
  pub fn new(
    width: u32,
    height: u32,
    dst_format: OutputPixelFormat,
    algorithm: ScaleAlgorithm,
  ) -> CodecResult<Self> {
    let target = Frame::new_video(width, height, dst_format.av_format())?;
    Ok(Self {
      ctx: None,
      source: None,
      target,
      dst_format,
      algorithm,
      rebuilds: 0,
    })
  }

  /// Make sure the cached context matches `source`
  ///
  /// A no-op when the source geometry is unchanged; otherwise the context
  /// is rebuilt. Failure leaves no context behind.
  pub fn prepare(&mut self, source: SourceGeometry) -> CodecResult<()> {
    if self.ctx.is_some() && self.source == Some(source) {
      return Ok(());
    }

    if source.width == 0 || source.height == 0 || !swscale::is_input_supported(source.format) {
      self.release_context();
      return Err(self.init_error(source));
    }

    // sws_getCachedContext frees the previous context whenever it returns
    // anything other than that same pointer, including NULL
    let previous = self.ctx.map_or(std::ptr::null_mut(), NonNull::as_ptr);
    let ptr = unsafe {
      sws_getCachedContext(
        previous,
        source.width as c_int,
        source.height as c_int,
        source.format,
        self.target.width() as c_int,
        self.target.height() as c_int,
        self.dst_format.av_format().as_raw(),
        self.algorithm.sws_flags(),
        std::ptr::null_mut(),
        std::ptr::null_mut(),
        std::ptr::null(),
      )
    };

    match NonNull::new(ptr) {
      Some(ptr) => {
        if self.ctx.is_none() {
          tracking::acquired(HandleKind::Scaler);
        }
        self.ctx = Some(ptr);
        self.source = Some(source);
        self.rebuilds += 1;
        Ok(())
      }
      None => {
        if self.ctx.take().is_some() {
          tracking::released(HandleKind::Scaler);
        }
        self.source = None;
        Err(self.init_error(source))
      }
    }
  }

  /// Convert `src` into the target frame
  pub fn convert(&mut self, src: &Frame) -> CodecResult<&Frame> {
    self.prepare(SourceGeometry::of(src))?;
    let ctx = self.ctx.ok_or_else(|| self.init_error(SourceGeometry::of(src)))?;

    let src_data: [*const u8; 4] = [src.data(0), src.data(1), src.data(2), src.data(3)];
    let src_linesize: [c_int; 4] = [
      src.linesize(0),
      src.linesize(1),
      src.linesize(2),
      src.linesize(3),
    ];
    let dst_data: [*mut u8; 4] = [
      self.target.data_mut(0),
      std::ptr::null_mut(),
      std::ptr::null_mut(),
      std::ptr::null_mut(),
    ];
    let dst_linesize: [c_int; 4] = [self.target.linesize(0), 0, 0, 0];

    let rows = unsafe {
      sws_scale(
        ctx.as_ptr(),
        src_data.as_ptr(),
        src_linesize.as_ptr(),
        0,
        src.height() as c_int,
        dst_data.as_ptr(),
        dst_linesize.as_ptr(),
      )
    };
    crate::ffi::check_error(rows)?;

    Ok(&self.target)
  }

  /// Convert `src` and copy the result row by row into `out`
  pub fn convert_into(&mut self, src: &Frame, out: &mut [u32]) -> CodecResult<()> {
    let needed = self.pixel_count();
    if out.len() < needed {
      return Err(CodecError::BufferTooSmall {
        needed,
        actual: out.len(),
      });
    }
    self.convert(src)?.copy_packed_to_u32(out)
  }

  // ========================================================================
  // Accessors
  // ========================================================================

  /// Target width
  pub fn width(&self) -> u32 {
    self.target.width()
  }

  /// Target height
  pub fn height(&self) -> u32 {
    self.target.height()
  }

  /// Pixels per converted frame
  pub fn pixel_count(&self) -> usize {
    self.width() as usize * self.height() as usize
  }

  /// Source geometry the current context was built for
  pub fn source(&self) -> Option<SourceGeometry> {
    self.source
  }

  /// How many times a conversion context has been (re)built
  pub fn rebuild_count(&self) -> u32 {
    self.rebuilds
  }

  fn release_context(&mut self) {
    if let Some(ctx) = self.ctx.take() {
      unsafe { sws_freeContext(ctx.as_ptr()) };
      tracking::released(HandleKind::Scaler);
    }
    self.source = None;
  }

  fn init_error(&self, source: SourceGeometry) -> CodecError {
    CodecError::ConversionInitFailed {
      src_format: pix_fmt_name(source.format),
      src_width: source.width as i32,
      src_height: source.height as i32,
      dst_width: self.target.width() as i32,
      dst_height: self.target.height() as i32,
    }
  }
}

impl Drop for Scaler {
  fn drop(&mut self) {
    self.release_context();
  }
}

// SwsContext is only touched through &mut self
unsafe impl Send for Scaler {}

impl std::fmt::Debug for Scaler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scaler")
      .field("source", &self.source)
      .field(
        "dst",
        &format!("{}x{} {:?}", self.width(), self.height(), self.dst_format),
      )
      .field("algorithm", &self.algorithm)
      .finish()
  }
}

//! Safe wrapper around FFmpeg AVFrame
//!
//! Provides RAII-based memory management and safe access to frame data.

use crate::ffi::{
  accessors::{
    ffframe_data, ffframe_data_const, ffframe_get_best_effort_timestamp, ffframe_get_format,
    ffframe_get_height, ffframe_get_pkt_dts, ffframe_get_pts, ffframe_get_width, ffframe_linesize,
    ffframe_set_format, ffframe_set_height, ffframe_set_width,
  },
  avutil::{av_frame_alloc, av_frame_free, av_frame_get_buffer},
  AVFrame, AVPixelFormat, AV_NOPTS_VALUE,
};
use std::os::raw::c_int;
use std::ptr::NonNull;

use super::tracking::{self, HandleKind};
use super::{CodecError, CodecResult};

/// Row alignment of buffers allocated by [`Frame::new_video`]
pub const FRAME_ALIGN: c_int = 32;

/// Safe wrapper around AVFrame with RAII cleanup
pub struct Frame {
  ptr: NonNull<AVFrame>,
}

impl Frame {
  /// Allocate a new empty frame
  pub fn new() -> CodecResult<Self> {
    let ptr = unsafe { av_frame_alloc() };
    let ptr = NonNull::new(ptr).ok_or(CodecError::FrameAllocFailed)?;
    tracking::acquired(HandleKind::Frame);
    Ok(Self { ptr })
  }

  /// Allocate a frame with buffer for the given format and dimensions
  pub fn new_video(width: u32, height: u32, format: AVPixelFormat) -> CodecResult<Self> {
    let mut frame = Self::new()?;

    unsafe {
      ffframe_set_width(frame.as_mut_ptr(), width as c_int);
      ffframe_set_height(frame.as_mut_ptr(), height as c_int);
      ffframe_set_format(frame.as_mut_ptr(), format.as_raw());
    }

    // Allocate buffer with 32-byte alignment for SIMD
    let ret = unsafe { av_frame_get_buffer(frame.as_mut_ptr(), FRAME_ALIGN) };
    if ret < 0 {
      return Err(CodecError::AllocationFailed("frame buffer"));
    }

    Ok(frame)
  }

  /// Get the raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_ptr(&self) -> *const AVFrame {
    self.ptr.as_ptr()
  }

  /// Get the mutable raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVFrame {
    self.ptr.as_ptr()
  }

  // ========================================================================
  // Dimensions and Format
  // ========================================================================

  /// Get frame width
  #[inline]
  pub fn width(&self) -> u32 {
    unsafe { ffframe_get_width(self.as_ptr()).max(0) as u32 }
  }

  /// Get frame height
  #[inline]
  pub fn height(&self) -> u32 {
    unsafe { ffframe_get_height(self.as_ptr()).max(0) as u32 }
  }

  /// Raw FFmpeg pixel format of the frame
  #[inline]
  pub fn format_raw(&self) -> c_int {
    unsafe { ffframe_get_format(self.as_ptr()) }
  }

  /// Pixel format, if it is one of the named formats
  pub fn format(&self) -> Option<AVPixelFormat> {
    AVPixelFormat::from_raw(self.format_raw())
  }

  // ========================================================================
  // Timestamps
  // ========================================================================

  /// Get presentation timestamp (in stream time base units)
  #[inline]
  pub fn pts(&self) -> i64 {
    unsafe { ffframe_get_pts(self.as_ptr()) }
  }

  /// Decoding timestamp of the packet that produced this frame
  #[inline]
  pub fn pkt_dts(&self) -> i64 {
    unsafe { ffframe_get_pkt_dts(self.as_ptr()) }
  }

  /// Decoder's best guess at the frame timestamp
  #[inline]
  pub fn best_effort_timestamp(&self) -> i64 {
    unsafe { ffframe_get_best_effort_timestamp(self.as_ptr()) }
  }

  /// Frame position in stream ticks
  ///
  /// Best-effort timestamp, then packet DTS, then PTS. `None` when the decoder
  /// reported no timestamp at all.
  pub fn timestamp(&self) -> Option<i64> {
    [self.best_effort_timestamp(), self.pkt_dts(), self.pts()]
      .into_iter()
      .find(|&ts| ts != AV_NOPTS_VALUE)
  }

  // ========================================================================
  // Data Access
  // ========================================================================

  /// Get pointer to plane data
  ///
  /// The returned pointer is valid only while the frame is alive and unmodified
  pub fn data(&self, plane: usize) -> *const u8 {
    unsafe { ffframe_data_const(self.as_ptr(), plane as c_int) }
  }

  /// Get mutable pointer to plane data
  pub fn data_mut(&mut self, plane: usize) -> *mut u8 {
    unsafe { ffframe_data(self.as_mut_ptr(), plane as c_int) }
  }

  /// Get line size (stride) for a plane
  #[inline]
  pub fn linesize(&self, plane: usize) -> i32 {
    unsafe { ffframe_linesize(self.as_ptr(), plane as c_int) }
  }

  /// Visible bytes of one row of a packed frame, stride padding excluded
  pub fn packed_row(&self, row: usize) -> Option<&[u8]> {
    let bpp = self.format()?.packed_bytes_per_pixel()?;
    let ptr = self.data(0);
    let linesize = self.linesize(0);
    if ptr.is_null() || linesize <= 0 || row >= self.height() as usize {
      return None;
    }

    let width_bytes = self.width() as usize * bpp;
    if width_bytes > linesize as usize {
      return None;
    }

    // SAFETY: plane 0 holds `height` rows of `linesize` bytes each
    Some(unsafe { std::slice::from_raw_parts(ptr.add(row * linesize as usize), width_bytes) })
  }

  /// Copy a packed 32-bit frame into `dst`, one row at a time
  ///
  /// The stride may exceed `width * 4`, so rows are copied individually into
  /// a tightly packed `width * height` destination.
  pub fn copy_packed_to_u32(&self, dst: &mut [u32]) -> CodecResult<()> {
    let width = self.width() as usize;
    let height = self.height() as usize;
    let needed = width * height;
    if dst.len() < needed {
      return Err(CodecError::BufferTooSmall {
        needed,
        actual: dst.len(),
      });
    }

    if self.format().and_then(|f| f.packed_bytes_per_pixel()) != Some(4) {
      return Err(CodecError::InvalidConfig(format!(
        "expected a packed 32-bit frame, got pixel format {}",
        self.format_raw()
      )));
    }

    for (row, out) in dst[..needed].chunks_exact_mut(width).enumerate() {
      let src = self
        .packed_row(row)
        .ok_or(CodecError::AllocationFailed("frame buffer"))?;
      for (pixel, bytes) in out.iter_mut().zip(src.chunks_exact(4)) {
        *pixel = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
      }
    }

    Ok(())
  }
}

impl Drop for Frame {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_frame_free(&mut ptr);
    }
    tracking::released(HandleKind::Frame);
  }
}

// Frame data can be sent between threads
unsafe impl Send for Frame {}

impl std::fmt::Debug for Frame {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Frame")
      .field("width", &self.width())
      .field("height", &self.height())
      .field("format", &self.format_raw())
      .field("pts", &self.pts())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_frame_allocation() {
    let frame = Frame::new().unwrap();
    assert_eq!(frame.width(), 0);
    assert_eq!(frame.height(), 0);
    assert_eq!(frame.timestamp(), None);
  }

  #[test]
  fn test_video_frame_allocation() {
    let frame = Frame::new_video(100, 10, AVPixelFormat::Bgra).unwrap();
    assert_eq!(frame.width(), 100);
    assert_eq!(frame.height(), 10);
    assert_eq!(frame.format(), Some(AVPixelFormat::Bgra));
    assert!(!frame.data(0).is_null());
    assert!(frame.linesize(0) >= 400);
    assert_eq!(frame.linesize(0) % FRAME_ALIGN, 0);
  }

  #[test]
  fn test_copy_packed_rows_skips_stride_padding() {
    // 3 pixels = 12 bytes per row, padded to a 32-byte stride
    let mut frame = Frame::new_video(3, 2, AVPixelFormat::Bgra).unwrap();
    let linesize = frame.linesize(0) as usize;
    assert!(linesize > 12);
    let base = frame.data_mut(0);
    for row in 0..2 {
      for byte in 0..linesize {
        let value = if byte < 12 { (row * 12 + byte) as u8 } else { 0xEE };
        unsafe { *base.add(row * linesize + byte) = value };
      }
    }

    let mut out = vec![0u32; 6];
    frame.copy_packed_to_u32(&mut out).unwrap();
    assert_eq!(out[0], u32::from_ne_bytes([0, 1, 2, 3]));
    assert_eq!(out[2], u32::from_ne_bytes([8, 9, 10, 11]));
    assert_eq!(out[3], u32::from_ne_bytes([12, 13, 14, 15]));
    assert_eq!(out[5], u32::from_ne_bytes([20, 21, 22, 23]));
  }

  #[test]
  fn test_copy_into_small_buffer_fails() {
    let frame = Frame::new_video(4, 4, AVPixelFormat::Bgra).unwrap();
    let mut out = vec![0u32; 15];
    assert!(matches!(
      frame.copy_packed_to_u32(&mut out),
      Err(CodecError::BufferTooSmall {
        needed: 16,
        actual: 15
      })
    ));
  }

  #[test]
  fn test_frame_release_is_tracked() {
    let before = tracking::live_handles_of(HandleKind::Frame);
    let frame = Frame::new_video(8, 8, AVPixelFormat::Rgba).unwrap();
    assert_eq!(tracking::live_handles_of(HandleKind::Frame), before + 1);
    drop(frame);
    assert_eq!(tracking::live_handles_of(HandleKind::Frame), before);
  }
}

//! libavutil function declarations
//!
//! Provides utility functions for memory, frames, and general helpers.

use super::types::*;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};

unsafe extern "C" {
  // ========================================================================
  // Frame Management
  // ========================================================================

  /// Allocate an AVFrame and set its fields to default values
  pub fn av_frame_alloc() -> *mut AVFrame;

  /// Free the frame and any dynamically allocated objects in it
  pub fn av_frame_free(frame: *mut *mut AVFrame);

  /// Allocate new buffers for video data based on frame format/dimensions
  ///
  /// # Arguments
  /// * `frame` - Frame with format, width, height set
  /// * `align` - Buffer size alignment (0 for default, 32 recommended for SIMD)
  pub fn av_frame_get_buffer(frame: *mut AVFrame, align: c_int) -> c_int;

  // ========================================================================
  // Memory Allocation
  // ========================================================================

  /// Allocate a memory block with alignment suitable for all memory accesses
  pub fn av_malloc(size: usize) -> *mut c_void;

  /// Free a memory block which has been allocated with av_malloc
  pub fn av_free(ptr: *mut c_void);

  // ========================================================================
  // Error Handling
  // ========================================================================

  /// Put a description of the AVERROR code errnum in errbuf
  ///
  /// # Returns
  /// 0 on success, negative if no description was found
  pub fn av_strerror(errnum: c_int, errbuf: *mut c_char, errbuf_size: usize) -> c_int;

  // ========================================================================
  // Time/Timestamp Utilities
  // ========================================================================

  /// Rescale a 64-bit integer by 2 rational numbers
  pub fn av_rescale_q(a: i64, bq: AVRational, cq: AVRational) -> i64;

  // ========================================================================
  // Pixel Format Descriptors
  // ========================================================================

  /// Short name of a pixel format, NULL if unknown
  pub fn av_get_pix_fmt_name(pix_fmt: c_int) -> *const c_char;

  // ========================================================================
  // Logging
  // ========================================================================

  /// Set the logging level
  pub fn av_log_set_level(level: c_int);
}

// ============================================================================
// Logging Levels
// ============================================================================

pub mod log_level {
  use std::os::raw::c_int;

  pub const QUIET: c_int = -8;
  pub const PANIC: c_int = 0;
  pub const FATAL: c_int = 8;
  pub const ERROR: c_int = 16;
  pub const WARNING: c_int = 24;
  pub const INFO: c_int = 32;
  pub const VERBOSE: c_int = 40;
  pub const DEBUG: c_int = 48;
  pub const TRACE: c_int = 56;
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Pixel format name for log and error messages ("yuv420p", "bgra", ...)
pub fn pix_fmt_name(pix_fmt: c_int) -> String {
  unsafe {
    let name = av_get_pix_fmt_name(pix_fmt);
    if name.is_null() {
      return format!("pix_fmt({})", pix_fmt);
    }
    CStr::from_ptr(name).to_string_lossy().into_owned()
  }
}

/// Rescale `ts` from time base `from` to time base `to`
pub fn rescale(ts: i64, from: AVRational, to: AVRational) -> i64 {
  unsafe { av_rescale_q(ts, from, to) }
}

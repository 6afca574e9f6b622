//! libswscale function declarations
//!
//! Provides pixel format conversion and image scaling functionality.

use super::types::*;
use std::os::raw::c_int;

unsafe extern "C" {
  // ========================================================================
  // Context Management
  // ========================================================================

  /// Get a cached context, reusing the existing one if parameters match
  ///
  /// If context is NULL, acts like sws_getContext. If the parameters differ
  /// the old context is freed and a new one is returned. On failure the old
  /// context is freed as well and NULL is returned.
  pub fn sws_getCachedContext(
    context: *mut SwsContext,
    srcW: c_int,
    srcH: c_int,
    srcFormat: c_int,
    dstW: c_int,
    dstH: c_int,
    dstFormat: c_int,
    flags: c_int,
    srcFilter: *mut SwsFilter,
    dstFilter: *mut SwsFilter,
    param: *const f64,
  ) -> *mut SwsContext;

  /// Free the swscaler context
  pub fn sws_freeContext(swsContext: *mut SwsContext);

  // ========================================================================
  // Scaling Operations
  // ========================================================================

  /// Scale the image slice in srcSlice and put the resulting scaled
  /// slice in the image in dst
  ///
  /// # Returns
  /// Height of the output slice
  pub fn sws_scale(
    c: *mut SwsContext,
    srcSlice: *const *const u8,
    srcStride: *const c_int,
    srcSliceY: c_int,
    srcSliceH: c_int,
    dst: *const *mut u8,
    dstStride: *const c_int,
  ) -> c_int;

  // ========================================================================
  // Format Support
  // ========================================================================

  /// Check if a pixel format is supported as input
  pub fn sws_isSupportedInput(pix_fmt: c_int) -> c_int;
}

// ============================================================================
// Opaque Filter Type
// ============================================================================

/// Opaque SwsFilter structure
#[repr(C)]
pub struct SwsFilter {
  _opaque: [u8; 0],
}

// ============================================================================
// Scaling Algorithm Flags
// ============================================================================

/// Fast bilinear scaling (low quality, fast)
pub const SWS_FAST_BILINEAR: c_int = 1;

/// Bilinear scaling
pub const SWS_BILINEAR: c_int = 2;

/// Bicubic scaling (good quality, slower)
pub const SWS_BICUBIC: c_int = 4;

/// Nearest neighbor (point) scaling (fastest, blocky)
pub const SWS_POINT: c_int = 0x10;

/// Lanczos scaling (high quality, slowest)
pub const SWS_LANCZOS: c_int = 0x200;

// ============================================================================
// Helper Functions
// ============================================================================

/// Check if a raw pixel format can be used as scaler input
pub fn is_input_supported(pix_fmt: c_int) -> bool {
  unsafe { sws_isSupportedInput(pix_fmt) != 0 }
}

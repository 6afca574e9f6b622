//! libavformat function declarations
//!
//! Demuxing over a caller-provided I/O context.

use super::types::*;
use std::os::raw::{c_char, c_int, c_void};

// ============================================================================
// Opaque Types (format-specific)
// ============================================================================

/// Opaque AVFormatContext structure (demuxer context)
#[repr(C)]
pub struct AVFormatContext {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVInputFormat structure (input format descriptor)
#[repr(C)]
pub struct AVInputFormat {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVIOContext structure (I/O abstraction)
#[repr(C)]
pub struct AVIOContext {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVStream structure (stream within container)
#[repr(C)]
pub struct AVStream {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecParameters structure (stream codec parameters)
#[repr(C)]
pub struct AVCodecParameters {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

// ============================================================================
// Callback Types for Custom I/O
// ============================================================================

/// Read callback for custom I/O
///
/// Returns the number of bytes read, or a negative AVERROR (AVERROR_EOF at end).
pub type ReadPacketFn =
  unsafe extern "C" fn(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int;

/// Write callback for custom I/O (unused by read-only contexts)
pub type WritePacketFn =
  unsafe extern "C" fn(opaque: *mut c_void, buf: *const u8, buf_size: c_int) -> c_int;

/// Seek callback for custom I/O
///
/// `whence` is SEEK_SET, SEEK_CUR, SEEK_END or AVSEEK_SIZE, possibly or-ed
/// with AVSEEK_FORCE. Returns the new position or a negative value.
pub type SeekFn = unsafe extern "C" fn(opaque: *mut c_void, offset: i64, whence: c_int) -> i64;

unsafe extern "C" {
  // ========================================================================
  // Context Lifecycle
  // ========================================================================

  /// Allocate an AVFormatContext
  ///
  /// Freed by avformat_open_input() on failure, else by avformat_close_input()
  pub fn avformat_alloc_context() -> *mut AVFormatContext;

  // ========================================================================
  // Input Context (Demuxing)
  // ========================================================================

  /// Open an input stream and read the header
  ///
  /// On failure the context is freed and `*ps` is set to NULL. A custom
  /// `pb` supplied by the caller is never freed.
  pub fn avformat_open_input(
    ps: *mut *mut AVFormatContext,
    url: *const c_char,
    fmt: *const AVInputFormat,
    options: *mut *mut AVDictionary,
  ) -> c_int;

  /// Close an opened input AVFormatContext
  ///
  /// Frees the context and all its contents and sets *s to NULL. The I/O
  /// context is left alone when AVFMT_FLAG_CUSTOM_IO is set.
  pub fn avformat_close_input(s: *mut *mut AVFormatContext);

  /// Read packets of a media file to get stream information
  pub fn avformat_find_stream_info(
    ic: *mut AVFormatContext,
    options: *mut *mut AVDictionary,
  ) -> c_int;

  /// Find the "best" stream of the given media type
  ///
  /// Returns the stream index or a negative error code.
  pub fn av_find_best_stream(
    ic: *mut AVFormatContext,
    type_: c_int,
    wanted_stream_nb: c_int,
    related_stream: c_int,
    decoder_ret: *mut *const AVCodec,
    flags: c_int,
  ) -> c_int;

  /// Return the next packet of any stream
  ///
  /// The packet is reference counted and must be unreferenced by the caller.
  /// Returns 0 on success, AVERROR_EOF at end of input.
  pub fn av_read_frame(s: *mut AVFormatContext, pkt: *mut AVPacket) -> c_int;

  /// Seek to timestamp `ts` within `[min_ts, max_ts]`
  ///
  /// Timestamps are in the time base of `stream_index`.
  pub fn avformat_seek_file(
    s: *mut AVFormatContext,
    stream_index: c_int,
    min_ts: i64,
    ts: i64,
    max_ts: i64,
    flags: c_int,
  ) -> c_int;

  // ========================================================================
  // Custom I/O
  // ========================================================================

  /// Allocate and initialize an AVIOContext for custom I/O
  ///
  /// # Safety
  /// The buffer must be allocated with av_malloc. FFmpeg may reallocate it, so
  /// the current pointer has to be read back from the context before freeing.
  pub fn avio_alloc_context(
    buffer: *mut u8,
    buffer_size: c_int,
    write_flag: c_int,
    opaque: *mut c_void,
    read_packet: Option<ReadPacketFn>,
    write_packet: Option<WritePacketFn>,
    seek: Option<SeekFn>,
  ) -> *mut AVIOContext;

  /// Free the AVIOContext
  ///
  /// The internal buffer is NOT freed.
  pub fn avio_context_free(s: *mut *mut AVIOContext);
}

// ============================================================================
// Constants
// ============================================================================

/// Seek whence values
pub mod seek_whence {
  use std::os::raw::c_int;

  /// Seek from beginning
  pub const SEEK_SET: c_int = 0;
  /// Seek from current position
  pub const SEEK_CUR: c_int = 1;
  /// Seek from end
  pub const SEEK_END: c_int = 2;
  /// Return file size (special whence value for seek callback)
  pub const AVSEEK_SIZE: c_int = 0x10000;
  /// Force seek even if not efficient
  pub const AVSEEK_FORCE: c_int = 0x20000;
}

/// Media types (for av_find_best_stream)
pub mod media_type {
  use std::os::raw::c_int;

  pub const VIDEO: c_int = 0;
}

/// Format context flags
pub mod avfmt_flag {
  use std::os::raw::c_int;

  /// The caller has supplied a custom AVIOContext, don't avio_close() it
  pub const CUSTOM_IO: c_int = 0x0080;
}

//! Custom read-only I/O context for FFmpeg's AVIO system
//!
//! [`StreamSource`] is the pull-based byte source the demuxer reads from.
//! [`CustomIOContext`] hands it to FFmpeg through read/seek callbacks over a
//! fixed 4 KB native buffer that FFmpeg fills on demand.

use super::io_buffer::{BufferSource, ReadOnlyBuffer};
use super::tracking::{self, HandleKind};
use super::{CodecError, CodecResult};
use crate::ffi::accessors::{fffio_get_buffer, fffio_get_opaque};
use crate::ffi::avformat::{avio_alloc_context, avio_context_free, seek_whence, AVIOContext};
use crate::ffi::avutil::{av_free, av_malloc};
use crate::ffi::error::AVERROR_EOF;
use std::io::{Read, Seek, SeekFrom};
use std::os::raw::{c_int, c_void};
use std::ptr::NonNull;

/// Size of the native buffer FFmpeg reads through
pub const AVIO_BUFFER_SIZE: usize = 4096;

// ============================================================================
// Stream Source
// ============================================================================

/// Reference point of a [`StreamSource::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
  FromStart,
  FromCurrent,
  FromEnd,
  /// Report the total length without moving
  QuerySize,
}

impl Whence {
  /// Decode an FFmpeg `whence` argument, ignoring AVSEEK_FORCE
  pub fn from_raw(whence: c_int) -> Option<Self> {
    match whence & !seek_whence::AVSEEK_FORCE {
      seek_whence::SEEK_SET => Some(Whence::FromStart),
      seek_whence::SEEK_CUR => Some(Whence::FromCurrent),
      seek_whence::SEEK_END => Some(Whence::FromEnd),
      seek_whence::AVSEEK_SIZE => Some(Whence::QuerySize),
      _ => None,
    }
  }
}

/// Seekable byte source over a caller-owned buffer
#[derive(Debug)]
pub struct StreamSource {
  buffer: ReadOnlyBuffer,
}

impl StreamSource {
  pub fn new(source: impl BufferSource + 'static) -> Self {
    Self {
      buffer: ReadOnlyBuffer::new(source),
    }
  }

  /// Copy up to `buf.len()` bytes; 0 means end of stream
  pub fn read(&mut self, buf: &mut [u8]) -> usize {
    self.buffer.read(buf).unwrap_or(0)
  }

  /// Reposition and return the new absolute position, or the total length
  /// for [`Whence::QuerySize`]. `None` if the target lies outside the buffer.
  pub fn seek(&mut self, offset: i64, whence: Whence) -> Option<u64> {
    let target = match whence {
      Whence::QuerySize => return Some(self.buffer.len() as u64),
      Whence::FromStart => SeekFrom::Start(u64::try_from(offset).ok()?),
      Whence::FromCurrent => SeekFrom::Current(offset),
      Whence::FromEnd => SeekFrom::End(offset),
    };
    self.buffer.seek(target).ok()
  }

  /// Total length in bytes
  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  /// Current read position
  pub fn position(&self) -> usize {
    self.buffer.position()
  }
}

// ============================================================================
// AVIO Context
// ============================================================================

/// Read-only custom I/O context
///
/// Owns the AVIOContext, its av_malloc'd buffer and the boxed [`StreamSource`]
/// handed to the callbacks as `opaque`.
pub struct CustomIOContext {
  ptr: NonNull<AVIOContext>,
}

impl CustomIOContext {
  /// Create a read context pulling from `source`
  pub fn new_read(source: StreamSource) -> CodecResult<Self> {
    let buffer = unsafe { av_malloc(AVIO_BUFFER_SIZE) } as *mut u8;
    if buffer.is_null() {
      return Err(CodecError::AllocationFailed("AVIO buffer"));
    }

    let opaque = Box::into_raw(Box::new(source)) as *mut c_void;

    let ptr = unsafe {
      avio_alloc_context(
        buffer,
        AVIO_BUFFER_SIZE as c_int,
        0, // write_flag = 0 for reading
        opaque,
        Some(read_callback),
        None,
        Some(seek_callback),
      )
    };

    let Some(ptr) = NonNull::new(ptr) else {
      unsafe {
        av_free(buffer as *mut c_void);
        drop(Box::from_raw(opaque as *mut StreamSource));
      }
      return Err(CodecError::AllocationFailed("AVIO context"));
    };

    tracking::acquired(HandleKind::Io);
    Ok(Self { ptr })
  }

  /// Get the raw AVIOContext pointer
  pub fn as_ptr(&self) -> *mut AVIOContext {
    self.ptr.as_ptr()
  }

  /// Total length of the underlying source
  pub fn source_len(&self) -> usize {
    // SAFETY: opaque is the StreamSource boxed in new_read
    unsafe {
      let opaque = fffio_get_opaque(self.ptr.as_ptr()) as *const StreamSource;
      opaque.as_ref().map_or(0, StreamSource::len)
    }
  }
}

impl Drop for CustomIOContext {
  fn drop(&mut self) {
    unsafe {
      let opaque = fffio_get_opaque(self.ptr.as_ptr());

      // avio_context_free leaves the buffer alone, and FFmpeg may have
      // swapped it since allocation
      let buffer = fffio_get_buffer(self.ptr.as_ptr());
      if !buffer.is_null() {
        av_free(buffer as *mut c_void);
      }

      let mut ptr = self.ptr.as_ptr();
      avio_context_free(&mut ptr);

      if !opaque.is_null() {
        drop(Box::from_raw(opaque as *mut StreamSource));
      }
    }
    tracking::released(HandleKind::Io);
  }
}

impl std::fmt::Debug for CustomIOContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CustomIOContext")
      .field("source_len", &self.source_len())
      .finish()
  }
}

// SAFETY: The CustomIOContext owns all its resources and can be safely sent
// between threads. The FFmpeg context is only accessed through our safe API.
unsafe impl Send for CustomIOContext {}

// ============================================================================
// FFmpeg Callbacks
// ============================================================================

/// Read callback for FFmpeg custom I/O
unsafe extern "C" fn read_callback(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int {
  if opaque.is_null() || buf.is_null() || buf_size <= 0 {
    return -1;
  }

  // SAFETY: opaque was checked for null above and points to our StreamSource
  let source = unsafe { &mut *(opaque as *mut StreamSource) };
  // SAFETY: buf was checked for null above, buf_size is valid
  let data = unsafe { std::slice::from_raw_parts_mut(buf, buf_size as usize) };

  match source.read(data) {
    0 => AVERROR_EOF,
    n => n as c_int,
  }
}

/// Seek callback for FFmpeg custom I/O
unsafe extern "C" fn seek_callback(opaque: *mut c_void, offset: i64, whence: c_int) -> i64 {
  if opaque.is_null() {
    return -1;
  }

  // SAFETY: opaque was checked for null above and points to our StreamSource
  let source = unsafe { &mut *(opaque as *mut StreamSource) };

  Whence::from_raw(whence)
    .and_then(|whence| source.seek(offset, whence))
    .map_or(-1, |pos| pos as i64)
}

//! Read-only byte buffers for demuxing
//!
//! The session never copies or mutates the caller's bytes; it reads them
//! through a [`BufferSource`] that keeps the backing storage alive.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

// ============================================================================
// Buffer Source Trait (zero-copy input)
// ============================================================================

/// Object-safe trait for read-only buffer access.
///
/// Different buffer types (Vec<u8>, Arc<[u8]>, Uint8Array, ...) can back a
/// session without copying their data.
pub trait BufferSource: Send + Sync {
  /// Get pointer and length of the buffer data.
  ///
  /// # Safety
  /// The returned pointer must remain valid for the lifetime of the BufferSource.
  fn buffer_data(&self) -> (*const u8, usize);
}

impl BufferSource for Vec<u8> {
  fn buffer_data(&self) -> (*const u8, usize) {
    (self.as_ptr(), self.len())
  }
}

impl BufferSource for Box<[u8]> {
  fn buffer_data(&self) -> (*const u8, usize) {
    (self.as_ptr(), self.len())
  }
}

impl BufferSource for Arc<[u8]> {
  fn buffer_data(&self) -> (*const u8, usize) {
    (self.as_ptr(), self.len())
  }
}

impl BufferSource for &'static [u8] {
  fn buffer_data(&self) -> (*const u8, usize) {
    (self.as_ptr(), self.len())
  }
}

// ============================================================================
// Read-Only Buffer
// ============================================================================

/// Read-only cursor over any `BufferSource`.
pub struct ReadOnlyBuffer {
  source: Box<dyn BufferSource>,
  position: usize,
}

impl ReadOnlyBuffer {
  /// Create a new read-only buffer from any BufferSource.
  pub fn new(source: impl BufferSource + 'static) -> Self {
    Self::from_boxed(Box::new(source))
  }

  /// Create a new read-only buffer from an already boxed source.
  pub fn from_boxed(source: Box<dyn BufferSource>) -> Self {
    Self {
      source,
      position: 0,
    }
  }

  /// Get the buffer data as a slice.
  #[inline]
  pub fn as_slice(&self) -> &[u8] {
    let (ptr, len) = self.source.buffer_data();
    if ptr.is_null() || len == 0 {
      &[]
    } else {
      // SAFETY: BufferSource guarantees the pointer is valid for its lifetime
      unsafe { std::slice::from_raw_parts(ptr, len) }
    }
  }

  /// Get the total length of the buffer.
  #[inline]
  pub fn len(&self) -> usize {
    self.source.buffer_data().1
  }

  /// Check if the buffer is empty.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Get the current read position.
  #[inline]
  pub fn position(&self) -> usize {
    self.position
  }

  /// Get remaining bytes from current position.
  #[inline]
  pub fn remaining(&self) -> usize {
    self.len().saturating_sub(self.position)
  }
}

impl Read for ReadOnlyBuffer {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    let position = self.position;
    let data = self.as_slice();
    if position >= data.len() {
      return Ok(0);
    }

    let to_read = (data.len() - position).min(buf.len());
    buf[..to_read].copy_from_slice(&data[position..position + to_read]);
    self.position += to_read;

    Ok(to_read)
  }
}

impl Seek for ReadOnlyBuffer {
  fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
    let len = self.len() as i64;
    let new_pos = match pos {
      SeekFrom::Start(offset) => i64::try_from(offset).ok(),
      SeekFrom::End(offset) => len.checked_add(offset),
      SeekFrom::Current(offset) => (self.position as i64).checked_add(offset),
    };

    match new_pos {
      Some(p) if (0..=len).contains(&p) => {
        self.position = p as usize;
        Ok(self.position as u64)
      }
      _ => Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "seek position outside of buffer",
      )),
    }
  }
}

// Implement Debug manually since Box<dyn BufferSource> doesn't implement Debug
impl std::fmt::Debug for ReadOnlyBuffer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReadOnlyBuffer")
      .field("len", &self.len())
      .field("position", &self.position)
      .finish()
  }
}

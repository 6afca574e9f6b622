//! Safe wrapper around FFmpeg AVPacket
//!
//! Provides RAII-based memory management for compressed data.

use crate::ffi::{
  self,
  accessors::{ffpkt_advance, ffpkt_data, ffpkt_dts, ffpkt_pts, ffpkt_size, ffpkt_stream_index},
  avcodec::{av_packet_alloc, av_packet_free, av_packet_ref, av_packet_unref},
  AVPacket,
};
use std::ptr::NonNull;

use super::tracking::{self, HandleKind};
use super::CodecError;

/// Safe wrapper around AVPacket with RAII cleanup
pub struct Packet {
  ptr: NonNull<AVPacket>,
}

impl Packet {
  /// Allocate a new empty packet
  pub fn new() -> Result<Self, CodecError> {
    let ptr = unsafe { av_packet_alloc() };
    let ptr = NonNull::new(ptr).ok_or(CodecError::AllocationFailed("AVPacket"))?;
    tracking::acquired(HandleKind::Packet);
    Ok(Self { ptr })
  }

  /// Get the raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_ptr(&self) -> *const AVPacket {
    self.ptr.as_ptr()
  }

  /// Get the mutable raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVPacket {
    self.ptr.as_ptr()
  }

  // ========================================================================
  // Data Access
  // ========================================================================

  /// Get pointer to packet data
  pub fn data(&self) -> *const u8 {
    unsafe { ffpkt_data(self.as_ptr()) }
  }

  /// Get packet data as a slice
  pub fn as_slice(&self) -> &[u8] {
    let ptr = self.data();
    let size = self.size();
    if ptr.is_null() || size <= 0 {
      &[]
    } else {
      unsafe { std::slice::from_raw_parts(ptr, size as usize) }
    }
  }

  /// Get remaining packet size in bytes
  #[inline]
  pub fn size(&self) -> i32 {
    unsafe { ffpkt_size(self.as_ptr()) }
  }

  /// Check if packet has data left
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.size() <= 0
  }

  /// Index of the stream this packet belongs to
  #[inline]
  pub fn stream_index(&self) -> i32 {
    unsafe { ffpkt_stream_index(self.as_ptr()) }
  }

  /// Get presentation timestamp
  #[inline]
  pub fn pts(&self) -> i64 {
    unsafe { ffpkt_pts(self.as_ptr()) }
  }

  /// Get decoding timestamp
  #[inline]
  pub fn dts(&self) -> i64 {
    unsafe { ffpkt_dts(self.as_ptr()) }
  }

  // ========================================================================
  // Lifecycle
  // ========================================================================

  /// Make this packet a new reference to `src`'s data
  ///
  /// Any data previously held is released first.
  pub fn ref_from(&mut self, src: &Packet) -> Result<(), CodecError> {
    self.unref();
    let ret = unsafe { av_packet_ref(self.as_mut_ptr(), src.as_ptr()) };
    ffi::check_error(ret)?;
    Ok(())
  }

  /// Move the data window past `consumed` bytes
  ///
  /// The size is clamped at zero; the buffer reference is kept until `unref`.
  pub fn advance(&mut self, consumed: i32) {
    unsafe { ffpkt_advance(self.as_mut_ptr(), consumed) }
  }

  /// Unreference the packet data
  pub fn unref(&mut self) {
    unsafe { av_packet_unref(self.as_mut_ptr()) }
  }
}

impl Drop for Packet {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_packet_free(&mut ptr);
    }
    tracking::released(HandleKind::Packet);
  }
}

// Packet data can be sent between threads
unsafe impl Send for Packet {}

impl std::fmt::Debug for Packet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Packet")
      .field("size", &self.size())
      .field("stream_index", &self.stream_index())
      .field("pts", &self.pts())
      .field("dts", &self.dts())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_packet_allocation() {
    let pkt = Packet::new().unwrap();
    assert!(pkt.is_empty());
    assert_eq!(pkt.size(), 0);
    assert!(pkt.as_slice().is_empty());
  }

  #[test]
  fn test_packet_release_is_tracked() {
    let before = tracking::live_handles_of(HandleKind::Packet);
    let pkt = Packet::new().unwrap();
    assert_eq!(tracking::live_handles_of(HandleKind::Packet), before + 1);
    drop(pkt);
    assert_eq!(tracking::live_handles_of(HandleKind::Packet), before);
  }

  #[test]
  fn test_advance_on_empty_packet_stays_empty() {
    let mut pkt = Packet::new().unwrap();
    pkt.advance(16);
    assert_eq!(pkt.size(), 0);
    pkt.unref();
    assert!(pkt.is_empty());
  }
}

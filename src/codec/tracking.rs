//! Live native handle accounting
//!
//! Every owning wrapper around an FFmpeg allocation reports acquisition and
//! release here. Counts are per thread, which matches how sessions are driven
//! (one thread at a time) and keeps parallel tests from observing each other.

use std::cell::Cell;

/// Kinds of native handle owned by the codec wrappers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
  /// AVFormatContext
  Format,
  /// AVIOContext with its av_malloc'd buffer
  Io,
  /// AVCodecContext
  Codec,
  /// AVPacket
  Packet,
  /// AVFrame
  Frame,
  /// SwsContext
  Scaler,
}

const KIND_COUNT: usize = 6;

impl HandleKind {
  fn slot(self) -> usize {
    match self {
      HandleKind::Format => 0,
      HandleKind::Io => 1,
      HandleKind::Codec => 2,
      HandleKind::Packet => 3,
      HandleKind::Frame => 4,
      HandleKind::Scaler => 5,
    }
  }
}

thread_local! {
  static LIVE: [Cell<usize>; KIND_COUNT] = const {
    [
      Cell::new(0),
      Cell::new(0),
      Cell::new(0),
      Cell::new(0),
      Cell::new(0),
      Cell::new(0),
    ]
  };
}

/// Record that a native handle of `kind` was created
pub(crate) fn acquired(kind: HandleKind) {
  LIVE.with(|live| {
    let cell = &live[kind.slot()];
    cell.set(cell.get() + 1);
  });
}

/// Record that a native handle of `kind` was freed
pub(crate) fn released(kind: HandleKind) {
  LIVE.with(|live| {
    let cell = &live[kind.slot()];
    cell.set(cell.get().saturating_sub(1));
  });
}

/// Number of live native handles of `kind` on this thread
pub fn live_handles_of(kind: HandleKind) -> usize {
  LIVE.with(|live| live[kind.slot()].get())
}

/// Total number of live native handles on this thread
pub fn live_handles() -> usize {
  LIVE.with(|live| live.iter().map(Cell::get).sum())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_acquire_release_balance() {
    let before = live_handles();
    acquired(HandleKind::Frame);
    acquired(HandleKind::Packet);
    assert_eq!(live_handles(), before + 2);
    assert_eq!(live_handles_of(HandleKind::Frame), 1);
    released(HandleKind::Frame);
    released(HandleKind::Packet);
    assert_eq!(live_handles(), before);
  }
}

//! Process-wide FFmpeg setup
//!
//! Formats and codecs are registered statically by FFmpeg itself, so the only
//! global state is logging: library messages are forwarded to `tracing` and
//! the library log level is capped at warnings.

use crate::ffi::accessors::ff_install_log_sink;
use crate::ffi::avutil::{av_log_set_level, log_level};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::sync::Once;

static INIT: Once = Once::new();

/// Run the one-time setup if it has not happened yet
pub fn ensure_initialized() {
  INIT.call_once(|| {
    unsafe {
      av_log_set_level(log_level::WARNING);
      ff_install_log_sink(Some(log_sink));
    }
    tracing::debug!(target: "video_codec", "FFmpeg log bridge installed");
  });
}

/// Whether [`ensure_initialized`] has completed
pub fn is_initialized() -> bool {
  INIT.is_completed()
}

unsafe extern "C" fn log_sink(level: c_int, line: *const c_char) {
  if line.is_null() {
    return;
  }
  // SAFETY: the trampoline passes a NUL-terminated stack buffer
  let line = unsafe { CStr::from_ptr(line) }.to_string_lossy();
  let line = line.trim_end();
  if line.is_empty() {
    return;
  }

  match level {
    l if l <= log_level::ERROR => tracing::error!(target: "video_codec::ffmpeg", "{}", line),
    l if l <= log_level::WARNING => tracing::warn!(target: "video_codec::ffmpeg", "{}", line),
    l if l <= log_level::INFO => tracing::info!(target: "video_codec::ffmpeg", "{}", line),
    l if l <= log_level::DEBUG => tracing::debug!(target: "video_codec::ffmpeg", "{}", line),
    _ => tracing::trace!(target: "video_codec::ffmpeg", "{}", line),
  }
}
